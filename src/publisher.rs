use std::error::Error;

use crate::{AnyCancellable, Completion, PublisherStream, Sink, Subscriber};

mod passthrough;
mod sequence;
mod subject;
mod value;
pub use passthrough::*;
pub use sequence::*;
pub use subject::*;
pub use value::*;

/// A publisher delivers elements to one or more Subscriber instances.
///
/// Values only flow once the subscriber requests demand through the
/// subscription it receives, never more than requested.
pub trait Publisher {
    type Output: Send + 'static;
    type Failure: Error + Send + 'static;

    /// Attaches `subscriber`, which receives its subscription before anything else.
    fn subscribe<S>(&self, subscriber: S)
    where
        S: Subscriber<Input = Self::Output, Failure = Self::Failure>;

    /// Attaches a closure-based subscriber with unbounded demand.
    fn sink<C, V>(&self, receive_completion: C, receive_value: V) -> AnyCancellable
    where
        C: FnMut(Completion<Self::Failure>) + Send + 'static,
        V: FnMut(Self::Output) + Send + 'static,
    {
        let sink = Sink::new(receive_completion, receive_value);
        let cancellable = sink.cancellable();

        self.subscribe(sink);

        cancellable
    }

    /// Turns the publisher into a [`futures::Stream`] of `Result`s.
    ///
    /// The stream requests one value per poll. A failure is yielded as a
    /// final `Err` item; finishing ends the stream. Dropping the stream
    /// cancels the subscription.
    fn into_stream(self) -> PublisherStream<Self::Output, Self::Failure>
    where
        Self: Sized,
    {
        PublisherStream::new(&self)
    }
}
