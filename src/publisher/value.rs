use std::{
    error::Error,
    fmt,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
};

use futures::Sink;

use super::{Current, Subject, SubjectCore};
use crate::{subscription::Backlog, Completion, Never, Publisher, Subscriber, SubjectError};

/// A subject that wraps a single value and publishes a new element
/// whenever the value changes.
///
/// New subscribers get the current value first. While a subscriber has no
/// outstanding demand only the latest value is kept for it.
pub struct CurrentValueSubject<T, F = Never> {
    core: Arc<SubjectCore<T, F, Current<T>>>,
}

impl<T, F> CurrentValueSubject<T, F>
where
    T: Clone + Send + 'static,
    F: Error + Clone + Send + 'static,
{
    pub fn new(init_value: T) -> Self {
        CurrentValueSubject {
            core: SubjectCore::new(Current(init_value)),
        }
    }

    /// The most recently sent value, or the initial one.
    pub fn value(&self) -> T {
        self.core.retained(|current| current.0.clone())
    }

    pub fn subscriber_count(&self) -> usize {
        self.core.subscriber_count()
    }
}

impl<T, F> Clone for CurrentValueSubject<T, F> {
    fn clone(&self) -> Self {
        CurrentValueSubject {
            core: self.core.clone(),
        }
    }
}

impl<T, F> fmt::Debug for CurrentValueSubject<T, F>
where
    T: Clone + Send + fmt::Debug + 'static,
    F: Error + Clone + Send + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CurrentValueSubject")
            .field("value", &self.value())
            .finish()
    }
}

impl<T, F> Publisher for CurrentValueSubject<T, F>
where
    T: Clone + Send + 'static,
    F: Error + Clone + Send + 'static,
{
    type Output = T;
    type Failure = F;

    fn subscribe<S>(&self, subscriber: S)
    where
        S: Subscriber<Input = Self::Output, Failure = Self::Failure>,
    {
        self.core.subscribe(subscriber, Backlog::Latest);
    }
}

impl<T, F> Subject for CurrentValueSubject<T, F>
where
    T: Clone + Send + 'static,
    F: Error + Clone + Send + 'static,
{
    fn send(&self, value: T) -> Result<(), SubjectError> {
        self.core.send(value)
    }

    fn send_completion(&self, completion: Completion<F>) -> Result<(), SubjectError> {
        self.core.send_completion(completion)
    }
}

impl<T, F> Sink<T> for CurrentValueSubject<T, F>
where
    T: Clone + Send + 'static,
    F: Error + Clone + Send + 'static,
{
    type Error = SubjectError;

    fn start_send(self: Pin<&mut Self>, item: T) -> Result<(), Self::Error> {
        self.core.send(item)
    }

    fn poll_close(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.core.close();

        Poll::Ready(Ok(()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn poll_ready(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }
}
