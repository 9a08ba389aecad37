use std::{
    error::Error,
    fmt,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
};

use futures::Sink;

use super::{Subject, SubjectCore};
use crate::{subscription::Backlog, Completion, Never, Publisher, Subscriber, SubjectError};

/// Broadcasts values to the subscribers attached at the time of sending.
///
/// Holds no value of its own. A subscriber without outstanding demand
/// misses the values sent meanwhile.
pub struct PassthroughSubject<T, F = Never> {
    core: Arc<SubjectCore<T, F>>,
}

impl<T, F> PassthroughSubject<T, F>
where
    T: Clone + Send + 'static,
    F: Error + Clone + Send + 'static,
{
    pub fn new() -> Self {
        PassthroughSubject {
            core: SubjectCore::new(()),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.core.subscriber_count()
    }
}

impl<T, F> Default for PassthroughSubject<T, F>
where
    T: Clone + Send + 'static,
    F: Error + Clone + Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T, F> Clone for PassthroughSubject<T, F> {
    fn clone(&self) -> Self {
        PassthroughSubject {
            core: self.core.clone(),
        }
    }
}

impl<T, F> fmt::Debug for PassthroughSubject<T, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PassthroughSubject").finish_non_exhaustive()
    }
}

impl<T, F> Publisher for PassthroughSubject<T, F>
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
        self.core.subscribe(subscriber, Backlog::Drop);
    }
}

impl<T, F> Subject for PassthroughSubject<T, F>
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

impl<T, F> Sink<T> for PassthroughSubject<T, F>
where
    T: Clone + Send + 'static,
    F: Error + Clone + Send + 'static,
{
    type Error = SubjectError;

    fn poll_ready(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn start_send(self: Pin<&mut Self>, item: T) -> Result<(), Self::Error> {
        self.core.send(item)
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn poll_close(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.core.close();

        Poll::Ready(Ok(()))
    }
}
