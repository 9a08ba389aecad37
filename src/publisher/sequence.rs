use std::{error::Error, marker::PhantomData, sync::Arc};

use crate::{
    subscription::{Backlog, Conduit},
    Completion, Never, Publisher, Subscriber,
};

/// Publishes a fixed list of values in order, then finishes.
///
/// Every subscriber gets its own copy and its own pace: delivery stops
/// when demand runs out and resumes on the next request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sequence<T> {
    values: Vec<T>,
}

impl<T> Sequence<T> {
    pub fn new<I>(values: I) -> Self
    where
        I: IntoIterator<Item = T>,
    {
        Sequence {
            values: values.into_iter().collect(),
        }
    }
}

impl<T> FromIterator<T> for Sequence<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::new(iter)
    }
}

impl<T> Publisher for Sequence<T>
where
    T: Clone + Send + 'static,
{
    type Output = T;
    type Failure = Never;

    fn subscribe<S>(&self, subscriber: S)
    where
        S: Subscriber<Input = Self::Output, Failure = Self::Failure>,
    {
        Arc::new(
            Conduit::new(subscriber, Backlog::Queue)
                .with_pending(self.values.iter().cloned())
                .with_completion(Completion::Finished),
        )
        .start();
    }
}

/// Publishes one value, then finishes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Just<T>(pub T);

impl<T> Publisher for Just<T>
where
    T: Clone + Send + 'static,
{
    type Output = T;
    type Failure = Never;

    fn subscribe<S>(&self, subscriber: S)
    where
        S: Subscriber<Input = Self::Output, Failure = Self::Failure>,
    {
        Arc::new(
            Conduit::new(subscriber, Backlog::Queue)
                .with_pending(Some(self.0.clone()))
                .with_completion(Completion::Finished),
        )
        .start();
    }
}

/// Finishes right away without publishing anything.
pub struct Empty<T, F = Never> {
    _marker: PhantomData<fn() -> (T, F)>,
}

impl<T, F> Empty<T, F> {
    pub fn new() -> Self {
        Empty {
            _marker: PhantomData,
        }
    }
}

impl<T, F> Default for Empty<T, F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, F> Publisher for Empty<T, F>
where
    T: Send + 'static,
    F: Error + Send + 'static,
{
    type Output = T;
    type Failure = F;

    fn subscribe<S>(&self, subscriber: S)
    where
        S: Subscriber<Input = Self::Output, Failure = Self::Failure>,
    {
        Arc::new(Conduit::new(subscriber, Backlog::Queue).with_completion(Completion::Finished))
            .start();
    }
}

/// Fails right away with the given error.
pub struct Fail<T, F> {
    failure: F,
    _marker: PhantomData<fn() -> T>,
}

impl<T, F> Fail<T, F> {
    pub fn new(failure: F) -> Self {
        Fail {
            failure,
            _marker: PhantomData,
        }
    }
}

impl<T, F> Publisher for Fail<T, F>
where
    T: Send + 'static,
    F: Error + Clone + Send + 'static,
{
    type Output = T;
    type Failure = F;

    fn subscribe<S>(&self, subscriber: S)
    where
        S: Subscriber<Input = Self::Output, Failure = Self::Failure>,
    {
        Arc::new(
            Conduit::new(subscriber, Backlog::Queue)
                .with_completion(Completion::Failure(self.failure.clone())),
        )
        .start();
    }
}
