//! Test helpers shared by the unit tests.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex,
};

use thiserror::Error;

use crate::{subscription::lock, CombineIdentifier, Completion, Demand, Subscriber, Subscription};

pub(crate) fn init_logger() {
    dotenv::dotenv().ok();

    let _ = pretty_env_logger::try_init();
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub(crate) enum TestError {
    #[error("boom")]
    Boom,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Event<T, F> {
    Subscribed,
    Value(T),
    Completion(Completion<F>),
}

struct Record<T, F> {
    events: Vec<Event<T, F>>,
    subscription: Option<Arc<dyn Subscription>>,
}

/// Observes what a [`RecordingSubscriber`] went through.
pub(crate) struct Recorder<T, F = TestError> {
    record: Arc<Mutex<Record<T, F>>>,
    released: Arc<AtomicBool>,
    initial: Demand,
    per_value: Demand,
    cancel_after: Option<usize>,
}

impl<T, F> Recorder<T, F>
where
    T: Clone + Send + 'static,
    F: std::error::Error + Clone + Send + 'static,
{
    /// Requests `initial` when the subscription arrives.
    pub(crate) fn new(initial: Demand) -> Self {
        Recorder {
            record: Arc::new(Mutex::new(Record {
                events: vec![],
                subscription: None,
            })),
            released: Arc::new(AtomicBool::new(false)),
            initial,
            per_value: Demand::NONE,
            cancel_after: None,
        }
    }

    /// Demand returned for every received value.
    pub(crate) fn per_value(mut self, demand: Demand) -> Self {
        self.per_value = demand;
        self
    }

    /// Cancels from inside `receive` once `count` values arrived.
    pub(crate) fn cancel_after(mut self, count: usize) -> Self {
        self.cancel_after = Some(count);
        self
    }

    pub(crate) fn subscriber(&self) -> RecordingSubscriber<T, F> {
        RecordingSubscriber {
            id: CombineIdentifier::new(),
            record: self.record.clone(),
            released: self.released.clone(),
            initial: self.initial,
            per_value: self.per_value,
            cancel_after: self.cancel_after,
            received: 0,
        }
    }

    pub(crate) fn events(&self) -> Vec<Event<T, F>> {
        lock(&self.record).events.clone()
    }

    pub(crate) fn values(&self) -> Vec<T> {
        lock(&self.record)
            .events
            .iter()
            .filter_map(|event| match event {
                Event::Value(value) => Some(value.clone()),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn completions(&self) -> usize {
        lock(&self.record)
            .events
            .iter()
            .filter(|event| matches!(event, Event::Completion(_)))
            .count()
    }

    pub(crate) fn completion(&self) -> Option<Completion<F>> {
        lock(&self.record)
            .events
            .iter()
            .rev()
            .find_map(|event| match event {
                Event::Completion(completion) => Some(completion.clone()),
                _ => None,
            })
    }

    pub(crate) fn subscription(&self) -> Option<Arc<dyn Subscription>> {
        lock(&self.record).subscription.clone()
    }

    pub(crate) fn request(&self, demand: Demand) {
        if let Some(subscription) = self.subscription() {
            subscription.request(demand);
        }
    }

    pub(crate) fn cancel(&self) {
        if let Some(subscription) = self.subscription() {
            subscription.cancel();
        }
    }

    /// True once the publisher side dropped the subscriber.
    pub(crate) fn is_released(&self) -> bool {
        self.released.load(Ordering::SeqCst)
    }
}

pub(crate) struct RecordingSubscriber<T, F> {
    id: CombineIdentifier,
    record: Arc<Mutex<Record<T, F>>>,
    released: Arc<AtomicBool>,
    initial: Demand,
    per_value: Demand,
    cancel_after: Option<usize>,
    received: usize,
}

impl<T, F> Subscriber for RecordingSubscriber<T, F>
where
    T: Send + 'static,
    F: std::error::Error + Send + 'static,
{
    type Input = T;
    type Failure = F;

    fn receive_subscription(&mut self, subscription: Arc<dyn Subscription>) {
        {
            let mut record = lock(&self.record);
            record.events.push(Event::Subscribed);
            record.subscription = Some(subscription.clone());
        }

        subscription.request(self.initial);
    }

    fn receive(&mut self, input: T) -> Demand {
        self.received += 1;

        let subscription = {
            let mut record = lock(&self.record);
            record.events.push(Event::Value(input));
            record.subscription.clone()
        };

        if self.cancel_after == Some(self.received) {
            if let Some(subscription) = subscription {
                subscription.cancel();
            }
        }

        self.per_value
    }

    fn receive_completion(&mut self, completion: Completion<F>) {
        lock(&self.record).events.push(Event::Completion(completion));
    }

    fn combine_identifier(&self) -> CombineIdentifier {
        self.id
    }
}

impl<T, F> Drop for RecordingSubscriber<T, F> {
    fn drop(&mut self) {
        self.released.store(true, Ordering::SeqCst);
    }
}
