use std::{
    collections::VecDeque,
    pin::Pin,
    sync::{Arc, Mutex},
    task::{Context, Poll, Waker},
};

use futures::Stream;

use crate::{
    subscription::lock, CombineIdentifier, Completion, Demand, Publisher, Subscriber,
    Subscription,
};

struct Bridge<T, F> {
    buffer: VecDeque<Result<T, F>>,
    subscription: Option<Arc<dyn Subscription>>,
    waker: Option<Waker>,
    requested: bool,
    done: bool,
}

impl<T, F> Bridge<T, F> {
    fn wake(&mut self) {
        if let Some(waker) = self.waker.take() {
            waker.wake();
        }
    }
}

/// A publisher viewed as a [`futures::Stream`].
///
/// Requests one value per poll, so the publisher never runs ahead of the
/// consumer. A failure is yielded as a final `Err` item. Dropping the stream
/// cancels the subscription.
pub struct PublisherStream<T, F> {
    shared: Arc<Mutex<Bridge<T, F>>>,
}

impl<T, F> PublisherStream<T, F>
where
    T: Send + 'static,
    F: std::error::Error + Send + 'static,
{
    pub fn new<P>(publisher: &P) -> Self
    where
        P: Publisher<Output = T, Failure = F>,
    {
        let shared = Arc::new(Mutex::new(Bridge {
            buffer: VecDeque::new(),
            subscription: None,
            waker: None,
            requested: false,
            done: false,
        }));

        publisher.subscribe(StreamSubscriber {
            id: CombineIdentifier::new(),
            shared: shared.clone(),
        });

        PublisherStream { shared }
    }
}

impl<T, F> Stream for PublisherStream<T, F> {
    type Item = Result<T, F>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let subscription = {
            let mut bridge = lock(&self.shared);

            if let Some(item) = bridge.buffer.pop_front() {
                return Poll::Ready(Some(item));
            }

            if bridge.done {
                return Poll::Ready(None);
            }

            bridge.waker = Some(cx.waker().clone());

            if bridge.requested {
                return Poll::Pending;
            }

            match bridge.subscription.clone() {
                Some(subscription) => {
                    bridge.requested = true;
                    subscription
                }
                None => return Poll::Pending,
            }
        };

        // Synchronous publishers deliver right here.
        subscription.request(Demand::bounded(1));

        let mut bridge = lock(&self.shared);

        match bridge.buffer.pop_front() {
            Some(item) => Poll::Ready(Some(item)),
            None if bridge.done => Poll::Ready(None),
            None => Poll::Pending,
        }
    }
}

impl<T, F> Drop for PublisherStream<T, F> {
    fn drop(&mut self) {
        let subscription = {
            let mut bridge = lock(&self.shared);
            bridge.done = true;
            bridge.subscription.take()
        };

        if let Some(subscription) = subscription {
            subscription.cancel();
        }
    }
}

struct StreamSubscriber<T, F> {
    id: CombineIdentifier,
    shared: Arc<Mutex<Bridge<T, F>>>,
}

impl<T, F> Subscriber for StreamSubscriber<T, F>
where
    T: Send + 'static,
    F: std::error::Error + Send + 'static,
{
    type Input = T;
    type Failure = F;

    fn receive_subscription(&mut self, subscription: Arc<dyn Subscription>) {
        let mut bridge = lock(&self.shared);

        if bridge.done {
            drop(bridge);
            subscription.cancel();
            return;
        }

        bridge.subscription = Some(subscription);
        bridge.wake();
    }

    fn receive(&mut self, input: T) -> Demand {
        let mut bridge = lock(&self.shared);

        bridge.buffer.push_back(Ok(input));
        bridge.requested = false;
        bridge.wake();

        Demand::NONE
    }

    fn receive_completion(&mut self, completion: Completion<F>) {
        let mut bridge = lock(&self.shared);

        if let Completion::Failure(failure) = completion {
            bridge.buffer.push_back(Err(failure));
        }

        bridge.done = true;
        bridge.subscription = None;
        bridge.wake();
    }

    fn combine_identifier(&self) -> CombineIdentifier {
        self.id
    }
}
