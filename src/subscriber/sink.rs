use std::sync::{Arc, Mutex};

use crate::{
    subscription::lock, AnyCancellable, Cancellable, CombineIdentifier, Completion, Demand,
    Subscriber, Subscription,
};

/// Subscriber that requests unbounded demand and forwards everything to closures.
///
/// Usually created through [`Publisher::sink`](crate::Publisher::sink).
pub struct Sink<T, F> {
    id: CombineIdentifier,
    link: Arc<SinkLink>,
    receive_value: Box<dyn FnMut(T) + Send>,
    receive_completion: Box<dyn FnMut(Completion<F>) + Send>,
}

impl<T, F> Sink<T, F> {
    pub fn new<C, V>(receive_completion: C, receive_value: V) -> Self
    where
        C: FnMut(Completion<F>) + Send + 'static,
        V: FnMut(T) + Send + 'static,
    {
        Sink {
            id: CombineIdentifier::new(),
            link: Arc::new(SinkLink {
                id: CombineIdentifier::new(),
                state: Mutex::new(LinkState::Waiting),
            }),
            receive_value: Box::new(receive_value),
            receive_completion: Box::new(receive_completion),
        }
    }

    /// Handle that cancels whatever subscription this sink gets attached to.
    ///
    /// Cancelling before the subscription arrives cancels it on arrival.
    pub fn cancellable(&self) -> AnyCancellable {
        AnyCancellable::new(self.link.clone())
    }
}

impl<T, F> Subscriber for Sink<T, F>
where
    T: Send + 'static,
    F: std::error::Error + Send + 'static,
{
    type Input = T;
    type Failure = F;

    fn receive_subscription(&mut self, subscription: Arc<dyn Subscription>) {
        let accepted = {
            let mut state = lock(&self.link.state);

            if matches!(*state, LinkState::Waiting) {
                *state = LinkState::Live(subscription.clone());
                true
            } else {
                false
            }
        };

        if accepted {
            subscription.request(Demand::unbounded());
        } else {
            subscription.cancel();
        }
    }

    fn receive(&mut self, input: T) -> Demand {
        (self.receive_value)(input);

        Demand::NONE
    }

    fn receive_completion(&mut self, completion: Completion<F>) {
        *lock(&self.link.state) = LinkState::Done;

        (self.receive_completion)(completion);
    }

    fn combine_identifier(&self) -> CombineIdentifier {
        self.id
    }
}

enum LinkState {
    Waiting,
    Live(Arc<dyn Subscription>),
    Cancelled,
    Done,
}

struct SinkLink {
    id: CombineIdentifier,
    state: Mutex<LinkState>,
}

impl Cancellable for SinkLink {
    fn cancel(&self) {
        let previous = std::mem::replace(&mut *lock(&self.state), LinkState::Cancelled);

        if let LinkState::Live(subscription) = previous {
            subscription.cancel();
        }
    }

    fn combine_identifier(&self) -> CombineIdentifier {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{testing::init_logger, Never, Publisher, Sequence};

    #[test]
    fn test_sink_requests_everything() {
        init_logger();

        let values = Arc::new(Mutex::new(vec![]));
        let completions = Arc::new(Mutex::new(vec![]));

        let (v, c) = (values.clone(), completions.clone());
        let _cancellable = Sequence::new(vec!["a", "b", "c"])
            .sink(move |done| lock(&c).push(done), move |x| lock(&v).push(x));

        assert_eq!(*lock(&values), vec!["a", "b", "c"]);
        assert_eq!(*lock(&completions), vec![Completion::<Never>::Finished]);
    }

    #[test]
    fn test_cancel_before_subscription_arrives() {
        let hits = Arc::new(Mutex::new(0));
        let counter = hits.clone();
        let mut sink = Sink::<i32, Never>::new(|_| {}, move |_| *lock(&counter) += 1);

        sink.cancellable().cancel();

        let recorder = crate::testing::Recorder::<i32>::new(Demand::NONE);
        let conduit = Arc::new(crate::subscription::Conduit::new(
            recorder.subscriber(),
            crate::subscription::Backlog::Queue,
        ));
        conduit.start();

        let subscription = recorder.subscription().expect("recorder was subscribed");
        sink.receive_subscription(subscription);

        // The late subscription got cancelled instead of receiving demand.
        assert!(recorder.is_released());
        assert_eq!(*lock(&hits), 0);
    }
}
