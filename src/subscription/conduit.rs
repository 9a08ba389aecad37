//! Per-subscription delivery state machine shared by every publisher in the crate.
//!
//! A [`Conduit`] owns one subscriber and tracks:
//! - outstanding demand
//! - values waiting for demand
//! - a pending terminal signal
//! - whether the subscription terminated
//!
//! Delivery happens in a drain loop. Exactly one caller drains at a time
//! (the `draining` flag, flipped under the state lock); everybody else only
//! updates state and leaves the work to the active drainer. This makes calls
//! from inside the subscriber's callbacks (`request`, `cancel`, a subject
//! `send`) safe without re-entering the subscriber.

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex, MutexGuard, PoisonError, TryLockError},
};

use crate::{Cancellable, CombineIdentifier, Completion, Demand, Subscriber, Subscription};

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn try_lock<T>(mutex: &Mutex<T>) -> Option<MutexGuard<'_, T>> {
    match mutex.try_lock() {
        Ok(guard) => Some(guard),
        Err(TryLockError::Poisoned(poisoned)) => Some(poisoned.into_inner()),
        Err(TryLockError::WouldBlock) => None,
    }
}

/// What a conduit does with a pushed value that has no demand to go to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Backlog {
    /// Keep everything, in order.
    Queue,
    /// Keep only the most recent value.
    Latest,
    /// Discard it.
    Drop,
}

/// Push side of a conduit, with the subscriber type erased.
pub(crate) trait Downstream<T, F>: Subscription {
    fn push(&self, value: T);

    /// Discards pending values and terminates with `completion`, regardless of demand.
    fn finish(&self, completion: Completion<F>);

    /// Terminates with `completion` once the values already pending were
    /// delivered. Values pushed afterwards are ignored.
    fn finish_after_pending(&self, completion: Completion<F>);
}

type CancelHook = Box<dyn Fn(CombineIdentifier) + Send + Sync>;

pub(crate) struct Conduit<S: Subscriber> {
    id: CombineIdentifier,
    state: Mutex<State<S::Input, S::Failure>>,
    subscriber: Mutex<Option<S>>,
    on_cancel: Option<CancelHook>,
}

struct State<T, F> {
    demand: Demand,
    pending: VecDeque<T>,
    completion: Option<Completion<F>>,
    backlog: Backlog,
    terminated: bool,
    draining: bool,
}

enum Step<T, F> {
    Value(T),
    Complete(Completion<F>),
    Release,
    Idle,
}

impl<T, F> State<T, F> {
    /// Whether one more value fits into the outstanding demand.
    fn has_room(&self) -> bool {
        match self.demand {
            Demand::Unbounded => true,
            Demand::Bounded(count) => self.pending.len() < count,
        }
    }

    /// Claims the drain loop. Returns false if somebody else owns it or the
    /// subscription is over.
    fn claim(&mut self) -> bool {
        if self.draining || self.terminated {
            return false;
        }

        self.draining = true;
        true
    }

    fn next_step(&mut self) -> Step<T, F> {
        if self.terminated {
            self.draining = false;
            return Step::Release;
        }

        if !self.demand.is_satisfied() {
            if let Some(value) = self.pending.pop_front() {
                self.demand = self.demand.consume_one();
                return Step::Value(value);
            }
        }

        if self.pending.is_empty() {
            if let Some(completion) = self.completion.take() {
                self.terminated = true;
                self.draining = false;
                return Step::Complete(completion);
            }
        }

        self.draining = false;
        Step::Idle
    }
}

impl<S: Subscriber> Conduit<S> {
    /// Creates a conduit that is not started yet: nothing reaches the
    /// subscriber until [`Conduit::start`] hands it the subscription.
    pub(crate) fn new(subscriber: S, backlog: Backlog) -> Self {
        Conduit {
            id: CombineIdentifier::new(),
            state: Mutex::new(State {
                demand: Demand::NONE,
                pending: VecDeque::new(),
                completion: None,
                backlog,
                terminated: false,
                draining: true,
            }),
            subscriber: Mutex::new(Some(subscriber)),
            on_cancel: None,
        }
    }

    pub(crate) fn with_pending<I>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S::Input>,
    {
        self.state_mut().pending.extend(values);
        self
    }

    /// Terminal signal delivered once every pending value went out.
    pub(crate) fn with_completion(mut self, completion: Completion<S::Failure>) -> Self {
        self.state_mut().completion = Some(completion);
        self
    }

    pub(crate) fn on_cancel<H>(mut self, hook: H) -> Self
    where
        H: Fn(CombineIdentifier) + Send + Sync + 'static,
    {
        self.on_cancel = Some(Box::new(hook));
        self
    }

    pub(crate) fn id(&self) -> CombineIdentifier {
        self.id
    }

    fn state_mut(&mut self) -> &mut State<S::Input, S::Failure> {
        self.state.get_mut().unwrap_or_else(PoisonError::into_inner)
    }

    /// Hands the subscription to the subscriber, then delivers whatever the
    /// subscriber asked for while receiving it.
    pub(crate) fn start(self: &Arc<Self>) {
        let mut slot = lock(&self.subscriber);

        if let Some(subscriber) = slot.as_mut() {
            log::debug!("subscription {} started", self.id);

            subscriber.receive_subscription(Arc::clone(self) as Arc<dyn Subscription>);
        }

        self.run(slot);
    }

    fn drain(&self) {
        self.run(lock(&self.subscriber));
    }

    /// The drain loop. The caller must have claimed it.
    fn run(&self, mut slot: MutexGuard<'_, Option<S>>) {
        loop {
            let step = lock(&self.state).next_step();

            match step {
                Step::Value(value) => match slot.as_mut() {
                    Some(subscriber) => {
                        let more = subscriber.receive(value);

                        if !more.is_satisfied() {
                            lock(&self.state).demand += more;
                        }
                    }
                    None => {
                        log::debug!("subscription {} lost its subscriber", self.id);

                        let mut state = lock(&self.state);
                        state.terminated = true;
                        state.draining = false;
                        return;
                    }
                },
                Step::Complete(completion) => {
                    if let Some(mut subscriber) = slot.take() {
                        log::debug!("subscription {} completed", self.id);

                        subscriber.receive_completion(completion);
                    }

                    return;
                }
                Step::Release => {
                    slot.take();
                    return;
                }
                Step::Idle => break,
            }
        }

        // A cancel from another thread may have slipped in after the last
        // step and failed to grab the slot.
        drop(slot);
        self.release_if_terminated();
    }

    fn release_if_terminated(&self) {
        if !lock(&self.state).terminated {
            return;
        }

        if let Some(mut slot) = try_lock(&self.subscriber) {
            slot.take();
        }
    }
}

impl<S: Subscriber> Cancellable for Conduit<S> {
    fn cancel(&self) {
        let draining = {
            let mut state = lock(&self.state);

            if state.terminated {
                log::debug!("subscription {} already terminated", self.id);
                return;
            }

            state.terminated = true;
            state.pending.clear();
            state.completion = None;
            state.draining
        };

        log::debug!("subscription {} cancelled", self.id);

        if let Some(hook) = &self.on_cancel {
            hook(self.id);
        }

        // An active drainer drops the subscriber on its next step.
        if !draining {
            self.release_if_terminated();
        }
    }

    fn combine_identifier(&self) -> CombineIdentifier {
        self.id
    }
}

impl<S: Subscriber> Subscription for Conduit<S> {
    fn request(&self, demand: Demand) {
        {
            let mut state = lock(&self.state);

            if state.terminated {
                log::debug!(
                    "request {} on terminated subscription {} ignored",
                    demand,
                    self.id
                );
                return;
            }

            log::trace!("subscription {} requested {}", self.id, demand);

            state.demand += demand;

            if !state.claim() {
                return;
            }
        }

        self.drain();
    }
}

impl<S: Subscriber> Downstream<S::Input, S::Failure> for Conduit<S> {
    fn push(&self, value: S::Input) {
        {
            let mut state = lock(&self.state);

            if state.terminated || state.completion.is_some() {
                return;
            }

            if !state.has_room() {
                match state.backlog {
                    Backlog::Queue => {}
                    Backlog::Latest => {
                        state.pending.pop_back();
                    }
                    Backlog::Drop => {
                        log::trace!("subscription {} has no demand, value dropped", self.id);
                        return;
                    }
                }
            }

            state.pending.push_back(value);

            if !state.claim() {
                return;
            }
        }

        self.drain();
    }

    fn finish(&self, completion: Completion<S::Failure>) {
        self.settle(completion, true);
    }

    fn finish_after_pending(&self, completion: Completion<S::Failure>) {
        self.settle(completion, false);
    }
}

impl<S: Subscriber> Conduit<S> {
    fn settle(&self, completion: Completion<S::Failure>, discard_pending: bool) {
        {
            let mut state = lock(&self.state);

            if state.terminated || state.completion.is_some() {
                return;
            }

            if discard_pending {
                state.pending.clear();
            }
            state.completion = Some(completion);

            if !state.claim() {
                return;
            }
        }

        self.drain();
    }
}
