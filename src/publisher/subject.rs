use std::{
    error::Error,
    sync::{Arc, Mutex, PoisonError},
};

use crate::{
    subscription::{lock, Backlog, Conduit, Downstream},
    Completion, Publisher, Subscriber, SubjectError,
};

/// A publisher that callers push values into.
///
/// After a completion was sent, both methods return
/// [`SubjectError::Completed`] and change nothing.
pub trait Subject: Publisher {
    /// Fans `value` out to every subscriber, each according to its own demand.
    fn send(&self, value: Self::Output) -> Result<(), SubjectError>;

    /// Terminates every subscriber; later subscribers receive `completion` right away.
    fn send_completion(&self, completion: Completion<Self::Failure>) -> Result<(), SubjectError>;
}

/// What a subject keeps of the values sent through it.
pub(crate) trait Retain<T>: Send + 'static {
    /// Value a new subscriber starts with.
    fn replay(&self) -> Option<T>;

    fn update(&mut self, value: &T);
}

impl<T> Retain<T> for () {
    fn replay(&self) -> Option<T> {
        None
    }

    fn update(&mut self, _value: &T) {}
}

/// The value most recently sent, or the initial one.
pub(crate) struct Current<T>(pub(crate) T);

impl<T: Clone + Send + 'static> Retain<T> for Current<T> {
    fn replay(&self) -> Option<T> {
        Some(self.0.clone())
    }

    fn update(&mut self, value: &T) {
        self.0 = value.clone();
    }
}

/// State shared by all subject handles.
pub(crate) struct SubjectCore<T, F, R = ()> {
    state: Mutex<SubjectState<T, F, R>>,
}

struct SubjectState<T, F, R> {
    retained: R,
    completion: Option<Completion<F>>,
    downstreams: Vec<Arc<dyn Downstream<T, F>>>,
}

impl<T, F, R> SubjectCore<T, F, R>
where
    T: Clone + Send + 'static,
    F: Error + Clone + Send + 'static,
    R: Retain<T>,
{
    pub(crate) fn new(retained: R) -> Arc<Self> {
        Arc::new(SubjectCore {
            state: Mutex::new(SubjectState {
                retained,
                completion: None,
                downstreams: vec![],
            }),
        })
    }

    pub(crate) fn retained<U>(&self, read: impl FnOnce(&R) -> U) -> U {
        read(&lock(&self.state).retained)
    }

    pub(crate) fn subscriber_count(&self) -> usize {
        lock(&self.state).downstreams.len()
    }

    pub(crate) fn subscribe<S>(self: &Arc<Self>, subscriber: S, backlog: Backlog)
    where
        S: Subscriber<Input = T, Failure = F>,
    {
        let conduit = Conduit::new(subscriber, backlog);
        let mut state = lock(&self.state);

        if let Some(completion) = state.completion.clone() {
            drop(state);

            log::debug!("subject already completed, replaying completion");

            Arc::new(conduit.with_completion(completion)).start();
            return;
        }

        let core = Arc::downgrade(self);
        let conduit = Arc::new(
            conduit
                .with_pending(state.retained.replay())
                .on_cancel(move |id| {
                    if let Some(core) = core.upgrade() {
                        lock(&core.state)
                            .downstreams
                            .retain(|downstream| downstream.combine_identifier() != id);
                    }
                }),
        );

        state.downstreams.push(conduit.clone());
        drop(state);

        log::debug!("subscription {} attached to subject", conduit.id());

        conduit.start();
    }

    pub(crate) fn send(&self, value: T) -> Result<(), SubjectError> {
        let downstreams = {
            let mut state = lock(&self.state);

            if state.completion.is_some() {
                log::debug!("send after completion ignored");
                return Err(SubjectError::Completed);
            }

            state.retained.update(&value);

            state.downstreams.clone()
        };

        for downstream in downstreams {
            downstream.push(value.clone());
        }

        Ok(())
    }

    pub(crate) fn send_completion(&self, completion: Completion<F>) -> Result<(), SubjectError> {
        let downstreams = {
            let mut state = lock(&self.state);

            if state.completion.is_some() {
                log::debug!("completion after completion ignored");
                return Err(SubjectError::Completed);
            }

            state.completion = Some(completion.clone());
            std::mem::take(&mut state.downstreams)
        };

        log::debug!("subject completing {} subscriptions", downstreams.len());

        for downstream in downstreams {
            downstream.finish(completion.clone());
        }

        Ok(())
    }

    /// `futures::Sink::poll_close` semantics: finish unless already completed.
    pub(crate) fn close(&self) {
        match self.send_completion(Completion::Finished) {
            Ok(()) | Err(SubjectError::Completed) => {}
        }
    }
}

impl<T, F, R> Drop for SubjectCore<T, F, R> {
    fn drop(&mut self) {
        let state = self.state.get_mut().unwrap_or_else(PoisonError::into_inner);

        if state.completion.is_some() {
            return;
        }

        // Whatever a subscriber was already owed still reaches it.
        for downstream in std::mem::take(&mut state.downstreams) {
            downstream.finish_after_pending(Completion::Finished);
        }
    }
}
