use std::{error::Error, sync::Arc};

use crate::{CombineIdentifier, Demand, Subscription};

mod sink;
pub use sink::*;

mod stream;
pub use stream::*;

/// Terminal signal of a publisher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion<Failure> {
    Finished,
    Failure(Failure),
}

impl<Failure> Completion<Failure> {
    pub fn is_failure(&self) -> bool {
        matches!(self, Completion::Failure(_))
    }
}

/// A subscriber receives values from a Publisher.
///
/// Call order is always: one `receive_subscription`, any number of
/// `receive` (never more than the demand granted so far), and at most one
/// `receive_completion`. Calls into one subscriber never overlap.
pub trait Subscriber: Send + 'static {
    type Input: Send + 'static;
    type Failure: Error + Send + 'static;

    /// Nothing is delivered until the subscriber requests demand on `subscription`.
    fn receive_subscription(&mut self, subscription: Arc<dyn Subscription>);

    /// Returns demand to *add* to what is outstanding.
    fn receive(&mut self, input: Self::Input) -> Demand;

    fn receive_completion(&mut self, completion: Completion<Self::Failure>);

    fn combine_identifier(&self) -> CombineIdentifier;
}
