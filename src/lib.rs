//! Publishers, subscribers and subjects with explicit backpressure.
//!
//! A [`Publisher`] only delivers values after its [`Subscriber`] asked for
//! them through the [`Subscription`] it received. Demand is counted per
//! subscription, so one slow subscriber never holds back the others.
//!
//! ```
//! use std::sync::{Arc, Mutex};
//!
//! use futures_combine::{CancelBag, Completion, CurrentValueSubject, Publisher, Subject};
//!
//! let mut cancel_bag = CancelBag::new();
//! let received = Arc::new(Mutex::new(vec![]));
//!
//! let subject = CurrentValueSubject::<i32>::new(100);
//!
//! let values = received.clone();
//! subject
//!     .sink(
//!         |completion| assert_eq!(completion, Completion::Finished),
//!         move |value| values.lock().unwrap().push(value),
//!     )
//!     .store(&mut cancel_bag);
//!
//! subject.send(1).unwrap();
//! subject.send(2).unwrap();
//! subject.send_completion(Completion::Finished).unwrap();
//!
//! assert_eq!(*received.lock().unwrap(), vec![100, 1, 2]);
//! ```

mod cancellable;
mod demand;
mod error;
mod publisher;
mod subscriber;
mod subscription;

#[cfg(test)]
mod testing;

pub use cancellable::*;
pub use demand::*;
pub use error::*;
pub use publisher::*;
pub use subscriber::*;
pub use subscription::{Cancellable, CombineIdentifier, Subscription};
