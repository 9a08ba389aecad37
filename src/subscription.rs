use std::{
    fmt,
    sync::atomic::{AtomicU64, Ordering},
};

use crate::Demand;

mod conduit;
pub(crate) use conduit::*;

/// Opaque process-unique identity token.
///
/// Only meaningful for equality, e.g. deduplicating subscriptions in a
/// [`CancelBag`](crate::CancelBag).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CombineIdentifier(u64);

impl CombineIdentifier {
    pub fn new() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);

        CombineIdentifier(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for CombineIdentifier {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CombineIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Something that can stop an ongoing activity.
///
/// Cancelling more than once has the same effect as cancelling once.
pub trait Cancellable: Send + Sync {
    fn cancel(&self);

    fn combine_identifier(&self) -> CombineIdentifier;
}

/// The link between one publisher and one subscriber.
///
/// Handed to the subscriber through
/// [`Subscriber::receive_subscription`](crate::Subscriber::receive_subscription).
pub trait Subscription: Cancellable {
    /// Adds `demand` to the outstanding demand and lets the publisher
    /// deliver up to the new total. No-op once the subscription terminated.
    fn request(&self, demand: Demand);
}
