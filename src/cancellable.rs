use std::{
    collections::HashSet,
    fmt,
    hash::{Hash, Hasher},
    sync::{Arc, Mutex},
};

use crate::{subscription::lock, Cancellable, CombineIdentifier};

/// Type-erased cancellable that cancels when dropped.
///
/// Two `AnyCancellable`s are equal when they wrap the same underlying
/// subscription.
pub struct AnyCancellable {
    id: CombineIdentifier,
    inner: Mutex<Option<Arc<dyn Cancellable>>>,
}

impl AnyCancellable {
    pub fn new(cancellable: Arc<dyn Cancellable>) -> Self {
        AnyCancellable {
            id: cancellable.combine_identifier(),
            inner: Mutex::new(Some(cancellable)),
        }
    }

    /// Runs `cancel` once, on the first cancellation.
    pub fn from_fn<F>(cancel: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self::new(Arc::new(CancelFn {
            id: CombineIdentifier::new(),
            cancel: Mutex::new(Some(Box::new(cancel))),
        }))
    }

    pub fn store(self, bag: &mut CancelBag) {
        bag.insert(self);
    }

    /// Gives up ownership without cancelling.
    fn disarm(self) {
        lock(&self.inner).take();
    }
}

impl Cancellable for AnyCancellable {
    fn cancel(&self) {
        let inner = lock(&self.inner).take();

        if let Some(inner) = inner {
            inner.cancel();
        }
    }

    fn combine_identifier(&self) -> CombineIdentifier {
        self.id
    }
}

impl Drop for AnyCancellable {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl PartialEq for AnyCancellable {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for AnyCancellable {}

impl Hash for AnyCancellable {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for AnyCancellable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnyCancellable").field("id", &self.id).finish()
    }
}

type CancelBox = Box<dyn FnOnce() + Send>;

struct CancelFn {
    id: CombineIdentifier,
    cancel: Mutex<Option<CancelBox>>,
}

impl Cancellable for CancelFn {
    fn cancel(&self) {
        let cancel = lock(&self.cancel).take();

        if let Some(cancel) = cancel {
            cancel();
        }
    }

    fn combine_identifier(&self) -> CombineIdentifier {
        self.id
    }
}

/// Owns subscriptions for the lifetime of some scope.
///
/// Everything stored here is cancelled exactly once, either by
/// [`CancelBag::cancel_all`] or when the bag is dropped.
#[derive(Debug, Default)]
pub struct CancelBag {
    items: HashSet<AnyCancellable>,
}

impl CancelBag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false if the same subscription is already held; the duplicate
    /// handle is released without cancelling anything.
    pub fn insert(&mut self, cancellable: AnyCancellable) -> bool {
        if self.items.contains(&cancellable) {
            log::debug!("{} already stored", cancellable.id);
            cancellable.disarm();
            return false;
        }

        self.items.insert(cancellable)
    }

    pub fn contains(&self, id: CombineIdentifier) -> bool {
        self.items.iter().any(|item| item.id == id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn cancel_all(&mut self) {
        if !self.items.is_empty() {
            log::debug!("cancelling {} subscriptions", self.items.len());
        }

        for item in self.items.drain() {
            item.cancel();
        }
    }
}

impl Drop for CancelBag {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    fn counting() -> (AnyCancellable, Arc<AtomicUsize>) {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let cancellable = AnyCancellable::from_fn(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        (cancellable, hits)
    }

    #[test]
    fn test_cancel_is_idempotent() {
        let (cancellable, hits) = counting();

        cancellable.cancel();
        cancellable.cancel();
        drop(cancellable);

        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_drop_cancels() {
        let (cancellable, hits) = counting();

        drop(cancellable);

        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_bag_cancels_everything_once_on_drop() {
        let mut bag = CancelBag::new();
        let (first, first_hits) = counting();
        let (second, second_hits) = counting();

        first.store(&mut bag);
        second.store(&mut bag);
        assert_eq!(bag.len(), 2);

        drop(bag);

        assert_eq!(first_hits.load(Ordering::SeqCst), 1);
        assert_eq!(second_hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_bag_dedups_by_identity() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let shared: Arc<dyn Cancellable> = Arc::new(CancelFn {
            id: CombineIdentifier::new(),
            cancel: Mutex::new(Some(Box::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            }))),
        });

        let mut bag = CancelBag::new();
        assert!(bag.insert(AnyCancellable::new(shared.clone())));
        assert!(!bag.insert(AnyCancellable::new(shared.clone())));
        assert_eq!(bag.len(), 1);
        assert!(bag.contains(shared.combine_identifier()));

        // The rejected duplicate must not have cancelled the stored one.
        assert_eq!(hits.load(Ordering::SeqCst), 0);

        bag.cancel_all();
        assert!(bag.is_empty());
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}
