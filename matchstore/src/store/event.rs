use std::fmt::{Debug, Formatter};
use std::path::PathBuf;
use std::sync::Arc;

/// Lifecycle events published by the local store.
///
/// # Variants
///
/// - **CollectionLoaded**: a collection was read from disk into memory
/// - **CollectionPersisted**: a collection file was rewritten; emitted once
///   per touched collection for a single write or a whole batch
/// - **CollectionQuarantined**: an unreadable collection file was copied to
///   the backup directory and the collection started empty
/// - **BackupCreated**: a full snapshot was written
/// - **Restored**: collections were replaced from a snapshot
/// - **Cleared**: every collection was emptied
#[derive(Debug, Clone, PartialEq)]
pub enum StoreEvent {
    CollectionLoaded { collection: String, documents: usize },
    CollectionPersisted { collection: String, documents: usize },
    CollectionQuarantined { collection: String, backup: PathBuf },
    BackupCreated { path: PathBuf },
    Restored { path: PathBuf, collections: Vec<String> },
    Cleared,
}

/// A trait for closures that handle store events.
///
/// Automatically implemented for any `Fn(&StoreEvent)` that is `Send + Sync`.
pub trait StoreEventCallback: Send + Sync + Fn(&StoreEvent) {}

impl<F> StoreEventCallback for F where F: Send + Sync + Fn(&StoreEvent) {}

/// A listener for store events wrapping a callback.
///
/// Cloning is cheap; clones share the callback.
///
/// ```rust
/// use matchstore::store::{StoreEvent, StoreEventListener};
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::sync::Arc;
///
/// let writes = Arc::new(AtomicUsize::new(0));
/// let counter = writes.clone();
/// let listener = StoreEventListener::new(move |event: &StoreEvent| {
///     if let StoreEvent::CollectionPersisted { .. } = event {
///         counter.fetch_add(1, Ordering::Relaxed);
///     }
/// });
/// listener.notify(&StoreEvent::CollectionPersisted { collection: "users".into(), documents: 1 });
/// assert_eq!(writes.load(Ordering::Relaxed), 1);
/// ```
#[derive(Clone)]
pub struct StoreEventListener {
    listener: Arc<dyn StoreEventCallback>,
}

impl StoreEventListener {
    pub fn new<F>(listener: F) -> Self
    where
        F: StoreEventCallback + 'static,
    {
        StoreEventListener {
            listener: Arc::new(listener),
        }
    }

    pub fn notify(&self, event: &StoreEvent) {
        (self.listener)(event)
    }
}

impl Debug for StoreEventListener {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreEventListener").finish_non_exhaustive()
    }
}
