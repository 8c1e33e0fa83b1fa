//! Weakly held observer registry.
//!
//! # Design
//!
//! Each entry maps a [`SubscriptionHandle`] (held strongly) to a `Weak`
//! reference to the observer callback. The registry never keeps a callback
//! alive: the party that registered it owns the strong `Arc`. Two paths
//! remove an entry:
//!
//! - explicit: disposing the handle fires its `Disposed` listener, which the
//!   registry wired at registration time to remove the entry;
//! - lazy: `notify_all()` disposes the handle of every entry whose callback
//!   no longer upgrades.
//!
//! # Failure Modes
//!
//! | Situation | Behavior |
//! |-----------|----------|
//! | Callback dropped without dispose | Pruned during the next `notify_all()` |
//! | Observer disposes itself while notified | Snapshot keeps the pass intact |
//! | Observer disposes a later entry | Later entry is skipped for this pass |

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex, Weak};

use tracing::debug;

use super::lock;
use super::subscription::{HandleId, SubscriptionHandle};
use crate::i18n::LocalizationMetrics;

/// Observer callback type stored (weakly) by a [`WeakObserverRegistry`].
pub type Callback<E> = dyn Fn(&E) + Send + Sync;

struct Entry<E> {
    handle: SubscriptionHandle,
    callback: Weak<Callback<E>>,
}

type Entries<E> = Mutex<BTreeMap<HandleId, Entry<E>>>;

/// A mapping from subscription handles to weakly held callbacks.
///
/// Cloning a registry yields another handle to the same entries.
///
/// # Invariants
///
/// 1. At most one entry per live handle.
/// 2. A dead entry is removed no later than the end of the next
///    `notify_all()` pass.
/// 3. Entries are visited in registration order.
pub struct WeakObserverRegistry<E> {
    entries: Arc<Entries<E>>,
}

impl<E> Clone for WeakObserverRegistry<E> {
    fn clone(&self) -> Self {
        Self {
            entries: Arc::clone(&self.entries),
        }
    }
}

impl<E: 'static> WeakObserverRegistry<E> {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(Mutex::new(BTreeMap::new())),
        }
    }

    /// Register a callback and return the handle that controls it.
    ///
    /// Only a weak reference to `callback` is stored; the caller must keep
    /// the `Arc` alive for as long as it wants to be notified.
    pub fn register(&self, callback: &Arc<Callback<E>>) -> SubscriptionHandle {
        let handle = SubscriptionHandle::new();

        let entries = Arc::downgrade(&self.entries);
        handle.on_disposed(move |sender| {
            if let Some(entries) = entries.upgrade() {
                lock(&entries).remove(&sender.id());
            }
        });

        lock(&self.entries).insert(
            handle.id(),
            Entry {
                handle: handle.clone(),
                callback: Arc::downgrade(callback),
            },
        );

        handle
    }

    /// Notify every live observer and prune the collected ones.
    ///
    /// Iterates a snapshot taken at call time; the registry lock is not held
    /// while callbacks run.
    pub fn notify_all(&self, event: &E) {
        let snapshot: Vec<(SubscriptionHandle, Weak<Callback<E>>)> = lock(&self.entries)
            .values()
            .map(|entry| (entry.handle.clone(), entry.callback.clone()))
            .collect();

        let mut pruned = 0usize;
        for (handle, callback) in snapshot {
            if handle.is_disposed() {
                continue;
            }
            match callback.upgrade() {
                Some(callback) => callback(event),
                None => {
                    handle.dispose();
                    pruned += 1;
                }
            }
        }

        if pruned > 0 {
            debug!("Pruned {} collected observer(s)", pruned);
            LocalizationMetrics::global().record_pruned_observers(pruned);
        }
    }

    /// Number of entries, including dead ones not yet pruned.
    pub fn len(&self) -> usize {
        lock(&self.entries).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether `handle` currently has an entry in this registry.
    pub fn contains(&self, handle: &SubscriptionHandle) -> bool {
        lock(&self.entries).contains_key(&handle.id())
    }
}

impl<E: 'static> Default for WeakObserverRegistry<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> fmt::Debug for WeakObserverRegistry<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakObserverRegistry")
            .field("entries", &lock(&self.entries).len())
            .finish()
    }
}
