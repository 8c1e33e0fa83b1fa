//! Disposable subscription tokens.
//!
//! A [`SubscriptionHandle`] represents one registered observer. Whoever
//! registered the observer owns the handle; disposing it fires the handle's
//! `Disposed` listeners exactly once, which is how registries and property
//! sources clean up after themselves.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use super::lock;

static NEXT_HANDLE_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique, monotonically increasing handle identity.
///
/// Ordering by id is registration order, which registries rely on when they
/// snapshot their entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandleId(u64);

impl HandleId {
    fn next() -> Self {
        HandleId(NEXT_HANDLE_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

type DisposedListener = Box<dyn FnOnce(&SubscriptionHandle) + Send>;

struct HandleInner {
    id: HandleId,
    disposed: AtomicBool,
    listeners: Mutex<Vec<DisposedListener>>,
}

/// A disposable token for one registered observer.
///
/// Cloning a handle yields another reference to the same subscription:
/// equality and hashing are by identity, never by value.
///
/// # Invariants
///
/// 1. The handle moves from active to disposed exactly once.
/// 2. `dispose()` is idempotent; only the first call has an effect.
/// 3. `Disposed` listeners run synchronously inside the first `dispose()`,
///    in the order they were added, before `dispose()` returns.
#[derive(Clone)]
pub struct SubscriptionHandle {
    inner: Arc<HandleInner>,
}

impl SubscriptionHandle {
    /// Create a new active handle.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(HandleInner {
                id: HandleId::next(),
                disposed: AtomicBool::new(false),
                listeners: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn id(&self) -> HandleId {
        self.inner.id
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.load(Ordering::Acquire)
    }

    /// Add a listener for the `Disposed` notification.
    ///
    /// Returns `false` (and drops the listener without running it) when the
    /// handle is already disposed.
    pub fn on_disposed(&self, listener: impl FnOnce(&SubscriptionHandle) + Send + 'static) -> bool {
        let mut listeners = lock(&self.inner.listeners);
        if self.is_disposed() {
            return false;
        }
        listeners.push(Box::new(listener));
        true
    }

    /// Dispose the subscription.
    ///
    /// The first call fires every `Disposed` listener; later calls do nothing.
    pub fn dispose(&self) {
        if self.inner.disposed.swap(true, Ordering::AcqRel) {
            return;
        }

        // Take the listeners before running them so a listener may touch
        // this handle again without deadlocking.
        let listeners = std::mem::take(&mut *lock(&self.inner.listeners));
        for listener in listeners {
            listener(self);
        }
    }

    /// Wrap the handle in a guard that disposes it on drop.
    pub fn guard(self) -> SubscriptionGuard {
        SubscriptionGuard { handle: self }
    }
}

impl Default for SubscriptionHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for SubscriptionHandle {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for SubscriptionHandle {}

impl Hash for SubscriptionHandle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.inner.id.hash(state);
    }
}

impl fmt::Debug for SubscriptionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriptionHandle")
            .field("id", &self.inner.id.0)
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

/// RAII guard that disposes its handle when dropped.
#[derive(Debug)]
pub struct SubscriptionGuard {
    handle: SubscriptionHandle,
}

impl SubscriptionGuard {
    pub fn handle(&self) -> &SubscriptionHandle {
        &self.handle
    }
}

impl Drop for SubscriptionGuard {
    fn drop(&mut self) {
        self.handle.dispose();
    }
}
