//! Shared, reference-counted observation of one property on one owner.
//!
//! Many bindings on the same owner watch the same property (every label
//! below a window watches its inherited translator). Instead of each binding
//! hooking the owner, they share one [`ScopedPropertySource`] per
//! (owner, property) pair:
//!
//! - the first observer attaches one native change subscription;
//! - later observers only join the source's own weak registry;
//! - when the last observer is disposed the native subscription is released
//!   and the pair is evicted from the cache.
//!
//! The cache holds sources weakly, so a source nobody keeps is freed even if
//! it was never observed.

use super::owner::{OwnerId, PropertyChanged, PropertyId, PropertyOwner, PropertyValue};
use crate::observer::{lock, Callback, SubscriptionHandle, WeakObserverRegistry};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, OnceLock, Weak};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct SourceKey {
    owner: OwnerId,
    property: PropertyId,
}

type SourceCache = Mutex<HashMap<SourceKey, Weak<SourceInner>>>;

static SOURCE_CACHE: OnceLock<SourceCache> = OnceLock::new();

fn source_cache() -> &'static SourceCache {
    SOURCE_CACHE.get_or_init(|| Mutex::new(HashMap::new()))
}

struct NativeAttachment {
    handle: SubscriptionHandle,
    // The owner holds this weakly; the attachment keeps it alive.
    _callback: Arc<Callback<PropertyChanged>>,
}

#[derive(Default)]
struct SourceState {
    observer_count: usize,
    native: Option<NativeAttachment>,
}

struct SourceInner {
    key: SourceKey,
    owner: Arc<dyn PropertyOwner>,
    observers: WeakObserverRegistry<PropertyChanged>,
    state: Mutex<SourceState>,
}

impl SourceInner {
    fn acquire(self: &Arc<Self>) {
        let attached = {
            let mut state = lock(&self.state);
            state.observer_count += 1;
            if state.observer_count > 1 {
                return;
            }

            let weak = Arc::downgrade(self);
            let property = self.key.property;
            let callback: Arc<Callback<PropertyChanged>> =
                Arc::new(move |event: &PropertyChanged| {
                    if event.property != property {
                        return;
                    }
                    if let Some(inner) = weak.upgrade() {
                        inner.observers.notify_all(event);
                    }
                });
            let handle = self.owner.observe_changes(&callback);
            state.native = Some(NativeAttachment {
                handle,
                _callback: callback,
            });
            true
        };

        if attached {
            debug!(
                "Attached property source '{}' to owner {}",
                self.key.property.name(),
                self.key.owner
            );
            // An evicted source that gains observers again takes its slot
            // back unless a newer source already holds it.
            let mut cache = lock(source_cache());
            let vacant = cache
                .get(&self.key)
                .map_or(true, |existing| existing.strong_count() == 0);
            if vacant {
                cache.insert(self.key, Arc::downgrade(self));
            }
        }
    }

    fn release(self: &Arc<Self>) {
        let native = {
            let mut state = lock(&self.state);
            state.observer_count = state.observer_count.saturating_sub(1);
            if state.observer_count > 0 {
                return;
            }
            state.native.take()
        };

        if let Some(native) = native {
            native.handle.dispose();
        }
        self.evict(Arc::as_ptr(self));

        debug!(
            "Released property source '{}' on owner {}",
            self.key.property.name(),
            self.key.owner
        );
    }

    /// Remove the cache slot if it still refers to `this`.
    fn evict(&self, this: *const SourceInner) {
        let mut cache = lock(source_cache());
        let is_self = cache
            .get(&self.key)
            .is_some_and(|existing| std::ptr::eq(existing.as_ptr(), this));
        if is_self {
            cache.remove(&self.key);
        }
    }
}

impl Drop for SourceInner {
    fn drop(&mut self) {
        let state = self
            .state
            .get_mut()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if let Some(native) = state.native.take() {
            native.handle.dispose();
        }
        self.evict(self as *const SourceInner);
    }
}

/// Observable view of one property of one owner, shared through a
/// process-wide cache keyed by (owner, property).
#[derive(Clone)]
pub struct ScopedPropertySource {
    inner: Arc<SourceInner>,
}

impl ScopedPropertySource {
    /// Return the cached source for (`owner`, `property`), creating it if the
    /// pair has no live source.
    pub fn get_or_create(owner: Arc<dyn PropertyOwner>, property: PropertyId) -> Self {
        let key = SourceKey {
            owner: owner.owner_id(),
            property,
        };

        let mut cache = lock(source_cache());
        if let Some(inner) = cache.get(&key).and_then(Weak::upgrade) {
            return Self { inner };
        }

        let inner = Arc::new(SourceInner {
            key,
            owner,
            observers: WeakObserverRegistry::new(),
            state: Mutex::new(SourceState::default()),
        });
        cache.retain(|_, existing| existing.strong_count() > 0);
        cache.insert(key, Arc::downgrade(&inner));

        debug!(
            "Created property source '{}' for owner {}",
            property.name(),
            key.owner
        );
        Self { inner }
    }

    /// Observe changes of the watched property.
    ///
    /// The first observer attaches the native owner subscription. Disposing
    /// the returned handle releases the observer; releasing the last one
    /// detaches from the owner and evicts this source from the cache.
    pub fn add_observer(&self, callback: &Arc<Callback<PropertyChanged>>) -> SubscriptionHandle {
        let handle = self.inner.observers.register(callback);

        let weak = Arc::downgrade(&self.inner);
        let registered = handle.on_disposed(move |_| {
            if let Some(inner) = weak.upgrade() {
                inner.release();
            }
        });

        if registered {
            self.inner.acquire();
        }
        handle
    }

    /// Current effective value of the watched property.
    pub fn value(&self) -> Option<PropertyValue> {
        self.inner.owner.get_value(self.inner.key.property)
    }

    pub fn owner_id(&self) -> OwnerId {
        self.inner.key.owner
    }

    pub fn property(&self) -> PropertyId {
        self.inner.key.property
    }

    /// Number of observers not yet disposed.
    pub fn observer_count(&self) -> usize {
        lock(&self.inner.state).observer_count
    }

    /// Whether the native owner subscription is currently held.
    pub fn is_attached(&self) -> bool {
        lock(&self.inner.state).native.is_some()
    }

    /// Whether both values refer to the same shared source.
    pub fn ptr_eq(&self, other: &ScopedPropertySource) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Whether the cache currently maps (`owner`, `property`) to a live
    /// source.
    pub fn is_cached(owner: OwnerId, property: PropertyId) -> bool {
        lock(source_cache())
            .get(&SourceKey { owner, property })
            .is_some_and(|existing| existing.strong_count() > 0)
    }
}

impl fmt::Debug for ScopedPropertySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopedPropertySource")
            .field("owner", &self.inner.key.owner)
            .field("property", &self.inner.key.property.name())
            .field("observers", &self.observer_count())
            .finish()
    }
}
