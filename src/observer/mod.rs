//! Change-propagation primitives.
//!
//! - `subscription`: [`SubscriptionHandle`], a disposable token that fires a
//!   `Disposed` notification exactly once, and [`SubscriptionGuard`], its
//!   drop-to-dispose wrapper.
//! - `registry`: [`WeakObserverRegistry`], handle → weakly held callback,
//!   self-pruning during notification.
//!
//! Everything here is `Send + Sync`. Locks are only held long enough to
//! snapshot or mutate entries; callbacks always run outside them.

mod registry;
mod subscription;

pub use registry::{Callback, WeakObserverRegistry};
pub use subscription::{HandleId, SubscriptionGuard, SubscriptionHandle};

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Lock a mutex, recovering the data if a previous holder panicked.
///
/// Every state transition guarded this way is idempotent, so the inner
/// value is still consistent after a poisoning panic.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
