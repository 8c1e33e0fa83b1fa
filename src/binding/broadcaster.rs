//! Fan-out of application language changes to bindings.
//!
//! Every tracked binding needs to hear about language changes, but the
//! application should not end up with one listener per binding. The
//! broadcaster holds a single upstream registration, taken when its first
//! listener attaches and released when its last listener detaches.

use super::application::{Application, CultureChanged, LanguageChangedFn};
use crate::i18n::LanguageTag;
use crate::observer::{lock, SubscriptionHandle};
use std::fmt;
use std::sync::{Arc, Mutex, OnceLock, Weak};
use tracing::debug;

struct Listener {
    callback: Arc<LanguageChangedFn>,
    handle: SubscriptionHandle,
}

struct Upstream {
    handle: SubscriptionHandle,
    _callback: Arc<LanguageChangedFn>,
}

#[derive(Default)]
struct BroadcasterState {
    listeners: Vec<Listener>,
    upstream: Option<Upstream>,
}

struct BroadcasterInner {
    application: Application,
    state: Mutex<BroadcasterState>,
}

impl BroadcasterInner {
    fn broadcast(&self, event: &CultureChanged) {
        let callbacks: Vec<Arc<LanguageChangedFn>> = lock(&self.state)
            .listeners
            .iter()
            .map(|listener| Arc::clone(&listener.callback))
            .collect();

        debug!(
            "Broadcasting language change to {} listener(s)",
            callbacks.len()
        );
        for callback in callbacks {
            callback(event);
        }
    }

    fn detach(&self, handle: &SubscriptionHandle) {
        let upstream = {
            let mut state = lock(&self.state);
            state.listeners.retain(|listener| listener.handle != *handle);
            if !state.listeners.is_empty() {
                return;
            }
            state.upstream.take()
        };

        if let Some(upstream) = upstream {
            upstream.handle.dispose();
            debug!("Last language listener detached, released application subscription");
        }
    }
}

/// Shared source of "current language" changes.
///
/// Cloning yields another handle to the same broadcaster.
#[derive(Clone)]
pub struct CurrentLanguageBroadcaster {
    inner: Arc<BroadcasterInner>,
}

static GLOBAL_BROADCASTER: OnceLock<CurrentLanguageBroadcaster> = OnceLock::new();

impl CurrentLanguageBroadcaster {
    pub fn new(application: Application) -> Self {
        Self {
            inner: Arc::new(BroadcasterInner {
                application,
                state: Mutex::new(BroadcasterState::default()),
            }),
        }
    }

    /// The broadcaster for [`Application::global()`].
    pub fn global() -> &'static CurrentLanguageBroadcaster {
        GLOBAL_BROADCASTER
            .get_or_init(|| CurrentLanguageBroadcaster::new(Application::global().clone()))
    }

    /// Attach a listener for language changes.
    ///
    /// Attaching the same callback twice returns the existing handle. The
    /// first attach registers with the application; disposing the last
    /// handle unregisters.
    pub fn attach(&self, callback: &Arc<LanguageChangedFn>) -> SubscriptionHandle {
        let mut state = lock(&self.inner.state);
        if let Some(existing) = state
            .listeners
            .iter()
            .find(|listener| Arc::ptr_eq(&listener.callback, callback))
        {
            return existing.handle.clone();
        }

        let handle = SubscriptionHandle::new();
        let weak: Weak<BroadcasterInner> = Arc::downgrade(&self.inner);
        handle.on_disposed(move |sender| {
            if let Some(inner) = weak.upgrade() {
                inner.detach(sender);
            }
        });

        state.listeners.push(Listener {
            callback: Arc::clone(callback),
            handle: handle.clone(),
        });

        if state.upstream.is_none() {
            let weak = Arc::downgrade(&self.inner);
            let upstream: Arc<LanguageChangedFn> = Arc::new(move |event: &CultureChanged| {
                if let Some(inner) = weak.upgrade() {
                    inner.broadcast(event);
                }
            });
            let upstream_handle = self.inner.application.register_language_changed(&upstream);
            state.upstream = Some(Upstream {
                handle: upstream_handle,
                _callback: upstream,
            });
            debug!("First language listener attached, subscribed to application");
        }

        handle
    }

    /// The application's current language.
    pub fn language(&self) -> LanguageTag {
        self.inner.application.current_language()
    }

    /// Change the application's current language.
    pub fn set_language(&self, language: LanguageTag) {
        self.inner.application.set_current_language(language);
    }

    pub fn application(&self) -> &Application {
        &self.inner.application
    }

    pub fn listener_count(&self) -> usize {
        lock(&self.inner.state).listeners.len()
    }

    /// Whether the broadcaster currently holds its application subscription.
    pub fn is_subscribed(&self) -> bool {
        lock(&self.inner.state).upstream.is_some()
    }
}

impl fmt::Debug for CurrentLanguageBroadcaster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CurrentLanguageBroadcaster")
            .field("language", &self.language())
            .field("listeners", &self.listener_count())
            .field("subscribed", &self.is_subscribed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn tag(value: &str) -> LanguageTag {
        LanguageTag::parse(value).unwrap()
    }

    fn counter() -> (Arc<AtomicUsize>, Arc<LanguageChangedFn>) {
        let count = Arc::new(AtomicUsize::new(0));
        let count_clone = Arc::clone(&count);
        let callback: Arc<LanguageChangedFn> = Arc::new(move |_: &CultureChanged| {
            count_clone.fetch_add(1, Ordering::SeqCst);
        });
        (count, callback)
    }

    #[test]
    fn test_single_upstream_registration() {
        let app = Application::new(tag("en"));
        let broadcaster = CurrentLanguageBroadcaster::new(app.clone());
        let (c1, cb1) = counter();
        let (c2, cb2) = counter();

        let _h1 = broadcaster.attach(&cb1);
        let _h2 = broadcaster.attach(&cb2);
        assert_eq!(app.listener_count(), 1);
        assert!(broadcaster.is_subscribed());

        broadcaster.set_language(tag("de"));
        assert_eq!(c1.load(Ordering::SeqCst), 1);
        assert_eq!(c2.load(Ordering::SeqCst), 1);
        assert_eq!(broadcaster.language(), tag("de"));
    }

    #[test]
    fn test_attach_is_idempotent() {
        let broadcaster = CurrentLanguageBroadcaster::new(Application::new(tag("en")));
        let (count, callback) = counter();

        let h1 = broadcaster.attach(&callback);
        let h2 = broadcaster.attach(&callback);
        assert_eq!(h1, h2);
        assert_eq!(broadcaster.listener_count(), 1);

        broadcaster.set_language(tag("fr"));
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_last_detach_releases_upstream() {
        let app = Application::new(tag("en"));
        let broadcaster = CurrentLanguageBroadcaster::new(app.clone());
        let (_, cb1) = counter();
        let (_, cb2) = counter();
        let h1 = broadcaster.attach(&cb1);
        let h2 = broadcaster.attach(&cb2);

        h1.dispose();
        assert!(broadcaster.is_subscribed());
        h2.dispose();
        assert!(!broadcaster.is_subscribed());
        assert_eq!(app.listener_count(), 0);

        // Re-attaching subscribes again.
        let (count, cb3) = counter();
        let _h3 = broadcaster.attach(&cb3);
        assert_eq!(app.listener_count(), 1);
        app.set_current_language(tag("it"));
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_disposed_listener_not_notified() {
        let broadcaster = CurrentLanguageBroadcaster::new(Application::new(tag("en")));
        let (c1, cb1) = counter();
        let (c2, cb2) = counter();
        let h1 = broadcaster.attach(&cb1);
        let _h2 = broadcaster.attach(&cb2);

        h1.dispose();
        broadcaster.set_language(tag("de"));
        assert_eq!(c1.load(Ordering::SeqCst), 0);
        assert_eq!(c2.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_global_is_bound_to_global_application() {
        let broadcaster = CurrentLanguageBroadcaster::global();
        assert!(broadcaster.application().ptr_eq(Application::global()));
    }
}
