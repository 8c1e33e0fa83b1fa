//! Application-wide language state.
//!
//! An [`Application`] owns the current UI language and a strongly held list
//! of language-changed listeners. A process normally uses the one returned by
//! [`Application::global()`]; tests create their own instances.

use crate::i18n::LanguageTag;
use crate::observer::{lock, SubscriptionHandle};
use std::env;
use std::fmt;
use std::sync::{Arc, Mutex, OnceLock};
use tracing::{debug, info, warn};

/// Raised when the application's current language changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CultureChanged {
    pub old: LanguageTag,
    pub new: LanguageTag,
}

/// Listener type for language changes.
pub type LanguageChangedFn = dyn Fn(&CultureChanged) + Send + Sync;

struct Listener {
    callback: Arc<LanguageChangedFn>,
    handle: SubscriptionHandle,
}

struct ApplicationInner {
    current: Mutex<LanguageTag>,
    listeners: Mutex<Vec<Listener>>,
}

/// Holder of the current UI language. Cloning yields another handle to the
/// same state.
#[derive(Clone)]
pub struct Application {
    inner: Arc<ApplicationInner>,
}

static GLOBAL_APPLICATION: OnceLock<Application> = OnceLock::new();

impl Application {
    pub fn new(language: LanguageTag) -> Self {
        Self {
            inner: Arc::new(ApplicationInner {
                current: Mutex::new(language),
                listeners: Mutex::new(Vec::new()),
            }),
        }
    }

    /// The process-wide application, starting in the installed UI language.
    pub fn global() -> &'static Application {
        GLOBAL_APPLICATION.get_or_init(|| Application::new(installed_language()))
    }

    pub fn current_language(&self) -> LanguageTag {
        lock(&self.inner.current).clone()
    }

    /// Change the current language and notify every listener.
    ///
    /// Setting the language it already has is a no-op.
    pub fn set_current_language(&self, language: LanguageTag) {
        let old = {
            let mut current = lock(&self.inner.current);
            if *current == language {
                return;
            }
            std::mem::replace(&mut *current, language.clone())
        };

        info!("Current language changed from {} to {}", old, language);

        let callbacks: Vec<Arc<LanguageChangedFn>> = lock(&self.inner.listeners)
            .iter()
            .map(|listener| Arc::clone(&listener.callback))
            .collect();

        let event = CultureChanged { old, new: language };
        for callback in callbacks {
            callback(&event);
        }
    }

    /// Register a language-changed listener.
    ///
    /// Listeners are held strongly until their handle is disposed.
    /// Registering the same callback again returns the existing handle.
    pub fn register_language_changed(
        &self,
        callback: &Arc<LanguageChangedFn>,
    ) -> SubscriptionHandle {
        let mut listeners = lock(&self.inner.listeners);
        if let Some(existing) = listeners
            .iter()
            .find(|listener| Arc::ptr_eq(&listener.callback, callback))
        {
            return existing.handle.clone();
        }

        let handle = SubscriptionHandle::new();
        let weak = Arc::downgrade(&self.inner);
        handle.on_disposed(move |sender| {
            if let Some(inner) = weak.upgrade() {
                lock(&inner.listeners).retain(|listener| listener.handle != *sender);
            }
        });

        listeners.push(Listener {
            callback: Arc::clone(callback),
            handle: handle.clone(),
        });
        debug!("Registered language listener ({} total)", listeners.len());

        handle
    }

    pub fn listener_count(&self) -> usize {
        lock(&self.inner.listeners).len()
    }

    /// Whether both handles refer to the same application state.
    pub fn ptr_eq(&self, other: &Application) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Application {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Application")
            .field("current_language", &self.current_language())
            .field("listeners", &self.listener_count())
            .finish()
    }
}

/// The installed UI language, read from the POSIX locale variables
/// (`LC_ALL`, `LC_MESSAGES`, `LANG`), e.g. `de_DE.UTF-8` becomes `de-DE`.
/// Falls back to the invariant culture.
pub fn installed_language() -> LanguageTag {
    ["LC_ALL", "LC_MESSAGES", "LANG"]
        .iter()
        .filter_map(|name| env::var(name).ok())
        .find(|value| !value.is_empty())
        .and_then(|value| parse_locale(&value))
        .unwrap_or_default()
}

fn parse_locale(value: &str) -> Option<LanguageTag> {
    let without_encoding = value.split(['.', '@']).next().unwrap_or_default();
    if matches!(without_encoding, "C" | "POSIX") {
        return None;
    }
    match LanguageTag::parse(without_encoding) {
        Ok(language) => Some(language),
        Err(_) => {
            warn!("Unrecognized locale '{}', using the invariant culture", value);
            None
        }
    }
}
