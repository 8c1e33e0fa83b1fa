//! Live localization for property-based UI object trees.
//!
//! Bindings resolve translation keys against an inherited translator and
//! language, and re-resolve when either changes. Change propagation never
//! keeps an observer alive: registries hold callbacks weakly and prune the
//! dead ones on the next notification.

pub mod binding;
pub mod config;
pub mod error;
pub mod i18n;
pub mod observer;

pub use binding::{
    Application, BindingKind, BindingRecord, CurrentLanguageBroadcaster, Element, PropertyId,
    PropertyOwner, PropertyValue, TranslationBinding,
};
pub use error::{LocalizationError, Result};
pub use i18n::{LanguageTag, TranslationSource};
pub use observer::{SubscriptionHandle, WeakObserverRegistry};
