//! Live translation bindings.
//!
//! A [`TranslationBinding`] attaches a [`BindingRecord`] to an owner, resolves
//! it immediately, and, depending on its [`BindingKind`], subscribes to the
//! changes that can invalidate the result:
//!
//! - translator changes through the owner's translator property source,
//!   unless the record pins a translator;
//! - language changes through the owner's language property source and the
//!   language broadcaster, unless the record pins a language;
//! - key changes through the key property source (key-bound records only).
//!
//! Subscriptions are released in reverse order on [`TranslationBinding::detach`]
//! or on drop.

use super::application::{CultureChanged, LanguageChangedFn};
use super::broadcaster::CurrentLanguageBroadcaster;
use super::owner::{PropertyChanged, PropertyId, PropertyOwner};
use super::policy::{
    BindingKind, BindingRecord, ChangeTrigger, KeySource, TranslationResolutionPolicy,
};
use super::property_source::ScopedPropertySource;
use crate::error::Result;
use crate::observer::{lock, Callback, SubscriptionGuard, SubscriptionHandle, WeakObserverRegistry};
use std::fmt;
use std::sync::{Arc, Mutex};
use tracing::{debug, trace};

/// Observer of a binding's resolved value.
pub type ValueObserver = Callback<Option<String>>;

struct BindingInner {
    policy: TranslationResolutionPolicy,
    owner: Arc<dyn PropertyOwner>,
    broadcaster: CurrentLanguageBroadcaster,
    value: Mutex<Option<String>>,
    observers: WeakObserverRegistry<Option<String>>,
}

impl BindingInner {
    fn resolve(&self) -> Option<String> {
        self.policy
            .resolve(self.owner.as_ref(), &self.broadcaster.language())
    }

    /// Re-resolve and notify observers if the value changed.
    fn refresh(&self) {
        let resolved = self.resolve();
        {
            let mut value = lock(&self.value);
            if *value == resolved {
                return;
            }
            value.clone_from(&resolved);
        }

        trace!(
            "Binding on owner {} resolved to {:?}",
            self.owner.owner_id(),
            resolved
        );
        self.observers.notify_all(&resolved);
    }
}

/// A localized value attached to an owner.
pub struct TranslationBinding {
    inner: Arc<BindingInner>,
    subscriptions: Mutex<Vec<SubscriptionGuard>>,
    _sources: Vec<ScopedPropertySource>,
    _property_callback: Arc<Callback<PropertyChanged>>,
    _language_callback: Arc<LanguageChangedFn>,
}

impl TranslationBinding {
    /// Attach `record` to `owner` and perform the first resolution.
    ///
    /// # Returns
    /// * `Err(MissingKey)` if the record has no key source
    pub fn attach(
        owner: Arc<dyn PropertyOwner>,
        record: BindingRecord,
        broadcaster: &CurrentLanguageBroadcaster,
    ) -> Result<TranslationBinding> {
        let policy = TranslationResolutionPolicy::new(record)?;
        let kind = policy.kind();

        let inner = Arc::new(BindingInner {
            policy,
            owner: Arc::clone(&owner),
            broadcaster: broadcaster.clone(),
            value: Mutex::new(None),
            observers: WeakObserverRegistry::new(),
        });
        *lock(&inner.value) = inner.resolve();

        let weak = Arc::downgrade(&inner);
        let property_callback: Arc<Callback<PropertyChanged>> =
            Arc::new(move |_: &PropertyChanged| {
                if let Some(inner) = weak.upgrade() {
                    inner.refresh();
                }
            });
        let weak = Arc::downgrade(&inner);
        let language_callback: Arc<LanguageChangedFn> = Arc::new(move |_: &CultureChanged| {
            if let Some(inner) = weak.upgrade() {
                inner.refresh();
            }
        });

        let mut sources = Vec::new();
        let mut subscriptions = Vec::new();
        let record = inner.policy.record();

        let mut watch = |owner: &Arc<dyn PropertyOwner>, property: PropertyId| {
            let source = ScopedPropertySource::get_or_create(Arc::clone(owner), property);
            subscriptions.push(source.add_observer(&property_callback).guard());
            sources.push(source);
        };

        if kind.reresolves_on(ChangeTrigger::TranslatorChanged)
            && record.fixed_translator().is_none()
        {
            watch(&owner, PropertyId::TRANSLATOR);
        }
        let track_language =
            kind.reresolves_on(ChangeTrigger::LanguageChanged) && record.fixed_language().is_none();
        if track_language {
            watch(&owner, PropertyId::LANGUAGE);
        }
        if kind.reresolves_on(ChangeTrigger::KeyChanged) {
            if let Some(KeySource::Property {
                owner: key_owner,
                property,
            }) = record.key()
            {
                watch(key_owner, *property);
            }
        }
        if track_language {
            subscriptions.push(broadcaster.attach(&language_callback).guard());
        }

        debug!(
            "Attached {:?} translation binding to owner {} ({} subscription(s))",
            kind,
            owner.owner_id(),
            subscriptions.len()
        );

        Ok(TranslationBinding {
            inner,
            subscriptions: Mutex::new(subscriptions),
            _sources: sources,
            _property_callback: property_callback,
            _language_callback: language_callback,
        })
    }

    /// The current display value, or `None` while a bound key is unset.
    pub fn value(&self) -> Option<String> {
        lock(&self.inner.value).clone()
    }

    /// Observe value changes. Observers are only called when the resolved
    /// value actually differs from the previous one.
    pub fn subscribe(&self, observer: &Arc<ValueObserver>) -> SubscriptionHandle {
        self.inner.observers.register(observer)
    }

    pub fn kind(&self) -> BindingKind {
        self.inner.policy.kind()
    }

    /// Number of change subscriptions still held.
    pub fn subscription_count(&self) -> usize {
        lock(&self.subscriptions).len()
    }

    /// Release every change subscription, most recent first. The value is
    /// frozen afterwards. Calling it again is a no-op.
    pub fn detach(&self) {
        let mut subscriptions = std::mem::take(&mut *lock(&self.subscriptions));
        if subscriptions.is_empty() {
            return;
        }
        while let Some(subscription) = subscriptions.pop() {
            drop(subscription);
        }
        debug!(
            "Detached translation binding from owner {}",
            self.inner.owner.owner_id()
        );
    }

    /// Reverse translation is not supported.
    pub fn convert_back(&self, text: &str) -> Result<String> {
        self.inner.policy.convert_back(text)
    }
}

impl Drop for TranslationBinding {
    fn drop(&mut self) {
        self.detach();
    }
}

impl fmt::Debug for TranslationBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TranslationBinding")
            .field("kind", &self.kind())
            .field("owner", &self.inner.owner.owner_id())
            .field("value", &self.value())
            .field("subscriptions", &self.subscription_count())
            .finish()
    }
}
