//! Binding records and the translation resolution policy.
//!
//! A [`BindingRecord`] is the immutable description of one localized value:
//! where its key comes from, which translator and language it may pin, how
//! it is formatted, and how it reacts to change ([`BindingKind`]).
//!
//! [`TranslationResolutionPolicy`] turns a record plus the owner's current
//! state into display text. Resolution is total: a missing translator or
//! translation degrades to the fallback value, or to the key itself.
//!
//! # Update matrix
//!
//! | Kind            | Language change | Translator change | Key change |
//! |-----------------|-----------------|-------------------|------------|
//! | StaticOnce      | no              | no                | no         |
//! | DynamicTracked  | yes             | yes               | no         |
//! | KeyBoundTracked | yes             | yes               | yes        |

use super::owner::{PropertyId, PropertyOwner};
use crate::error::{LocalizationError, Result};
use crate::i18n::{LanguageTag, LocalizationMetrics, StringFormat, TranslationSource};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// How a binding reacts to change after its first resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindingKind {
    /// Resolved once; never updated.
    StaticOnce,
    /// Re-resolved when the language or the translator changes.
    DynamicTracked,
    /// Like `DynamicTracked`, and also re-resolved when the key changes.
    KeyBoundTracked,
}

/// A change that may invalidate a resolved value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeTrigger {
    LanguageChanged,
    TranslatorChanged,
    KeyChanged,
}

impl BindingKind {
    /// Whether a binding of this kind re-resolves on `trigger`.
    pub fn reresolves_on(self, trigger: ChangeTrigger) -> bool {
        match (self, trigger) {
            (BindingKind::StaticOnce, _) => false,
            (BindingKind::DynamicTracked, ChangeTrigger::KeyChanged) => false,
            (BindingKind::DynamicTracked, _) => true,
            (BindingKind::KeyBoundTracked, _) => true,
        }
    }
}

/// Where a binding's key comes from.
#[derive(Clone)]
pub enum KeySource {
    Fixed(String),
    /// Read from a property. An unset property yields no value.
    Property {
        owner: Arc<dyn PropertyOwner>,
        property: PropertyId,
    },
}

impl KeySource {
    pub fn property(owner: Arc<dyn PropertyOwner>, property: PropertyId) -> Self {
        KeySource::Property { owner, property }
    }

    /// The key as of now.
    pub fn current(&self) -> Option<String> {
        match self {
            KeySource::Fixed(key) => Some(key.clone()),
            KeySource::Property { owner, property } => owner
                .get_value(*property)
                .and_then(|value| value.as_text().map(str::to_string)),
        }
    }
}

impl fmt::Debug for KeySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeySource::Fixed(key) => f.debug_tuple("Fixed").field(key).finish(),
            KeySource::Property { owner, property } => f
                .debug_struct("Property")
                .field("owner", &owner.owner_id())
                .field("property", &property.name())
                .finish(),
        }
    }
}

impl From<&str> for KeySource {
    fn from(key: &str) -> Self {
        KeySource::Fixed(key.to_string())
    }
}

impl From<String> for KeySource {
    fn from(key: String) -> Self {
        KeySource::Fixed(key)
    }
}

/// Immutable description of one localized value.
///
/// Built with the `with_*` methods; nothing changes once the record is
/// handed to a binding.
#[derive(Debug, Clone)]
pub struct BindingRecord {
    kind: BindingKind,
    key: Option<KeySource>,
    fixed_translator: Option<Arc<dyn TranslationSource>>,
    fixed_language: Option<LanguageTag>,
    string_format: Option<StringFormat>,
    fallback_value: Option<String>,
}

impl BindingRecord {
    pub fn new(kind: BindingKind) -> Self {
        Self {
            kind,
            key: None,
            fixed_translator: None,
            fixed_language: None,
            string_format: None,
            fallback_value: None,
        }
    }

    /// A `StaticOnce` record for a fixed key.
    pub fn static_once(key: &str) -> Self {
        Self::new(BindingKind::StaticOnce).with_key(key)
    }

    /// A `DynamicTracked` record for a fixed key.
    pub fn dynamic(key: &str) -> Self {
        Self::new(BindingKind::DynamicTracked).with_key(key)
    }

    /// A `KeyBoundTracked` record reading its key from `property` of `owner`.
    pub fn key_bound(owner: Arc<dyn PropertyOwner>, property: PropertyId) -> Self {
        Self::new(BindingKind::KeyBoundTracked).with_key(KeySource::property(owner, property))
    }

    pub fn with_key(mut self, key: impl Into<KeySource>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Pin the translator instead of using the owner's inherited one.
    pub fn with_translator(mut self, translator: Arc<dyn TranslationSource>) -> Self {
        self.fixed_translator = Some(translator);
        self
    }

    /// Pin the language instead of using the owner's or the application's.
    pub fn with_language(mut self, language: LanguageTag) -> Self {
        self.fixed_language = Some(language);
        self
    }

    pub fn with_fallback(mut self, fallback: &str) -> Self {
        self.fallback_value = Some(fallback.to_string());
        self
    }

    /// Set a composite format such as `"[{0}]"`. An empty format means none.
    pub fn with_string_format(mut self, format: &str) -> Result<Self> {
        self.string_format = if format.is_empty() {
            None
        } else {
            Some(StringFormat::parse(format)?)
        };
        Ok(self)
    }

    pub fn kind(&self) -> BindingKind {
        self.kind
    }

    pub fn key(&self) -> Option<&KeySource> {
        self.key.as_ref()
    }

    pub fn fixed_translator(&self) -> Option<&Arc<dyn TranslationSource>> {
        self.fixed_translator.as_ref()
    }

    pub fn fixed_language(&self) -> Option<&LanguageTag> {
        self.fixed_language.as_ref()
    }

    pub fn string_format(&self) -> Option<&StringFormat> {
        self.string_format.as_ref()
    }

    pub fn fallback_value(&self) -> Option<&str> {
        self.fallback_value.as_deref()
    }
}

/// Computes display text for a [`BindingRecord`].
#[derive(Debug, Clone)]
pub struct TranslationResolutionPolicy {
    record: Arc<BindingRecord>,
}

impl TranslationResolutionPolicy {
    /// Wrap a record.
    ///
    /// # Returns
    /// * `Err(MissingKey)` if the record has no key source
    pub fn new(record: BindingRecord) -> Result<Self> {
        if record.key.is_none() {
            return Err(LocalizationError::MissingKey);
        }
        Ok(Self {
            record: Arc::new(record),
        })
    }

    pub fn record(&self) -> &BindingRecord {
        &self.record
    }

    pub fn kind(&self) -> BindingKind {
        self.record.kind
    }

    /// The translator in effect: the pinned one, else the owner's inherited
    /// translator property.
    pub fn translator_for(&self, owner: &dyn PropertyOwner) -> Option<Arc<dyn TranslationSource>> {
        if let Some(translator) = &self.record.fixed_translator {
            return Some(Arc::clone(translator));
        }
        owner
            .get_value(PropertyId::TRANSLATOR)
            .and_then(|value| value.as_translator().cloned())
    }

    /// The culture in effect: the pinned language, else the owner's inherited
    /// language property, else `current_language`.
    pub fn culture_for(
        &self,
        owner: &dyn PropertyOwner,
        current_language: &LanguageTag,
    ) -> LanguageTag {
        if let Some(language) = &self.record.fixed_language {
            return language.clone();
        }
        owner
            .get_value(PropertyId::LANGUAGE)
            .and_then(|value| value.as_language().cloned())
            .unwrap_or_else(|| current_language.clone())
    }

    /// Resolve the record against `owner`.
    ///
    /// Returns `None` only when the key comes from a property that is
    /// currently unset.
    pub fn resolve(
        &self,
        owner: &dyn PropertyOwner,
        current_language: &LanguageTag,
    ) -> Option<String> {
        let key = self.record.key.as_ref()?.current()?;
        let translator = self.translator_for(owner);
        let culture = self.culture_for(owner, current_language);
        Some(self.resolve_key(&key, translator.as_deref(), &culture))
    }

    /// Resolve `key` with an explicit translator and culture.
    pub fn resolve_key(
        &self,
        key: &str,
        translator: Option<&dyn TranslationSource>,
        culture: &LanguageTag,
    ) -> String {
        let metrics = LocalizationMetrics::global();
        let fallback = self.record.fallback_value.as_deref().unwrap_or(key);

        let text = match translator {
            None => {
                metrics.record_untranslated();
                fallback.to_string()
            }
            Some(translator) => match translator.provide_translation(key, culture) {
                Some(text) => {
                    metrics.record_translation_hit();
                    text
                }
                None => {
                    debug!("No translation for '{}' in {}", key, culture);
                    metrics.record_missing_translation();
                    fallback.to_string()
                }
            },
        };

        match &self.record.string_format {
            Some(format) => format.apply(&text),
            None => text,
        }
    }

    /// Reverse translation (display text back to a key) is not supported.
    pub fn convert_back(&self, _text: &str) -> Result<String> {
        Err(LocalizationError::UnsupportedOperation(
            "translating display text back to a key",
        ))
    }
}
