//! Translation sources: the capability that maps (key, culture) to text.

use super::{LanguageTag, StringFormat};
use std::collections::HashMap;
use std::fmt;

/// A provider for translations.
///
/// Implementations must be cheap and safe to call repeatedly from any
/// thread. Returning `None` means "no translation for this key and culture";
/// it is never an error.
pub trait TranslationSource: Send + Sync + fmt::Debug {
    /// Provide a translation for `key` in `culture`, or `None` if there is
    /// none.
    fn provide_translation(&self, key: &str, culture: &LanguageTag) -> Option<String>;
}

/// Fallback and formatting helpers available on every [`TranslationSource`].
pub trait TranslationSourceExt: TranslationSource {
    /// Translate `key`, substituting `fallback` when there is no translation.
    fn provide_translation_or(&self, key: &str, culture: &LanguageTag, fallback: &str) -> String {
        self.provide_translation(key, culture)
            .unwrap_or_else(|| fallback.to_string())
    }

    /// Translate `key` with fallback substitution, then apply `format`.
    fn provide_formatted(
        &self,
        key: &str,
        culture: &LanguageTag,
        fallback: &str,
        format: Option<&StringFormat>,
    ) -> String {
        let value = self.provide_translation_or(key, culture, fallback);
        match format {
            Some(format) => format.apply(&value),
            None => value,
        }
    }
}

impl<T: TranslationSource + ?Sized> TranslationSourceExt for T {}

/// A fixed in-memory translation table.
///
/// Lookups are exact: a missing (culture, key) pair yields `None` without
/// consulting parent cultures. Use a bundle-backed source for culture
/// fallback.
#[derive(Debug, Clone, Default)]
pub struct StaticTranslations {
    entries: HashMap<(LanguageTag, String), String>,
}

impl StaticTranslations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a translation, builder style.
    pub fn with(mut self, culture: &LanguageTag, key: &str, value: &str) -> Self {
        self.insert(culture, key, value);
        self
    }

    pub fn insert(&mut self, culture: &LanguageTag, key: &str, value: &str) {
        self.entries
            .insert((culture.clone(), key.to_string()), value.to_string());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl TranslationSource for StaticTranslations {
    fn provide_translation(&self, key: &str, culture: &LanguageTag) -> Option<String> {
        self.entries
            .get(&(culture.clone(), key.to_string()))
            .cloned()
    }
}
