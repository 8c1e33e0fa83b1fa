//! Resource bundles: named culture → key → text tables grouped in containers.
//!
//! A [`ResourceContainer`] plays the role of the unit that ships resources
//! (one per application or plugin). It holds bundles by base name. A
//! [`BundleTranslationSource`] is a translator backed by one bundle; creating
//! it for a base name the container does not hold fails immediately, so a
//! misconfigured translator is reported once, at construction, instead of as
//! a stream of missing translations.

use super::{LanguageTag, TranslationSource};
use crate::error::{LocalizationError, Result};
use crate::observer::lock;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Culture → key → text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceBundle {
    cultures: HashMap<LanguageTag, HashMap<String, String>>,
}

/// JSON shape: `{ "<culture>": { "<key>": "<text>" } }`, with `""` for the
/// invariant culture.
#[derive(Debug, Deserialize)]
#[serde(transparent)]
struct RawBundle(HashMap<String, HashMap<String, String>>);

impl ResourceBundle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a bundle from its JSON representation.
    pub fn from_json(json: &str) -> Result<ResourceBundle> {
        let raw: RawBundle = serde_json::from_str(json)
            .map_err(|e| LocalizationError::InvalidBundle(e.to_string()))?;

        let mut bundle = ResourceBundle::new();
        for (culture, entries) in raw.0 {
            let culture = LanguageTag::parse(&culture)?;
            bundle.cultures.entry(culture).or_default().extend(entries);
        }
        Ok(bundle)
    }

    /// Add a translation, builder style.
    pub fn with(mut self, culture: &LanguageTag, key: &str, value: &str) -> Self {
        self.insert(culture, key, value);
        self
    }

    pub fn insert(&mut self, culture: &LanguageTag, key: &str, value: &str) {
        self.cultures
            .entry(culture.clone())
            .or_default()
            .insert(key.to_string(), value.to_string());
    }

    /// Exact lookup without culture fallback.
    pub fn get(&self, culture: &LanguageTag, key: &str) -> Option<&str> {
        self.cultures
            .get(culture)
            .and_then(|entries| entries.get(key))
            .map(String::as_str)
    }

    /// Lookup walking `culture`'s fallback chain down to the invariant
    /// culture.
    pub fn lookup(&self, culture: &LanguageTag, key: &str) -> Option<&str> {
        culture
            .fallback_chain()
            .iter()
            .find_map(|candidate| self.get(candidate, key))
    }

    pub fn cultures(&self) -> Vec<&LanguageTag> {
        let mut cultures: Vec<_> = self.cultures.keys().collect();
        cultures.sort();
        cultures
    }
}

/// A named set of bundles.
#[derive(Debug, Clone)]
pub struct ResourceContainer {
    name: String,
    bundles: HashMap<String, Arc<ResourceBundle>>,
}

impl ResourceContainer {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            bundles: HashMap::new(),
        }
    }

    pub fn with_bundle(mut self, base_name: &str, bundle: ResourceBundle) -> Self {
        self.bundles.insert(base_name.to_string(), Arc::new(bundle));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bundle(&self, base_name: &str) -> Option<Arc<ResourceBundle>> {
        self.bundles.get(base_name).cloned()
    }
}

/// A translator backed by one bundle of a container.
#[derive(Debug, Clone)]
pub struct BundleTranslationSource {
    base_name: String,
    container: String,
    bundle: Arc<ResourceBundle>,
}

impl BundleTranslationSource {
    /// Create a translator for `base_name` in `container`.
    ///
    /// # Returns
    /// * `Err(ResourceLookup)` naming the bundle and the container when the
    ///   container has no bundle with that base name
    pub fn new(base_name: &str, container: &ResourceContainer) -> Result<Self> {
        let bundle = container
            .bundle(base_name)
            .ok_or_else(|| LocalizationError::ResourceLookup {
                bundle: base_name.to_string(),
                container: container.name().to_string(),
            })?;

        debug!(
            "Created bundle translator for '{}' in container '{}'",
            base_name,
            container.name()
        );

        Ok(Self {
            base_name: base_name.to_string(),
            container: container.name().to_string(),
            bundle,
        })
    }

    pub fn base_name(&self) -> &str {
        &self.base_name
    }

    pub fn container(&self) -> &str {
        &self.container
    }
}

impl TranslationSource for BundleTranslationSource {
    fn provide_translation(&self, key: &str, culture: &LanguageTag) -> Option<String> {
        self.bundle.lookup(culture, key).map(str::to_string)
    }
}

/// Registry of containers, looked up by name when opening provider paths.
#[derive(Debug, Default)]
pub struct ResourceCatalog {
    containers: Mutex<HashMap<String, Arc<ResourceContainer>>>,
}

impl ResourceCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a container, replacing any previous one with the same name.
    pub fn register(&self, container: ResourceContainer) {
        let name = container.name().to_string();
        lock(&self.containers).insert(name, Arc::new(container));
    }

    pub fn container(&self, name: &str) -> Result<Arc<ResourceContainer>> {
        lock(&self.containers)
            .get(name)
            .cloned()
            .ok_or_else(|| LocalizationError::UnknownContainer(name.to_string()))
    }
}
