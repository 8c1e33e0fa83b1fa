//! Internationalization (i18n) building blocks.
//!
//! Everything a binding needs to turn a key into text, independent of how
//! change notifications flow.
//!
//! # Architecture
//!
//! - `language`: validated `LanguageTag` with its parent fallback chain
//! - `source`: the `TranslationSource` capability plus fallback/format helpers
//! - `format`: composite format strings, validated at construction
//! - `bundle`: culture → key → text bundles, containers and a catalog
//! - `provider_path`: `bundle://container;name` translator references
//! - `metrics`: resolution and pruning counters
//!
//! # Example
//!
//! ```rust,ignore
//! use live_l10n::i18n::{LanguageTag, StaticTranslations, TranslationSourceExt};
//!
//! let en = LanguageTag::parse("en")?;
//! let source = StaticTranslations::new().with(&en, "Greeting", "Hi");
//! assert_eq!(source.provide_translation_or("Greeting", &en, "Greeting"), "Hi");
//! ```

mod bundle;
mod format;
mod language;
mod metrics;
mod provider_path;
mod source;

pub use bundle::{BundleTranslationSource, ResourceBundle, ResourceCatalog, ResourceContainer};
pub use format::StringFormat;
pub use language::LanguageTag;
pub use metrics::{LocalizationMetrics, MetricsReport};
pub use provider_path::ProviderPath;
pub use source::{StaticTranslations, TranslationSource, TranslationSourceExt};
