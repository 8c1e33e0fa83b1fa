//! Error types for the localization core.
//!
//! Only construction-time faults are represented here. A missing translation
//! is not an error: resolution degrades to the fallback value or the raw key.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, LocalizationError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LocalizationError {
    /// A translation binding was attached without a key.
    #[error("No translation key found. Use the constructor or the key setter to define one.")]
    MissingKey,

    #[error("Invalid string format '{format}': {reason}")]
    InvalidStringFormat { format: String, reason: String },

    /// The resource container does not hold the requested bundle.
    #[error(
        "Could not find any resources. Make sure \"{bundle}\" was correctly \
         registered in container \"{container}\" before creating the translator."
    )]
    ResourceLookup { bundle: String, container: String },

    #[error("Invalid resource bundle: {0}")]
    InvalidBundle(String),

    #[error("Invalid translation provider path '{path}': {reason}")]
    InvalidProviderPath { path: String, reason: String },

    #[error("There is no translation provider type '{scheme}' defined")]
    UnknownProviderScheme { scheme: String },

    #[error("Unknown resource container: '{0}'")]
    UnknownContainer(String),

    #[error("Invalid language tag: '{0}'")]
    InvalidLanguageTag(String),

    /// Reverse translation (text back to key) is never supported.
    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_lookup_message_names_bundle_and_container() {
        let err = LocalizationError::ResourceLookup {
            bundle: "App.Strings".to_string(),
            container: "app".to_string(),
        };
        let message = err.to_string();
        assert!(message.contains("App.Strings"));
        assert!(message.contains("\"app\""));
    }

    #[test]
    fn test_missing_key_message() {
        let message = LocalizationError::MissingKey.to_string();
        assert!(message.contains("No translation key"));
    }
}
