use crate::i18n::LanguageTag;
use anyhow::{Context, Result};

const DEFAULT_LANGUAGE: &str = "en-US";
const DEFAULT_LOG_DIRECTIVE: &str = "live_l10n=info";

#[derive(Debug, Clone)]
pub struct Config {
    // Language the application starts in
    pub default_language: LanguageTag,

    // Logging
    pub log_directive: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let raw_language = std::env::var("L10N_DEFAULT_LANGUAGE")
            .unwrap_or_else(|_| DEFAULT_LANGUAGE.to_string());

        Ok(Self {
            default_language: LanguageTag::parse(&raw_language).with_context(|| {
                format!("L10N_DEFAULT_LANGUAGE is not a valid language tag: {raw_language}")
            })?,
            log_directive: std::env::var("L10N_LOG_DIRECTIVE")
                .unwrap_or_else(|_| DEFAULT_LOG_DIRECTIVE.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        std::env::remove_var("L10N_DEFAULT_LANGUAGE");
        std::env::remove_var("L10N_LOG_DIRECTIVE");
    }

    #[test]
    #[serial]
    fn test_defaults() {
        clear_env();
        let config = Config::from_env().unwrap();
        assert_eq!(config.default_language.as_str(), "en-US");
        assert_eq!(config.log_directive, "live_l10n=info");
    }

    #[test]
    #[serial]
    fn test_reads_environment() {
        clear_env();
        std::env::set_var("L10N_DEFAULT_LANGUAGE", "de_at");
        std::env::set_var("L10N_LOG_DIRECTIVE", "live_l10n=debug");

        let config = Config::from_env().unwrap();
        assert_eq!(config.default_language.as_str(), "de-AT");
        assert_eq!(config.log_directive, "live_l10n=debug");
        clear_env();
    }

    #[test]
    #[serial]
    fn test_invalid_language_is_reported() {
        clear_env();
        std::env::set_var("L10N_DEFAULT_LANGUAGE", "not a tag");

        let err = Config::from_env().unwrap_err();
        assert!(err.to_string().contains("L10N_DEFAULT_LANGUAGE"));
        clear_env();
    }
}
