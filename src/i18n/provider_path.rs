//! Textual translator references.
//!
//! Configuration can name a translator as `bundle://<container>;<base name>`
//! instead of constructing one in code. Parsing and opening are both
//! construction-time operations: every failure surfaces to the caller.

use super::{BundleTranslationSource, ResourceCatalog, TranslationSource};
use crate::error::{LocalizationError, Result};
use regex::Regex;
use std::str::FromStr;
use std::sync::{Arc, OnceLock};

const SCHEME_DELIMITER: &str = "://";
const BUNDLE_SCHEME: &str = "bundle";

static BUNDLE_PATH_REGEX: OnceLock<Regex> = OnceLock::new();

/// A parsed translator reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderPath {
    Bundle { container: String, base_name: String },
}

impl ProviderPath {
    pub fn parse(path: &str) -> Result<ProviderPath> {
        let Some((scheme, rest)) = path.split_once(SCHEME_DELIMITER) else {
            return Err(LocalizationError::InvalidProviderPath {
                path: path.to_string(),
                reason: format!("the path needs to start with 'xyz{SCHEME_DELIMITER}'"),
            });
        };

        match scheme {
            BUNDLE_SCHEME => {
                let regex =
                    BUNDLE_PATH_REGEX.get_or_init(|| Regex::new(r"^([^;]+);([^;]+)$").unwrap());
                let malformed = || LocalizationError::InvalidProviderPath {
                    path: path.to_string(),
                    reason: format!(
                        "expected the format '{BUNDLE_SCHEME}{SCHEME_DELIMITER}Container;BaseName'"
                    ),
                };
                let captures = regex.captures(rest).ok_or_else(malformed)?;

                let container = captures[1].trim();
                let base_name = captures[2].trim();
                if container.is_empty() || base_name.is_empty() {
                    return Err(malformed());
                }

                Ok(ProviderPath::Bundle {
                    container: container.to_string(),
                    base_name: base_name.to_string(),
                })
            }
            other => Err(LocalizationError::UnknownProviderScheme {
                scheme: other.to_string(),
            }),
        }
    }

    /// Construct the translator this path refers to.
    pub fn open(&self, catalog: &ResourceCatalog) -> Result<Arc<dyn TranslationSource>> {
        match self {
            ProviderPath::Bundle {
                container,
                base_name,
            } => {
                let container = catalog.container(container)?;
                let source = BundleTranslationSource::new(base_name, &container)?;
                Ok(Arc::new(source))
            }
        }
    }
}

impl FromStr for ProviderPath {
    type Err = LocalizationError;

    fn from_str(s: &str) -> Result<Self> {
        ProviderPath::parse(s)
    }
}
