//! Language tag: validated, normalized culture identifier.
//!
//! A `LanguageTag` identifies the language/region pair used to select a
//! translation (e.g. "en", "de-AT", "zh-Hant-TW"). The empty tag is the
//! invariant culture, the root of every fallback chain.

use crate::error::{LocalizationError, Result};
use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

static TAG_REGEX: OnceLock<Regex> = OnceLock::new();

/// A validated language tag.
///
/// Subtags are case-normalized on construction so that "EN-us" and "en-US"
/// compare equal: the primary language is lowercase, two-letter regions are
/// uppercase, four-letter scripts are title case.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LanguageTag {
    tag: String,
}

impl LanguageTag {
    /// Parse and normalize a language tag.
    ///
    /// Underscores are accepted as separators ("en_US" is read as "en-US").
    /// An empty or blank string yields the invariant culture.
    ///
    /// # Returns
    /// * `Ok(LanguageTag)` if the tag is well-formed
    /// * `Err(InvalidLanguageTag)` otherwise
    pub fn parse(value: &str) -> Result<LanguageTag> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Ok(Self::invariant());
        }

        let candidate = trimmed.replace('_', "-");
        let regex = TAG_REGEX
            .get_or_init(|| Regex::new(r"^[A-Za-z]{2,8}(?:-[A-Za-z0-9]{1,8})*$").unwrap());
        if !regex.is_match(&candidate) {
            return Err(LocalizationError::InvalidLanguageTag(value.to_string()));
        }

        let tag = candidate
            .split('-')
            .enumerate()
            .map(|(index, subtag)| normalize_subtag(index, subtag))
            .collect::<Vec<_>>()
            .join("-");

        Ok(LanguageTag { tag })
    }

    /// The invariant culture (empty tag).
    pub fn invariant() -> LanguageTag {
        LanguageTag { tag: String::new() }
    }

    pub fn is_invariant(&self) -> bool {
        self.tag.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.tag
    }

    /// The primary language subtag ("de" for "de-AT"), or `None` for the
    /// invariant culture.
    pub fn primary_language(&self) -> Option<&str> {
        self.tag.split('-').next().filter(|subtag| !subtag.is_empty())
    }

    /// The next less specific tag: "de-AT" → "de" → invariant → `None`.
    pub fn parent(&self) -> Option<LanguageTag> {
        if self.is_invariant() {
            return None;
        }
        match self.tag.rfind('-') {
            Some(index) => Some(LanguageTag {
                tag: self.tag[..index].to_string(),
            }),
            None => Some(Self::invariant()),
        }
    }

    /// This tag followed by all of its parents, ending with the invariant
    /// culture.
    pub fn fallback_chain(&self) -> Vec<LanguageTag> {
        let mut chain = vec![self.clone()];
        while let Some(parent) = chain.last().and_then(LanguageTag::parent) {
            chain.push(parent);
        }
        chain
    }
}

fn normalize_subtag(index: usize, subtag: &str) -> String {
    let all_alpha = subtag.chars().all(|c| c.is_ascii_alphabetic());
    match (index, subtag.len()) {
        (0, _) => subtag.to_ascii_lowercase(),
        (_, 2) if all_alpha => subtag.to_ascii_uppercase(),
        (_, 4) if all_alpha => {
            let lower = subtag.to_ascii_lowercase();
            let mut chars = lower.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => lower,
            }
        }
        _ => subtag.to_ascii_lowercase(),
    }
}

impl Default for LanguageTag {
    fn default() -> Self {
        Self::invariant()
    }
}

impl FromStr for LanguageTag {
    type Err = LocalizationError;

    fn from_str(s: &str) -> Result<Self> {
        LanguageTag::parse(s)
    }
}

impl fmt::Display for LanguageTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_invariant() {
            f.write_str("(invariant)")
        } else {
            f.write_str(&self.tag)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== parse Tests ====================

    #[test]
    fn test_parse_simple() {
        let tag = LanguageTag::parse("en").expect("Should succeed");
        assert_eq!(tag.as_str(), "en");
        assert_eq!(tag.primary_language(), Some("en"));
    }

    #[test]
    fn test_parse_normalizes_case() {
        let tag = LanguageTag::parse("EN-us").expect("Should succeed");
        assert_eq!(tag.as_str(), "en-US");
        assert_eq!(tag, LanguageTag::parse("en-US").unwrap());
    }

    #[test]
    fn test_parse_script_title_case() {
        let tag = LanguageTag::parse("zh-hant-tw").expect("Should succeed");
        assert_eq!(tag.as_str(), "zh-Hant-TW");
    }

    #[test]
    fn test_parse_accepts_underscore() {
        let tag = LanguageTag::parse("de_AT").expect("Should succeed");
        assert_eq!(tag.as_str(), "de-AT");
    }

    #[test]
    fn test_parse_empty_is_invariant() {
        let tag = LanguageTag::parse("  ").expect("Should succeed");
        assert!(tag.is_invariant());
        assert_eq!(tag.primary_language(), None);
    }

    #[test]
    fn test_parse_invalid() {
        for bad in ["e", "en--US", "en-", "123", "en US", "toolonglanguage"] {
            let result = LanguageTag::parse(bad);
            assert!(
                matches!(result, Err(LocalizationError::InvalidLanguageTag(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_from_str() {
        let tag: LanguageTag = "fr-CA".parse().expect("Should succeed");
        assert_eq!(tag.as_str(), "fr-CA");
    }

    // ==================== Fallback Tests ====================

    #[test]
    fn test_parent_chain() {
        let tag = LanguageTag::parse("de-AT").unwrap();
        let parent = tag.parent().unwrap();
        assert_eq!(parent.as_str(), "de");
        let root = parent.parent().unwrap();
        assert!(root.is_invariant());
        assert!(root.parent().is_none());
    }

    #[test]
    fn test_fallback_chain() {
        let chain = LanguageTag::parse("zh-Hant-TW").unwrap().fallback_chain();
        let tags: Vec<&str> = chain.iter().map(LanguageTag::as_str).collect();
        assert_eq!(tags, vec!["zh-Hant-TW", "zh-Hant", "zh", ""]);
    }

    #[test]
    fn test_invariant_chain_is_itself() {
        let chain = LanguageTag::invariant().fallback_chain();
        assert_eq!(chain, vec![LanguageTag::invariant()]);
    }

    // ==================== Trait Tests ====================

    #[test]
    fn test_display() {
        assert_eq!(LanguageTag::parse("es").unwrap().to_string(), "es");
        assert_eq!(LanguageTag::invariant().to_string(), "(invariant)");
    }

    #[test]
    fn test_default_is_invariant() {
        assert!(LanguageTag::default().is_invariant());
    }
}
