//! Pattern matching capability
//!
//! The classifier only talks to [`PatternMatcher`], so the regex engine behind
//! it can be swapped without touching the filtering logic.

use regex::{Regex, RegexBuilder};

use crate::error::{Error, Result};

/// Something that can test text against a pattern
pub trait PatternMatcher: Send + Sync {
    /// Does the pattern match anywhere in `text`?
    fn matches(&self, text: &str) -> bool;

    /// Text of the first capture group, if the pattern matches and the group participated
    fn first_capture(&self, text: &str) -> Option<String>;
}

/// [`PatternMatcher`] backed by the `regex` crate
#[derive(Debug, Clone)]
pub struct RegexMatcher {
    regex: Regex,
}

impl RegexMatcher {
    /// Compile a case-sensitive pattern
    pub fn new(pattern: &str) -> Result<Self> {
        Self::build(pattern, false)
    }

    /// Compile a case-insensitive pattern
    pub fn case_insensitive(pattern: &str) -> Result<Self> {
        Self::build(pattern, true)
    }

    fn build(pattern: &str, ignore_case: bool) -> Result<Self> {
        let regex = RegexBuilder::new(pattern)
            .case_insensitive(ignore_case)
            .build()
            .map_err(|source| Error::InvalidPattern {
                pattern: pattern.to_string(),
                source,
            })?;

        Ok(Self { regex })
    }
}

impl PatternMatcher for RegexMatcher {
    #[inline]
    fn matches(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }

    fn first_capture(&self, text: &str) -> Option<String> {
        self.regex
            .captures(text)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    }
}

/// Patterns used to validate logins and pull hosts out of URLs
pub mod patterns {
    /// Email address: local part, `@`, dotted domain with a 2+ letter TLD
    pub const EMAIL: &str = r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$";

    /// Bare phone number: optional `+` then 6 or more digits
    pub const PHONE: &str = r"^\+?[0-9]{6,}$";

    /// Host of a URL with optional scheme and `www.`; stops at port, path, query or fragment
    pub const URL_HOST: &str = r"^(?:[A-Za-z][A-Za-z0-9+.\-]*://)?(?:www\.)?([^/:?#\s]+)";
}
