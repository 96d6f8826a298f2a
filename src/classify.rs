//! Line classification
//!
//! Decides whether a raw combolist line survives the configured rules and, if
//! so, what gets written for it. Everything here is pure: the same line and
//! config always produce the same answer, on any thread.

use std::collections::HashSet;

use crate::config::{Config, ConvertFormat, Field, InputFormat};
use crate::error::Result;
use crate::matcher::{patterns, PatternMatcher, RegexMatcher};

/// A raw line split into its fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record<'a> {
    /// Separator-split fields, untrimmed, in line order
    pub fields: Vec<&'a str>,
    /// Source URL (only for `url:email:pass`), trimmed
    pub url: Option<String>,
    pub login: &'a str,
    /// Absent for bare login lists
    pub pass: Option<&'a str>,
}

impl<'a> Record<'a> {
    /// Split `line` according to `format`
    ///
    /// For `url:email:pass` the last two fields are login and pass and everything
    /// before them is the url, so `https://host:443/path` survives a `:` separator.
    pub fn parse(line: &'a str, separator: &str, format: InputFormat) -> Option<Self> {
        let fields: Vec<&str> = line.split(separator).collect();
        if fields.len() < format.min_fields() {
            return None;
        }

        let record = match format {
            InputFormat::UrlEmailPass => {
                let n = fields.len();
                Self {
                    url: Some(fields[..n - 2].join(separator).trim().to_string()),
                    login: fields[n - 2].trim(),
                    pass: Some(fields[n - 1].trim()),
                    fields,
                }
            }
            InputFormat::EmailPass => Self {
                url: None,
                login: fields[0].trim(),
                pass: Some(fields[1].trim()),
                fields,
            },
            InputFormat::Email => Self {
                url: None,
                login: fields[0].trim(),
                pass: None,
                fields,
            },
        };

        Some(record)
    }

    /// Value of a named field, if this record has it
    pub fn field(&self, field: Field) -> Option<&str> {
        match field {
            Field::Url => self.url.as_deref(),
            Field::Login => Some(self.login),
            Field::Pass => self.pass,
        }
    }
}

/// Login validation and url host extraction patterns
pub struct Validators {
    pub email: Box<dyn PatternMatcher>,
    pub phone: Box<dyn PatternMatcher>,
    pub url_host: Box<dyn PatternMatcher>,
}

impl Validators {
    /// Regex-backed validators
    pub fn regex() -> Result<Self> {
        Ok(Self {
            email: Box::new(RegexMatcher::new(patterns::EMAIL)?),
            phone: Box::new(RegexMatcher::new(patterns::PHONE)?),
            url_host: Box::new(RegexMatcher::case_insensitive(patterns::URL_HOST)?),
        })
    }
}

/// Applies a [`Config`] to raw lines
pub struct LineClassifier {
    config: Config,
    validators: Validators,
    custom_filter: Option<Box<dyn PatternMatcher>>,
}

impl LineClassifier {
    /// Build a classifier; fails if the custom filter is not a valid regex
    pub fn new(config: Config) -> Result<Self> {
        let custom_filter = match config.custom_filter.as_deref() {
            Some(p) => Some(Box::new(RegexMatcher::case_insensitive(p)?) as Box<dyn PatternMatcher>),
            None => None,
        };

        Ok(Self::with_matchers(config, Validators::regex()?, custom_filter))
    }

    /// Build a classifier around caller-supplied matchers
    pub fn with_matchers(
        config: Config,
        validators: Validators,
        custom_filter: Option<Box<dyn PatternMatcher>>,
    ) -> Self {
        Self {
            config,
            validators,
            custom_filter,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Classify one raw line: `Some(output)` if accepted, `None` if rejected
    pub fn classify(&self, line: &str) -> Option<String> {
        let format = self.config.format?;
        let record = Record::parse(line, &self.config.separator, format)?;

        if !self.is_valid_login(record.login) {
            return None;
        }

        let domain = email_domain(record.login);
        if !check_domain(&domain, &self.config.email_remove, &self.config.email_contains) {
            return None;
        }

        if self.config.has_url_rules() {
            if let Some(url) = record.url.as_deref().filter(|u| !u.is_empty()) {
                let domain = self.url_domain(url);
                if !check_domain(&domain, &self.config.url_remove, &self.config.url_contains) {
                    return None;
                }
            }
        }

        if let Some(ref filter) = self.custom_filter {
            if !filter.matches(line) {
                return None;
            }
        }

        let rendered = self.render(line, &record);
        // never write a blank line, even when the projected fields are all empty
        if rendered.is_empty() {
            return None;
        }

        Some(rendered)
    }

    /// Login must look like an email address and must not look like a phone number
    #[inline]
    pub fn is_valid_login(&self, login: &str) -> bool {
        self.validators.email.matches(login) && !self.validators.phone.matches(login)
    }

    /// Lowercase host of a url, without scheme, `www.`, port or path
    pub fn url_domain(&self, url: &str) -> String {
        self.validators
            .url_host
            .first_capture(url)
            .map(|host| host.to_lowercase())
            .unwrap_or_default()
    }

    fn render(&self, line: &str, record: &Record<'_>) -> String {
        let separator = self.config.separator.as_str();

        match &self.config.convert_format {
            ConvertFormat::Columns(columns) => columns
                .iter()
                .filter_map(|&c| c.checked_sub(1).and_then(|i| record.fields.get(i)))
                .copied()
                .collect::<Vec<_>>()
                .join(separator),
            ConvertFormat::Fields(fields) => fields
                .iter()
                .map(|&f| record.field(f))
                .collect::<Option<Vec<_>>>()
                .map(|parts| parts.join(separator))
                .unwrap_or_else(|| line.to_string()),
            ConvertFormat::None | ConvertFormat::Unrecognized(_) => line.to_string(),
        }
    }
}

/// Lowercase part of an email after the first `@`, empty if there is none
pub fn email_domain(email: &str) -> String {
    email
        .split_once('@')
        .map(|(_, domain)| domain.to_lowercase())
        .unwrap_or_default()
}

/// Exact match, or `domain` ends with `.pattern` (label-boundary suffix)
#[inline]
pub fn domain_matches(domain: &str, pattern: &str) -> bool {
    if domain == pattern {
        return true;
    }

    domain.len() > pattern.len()
        && domain.ends_with(pattern)
        && domain.as_bytes()[domain.len() - pattern.len() - 1] == b'.'
}

/// Allow/deny check: any remove match rejects; a non-empty contains set must match
pub fn check_domain(domain: &str, remove: &HashSet<String>, contains: &HashSet<String>) -> bool {
    if remove.iter().any(|p| domain_matches(domain, p)) {
        return false;
    }

    contains.is_empty() || contains.iter().any(|p| domain_matches(domain, p))
}
