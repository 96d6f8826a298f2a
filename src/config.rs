//! Filter configuration
//!
//! Loaded once per run from a `key=value` file and shared read-only by every
//! worker afterwards.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Default field separator
pub const DEFAULT_SEPARATOR: &str = ":";

/// Default config file name
pub const DEFAULT_CONFIG_FILE: &str = "config.ini";

/// Layout of an input record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    /// `url<sep>login<sep>pass`, the url may itself contain the separator
    UrlEmailPass,
    /// `login<sep>pass`
    EmailPass,
    /// A bare login per line, as in plain email lists
    Email,
}

impl InputFormat {
    /// Parse the config spelling (`url:email:pass` / `email:pass` / `email`)
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "url:email:pass" | "url:login:pass" | "ulp" => Some(Self::UrlEmailPass),
            "email:pass" | "login:pass" => Some(Self::EmailPass),
            "email" | "login" => Some(Self::Email),
            _ => None,
        }
    }

    /// Minimum number of separator-split fields a line needs
    pub fn min_fields(&self) -> usize {
        match self {
            Self::UrlEmailPass => 3,
            Self::EmailPass => 2,
            Self::Email => 1,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UrlEmailPass => "url:email:pass",
            Self::EmailPass => "email:pass",
            Self::Email => "email",
        }
    }
}

/// Named field of a parsed record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Url,
    Login,
    Pass,
}

impl Field {
    fn parse(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "url" => Some(Self::Url),
            "email" | "login" | "user" => Some(Self::Login),
            "pass" | "password" => Some(Self::Pass),
            _ => None,
        }
    }
}

/// How accepted lines are rendered
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ConvertFormat {
    /// Emit the raw line unchanged
    #[default]
    None,
    /// Emit these 1-based raw columns, in this order
    Columns(Vec<usize>),
    /// Emit these named fields, in this order
    Fields(Vec<Field>),
    /// Could not be understood; behaves like `None`
    Unrecognized(String),
}

impl ConvertFormat {
    /// Parse `2:1`, `3,1`, `email:pass`, `pass`, ...
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        if value.is_empty() {
            return Self::None;
        }

        let tokens: Vec<&str> = value
            .split(|c: char| c == ':' || c == ',')
            .map(str::trim)
            .collect();

        if tokens.iter().all(|t| !t.is_empty() && t.bytes().all(|b| b.is_ascii_digit())) {
            let columns: Option<Vec<usize>> = tokens.iter().map(|t| t.parse().ok()).collect();
            if let Some(columns) = columns {
                return Self::Columns(columns);
            }
        }

        let fields: Option<Vec<Field>> = tokens.iter().map(|t| Field::parse(t)).collect();
        match fields {
            Some(fields) => Self::Fields(fields),
            None => Self::Unrecognized(value.to_string()),
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Self::None | Self::Unrecognized(_))
    }
}

/// Complete filter configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub separator: String,
    /// `None` when missing or unknown; every line is then rejected
    pub format: Option<InputFormat>,
    pub convert_format: ConvertFormat,
    pub email_remove: HashSet<String>,
    pub email_contains: HashSet<String>,
    pub url_remove: HashSet<String>,
    pub url_contains: HashSet<String>,
    /// Applied case-insensitively to the raw line
    pub custom_filter: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            separator: DEFAULT_SEPARATOR.to_string(),
            format: None,
            convert_format: ConvertFormat::None,
            email_remove: HashSet::new(),
            email_contains: HashSet::new(),
            url_remove: HashSet::new(),
            url_contains: HashSet::new(),
            custom_filter: None,
        }
    }
}

impl Config {
    /// Load a config file from disk
    ///
    /// Relative `*_file` list paths are resolved against the config file's directory.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|source| Error::ReadConfig {
            path: path.to_path_buf(),
            source,
        })?;

        let base = path.parent().unwrap_or_else(|| Path::new("."));
        Self::parse_with_base(&text, base)
    }

    /// Parse config text; list files are resolved against the current directory
    pub fn parse(text: &str) -> Result<Self> {
        Self::parse_with_base(text, Path::new("."))
    }

    fn parse_with_base(text: &str, base: &Path) -> Result<Self> {
        let mut config = Self::default();

        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let key = key.trim();
            let value = value.trim();

            match key {
                "separator" => {
                    if !value.is_empty() {
                        config.separator = value.to_string();
                    }
                }
                "format" => {
                    config.format = InputFormat::parse(value);
                    if config.format.is_none() {
                        log::warn!("Unknown format '{}', every line will be rejected", value);
                    }
                }
                "convert_format" => {
                    config.convert_format = ConvertFormat::parse(value);
                    if let ConvertFormat::Unrecognized(ref raw) = config.convert_format {
                        log::warn!("Unrecognized convert_format '{}', lines are kept as-is", raw);
                    }
                }
                "custom_filter" => {
                    config.custom_filter = (!value.is_empty()).then(|| value.to_string());
                }
                "email_remove" => config.email_remove.extend(parse_domain_list(value)),
                "email_contains" => config.email_contains.extend(parse_domain_list(value)),
                "url_remove" => config.url_remove.extend(parse_domain_list(value)),
                "url_contains" => config.url_contains.extend(parse_domain_list(value)),
                "email_remove_file" => config.email_remove.extend(read_domain_file(&base.join(value))?),
                "email_contains_file" => config.email_contains.extend(read_domain_file(&base.join(value))?),
                "url_remove_file" => config.url_remove.extend(read_domain_file(&base.join(value))?),
                "url_contains_file" => config.url_contains.extend(read_domain_file(&base.join(value))?),
                other => log::debug!("Ignoring unknown config key '{}'", other),
            }
        }

        if config.format.is_none() {
            log::warn!("No usable format configured, every line will be rejected");
        }

        Ok(config)
    }

    /// Are any url domain rules configured?
    pub fn has_url_rules(&self) -> bool {
        !self.url_remove.is_empty() || !self.url_contains.is_empty()
    }
}

/// Split a comma-separated domain list into trimmed, lowercase, non-empty patterns
pub fn parse_domain_list(value: &str) -> impl Iterator<Item = String> + '_ {
    value
        .split(',')
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty())
}

/// Read a domain list file: first whitespace-separated token of every line, lowercased
pub fn read_domain_file(path: &Path) -> Result<HashSet<String>> {
    let text = fs::read_to_string(path).map_err(|source| Error::ReadList {
        path: PathBuf::from(path),
        source,
    })?;

    Ok(text
        .lines()
        .filter_map(|line| line.split_whitespace().next())
        .map(str::to_lowercase)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_parse_full_config() {
        let config = Config::parse(
            "# comment\n\
             separator = ;\n\
             format=url:email:pass\n\
             convert_format=email:pass\n\
             email_remove= Gmail.com , yahoo.com,\n\
             url_contains=example.com\n\
             custom_filter=^http\n\
             unknown=whatever\n\
             no equals sign here\n",
        )
        .unwrap();

        assert_eq!(config.separator, ";");
        assert_eq!(config.format, Some(InputFormat::UrlEmailPass));
        assert_eq!(config.convert_format, ConvertFormat::Fields(vec![Field::Login, Field::Pass]));
        assert_eq!(config.email_remove.len(), 2);
        assert!(config.email_remove.contains("gmail.com"));
        assert!(config.url_contains.contains("example.com"));
        assert!(config.url_remove.is_empty());
        assert_eq!(config.custom_filter.as_deref(), Some("^http"));
    }

    #[test]
    fn test_defaults() {
        let config = Config::parse("").unwrap();

        assert_eq!(config.separator, ":");
        assert_eq!(config.format, None);
        assert!(config.convert_format.is_none());
        assert!(!config.has_url_rules());
    }

    #[test]
    fn test_empty_separator_keeps_default() {
        let config = Config::parse("separator=\nformat=email:pass").unwrap();
        assert_eq!(config.separator, ":");
    }

    #[test]
    fn test_convert_format_parse() {
        assert_eq!(ConvertFormat::parse(""), ConvertFormat::None);
        assert_eq!(ConvertFormat::parse("2:1"), ConvertFormat::Columns(vec![2, 1]));
        assert_eq!(ConvertFormat::parse("3, 1"), ConvertFormat::Columns(vec![3, 1]));
        assert_eq!(ConvertFormat::parse("pass"), ConvertFormat::Fields(vec![Field::Pass]));
        assert_eq!(ConvertFormat::parse("email"), ConvertFormat::Fields(vec![Field::Login]));
        assert_eq!(
            ConvertFormat::parse("url:email:pass"),
            ConvertFormat::Fields(vec![Field::Url, Field::Login, Field::Pass])
        );
        assert_eq!(
            ConvertFormat::parse("email:hash"),
            ConvertFormat::Unrecognized("email:hash".to_string())
        );
    }

    #[test]
    fn test_input_format_parse() {
        assert_eq!(InputFormat::parse("URL:EMAIL:PASS"), Some(InputFormat::UrlEmailPass));
        assert_eq!(InputFormat::parse(" login:pass "), Some(InputFormat::EmailPass));
        assert_eq!(InputFormat::parse("email"), Some(InputFormat::Email));
        assert_eq!(InputFormat::Email.min_fields(), 1);
        assert_eq!(InputFormat::parse("email:hash"), None);
    }

    #[test]
    fn test_unknown_format() {
        let config = Config::parse("format=csv").unwrap();
        assert_eq!(config.format, None);
    }

    #[test]
    fn test_domain_list_file() {
        let temp_dir = TempDir::new().unwrap();
        let list_path = temp_dir.path().join("remove.txt");
        let mut list = std::fs::File::create(&list_path).unwrap();
        writeln!(list, "Mail.RU  trailing words").unwrap();
        writeln!(list).unwrap();
        writeln!(list, "   yandex.ru").unwrap();

        let config_path = temp_dir.path().join("config.ini");
        std::fs::write(
            &config_path,
            "format=email:pass\nemail_remove=gmail.com\nemail_remove_file=remove.txt\n",
        )
        .unwrap();

        let config = Config::load(&config_path).unwrap();
        let mut remove: Vec<_> = config.email_remove.iter().cloned().collect();
        remove.sort();
        assert_eq!(remove, vec!["gmail.com", "mail.ru", "yandex.ru"]);
    }

    #[test]
    fn test_missing_files_are_errors() {
        let temp_dir = TempDir::new().unwrap();

        let err = Config::load(&temp_dir.path().join("absent.ini")).unwrap_err();
        assert!(matches!(err, Error::ReadConfig { .. }));

        let config_path = temp_dir.path().join("config.ini");
        std::fs::write(&config_path, "url_remove_file=absent.txt\n").unwrap();
        let err = Config::load(&config_path).unwrap_err();
        assert!(matches!(err, Error::ReadList { .. }));
    }
}
