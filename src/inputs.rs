//! Input file discovery
//!
//! Turns command-line input arguments into an ordered list of files. Arguments
//! containing `*` or `?` are matched case-insensitively against the regular
//! files of their directory; everything else passes through untouched and is
//! left for the reader to open (or fail on).

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::{Error, Result};
use crate::matcher::{PatternMatcher, RegexMatcher};

/// Does this argument contain wildcard characters?
pub fn is_wildcard(arg: &str) -> bool {
    arg.contains('*') || arg.contains('?')
}

/// Translate a `*`/`?` file-name pattern into an anchored regex
pub fn wildcard_to_regex(pattern: &str) -> String {
    let mut regex = String::with_capacity(pattern.len() * 2 + 2);
    regex.push('^');
    for ch in pattern.chars() {
        match ch {
            '*' => regex.push_str(".*"),
            '?' => regex.push('.'),
            _ => regex.push_str(&regex::escape(&ch.to_string())),
        }
    }
    regex.push('$');
    regex
}

/// Expand input arguments into files, skipping `exclude` (the output file)
pub fn expand_inputs(args: &[String], exclude: &Path) -> Result<Vec<PathBuf>> {
    let mut seen = HashSet::new();
    let mut files = Vec::new();

    for arg in args {
        let candidates = if is_wildcard(arg) {
            expand_wildcard(arg, exclude)?
        } else {
            vec![PathBuf::from(arg)]
        };

        for path in candidates {
            if is_same_path(&path, exclude) {
                log::warn!("Skipping {:?}: it is the output file", path);
                continue;
            }
            if seen.insert(path.clone()) {
                files.push(path);
            }
        }
    }

    if files.is_empty() {
        return Err(Error::NoInputs(args.to_vec()));
    }

    Ok(files)
}

fn expand_wildcard(arg: &str, exclude: &Path) -> Result<Vec<PathBuf>> {
    let path = Path::new(arg);
    let dir = parent_or_current(path);
    let name_pattern = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let matcher = RegexMatcher::case_insensitive(&wildcard_to_regex(&name_pattern))?;

    let mut matched: Vec<PathBuf> = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| matcher.matches(&e.file_name().to_string_lossy()))
        .map(|e| e.into_path())
        .filter(|p| !is_same_path(p, exclude))
        .collect();

    matched.sort();
    log::debug!("{} matched {} file(s) in {:?}", arg, matched.len(), dir);

    Ok(matched)
}

fn parent_or_current(path: &Path) -> &Path {
    path.parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
}

fn is_same_path(a: &Path, b: &Path) -> bool {
    a.file_name() == b.file_name() && parent_or_current(a) == parent_or_current(b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_wildcard_to_regex() {
        assert_eq!(wildcard_to_regex("*.txt"), r"^.*\.txt$");
        assert_eq!(wildcard_to_regex("combo?.txt"), r"^combo.\.txt$");
        assert_eq!(wildcard_to_regex("a+(b)"), r"^a\+\(b\)$");
    }

    #[test]
    fn test_expand_wildcard() {
        let temp_dir = TempDir::new().unwrap();
        for name in ["b.txt", "A.TXT", "c.csv", "filtered_ulp.txt"] {
            std::fs::write(temp_dir.path().join(name), "x").unwrap();
        }
        std::fs::create_dir(temp_dir.path().join("dir.txt")).unwrap();

        let pattern = temp_dir.path().join("*.txt").to_string_lossy().into_owned();
        let output = temp_dir.path().join("filtered_ulp.txt");
        let files = expand_inputs(&[pattern], &output).unwrap();

        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["A.TXT", "b.txt"]);
    }

    #[test]
    fn test_literal_paths_pass_through_once() {
        let args = vec!["missing.txt".to_string(), "missing.txt".to_string(), "other.txt".to_string()];
        let files = expand_inputs(&args, Path::new("out.txt")).unwrap();

        assert_eq!(files, vec![PathBuf::from("missing.txt"), PathBuf::from("other.txt")]);
    }

    #[test]
    fn test_output_is_never_an_input() {
        let args = vec!["./out.txt".to_string()];
        let err = expand_inputs(&args, Path::new("out.txt")).unwrap_err();

        assert!(matches!(err, Error::NoInputs(_)));
    }

    #[test]
    fn test_no_matches() {
        let temp_dir = TempDir::new().unwrap();
        let pattern = temp_dir.path().join("*.log").to_string_lossy().into_owned();

        let err = expand_inputs(&[pattern], Path::new("out.txt")).unwrap_err();
        assert!(matches!(err, Error::NoInputs(_)));
    }
}
