// src/targets.rs
// =============================================================================
// This module turns user input into Targets: the pages we fetch.
//
// Targets come from two places:
// - the -u flag (a single URL)
// - the -l flag (a text file with one URL per line)
//
// Every target is normalized to carry an explicit http:// or https:// scheme
// and must parse to a URL with a host. Bad entries are skipped with a
// warning; they never stop the run.
// =============================================================================

use anyhow::{Context, Result};
use std::fmt;
use std::path::Path;
use thiserror::Error;
use tracing::warn;
use url::Url;

/// Why a single input line could not become a Target.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TargetError {
    #[error("empty target")]
    Empty,
    #[error("invalid URL '{input}': {source}")]
    Invalid {
        input: String,
        #[source]
        source: url::ParseError,
    },
}

/// A page to fetch and extract links from.
///
/// `raw` keeps the normalized string the user gave us (for console output),
/// `url` is the parsed form used for resolution and scope checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    raw: String,
    url: Url,
}

impl Target {
    /// Parses a user-supplied string, prefixing `http://` when no scheme is given.
    ///
    /// Examples:
    ///   "example.com"          -> http://example.com/
    ///   "https://example.com"  -> https://example.com/
    ///   ""                     -> Err(TargetError::Empty)
    pub fn parse(input: &str) -> Result<Self, TargetError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(TargetError::Empty);
        }

        let raw = if has_http_scheme(trimmed) {
            trimmed.to_string()
        } else {
            format!("http://{}", trimmed)
        };

        // http(s) URLs always parse with a host, which scope checks rely on
        let url = Url::parse(&raw).map_err(|source| TargetError::Invalid {
            input: trimmed.to_string(),
            source,
        })?;

        Ok(Self { raw, url })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// The scope anchor: links must live on this host or below it.
    pub fn host(&self) -> &str {
        self.url.host_str().unwrap_or_default()
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn has_http_scheme(input: &str) -> bool {
    let lower = input.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Reads a list file and returns its non-blank lines, trimmed.
pub fn read_target_list(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read URL list '{}'", path.display()))?;

    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

/// Builds the target list from -u and -l, in that order.
///
/// Only an unreadable list file is an error. Individual bad entries are
/// reported and dropped.
pub fn collect_targets(single: Option<&str>, list: Option<&Path>) -> Result<Vec<Target>> {
    let mut inputs = Vec::new();

    if let Some(url) = single {
        inputs.push(url.to_string());
    }

    if let Some(path) = list {
        inputs.extend(read_target_list(path)?);
    }

    let targets = inputs
        .iter()
        .filter_map(|input| match Target::parse(input) {
            Ok(target) => Some(target),
            Err(e) => {
                warn!(input = %input, error = %e, "skipping invalid target");
                None
            }
        })
        .collect();

    Ok(targets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_adds_missing_scheme() {
        let target = Target::parse("example.com").unwrap();
        assert_eq!(target.as_str(), "http://example.com");
        assert_eq!(target.host(), "example.com");
    }

    #[test]
    fn test_keeps_https_scheme() {
        let target = Target::parse("  https://example.com/page  ").unwrap();
        assert_eq!(target.as_str(), "https://example.com/page");
        assert_eq!(target.url().scheme(), "https");
    }

    #[test]
    fn test_scheme_check_ignores_case() {
        let target = Target::parse("HTTPS://Example.com").unwrap();
        assert_eq!(target.url().scheme(), "https");
        assert_eq!(target.host(), "example.com");
    }

    #[test]
    fn test_rejects_empty_and_malformed() {
        assert_eq!(Target::parse("   "), Err(TargetError::Empty));
        assert!(matches!(
            Target::parse("http://"),
            Err(TargetError::Invalid { .. })
        ));
    }

    #[test]
    fn test_collect_targets_skips_bad_lines() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "example.org").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "http://").unwrap();
        writeln!(file, "  https://sub.example.net/path  ").unwrap();

        let targets = collect_targets(Some("example.com"), Some(file.path())).unwrap();
        let names: Vec<&str> = targets.iter().map(Target::as_str).collect();
        assert_eq!(
            names,
            vec![
                "http://example.com",
                "http://example.org",
                "https://sub.example.net/path",
            ]
        );
    }

    #[test]
    fn test_missing_list_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.txt");
        assert!(collect_targets(None, Some(&missing)).is_err());
    }
}
