//! Canonical file keys.
//!
//! Results from independent lint runs are grouped under the key produced
//! here. The same logical file checked out under different roots (two git
//! worktrees, two CI shards) should resolve to one key.

use std::path::{Path, MAIN_SEPARATOR};

use regex::Regex;

use crate::error::MuxError;

/// How raw file paths map to canonical keys
#[derive(Debug, Clone, Default)]
pub enum IdentityPolicy {
    /// Path unchanged; every distinct raw path is its own group
    #[default]
    Exact,
    /// Final path segment only
    Basename,
    /// Concatenation of the capture groups of a user-supplied expression
    Matcher(Regex),
    /// The last path segment, extracted by [`default_matcher`]
    DefaultMatcher(Regex),
}

impl IdentityPolicy {
    /// Compile a matcher policy. An empty (or blank) pattern selects the default matcher.
    pub fn matcher(pattern: &str) -> Result<Self, MuxError> {
        let pattern = pattern.trim();
        if pattern.is_empty() {
            return Ok(IdentityPolicy::DefaultMatcher(default_matcher()));
        }
        Regex::new(pattern)
            .map(IdentityPolicy::Matcher)
            .map_err(|source| MuxError::InvalidMatcher {
                pattern: pattern.to_string(),
                source,
            })
    }

    pub fn name(&self) -> &'static str {
        match self {
            IdentityPolicy::Exact => "exact",
            IdentityPolicy::Basename => "basename",
            IdentityPolicy::Matcher(_) => "matcher",
            IdentityPolicy::DefaultMatcher(_) => "default",
        }
    }

    /// Resolve a raw path to its canonical key
    pub fn resolve(&self, file_path: &str) -> Result<String, MuxError> {
        match self {
            IdentityPolicy::Exact => Ok(file_path.to_string()),
            IdentityPolicy::Basename => Ok(basename(file_path)),
            IdentityPolicy::Matcher(re) | IdentityPolicy::DefaultMatcher(re) => {
                let caps = re.captures(file_path).ok_or_else(|| MuxError::MatcherMismatch {
                    pattern: re.as_str().to_string(),
                    path: file_path.to_string(),
                })?;
                Ok(caps
                    .iter()
                    .skip(1)
                    .map(|m| m.map_or("", |m| m.as_str()))
                    .collect())
            }
        }
    }
}

/// `SEP?([^SEP]+)$` for the platform path separator
pub fn default_matcher() -> Regex {
    let sep = regex::escape(&MAIN_SEPARATOR.to_string());
    Regex::new(&format!("{sep}?([^{sep}]+)$")).unwrap()
}

fn basename(file_path: &str) -> String {
    Path::new(file_path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| file_path.to_string())
}
