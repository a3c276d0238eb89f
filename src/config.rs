//! Configuration discovery and effective option resolution.
//!
//! Layers, highest precedence first:
//! - `LINTMUX_*` environment variables
//! - command-line flags
//! - `.lintmux.toml` in the working directory or its closest ancestor
//! - defaults (stylish output, exact file identity, threshold 0)

use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::cli::Cli;
use crate::error::MuxError;
use crate::report::identity::IdentityPolicy;
use crate::report::merger::MergeConfig;

pub const CONFIG_FILE: &str = ".lintmux.toml";
const ENV_PREFIX: &str = "LINTMUX_";

/// lintmux configuration (loaded from .lintmux.toml)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LintmuxConfig {
    #[serde(default)]
    pub merge: MergeSection,

    #[serde(default)]
    pub output: OutputSection,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MergeSection {
    /// Group files by basename
    #[serde(default)]
    pub basename: Option<bool>,

    /// Regex whose capture groups form the file key ("" = basename regex)
    #[serde(default)]
    pub matcher: Option<String>,

    /// Visibility threshold in [0, 1]
    #[serde(default)]
    pub threshold: Option<f64>,

    /// Remove messages below the threshold
    #[serde(default)]
    pub hide_below_threshold: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct OutputSection {
    /// "stylish", "json" or "merged"
    #[serde(default)]
    pub format: Option<String>,

    #[serde(default)]
    pub show_source: Option<bool>,
}

impl LintmuxConfig {
    /// Try to load .lintmux.toml from the given directory or its parents
    pub fn load(start: &Path) -> Option<Self> {
        let config_path = find_config_file(start)?;
        debug!("Found config: {}", config_path.display());

        match std::fs::read_to_string(&config_path) {
            Ok(content) => match toml::from_str::<LintmuxConfig>(&content) {
                Ok(config) => {
                    info!("Loaded config from {}", config_path.display());
                    Some(config)
                }
                Err(e) => {
                    warn!("Failed to parse {}: {}", config_path.display(), e);
                    None
                }
            },
            Err(e) => {
                debug!("Could not read {}: {}", config_path.display(), e);
                None
            }
        }
    }
}

/// Walk up from the start directory to find .lintmux.toml
fn find_config_file(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();
    loop {
        let config = current.join(CONFIG_FILE);
        if config.is_file() {
            return Some(config);
        }
        if !current.pop() {
            return None;
        }
    }
}

/// How merged (or raw) results are written to stdout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Colored table per file
    #[default]
    Stylish,
    /// Raw results, unmerged, as one JSON array
    Json,
    /// Merged records as a JSON report
    Merged,
}

impl FromStr for OutputFormat {
    type Err = MuxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "stylish" => Ok(OutputFormat::Stylish),
            "json" => Ok(OutputFormat::Json),
            "merged" => Ok(OutputFormat::Merged),
            _ => Err(MuxError::UnknownFormat(s.to_string())),
        }
    }
}

/// Effective options after applying every layer
#[derive(Debug, Clone)]
pub struct MuxOptions {
    /// Inline JSON results
    pub input: Option<String>,
    pub format: OutputFormat,
    pub merge: MergeConfig,
    pub show_source: bool,
}

impl MuxOptions {
    /// Resolve options from the environment, CLI flags and an optional config file.
    ///
    /// `env` looks up a variable by its full name; pass `|k| std::env::var(k).ok()`
    /// in the binary.
    pub fn resolve<F>(cli: &Cli, file: Option<&LintmuxConfig>, env: F) -> Result<Self, MuxError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |name: &str| env(&format!("{ENV_PREFIX}{name}"));
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let env_flag = |name: &str| non_empty(name).and_then(|v| parse_flag(name, &v));

        let merge_file = file.map(|f| &f.merge);
        let output_file = file.map(|f| &f.output);

        let input = non_empty("INPUT").or_else(|| cli.input.clone());

        let format = match non_empty("FORMAT")
            .or_else(|| cli.format.clone())
            .or_else(|| output_file.and_then(|o| o.format.clone()))
        {
            Some(f) => f.parse()?,
            None => OutputFormat::default(),
        };

        let basename = env_flag("BASENAME")
            .or(cli.basename.then_some(true))
            .or_else(|| merge_file.and_then(|m| m.basename))
            .unwrap_or(false);

        // An empty matcher is meaningful (basename regex), so no emptiness filter here.
        let matcher = lookup("MATCHER")
            .or_else(|| cli.matcher.clone())
            .or_else(|| merge_file.and_then(|m| m.matcher.clone()));

        let identity = if basename {
            IdentityPolicy::Basename
        } else if let Some(pattern) = matcher {
            IdentityPolicy::matcher(&pattern)?
        } else {
            IdentityPolicy::Exact
        };

        let threshold = match non_empty("THRESHOLD").or_else(|| cli.threshold.clone()) {
            Some(raw) => parse_threshold(&raw)?,
            None => merge_file.and_then(|m| m.threshold).unwrap_or(0.0),
        };
        if !(0.0..=1.0).contains(&threshold) {
            return Err(MuxError::InvalidThreshold(threshold.to_string()));
        }

        let hide_below_threshold = env_flag("HIDE_BELOW_THRESHOLD")
            .or(cli.hide_below_threshold.then_some(true))
            .or_else(|| merge_file.and_then(|m| m.hide_below_threshold))
            .unwrap_or(false);

        let show_source = env_flag("SHOW_SOURCE")
            .or(cli.show_source.then_some(true))
            .or_else(|| output_file.and_then(|o| o.show_source))
            .unwrap_or(false);

        let options = MuxOptions {
            input,
            format,
            merge: MergeConfig {
                identity,
                threshold,
                hide_below_threshold,
            },
            show_source,
        };

        debug!(
            "Options: format={:?} identity={} threshold={} hide={} show_source={}",
            options.format,
            options.merge.identity.name(),
            options.merge.threshold,
            options.merge.hide_below_threshold,
            options.show_source
        );

        Ok(options)
    }
}

fn parse_threshold(raw: &str) -> Result<f64, MuxError> {
    raw.trim()
        .parse::<f64>()
        .map_err(|_| MuxError::InvalidThreshold(raw.to_string()))
}

fn parse_flag(name: &str, value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        other => {
            warn!("Ignoring {ENV_PREFIX}{name}={other}: expected true or false");
            None
        }
    }
}
