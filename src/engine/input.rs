use std::fmt;

use serde_json::Deserializer;

use crate::error::MuxError;
use crate::report::diagnostic::RawFileResult;

/// Where a batch of raw results came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    /// The --input flag (or LINTMUX_INPUT)
    Inline,
    Stdin,
    /// Stdout of the inline lint command
    Command(String),
}

impl fmt::Display for InputSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputSource::Inline => write!(f, "--input"),
            InputSource::Stdin => write!(f, "stdin"),
            InputSource::Command(cmd) => write!(f, "command '{}'", cmd),
        }
    }
}

/// Parse lint output into raw results.
///
/// The text may hold several JSON arrays back to back (e.g. `cat a.json b.json`);
/// they are appended in order. Empty or whitespace-only text yields no results.
/// Anything else that is not an array of results fails the whole source.
pub fn parse_results(text: &str, source: &InputSource) -> Result<Vec<RawFileResult>, MuxError> {
    let mut results = Vec::new();

    for batch in Deserializer::from_str(text).into_iter::<Vec<RawFileResult>>() {
        let batch = batch.map_err(|e| MuxError::MalformedInput {
            origin: source.to_string(),
            source: e,
        })?;
        results.extend(batch);
    }

    Ok(results)
}
