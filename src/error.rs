use thiserror::Error;

/// Errors raised while resolving configuration, reading inputs or merging.
#[derive(Error, Debug)]
pub enum MuxError {
    #[error("invalid matcher pattern '{pattern}': {source}")]
    InvalidMatcher {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("matcher '{pattern}' did not match file path '{path}'")]
    MatcherMismatch { pattern: String, path: String },

    #[error("invalid threshold '{0}': expected a number between 0 and 1")]
    InvalidThreshold(String),

    #[error("unknown output format '{0}' (expected stylish, json or merged)")]
    UnknownFormat(String),

    #[error("malformed lint results from {origin}: {source}")]
    MalformedInput {
        origin: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to run lint command '{command}': {source}")]
    CommandSpawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
