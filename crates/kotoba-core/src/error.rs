/// Result type used across the engine crates, defaulting to [`CoreError`].
pub type Result<T, E = CoreError> = std::result::Result<T, E>;

/// Errors shared by the language engines and their loading layers
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// A data file could not be parsed at all
    #[error("failed to parse {what}")]
    Parse {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// A required data file is missing from the data directory
    #[error("missing data file: {0}")]
    MissingData(String),

    /// A dictionary match carries no found spelling or reading to score
    #[error("dictionary entry {seq} has no matched form to score")]
    Unrankable { seq: i64 },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
