use thiserror::Error;

/// Errors surfaced by the decision engines and their persistence layer
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("no exit tile found in a {width}x{height} map")]
    ExitNotFound { width: usize, height: usize },

    #[error("malformed q-table header: expected `{expected}`, got `{got}`")]
    MalformedHeader { expected: String, got: String },

    #[error("malformed q-table row at line {line}: {reason}")]
    MalformedRow { line: u64, reason: String },

    #[error("state key `{key}` contains the field delimiter")]
    InvalidKey { key: String },

    #[error("invalid dungeon layout: {reason}")]
    InvalidLayout { reason: String },

    #[error("failed to {operation}: {source}")]
    Io {
        operation: String,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
