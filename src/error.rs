//! Error types for the dataset store
//!
//! Load failures are `ParseError`s and never touch the installed snapshot.
//! Query failures are `StoreError`s; the only one is querying a dataset that
//! has never been loaded. Retrieval errors live with the fetcher in
//! `crate::retrieval`.

use thiserror::Error;

use crate::dataset::DatasetKind;

/// Errors raised while turning raw markup into typed records
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The expected nested path is absent or has the wrong shape.
    #[error("Unexpected schema: expected a record list at '{path}'")]
    UnexpectedSchema { path: String },

    /// A record lacks a required key.
    #[error("Missing required field '{0}'")]
    MissingField(String),

    /// A required key is present but its value is unusable.
    #[error("Invalid value for field '{key}': '{value}'")]
    InvalidField { key: String, value: String },

    /// The record parser rejected the byte stream.
    #[error("Malformed markup: {0}")]
    Markup(String),
}

impl ParseError {
    pub(crate) fn unexpected_schema(path: &[&str]) -> Self {
        ParseError::UnexpectedSchema {
            path: path.join("."),
        }
    }
}

/// Errors raised by query operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("{0} data has not been loaded yet")]
    NotLoaded(DatasetKind),
}

/// Result alias for store queries.
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unexpected_schema_joins_path() {
        let err = ParseError::unexpected_schema(&["visible_passes", "visible_pass"]);
        assert_eq!(
            err.to_string(),
            "Unexpected schema: expected a record list at 'visible_passes.visible_pass'"
        );
    }

    #[test]
    fn test_not_loaded_names_dataset() {
        let err = StoreError::NotLoaded(DatasetKind::Positions);
        assert_eq!(err.to_string(), "positions data has not been loaded yet");
    }
}
