//! Error types shared by the seismo ingestion and query engine.

use thiserror::Error;

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while ingesting or querying events.
#[derive(Error, Debug)]
pub enum Error {
    /// The upstream feed was unreachable, answered with a non-2xx status, or
    /// returned a body without a `features` array.
    #[error("upstream fetch failed: {0}")]
    UpstreamFetch(String),

    /// The caller supplied a filter set the planner cannot route.
    #[error("invalid filter combination: {0}")]
    InvalidFilterCombination(String),

    /// A continuation token could not be decoded.
    #[error("invalid cursor: {0}")]
    InvalidCursor(String),

    /// A point lookup found nothing.
    #[error("not found: {0}")]
    NotFound(String),

    /// Some records stayed unprocessed after every retry was spent.
    ///
    /// Non-fatal: the batch writer logs this and reports a reduced count.
    #[error("{unprocessed} of {batch_size} records left unprocessed after retries")]
    StoreWriteDegraded {
        /// Records that were never acknowledged by the store.
        unprocessed: usize,
        /// Size of the batch they belonged to.
        batch_size: usize,
    },

    /// Hard store failure (network, throttling exhausted by the SDK, bad
    /// credentials, missing table).
    #[error("store transport error: {0}")]
    StoreTransport(String),

    /// JSON encoding or decoding error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // Error Display formatting tests
    // =========================================================================

    #[test]
    fn test_invalid_filter_display() {
        let err = Error::InvalidFilterCombination("minMagnitude requires maxMagnitude".into());
        let msg = err.to_string();
        assert!(msg.contains("invalid filter combination"));
        assert!(msg.contains("minMagnitude requires maxMagnitude"));
    }

    #[test]
    fn test_store_write_degraded_display() {
        let err = Error::StoreWriteDegraded {
            unprocessed: 3,
            batch_size: 25,
        };
        assert_eq!(
            err.to_string(),
            "3 of 25 records left unprocessed after retries"
        );
    }

    #[test]
    fn test_from_json_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("not valid json").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Json(_)));
        assert!(err.to_string().contains("JSON error"));
    }
}
