//! Error types for the ingestion pipeline.

use thiserror::Error;

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during ingestion.
#[derive(Error, Debug)]
pub enum Error {
    /// Store, feed-shape, or configuration error from the core crate.
    #[error(transparent)]
    Core(#[from] seismo_core::Error),

    /// The feed could not be reached or returned an unreadable body.
    #[error("Upstream fetch failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Another ingestion run holds the run lock.
    #[error("An ingestion run is already in progress")]
    IngestInProgress,
}

impl Error {
    /// Whether this error came from the upstream feed.
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            Self::Http(_) | Self::Core(seismo_core::Error::UpstreamFetch(_))
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_errors_are_transparent() {
        let err: Error = seismo_core::Error::StoreTransport("boom".into()).into();
        assert_eq!(err.to_string(), seismo_core::Error::StoreTransport("boom".into()).to_string());
        assert!(!err.is_upstream());
    }

    #[test]
    fn test_upstream_classification() {
        let err: Error = seismo_core::Error::UpstreamFetch("HTTP 503".into()).into();
        assert!(err.is_upstream());
        assert!(!Error::IngestInProgress.is_upstream());
    }
}
