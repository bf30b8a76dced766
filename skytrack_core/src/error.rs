//! Errors surfaced by the SkyTrack core.
//!
//! Ingestion itself never fails: every report is classified into an
//! [`UpdateOutcome`](crate::track_store::UpdateOutcome). These errors exist for
//! the boundaries around it (decoding, configuration) and for callers that
//! want to log rejected reports uniformly.

/// Errors that can occur around tracking operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TrackingError {
    #[error("Invalid report: missing identifier")]
    InvalidReport,

    #[error("Observer pose unavailable and no test pose configured")]
    ObserverUnavailable,

    #[error("Failed to decode report: {0}")]
    Decode(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("I/O error: {0}")]
    Io(String),
}

impl From<serde_json::Error> for TrackingError {
    fn from(err: serde_json::Error) -> Self {
        TrackingError::Decode(err.to_string())
    }
}

impl From<std::io::Error> for TrackingError {
    fn from(err: std::io::Error) -> Self {
        TrackingError::Io(err.to_string())
    }
}
