//! Errors raised by the external move services.

use derive_more::{Display, Error};
use tracing::instrument;

/// What went wrong talking to a service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
pub enum ServiceErrorKind {
    /// The request never produced a response.
    Transport,
    /// No response arrived within the allotted time.
    Timeout,
    /// The service answered with a non-success status.
    Status,
    /// The response body could not be understood.
    Decode,
    /// The service answered but refused to produce a move.
    Rejected,
}

/// Service error with location tracking.
#[derive(Debug, Clone, Display, Error)]
#[display("Service error ({}): {} at {}:{}", kind, message, file, line)]
pub struct ServiceError {
    /// Category of the failure.
    pub kind: ServiceErrorKind,
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ServiceError {
    /// Creates a new service error with caller location tracking.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(kind: ServiceErrorKind, message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            kind,
            message: message.into(),
            line: loc.line(),
            file: loc.file(),
        }
    }

    /// Creates a timeout error.
    #[track_caller]
    pub fn timeout(after: std::time::Duration) -> Self {
        Self::new(
            ServiceErrorKind::Timeout,
            format!("no response after {} ms", after.as_millis()),
        )
    }

    /// Short description suitable for a status line.
    pub fn summary(&self) -> String {
        format!("{} ({})", self.message, self.kind)
    }
}

impl From<reqwest::Error> for ServiceError {
    #[track_caller]
    fn from(err: reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            ServiceErrorKind::Timeout
        } else if err.is_decode() {
            ServiceErrorKind::Decode
        } else if err.is_status() {
            ServiceErrorKind::Status
        } else {
            ServiceErrorKind::Transport
        };
        Self::new(kind, format!("HTTP error: {}", err))
    }
}
