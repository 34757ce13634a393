//! Error classification for the provisioning domain.
//!
//! [`PlatformError`] is what every port implementation returns. Its
//! [`ErrorKind`] is decided once, by the adapter that talked to the remote
//! service; the orchestrator only ever reads it.
//!
//! [`ErrorInfo`] is the frozen form carried inside a failed
//! [`crate::ProvisioningResult`].
//!
//! [`ProvisionerError`] covers problems found before an orchestration run can
//! start (bad configuration, an unusable trigger payload).

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// Classification of a failed remote call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The resource does not exist. Expected during the existence check and
    /// not a failure there.
    NotFound,
    /// The name was already taken when the create call ran.
    Conflict,
    /// The credential is invalid or lacks the required scope.
    Auth,
    /// The remote service is throttling this client.
    RateLimited,
    /// Network or service failure.
    Transport,
    /// Anything the adapter could not classify.
    Unknown,
}

impl ErrorKind {
    /// Stable lowercase label used in structured log fields.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::NotFound => "not_found",
            ErrorKind::Conflict => "conflict",
            ErrorKind::Auth => "auth",
            ErrorKind::RateLimited => "rate_limited",
            ErrorKind::Transport => "transport",
            ErrorKind::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Port-level errors
// ---------------------------------------------------------------------------

/// Error returned by [`crate::RepositoryClient`] and
/// [`crate::NotificationChannel`] implementations.
///
/// The `Display` output is the bare remote message so that it can be shown to
/// a human verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct PlatformError {
    kind: ErrorKind,
    message: String,
}

impl PlatformError {
    /// Creates an error of the given kind.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict, message)
    }

    pub fn auth(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Auth, message)
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::RateLimited, message)
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Transport, message)
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unknown, message)
    }

    /// Returns the classification of this error.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the remote message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns `true` if the error is a [`ErrorKind::NotFound`].
    pub fn is_not_found(&self) -> bool {
        self.kind == ErrorKind::NotFound
    }
}

// ---------------------------------------------------------------------------
// Result payload
// ---------------------------------------------------------------------------

/// Description of the error that ended a failed run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Classification of the failure.
    pub kind: ErrorKind,
    /// Human-readable message, exactly as reported by the remote service.
    pub message: String,
}

impl ErrorInfo {
    /// Creates an [`ErrorInfo`].
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl From<PlatformError> for ErrorInfo {
    fn from(err: PlatformError) -> Self {
        Self {
            kind: err.kind,
            message: err.message,
        }
    }
}

impl std::fmt::Display for ErrorInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

// ---------------------------------------------------------------------------
// Pre-run errors
// ---------------------------------------------------------------------------

/// Errors that prevent a provisioning run from starting.
///
/// These never reach the request thread: without a valid request there is
/// nowhere to report them except the invoking environment.
#[derive(Debug, Error)]
pub enum ProvisionerError {
    /// A required request field was missing or blank.
    #[error("Invalid request: '{field}' {reason}")]
    InvalidRequest {
        /// Name of the offending field.
        field: &'static str,
        /// Why the value was rejected.
        reason: String,
    },

    /// The runtime configuration is invalid.
    ///
    /// Produced at load time; the orchestrator never starts with an invalid
    /// configuration.
    #[error("Configuration error: {message}")]
    ConfigurationError {
        /// Description of the configuration problem.
        message: String,
    },
}
