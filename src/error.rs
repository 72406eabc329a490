//! Error types
//!
//! Every collaborator failure is decoded into one of three tags before it
//! reaches the facade, so policy decisions match on [`ResourceError`]
//! variants rather than on status codes or message text.

use std::fmt;
use thiserror::Error;

/// Failure reported by the remote service (or by the transport reaching it)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFailure {
    /// HTTP status, `None` for transport or decoding failures
    pub status: Option<u16>,
    /// ARM error code, e.g. `AuthorizationFailed`
    pub code: Option<String>,
    pub message: String,
}

impl RemoteFailure {
    pub fn new(status: Option<u16>, code: Option<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    /// Failure that never got an HTTP status (connect, TLS, body decoding)
    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(None, None, message)
    }
}

impl fmt::Display for RemoteFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.status, &self.code) {
            (Some(status), Some(code)) => {
                write!(f, "API request failed: {} ({}): {}", status, code, self.message)
            }
            (Some(status), None) => write!(f, "API request failed: {}: {}", status, self.message),
            (None, _) => write!(f, "Request failed: {}", self.message),
        }
    }
}

impl std::error::Error for RemoteFailure {}

/// Errors surfaced by resource group operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResourceError {
    /// A required input was missing; checked locally before any remote call
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The named resource group does not exist remotely
    #[error("Resource group not found: {0}")]
    NotFound(String),

    /// Any other failure reported by the collaborator
    #[error(transparent)]
    Remote(#[from] RemoteFailure),
}

impl ResourceError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// HTTP status behind this error, when there is one
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::InvalidArgument(_) => None,
            Self::NotFound(_) => Some(404),
            Self::Remote(failure) => failure.status,
        }
    }
}

impl From<reqwest::Error> for ResourceError {
    fn from(err: reqwest::Error) -> Self {
        Self::Remote(RemoteFailure::new(
            err.status().map(|s| s.as_u16()),
            None,
            err.to_string(),
        ))
    }
}

pub type Result<T> = std::result::Result<T, ResourceError>;
