//! Error types for route registration and configuration payloads.

use crate::response::RouteId;
use thiserror::Error;

/// Errors raised while assembling a route group.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    /// A response was offered to a group registered for another route.
    #[error("route identity mismatch: group is {expected}, response is {actual}")]
    IdentityMismatch { expected: RouteId, actual: RouteId },

    /// A pattern-mode response carries an expression that does not compile.
    #[error("invalid pattern {pattern:?}: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// Selection mode outside 0 (fixed), 1 (keyword), 2 (pattern).
    #[error("unknown selection mode: {0}")]
    UnknownMode(i64),

    /// A group must hold at least one response.
    #[error("route group needs at least one response")]
    EmptyGroup,
}

/// Errors reported back to the caller of the configuration endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("required field missing: {0}")]
    MissingField(&'static str),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("empty response list")]
    EmptyResponse,

    #[error("import failed: {0}")]
    ImportFailed(String),

    #[error("invalid status code: {0}")]
    InvalidStatus(u16),

    #[error("invalid header {name:?}: {reason}")]
    InvalidHeader { name: String, reason: String },

    #[error(transparent)]
    Route(#[from] RouteError),
}

impl ConfigError {
    /// Short message sent in the `msg` field of the error reply.
    pub fn message(&self) -> &'static str {
        match self {
            ConfigError::MissingField(_) => "required field missing",
            ConfigError::InvalidRequest(_) => "invalid request",
            ConfigError::EmptyResponse => "empty response",
            ConfigError::ImportFailed(_) => "import failed",
            ConfigError::InvalidStatus(_) => "invalid status code",
            ConfigError::InvalidHeader { .. } => "invalid header",
            ConfigError::Route(RouteError::IdentityMismatch { .. }) => "route identity mismatch",
            ConfigError::Route(RouteError::InvalidPattern { .. }) => "invalid pattern",
            ConfigError::Route(RouteError::UnknownMode(_)) => "unknown mode",
            ConfigError::Route(RouteError::EmptyGroup) => "empty response",
        }
    }
}
