//! Error handling for shelter API operations.

use reqwest::StatusCode;
use thiserror::Error;

/// Common error type for remote shelter API operations.
///
/// The gateway performs no retries; a failed call aborts the enclosing
/// operation and is handled by the caller's failure policy (breed fetch and
/// session operations propagate, search and location resolution collapse to
/// empty results).
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The session is invalid or expired (401/403). Surfaced distinctly so
    /// the embedding application can re-authenticate; the client itself
    /// never redirects.
    #[error("session invalid or expired ({status})")]
    AuthExpired { status: StatusCode },
    #[error("{status}: {detail}")]
    ErrorResponse { status: StatusCode, detail: String },
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("{0}")]
    Other(String),
}

impl GatewayError {
    /// Whether this error signals an invalid session.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, GatewayError::AuthExpired { .. })
    }

    /// HTTP status associated with this error, if any.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            GatewayError::AuthExpired { status } => Some(*status),
            GatewayError::ErrorResponse { status, .. } => Some(*status),
            GatewayError::Transport(err) => err.status(),
            GatewayError::InvalidUrl(_) | GatewayError::Other(_) => None,
        }
    }
}

/// Errors from session operations (login, logout, favorites, match).
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("add favorites before requesting a match")]
    NoFavorites,
    #[error("matched dog {0} is not in the favorites list")]
    UnknownMatch(String),
    #[error("favorites list is full")]
    FavoritesFull,
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}
