//! Token verification error types.

use thiserror::Error;

/// Errors that can occur while turning a bearer token into claims.
#[derive(Debug, Error)]
pub enum AuthError {
    /// No `Authorization: Bearer` header on the request.
    #[error("missing bearer token")]
    MissingToken,

    /// The identity provider rejected the token.
    #[error("invalid or expired token")]
    InvalidToken,

    /// The provider vouched for the token but the claims are unusable.
    #[error("invalid claims: {0}")]
    InvalidClaims(String),

    /// The provider answered with an unexpected status.
    #[error("identity provider returned HTTP {status}")]
    Provider { status: u16 },

    /// HTTP request to the provider failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The configured issuer does not yield a valid endpoint URL.
    #[error("invalid issuer URL: {0}")]
    InvalidIssuer(#[from] url::ParseError),
}

impl AuthError {
    /// Whether the failure is the caller's fault (bad or missing token) as
    /// opposed to ours or the provider's.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::MissingToken | Self::InvalidToken | Self::InvalidClaims(_)
        )
    }
}
