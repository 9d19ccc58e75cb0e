//! Verified identity claims.

use thiserror::Error;
use url::Url;

use forkful_core::UserId;

/// Realm role that grants administrator rights.
pub const ADMIN_ROLE: &str = "admin";

/// Reasons a claims payload cannot be merged into a user record.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClaimsError {
    #[error("first name is required")]
    MissingFirstName,
    #[error("last name is required")]
    MissingLastName,
    #[error("profile image must be an absolute http(s) URL: {0}")]
    InvalidImageUrl(String),
}

/// Identity claims for the caller.
///
/// Only ever produced by a [`ClaimsVerifier`](crate::services::auth::ClaimsVerifier)
/// from a token the identity provider vouched for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Claims {
    /// `sub`
    pub id: UserId,
    /// `given_name`
    pub first_name: String,
    /// `family_name`
    pub last_name: String,
    /// `preferred_username`
    pub nick_name: String,
    /// `picture`
    pub image_profile_url: String,
    /// Realm roles.
    pub roles: Vec<String>,
}

impl Claims {
    /// Structural validation before the claims touch storage.
    ///
    /// # Errors
    ///
    /// Returns `ClaimsError` if a name is blank or the picture is not an
    /// absolute http(s) URL.
    pub fn validate(&self) -> Result<(), ClaimsError> {
        if self.first_name.trim().is_empty() {
            return Err(ClaimsError::MissingFirstName);
        }
        if self.last_name.trim().is_empty() {
            return Err(ClaimsError::MissingLastName);
        }
        let picture = self.image_profile_url.trim();
        if !picture.is_empty() && !is_http_url(picture) {
            return Err(ClaimsError::InvalidImageUrl(picture.to_owned()));
        }
        Ok(())
    }

    /// Whether the caller holds the administrator role.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.roles.iter().any(|r| r == ADMIN_ROLE)
    }
}

/// True for absolute `http`/`https` URLs.
#[must_use]
pub fn is_http_url(value: &str) -> bool {
    Url::parse(value).is_ok_and(|u| matches!(u.scheme(), "http" | "https") && u.has_host())
}
