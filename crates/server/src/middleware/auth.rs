//! Bearer token extractor.
//!
//! Handlers that need a caller take [`RequireClaims`]; the token is verified
//! by the state's [`ClaimsVerifier`](crate::services::auth::ClaimsVerifier)
//! before the handler runs.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use crate::db::Backend;
use crate::error::{AppError, set_sentry_user};
use crate::models::Claims;
use crate::services::auth::AuthError;
use crate::state::AppState;

/// Extractor that requires a verified bearer token.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(RequireClaims(claims): RequireClaims) -> String {
///     format!("Hello, {}!", claims.first_name)
/// }
/// ```
pub struct RequireClaims(pub Claims);

impl<B: Backend> FromRequestParts<AppState<B>> for RequireClaims {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState<B>,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or(AuthError::MissingToken)?;

        let claims = state
            .verifier()
            .verify(token)
            .await
            .inspect_err(|e| tracing::debug!(error = %e, "token verification failed"))?;

        tracing::Span::current().record("user_id", claims.id.as_str());
        set_sentry_user(&claims.id, Some(&claims.nick_name));

        Ok(Self(claims))
    }
}

/// The token from an `Authorization: Bearer <token>` header.
fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}
