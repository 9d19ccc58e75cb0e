//! Bearer token verification.
//!
//! The API never parses tokens itself. A [`ClaimsVerifier`] asks the identity
//! provider who the token belongs to and hands back verified [`Claims`].
//! [`OidcVerifier`] does this against the realm's userinfo endpoint and caches
//! answers for a short TTL (keyed by token) so a burst of requests costs one
//! round trip.

mod error;

pub use error::AuthError;

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use moka::future::Cache;
use serde::Deserialize;
use tracing::{debug, instrument};
use url::Url;

use forkful_core::UserId;

use crate::config::OidcConfig;
use crate::models::Claims;

/// Boxed future returned by [`ClaimsVerifier::verify`].
pub type VerifyFuture<'a> = Pin<Box<dyn Future<Output = Result<Claims, AuthError>> + Send + 'a>>;

/// Resolves a bearer token into verified claims.
///
/// Object-safe so application state can hold any verifier behind an `Arc`.
pub trait ClaimsVerifier: Send + Sync {
    fn verify<'a>(&'a self, token: &'a str) -> VerifyFuture<'a>;
}

// =============================================================================
// OIDC userinfo verifier
// =============================================================================

/// Userinfo response. Keycloak includes realm roles when the
/// `realm roles` mapper is enabled for the userinfo token.
#[derive(Debug, Deserialize)]
struct UserInfo {
    sub: String,
    #[serde(default)]
    given_name: String,
    #[serde(default)]
    family_name: String,
    #[serde(default)]
    preferred_username: String,
    #[serde(default)]
    picture: String,
    #[serde(default)]
    realm_access: RealmAccess,
}

#[derive(Debug, Default, Deserialize)]
struct RealmAccess {
    #[serde(default)]
    roles: Vec<String>,
}

impl TryFrom<UserInfo> for Claims {
    type Error = AuthError;

    fn try_from(info: UserInfo) -> Result<Self, Self::Error> {
        let id = UserId::parse(&info.sub)
            .map_err(|e| AuthError::InvalidClaims(format!("sub: {e}")))?;

        Ok(Self {
            id,
            first_name: info.given_name,
            last_name: info.family_name,
            nick_name: info.preferred_username,
            image_profile_url: info.picture,
            roles: info.realm_access.roles,
        })
    }
}

/// Verifies tokens against an OpenID Connect userinfo endpoint.
#[derive(Clone)]
pub struct OidcVerifier {
    inner: Arc<OidcVerifierInner>,
}

struct OidcVerifierInner {
    client: reqwest::Client,
    userinfo_url: Url,
    cache: Cache<String, Claims>,
}

impl OidcVerifier {
    /// Create a verifier for the configured realm.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidIssuer` if the userinfo URL cannot be built.
    pub fn new(config: &OidcConfig) -> Result<Self, AuthError> {
        let userinfo_url = config.userinfo_url()?;
        let cache = Cache::builder()
            .max_capacity(10_000)
            .time_to_live(config.claims_cache_ttl)
            .build();

        Ok(Self {
            inner: Arc::new(OidcVerifierInner {
                client: reqwest::Client::new(),
                userinfo_url,
                cache,
            }),
        })
    }

    #[instrument(skip_all)]
    async fn fetch(&self, token: &str) -> Result<Claims, AuthError> {
        let response = self
            .inner
            .client
            .get(self.inner.userinfo_url.clone())
            .bearer_auth(token)
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(AuthError::InvalidToken);
        }
        if !status.is_success() {
            tracing::warn!(status = %status, "userinfo endpoint returned non-success status");
            return Err(AuthError::Provider {
                status: status.as_u16(),
            });
        }

        let info: UserInfo = response.json().await?;
        Claims::try_from(info)
    }
}

impl ClaimsVerifier for OidcVerifier {
    fn verify<'a>(&'a self, token: &'a str) -> VerifyFuture<'a> {
        Box::pin(async move {
            if let Some(claims) = self.inner.cache.get(token).await {
                debug!(user = %claims.id, "claims cache hit");
                return Ok(claims);
            }

            let claims = self.fetch(token).await?;
            self.inner
                .cache
                .insert(token.to_owned(), claims.clone())
                .await;
            Ok(claims)
        })
    }
}

// =============================================================================
// Static verifier
// =============================================================================

/// Verifier backed by a fixed token table. For tests and local development.
#[derive(Debug, Clone, Default)]
pub struct StaticVerifier {
    tokens: HashMap<String, Claims>,
}

impl StaticVerifier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept `token` as `claims`.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>, claims: Claims) -> Self {
        self.tokens.insert(token.into(), claims);
        self
    }
}

impl ClaimsVerifier for StaticVerifier {
    fn verify<'a>(&'a self, token: &'a str) -> VerifyFuture<'a> {
        let result = self
            .tokens
            .get(token)
            .cloned()
            .ok_or(AuthError::InvalidToken);
        Box::pin(async move { result })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use axum::http::{HeaderMap, StatusCode};
    use axum::response::IntoResponse;
    use axum::routing::get;
    use axum::{Json, Router};

    use super::*;

    /// Serve a fake realm; returns its issuer URL and a call counter.
    async fn fake_realm() -> (Url, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();

        let app = Router::new().route(
            "/realms/forkful/protocol/openid-connect/userinfo",
            get(move |headers: HeaderMap| {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    let auth = headers
                        .get("authorization")
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or_default();
                    if auth != "Bearer good-token" {
                        return StatusCode::UNAUTHORIZED.into_response();
                    }
                    Json(serde_json::json!({
                        "sub": "3f1c-subject",
                        "given_name": "Ploy",
                        "family_name": "Kaew",
                        "preferred_username": "ploy",
                        "picture": "https://img.example/ploy.png",
                        "realm_access": { "roles": ["admin", "offline_access"] }
                    }))
                    .into_response()
                }
            }),
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let issuer = Url::parse(&format!("http://{addr}/realms/forkful")).unwrap();
        (issuer, calls)
    }

    fn verifier(issuer: Url) -> OidcVerifier {
        OidcVerifier::new(&OidcConfig {
            issuer_url: issuer,
            claims_cache_ttl: Duration::from_secs(60),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_oidc_maps_userinfo_to_claims() {
        let (issuer, _) = fake_realm().await;
        let claims = verifier(issuer).verify("good-token").await.unwrap();

        assert_eq!(claims.id.as_str(), "3f1c-subject");
        assert_eq!(claims.first_name, "Ploy");
        assert_eq!(claims.last_name, "Kaew");
        assert_eq!(claims.nick_name, "ploy");
        assert!(claims.is_admin());
    }

    #[tokio::test]
    async fn test_oidc_caches_verified_tokens() {
        let (issuer, calls) = fake_realm().await;
        let verifier = verifier(issuer);

        verifier.verify("good-token").await.unwrap();
        verifier.verify("good-token").await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_oidc_rejects_bad_token() {
        let (issuer, calls) = fake_realm().await;
        let verifier = verifier(issuer);

        for _ in 0..2 {
            let err = verifier.verify("bad-token").await.unwrap_err();
            assert!(matches!(err, AuthError::InvalidToken));
        }
        // Failures are not cached
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_userinfo_with_blank_sub_is_invalid() {
        let info: UserInfo = serde_json::from_str(r#"{"sub":" "}"#).unwrap();
        assert!(matches!(
            Claims::try_from(info),
            Err(AuthError::InvalidClaims(_))
        ));
    }

    #[tokio::test]
    async fn test_static_verifier() {
        let claims = Claims {
            id: UserId::parse("u1").unwrap(),
            first_name: "A".to_string(),
            last_name: "B".to_string(),
            nick_name: String::new(),
            image_profile_url: String::new(),
            roles: Vec::new(),
        };
        let verifier = StaticVerifier::new().with_token("t1", claims.clone());

        assert_eq!(verifier.verify("t1").await.unwrap(), claims);
        assert!(verifier.verify("t2").await.is_err());
    }
}
