//! HTTP route handlers for the recipe catalog API.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                                - Liveness check
//! GET    /health/ready                          - Database readiness check
//!
//! # Recipes (/api/v1)
//! GET    /food-recipes?search=&page=&limit=     - Search, paged ({results, total})
//! POST   /food-recipes                          - Create (owner = caller)
//! GET    /food-recipes/{id}                     - Recipe detail
//! PUT    /food-recipes/{id}                     - Update (owner only)
//! DELETE /food-recipes/{id}                     - Delete (owner or admin)
//! GET    /difficulties                          - Difficulty lookup
//! GET    /cooking-durations                     - Cooking duration lookup
//!
//! # Engagement (/api/v1)
//! GET    /food-recipes/{id}/ratings             - Ratings, newest first
//! POST   /food-recipes/{id}/ratings             - Rate (bearer)
//! GET    /food-recipes/{id}/love                - Has the caller loved it
//! POST   /food-recipes/{id}/love                - Love
//! DELETE /food-recipes/{id}/love                - Un-love
//! POST   /food-recipes/{id}/love/toggle         - Flip the love
//!
//! # Users (/api/v1, bearer)
//! POST   /auth/sync                             - Create/refresh from token claims
//! GET    /users/self                            - Caller's record (own id ok)
//! GET    /users/self/loved-recipes              - Caller's loved recipes (own id ok)
//! GET    /users/{id}/food-recipes               - Recipes owned by a user (`self` ok)
//! PATCH  /users/{id}/profile                    - Update nickname/image (self only)
//! PATCH  /users/{id}/nickname                   - Same as /profile
//! ```

pub mod engagement;
pub mod recipes;
pub mod users;

use axum::{
    Router,
    extract::State,
    http::{Method, StatusCode},
    routing::{get, patch, post},
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tracing::Span;

use crate::db::Backend;
use crate::middleware::request_id_middleware;
use crate::state::AppState;

/// Build the full application router.
///
/// Sentry layers are added by the binary so tests can serve the router
/// without a Sentry client.
pub fn router<B: Backend>(state: AppState<B>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness::<B>))
        .nest("/api/v1", api_routes())
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = tracing::field::Empty,
                        user_id = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &Span| {
                        span.record("status", response.status().as_u16());
                        #[allow(clippy::cast_possible_truncation)] // Latency never exceeds u64 ms
                        span.record("latency_ms", latency.as_millis() as u64);
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .layer(cors_layer())
        .with_state(state)
}

/// Everything under `/api/v1`.
fn api_routes<B: Backend>() -> Router<AppState<B>> {
    Router::new()
        .nest("/food-recipes", recipe_routes())
        .route("/difficulties", get(recipes::difficulties::<B>))
        .route("/cooking-durations", get(recipes::cooking_durations::<B>))
        .route("/auth/sync", post(users::sync::<B>))
        .nest("/users", user_routes())
}

/// Create the recipe routes router.
fn recipe_routes<B: Backend>() -> Router<AppState<B>> {
    Router::new()
        .route("/", get(recipes::index::<B>).post(recipes::create::<B>))
        .route(
            "/{id}",
            get(recipes::show::<B>)
                .put(recipes::update::<B>)
                .delete(recipes::destroy::<B>),
        )
        .route(
            "/{id}/ratings",
            get(engagement::ratings::<B>).post(engagement::rate::<B>),
        )
        .route(
            "/{id}/love",
            get(engagement::has_loved::<B>)
                .post(engagement::love::<B>)
                .delete(engagement::unlove::<B>),
        )
        .route("/{id}/love/toggle", post(engagement::toggle::<B>))
}

/// Create the user routes router.
fn user_routes<B: Backend>() -> Router<AppState<B>> {
    Router::new()
        .route("/{id}", get(users::show::<B>))
        .route("/{id}/loved-recipes", get(users::loved_recipes::<B>))
        .route("/{id}/food-recipes", get(users::food_recipes::<B>))
        .route("/{id}/profile", patch(users::update_profile::<B>))
        .route("/{id}/nickname", patch(users::update_profile::<B>))
}

/// Any origin may call the API.
fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::PATCH,
            Method::OPTIONS,
        ])
        .allow_headers(Any)
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the database is not reachable.
async fn readiness<B: Backend>(State(state): State<AppState<B>>) -> StatusCode {
    if state.backend().is_ready().await {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, header};
    use tower::ServiceExt;

    use super::*;
    use crate::db::MemoryStore;
    use crate::services::auth::StaticVerifier;

    fn app() -> Router {
        router(AppState::new(
            MemoryStore::new(),
            Arc::new(StaticVerifier::new()),
        ))
    }

    #[tokio::test]
    async fn test_health_endpoints() {
        let response = app()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app()
            .oneshot(Request::get("/health/ready").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_cors_preflight_allows_patch() {
        let response = app()
            .oneshot(
                Request::options("/api/v1/users/self/profile")
                    .header(header::ORIGIN, "https://forkful.example")
                    .header(header::ACCESS_CONTROL_REQUEST_METHOD, "PATCH")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let allowed = response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_METHODS)
            .unwrap()
            .to_str()
            .unwrap();
        assert!(allowed.contains("PATCH"));
        assert_eq!(
            response
                .headers()
                .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
                .unwrap(),
            "*"
        );
    }

    #[tokio::test]
    async fn test_request_id_is_echoed() {
        let response = app()
            .oneshot(
                Request::get("/health")
                    .header(crate::middleware::REQUEST_ID_HEADER, "req-42")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(
            response
                .headers()
                .get(crate::middleware::REQUEST_ID_HEADER)
                .unwrap(),
            "req-42"
        );
    }
}
