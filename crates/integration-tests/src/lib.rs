//! Integration tests for Forkful.
//!
//! # Running Tests
//!
//! ```bash
//! # In-process tests (no external services)
//! cargo test -p forkful-integration-tests
//!
//! # Include the PostgreSQL-backed tests
//! FORKFUL_DATABASE_URL=postgres://... cargo test -p forkful-integration-tests -- --ignored
//! ```
//!
//! # Test Categories
//!
//! - `recipes_api` - Recipe catalog endpoints
//! - `engagement_api` - Loves and ratings
//! - `users_api` - Claims sync, profile and per-user listings
//! - `postgres` - The same flows against a real database (ignored by default)
//!
//! Every test serves the real router on an ephemeral port and talks to it
//! over HTTP. Tokens are resolved by a [`StaticVerifier`], so no identity
//! provider is needed.

#![allow(clippy::missing_panics_doc)]

use std::sync::Arc;

use reqwest::{Client, RequestBuilder, Response};
use serde_json::{Value, json};

use forkful_core::UserId;
use forkful_server::db::{Backend, MemoryStore};
use forkful_server::models::{ADMIN_ROLE, Claims};
use forkful_server::routes;
use forkful_server::services::auth::StaticVerifier;
use forkful_server::state::AppState;

/// Token for a regular user, "alice".
pub const ALICE_TOKEN: &str = "token-alice";
/// Token for a second regular user, "bob".
pub const BOB_TOKEN: &str = "token-bob";
/// Token for a user holding the admin role.
pub const ADMIN_TOKEN: &str = "token-admin";

/// Build claims the way the identity provider would send them.
#[must_use]
pub fn claims(id: &str, nick_name: &str, roles: &[&str]) -> Claims {
    Claims {
        id: UserId::parse(id).expect("valid test user id"),
        first_name: format!("{nick_name} first"),
        last_name: format!("{nick_name} last"),
        nick_name: nick_name.to_string(),
        image_profile_url: format!("https://avatars.example/{nick_name}.png"),
        roles: roles.iter().map(ToString::to_string).collect(),
    }
}

/// Verifier knowing alice, bob and the admin.
#[must_use]
pub fn test_verifier() -> StaticVerifier {
    StaticVerifier::new()
        .with_token(ALICE_TOKEN, claims("alice", "alice", &[]))
        .with_token(BOB_TOKEN, claims("bob", "bob", &[]))
        .with_token(ADMIN_TOKEN, claims("root", "root", &[ADMIN_ROLE]))
}

/// A running server plus an HTTP client pointed at it.
pub struct TestContext {
    pub client: Client,
    pub base_url: String,
}

impl TestContext {
    /// Serve the router over a fresh in-memory store.
    pub async fn new() -> Self {
        Self::with_backend(MemoryStore::new()).await
    }

    /// Serve the router over `backend`, with the alice/bob/admin tokens.
    pub async fn with_backend<B: Backend>(backend: B) -> Self {
        Self::with_state(AppState::new(backend, Arc::new(test_verifier()))).await
    }

    /// Serve the router over a prepared state.
    pub async fn with_state<B: Backend>(state: AppState<B>) -> Self {
        let app = routes::router(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("Failed to read local addr");

        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Test server error");
        });

        Self {
            client: Client::new(),
            base_url: format!("http://{addr}"),
        }
    }

    /// Absolute URL for an `/api/v1` path.
    #[must_use]
    pub fn api(&self, path: &str) -> String {
        format!("{}/api/v1{path}", self.base_url)
    }

    #[must_use]
    pub fn get(&self, path: &str) -> RequestBuilder {
        self.client.get(self.api(path))
    }

    #[must_use]
    pub fn post(&self, path: &str) -> RequestBuilder {
        self.client.post(self.api(path))
    }

    #[must_use]
    pub fn put(&self, path: &str) -> RequestBuilder {
        self.client.put(self.api(path))
    }

    #[must_use]
    pub fn patch(&self, path: &str) -> RequestBuilder {
        self.client.patch(self.api(path))
    }

    #[must_use]
    pub fn delete(&self, path: &str) -> RequestBuilder {
        self.client.delete(self.api(path))
    }

    /// Sync the token holder's claims into a user record.
    pub async fn sync(&self, token: &str) -> Value {
        let resp = self
            .post("/auth/sync")
            .bearer_auth(token)
            .send()
            .await
            .expect("Failed to sync user");
        assert!(resp.status().is_success(), "sync failed: {}", resp.status());
        json_body(resp).await
    }

    /// Create a recipe as the token holder and return its JSON.
    pub async fn create_recipe(&self, token: &str, name: &str) -> Value {
        let resp = self
            .post("/food-recipes")
            .bearer_auth(token)
            .json(&recipe_body(name))
            .send()
            .await
            .expect("Failed to create recipe");
        assert_eq!(resp.status().as_u16(), 201, "create failed for {name}");
        json_body(resp).await
    }
}

/// A valid create body using the first seeded lookups.
#[must_use]
pub fn recipe_body(name: &str) -> Value {
    json!({
        "name": name,
        "description": format!("{name}, the house way"),
        "ingredient": "rice, chili, lime",
        "instruction": "cook it",
        "difficultyId": 1,
        "cookingDurationId": 2,
    })
}

/// Read a response body as JSON.
pub async fn json_body(resp: Response) -> Value {
    resp.json().await.expect("Response was not JSON")
}

/// The numeric `id` of a recipe JSON object.
#[must_use]
pub fn recipe_id(recipe: &Value) -> i64 {
    recipe["id"].as_i64().expect("recipe has an id")
}
