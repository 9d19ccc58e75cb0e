//! Application state shared across handlers.

use std::sync::Arc;

use crate::db::{Backend, PgBackend};
use crate::services::auth::ClaimsVerifier;
use crate::services::{CatalogService, EngagementService, IdentityService};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to the
/// stores and the token verifier. It is generic over the storage backend so
/// the router can be served from `PostgreSQL` or the in-memory store.
pub struct AppState<B: Backend = PgBackend> {
    inner: Arc<AppStateInner<B>>,
}

struct AppStateInner<B> {
    backend: B,
    verifier: Arc<dyn ClaimsVerifier>,
}

// Manual impl: `derive(Clone)` would require `B: Clone` on the struct itself.
impl<B: Backend> Clone for AppState<B> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<B: Backend> AppState<B> {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `backend` - Storage backend shared by all services
    /// * `verifier` - Turns bearer tokens into claims
    #[must_use]
    pub fn new(backend: B, verifier: Arc<dyn ClaimsVerifier>) -> Self {
        Self {
            inner: Arc::new(AppStateInner { backend, verifier }),
        }
    }

    #[must_use]
    pub fn backend(&self) -> &B {
        &self.inner.backend
    }

    #[must_use]
    pub fn verifier(&self) -> &dyn ClaimsVerifier {
        self.inner.verifier.as_ref()
    }

    #[must_use]
    pub fn catalog(&self) -> CatalogService<B::Recipes> {
        CatalogService::new(self.inner.backend.recipes())
    }

    #[must_use]
    pub fn engagement(&self) -> EngagementService<B::Engagement> {
        EngagementService::new(self.inner.backend.engagement())
    }

    #[must_use]
    pub fn identity(&self) -> IdentityService<B::Users, B::Recipes> {
        IdentityService::new(self.inner.backend.users(), self.inner.backend.recipes())
    }
}
