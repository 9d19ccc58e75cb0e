//! Business logic services.
//!
//! # Services
//!
//! - `catalog` - Recipe create/search/update/delete and lookups
//! - `engagement` - Loves and ratings
//! - `identity` - Merging identity-provider claims into user records
//! - `policy` - Ownership and administrator checks
//! - `auth` - Bearer token verification
//!
//! Services are generic over the store traits in [`crate::db`], so the same
//! logic runs against `PostgreSQL` and the in-memory store.

pub mod auth;
pub mod catalog;
pub mod engagement;
mod error;
pub mod identity;
pub mod policy;

pub use catalog::{CatalogService, RecipePage};
pub use engagement::EngagementService;
pub use error::ServiceError;
pub use identity::{IdentityService, UpdateProfileRequest};
