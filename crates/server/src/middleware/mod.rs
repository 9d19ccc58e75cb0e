//! HTTP middleware stack.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (binary only)
//! 2. CORS
//! 3. `TraceLayer` (request span with `request_id` and `user_id` fields)
//! 4. Request ID (add unique ID to each request)
//!
//! Authentication is per-handler via the [`RequireClaims`] extractor.

pub mod auth;
pub mod request_id;

pub use auth::RequireClaims;
pub use request_id::{REQUEST_ID_HEADER, request_id_middleware};
