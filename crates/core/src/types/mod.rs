//! Core types for Forkful.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod score;
pub mod user_id;

pub use id::*;
pub use score::{Score, ScoreError};
pub use user_id::{UserId, UserIdError, UserRef};
