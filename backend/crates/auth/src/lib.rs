//! Auth (Authentication) Backend Module
//!
//! Clean Architecture structure:
//! - `domain/` - Entities, value objects, repository and gateway traits
//! - `application/` - Use cases, identity resolution, token codec
//! - `infra/` - PostgreSQL, Redis, SMTP and identity-provider adapters
//! - `presentation/` - HTTP handlers, DTOs, router, middleware
//!
//! ## Features
//! - Email/password sign-up and sign-in
//! - Passwordless magic links
//! - Six-digit email verification codes with cache-backed expiry
//! - Google and Facebook sign-in, linked onto existing accounts by email
//! - Per-route, per-IP rate limits
//!
//! ## Security Model
//! - Passwords hashed with Argon2id (NIST SP 800-63B style policy)
//! - Stateless HS256 tokens: `EmailToken` (30 min) for magic links,
//!   `NormalToken` and `RefreshToken` (30 days) for sessions
//! - Only `NormalToken` passes the bearer guard
//! - Identical sign-in failures for unknown email and wrong password
//! - Verification codes are single-use

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;


// Re-exports for convenience
pub use application::config::AuthConfig;
pub use application::token_codec::TokenCodec;
pub use error::{AuthError, AuthResult};
pub use infra::ProductionDeps;
pub use presentation::{AuthAppState, AuthDeps, auth_router};

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

// Convenience re-exports
pub mod config {
    pub use crate::application::config::*;
}

pub mod models {
    pub use crate::domain::entity::*;
    pub use crate::domain::value_object::*;
    pub use crate::presentation::dto::*;
}
