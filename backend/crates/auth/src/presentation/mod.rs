//! Presentation Layer
//!
//! HTTP handlers, DTOs, router, and middleware.

pub mod dto;
pub mod handlers;
pub mod middleware;
pub mod router;

pub use handlers::{AuthAppState, AuthDeps};
pub use middleware::{CurrentUser, RateLimitPolicy, enforce_rate_limit};
pub use router::auth_router;
