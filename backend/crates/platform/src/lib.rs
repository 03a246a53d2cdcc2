//! Platform Crate - Technical Infrastructure
//!
//! Shared technical foundations for the marketplace backend:
//! - Secure randomness and constant-time comparison
//! - Password hashing (Argon2id, NIST SP 800-63B style policy)
//! - Cookie and bearer credential extraction
//! - Client IP resolution behind reverse proxies
//! - Fixed-window rate limiting

pub mod client;
pub mod cookie;
pub mod crypto;
pub mod password;
pub mod rate_limit;
