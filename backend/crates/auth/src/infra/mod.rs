//! Infrastructure Layer
//!
//! Database implementations and external service integrations.

pub mod mail;
pub mod memory;
pub mod oauth;
pub mod postgres;
pub mod redis;

pub use self::mail::{MailService, MailSettings};
pub use self::memory::{InMemoryCache, InMemoryUserRepository};
pub use self::oauth::HttpIdentityProvider;
pub use self::postgres::PgUserRepository;
pub use self::redis::{CacheBackend, RateLimitBackend, RedisCache, RedisRateLimitStore};

use crate::presentation::handlers::AuthDeps;

/// Production wiring: PostgreSQL users, Redis or in-memory cache and
/// counters, SMTP mail and live identity providers
pub struct ProductionDeps;

impl AuthDeps for ProductionDeps {
    type Users = PgUserRepository;
    type Cache = CacheBackend;
    type Mailer = MailService;
    type Identity = HttpIdentityProvider;
    type RateLimits = RateLimitBackend;
}
