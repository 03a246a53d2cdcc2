//! Repository Traits
//!
//! Interfaces for data persistence. Implementations live in the
//! infrastructure layer.

use std::time::Duration;

use crate::domain::entity::user::{NewUser, User};
use crate::domain::value_object::{email::Email, user_id::UserId};
use crate::error::AuthResult;

/// Credential store
#[trait_variant::make(UserRepository: Send)]
pub trait LocalUserRepository {
    /// Insert a user. A duplicate email or Google id is `Conflict`.
    async fn create(&self, user: &NewUser) -> AuthResult<User>;

    async fn find_by_id(&self, id: UserId) -> AuthResult<Option<User>>;

    /// Lookup by normalized email
    async fn find_by_email(&self, email: &Email) -> AuthResult<Option<User>>;

    async fn find_by_google_id(&self, google_id: &str) -> AuthResult<Option<User>>;

    async fn exists_by_email(&self, email: &Email) -> AuthResult<bool>;

    /// Persist mutable fields. A Google id owned by another row is `AccountConflict`.
    async fn update(&self, user: &User) -> AuthResult<()>;

    async fn delete(&self, id: UserId) -> AuthResult<()>;
}

/// Short-lived key/value storage with per-entry expiry
#[trait_variant::make(KeyValueCache: Send)]
pub trait LocalKeyValueCache {
    async fn get(&self, key: &str) -> AuthResult<Option<String>>;

    /// Overwrites any existing value and resets its expiry
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> AuthResult<()>;

    async fn delete(&self, key: &str) -> AuthResult<()>;
}
