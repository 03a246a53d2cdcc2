//! In-Memory Implementations
//!
//! Process-local credential store and cache for tests and local runs
//! without PostgreSQL or Redis. Both enforce the same contracts as the
//! networked adapters.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::{Duration, Instant};

use chrono::Utc;
use tokio::sync::RwLock;

use crate::domain::entity::user::{NewUser, User};
use crate::domain::repository::{KeyValueCache, UserRepository};
use crate::domain::value_object::{email::Email, user_id::UserId};
use crate::error::{AuthError, AuthResult};

/// Credential store with unique email and Google id
pub struct InMemoryUserRepository {
    users: RwLock<HashMap<UserId, User>>,
    next_id: AtomicI64,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
            next_id: AtomicI64::new(1),
        }
    }

    pub async fn count(&self) -> usize {
        self.users.read().await.len()
    }

    pub async fn all(&self) -> Vec<User> {
        let mut users: Vec<User> = self.users.read().await.values().cloned().collect();
        users.sort_by_key(|u| u.id);
        users
    }
}

impl Default for InMemoryUserRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl UserRepository for InMemoryUserRepository {
    async fn create(&self, new_user: &NewUser) -> AuthResult<User> {
        let mut users = self.users.write().await;

        let duplicate = users.values().any(|u| {
            u.email == new_user.email
                || (new_user.google_id.is_some() && u.google_id == new_user.google_id)
        });
        if duplicate {
            return Err(AuthError::Conflict(
                "User with this email already exists".to_string(),
            ));
        }

        let now = Utc::now();
        let user = User {
            id: UserId::new(self.next_id.fetch_add(1, Ordering::SeqCst)),
            email: new_user.email.clone(),
            username: new_user.username.clone(),
            password_hash: new_user.password_hash.clone(),
            google_id: new_user.google_id.clone(),
            role: new_user.role,
            email_verified: new_user.email_verified,
            location: None,
            phone: None,
            maps_link: None,
            profile_image: new_user.profile_image.clone(),
            created_at: now,
            updated_at: now,
        };
        users.insert(user.id, user.clone());

        Ok(user)
    }

    async fn find_by_id(&self, id: UserId) -> AuthResult<Option<User>> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &Email) -> AuthResult<Option<User>> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|u| u.email == *email)
            .cloned())
    }

    async fn find_by_google_id(&self, google_id: &str) -> AuthResult<Option<User>> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|u| u.google_id.as_deref() == Some(google_id))
            .cloned())
    }

    async fn exists_by_email(&self, email: &Email) -> AuthResult<bool> {
        Ok(self.users.read().await.values().any(|u| u.email == *email))
    }

    async fn update(&self, user: &User) -> AuthResult<()> {
        let mut users = self.users.write().await;

        if user.google_id.is_some()
            && users
                .values()
                .any(|u| u.id != user.id && u.google_id == user.google_id)
        {
            return Err(AuthError::AccountConflict(
                "Provider identity is already linked to another account".to_string(),
            ));
        }

        // Matches an UPDATE that touches no rows
        if let Some(stored) = users.get_mut(&user.id) {
            *stored = user.clone();
        }

        Ok(())
    }

    async fn delete(&self, id: UserId) -> AuthResult<()> {
        self.users.write().await.remove(&id);
        Ok(())
    }
}

/// Expiring key/value map
pub struct InMemoryCache {
    entries: RwLock<HashMap<String, (String, Instant)>>,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Remaining lifetime of a live entry
    pub async fn ttl(&self, key: &str) -> Option<Duration> {
        let entries = self.entries.read().await;
        let (_, expires_at) = entries.get(key)?;
        expires_at.checked_duration_since(Instant::now())
    }
}

impl Default for InMemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyValueCache for InMemoryCache {
    async fn get(&self, key: &str) -> AuthResult<Option<String>> {
        let now = Instant::now();
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                Some((value, expires_at)) if *expires_at > now => {
                    return Ok(Some(value.clone()));
                }
                Some(_) => {}
                None => return Ok(None),
            }
        }

        // Expired: evict
        self.entries.write().await.remove(key);
        Ok(None)
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> AuthResult<()> {
        self.entries
            .write()
            .await
            .insert(key.to_string(), (value.to_string(), Instant::now() + ttl));
        Ok(())
    }

    async fn delete(&self, key: &str) -> AuthResult<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}
