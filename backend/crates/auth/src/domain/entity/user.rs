//! User Entity
//!
//! Canonical identity record. Exactly one per normalized email.

use chrono::{DateTime, Utc};

use crate::domain::value_object::{
    email::Email, user_id::UserId, user_password::UserPassword, user_role::UserRole,
};

/// Persisted user
#[derive(Debug, Clone)]
pub struct User {
    pub id: UserId,
    /// Normalized (trimmed, lower-cased) email, unique
    pub email: Email,
    pub username: String,
    /// Absent for accounts created through a magic link or a provider
    pub password_hash: Option<UserPassword>,
    pub google_id: Option<String>,
    pub role: UserRole,
    pub email_verified: bool,
    pub location: Option<String>,
    pub phone: Option<String>,
    pub maps_link: Option<String>,
    pub profile_image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Attach a Google account id
    pub fn link_google(&mut self, google_id: impl Into<String>) {
        self.google_id = Some(google_id.into());
        self.updated_at = Utc::now();
    }

    /// Set the profile image only if none is stored yet. Returns whether it changed.
    pub fn backfill_profile_image(&mut self, picture_url: Option<&str>) -> bool {
        let has_image = self
            .profile_image
            .as_deref()
            .is_some_and(|url| !url.trim().is_empty());

        match picture_url {
            Some(url) if !has_image && !url.trim().is_empty() => {
                self.profile_image = Some(url.to_string());
                self.updated_at = Utc::now();
                true
            }
            _ => false,
        }
    }

    pub fn mark_email_verified(&mut self) {
        self.email_verified = true;
        self.updated_at = Utc::now();
    }

    pub fn needs_onboarding(&self) -> bool {
        self.role.needs_onboarding()
    }
}

/// Insert payload; the store assigns `id` and timestamps
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: Email,
    pub username: String,
    pub password_hash: Option<UserPassword>,
    pub google_id: Option<String>,
    pub role: UserRole,
    pub email_verified: bool,
    pub profile_image: Option<String>,
}

impl NewUser {
    /// Account with role `NONE`, no password and an unverified email
    pub fn from_email(email: Email) -> Self {
        let username = email.local_part().to_string();
        Self {
            email,
            username,
            password_hash: None,
            google_id: None,
            role: UserRole::None,
            email_verified: false,
            profile_image: None,
        }
    }

    pub fn with_password(mut self, hash: UserPassword) -> Self {
        self.password_hash = Some(hash);
        self
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = username.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        let now = Utc::now();
        User {
            id: UserId::new(1),
            email: Email::new("baker@example.com").unwrap(),
            username: "baker".to_string(),
            password_hash: None,
            google_id: None,
            role: UserRole::None,
            email_verified: false,
            location: None,
            phone: None,
            maps_link: None,
            profile_image: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_backfill_only_when_empty() {
        let mut user = sample_user();
        assert!(user.backfill_profile_image(Some("https://img/a.png")));
        assert_eq!(user.profile_image.as_deref(), Some("https://img/a.png"));

        assert!(!user.backfill_profile_image(Some("https://img/b.png")));
        assert_eq!(user.profile_image.as_deref(), Some("https://img/a.png"));
    }

    #[test]
    fn test_backfill_ignores_missing_picture() {
        let mut user = sample_user();
        assert!(!user.backfill_profile_image(None));
        assert!(!user.backfill_profile_image(Some("  ")));
        assert!(user.profile_image.is_none());
    }

    #[test]
    fn test_new_user_defaults() {
        let new_user = NewUser::from_email(Email::new("Fresh.Greens@Example.com").unwrap());
        assert_eq!(new_user.username, "fresh.greens");
        assert_eq!(new_user.role, UserRole::None);
        assert!(!new_user.email_verified);
        assert!(new_user.password_hash.is_none());
    }
}
