//! User Password Value Objects
//!
//! A password chosen at sign-up goes through the policy; a password
//! submitted at sign-in does not.
//!
//! ```rust
//! use auth::domain::value_object::user_password::{RawPassword, UserPassword};
//!
//! let chosen = RawPassword::new("Sourdough#Rescue42".to_string()).unwrap();
//! let stored = UserPassword::from_raw(&chosen, None).unwrap();
//!
//! let attempt = RawPassword::submitted("Sourdough#Rescue42".to_string());
//! assert!(stored.verify(&attempt, None));
//! ```

use kernel::error::app_error::{AppError, AppResult};
use platform::password::{ClearTextPassword, HashedPassword, PasswordPolicyError};
use std::fmt;

/// Clear text from a request body, zeroized on drop
pub struct RawPassword(ClearTextPassword);

impl RawPassword {
    /// A newly chosen password; policy violations are `BadRequest`
    pub fn new(raw: String) -> AppResult<Self> {
        ClearTextPassword::new(raw)
            .map(Self)
            .map_err(policy_violation)
    }

    /// A password typed at sign-in
    pub fn submitted(raw: String) -> Self {
        Self(ClearTextPassword::for_verification(raw))
    }
}

fn policy_violation(err: PasswordPolicyError) -> AppError {
    let (message, action) = match err {
        PasswordPolicyError::TooShort { min, .. } => (
            format!("Password must be at least {min} characters"),
            "Please choose a longer password",
        ),
        PasswordPolicyError::TooLong { max, .. } => (
            format!("Password must be at most {max} characters"),
            "Please choose a shorter password",
        ),
        PasswordPolicyError::EmptyOrWhitespace => (
            "Password cannot be empty".to_string(),
            "Please enter a password",
        ),
        PasswordPolicyError::InvalidCharacter => (
            "Password contains invalid characters".to_string(),
            "Please remove any control characters",
        ),
        PasswordPolicyError::CommonPattern => (
            "Password is too common or follows a predictable pattern".to_string(),
            "Please choose a less predictable password",
        ),
    };

    AppError::bad_request(message).with_action(action)
}

impl fmt::Debug for RawPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RawPassword([REDACTED])")
    }
}

/// Stored Argon2id hash
///
/// Hashing and verifying are CPU-bound; callers run them on a blocking task.
#[derive(Clone, PartialEq, Eq)]
pub struct UserPassword(HashedPassword);

impl UserPassword {
    pub fn from_raw(raw: &RawPassword, pepper: Option<&[u8]>) -> AppResult<Self> {
        raw.0
            .hash(pepper)
            .map(Self)
            .map_err(|e| AppError::internal(e.to_string()))
    }

    /// A `password_hash` column value
    pub fn from_phc_string(phc: impl Into<String>) -> AppResult<Self> {
        HashedPassword::from_phc_string(phc)
            .map(Self)
            .map_err(|_| AppError::internal("Invalid password hash in database"))
    }

    pub fn as_phc_string(&self) -> &str {
        self.0.as_phc_string()
    }

    pub fn verify(&self, raw: &RawPassword, pepper: Option<&[u8]>) -> bool {
        self.0.verify(&raw.0, pepper)
    }
}

impl fmt::Debug for UserPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("UserPassword([HASH])")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_violation_is_bad_request_with_action() {
        let err = RawPassword::new("short".to_string()).unwrap_err();
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.message(), "Password must be at least 8 characters");
        assert_eq!(err.action(), Some("Please choose a longer password"));

        let err = RawPassword::new("password123".to_string()).unwrap_err();
        assert_eq!(err.action(), Some("Please choose a less predictable password"));
    }

    #[test]
    fn test_submitted_password_is_never_rejected() {
        let stored = UserPassword::from_raw(&RawPassword::submitted("x".to_string()), None).unwrap();
        assert!(stored.verify(&RawPassword::submitted("x".to_string()), None));
    }

    #[test]
    fn test_stored_hash_round_trip() {
        let chosen = RawPassword::new("Sourdough#Rescue42".to_string()).unwrap();
        let stored = UserPassword::from_raw(&chosen, Some(b"pepper")).unwrap();

        let restored = UserPassword::from_phc_string(stored.as_phc_string()).unwrap();
        assert!(restored.verify(&chosen, Some(b"pepper")));
        assert!(!restored.verify(&RawPassword::submitted("nope".to_string()), Some(b"pepper")));

        assert!(UserPassword::from_phc_string("plaintext").is_err());
    }

    #[test]
    fn test_debug_redaction() {
        let chosen = RawPassword::new("Sourdough#Rescue42".to_string()).unwrap();
        assert_eq!(format!("{chosen:?}"), "RawPassword([REDACTED])");

        let stored = UserPassword::from_raw(&chosen, None).unwrap();
        assert_eq!(format!("{stored:?}"), "UserPassword([HASH])");
    }
}
