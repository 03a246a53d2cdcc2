//! Password Hashing
//!
//! Argon2id in PHC string format. Clear text is NFKC-normalized, zeroized on
//! drop, and checked against the policy only when a password is being chosen.

use std::fmt;

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use rand::rngs::OsRng;
use thiserror::Error;
use unicode_normalization::UnicodeNormalization;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Counted in code points after normalization
pub const MIN_PASSWORD_LENGTH: usize = 8;
pub const MAX_PASSWORD_LENGTH: usize = 128;

/// Keyboard runs rejected anywhere inside a password
const KEYBOARD_RUNS: [&str; 5] = ["qwerty", "asdfgh", "zxcvbn", "qazwsx", "1qaz2wsx"];

/// Whole passwords rejected outright (compared lower-cased)
const DENYLIST: [&str; 13] = [
    "password",
    "password1",
    "password123",
    "abcdefgh",
    "letmein1",
    "welcome1",
    "admin123",
    "iloveyou",
    "sunshine",
    "princess",
    "football",
    "baseball",
    "trustno1",
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PasswordPolicyError {
    #[error("password has {actual} characters, minimum is {min}")]
    TooShort { min: usize, actual: usize },

    #[error("password has {actual} characters, maximum is {max}")]
    TooLong { max: usize, actual: usize },

    #[error("password is blank")]
    EmptyOrWhitespace,

    #[error("password contains control characters")]
    InvalidCharacter,

    #[error("password is on the weak-password list")]
    CommonPattern,
}

#[derive(Debug, Error)]
pub enum PasswordHashError {
    #[error("argon2 hashing failed: {0}")]
    HashingFailed(String),

    #[error("stored hash is not a PHC string")]
    InvalidHashFormat,
}

fn check_policy(password: &str) -> Result<(), PasswordPolicyError> {
    if password.trim().is_empty() {
        return Err(PasswordPolicyError::EmptyOrWhitespace);
    }

    let actual = password.chars().count();
    if actual < MIN_PASSWORD_LENGTH {
        return Err(PasswordPolicyError::TooShort {
            min: MIN_PASSWORD_LENGTH,
            actual,
        });
    }
    if actual > MAX_PASSWORD_LENGTH {
        return Err(PasswordPolicyError::TooLong {
            max: MAX_PASSWORD_LENGTH,
            actual,
        });
    }

    // Tab and newline survive copy-paste from password managers
    if password
        .chars()
        .any(|c| c.is_control() && !matches!(c, '\t' | '\n'))
    {
        return Err(PasswordPolicyError::InvalidCharacter);
    }

    if is_weak(&password.to_lowercase()) {
        return Err(PasswordPolicyError::CommonPattern);
    }

    Ok(())
}

fn is_weak(lower: &str) -> bool {
    let single_repeated_char = lower
        .chars()
        .next()
        .is_some_and(|first| lower.chars().all(|c| c == first));

    single_repeated_char
        || is_digit_run(lower)
        || KEYBOARD_RUNS.iter().any(|run| lower.contains(run))
        || DENYLIST.contains(&lower)
}

/// At least four digits counting up or down by one, wrapping between 9 and 0
fn is_digit_run(s: &str) -> bool {
    let Some(digits) = s
        .chars()
        .map(|c| c.to_digit(10))
        .collect::<Option<Vec<u32>>>()
    else {
        return false;
    };

    if digits.len() < 4 {
        return false;
    }

    let steps = |delta: u32| digits.windows(2).all(|w| (w[0] + delta) % 10 == w[1]);
    steps(1) || steps(9)
}

/// Normalized clear text, zeroized on drop
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct ClearTextPassword(String);

impl ClearTextPassword {
    /// A newly chosen password; must satisfy the policy
    pub fn new(raw: String) -> Result<Self, PasswordPolicyError> {
        let password = Self::for_verification(raw);
        check_policy(&password.0)?;
        Ok(password)
    }

    /// A submitted password, compared as-is so older passwords keep working
    /// after the policy changes
    pub fn for_verification(mut raw: String) -> Self {
        let normalized = raw.nfkc().collect();
        raw.zeroize();
        Self(normalized)
    }

    /// Argon2id with a fresh salt and the default parameters
    /// (m = 19 MiB, t = 2, p = 1)
    pub fn hash(&self, pepper: Option<&[u8]>) -> Result<HashedPassword, PasswordHashError> {
        let salt = SaltString::generate(&mut OsRng);
        let phc = Argon2::default()
            .hash_password(&self.with_pepper(pepper), &salt)
            .map_err(|e| PasswordHashError::HashingFailed(e.to_string()))?
            .to_string();

        Ok(HashedPassword(phc))
    }

    fn with_pepper(&self, pepper: Option<&[u8]>) -> Vec<u8> {
        [self.0.as_bytes(), pepper.unwrap_or_default()].concat()
    }
}

impl fmt::Debug for ClearTextPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ClearTextPassword([REDACTED])")
    }
}

/// Argon2id PHC string as stored on the user row
#[derive(Clone, PartialEq, Eq)]
pub struct HashedPassword(String);

impl HashedPassword {
    pub fn from_phc_string(phc: impl Into<String>) -> Result<Self, PasswordHashError> {
        let phc = phc.into();
        if PasswordHash::new(&phc).is_err() {
            return Err(PasswordHashError::InvalidHashFormat);
        }
        Ok(Self(phc))
    }

    pub fn as_phc_string(&self) -> &str {
        &self.0
    }

    /// Constant-time digest comparison inside argon2
    pub fn verify(&self, password: &ClearTextPassword, pepper: Option<&[u8]>) -> bool {
        PasswordHash::new(&self.0).is_ok_and(|parsed| {
            Argon2::default()
                .verify_password(&password.with_pepper(pepper), &parsed)
                .is_ok()
        })
    }
}

impl fmt::Debug for HashedPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("HashedPassword([HASH])")
    }
}
