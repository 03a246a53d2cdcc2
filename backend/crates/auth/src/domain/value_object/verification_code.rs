//! Verification Code Value Object
//!
//! Six-digit numeric code proving ownership of an email address.

use platform::crypto::{constant_time_eq, random_in_range};
use std::fmt;

const CODE_MIN: u32 = 100_000;
const CODE_MAX: u32 = 999_999;

/// Cache key prefix for stored codes
pub const CACHE_KEY_PREFIX: &str = "verification_code:";

#[derive(Clone, PartialEq, Eq)]
pub struct VerificationCode(String);

impl VerificationCode {
    /// Uniform draw over `[100000, 999999]`
    pub fn generate() -> Self {
        Self(random_in_range(CODE_MIN, CODE_MAX).to_string())
    }

    /// Wrap a code read back from the cache
    pub fn from_stored(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Compare against user input, ignoring surrounding whitespace on both sides
    pub fn matches(&self, submitted: &str) -> bool {
        constant_time_eq(self.0.trim().as_bytes(), submitted.trim().as_bytes())
    }

    /// `verification_code:<email>`
    pub fn cache_key(email: &str) -> String {
        format!("{CACHE_KEY_PREFIX}{email}")
    }
}

impl fmt::Debug for VerificationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("VerificationCode")
            .field(&"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_is_six_digits() {
        for _ in 0..200 {
            let code = VerificationCode::generate();
            assert_eq!(code.as_str().len(), 6);
            assert!(code.as_str().chars().all(|c| c.is_ascii_digit()));
            assert_ne!(code.as_str().chars().next(), Some('0'));
        }
    }

    #[test]
    fn test_matches_trims_input() {
        let code = VerificationCode::from_stored("482913");
        assert!(code.matches("482913"));
        assert!(code.matches(" 482913\n"));
        assert!(!code.matches("482914"));
        assert!(!code.matches("48291"));
    }

    #[test]
    fn test_cache_key() {
        assert_eq!(
            VerificationCode::cache_key("t@t.com"),
            "verification_code:t@t.com"
        );
    }

    #[test]
    fn test_debug_redacts() {
        let code = VerificationCode::from_stored("123456");
        assert!(!format!("{code:?}").contains("123456"));
    }
}
