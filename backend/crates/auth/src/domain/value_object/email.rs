//! Email Value Object
//!
//! A trimmed, lower-cased address. This normalized form is the matching key
//! for every sign-in method; ownership is proven separately by a
//! verification code.

use kernel::error::app_error::{AppError, AppResult};
use std::fmt;

/// RFC 5321 path limit
const MAX_LEN: usize = 254;
const MAX_LOCAL_LEN: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Email(String);

impl Email {
    /// Normalize and validate user input
    pub fn new(raw: impl Into<String>) -> AppResult<Self> {
        let normalized = raw.into().trim().to_lowercase();

        match normalized.len() {
            0 => Err(AppError::bad_request("Email cannot be empty")),
            len if len > MAX_LEN => Err(AppError::bad_request(format!(
                "Email must be at most {MAX_LEN} characters"
            ))),
            _ if !is_plausible_address(&normalized) => {
                Err(AppError::bad_request("Invalid email format")
                    .with_action("Please enter an address like name@example.com"))
            }
            _ => Ok(Self(normalized)),
        }
    }

    /// Rehydrate a stored address (normalized at write time)
    pub fn from_db(email: impl Into<String>) -> Self {
        Self(email.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Part before the `@`, used as the default username
    pub fn local_part(&self) -> &str {
        self.split().0
    }

    /// Log-safe form, e.g. `j***@example.com`
    pub fn masked(&self) -> String {
        let (local, domain) = self.split();
        match local.chars().next() {
            Some(first) => format!("{first}***@{domain}"),
            None => format!("***@{domain}"),
        }
    }

    fn split(&self) -> (&str, &str) {
        self.0.split_once('@').unwrap_or((self.0.as_str(), ""))
    }
}

/// A non-empty local part and a dotted ASCII domain. Deliverability is
/// settled by the verification code, not here.
fn is_plausible_address(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };

    let local_ok = !local.is_empty() && local.len() <= MAX_LOCAL_LEN;
    let domain_ok = domain.contains('.')
        && domain
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-')
        && !domain.starts_with(['.', '-'])
        && !domain.ends_with(['.', '-'])
        && !domain.contains("..");

    local_ok && domain_ok
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalization() {
        let email = Email::new("  Fresh.Greens@Example.COM ").unwrap();
        assert_eq!(email.as_str(), "fresh.greens@example.com");
        assert_eq!(email.local_part(), "fresh.greens");
    }

    #[test]
    fn test_accepts_common_shapes() {
        for ok in [
            "user@example.com",
            "user.name@example.co.jp",
            "user+tag@example.com",
            "t@t.com",
        ] {
            assert!(Email::new(ok).is_ok(), "{ok}");
        }
    }

    #[test]
    fn test_rejects_malformed() {
        for bad in [
            "",
            "   ",
            "userexample.com",
            "user@",
            "@example.com",
            "user@@example.com",
            "user@example",
            "user@-example.com",
            "user@example..com",
        ] {
            assert!(Email::new(bad).is_err(), "{bad:?}");
        }
    }

    #[test]
    fn test_rejects_overlong() {
        let local = "a".repeat(65);
        assert!(Email::new(format!("{local}@example.com")).is_err());

        let domain = format!("{}.com", "d".repeat(250));
        assert!(Email::new(format!("a@{domain}")).is_err());
    }

    #[test]
    fn test_masked() {
        let email = Email::new("jane.doe@bakery.example").unwrap();
        assert_eq!(email.masked(), "j***@bakery.example");
    }
}
