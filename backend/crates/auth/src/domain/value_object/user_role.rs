use serde::{Deserialize, Serialize};
use std::fmt;

/// Marketplace role. Every new account starts as `None` until onboarding
/// picks a side of the marketplace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum UserRole {
    #[default]
    #[serde(rename = "NONE")]
    None,
    #[serde(rename = "PENDING_PROVIDER")]
    PendingProvider,
    #[serde(rename = "PROVIDER")]
    Provider,
    #[serde(rename = "CLIENT")]
    Client,
    #[serde(rename = "ADMIN")]
    Admin,
}

impl UserRole {
    #[inline]
    pub const fn code(&self) -> &'static str {
        use UserRole::*;
        match self {
            None => "NONE",
            PendingProvider => "PENDING_PROVIDER",
            Provider => "PROVIDER",
            Client => "CLIENT",
            Admin => "ADMIN",
        }
    }

    /// Parse a stored role code
    #[inline]
    pub fn from_code(code: &str) -> Option<Self> {
        use UserRole::*;
        match code {
            "NONE" => Some(None),
            "PENDING_PROVIDER" => Some(PendingProvider),
            "PROVIDER" => Some(Provider),
            "CLIENT" => Some(Client),
            "ADMIN" => Some(Admin),
            _ => Option::None,
        }
    }

    /// True until onboarding has assigned a role
    #[inline]
    pub const fn needs_onboarding(&self) -> bool {
        matches!(self, UserRole::None)
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_role_from_code() {
        assert_eq!(UserRole::from_code("NONE"), Some(UserRole::None));
        assert_eq!(
            UserRole::from_code("PENDING_PROVIDER"),
            Some(UserRole::PendingProvider)
        );
        assert_eq!(UserRole::from_code("PROVIDER"), Some(UserRole::Provider));
        assert_eq!(UserRole::from_code("CLIENT"), Some(UserRole::Client));
        assert_eq!(UserRole::from_code("ADMIN"), Some(UserRole::Admin));
        assert_eq!(UserRole::from_code("admin"), Option::None);
    }

    #[test]
    fn test_user_role_serde_matches_code() {
        for role in [
            UserRole::None,
            UserRole::PendingProvider,
            UserRole::Provider,
            UserRole::Client,
            UserRole::Admin,
        ] {
            let json = serde_json::to_string(&role).unwrap();
            assert_eq!(json, format!("\"{}\"", role.code()));
        }
    }

    #[test]
    fn test_only_none_needs_onboarding() {
        assert!(UserRole::default().needs_onboarding());
        assert!(!UserRole::Client.needs_onboarding());
        assert!(!UserRole::PendingProvider.needs_onboarding());
    }
}
