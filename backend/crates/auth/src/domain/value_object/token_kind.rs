use chrono::Duration;
use derive_more::Display;
use serde::{Deserialize, Serialize};

/// Purpose tag carried in every signed token's `type` claim
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenKind {
    /// Magic-link redemption only
    EmailToken,
    /// The only kind the bearer guard accepts
    NormalToken,
    /// Issued alongside `NormalToken`; nothing exchanges it yet
    RefreshToken,
}

impl TokenKind {
    /// Lifetime from the moment of issue
    pub fn lifetime(&self) -> Duration {
        match self {
            TokenKind::EmailToken => Duration::minutes(30),
            TokenKind::NormalToken | TokenKind::RefreshToken => Duration::hours(720),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifetimes() {
        assert_eq!(TokenKind::EmailToken.lifetime().num_minutes(), 30);
        assert_eq!(TokenKind::NormalToken.lifetime().num_days(), 30);
        assert_eq!(TokenKind::RefreshToken.lifetime().num_hours(), 720);
    }

    #[test]
    fn test_wire_names() {
        assert_eq!(
            serde_json::to_string(&TokenKind::NormalToken).unwrap(),
            "\"NormalToken\""
        );
        assert_eq!(TokenKind::EmailToken.to_string(), "EmailToken");
    }
}
