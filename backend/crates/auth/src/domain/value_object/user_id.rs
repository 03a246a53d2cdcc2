use serde::{Deserialize, Serialize};
use std::fmt;

/// Database-assigned numeric user identifier
///
/// Travels as a decimal string inside token payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(i64);

impl UserId {
    #[inline]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    #[inline]
    pub const fn get(&self) -> i64 {
        self.0
    }

    /// Parse the string form carried by a token; only positive ids are valid
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().parse::<i64>() {
            Ok(id) if id > 0 => Some(Self(id)),
            _ => None,
        }
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_round_trips_display() {
        let id = UserId::new(42);
        assert_eq!(UserId::parse(&id.to_string()), Some(id));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(UserId::parse(""), None);
        assert_eq!(UserId::parse("abc"), None);
        assert_eq!(UserId::parse("0"), None);
        assert_eq!(UserId::parse("-7"), None);
    }
}
