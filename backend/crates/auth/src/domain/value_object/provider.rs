use derive_more::Display;
use serde::{Deserialize, Serialize};

/// External identity provider
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthProvider {
    #[display("google")]
    Google,
    #[display("facebook")]
    Facebook,
}

impl AuthProvider {
    /// Human-readable name for user-facing messages
    pub const fn label(&self) -> &'static str {
        match self {
            AuthProvider::Google => "Google",
            AuthProvider::Facebook => "Facebook",
        }
    }
}
