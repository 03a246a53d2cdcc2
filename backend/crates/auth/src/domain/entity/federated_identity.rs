use crate::domain::value_object::provider::AuthProvider;

/// Identity asserted by an external provider after verification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FederatedIdentity {
    pub provider: AuthProvider,
    /// Provider-scoped subject id
    pub provider_id: String,
    /// Not every provider account exposes an email
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub picture_url: Option<String>,
}
