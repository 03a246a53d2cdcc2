//! Outbound Gateways
//!
//! Ports to services outside the process: mail delivery and identity
//! providers.

use crate::domain::entity::federated_identity::FederatedIdentity;
use crate::domain::value_object::{email::Email, verification_code::VerificationCode};
use crate::error::AuthResult;

/// Transactional mail
#[trait_variant::make(EmailSender: Send)]
pub trait LocalEmailSender {
    async fn send_magic_link(&self, to: &Email, link: &str) -> AuthResult<()>;

    async fn send_verification_code(&self, to: &Email, code: &VerificationCode)
    -> AuthResult<()>;
}

/// Verification of Google and Facebook assertions
///
/// Every method fails with `Configuration` when the provider's credentials
/// are not set, `OAuthProvider` when the provider rejects the assertion and
/// `ProviderUnavailable` when it cannot be reached.
#[trait_variant::make(IdentityProvider: Send)]
pub trait LocalIdentityProvider {
    /// Consent screen URL carrying `state`
    fn google_consent_url(&self, state: &str) -> AuthResult<String>;

    /// Authorization-code flow
    async fn exchange_google_code(&self, code: &str) -> AuthResult<FederatedIdentity>;

    /// ID token obtained client-side
    async fn verify_google_id_token(&self, id_token: &str) -> AuthResult<FederatedIdentity>;

    /// Authorization-code flow; `redirect_uri` overrides the configured one
    async fn exchange_facebook_code(
        &self,
        code: &str,
        redirect_uri: Option<&str>,
    ) -> AuthResult<FederatedIdentity>;

    /// User access token obtained client-side
    async fn verify_facebook_access_token(
        &self,
        access_token: &str,
    ) -> AuthResult<FederatedIdentity>;
}
