//! Federated Sign In Use Case
//!
//! Google and Facebook sign-in. The provider assertion is verified by the
//! `IdentityProvider` port, then resolved onto a local account.

use std::sync::Arc;

use crate::application::identity::IdentityResolver;
use crate::application::token_codec::{TokenCodec, TokenPair};
use crate::domain::entity::{federated_identity::FederatedIdentity, user::User};
use crate::domain::gateway::IdentityProvider;
use crate::domain::repository::UserRepository;
use crate::domain::value_object::email::Email;
use crate::error::{AuthError, AuthResult};

/// Provider assertion as received from the client
#[derive(Debug, Clone)]
pub enum FederatedCredential {
    GoogleCode(String),
    GoogleIdToken(String),
    FacebookCode {
        code: String,
        redirect_uri: Option<String>,
    },
    FacebookAccessToken(String),
}

/// Federated sign in output
pub struct FederatedSignInOutput {
    pub user: User,
    pub tokens: TokenPair,
    pub needs_onboarding: bool,
}

/// Federated sign in use case
pub struct FederatedSignInUseCase<U, P>
where
    U: UserRepository,
    P: IdentityProvider,
{
    resolver: IdentityResolver<U>,
    identity_provider: Arc<P>,
    token_codec: Arc<TokenCodec>,
}

impl<U, P> FederatedSignInUseCase<U, P>
where
    U: UserRepository,
    P: IdentityProvider,
{
    pub fn new(user_repo: Arc<U>, identity_provider: Arc<P>, token_codec: Arc<TokenCodec>) -> Self {
        Self {
            resolver: IdentityResolver::new(user_repo),
            identity_provider,
            token_codec,
        }
    }

    pub async fn execute(&self, credential: FederatedCredential) -> AuthResult<FederatedSignInOutput> {
        let identity = self.verify(credential).await?;

        let email = identity
            .email
            .as_deref()
            .filter(|e| !e.trim().is_empty())
            .ok_or_else(|| {
                AuthError::bad_request(format!(
                    "Email not provided by {}",
                    identity.provider.label()
                ))
            })?;
        let email = Email::new(email)?;

        let user = self.resolver.resolve_federated(&identity, &email).await?;
        let tokens = self.token_codec.issue_pair(user.id, user.email.as_str())?;
        let needs_onboarding = user.needs_onboarding();

        tracing::info!(
            user_id = %user.id,
            provider = %identity.provider,
            needs_onboarding,
            "Federated sign-in"
        );

        Ok(FederatedSignInOutput {
            user,
            tokens,
            needs_onboarding,
        })
    }

    async fn verify(&self, credential: FederatedCredential) -> AuthResult<FederatedIdentity> {
        match credential {
            FederatedCredential::GoogleCode(code) => {
                let code = required(code, "Authorization code is required")?;
                self.identity_provider.exchange_google_code(&code).await
            }
            FederatedCredential::GoogleIdToken(id_token) => {
                let id_token = required(id_token, "ID token is required")?;
                self.identity_provider.verify_google_id_token(&id_token).await
            }
            FederatedCredential::FacebookCode { code, redirect_uri } => {
                let code = required(code, "Authorization code is required")?;
                self.identity_provider
                    .exchange_facebook_code(&code, redirect_uri.as_deref())
                    .await
            }
            FederatedCredential::FacebookAccessToken(access_token) => {
                let access_token = required(access_token, "Access token is required")?;
                self.identity_provider
                    .verify_facebook_access_token(&access_token)
                    .await
            }
        }
    }
}

fn required(value: String, message: &str) -> AuthResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AuthError::bad_request(message));
    }
    Ok(value.to_string())
}
