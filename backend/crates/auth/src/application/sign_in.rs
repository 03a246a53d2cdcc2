//! Sign In Use Case
//!
//! Authenticates an email/password pair and issues a token pair.

use std::sync::{Arc, LazyLock};

use crate::application::config::AuthConfig;
use crate::application::token_codec::{TokenCodec, TokenPair};
use crate::domain::entity::user::User;
use crate::domain::repository::UserRepository;
use crate::domain::value_object::{
    email::Email,
    user_password::{RawPassword, UserPassword},
};
use crate::error::{AuthError, AuthResult};

/// Same message for every credential failure so accounts cannot be enumerated
pub const INVALID_CREDENTIALS: &str = "Invalid email or password";

/// Verified against when the account has no hash, so every failed sign-in
/// costs one Argon2 run
static DECOY_HASH: LazyLock<Option<UserPassword>> = LazyLock::new(|| {
    let decoy = RawPassword::submitted("decoy#sign-in#hash".to_string());
    UserPassword::from_raw(&decoy, None).ok()
});

/// Sign in input
pub struct SignInInput {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Sign in output
pub struct SignInOutput {
    pub user: User,
    pub tokens: TokenPair,
}

/// Sign in use case
pub struct SignInUseCase<U>
where
    U: UserRepository,
{
    user_repo: Arc<U>,
    token_codec: Arc<TokenCodec>,
    config: Arc<AuthConfig>,
}

impl<U> SignInUseCase<U>
where
    U: UserRepository,
{
    pub fn new(user_repo: Arc<U>, token_codec: Arc<TokenCodec>, config: Arc<AuthConfig>) -> Self {
        Self {
            user_repo,
            token_codec,
            config,
        }
    }

    pub async fn execute(&self, input: SignInInput) -> AuthResult<SignInOutput> {
        let (Some(email), Some(password)) = (
            input.email.filter(|e| !e.trim().is_empty()),
            input.password.filter(|p| !p.is_empty()),
        ) else {
            return Err(AuthError::bad_request("Email and password are required"));
        };

        let email = Email::new(email).map_err(|_| AuthError::unauthorized(INVALID_CREDENTIALS))?;

        let user = self.user_repo.find_by_email(&email).await?;
        let stored_hash = user.as_ref().and_then(|u| u.password_hash.clone());

        let raw_password = RawPassword::submitted(password);
        let pepper = self.config.password_pepper.clone();
        let password_valid = tokio::task::spawn_blocking(move || match stored_hash {
            Some(hash) => hash.verify(&raw_password, pepper.as_deref()),
            None => {
                if let Some(decoy) = DECOY_HASH.as_ref() {
                    let _ = decoy.verify(&raw_password, pepper.as_deref());
                }
                false
            }
        })
        .await
        .map_err(|e| AuthError::Internal(format!("Password verification task failed: {e}")))?;

        let user = match user {
            Some(user) if password_valid => user,
            Some(user) => {
                tracing::debug!(
                    user_id = %user.id,
                    has_password = user.password_hash.is_some(),
                    "Password sign-in rejected"
                );
                return Err(AuthError::unauthorized(INVALID_CREDENTIALS));
            }
            None => return Err(AuthError::unauthorized(INVALID_CREDENTIALS)),
        };

        let tokens = self.token_codec.issue_pair(user.id, user.email.as_str())?;

        tracing::info!(user_id = %user.id, "User signed in");

        Ok(SignInOutput { user, tokens })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Everything before the salt: algorithm, version and cost parameters
    fn cost_prefix(phc: &str) -> String {
        phc.split('$').take(4).collect::<Vec<_>>().join("$")
    }

    #[test]
    fn test_decoy_hash_costs_the_same_as_a_real_hash() {
        let decoy = DECOY_HASH.as_ref().unwrap();
        let chosen = RawPassword::submitted("Sourdough#Rescue42".to_string());
        let real = UserPassword::from_raw(&chosen, None).unwrap();

        assert_eq!(
            cost_prefix(decoy.as_phc_string()),
            cost_prefix(real.as_phc_string())
        );
        assert!(decoy.as_phc_string().starts_with("$argon2id$"));
    }

    #[test]
    fn test_decoy_hash_rejects_submitted_passwords() {
        let decoy = DECOY_HASH.as_ref().unwrap();
        for attempt in ["", "Sourdough#Rescue42", "password"] {
            assert!(!decoy.verify(&RawPassword::submitted(attempt.to_string()), None));
        }
    }
}
