//! Sign Up Use Case
//!
//! Creates a password account and signs it in.

use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::application::token_codec::{TokenCodec, TokenIssuer, TokenPair};
use crate::domain::entity::user::{NewUser, User};
use crate::domain::repository::UserRepository;
use crate::domain::value_object::{
    email::Email,
    user_password::{RawPassword, UserPassword},
};
use crate::error::{AuthError, AuthResult};

/// Sign up input
pub struct SignUpInput {
    pub email: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Sign up output
pub struct SignUpOutput {
    pub user: User,
    pub tokens: TokenPair,
}

/// Sign up use case
///
/// Creating the row and issuing its tokens are two steps with no shared
/// transaction; a server-side failure in the second deletes the row again.
pub struct SignUpUseCase<U, T = TokenCodec>
where
    U: UserRepository,
    T: TokenIssuer,
{
    user_repo: Arc<U>,
    token_issuer: Arc<T>,
    config: Arc<AuthConfig>,
}

impl<U, T> SignUpUseCase<U, T>
where
    U: UserRepository,
    T: TokenIssuer,
{
    pub fn new(user_repo: Arc<U>, token_issuer: Arc<T>, config: Arc<AuthConfig>) -> Self {
        Self {
            user_repo,
            token_issuer,
            config,
        }
    }

    pub async fn execute(&self, input: SignUpInput) -> AuthResult<SignUpOutput> {
        let (Some(email), Some(username), Some(password)) = (
            non_blank(input.email),
            non_blank(input.username),
            input.password.filter(|p| !p.is_empty()),
        ) else {
            return Err(AuthError::bad_request(
                "Email, username and password are required",
            ));
        };

        let email = Email::new(email)?;
        let raw_password = RawPassword::new(password)?;

        if self.user_repo.exists_by_email(&email).await? {
            return Err(AuthError::Conflict(
                "User with this email already exists".to_string(),
            ));
        }

        let pepper = self.config.password_pepper.clone();
        let password_hash = tokio::task::spawn_blocking(move || {
            UserPassword::from_raw(&raw_password, pepper.as_deref())
        })
        .await
        .map_err(|e| AuthError::Internal(format!("Password hashing task failed: {e}")))??;

        // A racing sign-up loses at the unique index and gets the same Conflict
        let user = self
            .user_repo
            .create(
                &NewUser::from_email(email)
                    .with_username(username)
                    .with_password(password_hash),
            )
            .await
            .map_err(|e| match e {
                AuthError::Conflict(_) => {
                    AuthError::Conflict("User with this email already exists".to_string())
                }
                other => other,
            })?;

        let tokens = match self.token_issuer.issue_pair(user.id, user.email.as_str()) {
            Ok(tokens) => tokens,
            Err(e) => {
                if e.is_server_error() {
                    self.roll_back(&user).await;
                }
                return Err(e);
            }
        };

        tracing::info!(
            user_id = %user.id,
            email = %user.email.masked(),
            "User signed up"
        );

        Ok(SignUpOutput { user, tokens })
    }

    /// Best-effort removal of an account that could not be signed in
    async fn roll_back(&self, user: &User) {
        match self.user_repo.delete(user.id).await {
            Ok(()) => tracing::warn!(user_id = %user.id, "Rolled back sign-up"),
            Err(e) => tracing::error!(
                user_id = %user.id,
                error = %e,
                "Failed to roll back sign-up"
            ),
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
