//! Email Verification Use Cases
//!
//! A six-digit code is cached per email and mailed to the user; presenting
//! it once marks the email as verified.

use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::domain::entity::user::User;
use crate::domain::gateway::EmailSender;
use crate::domain::repository::{KeyValueCache, UserRepository};
use crate::domain::value_object::{
    email::Email, user_id::UserId, verification_code::VerificationCode,
};
use crate::error::{AuthError, AuthResult};

/// Cached profile projections owned by other services
fn user_profile_cache_key(user_id: UserId) -> String {
    format!("user_profile:{user_id}")
}

/// Send a fresh code, replacing any earlier one
pub struct SendVerificationCodeUseCase<U, C, M>
where
    U: UserRepository,
    C: KeyValueCache,
    M: EmailSender,
{
    user_repo: Arc<U>,
    cache: Arc<C>,
    mailer: Arc<M>,
    config: Arc<AuthConfig>,
}

impl<U, C, M> SendVerificationCodeUseCase<U, C, M>
where
    U: UserRepository,
    C: KeyValueCache,
    M: EmailSender,
{
    pub fn new(user_repo: Arc<U>, cache: Arc<C>, mailer: Arc<M>, config: Arc<AuthConfig>) -> Self {
        Self {
            user_repo,
            cache,
            mailer,
            config,
        }
    }

    pub async fn execute(&self, email: Option<String>) -> AuthResult<()> {
        let user = find_user(self.user_repo.as_ref(), email.as_deref()).await?;

        let code = VerificationCode::generate();
        let key = VerificationCode::cache_key(user.email.as_str());

        // The mail still goes out; the code just cannot be redeemed later
        if let Err(e) = self
            .cache
            .set(&key, code.as_str(), self.config.verification_code_ttl)
            .await
        {
            tracing::warn!(
                user_id = %user.id,
                error = %e,
                "Failed to store verification code"
            );
        }

        self.mailer.send_verification_code(&user.email, &code).await?;

        tracing::info!(
            user_id = %user.id,
            email = %user.email.masked(),
            "Verification code sent"
        );

        Ok(())
    }
}

/// Verify input
pub struct VerifyCodeInput {
    pub email: Option<String>,
    pub code: Option<String>,
}

/// Redeem a verification code
pub struct VerifyCodeUseCase<U, C>
where
    U: UserRepository,
    C: KeyValueCache,
{
    user_repo: Arc<U>,
    cache: Arc<C>,
}

impl<U, C> VerifyCodeUseCase<U, C>
where
    U: UserRepository,
    C: KeyValueCache,
{
    pub fn new(user_repo: Arc<U>, cache: Arc<C>) -> Self {
        Self { user_repo, cache }
    }

    pub async fn execute(&self, input: VerifyCodeInput) -> AuthResult<User> {
        let submitted = input
            .code
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| AuthError::bad_request("Verification code is required"))?;
        let mut user = find_user(self.user_repo.as_ref(), input.email.as_deref()).await?;

        let primary_key = VerificationCode::cache_key(user.email.as_str());
        let mut stored = self
            .cache
            .get(&primary_key)
            .await?
            .map(|code| (primary_key, code));

        if stored.is_none() {
            if let Some(raw) = input.email.as_deref() {
                let fallback_key = VerificationCode::cache_key(raw);
                stored = self
                    .cache
                    .get(&fallback_key)
                    .await?
                    .map(|code| (fallback_key, code));
            }
        }

        let (key, stored_code) = stored.ok_or_else(|| {
            AuthError::bad_request("Verification code expired or not found")
        })?;

        if !VerificationCode::from_stored(stored_code).matches(&submitted) {
            tracing::debug!(user_id = %user.id, "Wrong verification code");
            return Err(AuthError::bad_request(
                "Invalid verification code. Please try again.",
            ));
        }

        self.cache.delete(&key).await?;

        user.mark_email_verified();
        self.user_repo.update(&user).await?;

        if let Err(e) = self.cache.delete(&user_profile_cache_key(user.id)).await {
            tracing::warn!(user_id = %user.id, error = %e, "Failed to invalidate profile cache");
        }

        tracing::info!(user_id = %user.id, "Email verified");

        Ok(user)
    }
}

async fn find_user<U>(user_repo: &U, email: Option<&str>) -> AuthResult<User>
where
    U: UserRepository,
{
    let email = email
        .filter(|e| !e.trim().is_empty())
        .ok_or_else(|| AuthError::bad_request("Email is required"))?;
    let email = Email::new(email)?;

    user_repo
        .find_by_email(&email)
        .await?
        .ok_or_else(|| AuthError::not_found("User not found"))
}
