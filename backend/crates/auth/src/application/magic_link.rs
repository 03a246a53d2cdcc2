//! Magic Link Use Cases
//!
//! Passwordless sign-in: a short-lived `EmailToken` is delivered as a link
//! and later redeemed for a token pair.

use std::sync::Arc;

use crate::application::config::{AuthConfig, RuntimeMode};
use crate::application::identity::IdentityResolver;
use crate::application::token_codec::{TokenCodec, TokenPair};
use crate::domain::entity::user::User;
use crate::domain::gateway::EmailSender;
use crate::domain::repository::UserRepository;
use crate::domain::value_object::{email::Email, token_kind::TokenKind, user_id::UserId};
use crate::error::{AuthError, AuthResult};

const INVALID_LINK: &str = "Invalid or expired token";

/// Send output
pub struct SendMagicLinkOutput {
    /// Present only in development mode, where nothing is mailed
    pub link: Option<String>,
}

/// Send a magic link, creating the account on first use
pub struct SendMagicLinkUseCase<U, M>
where
    U: UserRepository,
    M: EmailSender,
{
    resolver: IdentityResolver<U>,
    mailer: Arc<M>,
    token_codec: Arc<TokenCodec>,
    config: Arc<AuthConfig>,
}

impl<U, M> SendMagicLinkUseCase<U, M>
where
    U: UserRepository,
    M: EmailSender,
{
    pub fn new(
        user_repo: Arc<U>,
        mailer: Arc<M>,
        token_codec: Arc<TokenCodec>,
        config: Arc<AuthConfig>,
    ) -> Self {
        Self {
            resolver: IdentityResolver::new(user_repo),
            mailer,
            token_codec,
            config,
        }
    }

    pub async fn execute(&self, email: Option<String>) -> AuthResult<SendMagicLinkOutput> {
        let email = email
            .filter(|e| !e.trim().is_empty())
            .ok_or_else(|| AuthError::bad_request("Email is required"))?;
        let email = Email::new(email)?;

        let user = self.resolver.resolve_by_email_or_create(&email).await?;
        let token = self
            .token_codec
            .issue(user.id, user.email.as_str(), TokenKind::EmailToken)?;
        let link = format!("{}/callback/{}", self.config.frontend_url, token);

        if self.config.runtime_mode() == RuntimeMode::Development {
            tracing::info!(
                user_id = %user.id,
                "Development mode: returning magic link instead of mailing it"
            );
            return Ok(SendMagicLinkOutput { link: Some(link) });
        }

        self.mailer.send_magic_link(&user.email, &link).await?;

        tracing::info!(
            user_id = %user.id,
            email = %user.email.masked(),
            "Magic link sent"
        );

        Ok(SendMagicLinkOutput { link: None })
    }
}

/// Verify output
pub struct VerifyMagicLinkOutput {
    pub user: User,
    pub tokens: TokenPair,
    /// The token referenced a deleted account, which was recreated
    pub needs_onboarding: bool,
    /// The account has not completed onboarding yet
    pub redirect_to_onboarding: bool,
}

/// Redeem a magic-link token
pub struct VerifyMagicLinkUseCase<U>
where
    U: UserRepository,
{
    user_repo: Arc<U>,
    resolver: IdentityResolver<U>,
    token_codec: Arc<TokenCodec>,
}

impl<U> VerifyMagicLinkUseCase<U>
where
    U: UserRepository,
{
    pub fn new(user_repo: Arc<U>, token_codec: Arc<TokenCodec>) -> Self {
        Self {
            resolver: IdentityResolver::new(user_repo.clone()),
            user_repo,
            token_codec,
        }
    }

    pub async fn execute(&self, token: Option<String>) -> AuthResult<VerifyMagicLinkOutput> {
        let token = token
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| AuthError::bad_request("Token is required"))?;

        let payload = match self.token_codec.decode(token.trim()) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::debug!(reason = %e, "Magic link rejected");
                return Err(AuthError::unauthorized(INVALID_LINK));
            }
        };

        if payload.kind != TokenKind::EmailToken {
            tracing::debug!(kind = %payload.kind, "Magic link rejected: wrong token kind");
            return Err(AuthError::unauthorized(INVALID_LINK));
        }

        let (Some(user_id), false) = (UserId::parse(&payload.id), payload.email.trim().is_empty())
        else {
            return Err(AuthError::bad_request("Invalid token payload"));
        };

        let (user, recreated) = match self.user_repo.find_by_id(user_id).await? {
            Some(user) => (user, false),
            None => {
                let email = Email::new(payload.email.as_str())?;
                tracing::warn!(
                    user_id = %user_id,
                    email = %email.masked(),
                    "Magic link for missing account; recreating"
                );
                (self.resolver.resolve_by_email_or_create(&email).await?, true)
            }
        };

        let tokens = self.token_codec.issue_pair(user.id, user.email.as_str())?;
        let redirect_to_onboarding = user.needs_onboarding();

        tracing::info!(user_id = %user.id, recreated, "Magic link redeemed");

        Ok(VerifyMagicLinkOutput {
            user,
            tokens,
            needs_onboarding: recreated,
            redirect_to_onboarding,
        })
    }
}
