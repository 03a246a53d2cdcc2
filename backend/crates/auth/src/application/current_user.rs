//! Current User Use Case
//!
//! Resolves a bearer token to its user. Only `NormalToken` is accepted.

use std::sync::Arc;

use crate::application::token_codec::TokenCodec;
use crate::domain::entity::user::User;
use crate::domain::repository::UserRepository;
use crate::domain::value_object::{token_kind::TokenKind, user_id::UserId};
use crate::error::{AuthError, AuthResult};

pub struct CurrentUserUseCase<U>
where
    U: UserRepository,
{
    user_repo: Arc<U>,
    token_codec: Arc<TokenCodec>,
}

impl<U> CurrentUserUseCase<U>
where
    U: UserRepository,
{
    pub fn new(user_repo: Arc<U>, token_codec: Arc<TokenCodec>) -> Self {
        Self {
            user_repo,
            token_codec,
        }
    }

    pub async fn execute(&self, token: Option<&str>) -> AuthResult<User> {
        let token = token
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AuthError::unauthorized("Authentication token is missing"))?;

        let payload = self.token_codec.decode(token).map_err(|e| {
            tracing::debug!(reason = %e, "Bearer token rejected");
            AuthError::unauthorized("Invalid or expired token")
        })?;

        if payload.kind != TokenKind::NormalToken {
            tracing::debug!(kind = %payload.kind, "Bearer token rejected: wrong token kind");
            return Err(AuthError::unauthorized("Invalid token type"));
        }

        let user_id = UserId::parse(&payload.id)
            .ok_or_else(|| AuthError::unauthorized("Invalid token payload"))?;

        self.user_repo
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AuthError::unauthorized("User not found"))
    }
}
