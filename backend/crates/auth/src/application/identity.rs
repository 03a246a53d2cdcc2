//! Identity Resolution
//!
//! Maps an inbound credential assertion to exactly one user, creating or
//! linking as needed. Find-before-create keeps the at-most-one-account-per-
//! email policy; the unique index remains the final arbiter under races.

use std::sync::Arc;

use crate::domain::entity::{
    federated_identity::FederatedIdentity,
    user::{NewUser, User},
};
use crate::domain::repository::UserRepository;
use crate::domain::value_object::{email::Email, provider::AuthProvider};
use crate::error::{AuthError, AuthResult};

pub struct IdentityResolver<U>
where
    U: UserRepository,
{
    user_repo: Arc<U>,
}

impl<U> IdentityResolver<U>
where
    U: UserRepository,
{
    pub fn new(user_repo: Arc<U>) -> Self {
        Self { user_repo }
    }

    /// Existing user for `email`, or a new one with role `NONE`
    pub async fn resolve_by_email_or_create(&self, email: &Email) -> AuthResult<User> {
        if let Some(user) = self.user_repo.find_by_email(email).await? {
            return Ok(user);
        }

        match self.user_repo.create(&NewUser::from_email(email.clone())).await {
            Ok(user) => {
                tracing::info!(user_id = %user.id, email = %email.masked(), "User created from email");
                Ok(user)
            }
            Err(AuthError::Conflict(_)) => self.refetch_by_email(email).await,
            Err(e) => Err(e),
        }
    }

    /// Resolve a verified provider identity whose email has been extracted
    ///
    /// Google: by Google id, then by email (linking the id), then create.
    /// Facebook: by email, then create.
    pub async fn resolve_federated(
        &self,
        identity: &FederatedIdentity,
        email: &Email,
    ) -> AuthResult<User> {
        match identity.provider {
            AuthProvider::Google => self.resolve_google(identity, email).await,
            AuthProvider::Facebook => self.resolve_by_email(identity, email).await,
        }
    }

    async fn resolve_google(
        &self,
        identity: &FederatedIdentity,
        email: &Email,
    ) -> AuthResult<User> {
        if let Some(mut user) = self
            .user_repo
            .find_by_google_id(&identity.provider_id)
            .await?
        {
            if user.email != *email {
                return Err(AuthError::AccountConflict(
                    "This Google account is linked to a different email".to_string(),
                ));
            }
            if user.backfill_profile_image(identity.picture_url.as_deref()) {
                self.user_repo.update(&user).await?;
            }
            return Ok(user);
        }

        self.resolve_by_email(identity, email).await
    }

    async fn resolve_by_email(
        &self,
        identity: &FederatedIdentity,
        email: &Email,
    ) -> AuthResult<User> {
        if let Some(user) = self.user_repo.find_by_email(email).await? {
            return self.link(user, identity).await;
        }

        let new_user = NewUser {
            email: email.clone(),
            username: identity
                .display_name
                .as_deref()
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| email.local_part())
                .to_string(),
            password_hash: None,
            google_id: match identity.provider {
                AuthProvider::Google => Some(identity.provider_id.clone()),
                AuthProvider::Facebook => None,
            },
            role: Default::default(),
            email_verified: true,
            profile_image: identity.picture_url.clone(),
        };

        match self.user_repo.create(&new_user).await {
            Ok(user) => {
                tracing::info!(
                    user_id = %user.id,
                    provider = %identity.provider,
                    email = %email.masked(),
                    "User created from federated identity"
                );
                Ok(user)
            }
            // Lost a race with a concurrent first sign-in for the same email
            Err(AuthError::Conflict(_)) => {
                let user = self.refetch_by_email(email).await?;
                self.link(user, identity).await
            }
            Err(e) => Err(e),
        }
    }

    /// Attach provider data to an email-matched account
    async fn link(&self, mut user: User, identity: &FederatedIdentity) -> AuthResult<User> {
        let mut changed = false;

        if identity.provider == AuthProvider::Google {
            match user.google_id.as_deref() {
                Some(existing) if existing == identity.provider_id => {}
                Some(_) => {
                    return Err(AuthError::AccountConflict(
                        "This account is already linked to another Google account".to_string(),
                    ));
                }
                None => {
                    user.link_google(identity.provider_id.clone());
                    changed = true;
                }
            }
        }

        changed |= user.backfill_profile_image(identity.picture_url.as_deref());

        if changed {
            self.user_repo.update(&user).await?;
            tracing::info!(
                user_id = %user.id,
                provider = %identity.provider,
                "Federated identity linked to existing account"
            );
        }

        Ok(user)
    }

    async fn refetch_by_email(&self, email: &Email) -> AuthResult<User> {
        self.user_repo
            .find_by_email(email)
            .await?
            .ok_or_else(|| AuthError::Internal("User vanished after unique violation".to_string()))
    }
}
