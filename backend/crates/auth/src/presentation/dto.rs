//! API DTOs (Data Transfer Objects)
//!
//! Request fields are optional so that missing input reaches the use case
//! and comes back as a `BadRequest` with a readable message.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::application::token_codec::TokenPair;
use crate::domain::entity::user::User;
use crate::domain::value_object::user_role::UserRole;

// ============================================================================
// Requests
// ============================================================================

/// Sign up request
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignUpRequest {
    pub email: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Sign in request
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignInRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Email-only request (verification send, magic-link send)
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailRequest {
    pub email: Option<String>,
}

/// Verification code submission
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyCodeRequest {
    pub email: Option<String>,
    pub code: Option<String>,
}

/// Magic-link redemption
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MagicLinkVerifyRequest {
    pub token: Option<String>,
}

/// Facebook authorization-code callback
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FacebookCallbackRequest {
    pub code: Option<String>,
    pub redirect_uri: Option<String>,
}

/// Facebook client-side access token
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FacebookTokenRequest {
    pub access_token: Option<String>,
}

/// Google client-side ID token
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleIdTokenRequest {
    pub id_token: Option<String>,
}

/// Query string of the Google redirect back to us
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GoogleCallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

// ============================================================================
// Responses
// ============================================================================

/// Sanitized user projection. Never carries the password hash.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: i64,
    pub email: String,
    pub username: String,
    pub role: UserRole,
    pub email_verified: bool,
    pub location: Option<String>,
    pub phone: Option<String>,
    pub maps_link: Option<String>,
    pub profile_image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.get(),
            email: user.email.as_str().to_string(),
            username: user.username.clone(),
            role: user.role,
            email_verified: user.email_verified,
            location: user.location.clone(),
            phone: user.phone.clone(),
            maps_link: user.maps_link.clone(),
            profile_image: user.profile_image.clone(),
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Token-bearing success payload
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub message: String,
    pub access_token: String,
    pub refresh_token: String,
    pub user: UserResponse,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub needs_onboarding: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_to_onboarding: Option<bool>,
}

impl AuthResponse {
    pub fn new(message: impl Into<String>, user: &User, tokens: TokenPair) -> Self {
        Self {
            message: message.into(),
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            user: UserResponse::from(user),
            needs_onboarding: None,
            redirect_to_onboarding: None,
        }
    }

    pub fn with_needs_onboarding(mut self, value: bool) -> Self {
        self.needs_onboarding = Some(value);
        self
    }

    pub fn with_redirect_to_onboarding(mut self, value: bool) -> Self {
        self.redirect_to_onboarding = Some(value);
        self
    }
}

/// Message-only payload
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageResponse {
    pub message: String,
    /// Magic link, development mode only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            link: None,
        }
    }
}

/// Email verification result
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyCodeResponse {
    pub message: String,
    pub user: UserResponse,
}
