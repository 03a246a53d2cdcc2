//! HTTP Handlers

use axum::Json;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{AppendHeaders, IntoResponse, Redirect, Response};
use std::sync::Arc;

use platform::cookie::{CookieConfig, extract_cookie};
use platform::crypto::{constant_time_eq, random_token};
use platform::rate_limit::RateLimitStore;

use crate::application::config::AuthConfig;
use crate::application::token_codec::TokenCodec;
use crate::application::{
    FederatedCredential, FederatedSignInUseCase, SendMagicLinkUseCase,
    SendVerificationCodeUseCase, SignInInput, SignInUseCase, SignUpInput, SignUpUseCase,
    VerifyCodeInput, VerifyCodeUseCase, VerifyMagicLinkUseCase,
};
use crate::domain::gateway::{EmailSender, IdentityProvider};
use crate::domain::repository::{KeyValueCache, UserRepository};
use crate::error::{AuthError, AuthResult};
use crate::presentation::dto::{
    AuthResponse, EmailRequest, FacebookCallbackRequest, FacebookTokenRequest,
    GoogleCallbackQuery, GoogleIdTokenRequest, MagicLinkVerifyRequest, MessageResponse,
    SignInRequest, SignUpRequest, UserResponse, VerifyCodeRequest, VerifyCodeResponse,
};
use crate::presentation::middleware::CurrentUser;

/// Lifetime of the access and refresh cookies, matching the token lifetime
const TOKEN_COOKIE_MAX_AGE_SECS: i64 = 30 * 24 * 60 * 60;
const OAUTH_STATE_MAX_AGE_SECS: i64 = 10 * 60;
const OAUTH_STATE_LEN: usize = 32;

/// Concrete adapter types behind the router
pub trait AuthDeps: Send + Sync + 'static {
    type Users: UserRepository + Send + Sync + 'static;
    type Cache: KeyValueCache + Send + Sync + 'static;
    type Mailer: EmailSender + Send + Sync + 'static;
    type Identity: IdentityProvider + Send + Sync + 'static;
    type RateLimits: RateLimitStore + Send + Sync + 'static;
}

/// Shared state for auth handlers
pub struct AuthAppState<D: AuthDeps> {
    pub users: Arc<D::Users>,
    pub cache: Arc<D::Cache>,
    pub mailer: Arc<D::Mailer>,
    pub identity: Arc<D::Identity>,
    pub rate_limits: Arc<D::RateLimits>,
    pub token_codec: Arc<TokenCodec>,
    pub config: Arc<AuthConfig>,
}

impl<D: AuthDeps> AuthAppState<D> {
    pub fn new(
        users: D::Users,
        cache: D::Cache,
        mailer: D::Mailer,
        identity: D::Identity,
        rate_limits: D::RateLimits,
        token_codec: TokenCodec,
        config: AuthConfig,
    ) -> Self {
        Self {
            users: Arc::new(users),
            cache: Arc::new(cache),
            mailer: Arc::new(mailer),
            identity: Arc::new(identity),
            rate_limits: Arc::new(rate_limits),
            token_codec: Arc::new(token_codec),
            config: Arc::new(config),
        }
    }
}

// Derive would require `D: Clone`
impl<D: AuthDeps> Clone for AuthAppState<D> {
    fn clone(&self) -> Self {
        Self {
            users: self.users.clone(),
            cache: self.cache.clone(),
            mailer: self.mailer.clone(),
            identity: self.identity.clone(),
            rate_limits: self.rate_limits.clone(),
            token_codec: self.token_codec.clone(),
            config: self.config.clone(),
        }
    }
}

// ============================================================================
// Password
// ============================================================================

/// POST /auth/signup
pub async fn sign_up<D: AuthDeps>(
    State(state): State<AuthAppState<D>>,
    Json(req): Json<SignUpRequest>,
) -> AuthResult<(StatusCode, Json<AuthResponse>)> {
    let use_case = SignUpUseCase::new(
        state.users.clone(),
        state.token_codec.clone(),
        state.config.clone(),
    );

    let output = use_case
        .execute(SignUpInput {
            email: req.email,
            username: req.username,
            password: req.password,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse::new(
            "User registered successfully",
            &output.user,
            output.tokens,
        )),
    ))
}

/// POST /auth/signin
pub async fn sign_in<D: AuthDeps>(
    State(state): State<AuthAppState<D>>,
    Json(req): Json<SignInRequest>,
) -> AuthResult<Json<AuthResponse>> {
    let use_case = SignInUseCase::new(
        state.users.clone(),
        state.token_codec.clone(),
        state.config.clone(),
    );

    let output = use_case
        .execute(SignInInput {
            email: req.email,
            password: req.password,
        })
        .await?;

    Ok(Json(AuthResponse::new(
        "Signed in successfully",
        &output.user,
        output.tokens,
    )))
}

// ============================================================================
// Email Verification
// ============================================================================

/// POST /auth/send-verification-email
pub async fn send_verification_email<D: AuthDeps>(
    State(state): State<AuthAppState<D>>,
    Json(req): Json<EmailRequest>,
) -> AuthResult<Json<MessageResponse>> {
    let use_case = SendVerificationCodeUseCase::new(
        state.users.clone(),
        state.cache.clone(),
        state.mailer.clone(),
        state.config.clone(),
    );

    use_case.execute(req.email).await?;

    Ok(Json(MessageResponse::new("Verification code sent")))
}

/// POST /auth/verify-email-code
pub async fn verify_email_code<D: AuthDeps>(
    State(state): State<AuthAppState<D>>,
    Json(req): Json<VerifyCodeRequest>,
) -> AuthResult<Json<VerifyCodeResponse>> {
    let use_case = VerifyCodeUseCase::new(state.users.clone(), state.cache.clone());

    let user = use_case
        .execute(VerifyCodeInput {
            email: req.email,
            code: req.code,
        })
        .await?;

    Ok(Json(VerifyCodeResponse {
        message: "Email verified successfully".to_string(),
        user: UserResponse::from(&user),
    }))
}

// ============================================================================
// Magic Link
// ============================================================================

/// POST /auth/send-magic-link
pub async fn send_magic_link<D: AuthDeps>(
    State(state): State<AuthAppState<D>>,
    Json(req): Json<EmailRequest>,
) -> AuthResult<Json<MessageResponse>> {
    let use_case = SendMagicLinkUseCase::new(
        state.users.clone(),
        state.mailer.clone(),
        state.token_codec.clone(),
        state.config.clone(),
    );

    let output = use_case.execute(req.email).await?;

    Ok(Json(MessageResponse {
        message: "Magic link sent".to_string(),
        link: output.link,
    }))
}

/// POST /auth/verify-magic-link
pub async fn verify_magic_link<D: AuthDeps>(
    State(state): State<AuthAppState<D>>,
    Json(req): Json<MagicLinkVerifyRequest>,
) -> AuthResult<Json<AuthResponse>> {
    let use_case = VerifyMagicLinkUseCase::new(state.users.clone(), state.token_codec.clone());

    let output = use_case.execute(req.token).await?;

    let response = AuthResponse::new("Signed in successfully", &output.user, output.tokens);
    let response = if output.needs_onboarding {
        response.with_needs_onboarding(true)
    } else {
        response.with_redirect_to_onboarding(output.redirect_to_onboarding)
    };

    Ok(Json(response))
}

// ============================================================================
// Bearer
// ============================================================================

/// GET /auth/get-user-by-token
pub async fn get_user_by_token(CurrentUser(user): CurrentUser) -> Json<UserResponse> {
    Json(UserResponse::from(&user))
}

// ============================================================================
// Facebook
// ============================================================================

/// POST /auth/facebook/callback
pub async fn facebook_callback<D: AuthDeps>(
    State(state): State<AuthAppState<D>>,
    Json(req): Json<FacebookCallbackRequest>,
) -> AuthResult<Json<AuthResponse>> {
    federated_sign_in(
        &state,
        FederatedCredential::FacebookCode {
            code: req.code.unwrap_or_default(),
            redirect_uri: req.redirect_uri,
        },
    )
    .await
    .map(Json)
}

/// POST /auth/facebook
pub async fn facebook_token<D: AuthDeps>(
    State(state): State<AuthAppState<D>>,
    Json(req): Json<FacebookTokenRequest>,
) -> AuthResult<Json<AuthResponse>> {
    federated_sign_in(
        &state,
        FederatedCredential::FacebookAccessToken(req.access_token.unwrap_or_default()),
    )
    .await
    .map(Json)
}

// ============================================================================
// Google
// ============================================================================

/// GET /google-auth/google
pub async fn google_redirect<D: AuthDeps>(
    State(state): State<AuthAppState<D>>,
) -> AuthResult<Response> {
    let oauth_state = random_token(OAUTH_STATE_LEN);
    let consent_url = state.identity.google_consent_url(&oauth_state)?;

    let state_cookie = cookie_config(
        &state.config,
        &state.config.oauth_state_cookie_name,
        OAUTH_STATE_MAX_AGE_SECS,
    )
    .build_set_cookie(&oauth_state);

    Ok((
        AppendHeaders([(header::SET_COOKIE, state_cookie)]),
        Redirect::to(&consent_url),
    )
        .into_response())
}

/// GET /google-auth/callback/google
///
/// Always answers with a redirect to the frontend; failures carry
/// `error=google_auth_failed` and are only logged here.
pub async fn google_callback<D: AuthDeps>(
    State(state): State<AuthAppState<D>>,
    headers: HeaderMap,
    Query(query): Query<GoogleCallbackQuery>,
) -> Response {
    let config = &state.config;
    let clear_state = cookie_config(config, &config.oauth_state_cookie_name, 0).build_delete_cookie();

    match complete_google_callback(&state, &headers, query).await {
        Ok(output) => {
            let access = cookie_config(config, &config.access_cookie_name, TOKEN_COOKIE_MAX_AGE_SECS)
                .build_set_cookie(&output.access_token);
            let refresh =
                cookie_config(config, &config.refresh_cookie_name, TOKEN_COOKIE_MAX_AGE_SECS)
                    .build_set_cookie(&output.refresh_token);
            let target = format!(
                "{}/auth/google/callback?needsOnboarding={}",
                config.frontend_url,
                output.needs_onboarding.unwrap_or(false)
            );

            (
                AppendHeaders([
                    (header::SET_COOKIE, access),
                    (header::SET_COOKIE, refresh),
                    (header::SET_COOKIE, clear_state),
                ]),
                Redirect::to(&target),
            )
                .into_response()
        }
        Err(e) => {
            tracing::warn!(error = %e, "Google sign-in failed");
            let target = format!("{}/signin?error=google_auth_failed", config.frontend_url);

            (
                AppendHeaders([(header::SET_COOKIE, clear_state)]),
                Redirect::to(&target),
            )
                .into_response()
        }
    }
}

/// POST /google-auth/token
pub async fn google_id_token<D: AuthDeps>(
    State(state): State<AuthAppState<D>>,
    Json(req): Json<GoogleIdTokenRequest>,
) -> AuthResult<Json<AuthResponse>> {
    federated_sign_in(
        &state,
        FederatedCredential::GoogleIdToken(req.id_token.unwrap_or_default()),
    )
    .await
    .map(Json)
}

async fn complete_google_callback<D: AuthDeps>(
    state: &AuthAppState<D>,
    headers: &HeaderMap,
    query: GoogleCallbackQuery,
) -> AuthResult<AuthResponse> {
    if let Some(error) = query.error {
        return Err(AuthError::OAuthProvider(format!("Consent denied: {error}")));
    }

    let expected = extract_cookie(headers, &state.config.oauth_state_cookie_name);
    let state_matches = match (expected.as_deref(), query.state.as_deref()) {
        (Some(expected), Some(actual)) => constant_time_eq(expected.as_bytes(), actual.as_bytes()),
        _ => false,
    };
    if !state_matches {
        return Err(AuthError::unauthorized("OAuth state mismatch"));
    }

    federated_sign_in(
        state,
        FederatedCredential::GoogleCode(query.code.unwrap_or_default()),
    )
    .await
}

async fn federated_sign_in<D: AuthDeps>(
    state: &AuthAppState<D>,
    credential: FederatedCredential,
) -> AuthResult<AuthResponse> {
    let use_case = FederatedSignInUseCase::new(
        state.users.clone(),
        state.identity.clone(),
        state.token_codec.clone(),
    );

    let output = use_case.execute(credential).await?;

    Ok(
        AuthResponse::new("Signed in successfully", &output.user, output.tokens)
            .with_needs_onboarding(output.needs_onboarding),
    )
}

fn cookie_config(config: &AuthConfig, name: &str, max_age_secs: i64) -> CookieConfig {
    CookieConfig::named(name)
        .with_secure(config.cookie_secure)
        .with_same_site(config.cookie_same_site)
        .with_max_age(max_age_secs)
}
