//! Auth Middleware
//!
//! The bearer guard, as an extractor, and per-route rate limiting.

use axum::extract::{ConnectInfo, FromRequestParts, Request, State};
use axum::http::header;
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use kernel::error::app_error::AppError;
use platform::client::{extract_bearer_token, extract_client_ip};
use platform::cookie::extract_cookie;
use platform::rate_limit::{RateLimitConfig, RateLimitStore, now_ms};
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use crate::application::CurrentUserUseCase;
use crate::domain::entity::user::User;
use crate::error::AuthError;
use crate::presentation::handlers::{AuthAppState, AuthDeps};

/// Authenticated caller
///
/// Reads the access-token cookie first, then `Authorization: Bearer`.
/// Only a `NormalToken` for an existing user gets through.
pub struct CurrentUser(pub User);

impl<D: AuthDeps> FromRequestParts<AuthAppState<D>> for CurrentUser {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AuthAppState<D>,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_cookie(&parts.headers, &state.config.access_cookie_name)
            .or_else(|| extract_bearer_token(&parts.headers));

        let use_case = CurrentUserUseCase::new(state.users.clone(), state.token_codec.clone());
        let user = use_case.execute(token.as_deref()).await?;

        Ok(CurrentUser(user))
    }
}

/// One route's budget and the store counting it
pub struct RateLimitPolicy<L> {
    store: Arc<L>,
    scope: &'static str,
    config: RateLimitConfig,
    trusted_proxies: Arc<[IpAddr]>,
}

impl<L> RateLimitPolicy<L> {
    pub fn new(store: Arc<L>, scope: &'static str, config: RateLimitConfig) -> Self {
        Self {
            store,
            scope,
            config,
            trusted_proxies: Arc::from(Vec::new()),
        }
    }

    /// Peers whose `X-Forwarded-For` names the client
    pub fn with_trusted_proxies(mut self, proxies: Arc<[IpAddr]>) -> Self {
        self.trusted_proxies = proxies;
        self
    }
}

impl<L> Clone for RateLimitPolicy<L> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            scope: self.scope,
            config: self.config,
            trusted_proxies: self.trusted_proxies.clone(),
        }
    }
}

/// Fixed-window limit keyed by `scope:client-ip`
///
/// The client IP is the socket peer unless that peer is a trusted proxy.
/// A failing store lets the request through.
pub async fn enforce_rate_limit<L>(
    State(policy): State<RateLimitPolicy<L>>,
    req: Request,
    next: Next,
) -> Response
where
    L: RateLimitStore + Send + Sync + 'static,
{
    let peer_ip = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0.ip());

    let key = match extract_client_ip(req.headers(), peer_ip, &policy.trusted_proxies) {
        Some(ip) => format!("{}:{}", policy.scope, ip),
        None => format!("{}:unknown", policy.scope),
    };

    match policy.store.check_and_increment(&key, &policy.config).await {
        Ok(result) if result.allowed => next.run(req).await,
        Ok(result) => {
            let retry_after = result.retry_after_secs(now_ms());
            tracing::warn!(key = %key, retry_after, "Rate limit exceeded");

            (
                [(header::RETRY_AFTER, retry_after.to_string())],
                AppError::too_many_requests("Too many requests. Please try again later."),
            )
                .into_response()
        }
        Err(e) => {
            tracing::warn!(key = %key, error = %e, "Rate limit store unavailable; allowing request");
            next.run(req).await
        }
    }
}
