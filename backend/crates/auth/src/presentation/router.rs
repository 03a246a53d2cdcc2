//! Auth Router

use axum::{
    Router, middleware,
    routing::{get, post},
};
use platform::rate_limit::RateLimitConfig;
use std::net::IpAddr;
use std::sync::Arc;

use crate::presentation::handlers::{self, AuthAppState, AuthDeps};
use crate::presentation::middleware::{RateLimitPolicy, enforce_rate_limit};

/// Create the Auth router
///
/// Paths are absolute (`/auth/...`, `/google-auth/...`); merge rather than nest.
pub fn auth_router<D: AuthDeps>(state: AuthAppState<D>) -> Router {
    let limits = state.config.rate_limits;
    let store = state.rate_limits.clone();
    let proxies: Arc<[IpAddr]> = Arc::from(state.config.trusted_proxies.clone());
    let limit = |scope: &'static str, config: RateLimitConfig| {
        middleware::from_fn_with_state(
            RateLimitPolicy::new(store.clone(), scope, config)
                .with_trusted_proxies(proxies.clone()),
            enforce_rate_limit::<D::RateLimits>,
        )
    };

    Router::new()
        .route(
            "/auth/signup",
            post(handlers::sign_up::<D>).layer(limit("signup", limits.sign_up)),
        )
        .route(
            "/auth/signin",
            post(handlers::sign_in::<D>).layer(limit("signin", limits.sign_in)),
        )
        .route(
            "/auth/send-verification-email",
            post(handlers::send_verification_email::<D>)
                .layer(limit("send-verification", limits.send_verification)),
        )
        .route(
            "/auth/verify-email-code",
            post(handlers::verify_email_code::<D>)
                .layer(limit("verify-code", limits.verify_code)),
        )
        .route("/auth/get-user-by-token", get(handlers::get_user_by_token))
        .route(
            "/auth/facebook/callback",
            post(handlers::facebook_callback::<D>)
                .layer(limit("facebook-callback", limits.facebook)),
        )
        .route(
            "/auth/facebook",
            post(handlers::facebook_token::<D>).layer(limit("facebook-token", limits.facebook)),
        )
        .route(
            "/auth/send-magic-link",
            post(handlers::send_magic_link::<D>).layer(limit("magic-link", limits.magic_link)),
        )
        .route("/auth/verify-magic-link", post(handlers::verify_magic_link::<D>))
        .route("/google-auth/google", get(handlers::google_redirect::<D>))
        .route(
            "/google-auth/callback/google",
            get(handlers::google_callback::<D>),
        )
        .route(
            "/google-auth/token",
            post(handlers::google_id_token::<D>)
                .layer(limit("google-token", limits.google_token)),
        )
        .with_state(state)
}
