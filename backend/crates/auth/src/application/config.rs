//! Application Configuration
//!
//! Configuration for the Auth application layer.

use std::env;
use std::net::IpAddr;
use std::time::Duration;

use platform::rate_limit::RateLimitConfig;

use crate::error::{AuthError, AuthResult};

/// Re-export SameSite from platform
pub use platform::cookie::SameSite;

const DEFAULT_FRONTEND_URL: &str = "http://localhost:3000";
const DEFAULT_RUNTIME_MODE_VAR: &str = "APP_ENV";

/// Google OAuth client credentials
#[derive(Debug, Clone)]
pub struct GoogleOAuthConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
}

/// Facebook app credentials
#[derive(Debug, Clone)]
pub struct FacebookOAuthConfig {
    pub app_id: String,
    pub app_secret: String,
    pub redirect_uri: String,
}

/// Per-endpoint request budgets, counted per client IP
#[derive(Debug, Clone, Copy)]
pub struct AuthRateLimits {
    pub sign_up: RateLimitConfig,
    pub sign_in: RateLimitConfig,
    pub send_verification: RateLimitConfig,
    pub verify_code: RateLimitConfig,
    pub magic_link: RateLimitConfig,
    pub facebook: RateLimitConfig,
    pub google_token: RateLimitConfig,
}

impl Default for AuthRateLimits {
    fn default() -> Self {
        Self {
            sign_up: RateLimitConfig::new(3, 3600),
            sign_in: RateLimitConfig::new(5, 60),
            send_verification: RateLimitConfig::new(3, 600),
            verify_code: RateLimitConfig::new(10, 600),
            magic_link: RateLimitConfig::new(3, 600),
            facebook: RateLimitConfig::new(20, 60),
            google_token: RateLimitConfig::new(20, 60),
        }
    }
}

/// Whether magic links are returned in the response instead of mailed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeMode {
    Production,
    Development,
}

impl RuntimeMode {
    /// Only an explicit development value opts out of production behavior
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
            Some("development" | "dev" | "local") => RuntimeMode::Development,
            _ => RuntimeMode::Production,
        }
    }
}

/// Auth application configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// HS256 signing secret
    pub jwt_secret: String,
    /// Base URL for magic links and OAuth redirects, without trailing slash
    pub frontend_url: String,
    /// Environment variable consulted on every magic-link send
    pub runtime_mode_var: String,
    pub verification_code_ttl: Duration,
    /// Upper bound on each identity provider HTTP call
    pub provider_timeout: Duration,
    pub google: Option<GoogleOAuthConfig>,
    pub facebook: Option<FacebookOAuthConfig>,
    pub access_cookie_name: String,
    pub refresh_cookie_name: String,
    pub oauth_state_cookie_name: String,
    /// Whether to require Secure cookie
    pub cookie_secure: bool,
    /// SameSite policy
    pub cookie_same_site: SameSite,
    pub rate_limits: AuthRateLimits,
    /// Reverse proxies whose `X-Forwarded-For` is believed; empty means
    /// rate limits key on the socket peer only
    pub trusted_proxies: Vec<IpAddr>,
    /// Password pepper (optional, application-wide secret)
    pub password_pepper: Option<Vec<u8>>,
}

impl AuthConfig {
    /// Defaults around a given signing secret
    pub fn new(jwt_secret: impl Into<String>) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
            frontend_url: DEFAULT_FRONTEND_URL.to_string(),
            runtime_mode_var: DEFAULT_RUNTIME_MODE_VAR.to_string(),
            verification_code_ttl: Duration::from_secs(10 * 60),
            provider_timeout: Duration::from_secs(20),
            google: None,
            facebook: None,
            access_cookie_name: "accessToken".to_string(),
            refresh_cookie_name: "refreshToken".to_string(),
            oauth_state_cookie_name: "oauthState".to_string(),
            cookie_secure: true,
            cookie_same_site: SameSite::Lax,
            rate_limits: AuthRateLimits::default(),
            trusted_proxies: Vec::new(),
            password_pepper: None,
        }
    }

    /// Load from the process environment
    ///
    /// `JWT_SECRET` is mandatory. A provider block is enabled only when all of
    /// its variables are present.
    pub fn from_env() -> AuthResult<Self> {
        let jwt_secret = non_empty_var("JWT_SECRET").ok_or_else(|| {
            AuthError::Configuration("JWT_SECRET must be set".to_string())
        })?;

        let mut config = Self::new(jwt_secret);

        if let Some(url) = non_empty_var("FRONTEND_URL") {
            config.frontend_url = url.trim_end_matches('/').to_string();
        }

        config.google = match (
            non_empty_var("GOOGLE_CLIENT_ID"),
            non_empty_var("GOOGLE_CLIENT_SECRET"),
            non_empty_var("GOOGLE_REDIRECT_URI"),
        ) {
            (Some(client_id), Some(client_secret), Some(redirect_uri)) => Some(GoogleOAuthConfig {
                client_id,
                client_secret,
                redirect_uri,
            }),
            _ => None,
        };

        config.facebook = match (
            non_empty_var("FACEBOOK_APP_ID"),
            non_empty_var("FACEBOOK_APP_SECRET"),
            non_empty_var("FACEBOOK_REDIRECT_URI"),
        ) {
            (Some(app_id), Some(app_secret), Some(redirect_uri)) => Some(FacebookOAuthConfig {
                app_id,
                app_secret,
                redirect_uri,
            }),
            _ => None,
        };

        if let Some(secure) = non_empty_var("COOKIE_SECURE") {
            config.cookie_secure = !matches!(secure.to_ascii_lowercase().as_str(), "false" | "0");
        }

        if let Some(proxies) = non_empty_var("TRUSTED_PROXIES") {
            config.trusted_proxies = parse_trusted_proxies(&proxies)?;
        }

        config.password_pepper = non_empty_var("PASSWORD_PEPPER").map(String::into_bytes);

        if config.google.is_none() {
            tracing::warn!("Google OAuth not configured; Google sign-in is disabled");
        }
        if config.facebook.is_none() {
            tracing::warn!("Facebook OAuth not configured; Facebook sign-in is disabled");
        }

        Ok(config)
    }

    /// Read the runtime mode now. Never cached.
    pub fn runtime_mode(&self) -> RuntimeMode {
        RuntimeMode::parse(env::var(&self.runtime_mode_var).ok().as_deref())
    }
}

/// Comma-separated IP addresses
pub fn parse_trusted_proxies(value: &str) -> AuthResult<Vec<IpAddr>> {
    value
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            entry.parse::<IpAddr>().map_err(|_| {
                AuthError::Configuration(format!(
                    "TRUSTED_PROXIES entry is not an IP address: {entry}"
                ))
            })
        })
        .collect()
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_runtime_mode_parse() {
        assert_eq!(RuntimeMode::parse(Some("development")), RuntimeMode::Development);
        assert_eq!(RuntimeMode::parse(Some("DEV")), RuntimeMode::Development);
        assert_eq!(RuntimeMode::parse(Some("local")), RuntimeMode::Development);
        assert_eq!(RuntimeMode::parse(Some("production")), RuntimeMode::Production);
        assert_eq!(RuntimeMode::parse(Some("staging")), RuntimeMode::Production);
        assert_eq!(RuntimeMode::parse(None), RuntimeMode::Production);
    }

    #[test]
    fn test_runtime_mode_read_at_call_time() {
        let mut config = AuthConfig::new("secret");
        config.runtime_mode_var = "AUTH_CONFIG_TEST_RUNTIME_MODE".to_string();

        assert_eq!(config.runtime_mode(), RuntimeMode::Production);

        // SAFETY: the variable name is unique to this test.
        unsafe { env::set_var("AUTH_CONFIG_TEST_RUNTIME_MODE", "development") };
        assert_eq!(config.runtime_mode(), RuntimeMode::Development);

        unsafe { env::set_var("AUTH_CONFIG_TEST_RUNTIME_MODE", "production") };
        assert_eq!(config.runtime_mode(), RuntimeMode::Production);

        unsafe { env::remove_var("AUTH_CONFIG_TEST_RUNTIME_MODE") };
    }

    #[test]
    fn test_defaults() {
        let config = AuthConfig::new("secret");
        assert_eq!(config.frontend_url, "http://localhost:3000");
        assert_eq!(config.verification_code_ttl, Duration::from_millis(600_000));
        assert_eq!(config.provider_timeout, Duration::from_secs(20));
        assert_eq!(config.access_cookie_name, "accessToken");
        assert_eq!(config.refresh_cookie_name, "refreshToken");
        assert_eq!(config.rate_limits.sign_up.max_requests, 3);
        assert_eq!(config.rate_limits.sign_up.window, Duration::from_secs(3600));
        assert_eq!(config.rate_limits.sign_in.max_requests, 5);
        assert_eq!(config.rate_limits.magic_link, config.rate_limits.send_verification);
        assert_eq!(config.rate_limits.google_token, config.rate_limits.facebook);
        assert!(config.trusted_proxies.is_empty());
    }

    #[test]
    fn test_parse_trusted_proxies() {
        let proxies = parse_trusted_proxies("10.0.0.1, ::1,").unwrap();
        assert_eq!(
            proxies,
            vec!["10.0.0.1".parse::<IpAddr>().unwrap(), "::1".parse().unwrap()]
        );

        let err = parse_trusted_proxies("10.0.0.1, proxy.internal").unwrap_err();
        assert!(matches!(err, AuthError::Configuration(_)));
    }
}
