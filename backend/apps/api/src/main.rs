//! API Server Entry Point
//!
//! Application entry point and server initialization.
//! Uses `anyhow` for startup errors, but application-level
//! errors should use `kernel::error::AppError`.

use anyhow::Context;
use auth::infra::{
    CacheBackend, HttpIdentityProvider, InMemoryCache, MailService, MailSettings,
    PgUserRepository, RateLimitBackend, RedisCache, RedisRateLimitStore,
};
use auth::{AuthAppState, AuthConfig, ProductionDeps, TokenCodec, auth_router};
use axum::{
    Router, http,
    http::{Method, header},
};
use platform::rate_limit::InMemoryRateLimitStore;
use sqlx::postgres::PgPoolOptions;
use std::env;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{AllowHeaders, AllowMethods, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// Re-export unified error types for use in handlers
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

const DEFAULT_PORT: u16 = 31113;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "surplus_api=info,auth=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Auth configuration; a missing JWT_SECRET stops startup here
    let auth_config = AuthConfig::from_env()?;
    let token_codec = TokenCodec::new(&auth_config.jwt_secret)?;

    // Database connection
    let database_url =
        env::var("DATABASE_URL").context("DATABASE_URL must be set in environment")?;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await?;

    tracing::info!("Connected to database");

    // Run migrations
    sqlx::migrate!("../../../database/migrations")
        .run(&pool)
        .await?;

    tracing::info!("Migrations completed");

    // Cache and rate-limit counters share one Redis connection.
    // Without Redis both stay process-local.
    let (cache, rate_limits) = match env::var("REDIS_URL").ok().filter(|url| !url.is_empty()) {
        Some(url) => {
            let conn = auth::infra::redis::connect(&url)
                .await
                .context("Failed to connect to Redis")?;
            tracing::info!("Connected to Redis");
            (
                CacheBackend::Redis(RedisCache::new(conn.clone())),
                RateLimitBackend::Redis(RedisRateLimitStore::new(conn)),
            )
        }
        None => {
            tracing::warn!(
                "REDIS_URL not set; verification codes and rate limits are kept in memory"
            );
            (
                CacheBackend::Memory(InMemoryCache::new()),
                RateLimitBackend::Memory(InMemoryRateLimitStore::new()),
            )
        }
    };

    // Outbound mail; without SMTP_HOST messages are only logged
    let mailer = MailService::new(&MailSettings::from_env())?;
    if !mailer.is_enabled() {
        tracing::warn!("SMTP_HOST not set; outgoing mail is logged instead of sent");
    }

    let identity = HttpIdentityProvider::new(Arc::new(auth_config.clone()))?;

    let auth_state = AuthAppState::<ProductionDeps>::new(
        PgUserRepository::new(pool.clone()),
        cache,
        mailer,
        identity,
        rate_limits,
        token_codec,
        auth_config,
    );

    // CORS configuration
    let frontend_origins = env::var("FRONTEND_ORIGINS")
        .unwrap_or_else(|_| "http://localhost:3000,http://127.0.0.1:3000".to_string());

    let allowed_origins: Vec<http::HeaderValue> = frontend_origins
        .split(',')
        .filter_map(|origin| origin.trim().parse().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods(AllowMethods::list([
            Method::GET,
            Method::POST,
            Method::OPTIONS,
        ]))
        .allow_headers(AllowHeaders::list([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
        ]))
        .allow_credentials(true);

    // Build router
    let app = Router::new()
        .merge(auth_router(auth_state))
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    // Start server
    let port = match env::var("PORT") {
        Ok(raw) => raw
            .parse::<u16>()
            .with_context(|| format!("PORT is not a valid port number: {raw}"))?,
        Err(_) => DEFAULT_PORT,
    };
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
