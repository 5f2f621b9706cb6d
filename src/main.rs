//! techhub - Beit Shemesh tech community site backend

use anyhow::Result;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use techhub::{
    api::{self, AppState},
    config::Config,
    db,
    services::{mailer_from_config, ApiRateLimiter, LoginRateLimiter},
};

/// How often expired rate limiter entries are pruned
const LIMITER_CLEANUP_SECS: u64 = 300;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "techhub=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting techhub...");

    // Load configuration
    let config = Config::load_with_env(Path::new("config.yml"))?;
    tracing::info!("Configuration loaded");

    // Initialize database
    let pool = db::create_pool(&config.database).await?;
    tracing::info!("Database connected: {:?}", config.database.driver);

    // Run migrations
    let applied = db::migrations::run_migrations(&pool).await?;
    tracing::info!("Database migrations completed ({} applied)", applied);

    let mailer = mailer_from_config(&config.mail)?;
    let state = AppState::new(pool.clone(), &config, mailer);

    // Seed the admin account
    if state
        .user_service
        .ensure_admin(&config.auth.admin_username, &config.auth.admin_password)
        .await?
    {
        tracing::warn!(
            "Admin user '{}' created with the configured password; change it for production",
            config.auth.admin_username
        );
    }

    spawn_limiter_cleanup(state.api_limiter.clone(), state.login_limiter.clone());

    // Build router
    let app = api::build_router(state, &config.server)?;

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    pool.close().await;
    tracing::info!("Server stopped");
    Ok(())
}

/// Prune expired rate limiter entries periodically
fn spawn_limiter_cleanup(api_limiter: Arc<ApiRateLimiter>, login_limiter: Arc<LoginRateLimiter>) {
    tokio::spawn(async move {
        let mut interval =
            tokio::time::interval(tokio::time::Duration::from_secs(LIMITER_CLEANUP_SECS));
        loop {
            interval.tick().await;
            api_limiter.cleanup().await;
            login_limiter.cleanup().await;
        }
    });
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
