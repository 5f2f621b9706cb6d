//! API layer - HTTP handlers and routing
//!
//! JSON endpoints live under `/api`:
//! - Auth (login, verify, logout)
//! - Articles
//! - Contact submissions
//! - Statistics and dashboard analytics
//! - Health check
//!
//! Everything else is served from the static site directory; the admin
//! dashboard page requires a bearer token.

pub mod analytics;
pub mod articles;
pub mod auth;
pub mod contact;
pub mod health;
pub mod middleware;
pub mod responses;
pub mod statistics;

use anyhow::Context;
use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    middleware as axum_middleware,
    routing::{get, get_service, post, put},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, CorsLayer},
    limit::RequestBodyLimitLayer,
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};

use crate::config::ServerConfig;

pub use middleware::{ApiError, AppState, AuthenticatedUser};

/// Build the `/api` router
pub fn build_api_router(state: AppState) -> Router<AppState> {
    // Protected routes (need a valid token)
    let protected_routes = Router::new()
        .route("/auth/verify", get(auth::verify))
        .route("/auth/logout", post(auth::logout))
        .route("/articles", post(articles::create_article))
        .route(
            "/articles/{id}",
            get(articles::get_article)
                .put(articles::update_article)
                .delete(articles::delete_article),
        )
        .route("/contact", get(contact::list_contacts))
        .route("/contact/respond", post(contact::respond))
        .route(
            "/contact/{id}",
            get(contact::get_contact).delete(contact::delete_contact),
        )
        .route("/contact/{id}/status", put(contact::update_status))
        .route("/statistics", put(statistics::update_statistics))
        .route("/analytics", get(analytics::get_analytics))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ));

    // Article list: public, but a token widens the status filter
    let optional_routes = Router::new()
        .route("/articles", get(articles::list_articles))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::optional_auth,
        ));

    // Public routes
    Router::new()
        .route("/auth/login", post(auth::login))
        .route("/contact", post(contact::submit_contact))
        .route("/statistics", get(statistics::get_statistics))
        .route("/health", get(health::health))
        .merge(optional_routes)
        .merge(protected_routes)
        .fallback(api_not_found)
        .layer(axum_middleware::from_fn_with_state(
            state,
            middleware::rate_limit,
        ))
}

async fn api_not_found() -> ApiError {
    ApiError::not_found("נתיב לא נמצא")
}

/// Build the complete router with middleware
pub fn build_router(state: AppState, server: &ServerConfig) -> anyhow::Result<Router> {
    let origin = if server.cors_origin.trim() == "*" {
        AllowOrigin::any()
    } else {
        let value = server
            .cors_origin
            .parse::<HeaderValue>()
            .with_context(|| format!("Invalid CORS origin '{}'", server.cors_origin))?;
        AllowOrigin::exact(value)
    };
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    let dashboard = Router::new()
        .route(
            "/admin/dashboard.html",
            get_service(ServeFile::new(server.static_dir.join("admin/dashboard.html"))),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ));

    Ok(Router::new()
        .nest("/api", build_api_router(state.clone()))
        .merge(dashboard)
        // Public pages and assets
        .fallback_service(ServeDir::new(&server.static_dir))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(server.body_limit))
        .layer(CompressionLayer::new())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state))
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::config::Config;
    use crate::db::{create_test_pool, migrations};
    use crate::services::mailer::tests::RecordingMailer;
    use axum_test::TestServer;
    use serde_json::{json, Value};
    use std::sync::Arc;
    use std::time::Duration;

    pub const ADMIN_USERNAME: &str = "admin";
    pub const ADMIN_PASSWORD: &str = "test-password";

    pub async fn test_server() -> (TestServer, Arc<RecordingMailer>) {
        test_server_with(Config::default()).await
    }

    /// Router over a migrated in-memory database with a seeded admin
    pub async fn test_server_with(mut config: Config) -> (TestServer, Arc<RecordingMailer>) {
        config.auth.admin_username = ADMIN_USERNAME.to_string();
        config.auth.admin_password = ADMIN_PASSWORD.to_string();

        let pool = create_test_pool().await.expect("Failed to create pool");
        migrations::run_migrations(&pool).await.expect("Failed to migrate");

        let mailer = Arc::new(RecordingMailer::default());
        let state = AppState::new(pool, &config, mailer.clone());
        state
            .user_service
            .ensure_admin(ADMIN_USERNAME, ADMIN_PASSWORD)
            .await
            .expect("Failed to seed admin");

        let router = build_router(state, &config.server).expect("Failed to build router");
        let server = TestServer::new(router).expect("Failed to start test server");
        (server, mailer)
    }

    pub async fn login_token(server: &TestServer) -> String {
        let body: Value = server
            .post("/api/auth/login")
            .json(&json!({ "username": ADMIN_USERNAME, "password": ADMIN_PASSWORD }))
            .await
            .json();
        body["token"].as_str().expect("login returned no token").to_string()
    }

    pub async fn wait_for_mail(mailer: &RecordingMailer, count: usize) {
        for _ in 0..50 {
            if mailer.sent.lock().await.len() >= count {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }
}
