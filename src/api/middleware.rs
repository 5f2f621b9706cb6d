//! API middleware
//!
//! Contains:
//! - Shared application state
//! - The `ApiError` response type and service error mappings
//! - JSON/path extractors that reject with `ApiError`
//! - Bearer token authentication (required and optional)
//! - Per-client API rate limiting

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        ConnectInfo, FromRequest, FromRequestParts, OptionalFromRequestParts, Request, State,
    },
    http::{header, request::Parts, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use crate::config::Config;
use crate::db::repositories::{
    SqlxArticleRepository, SqlxContactRepository, SqlxStatisticsRepository, SqlxUserRepository,
};
use crate::db::DynDatabasePool;
use crate::services::{
    AnalyticsService, AnalyticsServiceError, ApiRateLimiter, ArticleService, ArticleServiceError, Claims, ContactService,
    ContactServiceError, LoginRateLimiter, MailNotifier, Mailer, StatisticsService,
    StatisticsServiceError, TokenService, UserService, UserServiceError,
};

/// Application state containing shared services
#[derive(Clone)]
pub struct AppState {
    pub pool: DynDatabasePool,
    pub user_service: Arc<UserService>,
    pub article_service: Arc<ArticleService>,
    pub contact_service: Arc<ContactService>,
    pub statistics_service: Arc<StatisticsService>,
    pub analytics_service: Arc<AnalyticsService>,
    pub api_limiter: Arc<ApiRateLimiter>,
    pub login_limiter: Arc<LoginRateLimiter>,
    /// Whether forwarded-for headers identify the client
    pub trust_proxy: bool,
}

impl AppState {
    /// Wire repositories and services over one pool
    pub fn new(pool: DynDatabasePool, config: &Config, mailer: Arc<dyn Mailer>) -> Self {
        let article_repo = SqlxArticleRepository::boxed(pool.clone());
        let contact_repo = SqlxContactRepository::boxed(pool.clone());

        let tokens = Arc::new(TokenService::new(
            &config.auth.jwt_secret,
            config.auth.token_ttl_hours,
        ));
        let login_limiter = Arc::new(LoginRateLimiter::new());
        let api_limiter = Arc::new(ApiRateLimiter::new(
            chrono::Duration::seconds(config.rate_limit.window_secs),
            config.rate_limit.max_requests,
        ));
        let notifier = MailNotifier::new(mailer, config.mail.admin_email.clone());

        Self {
            user_service: Arc::new(UserService::new(
                SqlxUserRepository::boxed(pool.clone()),
                tokens,
                login_limiter.clone(),
            )),
            article_service: Arc::new(ArticleService::new(article_repo.clone())),
            contact_service: Arc::new(ContactService::new(contact_repo.clone(), notifier)),
            statistics_service: Arc::new(StatisticsService::new(SqlxStatisticsRepository::boxed(
                pool.clone(),
            ))),
            analytics_service: Arc::new(AnalyticsService::new(contact_repo, article_repo)),
            api_limiter,
            login_limiter,
            trust_proxy: config.server.trust_proxy,
            pool,
        }
    }
}

/// Identity decoded from the caller's bearer token
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub Claims);

// ============================================================================
// Errors
// ============================================================================

const SERVER_ERROR: &str = "שגיאת שרת";
const TOKEN_REQUIRED: &str = "טוקן נדרש";
const TOKEN_INVALID: &str = "טוקן לא תקין";
const TOO_MANY_REQUESTS: &str = "יותר מדי פניות, נסה שוב מאוחר יותר.";

/// Error response for API errors
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ApiErrorDetail {
                code: code.into(),
                message: message.into(),
                details: None,
            },
        }
    }

    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            error: ApiErrorDetail {
                code: code.into(),
                message: message.into(),
                details: Some(details),
            },
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new("UNAUTHORIZED", message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new("FORBIDDEN", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("NOT_FOUND", message)
    }

    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new("VALIDATION_ERROR", message)
    }

    pub fn rate_limited() -> Self {
        Self::new("RATE_LIMIT", TOO_MANY_REQUESTS)
    }

    /// Generic 500; the cause is logged, never returned to the client
    pub fn internal_error(err: impl std::fmt::Display) -> Self {
        tracing::error!("Request failed: {}", err);
        Self::new("INTERNAL_ERROR", SERVER_ERROR)
    }

    pub fn status(&self) -> StatusCode {
        match self.error.code.as_str() {
            "UNAUTHORIZED" => StatusCode::UNAUTHORIZED,
            "FORBIDDEN" => StatusCode::FORBIDDEN,
            "NOT_FOUND" => StatusCode::NOT_FOUND,
            "VALIDATION_ERROR" => StatusCode::BAD_REQUEST,
            "RATE_LIMIT" => StatusCode::TOO_MANY_REQUESTS,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::with_details(
            "VALIDATION_ERROR",
            "נתונים לא תקינים",
            serde_json::Value::String(rejection.body_text()),
        )
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::with_details(
            "VALIDATION_ERROR",
            "מזהה לא תקין",
            serde_json::Value::String(rejection.body_text()),
        )
    }
}

impl From<ArticleServiceError> for ApiError {
    fn from(err: ArticleServiceError) -> Self {
        match err {
            ArticleServiceError::NotFound(_) => Self::not_found("מאמר לא נמצא"),
            ArticleServiceError::ValidationError(msg) => Self::validation_error(msg),
            ArticleServiceError::InternalError(e) => Self::internal_error(format!("{:#}", e)),
        }
    }
}

impl From<ContactServiceError> for ApiError {
    fn from(err: ContactServiceError) -> Self {
        match err {
            ContactServiceError::NotFound(_) => Self::not_found("פנייה לא נמצאה"),
            ContactServiceError::ValidationError(msg) => Self::validation_error(msg),
            ContactServiceError::InternalError(e) => Self::internal_error(format!("{:#}", e)),
        }
    }
}

impl From<StatisticsServiceError> for ApiError {
    fn from(err: StatisticsServiceError) -> Self {
        match err {
            StatisticsServiceError::ValidationError(msg) => Self::validation_error(msg),
            StatisticsServiceError::InternalError(e) => Self::internal_error(format!("{:#}", e)),
        }
    }
}

impl From<AnalyticsServiceError> for ApiError {
    fn from(err: AnalyticsServiceError) -> Self {
        match err {
            AnalyticsServiceError::InternalError(e) => Self::internal_error(format!("{:#}", e)),
        }
    }
}

impl From<UserServiceError> for ApiError {
    fn from(err: UserServiceError) -> Self {
        match err {
            UserServiceError::AuthenticationError(_) => {
                Self::unauthorized("שם משתמש או סיסמה שגויים")
            }
            UserServiceError::InvalidToken(_) => Self::unauthorized(TOKEN_INVALID),
            UserServiceError::RateLimited => Self::rate_limited(),
            UserServiceError::ValidationError(msg) => Self::validation_error(msg),
            UserServiceError::InternalError(e) => Self::internal_error(format!("{:#}", e)),
        }
    }
}

// ============================================================================
// Extractors
// ============================================================================

/// `Json` that rejects malformed bodies with a 400 `ApiError`
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// `Path` that rejects bad identifiers with a 400 `ApiError`
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);

impl<S: Send + Sync> FromRequestParts<S> for AuthenticatedUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or_else(|| ApiError::forbidden(TOKEN_REQUIRED))
    }
}

impl<S: Send + Sync> OptionalFromRequestParts<S> for AuthenticatedUser {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        Ok(parts.extensions.get::<AuthenticatedUser>().cloned())
    }
}

// ============================================================================
// Authentication
// ============================================================================

/// Extract the bearer token from the Authorization header
fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Authentication middleware
///
/// Missing token is 403, an invalid or expired one is 401.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer_token(request.headers())
        .ok_or_else(|| ApiError::forbidden(TOKEN_REQUIRED))?;

    let claims = state.user_service.verify_token(token).map_err(|e| {
        tracing::debug!("Rejected token: {}", e);
        ApiError::unauthorized(TOKEN_INVALID)
    })?;

    request.extensions_mut().insert(AuthenticatedUser(claims));
    Ok(next.run(request).await)
}

/// Optional authentication middleware
///
/// Attaches the identity when a valid token is present; never rejects.
pub async fn optional_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let claims = extract_bearer_token(request.headers())
        .and_then(|token| state.user_service.verify_token(token).ok());
    if let Some(claims) = claims {
        request.extensions_mut().insert(AuthenticatedUser(claims));
    }
    next.run(request).await
}

// ============================================================================
// Rate limiting
// ============================================================================

/// Client address. With `trust_proxy` the first `X-Forwarded-For` entry,
/// then `X-Real-IP`, are used before the socket address.
pub fn extract_ip(request: &Request, trust_proxy: bool) -> String {
    let headers = request.headers();

    if trust_proxy {
        if let Some(forwarded) = headers.get("x-forwarded-for").and_then(|v| v.to_str().ok()) {
            if let Some(first) = forwarded.split(',').next().map(str::trim).filter(|s| !s.is_empty()) {
                return first.to_string();
            }
        }

        if let Some(real_ip) = headers.get("x-real-ip").and_then(|v| v.to_str().ok()) {
            let real_ip = real_ip.trim();
            if !real_ip.is_empty() {
                return real_ip.to_string();
            }
        }
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// API rate limit middleware
pub async fn rate_limit(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let ip = extract_ip(&request, state.trust_proxy);
    if !state.api_limiter.try_acquire(ip.clone()).await {
        tracing::warn!("Rate limit exceeded for {}", ip);
        return Err(ApiError::rate_limited());
    }
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    fn request_with(headers: &[(&str, &str)]) -> Request {
        let mut builder = Request::builder().uri("/api/articles");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[test]
    fn test_error_status_codes() {
        assert_eq!(ApiError::unauthorized("x").status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::forbidden("x").status(), StatusCode::FORBIDDEN);
        assert_eq!(ApiError::not_found("x").status(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::validation_error("x").status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::rate_limited().status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            ApiError::internal_error("db down").status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_internal_error_hides_detail() {
        let err = ApiError::internal_error("connection refused");
        assert_eq!(err.error.message, SERVER_ERROR);
        assert!(err.error.details.is_none());
    }

    #[test]
    fn test_service_error_mapping() {
        let err: ApiError = ArticleServiceError::NotFound(7).into();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.error.message, "מאמר לא נמצא");

        let err: ApiError = ContactServiceError::NotFound(7).into();
        assert_eq!(err.error.message, "פנייה לא נמצאה");

        let err: ApiError = UserServiceError::AuthenticationError("bad".to_string()).into();
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);

        let err: ApiError = UserServiceError::RateLimited.into();
        assert_eq!(err.status(), StatusCode::TOO_MANY_REQUESTS);

        let err: ApiError =
            AnalyticsServiceError::InternalError(anyhow::anyhow!("pool closed")).into();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.error.message, SERVER_ERROR);
    }

    #[test]
    fn test_extract_bearer_token() {
        let request = request_with(&[("authorization", "Bearer abc.def")]);
        assert_eq!(extract_bearer_token(request.headers()), Some("abc.def"));

        let request = request_with(&[("authorization", "Basic abc")]);
        assert_eq!(extract_bearer_token(request.headers()), None);

        let request = request_with(&[("authorization", "Bearer ")]);
        assert_eq!(extract_bearer_token(request.headers()), None);
    }

    #[test]
    fn test_extract_ip_precedence() {
        let request = request_with(&[
            ("x-forwarded-for", "203.0.113.5, 10.0.0.1"),
            ("x-real-ip", "198.51.100.7"),
        ]);
        assert_eq!(extract_ip(&request, true), "203.0.113.5");

        let request = request_with(&[("x-real-ip", "198.51.100.7")]);
        assert_eq!(extract_ip(&request, true), "198.51.100.7");

        let mut request = request_with(&[]);
        request
            .extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([192, 0, 2, 1], 4000))));
        assert_eq!(extract_ip(&request, true), "192.0.2.1");

        assert_eq!(extract_ip(&request_with(&[]), true), "unknown");
    }

    #[test]
    fn test_extract_ip_ignores_headers_without_trusted_proxy() {
        let mut request = request_with(&[
            ("x-forwarded-for", "203.0.113.5"),
            ("x-real-ip", "198.51.100.7"),
        ]);
        request
            .extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([192, 0, 2, 1], 4000))));
        assert_eq!(extract_ip(&request, false), "192.0.2.1");

        let request = request_with(&[("x-forwarded-for", "203.0.113.5")]);
        assert_eq!(extract_ip(&request, false), "unknown");
    }
}
