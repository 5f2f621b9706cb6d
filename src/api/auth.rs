//! Authentication API endpoints
//!
//! - POST /api/auth/login - Exchange credentials for a bearer token
//! - GET /api/auth/verify - Check a token and return its identity
//! - POST /api/auth/logout - Acknowledge logout (tokens are not revoked)

use axum::{extract::State, Json};
use serde::Serialize;

use crate::api::middleware::{ApiError, ApiJson, AppState, AuthenticatedUser};
use crate::api::responses::MessageResponse;
use crate::models::{User, UserRole};
use crate::services::{Claims, LoginInput};

/// Identity returned to the admin pages
#[derive(Debug, Serialize)]
pub struct UserInfo {
    pub id: i64,
    pub username: String,
    pub role: UserRole,
}

impl From<User> for UserInfo {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            role: user.role,
        }
    }
}

impl From<Claims> for UserInfo {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.id,
            username: claims.username,
            role: claims.role,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub message: &'static str,
    pub token: String,
    pub user: UserInfo,
}

#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    pub message: &'static str,
    pub user: UserInfo,
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<LoginInput>,
) -> Result<Json<LoginResponse>, ApiError> {
    let result = state.user_service.login(&input).await?;

    Ok(Json(LoginResponse {
        message: "התחברות הצליחה",
        token: result.token,
        user: result.user.into(),
    }))
}

/// GET /api/auth/verify
pub async fn verify(AuthenticatedUser(claims): AuthenticatedUser) -> Json<VerifyResponse> {
    Json(VerifyResponse {
        message: "Token is valid",
        user: claims.into(),
    })
}

/// POST /api/auth/logout
///
/// Stateless: the client discards its token.
pub async fn logout(AuthenticatedUser(claims): AuthenticatedUser) -> Json<MessageResponse> {
    tracing::info!("User '{}' logged out", claims.username);
    Json(MessageResponse::new("Logout successful"))
}
