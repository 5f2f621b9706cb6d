//! User service
//!
//! Login, token verification and admin seeding. Failed logins are
//! throttled per username; a successful login clears the counter and
//! stamps `last_login`.

use crate::db::repositories::UserRepository;
use crate::models::{CreateUserInput, User, UserRole};
use crate::services::auth::{Claims, TokenError, TokenService};
use crate::services::password::{hash_password, verify_password};
use crate::services::rate_limiter::LoginRateLimiter;
use chrono::Utc;
use std::sync::Arc;

/// Error types for user service operations
#[derive(Debug, thiserror::Error)]
pub enum UserServiceError {
    /// Authentication failed (invalid credentials)
    #[error("Authentication failed: {0}")]
    AuthenticationError(String),

    /// Token missing, malformed or expired
    #[error("Invalid token: {0}")]
    InvalidToken(#[from] TokenError),

    /// Too many failed attempts for this username
    #[error("Too many login attempts")]
    RateLimited,

    /// Validation error (invalid input)
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Credentials submitted to the login endpoint
#[derive(Debug, Clone, serde::Deserialize)]
pub struct LoginInput {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// Successful login
#[derive(Debug, Clone)]
pub struct LoginResult {
    pub token: String,
    pub user: User,
}

/// User service for authentication
pub struct UserService {
    user_repo: Arc<dyn UserRepository>,
    tokens: Arc<TokenService>,
    login_limiter: Arc<LoginRateLimiter>,
}

impl UserService {
    pub fn new(
        user_repo: Arc<dyn UserRepository>,
        tokens: Arc<TokenService>,
        login_limiter: Arc<LoginRateLimiter>,
    ) -> Self {
        Self {
            user_repo,
            tokens,
            login_limiter,
        }
    }

    /// Check credentials and issue a bearer token
    pub async fn login(&self, input: &LoginInput) -> Result<LoginResult, UserServiceError> {
        let username = input.username.trim();
        if username.is_empty() || input.password.is_empty() {
            return Err(UserServiceError::ValidationError(
                "שם משתמש וסיסמה נדרשים".to_string(),
            ));
        }

        if self.login_limiter.is_username_limited(username).await {
            tracing::warn!("Login throttled for user '{}'", username);
            return Err(UserServiceError::RateLimited);
        }

        let user = match self.user_repo.get_by_username(username).await? {
            Some(user) if verify_password(&input.password, &user.password_hash)? => user,
            _ => {
                self.login_limiter.record_failed_attempt(username).await;
                tracing::info!("Failed login for user '{}'", username);
                return Err(UserServiceError::AuthenticationError(
                    "Invalid username or password".to_string(),
                ));
            }
        };

        self.login_limiter.clear_username_attempts(username).await;

        let now = Utc::now();
        self.user_repo.update_last_login(user.id, now).await?;
        let token = self
            .tokens
            .issue(&user)
            .map_err(|e| UserServiceError::InternalError(e.into()))?;

        tracing::info!("User '{}' logged in", user.username);

        Ok(LoginResult {
            token,
            user: User {
                last_login: Some(now),
                ..user
            },
        })
    }

    /// Decode a bearer token into the caller's identity
    pub fn verify_token(&self, token: &str) -> Result<Claims, UserServiceError> {
        Ok(self.tokens.verify(token)?)
    }

    /// Create the configured admin account unless the username exists.
    ///
    /// Returns `true` when an account was created.
    pub async fn ensure_admin(&self, username: &str, password: &str) -> Result<bool, UserServiceError> {
        let username = username.trim();
        if username.is_empty() || password.is_empty() {
            return Err(UserServiceError::ValidationError(
                "Admin username and password must not be empty".to_string(),
            ));
        }

        if self.user_repo.get_by_username(username).await?.is_some() {
            tracing::debug!("Admin user '{}' already exists", username);
            return Ok(false);
        }

        self.user_repo
            .create(&CreateUserInput {
                username: username.to_string(),
                password_hash: hash_password(password)?,
                role: UserRole::Admin,
            })
            .await?;

        tracing::info!("Created admin user '{}'", username);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::SqlxUserRepository;
    use crate::db::{create_test_pool, migrations};

    async fn setup() -> UserService {
        let pool = create_test_pool().await.expect("Failed to create pool");
        migrations::run_migrations(&pool).await.expect("Failed to migrate");
        UserService::new(
            SqlxUserRepository::boxed(pool),
            Arc::new(TokenService::new("test-secret", 24)),
            Arc::new(LoginRateLimiter::new()),
        )
    }

    fn creds(username: &str, password: &str) -> LoginInput {
        LoginInput {
            username: username.to_string(),
            password: password.to_string(),
        }
    }

    #[tokio::test]
    async fn test_ensure_admin_is_idempotent() {
        let service = setup().await;
        assert!(service.ensure_admin("admin", "pw").await.unwrap());
        assert!(!service.ensure_admin("admin", "other").await.unwrap());

        // The first password still works
        assert!(service.login(&creds("admin", "pw")).await.is_ok());
    }

    #[tokio::test]
    async fn test_login_issues_verifiable_token() {
        let service = setup().await;
        service.ensure_admin("admin", "pw").await.unwrap();

        let result = service.login(&creds("admin", "pw")).await.unwrap();
        let claims = service.verify_token(&result.token).unwrap();

        assert_eq!(claims.username, "admin");
        assert_eq!(claims.role, UserRole::Admin);
        assert_eq!(claims.id, result.user.id);
        assert!(result.user.last_login.is_some());

        let stored = service.user_repo.get_by_id(result.user.id).await.unwrap().unwrap();
        assert!(stored.last_login.is_some());
    }

    #[tokio::test]
    async fn test_wrong_password_and_unknown_user() {
        let service = setup().await;
        service.ensure_admin("admin", "pw").await.unwrap();

        assert!(matches!(
            service.login(&creds("admin", "nope")).await,
            Err(UserServiceError::AuthenticationError(_))
        ));
        assert!(matches!(
            service.login(&creds("ghost", "pw")).await,
            Err(UserServiceError::AuthenticationError(_))
        ));
    }

    #[tokio::test]
    async fn test_blank_credentials_rejected() {
        let service = setup().await;
        assert!(matches!(
            service.login(&creds("  ", "pw")).await,
            Err(UserServiceError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn test_login_throttled_after_repeated_failures() {
        let service = setup().await;
        service.ensure_admin("admin", "pw").await.unwrap();

        for _ in 0..5 {
            let _ = service.login(&creds("admin", "bad")).await;
        }

        assert!(matches!(
            service.login(&creds("admin", "pw")).await,
            Err(UserServiceError::RateLimited)
        ));
    }

    #[tokio::test]
    async fn test_success_clears_failures() {
        let service = setup().await;
        service.ensure_admin("admin", "pw").await.unwrap();

        for _ in 0..4 {
            let _ = service.login(&creds("admin", "bad")).await;
        }
        service.login(&creds("admin", "pw")).await.unwrap();
        for _ in 0..4 {
            let _ = service.login(&creds("admin", "bad")).await;
        }
        assert!(service.login(&creds("admin", "pw")).await.is_ok());
    }

    #[tokio::test]
    async fn test_verify_garbage_token() {
        let service = setup().await;
        assert!(matches!(
            service.verify_token("abc.def.ghi"),
            Err(UserServiceError::InvalidToken(_))
        ));
    }
}
