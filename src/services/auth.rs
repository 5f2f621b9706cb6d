//! Bearer token issuing and verification
//!
//! Tokens are HS256 JWTs carrying the user id, username and role. There is
//! no server-side revocation; logout is left to the client.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::models::{User, UserRole};

/// Token payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub id: i64,
    pub username: String,
    pub role: UserRole,
    /// Expiry, seconds since the epoch
    pub exp: i64,
    /// Issued at, seconds since the epoch
    pub iat: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("Token expired")]
    Expired,

    #[error("Invalid token: {0}")]
    Invalid(String),

    #[error("Failed to sign token: {0}")]
    Signing(String),
}

/// Signs and verifies tokens with a shared secret
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &str, ttl_hours: i64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl: Duration::hours(ttl_hours),
        }
    }

    /// Issue a token for the user, valid from now for the configured ttl
    pub fn issue(&self, user: &User) -> Result<String, TokenError> {
        self.issue_at(user, Utc::now())
    }

    pub(crate) fn issue_at(&self, user: &User, issued_at: DateTime<Utc>) -> Result<String, TokenError> {
        let claims = Claims {
            id: user.id,
            username: user.username.clone(),
            role: user.role,
            exp: (issued_at + self.ttl).timestamp(),
            iat: issued_at.timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Decode a token, checking signature and expiry
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid(e.to_string()),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn user(id: i64, username: &str, role: UserRole) -> User {
        User {
            id,
            username: username.to_string(),
            password_hash: String::new(),
            role,
            last_login: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_issue_and_verify() {
        let tokens = TokenService::new("secret", 24);
        let token = tokens.issue(&user(7, "admin", UserRole::Admin)).unwrap();

        let claims = tokens.verify(&token).unwrap();
        assert_eq!(claims.id, 7);
        assert_eq!(claims.username, "admin");
        assert_eq!(claims.role, UserRole::Admin);
        assert_eq!(claims.exp - claims.iat, 24 * 3600);
    }

    #[test]
    fn test_expired_token_rejected() {
        let tokens = TokenService::new("secret", 24);
        let issued = Utc::now() - Duration::hours(25);
        let token = tokens.issue_at(&user(1, "admin", UserRole::Admin), issued).unwrap();

        assert!(matches!(tokens.verify(&token), Err(TokenError::Expired)));
    }

    #[test]
    fn test_tampered_token_rejected() {
        let tokens = TokenService::new("secret", 24);
        let token = tokens.issue(&user(1, "editor", UserRole::Editor)).unwrap();

        let mut parts: Vec<String> = token.split('.').map(str::to_string).collect();
        let mut signature = parts[2].clone().into_bytes();
        signature[0] = if signature[0] == b'A' { b'B' } else { b'A' };
        parts[2] = String::from_utf8(signature).unwrap();
        let tampered = parts.join(".");

        assert!(matches!(tokens.verify(&tampered), Err(TokenError::Invalid(_))));
    }

    #[test]
    fn test_other_secret_rejected() {
        let token = TokenService::new("one", 24)
            .issue(&user(1, "admin", UserRole::Admin))
            .unwrap();
        assert!(TokenService::new("two", 24).verify(&token).is_err());
        assert!(TokenService::new("two", 24).verify("not-a-token").is_err());
    }

    proptest! {
        #[test]
        fn prop_round_trip(id in 1i64..1_000_000, username in "[a-z][a-z0-9_]{0,20}", admin in any::<bool>()) {
            let tokens = TokenService::new("prop-secret", 1);
            let role = if admin { UserRole::Admin } else { UserRole::Editor };
            let token = tokens.issue(&user(id, &username, role)).unwrap();
            let claims = tokens.verify(&token).unwrap();
            prop_assert_eq!(claims.id, id);
            prop_assert_eq!(claims.username, username);
            prop_assert_eq!(claims.role, role);
        }
    }
}
