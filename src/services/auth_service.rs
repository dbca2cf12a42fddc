use std::env;

use argon2::password_hash::{rand_core::OsRng, PasswordHash, SaltString};
use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::user::User;

/// Fixed token lifetime: one hour.
pub const TOKEN_LIFETIME_SECS: i64 = 3600;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user id.
    pub sub: String,
    pub email: String,
    pub iat: i64,
    pub exp: i64,
}

/// Stateless auth: salted password hashing plus signed, time-limited
/// tokens. Nothing about a session is kept server-side.
#[derive(Clone)]
pub struct AuthService {
    jwt_secret: String,
}

impl AuthService {
    pub fn new(jwt_secret: impl Into<String>) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
        }
    }

    pub fn new_from_env() -> Self {
        let jwt_secret = env::var("JWT_SECRET").expect("JWT_SECRET must be set");
        Self::new(jwt_secret)
    }

    pub fn hash_password(&self, password: &str) -> Result<String, ApiError> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| ApiError::Internal(format!("password hashing failed: {}", e)))
    }

    /// Constant-compare the candidate password against the stored hash.
    pub fn verify_password(&self, password: &str, stored_hash: &str) -> Result<(), ApiError> {
        let parsed = PasswordHash::new(stored_hash)
            .map_err(|e| ApiError::Internal(format!("stored password hash is invalid: {}", e)))?;
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .map_err(|_| ApiError::InvalidCredentials)
    }

    /// Issue a token for the user; returns the token plus the lifetime in
    /// seconds so handlers can report the expiry to the client.
    pub fn issue_token(&self, user: &User) -> Result<(String, i64), ApiError> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: user.id.to_string(),
            email: user.email.clone(),
            iat: now,
            exp: now + TOKEN_LIFETIME_SECS,
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )
        .map_err(|e| ApiError::Internal(format!("token signing failed: {}", e)))?;

        Ok((token, TOKEN_LIFETIME_SECS))
    }

    /// Validate signature and expiry, returning the authenticated user id.
    /// Leeway is zero: a token is rejected the instant its expiry passes.
    pub fn verify_token(&self, token: &str) -> Result<Uuid, ApiError> {
        let mut validation = Validation::default();
        validation.leeway = 0;

        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_bytes()),
            &validation,
        )
        .map_err(|_| ApiError::Unauthorized("Invalid or expired token.".to_string()))?;

        Uuid::parse_str(&data.claims.sub)
            .map_err(|_| ApiError::Unauthorized("Invalid or expired token.".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn test_user() -> User {
        User {
            id: Uuid::new_v4(),
            email: "ada@example.com".to_string(),
            password_hash: String::new(),
            name: "Ada".to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn password_roundtrip() {
        let svc = AuthService::new("secret");
        let hash = svc.hash_password("correct horse").unwrap();
        assert_ne!(hash, "correct horse");
        assert!(svc.verify_password("correct horse", &hash).is_ok());
    }

    #[test]
    fn wrong_password_is_invalid_credentials() {
        let svc = AuthService::new("secret");
        let hash = svc.hash_password("correct horse").unwrap();
        match svc.verify_password("battery staple", &hash) {
            Err(ApiError::InvalidCredentials) => {}
            other => panic!("expected InvalidCredentials, got {other:?}"),
        }
    }

    #[test]
    fn token_roundtrip_returns_the_user_id() {
        let svc = AuthService::new("secret");
        let user = test_user();
        let (token, expires_in) = svc.issue_token(&user).unwrap();
        assert_eq!(expires_in, TOKEN_LIFETIME_SECS);
        assert_eq!(svc.verify_token(&token).unwrap(), user.id);
    }

    #[test]
    fn token_signed_with_another_secret_is_rejected() {
        let user = test_user();
        let (token, _) = AuthService::new("secret-a").issue_token(&user).unwrap();
        match AuthService::new("secret-b").verify_token(&token) {
            Err(ApiError::Unauthorized(_)) => {}
            other => panic!("expected Unauthorized, got {other:?}"),
        }
    }

    #[test]
    fn expired_token_is_rejected() {
        let svc = AuthService::new("secret");
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: Uuid::new_v4().to_string(),
            email: "ada@example.com".to_string(),
            iat: now - TOKEN_LIFETIME_SECS - 10,
            exp: now - 10,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"secret"),
        )
        .unwrap();

        match svc.verify_token(&token) {
            Err(ApiError::Unauthorized(_)) => {}
            other => panic!("expected Unauthorized, got {other:?}"),
        }
    }

    #[test]
    fn garbage_token_is_rejected() {
        let svc = AuthService::new("secret");
        assert!(svc.verify_token("not.a.token").is_err());
    }
}
