//! Session tokens.
//!
//! `POST /login` hands out an HS256-signed JWT whose subject is the ERP
//! username. Every other protected route resolves it back to the stored
//! identity `api:<USERNAME>` through the [`AuthUser`] extractor; the ERP
//! bearer token itself never leaves the server.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use davomat_core::ConfigError;
use davomat_models::ExternalId;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::state::AppState;

/// Default session lifetime in minutes.
pub const DEFAULT_JWT_EXPIRY_MINUTES: i64 = 60;

/// Claims embedded in every session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// ERP username.
    pub sub: String,
    /// ERP user id.
    pub user_id: i64,
    /// Expiration time (UTC Unix timestamp).
    pub exp: i64,
    /// Issued-at time (UTC Unix timestamp).
    pub iat: i64,
}

/// Signing secret and session lifetime.
#[derive(Clone)]
pub struct JwtConfig {
    secret: String,
    /// Session lifetime in minutes.
    pub expiry_minutes: i64,
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("expiry_minutes", &self.expiry_minutes)
            .finish_non_exhaustive()
    }
}

impl JwtConfig {
    pub fn new(secret: impl Into<String>, expiry_minutes: i64) -> Self {
        Self {
            secret: secret.into(),
            expiry_minutes,
        }
    }

    /// Loads `JWT_SECRET` (required) and `JWT_EXPIRY_MINUTES` (default 60).
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Loads settings through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let secret = lookup("JWT_SECRET")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::Missing("JWT_SECRET"))?;

        let expiry_minutes = match lookup("JWT_EXPIRY_MINUTES").map(|s| s.trim().to_string()) {
            Some(raw) if !raw.is_empty() => raw
                .parse::<i64>()
                .ok()
                .filter(|m| *m > 0)
                .ok_or(ConfigError::Invalid {
                    name: "JWT_EXPIRY_MINUTES",
                    reason: format!("expected a positive number of minutes, got {}", raw),
                })?,
            _ => DEFAULT_JWT_EXPIRY_MINUTES,
        };

        Ok(Self::new(secret, expiry_minutes))
    }

    /// Signs a session token for `username`.
    pub fn issue(&self, username: &str, user_id: i64) -> Result<String, jsonwebtoken::errors::Error> {
        let now = chrono::Utc::now().timestamp();
        let claims = Claims {
            sub: username.to_string(),
            user_id,
            exp: now + self.expiry_minutes * 60,
            iat: now,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
    }

    /// Verifies signature and expiry, returning the claims.
    pub fn validate(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(data.claims)
    }
}

/// Authenticated caller, extracted from `Authorization: Bearer <jwt>`.
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// ERP username from the token subject.
    pub username: String,
    /// Stored identity for this session.
    pub external_id: ExternalId,
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError::Unauthorized("missing Authorization header".into()))?;

        let token = header
            .strip_prefix("Bearer ")
            .or_else(|| header.strip_prefix("bearer "))
            .ok_or_else(|| ApiError::Unauthorized("expected: Bearer <token>".into()))?;

        let claims = state
            .jwt
            .validate(token.trim())
            .map_err(|_| ApiError::Unauthorized("invalid or expired token".into()))?;

        Ok(AuthUser {
            external_id: ExternalId::api(&claims.sub),
            username: claims.sub,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config() -> JwtConfig {
        JwtConfig::new("test-secret-that-is-long-enough-for-hmac", 60)
    }

    #[test]
    fn test_issue_and_validate() {
        let config = config();
        let token = config.issue("ABT24CCS008", 689).unwrap();

        let claims = config.validate(&token).unwrap();
        assert_eq!(claims.sub, "ABT24CCS008");
        assert_eq!(claims.user_id, 689);
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_expired_token_fails() {
        let config = config();
        let now = chrono::Utc::now().timestamp();
        let claims = Claims {
            sub: "u".into(),
            user_id: 1,
            exp: now - 300,
            iat: now - 600,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"test-secret-that-is-long-enough-for-hmac"),
        )
        .unwrap();

        assert!(config.validate(&token).is_err());
    }

    #[test]
    fn test_different_secrets_fail() {
        let token = JwtConfig::new("secret-alpha", 60).issue("u", 1).unwrap();
        assert!(JwtConfig::new("secret-bravo", 60).validate(&token).is_err());
    }

    #[test]
    fn test_from_lookup() {
        let env: HashMap<&str, &str> = [("JWT_SECRET", "s3cret"), ("JWT_EXPIRY_MINUTES", "15")].into();
        let config = JwtConfig::from_lookup(|k| env.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(config.expiry_minutes, 15);
        assert!(!format!("{:?}", config).contains("s3cret"));

        let defaults = JwtConfig::from_lookup(|k| (k == "JWT_SECRET").then(|| "s".to_string())).unwrap();
        assert_eq!(defaults.expiry_minutes, DEFAULT_JWT_EXPIRY_MINUTES);

        assert_eq!(
            JwtConfig::from_lookup(|_| None).unwrap_err(),
            ConfigError::Missing("JWT_SECRET")
        );
        assert!(JwtConfig::from_lookup(|k| Some(if k == "JWT_SECRET" { "s" } else { "-5" }.to_string())).is_err());
    }
}
