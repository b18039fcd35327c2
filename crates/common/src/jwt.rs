//! Bearer tokens for the HTTP API.
//!
//! After `initData` verification the API hands the mini-app an HS256
//! token carrying the Telegram user ID and an expiry; subsequent calls
//! authenticate with `Authorization: Bearer <token>`.

use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

/// JWT claims structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (Telegram user ID).
    pub sub: String,
    /// Issued at (Unix timestamp).
    pub iat: i64,
    /// Expiration time (Unix timestamp).
    pub exp: i64,
}

impl Claims {
    /// The Telegram user ID this token was issued to.
    pub fn telegram_id(&self) -> AppResult<i64> {
        self.sub.parse::<i64>().map_err(|_| AppError::Unauthorized)
    }
}

/// Encodes and validates bearer tokens.
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    token_ttl_secs: i64,
}

impl JwtService {
    /// Create a service from the configured secret and token lifetime.
    #[must_use]
    pub fn new(secret: &str, token_ttl_secs: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            token_ttl_secs,
        }
    }

    /// Issue a token for a Telegram user.
    pub fn issue(&self, telegram_id: i64) -> AppResult<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: telegram_id.to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::seconds(self.token_ttl_secs)).timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("Failed to encode token: {e}")))
    }

    /// Decode and validate a token, returning its claims.
    ///
    /// Expired or malformed tokens yield `Unauthorized`.
    pub fn verify(&self, token: &str) -> AppResult<Claims> {
        decode::<Claims>(token, &self.decoding_key, &Validation::default())
            .map(|data| data.claims)
            .map_err(|_| AppError::Unauthorized)
    }
}

impl std::fmt::Debug for JwtService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtService")
            .field("token_ttl_secs", &self.token_ttl_secs)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn service() -> JwtService {
        JwtService::new("test-secret-key-that-is-long-enough", 900)
    }

    #[test]
    fn round_trip() {
        let service = service();
        let token = service.issue(279_058_397).unwrap();
        let claims = service.verify(&token).unwrap();
        assert_eq!(claims.telegram_id().unwrap(), 279_058_397);
    }

    #[test]
    fn expired_token_rejected() {
        let service = JwtService::new("test-secret-key-that-is-long-enough", -120);
        let token = service.issue(1).unwrap();
        assert!(matches!(
            service.verify(&token),
            Err(AppError::Unauthorized)
        ));
    }

    #[test]
    fn wrong_secret_rejected() {
        let token = service().issue(1).unwrap();
        let other = JwtService::new("a-different-secret-entirely-here", 900);
        assert!(other.verify(&token).is_err());
    }

    #[test]
    fn garbage_rejected() {
        assert!(service().verify("not.a.token").is_err());
    }
}
