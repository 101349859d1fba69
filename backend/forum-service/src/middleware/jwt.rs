/// Bearer token verification
///
/// Tokens are issued by the sign-in provider, which shares an HS256 secret
/// with this service. Only the subject (the user's UUID) is used here.
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, Result};

const JWT_ALGORITHM: Algorithm = Algorithm::HS256;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user ID as UUID string)
    pub sub: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl JwtKeys {
    pub fn from_secret(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// Verify signature and expiry, returning the user id in `sub`
    pub fn validate(&self, token: &str) -> Result<Uuid> {
        let data = decode::<Claims>(token, &self.decoding, &Validation::new(JWT_ALGORITHM))
            .map_err(|e| {
                tracing::warn!("JWT validation failed: {}", e);
                AppError::Unauthorized("Invalid or expired token".to_string())
            })?;

        Uuid::parse_str(&data.claims.sub)
            .map_err(|_| AppError::Unauthorized("Invalid token: malformed user id".to_string()))
    }

    /// Sign a token for `user_id` valid for `ttl`
    pub fn issue(&self, user_id: Uuid, ttl: Duration) -> Result<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        };

        encode(&Header::new(JWT_ALGORITHM), &claims, &self.encoding)
            .map_err(|e| AppError::Internal(format!("Failed to sign token: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_token_validates() {
        let keys = JwtKeys::from_secret("test-secret");
        let user_id = Uuid::new_v4();
        let token = keys.issue(user_id, Duration::hours(1)).unwrap();
        assert_eq!(keys.validate(&token).unwrap(), user_id);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = JwtKeys::from_secret("a")
            .issue(Uuid::new_v4(), Duration::hours(1))
            .unwrap();
        let err = JwtKeys::from_secret("b").validate(&token).unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[test]
    fn expired_token_is_rejected() {
        let keys = JwtKeys::from_secret("test-secret");
        let token = keys.issue(Uuid::new_v4(), Duration::hours(-2)).unwrap();
        assert!(keys.validate(&token).is_err());
    }
}
