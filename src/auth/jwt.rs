use std::time::Duration;

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::debug;
use uuid::Uuid;

use crate::config::{JwtConfig, MAX_TTL_DAYS};

#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    /// Bad signature, malformed token and expiry are deliberately indistinguishable.
    #[error("invalid or expired token")]
    InvalidToken,
    #[error("token signing failed: {0}")]
    Signing(String),
}

/// Token payload: the principal's store id and nothing about its kind.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    pub id: Uuid,
    pub exp: i64, // unix seconds
}

/// Signing material derived once from the process secret.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl JwtKeys {
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl,
        }
    }

    pub fn from_config(cfg: &JwtConfig) -> Self {
        let days = cfg.ttl_days.clamp(1, MAX_TTL_DAYS) as u64;
        Self::new(cfg.secret.as_bytes(), Duration::from_secs(days * 24 * 60 * 60))
    }

    pub fn sign(&self, id: Uuid) -> Result<String, JwtError> {
        self.sign_at(id, OffsetDateTime::now_utc().unix_timestamp())
    }

    pub fn sign_at(&self, id: Uuid, now: i64) -> Result<String, JwtError> {
        let claims = Claims {
            id,
            exp: now.saturating_add(i64::try_from(self.ttl.as_secs()).unwrap_or(i64::MAX)),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| JwtError::Signing(e.to_string()))?;
        debug!(principal_id = %id, exp = claims.exp, "jwt signed");
        Ok(token)
    }

    pub fn verify(&self, token: &str) -> Result<Claims, JwtError> {
        self.verify_at(token, OffsetDateTime::now_utc().unix_timestamp())
    }

    /// Rejects once `now >= exp`.
    pub fn verify_at(&self, token: &str, now: i64) -> Result<Claims, JwtError> {
        let mut validation = Validation::new(Algorithm::HS256);
        // expiry is checked below with an inclusive bound and an injectable clock
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(|e| {
            debug!(error = %e, "jwt rejected");
            JwtError::InvalidToken
        })?;

        if data.claims.exp <= now {
            debug!(principal_id = %data.claims.id, exp = data.claims.exp, "jwt expired");
            return Err(JwtError::InvalidToken);
        }
        Ok(data.claims)
    }
}
