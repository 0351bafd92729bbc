use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde_json::Value;
use tracing::debug;

use crate::claims::Claims;
use crate::config::JwtConfig;
use crate::error::{AuthError, AuthResult};

/// Stateless HS256 verifier. Holds no session state; every call checks the
/// signature and the embedded expiry.
#[derive(Clone)]
pub struct JwtVerifier {
    config: JwtConfig,
    decoding_key: DecodingKey,
}

impl JwtVerifier {
    pub fn new(config: JwtConfig) -> Self {
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());
        Self {
            config,
            decoding_key,
        }
    }

    pub fn verify(&self, token: &str) -> AuthResult<Claims> {
        self.verify_at(token, Utc::now())
    }

    /// Verify against a fixed clock. A token is valid strictly before `exp`
    /// (plus leeway) and rejected at or after it.
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> AuthResult<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        // exp is enforced below against the supplied clock.
        validation.validate_exp = false;
        validation.leeway = 0;

        let token_data = decode::<Value>(token, &self.decoding_key, &validation)?;
        let claims = Claims::try_from(token_data.claims)?;

        let deadline = claims.expires_at.timestamp() + i64::from(self.config.leeway_seconds);
        if now.timestamp() >= deadline {
            debug!(email = %claims.email, "rejected expired token");
            return Err(AuthError::Expired);
        }

        debug!(email = %claims.email, "verified JWT successfully");
        Ok(claims)
    }
}
