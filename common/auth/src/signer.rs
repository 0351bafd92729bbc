use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::Serialize;

use crate::config::JwtConfig;
use crate::error::{AuthError, AuthResult};

/// Signs HS256 access tokens carrying an email identity.
pub struct TokenSigner {
    config: JwtConfig,
    encoding_key: EncodingKey,
}

#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Serialize)]
struct AccessClaims<'a> {
    email: &'a str,
    iat: i64,
    exp: i64,
}

impl TokenSigner {
    pub fn new(config: JwtConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        Self {
            config,
            encoding_key,
        }
    }

    pub fn sign(&self, email: &str) -> AuthResult<IssuedToken> {
        self.sign_at(email, Utc::now())
    }

    /// Sign a token as if issued at `now`; expiry is `now + ttl`.
    pub fn sign_at(&self, email: &str, now: DateTime<Utc>) -> AuthResult<IssuedToken> {
        let expires_at = now + Duration::seconds(self.config.access_ttl_seconds);
        let claims = AccessClaims {
            email,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        let access_token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|err| AuthError::Signing(err.to_string()))?;

        Ok(IssuedToken {
            access_token,
            expires_at,
        })
    }
}
