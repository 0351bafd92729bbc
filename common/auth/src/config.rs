use std::fmt;

/// Five hours, the lifetime of every access token unless overridden.
pub const DEFAULT_ACCESS_TTL_SECONDS: i64 = 5 * 60 * 60;

/// Runtime configuration shared by the token signer and verifier.
#[derive(Clone)]
pub struct JwtConfig {
    /// HMAC secret used for HS256 signing and verification.
    pub secret: String,
    /// Lifetime of an issued access token.
    pub access_ttl_seconds: i64,
    /// Allowable clock skew in seconds when evaluating `exp`.
    pub leeway_seconds: u32,
}

impl JwtConfig {
    /// Construct config with the default five hour lifetime and no leeway.
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            access_ttl_seconds: DEFAULT_ACCESS_TTL_SECONDS,
            leeway_seconds: 0,
        }
    }

    pub fn with_access_ttl(mut self, seconds: i64) -> Self {
        self.access_ttl_seconds = seconds;
        self
    }

    /// Adjust the allowed leeway.
    pub fn with_leeway(mut self, seconds: u32) -> Self {
        self.leeway_seconds = seconds;
        self
    }
}

impl fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"<redacted>")
            .field("access_ttl_seconds", &self.access_ttl_seconds)
            .field("leeway_seconds", &self.leeway_seconds)
            .finish()
    }
}
