use anyhow::{bail, Context, Result};
use common_auth::{JwtConfig, DEFAULT_ACCESS_TTL_SECONDS};
use std::env;
use std::fmt;

const DEFAULT_CORS_ORIGINS: [&str; 3] = [
    "http://localhost:3000",
    "http://localhost:3001",
    "http://localhost:5173",
];

#[derive(Clone)]
pub struct StripeConfig {
    pub secret_key: String,
    pub api_base: String,
}

impl fmt::Debug for StripeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StripeConfig")
            .field("secret_key", &"<redacted>")
            .field("api_base", &self.api_base)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub host: String,
    pub port: u16,
    pub jwt: JwtConfig,
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub stripe: Option<StripeConfig>,
    pub payment_currency: String,
    pub cors_allowed_origins: Vec<String>,
}

impl ServiceConfig {
    /// Defaults for everything except the signing secret.
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            jwt: JwtConfig::new(secret),
            database_url: None,
            database_max_connections: 5,
            stripe: None,
            payment_currency: "usd".to_string(),
            cors_allowed_origins: DEFAULT_CORS_ORIGINS.iter().map(|o| o.to_string()).collect(),
        }
    }

    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let secret = non_empty("ACCESS_TOKEN_SECRET").context("ACCESS_TOKEN_SECRET must be set")?;
        let ttl = match non_empty("ACCESS_TOKEN_TTL_SECONDS") {
            Some(raw) => raw
                .parse::<i64>()
                .with_context(|| format!("ACCESS_TOKEN_TTL_SECONDS is not a number: {raw}"))?,
            None => DEFAULT_ACCESS_TTL_SECONDS,
        };
        if ttl <= 0 {
            bail!("ACCESS_TOKEN_TTL_SECONDS must be positive");
        }

        let leeway = match non_empty("ACCESS_TOKEN_LEEWAY_SECONDS") {
            Some(raw) => raw
                .parse::<u32>()
                .with_context(|| format!("ACCESS_TOKEN_LEEWAY_SECONDS is not a number: {raw}"))?,
            None => 0,
        };

        let mut config = Self::new(secret);
        config.jwt = config.jwt.with_access_ttl(ttl).with_leeway(leeway);
        if let Some(host) = non_empty("HOST") {
            config.host = host;
        }
        if let Some(raw) = non_empty("PORT") {
            config.port = raw
                .parse()
                .with_context(|| format!("PORT is not a valid port: {raw}"))?;
        }
        config.database_url = non_empty("DATABASE_URL");
        config.database_max_connections = non_empty("DATABASE_MAX_CONNECTIONS")
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(5)
            .max(1);
        config.stripe = non_empty("STRIPE_SECRET_KEY").map(|secret_key| StripeConfig {
            secret_key,
            api_base: non_empty("STRIPE_API_BASE")
                .unwrap_or_else(|| "https://api.stripe.com".to_string()),
        });
        if let Some(currency) = non_empty("PAYMENT_CURRENCY") {
            config.payment_currency = currency.to_lowercase();
        }
        if let Some(origins) = non_empty("CORS_ALLOWED_ORIGINS") {
            config.cors_allowed_origins = origins
                .split(',')
                .map(|o| o.trim().to_string())
                .filter(|o| !o.is_empty())
                .collect();
        }
        Ok(config)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
