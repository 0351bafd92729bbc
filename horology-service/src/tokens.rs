use std::sync::Arc;

use chrono::{DateTime, Utc};
use common_auth::{AuthError, IssuedToken, TokenSigner};
use common_http_errors::ApiResult;
use tracing::{debug, info};

use crate::store::MarketStore;

/// Mints access tokens for registered users only. The store is read once
/// and never written.
pub struct TokenIssuer {
    signer: TokenSigner,
}

impl TokenIssuer {
    pub fn new(signer: TokenSigner) -> Self {
        Self { signer }
    }

    pub async fn issue(&self, store: &Arc<dyn MarketStore>, email: &str) -> ApiResult<IssuedToken> {
        self.issue_at(store, email, Utc::now()).await
    }

    pub async fn issue_at(
        &self,
        store: &Arc<dyn MarketStore>,
        email: &str,
        now: DateTime<Utc>,
    ) -> ApiResult<IssuedToken> {
        if store.find_user_by_email(email).await?.is_none() {
            debug!(%email, "Token requested for unknown identity");
            return Err(AuthError::UnknownIdentity(email.to_string()).into());
        }
        let token = self.signer.sign_at(email, now)?;
        info!(%email, expires_at = %token.expires_at, "Issued access token");
        Ok(token)
    }
}
