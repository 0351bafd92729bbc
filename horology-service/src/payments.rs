//! Payment-intent provider port. Only intent creation is in scope; the
//! client confirms the intent and reports it back through `POST /payments`.

use async_trait::async_trait;
use common_http_errors::ApiError;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("payment provider unreachable: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("payment provider rejected request ({status}): {body}")]
    Rejected { status: u16, body: String },
}

impl From<PaymentError> for ApiError {
    fn from(value: PaymentError) -> Self {
        ApiError::upstream("payments", value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
    pub client_secret: String,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// `amount_minor` is in the currency's smallest unit (cents for usd).
    async fn create_intent(
        &self,
        amount_minor: i64,
        currency: &str,
    ) -> Result<PaymentIntent, PaymentError>;
}

pub struct StripeGateway {
    client: Client,
    api_base: String,
    secret_key: String,
}

impl StripeGateway {
    pub fn new(api_base: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
            secret_key: secret_key.into(),
        }
    }
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    async fn create_intent(
        &self,
        amount_minor: i64,
        currency: &str,
    ) -> Result<PaymentIntent, PaymentError> {
        let url = format!("{}/v1/payment_intents", self.api_base);
        let amount = amount_minor.to_string();
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.secret_key)
            .form(&[
                ("amount", amount.as_str()),
                ("currency", currency),
                ("payment_method_types[]", "card"),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "Payment provider rejected intent");
            return Err(PaymentError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let intent: PaymentIntent = response.json().await?;
        debug!(intent_id = %intent.id, amount_minor, "Created payment intent");
        Ok(intent)
    }
}

/// Local stand-in used when no provider key is configured.
#[derive(Default)]
pub struct StubGateway;

impl StubGateway {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl PaymentGateway for StubGateway {
    async fn create_intent(
        &self,
        amount_minor: i64,
        currency: &str,
    ) -> Result<PaymentIntent, PaymentError> {
        let id = format!("pi_stub_{}", Uuid::new_v4().simple());
        debug!(%id, amount_minor, currency, "Stub payment intent");
        Ok(PaymentIntent {
            client_secret: format!("{id}_secret_stub"),
            id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    #[tokio::test]
    async fn stripe_gateway_posts_form_with_bearer_key() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v1/payment_intents")
                    .header("authorization", "Bearer sk_test_123")
                    .body_contains("amount=1250")
                    .body_contains("currency=usd");
                then.status(200)
                    .header("content-type", "application/json")
                    .json_body(serde_json::json!({
                        "id": "pi_1",
                        "client_secret": "pi_1_secret_abc",
                        "object": "payment_intent"
                    }));
            })
            .await;

        let gateway = StripeGateway::new(server.base_url(), "sk_test_123");
        let intent = gateway.create_intent(1250, "usd").await.unwrap();
        mock.assert_async().await;
        assert_eq!(intent.client_secret, "pi_1_secret_abc");
    }

    #[tokio::test]
    async fn stripe_gateway_surfaces_provider_rejection() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/payment_intents");
                then.status(402).body("card_declined");
            })
            .await;

        let gateway = StripeGateway::new(server.base_url(), "sk_test_123");
        match gateway.create_intent(100, "usd").await {
            Err(PaymentError::Rejected { status, body }) => {
                assert_eq!(status, 402);
                assert_eq!(body, "card_declined");
            }
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn stub_gateway_issues_distinct_secrets() {
        let gateway = StubGateway::new();
        let a = gateway.create_intent(100, "usd").await.unwrap();
        let b = gateway.create_intent(100, "usd").await.unwrap();
        assert_ne!(a.client_secret, b.client_secret);
        assert!(a.client_secret.starts_with(&a.id));
    }
}
