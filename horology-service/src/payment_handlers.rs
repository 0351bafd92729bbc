use axum::extract::State;
use axum::Json;
use chrono::Utc;
use common_auth::AuthContext;
use common_http_errors::{ApiError, ApiResult};
use common_money::NormalizedMoney;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::app::AppState;
use crate::guards::ensure_same_identity;
use crate::model::{InsertResult, NewPayment, Payment};

#[derive(Debug, Deserialize)]
pub struct PaymentIntentRequest {
    pub price: NormalizedMoney,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentIntentResponse {
    pub client_secret: String,
}

pub async fn create_payment_intent(
    State(state): State<AppState>,
    ctx: AuthContext,
    Json(body): Json<PaymentIntentRequest>,
) -> ApiResult<Json<PaymentIntentResponse>> {
    let amount_minor = body
        .price
        .to_minor_units()
        .map_err(|err| ApiError::bad_request("invalid_price", err.to_string()))?;
    let intent = state
        .payments
        .create_intent(amount_minor, &state.config.payment_currency)
        .await?;
    info!(email = %ctx.email(), intent_id = %intent.id, amount_minor, "Payment intent created");
    Ok(Json(PaymentIntentResponse {
        client_secret: intent.client_secret,
    }))
}

/// Confirms a payment: flips the caller's unpaid order to paid, then records
/// the payment. A second confirmation for the same order is a 409 and writes
/// nothing.
pub async fn record_payment(
    State(state): State<AppState>,
    ctx: AuthContext,
    Json(body): Json<NewPayment>,
) -> ApiResult<Json<InsertResult>> {
    let transaction_id = body.transaction_id.trim().to_string();
    if transaction_id.is_empty() {
        return Err(ApiError::bad_request(
            "missing_transaction_id",
            "transactionId is required",
        ));
    }
    if let Some(claimed) = body.email.as_deref() {
        ensure_same_identity(&ctx, Some(claimed))?;
    }

    let updated = state
        .store
        .mark_order_paid(body.order_id, ctx.email(), &transaction_id)
        .await?;
    if updated.matched_count == 0 {
        warn!(order_id = %body.order_id, email = %ctx.email(), "Payment for missing or already paid order");
        return Err(ApiError::conflict(
            "order_not_payable",
            "order is missing, not yours, or already paid",
        ));
    }

    let payment = Payment {
        id: Uuid::new_v4(),
        order_id: body.order_id,
        transaction_id,
        price: body.price,
        email: ctx.email().to_string(),
        paid_at: Utc::now(),
    };
    let order_id = payment.order_id;
    match state.store.insert_payment(payment).await {
        Ok(result) => {
            info!(%order_id, email = %ctx.email(), "Payment recorded");
            Ok(Json(result))
        }
        Err(err) => {
            error!(%order_id, error = %err, "Order marked paid but payment record failed");
            Err(err.into())
        }
    }
}
