use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::Utc;
use common_auth::AuthContext;
use common_http_errors::{ApiError, ApiResult};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::app::AppState;
use crate::guards::ensure_same_identity;
use crate::model::{DeleteResult, InsertResult, NewOrder, Order, UpdateResult};
use crate::watch_handlers::EmailQuery;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayOrderRequest {
    pub transaction_id: String,
}

pub async fn list_my_orders(
    State(state): State<AppState>,
    ctx: AuthContext,
    Query(query): Query<EmailQuery>,
) -> ApiResult<Json<Vec<Order>>> {
    ensure_same_identity(&ctx, query.email.as_deref())?;
    Ok(Json(state.store.list_orders_by_buyer(ctx.email()).await?))
}

pub async fn get_order(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Option<Order>>> {
    Ok(Json(state.store.find_order(id, ctx.email()).await?))
}

pub async fn buy_watch(
    State(state): State<AppState>,
    ctx: AuthContext,
    Json(body): Json<NewOrder>,
) -> ApiResult<Json<InsertResult>> {
    if let Some(claimed) = body.buyer_email.as_deref() {
        ensure_same_identity(&ctx, Some(claimed))?;
    }
    let order = body.into_order(ctx.email().to_string(), Utc::now());
    info!(order_id = %order.id, watch_id = %order.watch_id, buyer = %order.buyer_email, "Order placed");
    Ok(Json(state.store.insert_order(order).await?))
}

/// Marks the caller's order paid. An order that is already paid, or not the
/// caller's, matches nothing and is reported as such.
pub async fn pay_my_order(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(id): Path<Uuid>,
    Json(body): Json<PayOrderRequest>,
) -> ApiResult<Json<UpdateResult>> {
    let transaction_id = body.transaction_id.trim();
    if transaction_id.is_empty() {
        return Err(ApiError::bad_request(
            "missing_transaction_id",
            "transactionId is required",
        ));
    }
    let result = state
        .store
        .mark_order_paid(id, ctx.email(), transaction_id)
        .await?;
    Ok(Json(result))
}

pub async fn delete_my_order(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<DeleteResult>> {
    Ok(Json(state.store.delete_unpaid_order(id, ctx.email()).await?))
}
