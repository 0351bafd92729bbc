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
use crate::model::{DeleteResult, InsertResult, NewWatch, UpdateResult, Watch};
use crate::store::WatchQuery;

#[derive(Debug, Deserialize)]
pub struct EmailQuery {
    #[serde(default)]
    pub email: Option<String>,
}

pub async fn list_by_brand(
    State(state): State<AppState>,
    Path(brand): Path<String>,
) -> ApiResult<Json<Vec<Watch>>> {
    let query = WatchQuery {
        brand: Some(brand),
        ..WatchQuery::available()
    };
    Ok(Json(state.store.list_watches(&query).await?))
}

pub async fn single_watch(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Option<Watch>>> {
    Ok(Json(state.store.find_watch(id).await?))
}

pub async fn list_available(State(state): State<AppState>) -> ApiResult<Json<Vec<Watch>>> {
    Ok(Json(state.store.list_watches(&WatchQuery::available()).await?))
}

pub async fn mark_sold(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<UpdateResult>> {
    Ok(Json(state.store.mark_watch_sold(id).await?))
}

pub async fn report_watch(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<UpdateResult>> {
    info!(watch_id = %id, reporter = %ctx.email(), "Watch reported");
    Ok(Json(state.store.report_watch(id).await?))
}

pub async fn list_seller_watches(
    State(state): State<AppState>,
    ctx: AuthContext,
    Query(query): Query<EmailQuery>,
) -> ApiResult<Json<Vec<Watch>>> {
    ensure_same_identity(&ctx, query.email.as_deref())?;
    let filter = WatchQuery {
        seller_email: Some(ctx.email().to_string()),
        ..WatchQuery::default()
    };
    Ok(Json(state.store.list_watches(&filter).await?))
}

pub async fn create_watch(
    State(state): State<AppState>,
    ctx: AuthContext,
    Json(body): Json<NewWatch>,
) -> ApiResult<Json<InsertResult>> {
    if body.brand.trim().is_empty() {
        return Err(ApiError::bad_request("missing_brand", "brand is required"));
    }
    if let Some(claimed) = body.seller_email.as_deref() {
        ensure_same_identity(&ctx, Some(claimed))?;
    }
    let watch = body.into_watch(ctx.email().to_string(), Utc::now());
    info!(watch_id = %watch.id, seller = %watch.seller_email, brand = %watch.brand, "Listing watch");
    Ok(Json(state.store.insert_watch(watch).await?))
}

pub async fn advertise_watch(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<UpdateResult>> {
    Ok(Json(state.store.advertise_watch(id, ctx.email()).await?))
}

pub async fn delete_watch(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<DeleteResult>> {
    Ok(Json(state.store.delete_watch(id, ctx.email()).await?))
}

pub async fn list_reported(State(state): State<AppState>) -> ApiResult<Json<Vec<Watch>>> {
    let query = WatchQuery {
        reported: Some(true),
        ..WatchQuery::default()
    };
    Ok(Json(state.store.list_watches(&query).await?))
}
