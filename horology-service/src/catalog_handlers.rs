use axum::extract::State;
use axum::Json;
use common_http_errors::ApiResult;

use crate::app::AppState;
use crate::model::{Brand, Watch};
use crate::store::WatchQuery;

const HOME_ADVERTISED_LIMIT: usize = 3;

pub async fn root() -> &'static str {
    "luxury watch server"
}

pub async fn list_brands(State(state): State<AppState>) -> ApiResult<Json<Vec<Brand>>> {
    Ok(Json(state.store.list_brands(false).await?))
}

pub async fn featured_brands(State(state): State<AppState>) -> ApiResult<Json<Vec<Brand>>> {
    Ok(Json(state.store.list_brands(true).await?))
}

/// Home page carousel: the newest advertised listings still for sale,
/// excluding anything reported.
pub async fn advertised_top(State(state): State<AppState>) -> ApiResult<Json<Vec<Watch>>> {
    let query = WatchQuery {
        advertised: Some(true),
        reported: Some(false),
        limit: Some(HOME_ADVERTISED_LIMIT),
        ..WatchQuery::available()
    };
    Ok(Json(state.store.list_watches(&query).await?))
}

pub async fn advertised_all(State(state): State<AppState>) -> ApiResult<Json<Vec<Watch>>> {
    let query = WatchQuery {
        advertised: Some(true),
        ..WatchQuery::available()
    };
    Ok(Json(state.store.list_watches(&query).await?))
}
