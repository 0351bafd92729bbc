use axum::extract::{Path, Query, State};
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use common_auth::{AccountRole, AuthError, RoleRequirement};
use common_http_errors::{ApiError, ApiResult};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::app::AppState;
use crate::model::{InsertResult, NewUser, User};

#[derive(Debug, Deserialize)]
pub struct JwtQuery {
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessTokenBody {
    pub access_token: String,
}

fn required_email(raw: Option<&str>) -> ApiResult<String> {
    match raw.map(str::trim) {
        Some(email) if !email.is_empty() => Ok(email.to_string()),
        _ => Err(ApiError::bad_request("missing_email", "email is required")),
    }
}

pub async fn register_user(
    State(state): State<AppState>,
    Json(body): Json<NewUser>,
) -> ApiResult<Json<InsertResult>> {
    let email = required_email(Some(body.email.as_str()))?;
    let role = match body.role.as_deref().map(str::trim) {
        None => AccountRole::Unset,
        Some(raw) => raw.parse::<AccountRole>().map_err(|err| {
            ApiError::bad_request("invalid_role", err.to_string())
        })?,
    };
    let user = User {
        id: Uuid::new_v4(),
        name: body.name,
        email,
        role,
        is_admin: false,
    };
    info!(email = %user.email, role = role.as_str(), "Registering user");
    Ok(Json(state.store.insert_user(user).await?))
}

/// `GET /jwt?email=`. Unknown users get a 403 carrying an empty token so the
/// client can tell "not registered" from a transport failure.
pub async fn issue_jwt(
    State(state): State<AppState>,
    Query(query): Query<JwtQuery>,
) -> ApiResult<Response> {
    let email = required_email(query.email.as_deref())?;
    match state.token_issuer.issue(&state.store, &email).await {
        Ok(token) => Ok(Json(AccessTokenBody {
            access_token: token.access_token,
        })
        .into_response()),
        Err(ApiError::Auth(err @ AuthError::UnknownIdentity(_))) => {
            let mut resp = (
                StatusCode::FORBIDDEN,
                Json(AccessTokenBody {
                    access_token: String::new(),
                }),
            )
                .into_response();
            resp.headers_mut()
                .insert("X-Error-Code", HeaderValue::from_static(err.code()));
            Ok(resp)
        }
        Err(err) => Err(err),
    }
}

async fn has_role(state: &AppState, email: &str, required: RoleRequirement) -> ApiResult<bool> {
    let user = state.store.find_user_by_email(email).await?;
    Ok(user.map_or(false, |u| u.grants().satisfies(required)))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IsAdmin {
    pub is_admin: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IsSeller {
    pub is_seller: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IsBuyer {
    pub is_buyer: bool,
}

pub async fn is_admin(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> ApiResult<Json<IsAdmin>> {
    let is_admin = has_role(&state, &email, RoleRequirement::Admin).await?;
    Ok(Json(IsAdmin { is_admin }))
}

pub async fn is_seller(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> ApiResult<Json<IsSeller>> {
    let is_seller = has_role(&state, &email, RoleRequirement::Seller).await?;
    Ok(Json(IsSeller { is_seller }))
}

pub async fn is_buyer(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> ApiResult<Json<IsBuyer>> {
    let is_buyer = has_role(&state, &email, RoleRequirement::Buyer).await?;
    Ok(Json(IsBuyer { is_buyer }))
}

pub async fn list_sellers(State(state): State<AppState>) -> ApiResult<Json<Vec<User>>> {
    Ok(Json(state.store.list_users_by_role(AccountRole::Seller).await?))
}

pub async fn list_buyers(State(state): State<AppState>) -> ApiResult<Json<Vec<User>>> {
    Ok(Json(state.store.list_users_by_role(AccountRole::Buyer).await?))
}
