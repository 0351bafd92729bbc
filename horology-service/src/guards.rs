//! Role gates. They run after the identity gate has bound an
//! [`AuthContext`] and re-read the caller's stored user on every request.

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use common_auth::{authorize, AuthContext, AuthError, RoleRequirement};
use common_http_errors::ApiResult;
use tracing::{debug, warn};

use crate::app::AppState;

pub async fn require_admin(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> ApiResult<Response> {
    require_role(&state, RoleRequirement::Admin, req, next).await
}

pub async fn require_seller(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> ApiResult<Response> {
    require_role(&state, RoleRequirement::Seller, req, next).await
}

async fn require_role(
    state: &AppState,
    required: RoleRequirement,
    req: Request,
    next: Next,
) -> ApiResult<Response> {
    // Fails closed if mounted without the identity gate in front.
    let Some(ctx) = req.extensions().get::<AuthContext>() else {
        warn!(role = required.as_str(), path = %req.uri().path(), "role gate reached without identity");
        return Err(AuthError::MissingAuthorization.into());
    };
    let email = ctx.email().to_string();

    let user = state.store.find_user_by_email(&email).await?;
    authorize(user.map(|u| u.grants()), required).map_err(|err| {
        warn!(%email, role = required.as_str(), "role gate rejected request");
        err
    })?;
    debug!(%email, role = required.as_str(), "role gate passed");
    Ok(next.run(req).await)
}

/// Rejects a request whose query/body email names someone other than the
/// verified caller. An absent email names nobody and is rejected too.
pub fn ensure_same_identity(ctx: &AuthContext, email: Option<&str>) -> Result<(), AuthError> {
    match email {
        Some(email) if ctx.claims.is_identity(email) => Ok(()),
        requested => {
            warn!(identity = %ctx.email(), requested = requested.unwrap_or("<none>"), "identity mismatch");
            Err(AuthError::NotOwner)
        }
    }
}
