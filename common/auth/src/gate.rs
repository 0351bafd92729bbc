use std::sync::Arc;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use tracing::warn;

use crate::error::AuthError;
use crate::extractors::authenticate;
use crate::verifier::JwtVerifier;

/// Identity gate. Verifies the bearer token and binds the resulting
/// [`crate::AuthContext`] into request extensions, or short-circuits with
/// 401/403 before any downstream gate or handler runs.
///
/// Mount with `axum::middleware::from_fn_with_state(verifier, require_identity)`.
pub async fn require_identity(
    State(verifier): State<Arc<JwtVerifier>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let ctx = authenticate(&verifier, req.headers()).map_err(|err| {
        warn!(path = %req.uri().path(), error = %err, "identity gate rejected request");
        err
    })?;
    req.extensions_mut().insert(ctx);
    Ok(next.run(req).await)
}
