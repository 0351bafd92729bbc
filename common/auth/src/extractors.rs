use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::{FromRef, FromRequestParts};
use axum::http::{header::AUTHORIZATION, request::Parts, HeaderMap, HeaderValue};

use crate::claims::Claims;
use crate::error::{AuthError, AuthResult};
use crate::verifier::JwtVerifier;

/// The verified caller. Inserted into request extensions by
/// [`crate::require_identity`]; handlers extract it directly.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub claims: Claims,
    pub token: String,
}

impl AuthContext {
    pub fn email(&self) -> &str {
        self.claims.email()
    }
}

/// Token Verifier: turn request headers into a verified identity.
///
/// No header at all is `MissingAuthorization` (401); anything present but
/// unusable is a 403-class error.
pub fn authenticate(verifier: &JwtVerifier, headers: &HeaderMap) -> AuthResult<AuthContext> {
    let header_value = headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingAuthorization)?;

    let token = parse_bearer(header_value)?;
    let claims = verifier.verify(&token)?;

    Ok(AuthContext { claims, token })
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthContext
where
    Arc<JwtVerifier>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(ctx) = parts.extensions.get::<AuthContext>() {
            return Ok(ctx.clone());
        }

        let verifier = Arc::<JwtVerifier>::from_ref(state);
        authenticate(&verifier, &parts.headers)
    }
}

fn parse_bearer(value: &HeaderValue) -> AuthResult<String> {
    let raw = value
        .to_str()
        .map_err(|_| AuthError::InvalidAuthorization)?
        .trim();

    let token = raw
        .strip_prefix("Bearer ")
        .ok_or(AuthError::InvalidAuthorization)?
        .trim();

    if token.is_empty() {
        return Err(AuthError::InvalidAuthorization);
    }

    Ok(token.to_owned())
}
