use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

pub type AuthResult<T> = Result<T, AuthError>;

pub const UNAUTHORIZED_MESSAGE: &str = "unauthorized access";
pub const FORBIDDEN_MESSAGE: &str = "forbidden access";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("authorization header missing")]
    MissingAuthorization,
    #[error("authorization header malformed")]
    InvalidAuthorization,
    #[error("token verification failed: {0}")]
    Verification(String),
    #[error("token expired")]
    Expired,
    #[error("invalid claim '{0}' with value '{1}'")]
    InvalidClaim(&'static str, String),
    #[error("malformed claim payload: {0}")]
    InvalidJson(String),
    #[error("no registered user for '{0}'")]
    UnknownIdentity(String),
    #[error("caller lacks required role '{0}'")]
    Forbidden(&'static str),
    #[error("request names another identity")]
    NotOwner,
    #[error("failed to sign token: {0}")]
    Signing(String),
}

impl AuthError {
    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::MissingAuthorization => StatusCode::UNAUTHORIZED,
            AuthError::Signing(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AuthError::InvalidAuthorization
            | AuthError::Verification(_)
            | AuthError::Expired
            | AuthError::InvalidClaim(_, _)
            | AuthError::InvalidJson(_)
            | AuthError::UnknownIdentity(_)
            | AuthError::Forbidden(_)
            | AuthError::NotOwner => StatusCode::FORBIDDEN,
        }
    }

    /// Value of the `X-Error-Code` header; used as a metrics label.
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::MissingAuthorization => "unauthorized",
            AuthError::InvalidAuthorization
            | AuthError::Verification(_)
            | AuthError::Expired
            | AuthError::InvalidClaim(_, _)
            | AuthError::InvalidJson(_) => "forbidden_token",
            AuthError::UnknownIdentity(_) => "unknown_identity",
            AuthError::Forbidden(_) => "forbidden_role",
            AuthError::NotOwner => "forbidden_owner",
            AuthError::Signing(_) => "token_signing",
        }
    }
}

impl From<jsonwebtoken::errors::Error> for AuthError {
    fn from(value: jsonwebtoken::errors::Error) -> Self {
        match value.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => Self::Expired,
            _ => Self::Verification(value.to_string()),
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    message: &'static str,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status();
        let mut resp = match status {
            StatusCode::UNAUTHORIZED => (status, UNAUTHORIZED_MESSAGE).into_response(),
            StatusCode::FORBIDDEN => (
                status,
                Json(ErrorBody {
                    message: FORBIDDEN_MESSAGE,
                }),
            )
                .into_response(),
            _ => {
                tracing::error!(error = %self, "token issuance failed");
                status.into_response()
            }
        };
        resp.headers_mut()
            .insert("X-Error-Code", HeaderValue::from_static(self.code()));
        resp
    }
}
