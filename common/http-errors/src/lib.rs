use axum::{
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use common_auth::AuthError;
use serde::Serialize;

#[derive(Serialize, Debug)]
pub struct ErrorBody {
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug)]
pub enum ApiError {
    /// Gate failures keep their own 401/403 rendering.
    Auth(AuthError),
    BadRequest { code: &'static str, message: Option<String> },
    Conflict { code: &'static str, message: Option<String> },
    /// Store or payment-provider failure. Rendered opaquely.
    Upstream { source: &'static str, message: String },
}

impl ApiError {
    pub fn bad_request(code: &'static str, message: impl Into<String>) -> Self {
        Self::BadRequest { code, message: Some(message.into()) }
    }

    pub fn conflict(code: &'static str, message: impl Into<String>) -> Self {
        Self::Conflict { code, message: Some(message.into()) }
    }

    pub fn upstream<E: std::fmt::Display>(source: &'static str, e: E) -> Self {
        Self::Upstream { source, message: e.to_string() }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Auth(err) => err.status(),
            ApiError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            ApiError::Conflict { .. } => StatusCode::CONFLICT,
            ApiError::Upstream { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(value: AuthError) -> Self {
        Self::Auth(value)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body, error_code) = match self {
            ApiError::Auth(err) => return err.into_response(),
            ApiError::BadRequest { code, message } => (
                StatusCode::BAD_REQUEST,
                Some(ErrorBody { code: code.into(), message }),
                code,
            ),
            ApiError::Conflict { code, message } => (
                StatusCode::CONFLICT,
                Some(ErrorBody { code: code.into(), message }),
                code,
            ),
            ApiError::Upstream { source, message } => {
                tracing::error!(source, error = %message, "upstream failure");
                (StatusCode::INTERNAL_SERVER_ERROR, None, "internal_error")
            }
        };
        let mut resp = match body {
            Some(body) => (status, Json(body)).into_response(),
            None => status.into_response(),
        };
        if let Ok(val) = HeaderValue::from_str(error_code) {
            resp.headers_mut().insert("X-Error-Code", val);
        }
        resp
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
