//! Error types and their HTTP mapping

use axum::{
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use tracing::{error, warn};

use crate::attachments::AttachmentError;
use crate::backend::BackendError;

/// Hint sent with every 401 so callers know which scheme is expected
pub const AUTH_HINT: &str = "Basic realm=\"bot-web-api\", charset=\"UTF-8\"";

/// Why a request failed authentication
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFailure {
    /// `Authorization` missing or not `Basic <token>` / bare token
    MalformedHeader,
    /// Decoded token does not match the configured secret
    InvalidToken,
    /// `x-api-key` missing or wrong on the current namespace
    InvalidApiKey,
}

impl AuthFailure {
    pub fn message(self) -> &'static str {
        match self {
            Self::MalformedHeader => {
                "Access denied: invalid Authorization Header format. Correct format: \"Authorization: Basic base64_auth_token\""
            }
            Self::InvalidToken => "Access denied: invalid basic-auth token.",
            Self::InvalidApiKey => "Access denied: invalid api-key.",
        }
    }
}

/// Everything a handler can answer with besides success
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Body is not valid JSON
    #[error("Invalid JSON format in request body: {0}")]
    InvalidJson(String),

    /// Credentials missing or wrong
    #[error("{}", .0.message())]
    Unauthorized(AuthFailure),

    /// Payload failed resource-specific validation
    #[error("{0}")]
    Validation(String),

    /// Body exceeds the configured upload limit
    #[error("{0}")]
    PayloadTooLarge(String),

    /// Backend call failed; `context` is what the caller sees
    #[error("{context}")]
    Backend {
        context: &'static str,
        #[source]
        source: BackendError,
    },

    /// Attachment staging failed on local disk
    #[error("Failed to store attachment")]
    Storage(#[from] AttachmentError),

    /// No route for this method and path
    #[error("Endpoint {0} not found")]
    NotFound(String),
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Map an axum body rejection; oversized bodies keep their 413
    pub fn body_rejection(status: StatusCode, message: String) -> Self {
        if status == StatusCode::PAYLOAD_TOO_LARGE {
            Self::PayloadTooLarge(message)
        } else {
            Self::Validation(message)
        }
    }

    /// Build a mapper for `map_err` that hides backend detail behind `context`
    pub fn backend(context: &'static str) -> impl FnOnce(BackendError) -> Self {
        move |source| Self::Backend { context, source }
    }

    /// HTTP status for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidJson(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Backend { .. } => StatusCode::BAD_REQUEST,
            Self::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            Self::Backend { context, source } => error!("{}: {}", context, source),
            Self::Storage(e) => error!("Attachment storage failed: {}", e),
            Self::Validation(message) => warn!("Rejected request: {}", message),
            _ => {}
        }

        let status = self.status_code();
        let mut response = (status, self.to_string()).into_response();
        if let Self::Unauthorized(_) = self {
            response.headers_mut().insert(
                header::WWW_AUTHENTICATE,
                HeaderValue::from_static(AUTH_HINT),
            );
        }
        response
    }
}
