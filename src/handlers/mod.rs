//! Resource handlers
//!
//! Each handler validates its payload, makes one (or, for message
//! draining, a bounded series of) backend call(s) and maps the reply.

pub mod callbacks;
pub mod directory;
pub mod files;
pub mod group_convo;
pub mod messages;
pub mod rooms;
pub mod statistics;

use axum::{
    body::Bytes,
    extract::{FromRequest, Request},
    http::header,
    response::{IntoResponse, Response},
};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::ApiError;

/// JSON body extractor with the gateway's error mapping.
///
/// An empty body counts as `{}`. Syntax errors are `InvalidJson`; JSON of
/// the wrong shape is a validation error.
#[derive(Debug)]
pub struct JsonBody<T>(pub T);

impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| ApiError::body_rejection(e.status(), e.body_text()))?;
        parse_body(&bytes).map(JsonBody)
    }
}

/// Parse a request body the way [`JsonBody`] does
pub fn parse_body<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, ApiError> {
    let value: Value = if bytes.iter().all(u8::is_ascii_whitespace) {
        Value::Object(Default::default())
    } else {
        serde_json::from_slice(bytes).map_err(|e| ApiError::InvalidJson(e.to_string()))?
    };

    serde_json::from_value(value)
        .map_err(|e| ApiError::validation(format!("Invalid request body: {}", e)))
}

/// Plain-text response
pub fn text(body: impl Into<String>) -> Response {
    body.into().into_response()
}

/// Re-emit a backend reply as JSON when it is JSON, as text otherwise
pub fn json_or_text(raw: String) -> Response {
    if serde_json::from_str::<Value>(&raw).is_ok() {
        ([(header::CONTENT_TYPE, "application/json")], raw).into_response()
    } else {
        text(raw)
    }
}
