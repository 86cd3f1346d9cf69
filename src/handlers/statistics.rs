//! `/Statistics`

use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
};
use serde_json::Value;
use tracing::debug;

use super::text;
use crate::error::ApiError;
use crate::router::AppState;

/// `GET /Statistics`
pub async fn get_statistics(State(state): State<AppState>) -> Result<Response, ApiError> {
    let reply = state
        .call("get_statistics", state.backend.get_statistics())
        .await
        .map_err(ApiError::backend("Failed to retrieve statistics"))?;
    Ok(statistics_response(reply))
}

/// JSON only when the reply carries a top-level `statistics` key
fn statistics_response(raw: String) -> Response {
    match serde_json::from_str::<Value>(&raw) {
        Ok(Value::Object(map)) if map.contains_key("statistics") => {
            ([(header::CONTENT_TYPE, "application/json")], raw).into_response()
        }
        _ => {
            debug!("Statistics reply is not a statistics object, returning text");
            text(raw)
        }
    }
}

/// `DELETE /Statistics`
pub async fn clear_statistics(State(state): State<AppState>) -> Result<Response, ApiError> {
    let reply = state
        .call("clear_statistics", state.backend.clear_statistics())
        .await
        .map_err(ApiError::backend("Failed to clear statistics"))?;

    debug!("clear_statistics: {}", reply);
    Ok(text("statistics cleared successfully"))
}
