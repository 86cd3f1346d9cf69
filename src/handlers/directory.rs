//! `/Directory`

use axum::{extract::State, response::Response};

use super::json_or_text;
use crate::error::ApiError;
use crate::router::AppState;

/// `GET /Directory`
pub async fn get_directory(State(state): State<AppState>) -> Result<Response, ApiError> {
    let reply = state
        .call("get_directory", state.backend.get_directory())
        .await
        .map_err(ApiError::backend("Failed to retrieve directory"))?;
    Ok(json_or_text(reply))
}
