//! `/MsgRecvCallback`: inbound-message webhook registration

use axum::{
    extract::{Query, State},
    response::Response,
};
use tracing::info;

use super::text;
use crate::error::ApiError;
use crate::router::AppState;
use crate::types::CallbackQuery;
use crate::validate;

/// `POST /MsgRecvCallback?callbackurl=...`
pub async fn set_callback(
    State(state): State<AppState>,
    Query(query): Query<CallbackQuery>,
) -> Result<Response, ApiError> {
    let url = validate::callback_url(&query)?;

    let reply = state
        .call("set_msg_callback", state.backend.set_msg_callback(&url))
        .await
        .map_err(ApiError::backend("Failed to set message callback"))?;

    info!("🔔 Message callback set to {}", url);
    Ok(text(reply))
}

/// `GET /MsgRecvCallback`
pub async fn get_callback(State(state): State<AppState>) -> Result<Response, ApiError> {
    let reply = state
        .call("get_msg_callback", state.backend.get_msg_callback())
        .await
        .map_err(ApiError::backend("Failed to retrieve message callback"))?;
    Ok(text(reply))
}

/// `DELETE /MsgRecvCallback`
pub async fn delete_callback(State(state): State<AppState>) -> Result<Response, ApiError> {
    let reply = state
        .call("delete_msg_callback", state.backend.delete_msg_callback())
        .await
        .map_err(ApiError::backend("Failed to delete message callback"))?;

    info!("🔕 Message callback removed");
    Ok(text(reply))
}
