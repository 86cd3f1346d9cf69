//! `/GroupConvo`: ad-hoc group conversations

use axum::{
    extract::{Path, State},
    response::Response,
};
use tracing::{debug, info};

use super::{JsonBody, json_or_text, text};
use crate::error::ApiError;
use crate::router::AppState;
use crate::types::GroupConvoBody;
use crate::validate;

/// `POST /GroupConvo`
pub async fn create(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<GroupConvoBody>,
) -> Result<Response, ApiError> {
    let convo = validate::new_group_convo(&body)?;

    let reply = state
        .call(
            "add_group_convo",
            state.backend.add_group_convo(
                &convo.members,
                &convo.lifetime.ttl,
                &convo.lifetime.bor,
            ),
        )
        .await
        .map_err(ApiError::backend("Failed to create group conversation"))?;

    info!("Group conversation created with {} member(s)", convo.members.len());
    Ok(json_or_text(reply))
}

/// `GET /GroupConvo`
pub async fn list(State(state): State<AppState>) -> Result<Response, ApiError> {
    let reply = state
        .call("get_group_convos", state.backend.get_group_convos())
        .await
        .map_err(ApiError::backend("Failed to retrieve group conversations"))?;
    Ok(json_or_text(reply))
}

/// `GET /GroupConvo/{vgroupid}`
pub async fn get_one(
    State(state): State<AppState>,
    Path(vgroupid): Path<String>,
) -> Result<Response, ApiError> {
    let reply = state
        .call("get_group_convo", state.backend.get_group_convo(&vgroupid))
        .await
        .map_err(ApiError::backend("Failed to retrieve group conversation"))?;
    Ok(json_or_text(reply))
}

/// `DELETE /GroupConvo/{vgroupid}`: the bot leaves the conversation
pub async fn remove(
    State(state): State<AppState>,
    Path(vgroupid): Path<String>,
) -> Result<Response, ApiError> {
    let reply = state
        .call(
            "delete_group_convo",
            state.backend.delete_group_convo(&vgroupid),
        )
        .await
        .map_err(ApiError::backend("Failed to leave group conversation"))?;

    debug!("delete_group_convo: {}", reply);
    Ok(text(format!(
        "{} has left the GroupConvo.",
        state.config.bot_username
    )))
}
