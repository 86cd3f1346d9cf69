//! `/Rooms`: secure room lifecycle

use axum::{
    extract::{Path, Query, State},
    response::Response,
};
use tracing::{debug, info};

use super::{JsonBody, json_or_text, text};
use crate::error::ApiError;
use crate::router::AppState;
use crate::types::{DeleteRoomQuery, RoomBody, RoomExit, RoomRequest};
use crate::validate;

/// `POST /Rooms`
pub async fn create(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<RoomBody>,
) -> Result<Response, ApiError> {
    let room = validate::new_room(&body)?;

    let reply = state
        .call(
            "add_room",
            state.backend.add_room(
                &room.members,
                &room.masters,
                &room.title,
                &room.description,
                &room.lifetime.ttl,
                &room.lifetime.bor,
            ),
        )
        .await
        .map_err(ApiError::backend("Failed to create room"))?;

    info!(
        "Room created with {} member(s), {} master(s)",
        room.members.len(),
        room.masters.len()
    );
    Ok(json_or_text(reply))
}

/// `GET /Rooms`
pub async fn list(State(state): State<AppState>) -> Result<Response, ApiError> {
    let reply = state
        .call("get_rooms", state.backend.get_rooms())
        .await
        .map_err(ApiError::backend("Failed to retrieve rooms"))?;
    Ok(json_or_text(reply))
}

/// `GET /Rooms/{vgroupid}`
pub async fn get_one(
    State(state): State<AppState>,
    Path(vgroupid): Path<String>,
) -> Result<Response, ApiError> {
    let reply = state
        .call("get_room", state.backend.get_room(&vgroupid))
        .await
        .map_err(ApiError::backend("Failed to retrieve room"))?;
    Ok(json_or_text(reply))
}

/// `POST /Rooms/{vgroupid}`: only supplied fields change
pub async fn modify(
    State(state): State<AppState>,
    Path(vgroupid): Path<String>,
    JsonBody(body): JsonBody<RoomRequest>,
) -> Result<Response, ApiError> {
    let changes = validate::room_changes(&body)?;

    let reply = state
        .call(
            "modify_room",
            state.backend.modify_room(
                &vgroupid,
                &changes.members,
                &changes.masters,
                &changes.title,
                &changes.description,
                &changes.lifetime.ttl,
                &changes.lifetime.bor,
            ),
        )
        .await
        .map_err(ApiError::backend("Failed to modify room"))?;

    debug!("modify_room: {}", reply);
    Ok(text("Room modified successfully"))
}

/// `DELETE /Rooms/{vgroupid}?reason=leave`
pub async fn remove(
    State(state): State<AppState>,
    Path(vgroupid): Path<String>,
    Query(query): Query<DeleteRoomQuery>,
) -> Result<Response, ApiError> {
    match RoomExit::from(&query) {
        RoomExit::Leave => {
            let reply = state
                .call("leave_room", state.backend.leave_room(&vgroupid))
                .await
                .map_err(ApiError::backend("Failed to leave room"))?;
            debug!("leave_room: {}", reply);
            Ok(text(format!(
                "{} left room successfully",
                state.config.bot_username
            )))
        }
        RoomExit::Delete => {
            let reply = state
                .call("delete_room", state.backend.delete_room(&vgroupid))
                .await
                .map_err(ApiError::backend("Failed to delete room"))?;
            debug!("delete_room: {}", reply);
            Ok(text("Room deleted successfully"))
        }
    }
}
