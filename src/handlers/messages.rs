//! `/Messages`: send, drain the inbound queue, delete or recall

use axum::{
    Json,
    extract::{Path, Query, State},
    response::Response,
};
use serde_json::Value;
use tracing::{debug, info, warn};

use super::{JsonBody, text};
use crate::backend::BackendError;
use crate::error::ApiError;
use crate::router::AppState;
use crate::types::{
    Content, DeleteMessageQuery, MessageBody, MessageRemoval, MessagesQuery, SendMessage, Target,
};
use crate::validate;

/// `POST /Messages`
pub async fn send(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<MessageBody>,
) -> Result<Response, ApiError> {
    let request = validate::send_message(&body, &state.attachments)?;
    let reply = dispatch(&state, &request).await?;
    Ok(text(reply))
}

async fn dispatch(state: &AppState, request: &SendMessage) -> Result<String, ApiError> {
    let SendMessage {
        target,
        content,
        lifetime,
        message_meta,
    } = request;
    let backend = &state.backend;

    match (target, content) {
        (Target::Users(users), Content::Text(message)) => {
            let reply = state
                .call(
                    "send_1to1_message",
                    backend.send_1to1_message(users, message, &lifetime.ttl, &lifetime.bor, message_meta),
                )
                .await
                .map_err(ApiError::backend("Failed to send message"))?;
            info!("1to1 message sent to {} user(s)", users.len());
            Ok(reply)
        }
        (Target::Users(users), Content::Attachment(attachment)) => {
            let reply = state
                .call(
                    "send_1to1_attachment",
                    backend.send_1to1_attachment(
                        users,
                        &attachment.source.as_backend_arg(),
                        &attachment.display_name,
                        &lifetime.ttl,
                        &lifetime.bor,
                    ),
                )
                .await
                .map_err(ApiError::backend("Failed to send attachment"))?;
            info!("1to1 attachment sent to {} user(s)", users.len());
            Ok(reply)
        }
        (Target::Group(vgroupid), Content::Text(message)) => {
            let reply = state
                .call(
                    "send_room_message",
                    backend.send_room_message(vgroupid, message, &lifetime.ttl, &lifetime.bor, message_meta),
                )
                .await
                .map_err(ApiError::backend("Failed to send message"))?;
            info!("Room message sent to {}", vgroupid);
            Ok(reply)
        }
        (Target::Group(vgroupid), Content::Attachment(attachment)) => {
            let reply = state
                .call(
                    "send_room_attachment",
                    backend.send_room_attachment(
                        vgroupid,
                        &attachment.source.as_backend_arg(),
                        &attachment.display_name,
                        &lifetime.ttl,
                        &lifetime.bor,
                    ),
                )
                .await
                .map_err(ApiError::backend("Failed to send attachment"))?;
            info!("Room attachment sent to {}", vgroupid);
            Ok(reply)
        }
    }
}

/// `GET /Messages?count=N`
///
/// Polls the queue `count` times in sequence. Empty slots are skipped; the
/// first failure fails the whole request.
pub async fn receive(
    State(state): State<AppState>,
    Query(query): Query<MessagesQuery>,
) -> Result<Json<Vec<Value>>, ApiError> {
    let count = validate::message_count(query.count.as_deref(), state.config.max_message_count)?;

    let mut messages = Vec::new();
    for _ in 0..count {
        let raw = state
            .call("get_received_message", state.backend.get_received_message())
            .await
            .map_err(ApiError::backend("Failed to retrieve messages"))?;

        if validate::is_empty_message(&raw) {
            continue;
        }

        match serde_json::from_str::<Value>(&raw) {
            Ok(message) => messages.push(message),
            Err(e) => {
                warn!("Received message is not JSON ({} bytes)", raw.len());
                return Err(ApiError::backend("Failed to retrieve messages")(
                    BackendError::Transport(format!("received message is not JSON: {}", e)),
                ));
            }
        }
    }

    debug!("Returning {} of {} polled message(s)", messages.len(), count);
    Ok(Json(messages))
}

/// `DELETE /Messages/{vgroupid}/{message_id}?dorecall=true|false`
pub async fn remove(
    State(state): State<AppState>,
    Path((vgroupid, message_id)): Path<(String, String)>,
    Query(query): Query<DeleteMessageQuery>,
) -> Result<Response, ApiError> {
    match MessageRemoval::from(&query) {
        MessageRemoval::Recall => {
            let reply = state
                .call(
                    "send_recall_message",
                    state.backend.send_recall_message(&vgroupid, &message_id),
                )
                .await
                .map_err(ApiError::backend("Failed to recall message"))?;
            debug!("send_recall_message: {}", reply);
            Ok(text("Recall message sent"))
        }
        MessageRemoval::Delete => {
            let reply = state
                .call(
                    "send_delete_message",
                    state.backend.send_delete_message(&vgroupid, &message_id),
                )
                .await
                .map_err(ApiError::backend("Failed to delete message"))?;
            debug!("send_delete_message: {}", reply);
            Ok(text("Delete message sent"))
        }
    }
}
