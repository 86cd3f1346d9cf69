//! `POST /File`: upload an attachment and send it

use axum::{
    extract::{Multipart, State, multipart::Field},
    response::Response,
};
use tracing::{debug, info, warn};

use super::text;
use crate::attachments::{StagedUpload, sanitize_filename};
use crate::error::ApiError;
use crate::router::AppState;
use crate::types::{FileForm, Target};
use crate::validate;

/// Multipart field carrying the file
const FILE_FIELD: &str = "attachment";

/// Staged upload plus the name the client gave it
struct ReceivedFile {
    staged: StagedUpload,
    original_name: Option<String>,
}

/// `POST /File` (multipart: `attachment`, `users` | `vgroupid`, `ttl`, `bor`)
pub async fn upload_and_send(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Response, ApiError> {
    let mut form = FileForm::default();
    let mut received: Option<ReceivedFile> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::body_rejection(e.status(), e.body_text()))?
    {
        match field.name() {
            Some(FILE_FIELD) => {
                let original_name = field.file_name().map(str::to_string);
                let staged = stage_field(&state, field).await?;
                // A repeated file part replaces the earlier one, which is dropped and removed
                received = Some(ReceivedFile {
                    staged,
                    original_name,
                });
            }
            Some("users") => form.users = Some(field_text(field).await?),
            Some("vgroupid") => form.vgroupid = Some(field_text(field).await?),
            Some("ttl") => form.ttl = Some(field_text(field).await?),
            Some("bor") => form.bor = Some(field_text(field).await?),
            other => debug!("Ignoring multipart field {:?}", other),
        }
    }

    let target = validate::file_target(&form)?;
    let Some(ReceivedFile {
        staged,
        original_name,
    }) = received
    else {
        warn!("File upload without an attachment part");
        return Err(ApiError::validation(validate::MISSING_UPLOAD));
    };

    let filename = original_name
        .as_deref()
        .and_then(sanitize_filename)
        .ok_or_else(|| ApiError::validation(validate::INVALID_FILENAME))?;

    let size = staged.size();
    let stored = state.attachments.commit(staged, &filename).await?;
    let stored = stored.to_string_lossy().into_owned();
    info!("Sending uploaded attachment {} ({} bytes)", filename, size);

    let lifetime = validate::file_lifetime(&form);
    let backend = &state.backend;
    let reply = match &target {
        Target::Group(vgroupid) => state
            .call(
                "send_room_attachment",
                backend.send_room_attachment(vgroupid, &stored, &filename, &lifetime.ttl, &lifetime.bor),
            )
            .await
            .map_err(ApiError::backend("Failed to send attachment"))?,
        Target::Users(users) => state
            .call(
                "send_1to1_attachment",
                backend.send_1to1_attachment(users, &stored, &filename, &lifetime.ttl, &lifetime.bor),
            )
            .await
            .map_err(ApiError::backend("Failed to send attachment"))?,
    };

    Ok(text(reply))
}

async fn stage_field(state: &AppState, mut field: Field<'_>) -> Result<StagedUpload, ApiError> {
    let mut staged = state.attachments.stage().await?;
    while let Some(chunk) = field
        .chunk()
        .await
        .map_err(|e| ApiError::body_rejection(e.status(), e.body_text()))?
    {
        staged.write(&chunk).await?;
    }
    Ok(staged)
}

async fn field_text(field: Field<'_>) -> Result<String, ApiError> {
    field
        .text()
        .await
        .map_err(|e| ApiError::body_rejection(e.status(), e.body_text()))
}
