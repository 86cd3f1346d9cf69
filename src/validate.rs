//! Per-resource payload validation
//!
//! Every check here runs before the backend is touched. Failures become
//! `ApiError::Validation` (HTTP 400) with a message naming what is wrong.

use serde::Deserialize;
use serde_json::Value;
use std::num::IntErrorKind;

use crate::attachments::AttachmentStore;
use crate::error::ApiError;
use crate::types::*;

pub const MISSING_TARGET: &str = "Need a list of users OR a vGroupID to send a message.";
pub const MISSING_CONTENT: &str = "Need a message OR an attachment to send a message.";
pub const BOTH_TARGETS: &str = "Send to a list of users OR a vGroupID, not both.";
pub const BOTH_CONTENTS: &str = "Send a message OR an attachment, not both.";
pub const MISSING_DISPLAYNAME: &str = "Attachment displayname must be set.";
pub const MISSING_ATTACHMENT_SOURCE: &str = "Attachment must include a url or a filename.";
pub const OUTSIDE_ATTACHMENTS: &str = "Path of file must be within the attachments directory";
pub const MISSING_ROOM: &str = "Cannot process request without a room object";
pub const INCOMPLETE_ROOM: &str = "To Create a secure room you must at least send the following Arguments: Title, description, members and masters.";
pub const MISSING_GROUP_CONVO: &str = "Cannot process request without a groupconvo object";
pub const MISSING_GROUP_MEMBERS: &str = "An array of GroupConvo members is required";
pub const INVALID_COUNT: &str = "Invalid count parameter. Must be a number greater than 0.";
pub const MISSING_UPLOAD: &str = "No attachment included in request";
pub const INVALID_USERS_JSON: &str = "error processing users JSON data";
pub const INVALID_FILENAME: &str = "Attachment filename is not valid";
pub const MISSING_CALLBACK: &str = "callbackurl query parameter is required";
pub const INVALID_CALLBACK: &str = "callbackurl must be an absolute http or https URL";

/// Turn a `ttl` / `bor` value into the backend's string token.
///
/// Numbers and strings keep their text. `0`, `""`, `null`, `false` and
/// absence all mean "unset" and become `""`; a TTL of zero can therefore
/// not be expressed. `true`, objects and arrays are rejected.
pub fn duration_token(field: &str, value: Option<&Value>) -> Result<String, ApiError> {
    match value {
        None | Some(Value::Null) | Some(Value::Bool(false)) => Ok(String::new()),
        Some(Value::Number(n)) if n.as_f64() == Some(0.0) => Ok(String::new()),
        Some(Value::Number(n)) => Ok(n.to_string()),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(ApiError::validation(format!(
            "{} must be a number or a string",
            field
        ))),
    }
}

pub fn lifetime(ttl: Option<&Value>, bor: Option<&Value>) -> Result<Lifetime, ApiError> {
    Ok(Lifetime {
        ttl: duration_token("ttl", ttl)?,
        bor: duration_token("bor", bor)?,
    })
}

/// Names out of `[{"name": ..}]`; blank names are rejected
pub fn user_names(entries: &[UserEntry]) -> Result<Vec<String>, ApiError> {
    entries
        .iter()
        .map(|entry| {
            let name = entry.name.trim();
            if name.is_empty() {
                Err(ApiError::validation("Every user entry needs a non-empty name"))
            } else {
                Ok(name.to_string())
            }
        })
        .collect()
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn target(users: Option<&[UserEntry]>, vgroupid: Option<&str>) -> Result<Target, ApiError> {
    let users = users.filter(|u| !u.is_empty());
    match (users, non_empty(vgroupid)) {
        (Some(_), Some(_)) => Err(ApiError::validation(BOTH_TARGETS)),
        (Some(users), None) => Ok(Target::Users(user_names(users)?)),
        (None, Some(group)) => Ok(Target::Group(group.to_string())),
        (None, None) => Err(ApiError::validation(MISSING_TARGET)),
    }
}

fn attachment(info: &AttachmentInfo, store: &AttachmentStore) -> Result<Attachment, ApiError> {
    let display_name = non_empty(info.displayname.as_deref()).map(str::to_string);

    if let Some(url) = non_empty(info.url.as_deref()) {
        let display_name = display_name.ok_or_else(|| ApiError::validation(MISSING_DISPLAYNAME))?;
        return Ok(Attachment {
            source: AttachmentSource::Url(url.to_string()),
            display_name,
        });
    }

    let filename = non_empty(info.filename.as_deref())
        .ok_or_else(|| ApiError::validation(MISSING_ATTACHMENT_SOURCE))?;
    let path = store
        .resolve(filename)
        .ok_or_else(|| ApiError::validation(OUTSIDE_ATTACHMENTS))?;

    Ok(Attachment {
        source: AttachmentSource::File(path),
        display_name: display_name.unwrap_or_default(),
    })
}

/// Validate `POST /Messages`
pub fn send_message(body: &MessageBody, store: &AttachmentStore) -> Result<SendMessage, ApiError> {
    let target = target(body.users.as_deref(), body.vgroupid.as_deref())?;

    let text = body.message.as_deref().filter(|m| !m.is_empty());
    let content = match (text, body.attachment.as_ref()) {
        (Some(_), Some(_)) => return Err(ApiError::validation(BOTH_CONTENTS)),
        (Some(text), None) => Content::Text(text.to_string()),
        (None, Some(info)) => Content::Attachment(attachment(info, store)?),
        (None, None) => return Err(ApiError::validation(MISSING_CONTENT)),
    };

    let message_meta = match &body.messagemeta {
        None | Some(Value::Null) => String::new(),
        Some(meta) => serde_json::to_string(meta)
            .map_err(|e| ApiError::validation(format!("messagemeta is not serializable: {}", e)))?,
    };

    Ok(SendMessage {
        target,
        content,
        lifetime: lifetime(body.ttl.as_ref(), body.bor.as_ref())?,
        message_meta,
    })
}

/// Validate `POST /Rooms`
pub fn new_room(body: &RoomBody) -> Result<NewRoom, ApiError> {
    let room = body
        .room
        .as_ref()
        .ok_or_else(|| ApiError::validation(MISSING_ROOM))?;

    let incomplete = || ApiError::validation(INCOMPLETE_ROOM);
    let title = non_empty(room.title.as_deref()).ok_or_else(incomplete)?;
    let description = non_empty(room.description.as_deref()).ok_or_else(incomplete)?;
    let members = room
        .members
        .as_deref()
        .filter(|m| !m.is_empty())
        .ok_or_else(incomplete)?;
    let masters = room
        .masters
        .as_deref()
        .filter(|m| !m.is_empty())
        .ok_or_else(incomplete)?;

    Ok(NewRoom {
        title: title.to_string(),
        description: description.to_string(),
        members: user_names(members)?,
        masters: user_names(masters)?,
        lifetime: lifetime(room.ttl.as_ref(), room.bor.as_ref())?,
    })
}

/// Validate `POST /Rooms/{id}`; nothing is mandatory
pub fn room_changes(body: &RoomRequest) -> Result<RoomChanges, ApiError> {
    Ok(RoomChanges {
        title: body.title.clone().unwrap_or_default(),
        description: body.description.clone().unwrap_or_default(),
        members: user_names(body.members.as_deref().unwrap_or_default())?,
        masters: user_names(body.masters.as_deref().unwrap_or_default())?,
        lifetime: lifetime(body.ttl.as_ref(), body.bor.as_ref())?,
    })
}

/// Validate `POST /GroupConvo`
pub fn new_group_convo(body: &GroupConvoBody) -> Result<NewGroupConvo, ApiError> {
    let convo = body
        .groupconvo
        .as_ref()
        .ok_or_else(|| ApiError::validation(MISSING_GROUP_CONVO))?;
    let members = convo
        .members
        .as_deref()
        .filter(|m| !m.is_empty())
        .ok_or_else(|| ApiError::validation(MISSING_GROUP_MEMBERS))?;

    Ok(NewGroupConvo {
        members: user_names(members)?,
        lifetime: lifetime(convo.ttl.as_ref(), convo.bor.as_ref())?,
    })
}

/// How many queued messages `GET /Messages` may drain.
///
/// Defaults to 1, clamps to `max`, rejects anything non-numeric or below 1.
pub fn message_count(raw: Option<&str>, max: usize) -> Result<usize, ApiError> {
    let Some(raw) = raw.map(str::trim).filter(|r| !r.is_empty()) else {
        return Ok(1.min(max));
    };

    match raw.parse::<u64>() {
        Ok(0) => Err(ApiError::validation(INVALID_COUNT)),
        Ok(n) => Ok(usize::try_from(n).unwrap_or(usize::MAX).min(max)),
        Err(e) if *e.kind() == IntErrorKind::PosOverflow => Ok(max),
        Err(_) => Err(ApiError::validation(INVALID_COUNT)),
    }
}

/// A drained queue slot that holds no message
pub fn is_empty_message(raw: &str) -> bool {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return true;
    }
    matches!(
        serde_json::from_str::<Value>(trimmed),
        Ok(Value::Object(map)) if map.is_empty()
    ) || matches!(serde_json::from_str::<Value>(trimmed), Ok(Value::String(s)) if s.is_empty())
}

/// Entry of the `users` multipart field: a bare id or `{"name": id}`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum UploadUser {
    Id(String),
    Entry(UserEntry),
}

/// Validate the text fields of `POST /File`
pub fn file_target(form: &FileForm) -> Result<Target, ApiError> {
    match (non_empty(form.users.as_deref()), non_empty(form.vgroupid.as_deref())) {
        (Some(_), Some(_)) => Err(ApiError::validation(BOTH_TARGETS)),
        (None, None) => Err(ApiError::validation(MISSING_TARGET)),
        (None, Some(group)) => Ok(Target::Group(group.to_string())),
        (Some(users), None) => {
            let parsed: Vec<UploadUser> = serde_json::from_str(users)
                .map_err(|_| ApiError::validation(INVALID_USERS_JSON))?;
            let ids: Vec<String> = parsed
                .into_iter()
                .map(|u| match u {
                    UploadUser::Id(id) => id,
                    UploadUser::Entry(entry) => entry.name,
                })
                .map(|id| id.trim().to_string())
                .collect();
            if ids.is_empty() || ids.iter().any(String::is_empty) {
                return Err(ApiError::validation(INVALID_USERS_JSON));
            }
            Ok(Target::Users(ids))
        }
    }
}

/// Lifetime tokens from multipart text fields (taken verbatim)
pub fn file_lifetime(form: &FileForm) -> Lifetime {
    Lifetime {
        ttl: form.ttl.clone().unwrap_or_default(),
        bor: form.bor.clone().unwrap_or_default(),
    }
}

/// Validate `POST /MsgRecvCallback?callbackurl=`
pub fn callback_url(query: &CallbackQuery) -> Result<String, ApiError> {
    let raw = non_empty(query.callbackurl.as_deref())
        .ok_or_else(|| ApiError::validation(MISSING_CALLBACK))?;
    let parsed = url::Url::parse(raw).map_err(|_| ApiError::validation(INVALID_CALLBACK))?;
    if !matches!(parsed.scheme(), "http" | "https") || !parsed.has_host() {
        return Err(ApiError::validation(INVALID_CALLBACK));
    }
    Ok(raw.to_string())
}
