//! Request payloads and their validated forms
//!
//! The `*Body` / `*Request` types mirror the JSON callers send and accept
//! anything shaped roughly right. `validate` turns them into the strongly
//! typed values handlers work with.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;

// =============================================================================
// Wire payloads
// =============================================================================

/// `{"name": "..."}` entry used for users, members and masters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserEntry {
    pub name: String,
}

/// Attachment descriptor inside a send-message body
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AttachmentInfo {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub displayname: Option<String>,
}

/// `POST /Messages` body
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessageBody {
    #[serde(default)]
    pub users: Option<Vec<UserEntry>>,
    #[serde(default)]
    pub vgroupid: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub attachment: Option<AttachmentInfo>,
    /// Number or string; see `validate::duration_token`
    #[serde(default)]
    pub ttl: Option<Value>,
    #[serde(default)]
    pub bor: Option<Value>,
    /// Opaque to the gateway, forwarded as JSON text
    #[serde(default)]
    pub messagemeta: Option<Value>,
}

/// `POST /Rooms` body
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RoomBody {
    #[serde(default)]
    pub room: Option<RoomRequest>,
}

/// Room fields, used both for creation and for `POST /Rooms/{id}`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RoomRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub members: Option<Vec<UserEntry>>,
    #[serde(default)]
    pub masters: Option<Vec<UserEntry>>,
    #[serde(default)]
    pub ttl: Option<Value>,
    #[serde(default)]
    pub bor: Option<Value>,
}

/// `POST /GroupConvo` body
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GroupConvoBody {
    #[serde(default)]
    pub groupconvo: Option<GroupConvoRequest>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GroupConvoRequest {
    #[serde(default)]
    pub members: Option<Vec<UserEntry>>,
    #[serde(default)]
    pub ttl: Option<Value>,
    #[serde(default)]
    pub bor: Option<Value>,
}

/// Text fields of a `POST /File` multipart form
#[derive(Debug, Clone, Default)]
pub struct FileForm {
    /// JSON array of user ids
    pub users: Option<String>,
    pub vgroupid: Option<String>,
    pub ttl: Option<String>,
    pub bor: Option<String>,
}

// =============================================================================
// Query parameters
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessagesQuery {
    pub count: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeleteRoomQuery {
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeleteMessageQuery {
    pub dorecall: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CallbackQuery {
    pub callbackurl: Option<String>,
}

// =============================================================================
// Validated requests
// =============================================================================

/// Message self-destruct settings as backend string tokens (`""` = unset)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Lifetime {
    pub ttl: String,
    pub bor: String,
}

/// Who a message goes to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// 1:1 messages to each user
    Users(Vec<String>),
    /// A room or group conversation
    Group(String),
}

/// Where attachment bytes come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttachmentSource {
    Url(String),
    /// File inside the attachments directory
    File(PathBuf),
}

impl AttachmentSource {
    /// Argument handed to the backend
    pub fn as_backend_arg(&self) -> String {
        match self {
            Self::Url(url) => url.clone(),
            Self::File(path) => path.to_string_lossy().into_owned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub source: AttachmentSource,
    pub display_name: String,
}

/// What a message carries
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    Text(String),
    Attachment(Attachment),
}

/// Validated `POST /Messages`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendMessage {
    pub target: Target,
    pub content: Content,
    pub lifetime: Lifetime,
    /// Serialized `messagemeta`, `""` when absent
    pub message_meta: String,
}

/// Validated `POST /Rooms`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRoom {
    pub title: String,
    pub description: String,
    pub members: Vec<String>,
    pub masters: Vec<String>,
    pub lifetime: Lifetime,
}

/// Validated `POST /Rooms/{id}`; empty values mean "leave unchanged"
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoomChanges {
    pub title: String,
    pub description: String,
    pub members: Vec<String>,
    pub masters: Vec<String>,
    pub lifetime: Lifetime,
}

/// Validated `POST /GroupConvo`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewGroupConvo {
    pub members: Vec<String>,
    pub lifetime: Lifetime,
}

/// `DELETE /Rooms/{id}` outcome selector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomExit {
    /// Bot leaves, room stays
    Leave,
    /// Room is removed
    Delete,
}

impl From<&DeleteRoomQuery> for RoomExit {
    fn from(query: &DeleteRoomQuery) -> Self {
        match query.reason.as_deref() {
            Some("leave") => Self::Leave,
            _ => Self::Delete,
        }
    }
}

/// `DELETE /Messages/{vgroupid}/{id}` outcome selector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageRemoval {
    Recall,
    Delete,
}

impl From<&DeleteMessageQuery> for MessageRemoval {
    fn from(query: &DeleteMessageQuery) -> Self {
        match query.dorecall.as_deref() {
            Some("true") => Self::Recall,
            _ => Self::Delete,
        }
    }
}
