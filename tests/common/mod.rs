// ============================================================================
// Shared test harness
// ============================================================================
//
// - StubBackend: records every command and replays scripted replies;
//   rooms it creates can be fetched back by id
// - app(): full application with test credentials
// - request helpers driving the router through tower's oneshot
//
// ============================================================================

#![allow(dead_code)]

use std::collections::{HashMap, HashSet, VecDeque};
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Method, Request, Response, header},
};
use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use http_body_util::BodyExt;
use parking_lot::Mutex;
use serde_json::{Value, json};
use tower::ServiceExt;

use bot_web_api::{
    ApiConfig, App, AppState, BackendError, BackendResult, MessagingBackend, build_app,
};

pub const BOT: &str = "testbot";
pub const API_KEY: &str = "test-api-key";
pub const AUTH_TOKEN: &str = "test-auth-token";

pub const V1: &str = "/WickrIO/V1/Apps/test-api-key";
pub const V2: &str = "/WickrIO/V2/Apps";

/// One recorded backend command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub command: &'static str,
    pub args: Vec<String>,
}

/// In-memory backend that records calls and returns scripted replies.
///
/// Unscripted commands answer `"Success"`, except the inbound queue which
/// answers `""` (empty). Unscripted `add_room` creates a room that an
/// unscripted `get_room` returns.
#[derive(Default)]
pub struct StubBackend {
    calls: Mutex<Vec<Call>>,
    replies: Mutex<HashMap<&'static str, VecDeque<String>>>,
    failing: Mutex<HashSet<&'static str>>,
    rooms: Mutex<HashMap<String, Value>>,
}

impl StubBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Queue a reply for `command`
    pub fn reply(&self, command: &'static str, reply: impl Into<String>) {
        self.replies
            .lock()
            .entry(command)
            .or_default()
            .push_back(reply.into());
    }

    /// Make every call to `command` fail
    pub fn fail(&self, command: &'static str) {
        self.failing.lock().insert(command);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub fn calls_to(&self, command: &str) -> Vec<Call> {
        self.calls
            .lock()
            .iter()
            .filter(|c| c.command == command)
            .cloned()
            .collect()
    }

    /// Record a call; `Ok(None)` when no reply was scripted
    fn record_call(
        &self,
        command: &'static str,
        args: Vec<String>,
    ) -> Result<Option<String>, BackendError> {
        self.calls.lock().push(Call { command, args });

        if self.failing.lock().contains(command) {
            return Err(BackendError::Rejected {
                command,
                message: "scripted failure".to_string(),
            });
        }

        Ok(self
            .replies
            .lock()
            .get_mut(command)
            .and_then(VecDeque::pop_front))
    }

    fn record(&self, command: &'static str, args: Vec<String>) -> BackendResult {
        let scripted = self.record_call(command, args)?;
        Ok(scripted.unwrap_or_else(|| match command {
            "get_received_message" => String::new(),
            _ => "Success".to_string(),
        }))
    }
}

fn list(values: &[String]) -> String {
    values.join(",")
}

fn entries(names: &[String]) -> Value {
    names.iter().map(|name| json!({ "name": name })).collect()
}

#[async_trait]
impl MessagingBackend for StubBackend {
    async fn send_1to1_message(
        &self,
        users: &[String],
        message: &str,
        ttl: &str,
        bor: &str,
        message_meta: &str,
    ) -> BackendResult {
        self.record(
            "send_1to1_message",
            vec![list(users), message.into(), ttl.into(), bor.into(), message_meta.into()],
        )
    }

    async fn send_1to1_attachment(
        &self,
        users: &[String],
        attachment: &str,
        display_name: &str,
        ttl: &str,
        bor: &str,
    ) -> BackendResult {
        self.record(
            "send_1to1_attachment",
            vec![list(users), attachment.into(), display_name.into(), ttl.into(), bor.into()],
        )
    }

    async fn send_room_message(
        &self,
        vgroupid: &str,
        message: &str,
        ttl: &str,
        bor: &str,
        message_meta: &str,
    ) -> BackendResult {
        self.record(
            "send_room_message",
            vec![vgroupid.into(), message.into(), ttl.into(), bor.into(), message_meta.into()],
        )
    }

    async fn send_room_attachment(
        &self,
        vgroupid: &str,
        attachment: &str,
        display_name: &str,
        ttl: &str,
        bor: &str,
    ) -> BackendResult {
        self.record(
            "send_room_attachment",
            vec![vgroupid.into(), attachment.into(), display_name.into(), ttl.into(), bor.into()],
        )
    }

    async fn get_received_message(&self) -> BackendResult {
        self.record("get_received_message", vec![])
    }

    async fn get_statistics(&self) -> BackendResult {
        self.record("get_statistics", vec![])
    }

    async fn clear_statistics(&self) -> BackendResult {
        self.record("clear_statistics", vec![])
    }

    async fn add_room(
        &self,
        members: &[String],
        masters: &[String],
        title: &str,
        description: &str,
        ttl: &str,
        bor: &str,
    ) -> BackendResult {
        let scripted = self.record_call(
            "add_room",
            vec![
                list(members),
                list(masters),
                title.into(),
                description.into(),
                ttl.into(),
                bor.into(),
            ],
        )?;
        if let Some(reply) = scripted {
            return Ok(reply);
        }

        let mut rooms = self.rooms.lock();
        let vgroupid = format!("S{:04}", rooms.len() + 1);
        rooms.insert(
            vgroupid.clone(),
            json!({
                "vgroupid": vgroupid,
                "title": title,
                "description": description,
                "members": entries(members),
                "masters": entries(masters),
                "ttl": ttl,
                "bor": bor,
            }),
        );
        Ok(json!({ "vgroupid": vgroupid }).to_string())
    }

    async fn get_rooms(&self) -> BackendResult {
        self.record("get_rooms", vec![])
    }

    async fn get_room(&self, vgroupid: &str) -> BackendResult {
        if let Some(reply) = self.record_call("get_room", vec![vgroupid.into()])? {
            return Ok(reply);
        }
        Ok(match self.rooms.lock().get(vgroupid) {
            Some(room) => json!({ "rooms": [room] }).to_string(),
            None => "Success".to_string(),
        })
    }

    async fn modify_room(
        &self,
        vgroupid: &str,
        members: &[String],
        masters: &[String],
        title: &str,
        description: &str,
        ttl: &str,
        bor: &str,
    ) -> BackendResult {
        self.record(
            "modify_room",
            vec![
                vgroupid.into(),
                list(members),
                list(masters),
                title.into(),
                description.into(),
                ttl.into(),
                bor.into(),
            ],
        )
    }

    async fn delete_room(&self, vgroupid: &str) -> BackendResult {
        self.record("delete_room", vec![vgroupid.into()])
    }

    async fn leave_room(&self, vgroupid: &str) -> BackendResult {
        self.record("leave_room", vec![vgroupid.into()])
    }

    async fn add_group_convo(&self, members: &[String], ttl: &str, bor: &str) -> BackendResult {
        self.record("add_group_convo", vec![list(members), ttl.into(), bor.into()])
    }

    async fn get_group_convos(&self) -> BackendResult {
        self.record("get_group_convos", vec![])
    }

    async fn get_group_convo(&self, vgroupid: &str) -> BackendResult {
        self.record("get_group_convo", vec![vgroupid.into()])
    }

    async fn delete_group_convo(&self, vgroupid: &str) -> BackendResult {
        self.record("delete_group_convo", vec![vgroupid.into()])
    }

    async fn send_delete_message(&self, vgroupid: &str, message_id: &str) -> BackendResult {
        self.record("send_delete_message", vec![vgroupid.into(), message_id.into()])
    }

    async fn send_recall_message(&self, vgroupid: &str, message_id: &str) -> BackendResult {
        self.record("send_recall_message", vec![vgroupid.into(), message_id.into()])
    }

    async fn set_msg_callback(&self, url: &str) -> BackendResult {
        self.record("set_msg_callback", vec![url.into()])
    }

    async fn get_msg_callback(&self) -> BackendResult {
        self.record("get_msg_callback", vec![])
    }

    async fn delete_msg_callback(&self) -> BackendResult {
        self.record("delete_msg_callback", vec![])
    }

    async fn get_directory(&self) -> BackendResult {
        self.record("get_directory", vec![])
    }
}

// ============================================================================
// Application helpers
// ============================================================================

pub fn test_config(attachments_dir: &Path) -> ApiConfig {
    let mut config = ApiConfig::new(BOT, API_KEY, AUTH_TOKEN);
    config.attachments_dir = attachments_dir.to_path_buf();
    config.max_message_count = 5;
    config
}

/// Application backed by `backend`
pub fn app_with(backend: Arc<StubBackend>, config: ApiConfig) -> App {
    build_app(AppState::new(config, backend))
}

/// Application with attachments under `attachments_dir`
pub fn app(backend: Arc<StubBackend>, attachments_dir: &Path) -> App {
    app_with(backend, test_config(attachments_dir))
}

pub fn basic_auth(token: &str) -> String {
    format!("Basic {}", BASE64.encode(token))
}

/// Request builder carrying valid credentials for both namespaces
pub fn authed(method: Method, uri: &str) -> axum::http::request::Builder {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, basic_auth(AUTH_TOKEN))
        .header("x-api-key", API_KEY)
}

pub fn json_request(method: Method, uri: &str, body: serde_json::Value) -> Request<Body> {
    authed(method, uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn empty_request(method: Method, uri: &str) -> Request<Body> {
    authed(method, uri).body(Body::empty()).unwrap()
}

/// Drive one request through the application
pub async fn send(app: App, request: Request<Body>) -> Response<Body> {
    app.oneshot(request).await.unwrap()
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub fn content_type(response: &Response<Body>) -> String {
    response
        .headers()
        .get(header::CONTENT_TYPE)
        .map(|v| v.to_str().unwrap().to_string())
        .unwrap_or_default()
}
