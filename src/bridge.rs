//! Bridge client for the local messaging client
//!
//! The messaging client runs as a separate process that accepts one JSON
//! command per request on `POST {base}/{command}` and answers with
//! `{"errcode": 0, "errmsg": "ok", "result": "..."}`.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::backend::{BackendError, BackendResult, MessagingBackend};

/// Bridge reply envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeResponse {
    /// Error code (0 means success)
    pub errcode: i64,
    /// Error message
    #[serde(default)]
    pub errmsg: String,
    /// Raw client reply
    #[serde(default)]
    pub result: Option<String>,
}

/// HTTP client for the messaging bridge
pub struct BridgeClient {
    base_url: String,
    http: Client,
}

impl BridgeClient {
    /// Create a new bridge client
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http: Client::new(),
        }
    }

    fn command_url(&self, command: &str) -> String {
        format!("{}/{}", self.base_url, command)
    }

    async fn call(&self, command: &'static str, args: Value) -> BackendResult {
        debug!("Bridge call {}", command);

        let response = self
            .http
            .post(self.command_url(command))
            .json(&args)
            .send()
            .await
            .map_err(|e| BackendError::Transport(e.to_string()))?
            .json::<BridgeResponse>()
            .await
            .map_err(|e| BackendError::Transport(e.to_string()))?;

        Self::into_result(command, response)
    }

    fn into_result(command: &'static str, response: BridgeResponse) -> BackendResult {
        match response.errcode {
            0 => Ok(response.result.unwrap_or_default()),
            code => {
                warn!(
                    "Bridge command {} failed: {} - {}",
                    command, code, response.errmsg
                );
                Err(BackendError::Rejected {
                    command,
                    message: format!("{}: {}", code, response.errmsg),
                })
            }
        }
    }
}

#[async_trait]
impl MessagingBackend for BridgeClient {
    async fn send_1to1_message(
        &self,
        users: &[String],
        message: &str,
        ttl: &str,
        bor: &str,
        message_meta: &str,
    ) -> BackendResult {
        self.call(
            "send_1to1_message",
            json!({
                "users": users,
                "message": message,
                "ttl": ttl,
                "bor": bor,
                "messagemeta": message_meta,
            }),
        )
        .await
    }

    async fn send_1to1_attachment(
        &self,
        users: &[String],
        attachment: &str,
        display_name: &str,
        ttl: &str,
        bor: &str,
    ) -> BackendResult {
        self.call(
            "send_1to1_attachment",
            json!({
                "users": users,
                "attachment": attachment,
                "displayname": display_name,
                "ttl": ttl,
                "bor": bor,
            }),
        )
        .await
    }

    async fn send_room_message(
        &self,
        vgroupid: &str,
        message: &str,
        ttl: &str,
        bor: &str,
        message_meta: &str,
    ) -> BackendResult {
        self.call(
            "send_room_message",
            json!({
                "vgroupid": vgroupid,
                "message": message,
                "ttl": ttl,
                "bor": bor,
                "messagemeta": message_meta,
            }),
        )
        .await
    }

    async fn send_room_attachment(
        &self,
        vgroupid: &str,
        attachment: &str,
        display_name: &str,
        ttl: &str,
        bor: &str,
    ) -> BackendResult {
        self.call(
            "send_room_attachment",
            json!({
                "vgroupid": vgroupid,
                "attachment": attachment,
                "displayname": display_name,
                "ttl": ttl,
                "bor": bor,
            }),
        )
        .await
    }

    async fn get_received_message(&self) -> BackendResult {
        self.call("get_received_message", json!({})).await
    }

    async fn get_statistics(&self) -> BackendResult {
        self.call("get_statistics", json!({})).await
    }

    async fn clear_statistics(&self) -> BackendResult {
        self.call("clear_statistics", json!({})).await
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
        self.call(
            "add_room",
            json!({
                "members": members,
                "masters": masters,
                "title": title,
                "description": description,
                "ttl": ttl,
                "bor": bor,
            }),
        )
        .await
    }

    async fn get_rooms(&self) -> BackendResult {
        self.call("get_rooms", json!({})).await
    }

    async fn get_room(&self, vgroupid: &str) -> BackendResult {
        self.call("get_room", json!({ "vgroupid": vgroupid })).await
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
        self.call(
            "modify_room",
            json!({
                "vgroupid": vgroupid,
                "members": members,
                "masters": masters,
                "title": title,
                "description": description,
                "ttl": ttl,
                "bor": bor,
            }),
        )
        .await
    }

    async fn delete_room(&self, vgroupid: &str) -> BackendResult {
        self.call("delete_room", json!({ "vgroupid": vgroupid }))
            .await
    }

    async fn leave_room(&self, vgroupid: &str) -> BackendResult {
        self.call("leave_room", json!({ "vgroupid": vgroupid })).await
    }

    async fn add_group_convo(&self, members: &[String], ttl: &str, bor: &str) -> BackendResult {
        self.call(
            "add_group_convo",
            json!({ "members": members, "ttl": ttl, "bor": bor }),
        )
        .await
    }

    async fn get_group_convos(&self) -> BackendResult {
        self.call("get_group_convos", json!({})).await
    }

    async fn get_group_convo(&self, vgroupid: &str) -> BackendResult {
        self.call("get_group_convo", json!({ "vgroupid": vgroupid }))
            .await
    }

    async fn delete_group_convo(&self, vgroupid: &str) -> BackendResult {
        self.call("delete_group_convo", json!({ "vgroupid": vgroupid }))
            .await
    }

    async fn send_delete_message(&self, vgroupid: &str, message_id: &str) -> BackendResult {
        self.call(
            "send_delete_message",
            json!({ "vgroupid": vgroupid, "message_id": message_id }),
        )
        .await
    }

    async fn send_recall_message(&self, vgroupid: &str, message_id: &str) -> BackendResult {
        self.call(
            "send_recall_message",
            json!({ "vgroupid": vgroupid, "message_id": message_id }),
        )
        .await
    }

    async fn set_msg_callback(&self, callback_url: &str) -> BackendResult {
        self.call("set_msg_callback", json!({ "callbackurl": callback_url }))
            .await
    }

    async fn get_msg_callback(&self) -> BackendResult {
        self.call("get_msg_callback", json!({})).await
    }

    async fn delete_msg_callback(&self) -> BackendResult {
        self.call("delete_msg_callback", json!({})).await
    }

    async fn get_directory(&self) -> BackendResult {
        self.call("get_directory", json!({})).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bridge_response_deserialize() {
        let json = r#"{"errcode":0,"errmsg":"ok","result":"{\"rooms\":[]}"}"#;
        let response: BridgeResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.errcode, 0);
        assert_eq!(response.result.as_deref(), Some("{\"rooms\":[]}"));
    }

    #[test]
    fn test_into_result_success_without_result() {
        let response: BridgeResponse = serde_json::from_str(r#"{"errcode":0}"#).unwrap();
        assert_eq!(
            BridgeClient::into_result("clear_statistics", response).unwrap(),
            ""
        );
    }

    #[test]
    fn test_into_result_error() {
        let json = r#"{"errcode":17,"errmsg":"unknown vgroupid"}"#;
        let response: BridgeResponse = serde_json::from_str(json).unwrap();
        let err = BridgeClient::into_result("get_room", response).unwrap_err();
        assert!(matches!(
            err,
            BackendError::Rejected {
                command: "get_room",
                ..
            }
        ));
        assert!(err.to_string().contains("unknown vgroupid"));
    }

    #[test]
    fn test_command_url_trims_trailing_slash() {
        let client = BridgeClient::new("http://127.0.0.1:4001/");
        assert_eq!(
            client.command_url("get_rooms"),
            "http://127.0.0.1:4001/get_rooms"
        );
    }
}
