//! Messaging backend contract
//!
//! The messaging client that actually sends and receives messages is an
//! external collaborator. Every command it offers is modelled as one async
//! method returning the client's raw string reply, or a [`BackendError`].

use async_trait::async_trait;
use std::time::Duration;

/// Failure reported by (or while talking to) the messaging client
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// The client rejected the command
    #[error("backend rejected {command}: {message}")]
    Rejected { command: &'static str, message: String },

    /// The client could not be reached or replied with garbage
    #[error("backend transport error: {0}")]
    Transport(String),

    /// The client did not answer in time
    #[error("backend call {command} timed out after {elapsed:?}")]
    Timeout {
        command: &'static str,
        elapsed: Duration,
    },
}

/// Result type for backend operations
pub type BackendResult = Result<String, BackendError>;

/// Commands understood by the messaging client.
///
/// `ttl` and `bor` are passed as string tokens where `""` means unset.
#[async_trait]
pub trait MessagingBackend: Send + Sync {
    async fn send_1to1_message(
        &self,
        users: &[String],
        message: &str,
        ttl: &str,
        bor: &str,
        message_meta: &str,
    ) -> BackendResult;

    async fn send_1to1_attachment(
        &self,
        users: &[String],
        attachment: &str,
        display_name: &str,
        ttl: &str,
        bor: &str,
    ) -> BackendResult;

    async fn send_room_message(
        &self,
        vgroupid: &str,
        message: &str,
        ttl: &str,
        bor: &str,
        message_meta: &str,
    ) -> BackendResult;

    async fn send_room_attachment(
        &self,
        vgroupid: &str,
        attachment: &str,
        display_name: &str,
        ttl: &str,
        bor: &str,
    ) -> BackendResult;

    /// Pop one message from the inbound queue; `""` or `"{ }"` when empty
    async fn get_received_message(&self) -> BackendResult;

    async fn get_statistics(&self) -> BackendResult;

    async fn clear_statistics(&self) -> BackendResult;

    async fn add_room(
        &self,
        members: &[String],
        masters: &[String],
        title: &str,
        description: &str,
        ttl: &str,
        bor: &str,
    ) -> BackendResult;

    async fn get_rooms(&self) -> BackendResult;

    async fn get_room(&self, vgroupid: &str) -> BackendResult;

    /// Absent fields are passed as `""` or an empty slice
    #[allow(clippy::too_many_arguments)]
    async fn modify_room(
        &self,
        vgroupid: &str,
        members: &[String],
        masters: &[String],
        title: &str,
        description: &str,
        ttl: &str,
        bor: &str,
    ) -> BackendResult;

    async fn delete_room(&self, vgroupid: &str) -> BackendResult;

    async fn leave_room(&self, vgroupid: &str) -> BackendResult;

    async fn add_group_convo(&self, members: &[String], ttl: &str, bor: &str) -> BackendResult;

    async fn get_group_convos(&self) -> BackendResult;

    async fn get_group_convo(&self, vgroupid: &str) -> BackendResult;

    async fn delete_group_convo(&self, vgroupid: &str) -> BackendResult;

    async fn send_delete_message(&self, vgroupid: &str, message_id: &str) -> BackendResult;

    async fn send_recall_message(&self, vgroupid: &str, message_id: &str) -> BackendResult;

    async fn set_msg_callback(&self, callback_url: &str) -> BackendResult;

    async fn get_msg_callback(&self) -> BackendResult;

    async fn delete_msg_callback(&self) -> BackendResult;

    async fn get_directory(&self) -> BackendResult;
}

/// Await a backend call, turning a stall into [`BackendError::Timeout`]
pub async fn with_timeout<F>(command: &'static str, limit: Duration, call: F) -> BackendResult
where
    F: std::future::Future<Output = BackendResult>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(BackendError::Timeout {
            command,
            elapsed: limit,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_with_timeout_passes_result_through() {
        let result = with_timeout("get_rooms", Duration::from_secs(1), async {
            Ok("rooms".to_string())
        })
        .await;
        assert_eq!(result.unwrap(), "rooms");
    }

    #[tokio::test]
    async fn test_with_timeout_expires() {
        let result = with_timeout("get_rooms", Duration::from_millis(10), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok("late".to_string())
        })
        .await;
        assert!(matches!(
            result,
            Err(BackendError::Timeout {
                command: "get_rooms",
                ..
            })
        ));
    }
}
