//! Bot Web API Library
//!
//! An HTTP REST gateway in front of a messaging bot client. Requests are
//! authenticated, validated and translated into client commands; client
//! replies are mapped back to HTTP responses.
//!
//! # Architecture
//!
//! ```text
//! HTTP client ──HTTP──▶ Gateway (this) ──HTTP/JSON──▶ Bridge ──▶ Messaging client
//!                         │
//!                         ├── Auth (Basic token + x-api-key)
//!                         ├── Validation (messages, rooms, group convos, uploads)
//!                         └── Attachments directory
//! ```
//!
//! # Usage
//!
//! ```bash
//! # Set environment variables
//! export WICKRIO_BOT_NAME=mybot
//! export BOT_API_KEY=your_api_key
//! export BOT_API_AUTH_TOKEN=your_auth_token
//! export BOT_PORT=8080                              # optional
//! export BRIDGE_URL=http://127.0.0.1:4001           # optional
//!
//! # Run
//! bot-web-api
//! ```
//!
//! ```bash
//! curl -H "Authorization: Basic $(echo -n your_auth_token | base64)" \
//!      -H "x-api-key: your_api_key" \
//!      -H "Content-Type: application/json" \
//!      -d '{"users": [{"name": "alice"}], "message": "hi"}' \
//!      http://localhost:8080/WickrIO/V2/Apps/Messages
//! ```

pub mod attachments;
pub mod auth;
pub mod backend;
pub mod bridge;
pub mod config;
pub mod error;
pub mod handlers;
pub mod router;
pub mod types;
pub mod validate;

pub use attachments::AttachmentStore;
pub use backend::{BackendError, BackendResult, MessagingBackend};
pub use bridge::BridgeClient;
pub use config::ApiConfig;
pub use error::ApiError;
pub use router::{App, AppState, build_app, build_router, run_server};

/// Prelude for common imports
pub mod prelude {
    pub use crate::attachments::AttachmentStore;
    pub use crate::backend::{BackendError, BackendResult, MessagingBackend};
    pub use crate::bridge::BridgeClient;
    pub use crate::config::ApiConfig;
    pub use crate::error::ApiError;
    pub use crate::router::{App, AppState, build_app, build_router};
}
