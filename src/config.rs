//! Configuration management

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

/// Gateway configuration, built once at start-up and shared read-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    // =========================================================================
    // Bot identity and credentials
    // =========================================================================
    /// Username of the bot account (used in leave confirmations)
    pub bot_username: String,

    /// API key: path segment of the legacy namespace and `x-api-key` value
    pub api_key: String,

    /// Secret compared against the decoded Basic-Auth token
    pub auth_token: String,

    // =========================================================================
    // Server
    // =========================================================================
    /// HTTP bind address
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Directory uploaded attachments are moved into
    #[serde(default = "default_attachments_dir")]
    pub attachments_dir: PathBuf,

    /// Largest accepted request body, in bytes
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,

    // =========================================================================
    // Messaging backend
    // =========================================================================
    /// Base URL of the local messaging-client bridge
    #[serde(default = "default_bridge_url")]
    pub bridge_url: String,

    /// Upper bound for a single backend call, in seconds
    #[serde(default = "default_backend_timeout")]
    pub backend_timeout_secs: u64,

    /// Cap on `count` for `GET /Messages`
    #[serde(default = "default_max_message_count")]
    pub max_message_count: usize,
}

fn default_listen_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_attachments_dir() -> PathBuf {
    PathBuf::from("attachments")
}

fn default_max_upload_bytes() -> usize {
    20 * 1024 * 1024
}

fn default_bridge_url() -> String {
    "http://127.0.0.1:4001".to_string()
}

fn default_backend_timeout() -> u64 {
    30
}

fn default_max_message_count() -> usize {
    1000
}

/// Value wrapper used by the `tokens` JSON blob: `{"BOT_PORT": {"value": "4545"}}`
#[derive(Debug, Deserialize)]
struct TokenValue {
    value: String,
}

/// Where configuration values are read from.
///
/// When the `tokens` environment variable holds a JSON object it takes
/// precedence; plain environment variables fill in anything it lacks.
struct Source {
    tokens: HashMap<String, String>,
}

impl Source {
    fn load() -> Result<Self> {
        let tokens = match std::env::var("tokens") {
            Ok(raw) => Self::parse_tokens(&raw)?,
            Err(_) => HashMap::new(),
        };
        Ok(Self { tokens })
    }

    fn parse_tokens(raw: &str) -> Result<HashMap<String, String>> {
        let parsed: HashMap<String, TokenValue> =
            serde_json::from_str(raw).context("tokens must be a JSON object of {\"value\": ..}")?;
        Ok(parsed.into_iter().map(|(k, v)| (k, v.value)).collect())
    }

    fn get(&self, key: &str) -> Option<String> {
        self.tokens
            .get(key)
            .cloned()
            .or_else(|| std::env::var(key).ok())
            .filter(|v| !v.trim().is_empty())
    }

    fn require(&self, key: &str) -> Result<String> {
        self.get(key).with_context(|| format!("{} is required", key))
    }

    fn parse_or<T: std::str::FromStr>(&self, key: &str, default: T) -> T {
        self.get(key)
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(default)
    }
}

impl ApiConfig {
    /// Load configuration from the environment (and `.env`, if present)
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let source = Source::load()?;
        Self::from_source(&source)
    }

    fn from_source(source: &Source) -> Result<Self> {
        let listen_addr = match source.get("LISTEN_ADDR") {
            Some(addr) => addr,
            None => match source.get("BOT_PORT") {
                Some(port) => format!("0.0.0.0:{}", port.trim()),
                None => default_listen_addr(),
            },
        };

        let config = Self {
            bot_username: source.require("WICKRIO_BOT_NAME")?,
            api_key: source.require("BOT_API_KEY")?,
            auth_token: source.require("BOT_API_AUTH_TOKEN")?,
            listen_addr,
            attachments_dir: source
                .get("ATTACHMENTS_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(default_attachments_dir),
            max_upload_bytes: source.parse_or("MAX_UPLOAD_BYTES", default_max_upload_bytes()),
            bridge_url: source
                .get("BRIDGE_URL")
                .unwrap_or_else(default_bridge_url),
            backend_timeout_secs: source.parse_or("BACKEND_TIMEOUT_SECS", default_backend_timeout()),
            max_message_count: source.parse_or("MAX_MESSAGE_COUNT", default_max_message_count()),
        };

        config.validate()?;
        Ok(config)
    }

    /// Check invariants the router relies on
    pub fn validate(&self) -> Result<()> {
        // The key becomes a literal path segment of the legacy namespace
        if !self
            .api_key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '~'))
        {
            return Err(anyhow!(
                "BOT_API_KEY may only contain ASCII letters, digits, '-', '_', '.' and '~'"
            ));
        }
        if self.max_message_count == 0 {
            return Err(anyhow!("MAX_MESSAGE_COUNT must be greater than 0"));
        }
        if self.backend_timeout_secs == 0 {
            return Err(anyhow!("BACKEND_TIMEOUT_SECS must be greater than 0"));
        }
        Ok(())
    }

    /// Timeout applied to every backend call
    pub fn backend_timeout(&self) -> Duration {
        Duration::from_secs(self.backend_timeout_secs)
    }

    /// Configuration with defaults for everything but the credentials
    pub fn new(
        bot_username: impl Into<String>,
        api_key: impl Into<String>,
        auth_token: impl Into<String>,
    ) -> Self {
        Self {
            bot_username: bot_username.into(),
            api_key: api_key.into(),
            auth_token: auth_token.into(),
            listen_addr: default_listen_addr(),
            attachments_dir: default_attachments_dir(),
            max_upload_bytes: default_max_upload_bytes(),
            bridge_url: default_bridge_url(),
            backend_timeout_secs: default_backend_timeout(),
            max_message_count: default_max_message_count(),
        }
    }
}
