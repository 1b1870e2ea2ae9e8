use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const BACKEND_URL_ENV: &str = "TONEGRAPH_BACKEND_URL";
pub const SESSION_ENV: &str = "TONEGRAPH_SESSION";

/// Connection settings for the graph backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub base_url: String,
    pub session_id: String,
    #[serde(with = "millis")]
    pub request_timeout: Duration,
    /// Quiet period after the last edit before the graph is pushed.
    #[serde(with = "millis")]
    pub sync_debounce: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            session_id: "42".to_string(),
            request_timeout: Duration::from_secs(10),
            sync_debounce: Duration::from_millis(500),
        }
    }
}

impl ClientConfig {
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = session_id.into();
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_sync_debounce(mut self, debounce: Duration) -> Self {
        self.sync_debounce = debounce;
        self
    }

    /// Defaults overridden by `TONEGRAPH_BACKEND_URL` and `TONEGRAPH_SESSION`.
    pub fn from_env() -> Self {
        Self::default().with_env()
    }

    /// Settings file merged with the environment. A missing or unreadable
    /// file falls back to the defaults.
    pub fn load() -> Self {
        Self::load_from(settings_path().as_deref())
    }

    /// Same as [`ClientConfig::load`] for an explicit settings file.
    pub fn load_from(path: Option<&Path>) -> Self {
        path.and_then(read_settings).unwrap_or_default().with_env()
    }

    fn with_env(mut self) -> Self {
        if let Some(url) = non_empty_var(BACKEND_URL_ENV) {
            self.base_url = url;
        }
        if let Some(session) = non_empty_var(SESSION_ENV) {
            self.session_id = session;
        }
        self
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn read_settings(path: &Path) -> Option<ClientConfig> {
    let contents = fs::read_to_string(path).ok()?;
    match serde_json::from_str::<ClientConfig>(&contents) {
        Ok(config) => Some(config),
        Err(err) => {
            tracing::warn!(path = %path.display(), %err, "ignoring invalid client settings");
            None
        }
    }
}

fn settings_path() -> Option<PathBuf> {
    let mut base = dirs::config_dir()?;
    base.push("tonegraph");
    base.push("client.json");
    Some(base)
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
