/// Configuration schema and defaults for liverisk.
///
/// Defines the TOML-serializable configuration with the sections
/// `[client]`, `[web]`, and `[logging]`. Every field has a built-in default;
/// users only set the values they want to override.
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::predict::RacePolicy;

/// Default prediction endpoint.
pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:8000/predict";

/// Default listen address of the embedded form page.
pub const DEFAULT_WEB_ADDR: &str = "127.0.0.1:9747";

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level liverisk configuration.
///
/// Maps to `~/.liverisk/config.toml` and `.liverisk.toml`. All sections and
/// fields are optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LiveriskConfig {
    pub client: ClientConfig,
    pub web: WebConfig,
    pub logging: LoggingConfig,
}

// ---------------------------------------------------------------------------
// [client]
// ---------------------------------------------------------------------------

/// Prediction service client settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Full URL of the `/predict` endpoint.
    pub endpoint: String,
    /// Request timeout in milliseconds. `0` disables the timeout.
    pub timeout_ms: u64,
    /// How overlapping submissions are applied to the result container.
    pub race_policy: RacePolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout_ms: 0,
            race_policy: RacePolicy::default(),
        }
    }
}

impl ClientConfig {
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_ms > 0).then(|| Duration::from_millis(self.timeout_ms))
    }
}

// ---------------------------------------------------------------------------
// [web]
// ---------------------------------------------------------------------------

/// Embedded form page settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebConfig {
    pub addr: String,
    /// Open the page in the default browser when the server starts.
    pub open_browser: bool,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            addr: DEFAULT_WEB_ADDR.to_string(),
            open_browser: true,
        }
    }
}

// ---------------------------------------------------------------------------
// [logging]
// ---------------------------------------------------------------------------

/// Prediction history log settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Append every completed prediction to `~/.liverisk/predictions.jsonl`.
    pub enabled: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

// ---------------------------------------------------------------------------
// Annotated default file
// ---------------------------------------------------------------------------

impl LiveriskConfig {
    /// The annotated default config written by `liverisk config init`.
    pub fn default_toml() -> String {
        r#"# liverisk Configuration
#
# Configuration hierarchy (highest precedence wins):
#   1. Environment variables (LIVERISK_*)
#   2. Project config (.liverisk.toml in current directory)
#   3. User global config (~/.liverisk/config.toml)
#   4. Built-in defaults

[client]
endpoint = "http://127.0.0.1:8000/predict"
timeout_ms = 0                        # 0 = wait indefinitely
race_policy = "last-resolved-wins"    # last-resolved-wins | latest-submission-wins

[web]
addr = "127.0.0.1:9747"
open_browser = true

[logging]
enabled = true                        # ~/.liverisk/predictions.jsonl
"#
        .to_string()
    }
}
