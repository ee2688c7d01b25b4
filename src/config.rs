//! Engine configuration

use serde::{Deserialize, Serialize};

/// Branch label used when intent recognition fails
pub const DEFAULT_FALLBACK_LABEL: &str = "意图识别失败";

/// Well-known names the engine relies on
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    /// Step every session starts at
    pub entry_step: String,
    /// Step whose speak actions are emitted when `Exit` runs
    pub exit_step: String,
    /// Branch label taken when the intent has no branch of its own.
    /// Also the classifier's failure sentinel.
    pub fallback_label: String,
    /// Reserved upgrade reference for the latest listened input
    pub listen_key: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            entry_step: "welcome".to_string(),
            exit_step: "exit".to_string(),
            fallback_label: DEFAULT_FALLBACK_LABEL.to_string(),
            listen_key: "listen_content".to_string(),
        }
    }
}

impl EngineConfig {
    /// Parse a JSON config; missing fields keep their defaults
    pub fn from_json_str(json: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
