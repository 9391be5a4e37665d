use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::model::session_config::{DEFAULT_MAX_ATTEMPTS, DEFAULT_MAX_ROUNDS};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// Service that writes the AI character's lines.
    pub generation: LlmSettings,
    /// Service that rates the conversation.
    pub judge: LlmSettings,
    pub session: SessionDefaults,
    pub ui: UiSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    /// OpenAI-compatible chat completions URL.
    pub endpoint: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
    /// Environment variable holding a bearer token, if the service wants one.
    pub api_key_env: Option<String>,
    /// Unset means calls may block indefinitely.
    pub timeout_secs: Option<u64>,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:1234/v1/chat/completions".into(),
            model: "local-model".into(),
            temperature: 0.7,
            max_tokens: Some(100),
            api_key_env: Some("CALMDOWN_API_KEY".into()),
            timeout_secs: None,
        }
    }
}

impl LlmSettings {
    pub fn api_key(&self) -> Option<String> {
        self.api_key_env
            .as_deref()
            .and_then(|var| std::env::var(var).ok())
            .filter(|key| !key.trim().is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionDefaults {
    pub max_rounds: u32,
    pub max_attempts: u32,
}

impl Default for SessionDefaults {
    fn default() -> Self {
        Self {
            max_rounds: DEFAULT_MAX_ROUNDS,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiSettings {
    /// Speaker kind → RGB colour (extensible)
    pub speaker_colors: HashMap<String, [u8; 3]>,
}

impl Default for UiSettings {
    fn default() -> Self {
        let mut speaker_colors = HashMap::new();

        speaker_colors.insert("player".into(), [90, 140, 220]);
        speaker_colors.insert("character".into(), [220, 80, 80]);
        speaker_colors.insert("narrator".into(), [150, 150, 150]);
        speaker_colors.insert("judge".into(), [230, 200, 60]);
        speaker_colors.insert("system".into(), [80, 180, 100]);

        Self { speaker_colors }
    }
}

impl UiSettings {
    pub fn color(&self, key: &str) -> Option<[u8; 3]> {
        self.speaker_colors.get(key).copied()
    }
}
