use tracing::debug;

use crate::engine::error::AgentError;
use crate::engine::llm_client::LlmClient;
use crate::engine::prompt_builder::PromptBuilder;

/// Anything that can answer a system/user message pair with text.
pub trait ChatBackend {
    fn chat(&self, system: &str, user: &str) -> Result<String, AgentError>;
}

impl ChatBackend for LlmClient {
    fn chat(&self, system: &str, user: &str) -> Result<String, AgentError> {
        LlmClient::chat(self, system, user)
    }
}

/// Writes the next in-character line(s). Returns the reply unparsed.
pub trait ScriptWriter {
    fn generate(&self, profile: &str, script: &str, speaker: &str) -> Result<String, AgentError>;
}

/// Rates the script against a goal statement. Returns the reply unparsed.
pub trait Judge {
    fn score(&self, script: &str, player: &str, ai: &str, goal: &str)
        -> Result<String, AgentError>;
}

pub struct ScriptAgent<B> {
    backend: B,
}

impl<B: ChatBackend> ScriptAgent<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }
}

impl<B: ChatBackend> ScriptWriter for ScriptAgent<B> {
    fn generate(&self, profile: &str, script: &str, speaker: &str) -> Result<String, AgentError> {
        let prompt = PromptBuilder::script(profile, script, speaker);
        let reply = self.backend.chat(&prompt.system, &prompt.user)?;
        debug!(speaker, reply = %reply, "script agent replied");
        Ok(reply)
    }
}

pub struct JudgeAgent<B> {
    backend: B,
}

impl<B: ChatBackend> JudgeAgent<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }
}

impl<B: ChatBackend> Judge for JudgeAgent<B> {
    fn score(
        &self,
        script: &str,
        player: &str,
        ai: &str,
        goal: &str,
    ) -> Result<String, AgentError> {
        let prompt = PromptBuilder::judge(script, player, ai, goal);
        let reply = self.backend.chat(&prompt.system, &prompt.user)?;
        debug!(reply = %reply, "judge replied");
        Ok(reply)
    }
}
