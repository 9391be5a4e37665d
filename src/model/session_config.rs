use thiserror::Error;

use crate::model::grammar::ScriptGrammar;

pub const DEFAULT_MAX_ROUNDS: u32 = 10;
pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("character id {0:?} is not usable as a script speaker")]
    InvalidCharacterId(String),

    #[error("player and AI character must differ (both are {0:?})")]
    DuplicateCharacterId(String),

    #[error("goal statement is empty")]
    EmptyGoal,

    #[error("{0} must be at least 1")]
    ZeroLimit(&'static str),
}

/// Everything fixed for the lifetime of one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    player: String,
    ai: String,
    goal: String,
    max_rounds: u32,
    max_attempts: u32,
}

impl SessionConfig {
    pub fn new(
        player: impl Into<String>,
        ai: impl Into<String>,
        goal: impl Into<String>,
        max_rounds: u32,
        max_attempts: u32,
    ) -> Result<Self, ConfigError> {
        let player = player.into();
        let ai = ai.into();
        let goal = goal.into().trim().to_string();

        for id in [&player, &ai] {
            if !ScriptGrammar::is_valid_id(id) {
                return Err(ConfigError::InvalidCharacterId(id.clone()));
            }
        }
        if player == ai {
            return Err(ConfigError::DuplicateCharacterId(player));
        }
        if goal.is_empty() {
            return Err(ConfigError::EmptyGoal);
        }
        if max_rounds == 0 {
            return Err(ConfigError::ZeroLimit("max_rounds"));
        }
        if max_attempts == 0 {
            return Err(ConfigError::ZeroLimit("max_attempts"));
        }

        Ok(Self {
            player,
            ai,
            goal,
            max_rounds,
            max_attempts,
        })
    }

    pub fn player(&self) -> &str {
        &self.player
    }

    pub fn ai(&self) -> &str {
        &self.ai
    }

    pub fn goal(&self) -> &str {
        &self.goal
    }

    pub fn max_rounds(&self) -> u32 {
        self.max_rounds
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn grammar(&self) -> ScriptGrammar {
        ScriptGrammar::new([self.player.as_str(), self.ai.as_str()])
    }
}
