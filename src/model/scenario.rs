use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use tracing::{debug, info};

pub const DEFAULT_PLAYER: &str = "ALEX";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Roles {
    pub player: String,
    pub ai: String,
}

/// The text blobs a session starts from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scenario {
    pub profile: String,
    pub prescript: String,
    pub roles: Roles,
    /// Explicit goal from `goal.txt`, if present.
    pub goal: Option<String>,
}

impl Scenario {
    /// Reads `profile.txt`, `prescript.txt` and the optional `roles.json` and
    /// `goal.txt` from `dir`.
    pub fn load(dir: &Path) -> Result<Self> {
        let profile = read_required(dir, "profile.txt")?;
        let prescript = read_required(dir, "prescript.txt")?;
        let goal = read_optional(dir, "goal.txt")?.filter(|g| !g.trim().is_empty());

        let roles = match read_optional(dir, "roles.json")? {
            Some(raw) => serde_json::from_str(&raw)
                .with_context(|| format!("invalid roles.json in {}", dir.display()))?,
            None => Roles {
                player: DEFAULT_PLAYER.into(),
                ai: ai_from_dir_name(dir)?,
            },
        };

        info!(scenario = %dir.display(), player = %roles.player, ai = %roles.ai, "loaded scenario");
        Ok(Self {
            profile,
            prescript,
            roles,
            goal,
        })
    }

    pub fn with_player(mut self, player: &str) -> Self {
        self.roles.player = player.trim().to_uppercase();
        self
    }

    pub fn goal(&self) -> String {
        match &self.goal {
            Some(goal) => goal.trim().to_string(),
            None => format!(
                "{} successfully solicited affection from {}",
                self.roles.player, self.roles.ai
            ),
        }
    }
}

/// `002_jill` → `JILL`
fn ai_from_dir_name(dir: &Path) -> Result<String> {
    let name = dir
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();

    match name.split_once('_') {
        Some((_, ai)) if !ai.is_empty() => Ok(ai.to_uppercase()),
        _ => bail!(
            "{} has no roles.json and its name does not follow NNN_name",
            dir.display()
        ),
    }
}

fn read_required(dir: &Path, file: &str) -> Result<String> {
    let path = dir.join(file);
    fs::read_to_string(&path).with_context(|| format!("failed to read {}", path.display()))
}

fn read_optional(dir: &Path, file: &str) -> Result<Option<String>> {
    let path = dir.join(file);
    if !path.exists() {
        debug!(path = %path.display(), "optional scenario file missing");
        return Ok(None);
    }
    read_required(dir, file).map(Some)
}
