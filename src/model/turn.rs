use std::fmt;

/// Reserved speaker id for lines that belong to no declared character.
pub const NARRATOR: &str = "narrator";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Speaker {
    Character(String),
    Narrator,
}

impl Speaker {
    pub fn character(id: impl Into<String>) -> Self {
        Speaker::Character(id.into())
    }

    pub fn id(&self) -> &str {
        match self {
            Speaker::Character(id) => id,
            Speaker::Narrator => NARRATOR,
        }
    }

    pub fn is_narrator(&self) -> bool {
        matches!(self, Speaker::Narrator)
    }
}

impl fmt::Display for Speaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// One atomic line of the script.
///
/// Text is always trimmed and never empty. Turns are only built through
/// [`Turn::new`], so anything holding a `Turn` can rely on that.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    speaker: Speaker,
    text: String,
}

impl Turn {
    /// Returns `None` when `text` is blank after trimming.
    pub fn new(speaker: Speaker, text: &str) -> Option<Self> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }

        Some(Self {
            speaker,
            text: text.to_string(),
        })
    }

    pub fn narration(text: &str) -> Option<Self> {
        Self::new(Speaker::Narrator, text)
    }

    pub fn speaker(&self) -> &Speaker {
        &self.speaker
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}
