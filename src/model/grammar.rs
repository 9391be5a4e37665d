use crate::model::turn::{Speaker, Turn, NARRATOR};

/// The line grammar shared by the parser, the transcript renderer and the
/// generation prompt.
///
/// A dialogue line is `{id}{SEPARATOR} {text}` where `id` is one of the
/// declared characters. Every other non-blank line is narration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptGrammar {
    characters: Vec<String>,
}

impl ScriptGrammar {
    pub const SEPARATOR: char = ':';

    pub fn new<I, S>(characters: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut declared: Vec<String> = Vec::new();
        for id in characters.into_iter().map(Into::into) {
            if !declared.contains(&id) {
                declared.push(id);
            }
        }

        Self {
            characters: declared,
        }
    }

    pub fn characters(&self) -> &[String] {
        &self.characters
    }

    pub fn prefix(id: &str) -> String {
        format!("{id}{}", Self::SEPARATOR)
    }

    /// Splits `line` into a declared speaker id and the remainder after the
    /// separator. Matching is case sensitive and requires the separator right
    /// after the id. When several ids match, the longest wins.
    pub fn split_line<'g, 'a>(&'g self, line: &'a str) -> Option<(&'g str, &'a str)> {
        self.characters
            .iter()
            .filter(|id| {
                line.strip_prefix(id.as_str())
                    .is_some_and(|rest| rest.starts_with(Self::SEPARATOR))
            })
            .max_by_key(|id| id.len())
            .map(|id| (id.as_str(), &line[id.len() + Self::SEPARATOR.len_utf8()..]))
    }

    /// Appends the canonical rendering of `turn` to `out`.
    pub fn push_turn(out: &mut String, turn: &Turn) {
        match turn.speaker() {
            Speaker::Character(id) => {
                out.push_str(&Self::prefix(id));
                out.push(' ');
                out.push_str(turn.text());
                out.push_str("\n\n");
            }
            Speaker::Narrator => {
                out.push_str(turn.text());
                out.push('\n');
            }
        }
    }

    /// Reply format the generation service is asked to follow when writing
    /// lines for `speaker`.
    pub fn reply_format(speaker: &str) -> String {
        format!(
            "Write only what {speaker} says next. \
             Every line {speaker} speaks must start with '{prefix}'. \
             You may open with a single line of narration describing the scene; \
             narration lines carry no prefix. \
             Never write lines for any other character.",
            prefix = Self::prefix(speaker),
        )
    }

    /// True when `id` could be used as a speaker id without breaking the
    /// grammar.
    pub fn is_valid_id(id: &str) -> bool {
        !id.is_empty()
            && id.trim() == id
            && !id.contains(Self::SEPARATOR)
            && !id.contains('\n')
            && id != NARRATOR
    }
}
