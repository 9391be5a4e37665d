use crate::model::grammar::ScriptGrammar;
use crate::model::turn::Turn;

/// Append-only, chronological record of a session's turns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transcript {
    turns: Vec<Turn>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_turns(turns: Vec<Turn>) -> Self {
        Self { turns }
    }

    pub fn append(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// The script exactly as the agents receive it.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for turn in &self.turns {
            ScriptGrammar::push_turn(&mut out, turn);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::turn::Speaker;

    fn line(id: &str, text: &str) -> Turn {
        Turn::new(Speaker::character(id), text).unwrap()
    }

    #[test]
    fn test_append_keeps_insertion_order() {
        let mut transcript = Transcript::new();

        transcript.append(line("JILL", "Hello."));
        transcript.append(line("ALEX", "Hi Jill"));

        let speakers: Vec<&str> = transcript.turns().iter().map(|t| t.speaker().id()).collect();
        assert_eq!(speakers, ["JILL", "ALEX"]);
        assert_eq!(transcript.len(), 2);
    }

    #[test]
    fn test_render_mixes_dialogue_and_narration() {
        let mut transcript = Transcript::new();
        transcript.append(Turn::narration("A quiet kitchen.").unwrap());
        transcript.append(line("JILL", "Hello."));
        transcript.append(line("ALEX", "Hi Jill"));

        assert_eq!(
            transcript.render(),
            "A quiet kitchen.\nJILL: Hello.\n\nALEX: Hi Jill\n\n"
        );
    }

    #[test]
    fn test_render_empty_transcript() {
        assert_eq!(Transcript::new().render(), "");
        assert!(Transcript::new().is_empty());
    }
}
