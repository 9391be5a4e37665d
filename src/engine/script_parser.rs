use tracing::debug;

use crate::model::grammar::ScriptGrammar;
use crate::model::turn::{Speaker, Turn};

/// Splits a free-form block of script into turns, one per non-blank line.
///
/// A speaker prefix only counts at the very start of the line; an indented
/// `JILL:` is narration.
pub fn parse_script(script: &str, grammar: &ScriptGrammar) -> Vec<Turn> {
    let mut turns = Vec::new();

    for line in script.lines() {
        let line = line.trim_end();
        if line.trim_start().is_empty() {
            continue;
        }

        // JILL: Hello.
        if let Some((id, rest)) = grammar.split_line(line) {
            match Turn::new(Speaker::character(id), rest) {
                Some(turn) => turns.push(turn),
                None => debug!(speaker = id, "dropping dialogue line with no text"),
            }
            continue;
        }

        turns.extend(Turn::narration(line));
    }

    turns
}
