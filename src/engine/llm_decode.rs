use serde::Deserialize;

use crate::engine::error::ValidationError;
use crate::engine::script_parser::parse_script;
use crate::model::grammar::ScriptGrammar;
use crate::model::score::Score;
use crate::model::turn::Turn;

#[derive(Deserialize)]
struct ScoreReply {
    score: i64,
}

#[derive(Deserialize)]
struct ScriptReply {
    next_line: String,
}

/// Decode a judge reply into a [`Score`].
///
/// Accepts either a bare integer or a `{"score": n}` object, optionally
/// wrapped in surrounding prose or a code fence.
pub fn decode_score(raw: &str) -> Result<Score, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Empty);
    }

    let value = if let Ok(value) = trimmed.parse::<i64>() {
        value
    } else if let Some(object) = embedded_object(trimmed) {
        serde_json::from_str::<ScoreReply>(object)
            .map_err(|e| ValidationError::Json(e.to_string()))?
            .score
    } else {
        return Err(ValidationError::NotAnInteger {
            raw: trimmed.to_string(),
        });
    };

    Score::try_from(value).map_err(|value| ValidationError::OutOfRange { value })
}

/// Decode a generation reply into the turns it contributes.
///
/// A surrounding code fence is stripped, then a `{"next_line": ...}` object is
/// unwrapped; if its first line has no speaker prefix it is attributed to
/// `speaker`.
pub fn decode_script(
    raw: &str,
    grammar: &ScriptGrammar,
    speaker: &str,
) -> Result<Vec<Turn>, ValidationError> {
    let trimmed = unfenced(raw.trim());
    if trimmed.is_empty() {
        return Err(ValidationError::Empty);
    }

    let turns = if trimmed.starts_with('{') {
        let reply: ScriptReply =
            serde_json::from_str(trimmed).map_err(|e| ValidationError::Json(e.to_string()))?;
        let next_line = reply.next_line.trim();

        if grammar.split_line(next_line).is_some() {
            parse_script(next_line, grammar)
        } else {
            let attributed = format!("{} {}", ScriptGrammar::prefix(speaker), next_line);
            parse_script(&attributed, grammar)
        }
    } else {
        parse_script(trimmed, grammar)
    };

    if turns.is_empty() {
        return Err(ValidationError::NoScriptLines);
    }

    Ok(turns)
}

/// Body of a reply wrapped in a ``` fence (with or without a language tag).
fn unfenced(text: &str) -> &str {
    let Some(opened) = text.strip_prefix("```") else {
        return text;
    };
    let body = opened.split_once('\n').map_or("", |(_, body)| body);

    body.trim_end()
        .strip_suffix("```")
        .unwrap_or(body)
        .trim()
}

fn embedded_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (start < end).then(|| &text[start..=end])
}
