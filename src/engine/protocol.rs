use crate::model::score::Score;
use crate::model::turn::Turn;

pub enum EngineCommand {
    PlayerInput(String),
    Disengage,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineResponse {
    /// The pre-script, sent once at start, with the player's speaker id.
    TranscriptLoaded {
        player: String,
        turns: Vec<Turn>,
    },

    AwaitingInput {
        round: u32,
        max_rounds: u32,
        player: String,
    },

    /// The player's own line, as recorded.
    PlayerTurnAccepted(Turn),

    /// A line produced by the generation service.
    TurnAppended(Turn),

    /// No valid continuation was produced; the round gets no AI turn.
    GenerationAbandoned {
        round: u32,
        reason: String,
    },

    Scored {
        round: u32,
        score: Score,
    },

    ScoreUnavailable {
        round: u32,
        reason: String,
    },

    SessionEnded(EndReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    Disengaged,
    RoundLimitReached,
}
