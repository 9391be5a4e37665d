use thiserror::Error;

/// The call to the text-generation service itself failed.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("request to generation service failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("generation service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("generation service response could not be decoded: {0}")]
    Malformed(String),

    #[error("generation service returned no content")]
    EmptyContent,
}

/// The call succeeded but the reply does not have the expected shape.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("reply is empty")]
    Empty,

    #[error("reply is not a single integer: {raw:?}")]
    NotAnInteger { raw: String },

    #[error("score {value} is outside 1-100")]
    OutOfRange { value: i64 },

    #[error("reply contains no script lines")]
    NoScriptLines,

    #[error("reply JSON is malformed: {0}")]
    Json(String),
}

/// Why a single validated attempt did not produce a value.
#[derive(Debug, Error)]
pub enum AttemptFailure {
    #[error(transparent)]
    Generation(#[from] AgentError),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

#[derive(Debug, Error)]
pub enum InvocationError {
    #[error("no valid reply after {attempts} attempt(s); last failure: {last_failure}")]
    Exhausted {
        attempts: u32,
        /// Raw text of the last reply that reached validation, if any did.
        last_raw: Option<String>,
        last_failure: AttemptFailure,
    },
}
