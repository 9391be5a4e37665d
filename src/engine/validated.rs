use tracing::{debug, warn};

use crate::engine::error::{AgentError, AttemptFailure, InvocationError, ValidationError};

/// Outcome of one call-then-validate attempt.
#[derive(Debug)]
pub enum Attempt<T> {
    Valid(T),
    Invalid { raw: String, error: ValidationError },
    Failed(AgentError),
}

/// A value that passed validation, with the number of calls it took.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validated<T> {
    pub value: T,
    pub attempts: u32,
}

pub fn attempt<T, C, V>(call: &mut C, validate: &V) -> Attempt<T>
where
    C: FnMut() -> Result<String, AgentError>,
    V: Fn(&str) -> Result<T, ValidationError>,
{
    match call() {
        Ok(raw) => match validate(&raw) {
            Ok(value) => Attempt::Valid(value),
            Err(error) => Attempt::Invalid { raw, error },
        },
        Err(error) => Attempt::Failed(error),
    }
}

/// Call `call` until `validate` accepts its output, at most `max_attempts`
/// times. A limit of zero is treated as one.
pub fn invoke<T, C, V>(
    label: &str,
    mut call: C,
    validate: V,
    max_attempts: u32,
) -> Result<Validated<T>, InvocationError>
where
    C: FnMut() -> Result<String, AgentError>,
    V: Fn(&str) -> Result<T, ValidationError>,
{
    let max_attempts = max_attempts.max(1);
    let mut last_raw = None;
    let mut n = 0;

    loop {
        n += 1;
        let failure = match attempt(&mut call, &validate) {
            Attempt::Valid(value) => {
                debug!(label, attempts = n, "reply accepted");
                return Ok(Validated { value, attempts: n });
            }
            Attempt::Invalid { raw, error } => {
                last_raw = Some(raw);
                AttemptFailure::Validation(error)
            }
            Attempt::Failed(error) => AttemptFailure::Generation(error),
        };

        if n >= max_attempts {
            warn!(label, attempts = n, error = %failure, "giving up");
            return Err(InvocationError::Exhausted {
                attempts: n,
                last_raw,
                last_failure: failure,
            });
        }

        debug!(label, attempt = n, max_attempts, error = %failure, "attempt failed, retrying");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn parse_number(raw: &str) -> Result<u32, ValidationError> {
        raw.trim().parse().map_err(|_| ValidationError::NotAnInteger {
            raw: raw.to_string(),
        })
    }

    #[test]
    fn test_returns_first_valid_reply() {
        let calls = Cell::new(0);

        let result = invoke(
            "test",
            || {
                calls.set(calls.get() + 1);
                Ok("7".to_string())
            },
            parse_number,
            10,
        )
        .unwrap();

        assert_eq!(result, Validated { value: 7, attempts: 1 });
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_retries_until_valid() {
        let replies = ["nope", "still no", "x", "42", "99"];
        let calls = Cell::new(0);

        let result = invoke(
            "test",
            || {
                let i = calls.get();
                calls.set(i + 1);
                Ok(replies[i].to_string())
            },
            parse_number,
            10,
        )
        .unwrap();

        assert_eq!(result.value, 42);
        assert_eq!(result.attempts, 4);
        assert_eq!(calls.get(), 4);
    }

    #[test]
    fn test_generation_failure_counts_as_attempt() {
        let calls = Cell::new(0);

        let result = invoke(
            "test",
            || {
                calls.set(calls.get() + 1);
                if calls.get() < 3 {
                    Err(AgentError::EmptyContent)
                } else {
                    Ok("5".to_string())
                }
            },
            parse_number,
            3,
        )
        .unwrap();

        assert_eq!(result.attempts, 3);
    }

    #[test]
    fn test_exhausted_after_max_attempts() {
        let calls = Cell::new(0);

        let err = invoke(
            "test",
            || {
                calls.set(calls.get() + 1);
                Ok(format!("bad {}", calls.get()))
            },
            parse_number,
            10,
        )
        .unwrap_err();

        assert_eq!(calls.get(), 10);
        let InvocationError::Exhausted {
            attempts,
            last_raw,
            last_failure,
        } = err;
        assert_eq!(attempts, 10);
        assert_eq!(last_raw.as_deref(), Some("bad 10"));
        assert!(matches!(
            last_failure,
            AttemptFailure::Validation(ValidationError::NotAnInteger { .. })
        ));
    }

    #[test]
    fn test_exhausted_by_generation_failures_has_no_raw() {
        let err = invoke(
            "test",
            || Err(AgentError::Status {
                status: 500,
                body: "boom".into(),
            }),
            parse_number,
            2,
        )
        .unwrap_err();

        let InvocationError::Exhausted {
            attempts,
            last_raw,
            last_failure,
        } = err;
        assert_eq!(attempts, 2);
        assert!(last_raw.is_none());
        assert!(matches!(
            last_failure,
            AttemptFailure::Generation(AgentError::Status { status: 500, .. })
        ));
    }

    #[test]
    fn test_zero_limit_still_calls_once() {
        let calls = Cell::new(0);

        let _ = invoke(
            "test",
            || {
                calls.set(calls.get() + 1);
                Ok("1".to_string())
            },
            parse_number,
            0,
        );

        assert_eq!(calls.get(), 1);
    }
}
