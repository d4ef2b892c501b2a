//! Runtime failures.
//!
//! [`SequenceError`] is the value `generate_error` produces and stores in a
//! task's context. [`RuntimeError`] is everything that stops the reference
//! evaluator, including a raised [`SequenceError`] whose action is not
//! "continue".

use rtseq_sequence::{ErrorAction, ValueType};
use thiserror::Error;

/// A user-raised error, as stored in a task's last-error slot.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("error {code}: {message} ({action})")]
pub struct SequenceError {
    pub code: i32,
    pub message: String,
    pub action: ErrorAction,
}

impl SequenceError {
    #[must_use]
    pub fn new(code: i32, message: impl Into<String>, action: ErrorAction) -> Self {
        Self {
            code,
            message: message.into(),
            action,
        }
    }

    /// `true` when the raising task keeps running.
    #[must_use = "this is a pure check with no side effects"]
    pub fn continues(&self) -> bool {
        self.action == ErrorAction::ContinueSequenceExecution
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
#[must_use = "errors must not be silently ignored"]
pub enum RuntimeError {
    #[error("sequence stopped by {0}")]
    Sequence(#[from] SequenceError),

    #[error("undefined variable `{0}`")]
    UndefinedVariable(String),

    #[error("undefined channel reference `{0}`")]
    UndefinedChannel(String),

    #[error("undefined subroutine `{0}`")]
    UndefinedSubroutine(String),

    #[error("`{0}` finished without returning a value")]
    MissingReturnValue(String),

    #[error("division by zero")]
    DivisionByZero,

    #[error("index {index} is out of bounds for an array of length {len}")]
    IndexOutOfBounds { index: i128, len: usize },

    #[error("`{operation}` is not defined for `{found}`")]
    TypeMismatch {
        operation: String,
        found: ValueType,
    },

    #[error("`{callee}` expects {expected} argument(s), found {found}")]
    ArgumentCount {
        callee: String,
        expected: usize,
        found: usize,
    },

    #[error("step limit of {0} statements exceeded")]
    StepLimitExceeded(u64),
}

impl RuntimeError {
    pub(crate) fn type_mismatch(operation: impl Into<String>, found: ValueType) -> Self {
        RuntimeError::TypeMismatch {
            operation: operation.into(),
            found,
        }
    }
}

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_error_display() {
        let error = SequenceError::new(-100, "Stop now", ErrorAction::StopSequence);
        assert_eq!(error.to_string(), "error -100: Stop now (ErrorAction.StopSequence)");
        assert!(!error.continues());
    }

    #[test]
    fn raised_error_converts_into_runtime_error() {
        let error: RuntimeError = SequenceError::new(1, "x", ErrorAction::AbortSequence).into();
        assert!(matches!(error, RuntimeError::Sequence(SequenceError { code: 1, .. })));
    }
}
