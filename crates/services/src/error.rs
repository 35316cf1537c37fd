//! Shared error types for the services crate.

use thiserror::Error;

use iq_core::model::SessionStateError;
use storage::repository::StorageError;

/// Errors emitted by the session manager and the test workflow.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("no active test session")]
    NoActiveSession,
    #[error("a test session is already active; reset it first")]
    AlreadyActive,
    #[error("test session already completed")]
    AlreadyCompleted,
    #[error("question bank is empty")]
    EmptyBank,
    #[error("question bank has {available} questions, test needs {required}")]
    InsufficientQuestions { available: usize, required: usize },
    #[error("answer {answer} is out of range for {options} options")]
    AnswerOutOfRange { answer: usize, options: usize },
    #[error("question index {index} is out of range for {total} questions")]
    QuestionOutOfRange { index: usize, total: usize },
    #[error("feedback is only available in practice mode")]
    FeedbackUnavailable,
    #[error(transparent)]
    State(SessionStateError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl From<SessionStateError> for SessionError {
    fn from(err: SessionStateError) -> Self {
        match err {
            SessionStateError::Completed => Self::AlreadyCompleted,
            SessionStateError::NoQuestions => Self::EmptyBank,
            SessionStateError::AnswerOutOfRange { answer, options } => {
                Self::AnswerOutOfRange { answer, options }
            }
            SessionStateError::QuestionOutOfRange { index, total } => {
                Self::QuestionOutOfRange { index, total }
            }
            other => Self::State(other),
        }
    }
}

/// Errors emitted while reading `TestConfig`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
    #[error("{key} must be greater than zero")]
    Zero { key: &'static str },
}
