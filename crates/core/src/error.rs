use thiserror::Error;

use crate::model::{CategoryError, ParseIdError, QuestionError, ResultError, SessionStateError};

/// Any error raised by the domain model.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    Category(#[from] CategoryError),
    #[error(transparent)]
    Session(#[from] SessionStateError),
    #[error(transparent)]
    Result(#[from] ResultError),
    #[error(transparent)]
    Id(#[from] ParseIdError),
}
