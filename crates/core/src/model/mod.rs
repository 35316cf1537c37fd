mod category;
mod ids;
mod question;
mod result;
mod session;

pub use category::{Category, CategoryError, DifficultyBand, DifficultyLevel};
pub use ids::{ParseIdError, QuestionId, SessionId};

pub use question::{
    DIFFICULTY_MAX, DIFFICULTY_MIN, MIN_OPTIONS, Question, QuestionDraft, QuestionError,
};
pub use result::{CategoryScore, CategoryScores, ResultError, TestResult};
pub use session::{Advance, SessionStateError, TestMode, TestSession};
