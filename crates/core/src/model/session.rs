use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::model::{Question, SessionId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionStateError {
    #[error("a session needs at least one question")]
    NoQuestions,

    #[error("session already completed")]
    Completed,

    #[error("answer {answer} is out of range for {options} options")]
    AnswerOutOfRange { answer: usize, options: usize },

    #[error("question index {index} is out of range for {total} questions")]
    QuestionOutOfRange { index: usize, total: usize },

    #[error("unknown test mode: {0}")]
    UnknownMode(String),
}

//
// ─── MODE ──────────────────────────────────────────────────────────────────────
//

/// How a session is taken: practice shows feedback, exam does not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestMode {
    Practice,
    Exam,
}

impl TestMode {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            TestMode::Practice => "practice",
            TestMode::Exam => "exam",
        }
    }
}

impl fmt::Display for TestMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for TestMode {
    type Err = SessionStateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "practice" => Ok(Self::Practice),
            "exam" => Ok(Self::Exam),
            _ => Err(SessionStateError::UnknownMode(s.to_owned())),
        }
    }
}

/// Outcome of moving the cursor forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// The cursor moved to the given index.
    Moved(usize),
    /// The cursor is on the last question; nothing moved.
    AtEnd,
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// One attempt at a fixed sequence of questions.
///
/// `answers` always has the same length as `questions`, and the cursor always
/// points at a valid question. After `complete` every mutation is rejected.
#[derive(Debug, Clone, PartialEq)]
pub struct TestSession {
    id: SessionId,
    mode: TestMode,
    started_at: DateTime<Utc>,
    ended_at: Option<DateTime<Utc>>,
    questions: Vec<Question>,
    answers: Vec<Option<usize>>,
    cursor: usize,
    time_spent_secs: u32,
}

impl TestSession {
    /// Create a fresh session over `questions` with every answer unset.
    ///
    /// # Errors
    ///
    /// Returns `SessionStateError::NoQuestions` if `questions` is empty.
    pub fn new(
        id: SessionId,
        mode: TestMode,
        questions: Vec<Question>,
        started_at: DateTime<Utc>,
    ) -> Result<Self, SessionStateError> {
        if questions.is_empty() {
            return Err(SessionStateError::NoQuestions);
        }
        let answers = vec![None; questions.len()];
        Ok(Self {
            id,
            mode,
            started_at,
            ended_at: None,
            questions,
            answers,
            cursor: 0,
            time_spent_secs: 0,
        })
    }

    #[must_use]
    pub fn id(&self) -> SessionId {
        self.id
    }

    #[must_use]
    pub fn mode(&self) -> TestMode {
        self.mode
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn ended_at(&self) -> Option<DateTime<Utc>> {
        self.ended_at
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn answers(&self) -> &[Option<usize>] {
        &self.answers
    }

    #[must_use]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    #[must_use]
    pub fn time_spent_secs(&self) -> u32 {
        self.time_spent_secs
    }

    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.ended_at.is_some()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    /// Always false; a session is created with at least one question.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    #[must_use]
    pub fn is_first(&self) -> bool {
        self.cursor == 0
    }

    #[must_use]
    pub fn is_last(&self) -> bool {
        self.cursor + 1 == self.questions.len()
    }

    #[must_use]
    pub fn current_question(&self) -> &Question {
        &self.questions[self.cursor]
    }

    #[must_use]
    pub fn current_answer(&self) -> Option<usize> {
        self.answers[self.cursor]
    }

    /// Number of questions with a recorded answer.
    #[must_use]
    pub fn answered_count(&self) -> usize {
        self.answers.iter().filter(|a| a.is_some()).count()
    }

    fn ensure_open(&self) -> Result<(), SessionStateError> {
        if self.is_completed() {
            return Err(SessionStateError::Completed);
        }
        Ok(())
    }

    /// Record `answer` for the question under the cursor, replacing any
    /// previous answer, and add `time_spent_secs` to the running total.
    ///
    /// # Errors
    ///
    /// Returns `SessionStateError::Completed` after completion and
    /// `SessionStateError::AnswerOutOfRange` for an invalid option index.
    pub fn record_answer(
        &mut self,
        answer: usize,
        time_spent_secs: u32,
    ) -> Result<(), SessionStateError> {
        self.ensure_open()?;
        let question = self.current_question();
        if !question.accepts(answer) {
            return Err(SessionStateError::AnswerOutOfRange {
                answer,
                options: question.option_count(),
            });
        }
        self.answers[self.cursor] = Some(answer);
        self.time_spent_secs = self.time_spent_secs.saturating_add(time_spent_secs);
        Ok(())
    }

    /// Move to the next question, or report that the cursor is on the last one.
    ///
    /// # Errors
    ///
    /// Returns `SessionStateError::Completed` after completion.
    pub fn advance(&mut self) -> Result<Advance, SessionStateError> {
        self.ensure_open()?;
        if self.is_last() {
            return Ok(Advance::AtEnd);
        }
        self.cursor += 1;
        Ok(Advance::Moved(self.cursor))
    }

    /// Move to the previous question; stays put on the first question.
    ///
    /// # Errors
    ///
    /// Returns `SessionStateError::Completed` after completion.
    pub fn retreat(&mut self) -> Result<usize, SessionStateError> {
        self.ensure_open()?;
        self.cursor = self.cursor.saturating_sub(1);
        Ok(self.cursor)
    }

    /// Jump directly to `index`.
    ///
    /// # Errors
    ///
    /// Returns `SessionStateError::Completed` after completion and
    /// `SessionStateError::QuestionOutOfRange` for an invalid index.
    pub fn go_to(&mut self, index: usize) -> Result<usize, SessionStateError> {
        self.ensure_open()?;
        if index >= self.questions.len() {
            return Err(SessionStateError::QuestionOutOfRange {
                index,
                total: self.questions.len(),
            });
        }
        self.cursor = index;
        Ok(self.cursor)
    }

    /// Mark the session as ended at `ended_at`.
    ///
    /// # Errors
    ///
    /// Returns `SessionStateError::Completed` if the session already ended.
    pub fn complete(&mut self, ended_at: DateTime<Utc>) -> Result<(), SessionStateError> {
        self.ensure_open()?;
        self.ended_at = Some(ended_at);
        Ok(())
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
