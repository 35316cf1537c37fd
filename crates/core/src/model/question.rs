use thiserror::Error;

use crate::model::{category::Category, ids::QuestionId};

pub const DIFFICULTY_MIN: u8 = 1;
pub const DIFFICULTY_MAX: u8 = 20;
pub const MIN_OPTIONS: usize = 2;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question prompt cannot be empty")]
    EmptyPrompt,

    #[error("question needs at least {min} options, got {count}", min = MIN_OPTIONS)]
    TooFewOptions { count: usize },

    #[error("option {index} is empty")]
    EmptyOption { index: usize },

    #[error("correct answer {correct} is out of range for {options} options")]
    CorrectAnswerOutOfRange { correct: usize, options: usize },

    #[error("difficulty must be between {min} and {max}, got {0}", min = DIFFICULTY_MIN, max = DIFFICULTY_MAX)]
    DifficultyOutOfRange(u8),

    #[error("time limit must be > 0")]
    ZeroTimeLimit,
}

//
// ─── QUESTION TYPES ────────────────────────────────────────────────────────────
//

/// Unvalidated question input, as read from a bank file or a form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionDraft {
    pub id: QuestionId,
    pub category: Category,
    pub difficulty: u8,
    pub prompt: String,
    pub options: Vec<String>,
    pub correct_answer: usize,
    pub time_limit_secs: u32,
    pub explanation: Option<String>,
}

impl QuestionDraft {
    /// Validate the draft into an immutable `Question`.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if the prompt or any option is blank, fewer than
    /// two options are given, the correct answer index is out of range, the
    /// difficulty is outside 1..=20, or the time limit is zero.
    pub fn validate(self) -> Result<Question, QuestionError> {
        if self.prompt.trim().is_empty() {
            return Err(QuestionError::EmptyPrompt);
        }
        if self.options.len() < MIN_OPTIONS {
            return Err(QuestionError::TooFewOptions {
                count: self.options.len(),
            });
        }
        if let Some(index) = self.options.iter().position(|o| o.trim().is_empty()) {
            return Err(QuestionError::EmptyOption { index });
        }
        if self.correct_answer >= self.options.len() {
            return Err(QuestionError::CorrectAnswerOutOfRange {
                correct: self.correct_answer,
                options: self.options.len(),
            });
        }
        if !(DIFFICULTY_MIN..=DIFFICULTY_MAX).contains(&self.difficulty) {
            return Err(QuestionError::DifficultyOutOfRange(self.difficulty));
        }
        if self.time_limit_secs == 0 {
            return Err(QuestionError::ZeroTimeLimit);
        }

        let explanation = self
            .explanation
            .map(|e| e.trim().to_owned())
            .filter(|e| !e.is_empty());

        Ok(Question {
            id: self.id,
            category: self.category,
            difficulty: self.difficulty,
            prompt: self.prompt.trim().to_owned(),
            options: self.options,
            correct_answer: self.correct_answer,
            time_limit_secs: self.time_limit_secs,
            explanation,
        })
    }
}

/// A validated, immutable bank question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    id: QuestionId,
    category: Category,
    difficulty: u8,
    prompt: String,
    options: Vec<String>,
    correct_answer: usize,
    time_limit_secs: u32,
    explanation: Option<String>,
}

impl Question {
    #[must_use]
    pub fn id(&self) -> &QuestionId {
        &self.id
    }

    #[must_use]
    pub fn category(&self) -> Category {
        self.category
    }

    #[must_use]
    pub fn difficulty(&self) -> u8 {
        self.difficulty
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    #[must_use]
    pub fn option_count(&self) -> usize {
        self.options.len()
    }

    #[must_use]
    pub fn correct_answer(&self) -> usize {
        self.correct_answer
    }

    #[must_use]
    pub fn time_limit_secs(&self) -> u32 {
        self.time_limit_secs
    }

    #[must_use]
    pub fn explanation(&self) -> Option<&str> {
        self.explanation.as_deref()
    }

    /// Returns true when `answer` selects the correct option.
    #[must_use]
    pub fn is_correct(&self, answer: Option<usize>) -> bool {
        answer == Some(self.correct_answer)
    }

    /// Returns true when `answer` is a valid option index for this question.
    #[must_use]
    pub fn accepts(&self, answer: usize) -> bool {
        answer < self.options.len()
    }

    /// Convert back into an editable draft.
    #[must_use]
    pub fn into_draft(self) -> QuestionDraft {
        QuestionDraft {
            id: self.id,
            category: self.category,
            difficulty: self.difficulty,
            prompt: self.prompt,
            options: self.options,
            correct_answer: self.correct_answer,
            time_limit_secs: self.time_limit_secs,
            explanation: self.explanation,
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
