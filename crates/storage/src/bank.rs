//! JSON question banks.
//!
//! A bank file is a JSON array of [`QuestionRecord`]s. Every record is
//! validated and ids must be unique within the file.

use std::collections::HashSet;
use std::path::Path;

use iq_core::model::{Question, QuestionError, QuestionId};
use thiserror::Error;

use crate::repository::QuestionRecord;

const SAMPLE_BANK: &str = include_str!("../data/sample_questions.json");

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BankLoadError {
    #[error("failed to read bank file: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed bank json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid question {id}: {source}")]
    Invalid {
        id: QuestionId,
        #[source]
        source: QuestionError,
    },

    #[error("duplicate question id: {0}")]
    DuplicateId(QuestionId),
}

/// Parse and validate a bank from JSON text.
///
/// # Errors
///
/// Returns `BankLoadError` on malformed JSON, an invalid question, or a
/// repeated id.
pub fn parse_questions(json: &str) -> Result<Vec<Question>, BankLoadError> {
    let records: Vec<QuestionRecord> = serde_json::from_str(json)?;
    let mut seen = HashSet::with_capacity(records.len());
    let mut questions = Vec::with_capacity(records.len());

    for record in records {
        let id = record.id.clone();
        if !seen.insert(id.clone()) {
            return Err(BankLoadError::DuplicateId(id));
        }
        let question = record
            .into_question()
            .map_err(|source| BankLoadError::Invalid { id, source })?;
        questions.push(question);
    }

    Ok(questions)
}

/// Read a bank file from disk.
///
/// # Errors
///
/// Returns `BankLoadError` if the file cannot be read or fails to parse.
pub fn load_file(path: &Path) -> Result<Vec<Question>, BankLoadError> {
    let text = std::fs::read_to_string(path)?;
    parse_questions(&text)
}

/// The built-in sample bank: five questions per category across the whole
/// difficulty scale.
///
/// # Errors
///
/// Returns `BankLoadError` only if the embedded bank is corrupt.
pub fn sample_questions() -> Result<Vec<Question>, BankLoadError> {
    parse_questions(SAMPLE_BANK)
}

#[cfg(test)]
mod tests {
    use super::*;
    use iq_core::model::{Category, DifficultyLevel};

    #[test]
    fn sample_bank_is_valid_and_covers_every_category() {
        let bank = sample_questions().unwrap();
        assert_eq!(bank.len(), 40);
        for category in Category::ALL {
            let count = bank.iter().filter(|q| q.category() == category).count();
            assert_eq!(count, 5, "{category}");
        }
    }

    #[test]
    fn sample_bank_fills_every_practice_level() {
        let bank = sample_questions().unwrap();
        for level in [
            DifficultyLevel::Easy,
            DifficultyLevel::Medium,
            DifficultyLevel::Hard,
        ] {
            let count = bank.iter().filter(|q| level.contains(q.difficulty())).count();
            assert!(count >= 10, "{} has {count}", level.as_str());
        }
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let json = r#"[
            {"id": "a", "category": "verbal", "difficulty": 2, "question": "Q",
             "options": ["x", "y"], "correctAnswer": 0, "timeLimit": 30},
            {"id": "a", "category": "verbal", "difficulty": 3, "question": "Q2",
             "options": ["x", "y"], "correctAnswer": 1, "timeLimit": 30}
        ]"#;
        let err = parse_questions(json).unwrap_err();
        assert!(matches!(err, BankLoadError::DuplicateId(id) if id.as_str() == "a"));
    }

    #[test]
    fn invalid_question_reports_id() {
        let json = r#"[
            {"id": "bad", "category": "logical", "difficulty": 2, "question": "Q",
             "options": ["x", "y"], "correctAnswer": 5, "timeLimit": 30}
        ]"#;
        let err = parse_questions(json).unwrap_err();
        assert!(matches!(
            err,
            BankLoadError::Invalid {
                source: QuestionError::CorrectAnswerOutOfRange { .. },
                ..
            }
        ));
    }

    #[test]
    fn unknown_category_is_malformed() {
        let json = r#"[
            {"id": "v", "category": "visual", "difficulty": 2, "question": "Q",
             "options": ["x", "y"], "correctAnswer": 0, "timeLimit": 30}
        ]"#;
        assert!(matches!(parse_questions(json), Err(BankLoadError::Json(_))));
    }
}
