use iq_core::model::{CategoryScores, Question, SessionId, TestMode, TestResult};
use sqlx::Row;

use crate::repository::{QuestionRecord, ResultRow, StorageError};

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn u32_from_i64(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(crate) fn usize_to_i64(field: &'static str, v: usize) -> Result<i64, StorageError> {
    i64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} overflow")))
}

pub(crate) fn map_question_row(row: &sqlx::sqlite::SqliteRow) -> Result<Question, StorageError> {
    let id: String = row.try_get("id").map_err(ser)?;
    let category: String = row.try_get("category").map_err(ser)?;
    let difficulty: i64 = row.try_get("difficulty").map_err(ser)?;
    let options: String = row.try_get("options").map_err(ser)?;
    let correct_answer: i64 = row.try_get("correct_answer").map_err(ser)?;
    let time_limit_secs: i64 = row.try_get("time_limit_secs").map_err(ser)?;

    let record = QuestionRecord {
        id: id.parse().map_err(ser)?,
        category: category.parse().map_err(ser)?,
        difficulty: u8::try_from(difficulty)
            .map_err(|_| StorageError::Serialization(format!("invalid difficulty: {difficulty}")))?,
        prompt: row.try_get("prompt").map_err(ser)?,
        options: serde_json::from_str(&options).map_err(ser)?,
        correct_answer: usize::try_from(correct_answer).map_err(|_| {
            StorageError::Serialization(format!("invalid correct_answer: {correct_answer}"))
        })?,
        time_limit_secs: u32_from_i64("time_limit_secs", time_limit_secs)?,
        explanation: row.try_get("explanation").map_err(ser)?,
    };

    record.into_question().map_err(ser)
}

pub(crate) fn map_result_row(row: &sqlx::sqlite::SqliteRow) -> Result<TestResult, StorageError> {
    let session_id: String = row.try_get("session_id").map_err(ser)?;
    let mode: String = row.try_get("mode").map_err(ser)?;
    let category_scores: String = row.try_get("category_scores").map_err(ser)?;
    let category_scores: CategoryScores = serde_json::from_str(&category_scores).map_err(ser)?;

    TestResult::from_persisted(
        session_id.parse::<SessionId>().map_err(ser)?,
        mode.parse::<TestMode>().map_err(ser)?,
        u32_from_i64(
            "total_questions",
            row.try_get::<i64, _>("total_questions").map_err(ser)?,
        )?,
        u32_from_i64(
            "total_correct",
            row.try_get::<i64, _>("total_correct").map_err(ser)?,
        )?,
        u32_from_i64("iq_score", row.try_get::<i64, _>("iq_score").map_err(ser)?)?,
        row.try_get("percentile").map_err(ser)?,
        category_scores,
        u32_from_i64(
            "time_spent_secs",
            row.try_get::<i64, _>("time_spent_secs").map_err(ser)?,
        )?,
        row.try_get("started_at").map_err(ser)?,
        row.try_get("completed_at").map_err(ser)?,
    )
    .map_err(ser)
}

pub(crate) fn map_result_row_with_id(
    row: &sqlx::sqlite::SqliteRow,
) -> Result<ResultRow, StorageError> {
    let id: i64 = row.try_get("id").map_err(ser)?;
    Ok(ResultRow::new(id, map_result_row(row)?))
}
