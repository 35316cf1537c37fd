use iq_core::model::{Category, Question, QuestionId};

use super::{
    SqliteRepository,
    mapping::{map_question_row, ser, usize_to_i64},
};
use crate::repository::{QuestionBank, StorageError};

const SELECT_QUESTIONS: &str = r"
    SELECT id, category, difficulty, prompt, options, correct_answer,
           time_limit_secs, explanation
    FROM questions
";

fn map_rows(rows: &[sqlx::sqlite::SqliteRow]) -> Result<Vec<Question>, StorageError> {
    rows.iter().map(map_question_row).collect()
}

#[async_trait::async_trait]
impl QuestionBank for SqliteRepository {
    async fn list_all(&self) -> Result<Vec<Question>, StorageError> {
        let sql = format!("{SELECT_QUESTIONS} ORDER BY id ASC");
        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        map_rows(&rows)
    }

    async fn filter_by_category(&self, category: Category) -> Result<Vec<Question>, StorageError> {
        let sql = format!("{SELECT_QUESTIONS} WHERE category = ?1 ORDER BY id ASC");
        let rows = sqlx::query(&sql)
            .bind(category.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        map_rows(&rows)
    }

    async fn filter_by_difficulty_range(
        &self,
        min: u8,
        max: u8,
    ) -> Result<Vec<Question>, StorageError> {
        let sql = format!("{SELECT_QUESTIONS} WHERE difficulty BETWEEN ?1 AND ?2 ORDER BY id ASC");
        let rows = sqlx::query(&sql)
            .bind(i64::from(min))
            .bind(i64::from(max))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        map_rows(&rows)
    }

    async fn get_question(&self, id: &QuestionId) -> Result<Question, StorageError> {
        let sql = format!("{SELECT_QUESTIONS} WHERE id = ?1");
        let row = sqlx::query(&sql)
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?
            .ok_or(StorageError::NotFound)?;
        map_question_row(&row)
    }

    async fn upsert_question(&self, question: &Question) -> Result<(), StorageError> {
        let options = serde_json::to_string(question.options()).map_err(ser)?;

        sqlx::query(
            r"
            INSERT INTO questions (
                id, category, difficulty, prompt, options, correct_answer,
                time_limit_secs, explanation
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ON CONFLICT(id) DO UPDATE SET
                category = excluded.category,
                difficulty = excluded.difficulty,
                prompt = excluded.prompt,
                options = excluded.options,
                correct_answer = excluded.correct_answer,
                time_limit_secs = excluded.time_limit_secs,
                explanation = excluded.explanation
            ",
        )
        .bind(question.id().as_str())
        .bind(question.category().as_str())
        .bind(i64::from(question.difficulty()))
        .bind(question.prompt())
        .bind(options)
        .bind(usize_to_i64("correct_answer", question.correct_answer())?)
        .bind(i64::from(question.time_limit_secs()))
        .bind(question.explanation())
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(())
    }
}
