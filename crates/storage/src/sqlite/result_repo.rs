use iq_core::model::TestResult;

use super::{
    SqliteRepository,
    mapping::{map_result_row, map_result_row_with_id, ser},
};
use crate::repository::{ResultRepository, ResultRow, StorageError};

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

#[async_trait::async_trait]
impl ResultRepository for SqliteRepository {
    async fn append_result(&self, result: &TestResult) -> Result<i64, StorageError> {
        let category_scores = serde_json::to_string(result.category_scores()).map_err(ser)?;

        let res = sqlx::query(
            r"
                INSERT INTO test_results (
                    session_id, mode, total_questions, total_correct, iq_score,
                    percentile, category_scores, time_spent_secs, started_at, completed_at
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            ",
        )
        .bind(result.session_id().to_string())
        .bind(result.mode().as_str())
        .bind(i64::from(result.total_questions()))
        .bind(i64::from(result.total_correct()))
        .bind(i64::from(result.iq_score()))
        .bind(result.percentile())
        .bind(category_scores)
        .bind(i64::from(result.time_spent_secs()))
        .bind(result.started_at())
        .bind(result.completed_at())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                StorageError::Conflict
            } else {
                StorageError::Connection(e.to_string())
            }
        })?;

        Ok(res.last_insert_rowid())
    }

    async fn get_result(&self, id: i64) -> Result<TestResult, StorageError> {
        let row = sqlx::query(
            r"
                SELECT
                    session_id, mode, total_questions, total_correct, iq_score,
                    percentile, category_scores, time_spent_secs, started_at, completed_at
                FROM test_results
                WHERE id = ?1
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?
        .ok_or(StorageError::NotFound)?;

        map_result_row(&row)
    }

    async fn list_results(&self, limit: u32) -> Result<Vec<ResultRow>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT
                    id, session_id, mode, total_questions, total_correct, iq_score,
                    percentile, category_scores, time_spent_secs, started_at, completed_at
                FROM test_results
                ORDER BY completed_at DESC, id DESC
                LIMIT ?1
            ",
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        rows.iter().map(map_result_row_with_id).collect()
    }
}
