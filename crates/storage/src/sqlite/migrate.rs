use chrono::Utc;
use sqlx::SqlitePool;

use super::SqliteInitError;

const STATEMENTS_V1: [&str; 5] = [
    r"
        CREATE TABLE IF NOT EXISTS questions (
            id TEXT PRIMARY KEY,
            category TEXT NOT NULL,
            difficulty INTEGER NOT NULL CHECK (difficulty BETWEEN 1 AND 20),
            prompt TEXT NOT NULL,
            options TEXT NOT NULL,
            correct_answer INTEGER NOT NULL CHECK (correct_answer >= 0),
            time_limit_secs INTEGER NOT NULL CHECK (time_limit_secs > 0),
            explanation TEXT
        );
    ",
    r"
        CREATE INDEX IF NOT EXISTS idx_questions_category
            ON questions (category, id);
    ",
    r"
        CREATE INDEX IF NOT EXISTS idx_questions_difficulty
            ON questions (difficulty, id);
    ",
    r"
        CREATE TABLE IF NOT EXISTS test_results (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            session_id TEXT NOT NULL UNIQUE,
            mode TEXT NOT NULL CHECK (mode IN ('practice', 'exam')),
            total_questions INTEGER NOT NULL CHECK (total_questions >= 0),
            total_correct INTEGER NOT NULL CHECK (total_correct >= 0),
            iq_score INTEGER NOT NULL CHECK (iq_score >= 0),
            percentile REAL NOT NULL,
            category_scores TEXT NOT NULL,
            time_spent_secs INTEGER NOT NULL CHECK (time_spent_secs >= 0),
            started_at TEXT NOT NULL,
            completed_at TEXT NOT NULL
        );
    ",
    r"
        CREATE INDEX IF NOT EXISTS idx_test_results_completed
            ON test_results (completed_at, id);
    ",
];

/// Bring the schema up to date. Safe to call on every start.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), SqliteInitError> {
    async fn is_applied(pool: &SqlitePool, version: i64) -> Result<bool, sqlx::Error> {
        let row = sqlx::query("SELECT 1 FROM schema_migrations WHERE version = ?1")
            .bind(version)
            .fetch_optional(pool)
            .await?;
        Ok(row.is_some())
    }

    sqlx::query(
        r"
            CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL
            );
        ",
    )
    .execute(pool)
    .await?;

    // Version 1: question bank and result history.
    if !is_applied(pool, 1).await? {
        let mut tx = pool.begin().await?;

        for statement in STATEMENTS_V1 {
            sqlx::query(statement).execute(&mut *tx).await?;
        }

        sqlx::query(
            r"
                INSERT INTO schema_migrations (version, applied_at)
                VALUES (?1, ?2)
                ON CONFLICT(version) DO NOTHING
            ",
        )
        .bind(1_i64)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
    }

    Ok(())
}
