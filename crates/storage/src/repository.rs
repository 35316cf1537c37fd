use async_trait::async_trait;
use iq_core::model::{
    Category, Question, QuestionDraft, QuestionError, QuestionId, SessionId, TestResult,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Persisted and wire shape of a bank question.
///
/// Field names follow the JSON bank format (`question`, `correctAnswer`,
/// `timeLimit`), so bank files can be read straight into records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionRecord {
    pub id: QuestionId,
    pub category: Category,
    pub difficulty: u8,
    #[serde(rename = "question")]
    pub prompt: String,
    pub options: Vec<String>,
    pub correct_answer: usize,
    #[serde(rename = "timeLimit")]
    pub time_limit_secs: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

impl QuestionRecord {
    #[must_use]
    pub fn from_question(question: &Question) -> Self {
        Self {
            id: question.id().clone(),
            category: question.category(),
            difficulty: question.difficulty(),
            prompt: question.prompt().to_owned(),
            options: question.options().to_vec(),
            correct_answer: question.correct_answer(),
            time_limit_secs: question.time_limit_secs(),
            explanation: question.explanation().map(str::to_owned),
        }
    }

    /// Validate the record into a domain `Question`.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if the record violates question invariants.
    pub fn into_question(self) -> Result<Question, QuestionError> {
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
        .validate()
    }
}

/// A persisted result with its storage id.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultRow {
    pub id: i64,
    pub result: TestResult,
}

impl ResultRow {
    #[must_use]
    pub fn new(id: i64, result: TestResult) -> Self {
        Self { id, result }
    }
}

/// Read/write access to the question bank.
#[async_trait]
pub trait QuestionBank: Send + Sync {
    /// Every question, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the bank cannot be read.
    async fn list_all(&self) -> Result<Vec<Question>, StorageError>;

    /// Questions of one category, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the bank cannot be read.
    async fn filter_by_category(&self, category: Category) -> Result<Vec<Question>, StorageError>;

    /// Questions whose difficulty lies within `min..=max`, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the bank cannot be read.
    async fn filter_by_difficulty_range(
        &self,
        min: u8,
        max: u8,
    ) -> Result<Vec<Question>, StorageError>;

    /// Fetch one question by id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing, or other storage errors.
    async fn get_question(&self, id: &QuestionId) -> Result<Question, StorageError>;

    /// Insert a question or replace the one with the same id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the question cannot be stored.
    async fn upsert_question(&self, question: &Question) -> Result<(), StorageError>;
}

/// Append-only history of completed test results.
#[async_trait]
pub trait ResultRepository: Send + Sync {
    /// Persist a result and return its storage id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if a result for the same session is
    /// already stored, or other storage errors.
    async fn append_result(&self, result: &TestResult) -> Result<i64, StorageError>;

    /// Fetch a result by storage id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing, or other storage errors.
    async fn get_result(&self, id: i64) -> Result<TestResult, StorageError>;

    /// Most recent results first, at most `limit` rows.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the history cannot be read.
    async fn list_results(&self, limit: u32) -> Result<Vec<ResultRow>, StorageError>;
}

/// In-memory repository for tests and for running without a database.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    questions: Arc<Mutex<BTreeMap<QuestionId, Question>>>,
    results: Arc<Mutex<BTreeMap<i64, TestResult>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Repository pre-filled with `questions`; later duplicates replace earlier ones.
    #[must_use]
    pub fn with_questions(questions: impl IntoIterator<Item = Question>) -> Self {
        let map = questions
            .into_iter()
            .map(|q| (q.id().clone(), q))
            .collect();
        Self {
            questions: Arc::new(Mutex::new(map)),
            results: Arc::default(),
        }
    }

    fn filtered(
        &self,
        keep: impl Fn(&Question) -> bool,
    ) -> Result<Vec<Question>, StorageError> {
        let guard = self
            .questions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.values().filter(|q| keep(q)).cloned().collect())
    }
}

#[async_trait]
impl QuestionBank for InMemoryRepository {
    async fn list_all(&self) -> Result<Vec<Question>, StorageError> {
        self.filtered(|_| true)
    }

    async fn filter_by_category(&self, category: Category) -> Result<Vec<Question>, StorageError> {
        self.filtered(|q| q.category() == category)
    }

    async fn filter_by_difficulty_range(
        &self,
        min: u8,
        max: u8,
    ) -> Result<Vec<Question>, StorageError> {
        self.filtered(|q| (min..=max).contains(&q.difficulty()))
    }

    async fn get_question(&self, id: &QuestionId) -> Result<Question, StorageError> {
        let guard = self
            .questions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.get(id).cloned().ok_or(StorageError::NotFound)
    }

    async fn upsert_question(&self, question: &Question) -> Result<(), StorageError> {
        let mut guard = self
            .questions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(question.id().clone(), question.clone());
        Ok(())
    }
}

#[async_trait]
impl ResultRepository for InMemoryRepository {
    async fn append_result(&self, result: &TestResult) -> Result<i64, StorageError> {
        let mut guard = self
            .results
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let session_id: SessionId = result.session_id();
        if guard.values().any(|r| r.session_id() == session_id) {
            return Err(StorageError::Conflict);
        }
        let id = guard.keys().next_back().map_or(1, |last| last + 1);
        guard.insert(id, result.clone());
        Ok(id)
    }

    async fn get_result(&self, id: i64) -> Result<TestResult, StorageError> {
        let guard = self
            .results
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.get(&id).cloned().ok_or(StorageError::NotFound)
    }

    async fn list_results(&self, limit: u32) -> Result<Vec<ResultRow>, StorageError> {
        let guard = self
            .results
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let mut rows: Vec<ResultRow> = guard
            .iter()
            .map(|(id, r)| ResultRow::new(*id, r.clone()))
            .collect();
        rows.sort_by(|a, b| {
            b.result
                .completed_at()
                .cmp(&a.result.completed_at())
                .then(b.id.cmp(&a.id))
        });
        rows.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(rows)
    }
}

/// Question bank and result history behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub questions: Arc<dyn QuestionBank>,
    pub results: Arc<dyn ResultRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        Self::from_in_memory(InMemoryRepository::new())
    }

    #[must_use]
    pub fn from_in_memory(repo: InMemoryRepository) -> Self {
        let questions: Arc<dyn QuestionBank> = Arc::new(repo.clone());
        let results: Arc<dyn ResultRepository> = Arc::new(repo);
        Self { questions, results }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use iq_core::model::{TestMode, TestSession};
    use iq_core::time::fixed_now;

    fn question(id: &str, category: Category, difficulty: u8) -> Question {
        QuestionRecord {
            id: QuestionId::new(id).unwrap(),
            category,
            difficulty,
            prompt: format!("Prompt {id}"),
            options: vec!["A".into(), "B".into(), "C".into()],
            correct_answer: 2,
            time_limit_secs: 60,
            explanation: None,
        }
        .into_question()
        .unwrap()
    }

    fn result_for(q: Question, offset_secs: i64) -> TestResult {
        let mut session =
            TestSession::new(SessionId::generate(), TestMode::Exam, vec![q], fixed_now())
                .unwrap();
        session.record_answer(2, 12).unwrap();
        let at = fixed_now() + chrono::Duration::seconds(offset_secs);
        session.complete(at).unwrap();
        TestResult::from_session(&session, at)
    }

    #[tokio::test]
    async fn filters_by_category_and_difficulty() {
        let repo = InMemoryRepository::with_questions([
            question("b", Category::Logical, 3),
            question("a", Category::Numerical, 9),
            question("c", Category::Logical, 16),
        ]);

        let all = repo.list_all().await.unwrap();
        let ids: Vec<_> = all.iter().map(|q| q.id().as_str()).collect();
        assert_eq!(ids, ["a", "b", "c"]);

        let logical = repo.filter_by_category(Category::Logical).await.unwrap();
        assert_eq!(logical.len(), 2);

        let medium = repo.filter_by_difficulty_range(8, 14).await.unwrap();
        assert_eq!(medium.len(), 1);
        assert_eq!(medium[0].id().as_str(), "a");
    }

    #[tokio::test]
    async fn get_missing_question_is_not_found() {
        let repo = InMemoryRepository::new();
        let id = QuestionId::new("nope").unwrap();
        assert!(matches!(
            repo.get_question(&id).await,
            Err(StorageError::NotFound)
        ));
    }

    #[tokio::test]
    async fn results_list_newest_first_and_reject_duplicates() {
        let repo = InMemoryRepository::new();
        let older = result_for(question("q1", Category::Matrix, 5), 10);
        let newer = result_for(question("q2", Category::Matrix, 5), 20);

        let id_old = repo.append_result(&older).await.unwrap();
        let id_new = repo.append_result(&newer).await.unwrap();
        assert!(id_new > id_old);
        assert!(matches!(
            repo.append_result(&older).await,
            Err(StorageError::Conflict)
        ));

        let rows = repo.list_results(10).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].id, id_new);
        assert_eq!(repo.list_results(1).await.unwrap().len(), 1);
        assert_eq!(repo.get_result(id_old).await.unwrap(), older);
    }

    #[test]
    fn record_reads_bank_json_shape() {
        let json = r#"{
            "id": "logical_1",
            "category": "logical",
            "difficulty": 5,
            "question": "Which follows?",
            "options": ["yes", "no"],
            "correctAnswer": 0,
            "timeLimit": 90
        }"#;
        let record: QuestionRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.time_limit_secs, 90);
        assert_eq!(record.explanation, None);
        let q = record.into_question().unwrap();
        assert_eq!(q.category(), Category::Logical);
    }
}
