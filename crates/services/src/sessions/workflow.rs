use std::sync::Arc;

use rand::Rng;

use iq_core::Clock;
use iq_core::model::{DifficultyLevel, Question, TestMode, TestResult};
use storage::repository::{QuestionBank, ResultRepository, Storage};

use super::manager::{Navigation, SessionManager, SessionStatus};
use crate::config::TestConfig;
use crate::error::SessionError;

/// A scored result together with its storage id.
#[derive(Debug, Clone, PartialEq)]
pub struct PersistedResult {
    pub id: i64,
    pub result: TestResult,
}

/// Outcome of advancing through the workflow.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    Moved(usize),
    /// The test was submitted and its result saved.
    Finished(PersistedResult),
}

/// Loads questions from the bank, hands out session managers and persists
/// their results.
#[derive(Clone)]
pub struct TestService {
    clock: Clock,
    config: TestConfig,
    questions: Arc<dyn QuestionBank>,
    results: Arc<dyn ResultRepository>,
}

impl TestService {
    #[must_use]
    pub fn new(
        clock: Clock,
        config: TestConfig,
        questions: Arc<dyn QuestionBank>,
        results: Arc<dyn ResultRepository>,
    ) -> Self {
        Self {
            clock,
            config,
            questions,
            results,
        }
    }

    #[must_use]
    pub fn from_storage(clock: Clock, config: TestConfig, storage: &Storage) -> Self {
        Self::new(
            clock,
            config,
            Arc::clone(&storage.questions),
            Arc::clone(&storage.results),
        )
    }

    #[must_use]
    pub fn config(&self) -> &TestConfig {
        &self.config
    }

    /// Exams need the full configured size. Practice runs shrink to the pool.
    fn manager_for(&self, mode: TestMode, available: usize) -> SessionManager {
        let manager = match mode {
            TestMode::Exam => SessionManager::for_mode(&self.config, mode),
            TestMode::Practice => SessionManager::new(
                mode,
                self.config.practice_size.min(available),
            ),
        };
        manager.with_clock(self.clock)
    }

    fn started(
        &self,
        mode: TestMode,
        pool: &[Question],
        manager: &SessionManager,
    ) {
        tracing::info!(
            "Started {} test: {} of {} questions",
            mode,
            manager.test_size(),
            pool.len()
        );
    }

    /// Start a test over the whole bank.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` if the bank cannot be read or is too small.
    pub async fn start(&self, mode: TestMode) -> Result<SessionManager, SessionError> {
        let pool = self.questions.list_all().await?;
        let mut manager = self.manager_for(mode, pool.len());
        manager.start_test(&pool)?;
        self.started(mode, &pool, &manager);
        Ok(manager)
    }

    /// Same as `start`, drawing questions with `rng`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` if the bank cannot be read or is too small.
    pub async fn start_with_rng<R: Rng + ?Sized>(
        &self,
        mode: TestMode,
        rng: &mut R,
    ) -> Result<SessionManager, SessionError> {
        let pool = self.questions.list_all().await?;
        let mut manager = self.manager_for(mode, pool.len());
        manager.start_test_with_rng(&pool, rng)?;
        self.started(mode, &pool, &manager);
        Ok(manager)
    }

    /// Start a practice run restricted to one difficulty level.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::EmptyBank` if no question matches the level.
    pub async fn start_practice(
        &self,
        level: DifficultyLevel,
    ) -> Result<SessionManager, SessionError> {
        let range = level.range();
        let pool = self
            .questions
            .filter_by_difficulty_range(*range.start(), *range.end())
            .await?;
        if pool.is_empty() {
            tracing::warn!("No {} questions in bank", level.as_str());
        }
        let mut manager = self.manager_for(TestMode::Practice, pool.len());
        manager.start_test(&pool)?;
        self.started(TestMode::Practice, &pool, &manager);
        Ok(manager)
    }

    /// Advance the manager; when that submits the test, save the result.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` for session or persistence failures.
    pub async fn next_question(&self, manager: &mut SessionManager) -> Result<Step, SessionError> {
        match manager.next_question()? {
            Navigation::Moved(index) => Ok(Step::Moved(index)),
            Navigation::Submitted => Ok(Step::Finished(self.persist(manager).await?)),
        }
    }

    /// Submit the test and save the result.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` for session or persistence failures.
    pub async fn submit(
        &self,
        manager: &mut SessionManager,
    ) -> Result<PersistedResult, SessionError> {
        manager.submit_test()?;
        self.persist(manager).await
    }

    /// Submit if still running, then save the result unless already saved.
    ///
    /// Use this to retry after a failed save.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NoActiveSession` for an idle manager, or
    /// `SessionError::Storage` if persistence fails.
    pub async fn finalize(
        &self,
        manager: &mut SessionManager,
    ) -> Result<PersistedResult, SessionError> {
        if manager.status() == SessionStatus::InProgress {
            manager.submit_test()?;
        }
        self.persist(manager).await
    }

    async fn persist(
        &self,
        manager: &mut SessionManager,
    ) -> Result<PersistedResult, SessionError> {
        let result = manager
            .result()
            .cloned()
            .ok_or(SessionError::NoActiveSession)?;
        if let Some(id) = manager.result_id() {
            return Ok(PersistedResult { id, result });
        }

        let id = self.results.append_result(&result).await.map_err(|e| {
            tracing::warn!("Failed to save result for session {}: {}", result.session_id(), e);
            e
        })?;
        manager.set_result_id(id);
        tracing::info!(
            "Saved result {}: IQ {} ({}/{} correct)",
            id,
            result.iq_score(),
            result.total_correct(),
            result.total_questions()
        );
        Ok(PersistedResult { id, result })
    }

    /// Seconds left before the exam time limit, `None` for untimed tests.
    #[must_use]
    pub fn remaining_secs(&self, manager: &SessionManager) -> Option<u32> {
        let limit = self.config.time_limit_for(manager.mode())?;
        let elapsed = manager.elapsed_secs()?;
        Some(limit.saturating_sub(elapsed))
    }

    #[must_use]
    pub fn is_time_up(&self, manager: &SessionManager) -> bool {
        self.remaining_secs(manager) == Some(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use iq_core::time::fixed_clock;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use storage::bank::sample_questions;
    use storage::repository::InMemoryRepository;

    fn service(config: TestConfig) -> (TestService, InMemoryRepository) {
        let repo = InMemoryRepository::with_questions(sample_questions().unwrap());
        let storage = Storage::from_in_memory(repo.clone());
        (
            TestService::from_storage(fixed_clock(), config, &storage),
            repo,
        )
    }

    #[tokio::test]
    async fn exam_uses_configured_size_and_order() {
        let (svc, _) = service(TestConfig::default());
        let manager = svc
            .start_with_rng(TestMode::Exam, &mut StdRng::seed_from_u64(1))
            .await
            .unwrap();
        let session = manager.session().unwrap();
        assert_eq!(session.len(), 35);
        assert!(
            session
                .questions()
                .windows(2)
                .all(|w| w[0].difficulty() <= w[1].difficulty())
        );
        assert_eq!(svc.remaining_secs(&manager), Some(2700));
        assert!(!svc.is_time_up(&manager));
    }

    #[tokio::test]
    async fn exam_time_runs_out_after_limit() {
        let config = TestConfig {
            exam_time_limit_secs: 600,
            ..TestConfig::default()
        };
        let (svc, _) = service(config);
        let manager = svc.start(TestMode::Exam).await.unwrap();

        let mut later = fixed_clock();
        later.advance(chrono::Duration::seconds(599));
        let manager = manager.with_clock(later);
        assert_eq!(svc.remaining_secs(&manager), Some(1));
        assert!(!svc.is_time_up(&manager));

        let mut later = fixed_clock();
        later.advance(chrono::Duration::seconds(601));
        let manager = manager.with_clock(later);
        assert_eq!(svc.remaining_secs(&manager), Some(0));
        assert!(svc.is_time_up(&manager));
    }

    #[tokio::test]
    async fn exam_larger_than_bank_fails() {
        let config = TestConfig {
            exam_size: 50,
            ..TestConfig::default()
        };
        let (svc, _) = service(config);
        assert!(matches!(
            svc.start(TestMode::Exam).await,
            Err(SessionError::InsufficientQuestions {
                available: 40,
                required: 50
            })
        ));
    }

    #[tokio::test]
    async fn practice_level_draws_from_level_only() {
        let (svc, _) = service(TestConfig::default());
        let manager = svc.start_practice(DifficultyLevel::Hard).await.unwrap();
        let session = manager.session().unwrap();
        assert_eq!(session.len(), 10);
        assert!(session.questions().iter().all(|q| q.difficulty() >= 15));
        assert_eq!(svc.remaining_secs(&manager), None);
    }

    #[tokio::test]
    async fn practice_shrinks_to_small_pool() {
        let config = TestConfig {
            practice_size: 100,
            ..TestConfig::default()
        };
        let (svc, _) = service(config);
        let manager = svc.start_practice(DifficultyLevel::Easy).await.unwrap();
        let easy = sample_questions()
            .unwrap()
            .iter()
            .filter(|q| DifficultyLevel::Easy.contains(q.difficulty()))
            .count();
        assert_eq!(manager.session().unwrap().len(), easy);
    }

    #[tokio::test]
    async fn empty_bank_cannot_start() {
        let storage = Storage::in_memory();
        let svc = TestService::from_storage(fixed_clock(), TestConfig::default(), &storage);
        assert!(matches!(
            svc.start(TestMode::Practice).await,
            Err(SessionError::EmptyBank)
        ));
    }

    #[tokio::test]
    async fn finalize_on_idle_manager_fails() {
        let (svc, _) = service(TestConfig::default());
        let mut manager = SessionManager::new(TestMode::Exam, 1);
        assert!(matches!(
            svc.finalize(&mut manager).await,
            Err(SessionError::NoActiveSession)
        ));
    }
}
