use rand::Rng;

use iq_core::Clock;
use iq_core::model::{
    Advance, Question, SessionId, TestMode, TestResult, TestSession,
};

use super::progress::SessionProgress;
use crate::config::TestConfig;
use crate::error::SessionError;
use crate::selection;

/// Lifecycle of the managed session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Idle,
    InProgress,
    Completed,
}

/// Outcome of `SessionManager::next_question`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    /// The cursor moved to the given question index.
    Moved(usize),
    /// The last question was passed and the test was submitted.
    Submitted,
}

/// Practice-mode feedback for the question under the cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feedback {
    pub question_index: usize,
    pub selected: usize,
    pub correct_answer: usize,
    pub is_correct: bool,
    pub explanation: Option<String>,
}

//
// ─── MANAGER ───────────────────────────────────────────────────────────────────
//

/// Owns at most one test session and its result.
///
/// States move Idle -> InProgress -> Completed, and `reset_test` returns to
/// Idle from anywhere. Every mutation on an idle manager fails with
/// `NoActiveSession`; every mutation after completion fails with
/// `AlreadyCompleted`.
#[derive(Debug, Clone)]
pub struct SessionManager {
    mode: TestMode,
    test_size: usize,
    order_by_difficulty: bool,
    clock: Clock,
    session: Option<TestSession>,
    result: Option<TestResult>,
    result_id: Option<i64>,
}

impl SessionManager {
    /// Manager for `mode` drawing `test_size` questions per test.
    ///
    /// A size of zero is treated as one.
    #[must_use]
    pub fn new(mode: TestMode, test_size: usize) -> Self {
        Self {
            mode,
            test_size: test_size.max(1),
            order_by_difficulty: false,
            clock: Clock::default(),
            session: None,
            result: None,
            result_id: None,
        }
    }

    /// Manager sized and ordered according to `config` for `mode`.
    #[must_use]
    pub fn for_mode(config: &TestConfig, mode: TestMode) -> Self {
        Self::new(mode, config.size_for(mode))
            .with_order_by_difficulty(config.orders_by_difficulty(mode))
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Present selected questions easiest-first.
    #[must_use]
    pub fn with_order_by_difficulty(mut self, enabled: bool) -> Self {
        self.order_by_difficulty = enabled;
        self
    }

    #[must_use]
    pub fn mode(&self) -> TestMode {
        self.mode
    }

    #[must_use]
    pub fn test_size(&self) -> usize {
        self.test_size
    }

    #[must_use]
    pub fn status(&self) -> SessionStatus {
        match &self.session {
            None => SessionStatus::Idle,
            Some(s) if s.is_completed() => SessionStatus::Completed,
            Some(_) => SessionStatus::InProgress,
        }
    }

    #[must_use]
    pub fn session(&self) -> Option<&TestSession> {
        self.session.as_ref()
    }

    #[must_use]
    pub fn result(&self) -> Option<&TestResult> {
        self.result.as_ref()
    }

    /// Storage id of the persisted result, once the workflow saved it.
    #[must_use]
    pub fn result_id(&self) -> Option<i64> {
        self.result_id
    }

    pub(crate) fn set_result_id(&mut self, id: i64) {
        self.result_id = Some(id);
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        self.session.as_ref().map(TestSession::current_question)
    }

    #[must_use]
    pub fn progress(&self) -> Option<SessionProgress> {
        self.session.as_ref().map(SessionProgress::from_session)
    }

    /// Seconds since the session started, per the manager's clock.
    #[must_use]
    pub fn elapsed_secs(&self) -> Option<u32> {
        self.session
            .as_ref()
            .map(|s| self.clock.elapsed_secs_since(s.started_at()))
    }

    fn active_mut(&mut self) -> Result<&mut TestSession, SessionError> {
        match self.session.as_mut() {
            None => Err(SessionError::NoActiveSession),
            Some(s) if s.is_completed() => Err(SessionError::AlreadyCompleted),
            Some(s) => Ok(s),
        }
    }

    /// Start a test drawn from `bank` using the thread-local RNG.
    ///
    /// # Errors
    ///
    /// See `start_test_with_rng`.
    pub fn start_test(&mut self, bank: &[Question]) -> Result<&TestSession, SessionError> {
        self.start_test_with_rng(bank, &mut rand::rng())
    }

    /// Start a test of `test_size` distinct questions drawn uniformly from `bank`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::AlreadyActive` unless idle,
    /// `SessionError::EmptyBank` for an empty bank and
    /// `SessionError::InsufficientQuestions` when the bank is smaller than
    /// the test.
    pub fn start_test_with_rng<R: Rng + ?Sized>(
        &mut self,
        bank: &[Question],
        rng: &mut R,
    ) -> Result<&TestSession, SessionError> {
        if self.session.is_some() {
            return Err(SessionError::AlreadyActive);
        }
        if bank.is_empty() {
            return Err(SessionError::EmptyBank);
        }
        if bank.len() < self.test_size {
            return Err(SessionError::InsufficientQuestions {
                available: bank.len(),
                required: self.test_size,
            });
        }

        let mut questions = selection::select_random(bank, self.test_size, rng);
        if self.order_by_difficulty {
            selection::order_by_difficulty(&mut questions);
        }

        let session = TestSession::new(
            SessionId::generate(),
            self.mode,
            questions,
            self.clock.now(),
        )?;
        tracing::debug!(
            "Started {} session {} with {} questions",
            self.mode,
            session.id(),
            session.len()
        );

        self.result = None;
        self.result_id = None;
        Ok(self.session.insert(session))
    }

    /// Record `answer` for the current question, replacing any earlier answer.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::AnswerOutOfRange` for an invalid option index,
    /// besides the idle and completed errors.
    pub fn answer_question(
        &mut self,
        answer: usize,
        time_spent_secs: u32,
    ) -> Result<(), SessionError> {
        self.active_mut()?.record_answer(answer, time_spent_secs)?;
        Ok(())
    }

    /// Move forward; on the last question this submits the test instead.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` when idle or already completed.
    pub fn next_question(&mut self) -> Result<Navigation, SessionError> {
        let step = self.active_mut()?.advance()?;
        match step {
            Advance::Moved(index) => Ok(Navigation::Moved(index)),
            Advance::AtEnd => {
                self.submit_test()?;
                Ok(Navigation::Submitted)
            }
        }
    }

    /// Move back one question; no-op on the first question.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` when idle or already completed.
    pub fn previous_question(&mut self) -> Result<usize, SessionError> {
        Ok(self.active_mut()?.retreat()?)
    }

    /// Jump to question `index`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::QuestionOutOfRange` for an invalid index,
    /// besides the idle and completed errors.
    pub fn go_to_question(&mut self, index: usize) -> Result<usize, SessionError> {
        Ok(self.active_mut()?.go_to(index)?)
    }

    /// Finish the session and score it. Allowed exactly once per session.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` when idle or already completed.
    pub fn submit_test(&mut self) -> Result<&TestResult, SessionError> {
        let now = self.clock.now();
        let session = self.active_mut()?;
        session.complete(now)?;
        let result = TestResult::from_session(session, now);
        tracing::debug!(
            "Submitted session {}: {}/{} correct, IQ {}",
            result.session_id(),
            result.total_correct(),
            result.total_questions(),
            result.iq_score()
        );
        Ok(self.result.insert(result))
    }

    /// Score the session as it stands, without finishing it.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NoActiveSession` when idle.
    pub fn calculate_results(&self) -> Result<TestResult, SessionError> {
        let session = self.session.as_ref().ok_or(SessionError::NoActiveSession)?;
        let at = session.ended_at().unwrap_or_else(|| self.clock.now());
        Ok(TestResult::from_session(session, at))
    }

    /// Drop the session and any result. Always succeeds.
    pub fn reset_test(&mut self) {
        self.session = None;
        self.result = None;
        self.result_id = None;
    }

    /// Correctness of the current question once it has an answer.
    ///
    /// Returns `Ok(None)` while the current question is unanswered.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NoActiveSession` when idle and
    /// `SessionError::FeedbackUnavailable` outside practice mode.
    pub fn feedback(&self) -> Result<Option<Feedback>, SessionError> {
        let session = self.session.as_ref().ok_or(SessionError::NoActiveSession)?;
        if session.mode() != TestMode::Practice {
            return Err(SessionError::FeedbackUnavailable);
        }
        let Some(selected) = session.current_answer() else {
            return Ok(None);
        };
        let question = session.current_question();
        Ok(Some(Feedback {
            question_index: session.cursor(),
            selected,
            correct_answer: question.correct_answer(),
            is_correct: question.is_correct(Some(selected)),
            explanation: question.explanation().map(str::to_owned),
        }))
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use iq_core::model::{Category, QuestionDraft, QuestionId};
    use iq_core::time::{fixed_clock, fixed_now};
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::HashSet;

    fn bank(n: u8) -> Vec<Question> {
        (1..=n)
            .map(|i| {
                let category = if i % 2 == 0 {
                    Category::Logical
                } else {
                    Category::Numerical
                };
                QuestionDraft {
                    id: QuestionId::new(format!("q{i}")).unwrap(),
                    category,
                    difficulty: (i % 20) + 1,
                    prompt: format!("Prompt {i}"),
                    options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
                    correct_answer: usize::from(i % 4),
                    time_limit_secs: 60,
                    explanation: Some(format!("Because {i}")),
                }
                .validate()
                .unwrap()
            })
            .collect()
    }

    fn started(mode: TestMode, size: usize, bank_size: u8) -> SessionManager {
        let mut manager = SessionManager::new(mode, size).with_clock(fixed_clock());
        manager
            .start_test_with_rng(&bank(bank_size), &mut StdRng::seed_from_u64(11))
            .unwrap();
        manager
    }

    fn answer_current_correctly(manager: &mut SessionManager) {
        let correct = manager.current_question().unwrap().correct_answer();
        manager.answer_question(correct, 10).unwrap();
    }

    #[test]
    fn start_selects_distinct_questions_with_unset_answers() {
        let manager = started(TestMode::Exam, 2, 10);
        let session = manager.session().unwrap();
        assert_eq!(manager.status(), SessionStatus::InProgress);
        assert_eq!(session.len(), 2);
        assert_eq!(session.answers(), &[None, None]);
        assert_eq!(session.cursor(), 0);
        let ids: HashSet<_> = session.questions().iter().map(|q| q.id().clone()).collect();
        assert_eq!(ids.len(), 2);
        assert_eq!(session.started_at(), fixed_now());
    }

    #[test]
    fn start_rejects_small_or_empty_bank() {
        let mut manager = SessionManager::new(TestMode::Exam, 5);
        assert!(matches!(
            manager.start_test(&[]),
            Err(SessionError::EmptyBank)
        ));
        assert!(matches!(
            manager.start_test(&bank(3)),
            Err(SessionError::InsufficientQuestions {
                available: 3,
                required: 5
            })
        ));
        assert_eq!(manager.status(), SessionStatus::Idle);
    }

    #[test]
    fn start_while_active_is_rejected() {
        let mut manager = started(TestMode::Exam, 2, 4);
        assert!(matches!(
            manager.start_test(&bank(4)),
            Err(SessionError::AlreadyActive)
        ));
    }

    #[test]
    fn ordered_start_is_easiest_first() {
        let mut manager = SessionManager::new(TestMode::Exam, 8).with_order_by_difficulty(true);
        let session = manager
            .start_test_with_rng(&bank(20), &mut StdRng::seed_from_u64(5))
            .unwrap();
        assert!(
            session
                .questions()
                .windows(2)
                .all(|w| w[0].difficulty() <= w[1].difficulty())
        );
    }

    #[test]
    fn idle_manager_rejects_mutations() {
        let mut manager = SessionManager::new(TestMode::Exam, 2);
        assert!(matches!(
            manager.answer_question(0, 1),
            Err(SessionError::NoActiveSession)
        ));
        assert!(matches!(
            manager.next_question(),
            Err(SessionError::NoActiveSession)
        ));
        assert!(matches!(
            manager.previous_question(),
            Err(SessionError::NoActiveSession)
        ));
        assert!(matches!(
            manager.submit_test(),
            Err(SessionError::NoActiveSession)
        ));
        assert!(matches!(
            manager.calculate_results(),
            Err(SessionError::NoActiveSession)
        ));
        assert!(manager.progress().is_none());
        assert!(manager.current_question().is_none());
    }

    #[test]
    fn answer_out_of_range_is_rejected() {
        let mut manager = started(TestMode::Exam, 2, 4);
        assert!(matches!(
            manager.answer_question(4, 1),
            Err(SessionError::AnswerOutOfRange {
                answer: 4,
                options: 4
            })
        ));
        assert_eq!(manager.progress().unwrap().answered, 0);
    }

    #[test]
    fn navigation_moves_and_clamps() {
        let mut manager = started(TestMode::Exam, 3, 6);
        assert_eq!(manager.previous_question().unwrap(), 0);
        assert_eq!(manager.next_question().unwrap(), Navigation::Moved(1));
        assert_eq!(manager.go_to_question(2).unwrap(), 2);
        assert!(manager.progress().unwrap().is_last);
        assert!(matches!(
            manager.go_to_question(3),
            Err(SessionError::QuestionOutOfRange { index: 3, total: 3 })
        ));
        assert_eq!(manager.previous_question().unwrap(), 1);
    }

    #[test]
    fn next_on_last_question_submits() {
        let mut manager = started(TestMode::Exam, 2, 4);
        answer_current_correctly(&mut manager);
        assert_eq!(manager.next_question().unwrap(), Navigation::Moved(1));
        answer_current_correctly(&mut manager);
        assert_eq!(manager.next_question().unwrap(), Navigation::Submitted);

        assert_eq!(manager.status(), SessionStatus::Completed);
        let result = manager.result().unwrap();
        assert_eq!(result.total_correct(), 2);
        assert_eq!(result.time_spent_secs(), 20);
        assert_eq!(result.completed_at(), fixed_now());
    }

    #[test]
    fn completed_session_rejects_mutations() {
        let mut manager = started(TestMode::Exam, 2, 4);
        manager.submit_test().unwrap();
        assert!(matches!(
            manager.submit_test(),
            Err(SessionError::AlreadyCompleted)
        ));
        assert!(matches!(
            manager.answer_question(0, 1),
            Err(SessionError::AlreadyCompleted)
        ));
        assert!(matches!(
            manager.next_question(),
            Err(SessionError::AlreadyCompleted)
        ));
        assert!(matches!(
            manager.go_to_question(0),
            Err(SessionError::AlreadyCompleted)
        ));
        assert!(manager.calculate_results().is_ok());
    }

    #[test]
    fn unanswered_submission_scores_sixty() {
        let mut manager = started(TestMode::Exam, 3, 5);
        let result = manager.submit_test().unwrap();
        assert_eq!(result.total_correct(), 0);
        assert_eq!(result.iq_score(), 60);
    }

    #[test]
    fn preview_does_not_finish_session() {
        let mut manager = started(TestMode::Exam, 2, 4);
        answer_current_correctly(&mut manager);
        let preview = manager.calculate_results().unwrap();
        assert_eq!(preview.total_correct(), 1);
        assert_eq!(manager.status(), SessionStatus::InProgress);
        assert!(manager.result().is_none());
    }

    #[test]
    fn reset_is_idempotent() {
        let mut manager = started(TestMode::Exam, 2, 4);
        manager.submit_test().unwrap();
        manager.reset_test();
        manager.reset_test();
        assert_eq!(manager.status(), SessionStatus::Idle);
        assert!(manager.result().is_none());
        assert!(manager.start_test(&bank(4)).is_ok());
    }

    #[test]
    fn feedback_only_in_practice() {
        let mut exam = started(TestMode::Exam, 2, 4);
        exam.answer_question(0, 1).unwrap();
        assert!(matches!(
            exam.feedback(),
            Err(SessionError::FeedbackUnavailable)
        ));

        let mut practice = started(TestMode::Practice, 2, 4);
        assert_eq!(practice.feedback().unwrap(), None);
        let correct = practice.current_question().unwrap().correct_answer();
        let wrong = (correct + 1) % 4;
        practice.answer_question(wrong, 5).unwrap();
        let feedback = practice.feedback().unwrap().unwrap();
        assert!(!feedback.is_correct);
        assert_eq!(feedback.selected, wrong);
        assert_eq!(feedback.correct_answer, correct);
        assert!(feedback.explanation.is_some());
    }

    #[test]
    fn progress_and_elapsed_follow_clock() {
        let mut clock = fixed_clock();
        let mut manager = SessionManager::new(TestMode::Exam, 4).with_clock(clock);
        manager
            .start_test_with_rng(&bank(8), &mut StdRng::seed_from_u64(2))
            .unwrap();
        answer_current_correctly(&mut manager);
        let progress = manager.progress().unwrap();
        assert_eq!(progress.total, 4);
        assert_eq!(progress.answered, 1);
        assert_eq!(progress.percent, 25);
        assert!(progress.is_first);

        clock.advance(Duration::seconds(30));
        let manager = manager.with_clock(clock);
        assert_eq!(manager.elapsed_secs(), Some(30));
    }

    #[test]
    fn for_mode_uses_config() {
        let config = TestConfig::default();
        let exam = SessionManager::for_mode(&config, TestMode::Exam);
        assert_eq!(exam.test_size(), 35);
        let practice = SessionManager::for_mode(&config, TestMode::Practice);
        assert_eq!(practice.test_size(), 10);
        assert_eq!(practice.mode(), TestMode::Practice);
    }
}
