use chrono::{DateTime, Utc};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::model::{Category, SessionId, TestMode, TestSession};
use crate::scoring::{self, IqClassification};

#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum ResultError {
    #[error("completed_at is before started_at")]
    InvalidTimeRange,

    #[error("total correct ({correct}) exceeds total questions ({total})")]
    CorrectExceedsTotal { correct: u32, total: u32 },

    #[error("category totals ({sum}) do not match total questions ({total})")]
    CategoryMismatch { sum: u32, total: u32 },

    #[error("percentile must be within 0..=100, got {0}")]
    InvalidPercentile(f64),
}

//
// ─── CATEGORY SCORE ────────────────────────────────────────────────────────────
//

/// Correct/total counts for one category, with a rounded percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryScore {
    pub correct: u32,
    pub total: u32,
    pub percentage: u32,
}

impl CategoryScore {
    /// Build from raw counts; `correct` is clamped to `total` and the
    /// percentage is 0 when `total` is 0.
    #[must_use]
    pub fn from_counts(correct: u32, total: u32) -> Self {
        let correct = correct.min(total);
        Self {
            correct,
            total,
            percentage: scoring::rounded_percentage(correct, total),
        }
    }
}

/// Per-category breakdown, ordered by category.
pub type CategoryScores = BTreeMap<Category, CategoryScore>;

//
// ─── TEST RESULT ───────────────────────────────────────────────────────────────
//

/// Final, immutable outcome of a completed session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestResult {
    session_id: SessionId,
    mode: TestMode,
    total_questions: u32,
    total_correct: u32,
    iq_score: u32,
    percentile: f64,
    #[serde(serialize_with = "serialize_classification")]
    classification: IqClassification,
    mensa_qualified: bool,
    category_scores: CategoryScores,
    time_spent_secs: u32,
    started_at: DateTime<Utc>,
    completed_at: DateTime<Utc>,
}

/// Writes the band with its display attributes, not just the tag.
fn serialize_classification<S: Serializer>(
    classification: &IqClassification,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    let mut state = serializer.serialize_struct("IqClassification", 4)?;
    state.serialize_field("level", classification)?;
    state.serialize_field("label", classification.label())?;
    state.serialize_field("description", classification.description())?;
    state.serialize_field("color", classification.color())?;
    state.end()
}

impl TestResult {
    /// Score `session` as of `completed_at`.
    #[must_use]
    pub fn from_session(session: &TestSession, completed_at: DateTime<Utc>) -> Self {
        let total_questions = scoring::count_u32(session.len());
        let total_correct = scoring::count_correct(session.answers(), session.questions());
        let iq_score = scoring::calculate_iq_score(total_correct, total_questions);

        Self {
            session_id: session.id(),
            mode: session.mode(),
            total_questions,
            total_correct,
            iq_score,
            percentile: scoring::calculate_percentile(iq_score),
            classification: scoring::classify(iq_score),
            mensa_qualified: scoring::is_mensa_qualified(iq_score),
            category_scores: scoring::calculate_category_scores(
                session.answers(),
                session.questions(),
            ),
            time_spent_secs: session.time_spent_secs(),
            started_at: session.started_at(),
            completed_at,
        }
    }

    /// Rehydrate a result from persisted storage.
    ///
    /// # Errors
    ///
    /// Returns `ResultError` if the counts, timestamps, or percentile are inconsistent.
    #[allow(clippy::too_many_arguments)]
    pub fn from_persisted(
        session_id: SessionId,
        mode: TestMode,
        total_questions: u32,
        total_correct: u32,
        iq_score: u32,
        percentile: f64,
        category_scores: CategoryScores,
        time_spent_secs: u32,
        started_at: DateTime<Utc>,
        completed_at: DateTime<Utc>,
    ) -> Result<Self, ResultError> {
        if completed_at < started_at {
            return Err(ResultError::InvalidTimeRange);
        }
        if total_correct > total_questions {
            return Err(ResultError::CorrectExceedsTotal {
                correct: total_correct,
                total: total_questions,
            });
        }
        let sum = category_scores
            .values()
            .fold(0_u32, |acc, s| acc.saturating_add(s.total));
        if sum != total_questions {
            return Err(ResultError::CategoryMismatch {
                sum,
                total: total_questions,
            });
        }
        if !percentile.is_finite() || !(0.0..=100.0).contains(&percentile) {
            return Err(ResultError::InvalidPercentile(percentile));
        }

        Ok(Self {
            session_id,
            mode,
            total_questions,
            total_correct,
            iq_score,
            percentile,
            classification: scoring::classify(iq_score),
            mensa_qualified: scoring::is_mensa_qualified(iq_score),
            category_scores,
            time_spent_secs,
            started_at,
            completed_at,
        })
    }

    #[must_use]
    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    #[must_use]
    pub fn mode(&self) -> TestMode {
        self.mode
    }

    #[must_use]
    pub fn total_questions(&self) -> u32 {
        self.total_questions
    }

    #[must_use]
    pub fn total_correct(&self) -> u32 {
        self.total_correct
    }

    #[must_use]
    pub fn iq_score(&self) -> u32 {
        self.iq_score
    }

    #[must_use]
    pub fn percentile(&self) -> f64 {
        self.percentile
    }

    #[must_use]
    pub fn category_scores(&self) -> &CategoryScores {
        &self.category_scores
    }

    #[must_use]
    pub fn time_spent_secs(&self) -> u32 {
        self.time_spent_secs
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }

    #[must_use]
    pub fn classification(&self) -> IqClassification {
        self.classification
    }

    #[must_use]
    pub fn mensa_qualified(&self) -> bool {
        self.mensa_qualified
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Question, QuestionDraft, QuestionId};
    use crate::time::fixed_now;

    fn question(id: &str, category: Category, correct: usize) -> Question {
        QuestionDraft {
            id: QuestionId::new(id).unwrap(),
            category,
            difficulty: 10,
            prompt: "Which one?".into(),
            options: vec!["A".into(), "B".into(), "C".into(), "D".into()],
            correct_answer: correct,
            time_limit_secs: 60,
            explanation: None,
        }
        .validate()
        .unwrap()
    }

    #[test]
    fn result_from_perfect_session() {
        let questions: Vec<_> = (0..35)
            .map(|i| {
                let category = if i % 2 == 0 {
                    Category::Logical
                } else {
                    Category::Numerical
                };
                question(&format!("q{i}"), category, 1)
            })
            .collect();
        let mut session =
            TestSession::new(SessionId::generate(), TestMode::Exam, questions, fixed_now())
                .unwrap();
        loop {
            session.record_answer(1, 30).unwrap();
            if session.advance().unwrap() == crate::model::Advance::AtEnd {
                break;
            }
        }
        session.complete(fixed_now()).unwrap();

        let result = TestResult::from_session(&session, fixed_now());
        assert_eq!(result.total_questions(), 35);
        assert_eq!(result.total_correct(), 35);
        assert_eq!(result.iq_score(), 151);
        assert_eq!(result.percentile(), 99.96);
        assert!(result.mensa_qualified());
        assert_eq!(result.time_spent_secs(), 35 * 30);
        assert_eq!(result.category_scores()[&Category::Logical].total, 18);
        assert_eq!(result.category_scores()[&Category::Numerical].total, 17);
    }

    #[test]
    fn unanswered_session_scores_floor() {
        let questions = vec![question("a", Category::Matrix, 0)];
        let session =
            TestSession::new(SessionId::generate(), TestMode::Practice, questions, fixed_now())
                .unwrap();
        let result = TestResult::from_session(&session, fixed_now());
        assert_eq!(result.total_correct(), 0);
        assert_eq!(result.iq_score(), 60);
        assert!(!result.mensa_qualified());
        assert_eq!(
            result.category_scores()[&Category::Matrix],
            CategoryScore {
                correct: 0,
                total: 1,
                percentage: 0
            }
        );
    }

    #[test]
    fn from_persisted_validates_counts() {
        let mut scores = CategoryScores::new();
        scores.insert(Category::Logical, CategoryScore::from_counts(1, 2));

        let err = TestResult::from_persisted(
            SessionId::generate(),
            TestMode::Exam,
            3,
            1,
            85,
            16.0,
            scores.clone(),
            0,
            fixed_now(),
            fixed_now(),
        )
        .unwrap_err();
        assert_eq!(err, ResultError::CategoryMismatch { sum: 2, total: 3 });

        let err = TestResult::from_persisted(
            SessionId::generate(),
            TestMode::Exam,
            2,
            3,
            85,
            16.0,
            scores.clone(),
            0,
            fixed_now(),
            fixed_now(),
        )
        .unwrap_err();
        assert!(matches!(err, ResultError::CorrectExceedsTotal { .. }));

        let ok = TestResult::from_persisted(
            SessionId::generate(),
            TestMode::Exam,
            2,
            1,
            85,
            16.0,
            scores,
            0,
            fixed_now(),
            fixed_now(),
        )
        .unwrap();
        assert_eq!(ok.total_correct(), 1);
    }

    #[test]
    fn serialized_result_carries_classification_and_mensa_flag() {
        let mut scores = CategoryScores::new();
        scores.insert(Category::Logical, CategoryScore::from_counts(9, 10));
        let result = TestResult::from_persisted(
            SessionId::generate(),
            TestMode::Exam,
            10,
            9,
            132,
            98.0,
            scores,
            300,
            fixed_now(),
            fixed_now(),
        )
        .unwrap();

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["mensa_qualified"], true);
        assert_eq!(json["classification"]["level"], "very_superior");
        assert_eq!(json["classification"]["label"], "Very Superior");
        assert_eq!(json["classification"]["color"], "indigo");
        assert_eq!(
            json["classification"]["description"],
            "Qualifies for MENSA membership (top 2%)"
        );
        assert_eq!(json["percentile"], 98.0);
    }

    #[test]
    fn category_score_guards_zero_total() {
        let s = CategoryScore::from_counts(0, 0);
        assert_eq!(s.percentage, 0);
        let s = CategoryScore::from_counts(5, 3);
        assert_eq!(s.correct, 3);
        assert_eq!(s.percentage, 100);
    }
}
