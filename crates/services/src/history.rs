//! Past results and the performance profile derived from them.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;

use iq_core::model::Category;
use iq_core::scoring;
use storage::repository::{ResultRepository, ResultRow, StorageError, Storage};

/// Accuracy at or above this share marks a strength.
pub const STRENGTH_THRESHOLD: f64 = 80.0;
/// Accuracy below this share marks a weakness.
pub const WEAKNESS_THRESHOLD: f64 = 50.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CategoryAccuracy {
    pub correct: u32,
    pub total: u32,
    pub accuracy: f64,
}

/// Aggregate view over a set of results.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PerformanceProfile {
    pub attempts: u32,
    pub best_iq: Option<u32>,
    pub average_iq: Option<f64>,
    pub categories: BTreeMap<Category, CategoryAccuracy>,
    pub strengths: Vec<Category>,
    pub weaknesses: Vec<Category>,
}

impl PerformanceProfile {
    #[must_use]
    pub fn from_results(rows: &[ResultRow]) -> Self {
        let mut profile = Self {
            attempts: scoring::count_u32(rows.len()),
            ..Self::default()
        };
        if rows.is_empty() {
            return profile;
        }

        let mut iq_sum = 0_u64;
        for row in rows {
            let iq = row.result.iq_score();
            iq_sum += u64::from(iq);
            profile.best_iq = Some(profile.best_iq.map_or(iq, |best| best.max(iq)));

            for (category, score) in row.result.category_scores() {
                let slot = profile.categories.entry(*category).or_default();
                slot.correct = slot.correct.saturating_add(score.correct);
                slot.total = slot.total.saturating_add(score.total);
            }
        }
        #[allow(clippy::cast_precision_loss)]
        let average = iq_sum as f64 / f64::from(profile.attempts);
        profile.average_iq = Some(average);

        for (category, slot) in &mut profile.categories {
            slot.accuracy = scoring::percentage(slot.correct, slot.total);
            if slot.total == 0 {
                continue;
            }
            if slot.accuracy >= STRENGTH_THRESHOLD {
                profile.strengths.push(*category);
            } else if slot.accuracy < WEAKNESS_THRESHOLD {
                profile.weaknesses.push(*category);
            }
        }
        profile
    }
}

/// Read access to persisted results.
#[derive(Clone)]
pub struct HistoryService {
    results: Arc<dyn ResultRepository>,
}

impl HistoryService {
    #[must_use]
    pub fn new(results: Arc<dyn ResultRepository>) -> Self {
        Self { results }
    }

    #[must_use]
    pub fn from_storage(storage: &Storage) -> Self {
        Self::new(Arc::clone(&storage.results))
    }

    /// Most recent results, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the repository cannot be read.
    pub async fn recent(&self, limit: u32) -> Result<Vec<ResultRow>, StorageError> {
        self.results.list_results(limit).await
    }

    /// Profile over the most recent `limit` results.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the repository cannot be read.
    pub async fn profile(&self, limit: u32) -> Result<PerformanceProfile, StorageError> {
        let rows = self.recent(limit).await?;
        tracing::debug!("Building profile over {} results", rows.len());
        Ok(PerformanceProfile::from_results(&rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use iq_core::model::{CategoryScore, CategoryScores, SessionId, TestMode, TestResult};
    use iq_core::time::fixed_now;

    fn row(id: i64, iq: u32, logical: (u32, u32), spatial: (u32, u32)) -> ResultRow {
        let mut scores = CategoryScores::new();
        scores.insert(
            Category::Logical,
            CategoryScore::from_counts(logical.0, logical.1),
        );
        scores.insert(
            Category::Spatial,
            CategoryScore::from_counts(spatial.0, spatial.1),
        );
        let total = logical.1 + spatial.1;
        let correct = logical.0 + spatial.0;
        let result = TestResult::from_persisted(
            SessionId::generate(),
            TestMode::Exam,
            total,
            correct,
            iq,
            scoring::calculate_percentile(iq),
            scores,
            60,
            fixed_now(),
            fixed_now() + Duration::minutes(id),
        )
        .unwrap();
        ResultRow::new(id, result)
    }

    #[test]
    fn empty_history_has_no_scores() {
        let p = PerformanceProfile::from_results(&[]);
        assert_eq!(p.attempts, 0);
        assert_eq!(p.best_iq, None);
        assert_eq!(p.average_iq, None);
        assert!(p.strengths.is_empty());
    }

    #[test]
    fn aggregates_categories_across_results() {
        let rows = vec![row(1, 110, (5, 5), (1, 5)), row(2, 120, (4, 5), (2, 5))];
        let p = PerformanceProfile::from_results(&rows);

        assert_eq!(p.attempts, 2);
        assert_eq!(p.best_iq, Some(120));
        assert_eq!(p.average_iq, Some(115.0));
        let logical = p.categories[&Category::Logical];
        assert_eq!((logical.correct, logical.total), (9, 10));
        assert!((logical.accuracy - 90.0).abs() < 1e-9);
        assert_eq!(p.strengths, vec![Category::Logical]);
        assert_eq!(p.weaknesses, vec![Category::Spatial]);
    }

    #[tokio::test]
    async fn service_reads_from_repository() {
        let storage = Storage::in_memory();
        let first = row(0, 100, (3, 5), (3, 5));
        storage.results.append_result(&first.result).await.unwrap();

        let history = HistoryService::from_storage(&storage);
        let recent = history.recent(10).await.unwrap();
        assert_eq!(recent.len(), 1);
        let profile = history.profile(10).await.unwrap();
        assert_eq!(profile.best_iq, Some(100));
        assert!(profile.strengths.is_empty());
        assert!(profile.weaknesses.is_empty());
    }
}
