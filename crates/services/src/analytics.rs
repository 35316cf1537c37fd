//! Summary statistics over a question bank.

use std::collections::BTreeMap;

use serde::Serialize;

use iq_core::model::{Category, DifficultyBand, Question};
use iq_core::scoring;

/// Total and count of time limits for one category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CategoryTime {
    pub total_secs: u64,
    pub count: u32,
}

/// Time needed to work through the bank, based on per-question limits.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TimeEstimates {
    pub total_secs: u64,
    pub average_secs: f64,
    pub by_category: BTreeMap<Category, CategoryTime>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BankAnalytics {
    pub total: u32,
    pub by_category: BTreeMap<Category, u32>,
    pub by_band: BTreeMap<DifficultyBand, u32>,
    pub average_difficulty: f64,
    pub difficulty_distribution: BTreeMap<u8, u32>,
    pub time: TimeEstimates,
}

impl BankAnalytics {
    #[must_use]
    pub fn from_questions(questions: &[Question]) -> Self {
        let mut analytics = Self {
            total: scoring::count_u32(questions.len()),
            average_difficulty: scoring::average_difficulty(questions),
            ..Self::default()
        };

        for q in questions {
            *analytics.by_category.entry(q.category()).or_insert(0) += 1;
            *analytics
                .by_band
                .entry(DifficultyBand::from_difficulty(q.difficulty()))
                .or_insert(0) += 1;
            *analytics
                .difficulty_distribution
                .entry(q.difficulty())
                .or_insert(0) += 1;

            let secs = u64::from(q.time_limit_secs());
            analytics.time.total_secs = analytics.time.total_secs.saturating_add(secs);
            let slot = analytics.time.by_category.entry(q.category()).or_default();
            slot.total_secs = slot.total_secs.saturating_add(secs);
            slot.count += 1;
        }

        if analytics.total > 0 {
            #[allow(clippy::cast_precision_loss)]
            let total_secs = analytics.time.total_secs as f64;
            analytics.time.average_secs = total_secs / f64::from(analytics.total);
        }
        analytics
    }

    /// Number of questions in `category`.
    #[must_use]
    pub fn category_count(&self, category: Category) -> u32 {
        self.by_category.get(&category).copied().unwrap_or(0)
    }
}
