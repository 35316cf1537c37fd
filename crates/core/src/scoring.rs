//! Scoring engine: raw answers to IQ score, percentile and classification.
//!
//! Everything here is a pure function of its inputs. Nothing is cached and
//! nothing panics for well-formed input.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::model::{Category, CategoryScore, CategoryScores, Question};

/// Minimum IQ for MENSA-level qualification.
pub const MENSA_THRESHOLD: u32 = 130;

/// Upper end of the question difficulty scale, as `f64` for adjustments.
pub const DEFAULT_MAX_DIFFICULTY: f64 = 20.0;

/// `(minimum IQ, percentile)` pairs, highest first.
const PERCENTILE_TABLE: [(u32, f64); 21] = [
    (160, 99.99),
    (155, 99.98),
    (150, 99.96),
    (145, 99.87),
    (140, 99.62),
    (135, 99.0),
    (130, 98.0),
    (125, 95.0),
    (120, 91.0),
    (115, 84.0),
    (110, 75.0),
    (105, 63.0),
    (100, 50.0),
    (95, 37.0),
    (90, 25.0),
    (85, 16.0),
    (80, 9.0),
    (75, 5.0),
    (70, 2.0),
    (65, 1.0),
    (60, 0.4),
];

/// Saturating conversion for question counts.
#[must_use]
pub fn count_u32(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn round_to_u32(value: f64) -> u32 {
    if value.is_nan() || value <= 0.0 {
        return 0;
    }
    value.round().min(f64::from(u32::MAX)) as u32
}

/// Share of `correct` over `total` in percent, with `correct` clamped to `total`.
#[must_use]
pub fn percentage(correct: u32, total: u32) -> f64 {
    if total == 0 {
        return 0.0;
    }
    f64::from(correct.min(total)) / f64::from(total) * 100.0
}

/// `percentage` rounded to the nearest whole percent.
#[must_use]
pub fn rounded_percentage(correct: u32, total: u32) -> u32 {
    round_to_u32(percentage(correct, total))
}

/// Map a raw result onto the IQ scale.
///
/// The percentage correct is passed through a piecewise-linear curve that
/// reaches 60 at 0%, 100 at 70% and 145 at 97%. Returns 0 when `total` is 0.
#[must_use]
pub fn calculate_iq_score(correct: u32, total: u32) -> u32 {
    if total == 0 {
        return 0;
    }
    let pct = percentage(correct, total);

    let iq = if pct >= 97.0 {
        145.0 + (pct - 97.0) * 2.0
    } else if pct >= 90.0 {
        130.0 + (pct - 90.0) * 2.14
    } else if pct >= 80.0 {
        115.0 + (pct - 80.0) * 1.5
    } else if pct >= 70.0 {
        100.0 + (pct - 70.0) * 1.5
    } else if pct >= 50.0 {
        85.0 + (pct - 50.0) * 0.75
    } else {
        60.0 + pct * 0.5
    };

    round_to_u32(iq)
}

/// Population percentile for an IQ score.
///
/// Scores of 60 and above use the first matching table row. Below 60 the
/// percentile falls off linearly and bottoms out at 0.1.
#[must_use]
pub fn calculate_percentile(iq: u32) -> f64 {
    PERCENTILE_TABLE
        .iter()
        .find(|(min, _)| iq >= *min)
        .map_or_else(
            || ((f64::from(iq) - 55.0) * 0.32).max(0.1),
            |(_, pct)| *pct,
        )
}

//
// ─── CLASSIFICATION ────────────────────────────────────────────────────────────
//

/// Descriptive band for an IQ score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IqClassification {
    Genius,
    VerySuperior,
    Superior,
    HighAverage,
    Average,
    LowAverage,
    Low,
}

impl IqClassification {
    #[must_use]
    pub fn from_score(iq: u32) -> Self {
        match iq {
            145.. => Self::Genius,
            130..=144 => Self::VerySuperior,
            120..=129 => Self::Superior,
            110..=119 => Self::HighAverage,
            90..=109 => Self::Average,
            80..=89 => Self::LowAverage,
            _ => Self::Low,
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Genius => "Genius",
            Self::VerySuperior => "Very Superior",
            Self::Superior => "Superior",
            Self::HighAverage => "High Average",
            Self::Average => "Average",
            Self::LowAverage => "Low Average",
            Self::Low => "Low",
        }
    }

    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            Self::Genius => "Fewer than 0.13% of the population",
            Self::VerySuperior => "Qualifies for MENSA membership (top 2%)",
            Self::Superior => "Top 9%",
            Self::HighAverage => "Top 25%",
            Self::Average => "50% of the population",
            Self::LowAverage => "Bottom 25%",
            Self::Low => "Bottom 9%",
        }
    }

    /// Color tag used by front ends to render the band.
    #[must_use]
    pub fn color(self) -> &'static str {
        match self {
            Self::Genius => "purple",
            Self::VerySuperior => "indigo",
            Self::Superior => "blue",
            Self::HighAverage => "green",
            Self::Average => "yellow",
            Self::LowAverage => "orange",
            Self::Low => "red",
        }
    }
}

#[must_use]
pub fn classify(iq: u32) -> IqClassification {
    IqClassification::from_score(iq)
}

#[must_use]
pub fn is_mensa_qualified(iq: u32) -> bool {
    iq >= MENSA_THRESHOLD
}

//
// ─── AGGREGATION ───────────────────────────────────────────────────────────────
//

fn answer_at(answers: &[Option<usize>], index: usize) -> Option<usize> {
    answers.get(index).copied().flatten()
}

/// Number of questions whose answer at the same index is correct.
#[must_use]
pub fn count_correct(answers: &[Option<usize>], questions: &[Question]) -> u32 {
    let hits = questions
        .iter()
        .enumerate()
        .filter(|(i, q)| q.is_correct(answer_at(answers, *i)))
        .count();
    count_u32(hits)
}

/// Per-category breakdown for every category present in `questions`.
///
/// Missing answers count as incorrect.
#[must_use]
pub fn calculate_category_scores(
    answers: &[Option<usize>],
    questions: &[Question],
) -> CategoryScores {
    let mut tally: BTreeMap<Category, (u32, u32)> = BTreeMap::new();
    for (i, question) in questions.iter().enumerate() {
        let entry = tally.entry(question.category()).or_default();
        entry.1 += 1;
        if question.is_correct(answer_at(answers, i)) {
            entry.0 += 1;
        }
    }
    tally
        .into_iter()
        .map(|(category, (correct, total))| (category, CategoryScore::from_counts(correct, total)))
        .collect()
}

/// Mean difficulty of `questions`, 0.0 when empty.
#[must_use]
pub fn average_difficulty(questions: &[Question]) -> f64 {
    if questions.is_empty() {
        return 0.0;
    }
    let sum: f64 = questions.iter().map(|q| f64::from(q.difficulty())).sum();
    sum / f64::from(count_u32(questions.len()))
}

/// Scale `base` up by at most 20% according to how hard the questions were.
///
/// Optional post-processing; nothing in the crate applies it implicitly.
/// A non-positive `max_difficulty` leaves `base` unchanged.
#[must_use]
pub fn adjust_score_by_difficulty(base: u32, average_difficulty: f64, max_difficulty: f64) -> u32 {
    if max_difficulty.is_nan() || max_difficulty <= 0.0 || !average_difficulty.is_finite() {
        return base;
    }
    let factor = 1.0 + (average_difficulty / max_difficulty) * 0.2;
    round_to_u32(f64::from(base) * factor)
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
