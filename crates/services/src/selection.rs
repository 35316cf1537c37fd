//! Question selection helpers.

use rand::Rng;
use rand::seq::SliceRandom;

use iq_core::model::{DifficultyLevel, Question};

/// Fisher-Yates shuffle of an owned list.
#[must_use]
pub fn shuffle<R: Rng + ?Sized>(mut questions: Vec<Question>, rng: &mut R) -> Vec<Question> {
    questions.shuffle(rng);
    questions
}

/// Up to `count` distinct questions drawn uniformly from `bank`.
#[must_use]
pub fn select_random<R: Rng + ?Sized>(
    bank: &[Question],
    count: usize,
    rng: &mut R,
) -> Vec<Question> {
    let mut picked = shuffle(bank.to_vec(), rng);
    picked.truncate(count);
    picked
}

/// Questions whose difficulty falls inside `level`.
#[must_use]
pub fn practice_pool(bank: &[Question], level: DifficultyLevel) -> Vec<Question> {
    bank.iter()
        .filter(|q| level.contains(q.difficulty()))
        .cloned()
        .collect()
}

/// Stable ascending sort by difficulty.
pub fn order_by_difficulty(questions: &mut [Question]) {
    questions.sort_by_key(Question::difficulty);
}
