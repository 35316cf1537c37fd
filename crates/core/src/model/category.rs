use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;
use thiserror::Error;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CategoryError {
    #[error("unknown question category: {0}")]
    UnknownCategory(String),

    #[error("unknown difficulty level: {0}")]
    UnknownLevel(String),
}

//
// ─── CATEGORY ──────────────────────────────────────────────────────────────────
//

/// Cognitive-skill grouping used for the per-category score breakdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[non_exhaustive]
pub enum Category {
    Logical,
    Numerical,
    Spatial,
    Matrix,
    Verbal,
    Abstract,
    Memory,
    Pattern,
}

impl Category {
    pub const ALL: [Category; 8] = [
        Category::Logical,
        Category::Numerical,
        Category::Spatial,
        Category::Matrix,
        Category::Verbal,
        Category::Abstract,
        Category::Memory,
        Category::Pattern,
    ];

    /// Stable lower-case name, used for storage and serialization.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Logical => "logical",
            Category::Numerical => "numerical",
            Category::Spatial => "spatial",
            Category::Matrix => "matrix",
            Category::Verbal => "verbal",
            Category::Abstract => "abstract",
            Category::Memory => "memory",
            Category::Pattern => "pattern",
        }
    }

    /// Human-readable name for reports.
    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            Category::Logical => "Logical reasoning",
            Category::Numerical => "Numerical reasoning",
            Category::Spatial => "Spatial awareness",
            Category::Matrix => "Matrix reasoning",
            Category::Verbal => "Verbal reasoning",
            Category::Abstract => "Abstract reasoning",
            Category::Memory => "Memory",
            Category::Pattern => "Pattern recognition",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = CategoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == normalized)
            .ok_or_else(|| CategoryError::UnknownCategory(s.to_owned()))
    }
}

//
// ─── DIFFICULTY ────────────────────────────────────────────────────────────────
//

/// Difficulty levels offered for practice runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DifficultyLevel {
    Easy,
    Medium,
    Hard,
}

impl DifficultyLevel {
    /// Inclusive difficulty range covered by this level.
    #[must_use]
    pub fn range(self) -> RangeInclusive<u8> {
        match self {
            DifficultyLevel::Easy => 1..=7,
            DifficultyLevel::Medium => 8..=14,
            DifficultyLevel::Hard => 15..=20,
        }
    }

    #[must_use]
    pub fn contains(self, difficulty: u8) -> bool {
        self.range().contains(&difficulty)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            DifficultyLevel::Easy => "easy",
            DifficultyLevel::Medium => "medium",
            DifficultyLevel::Hard => "hard",
        }
    }
}

impl FromStr for DifficultyLevel {
    type Err = CategoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Self::Easy),
            "medium" => Ok(Self::Medium),
            "hard" => Ok(Self::Hard),
            _ => Err(CategoryError::UnknownLevel(s.to_owned())),
        }
    }
}

/// Coarse buckets used when summarizing a bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DifficultyBand {
    Easy,
    Medium,
    Hard,
    Expert,
}

impl DifficultyBand {
    #[must_use]
    pub fn from_difficulty(difficulty: u8) -> Self {
        match difficulty {
            0..=7 => Self::Easy,
            8..=14 => Self::Medium,
            15..=18 => Self::Hard,
            _ => Self::Expert,
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
