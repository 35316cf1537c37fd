use std::str::FromStr;

use iq_core::model::TestMode;

use crate::error::ConfigError;

pub const DEFAULT_EXAM_SIZE: usize = 35;
pub const DEFAULT_PRACTICE_SIZE: usize = 10;
pub const DEFAULT_EXAM_TIME_LIMIT_SECS: u32 = 45 * 60;

/// Test sizing and timing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestConfig {
    pub exam_size: usize,
    pub practice_size: usize,
    pub exam_time_limit_secs: u32,
    pub order_by_difficulty: bool,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            exam_size: DEFAULT_EXAM_SIZE,
            practice_size: DEFAULT_PRACTICE_SIZE,
            exam_time_limit_secs: DEFAULT_EXAM_TIME_LIMIT_SECS,
            order_by_difficulty: true,
        }
    }
}

impl TestConfig {
    /// Read overrides from `IQ_EXAM_SIZE`, `IQ_PRACTICE_SIZE`,
    /// `IQ_EXAM_TIME_LIMIT_SECS` and `IQ_ORDER_BY_DIFFICULTY`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but unparsable, or a size
    /// or limit is zero.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env`, reading values through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` on unparsable or zero values.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let config = Self {
            exam_size: parse_var(&lookup, "IQ_EXAM_SIZE")?.unwrap_or(defaults.exam_size),
            practice_size: parse_var(&lookup, "IQ_PRACTICE_SIZE")?
                .unwrap_or(defaults.practice_size),
            exam_time_limit_secs: parse_var(&lookup, "IQ_EXAM_TIME_LIMIT_SECS")?
                .unwrap_or(defaults.exam_time_limit_secs),
            order_by_difficulty: parse_flag(&lookup, "IQ_ORDER_BY_DIFFICULTY")?
                .unwrap_or(defaults.order_by_difficulty),
        };
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    ///
    /// Returns `ConfigError::Zero` for a zero size or time limit.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.exam_size == 0 {
            return Err(ConfigError::Zero { key: "IQ_EXAM_SIZE" });
        }
        if self.practice_size == 0 {
            return Err(ConfigError::Zero {
                key: "IQ_PRACTICE_SIZE",
            });
        }
        if self.exam_time_limit_secs == 0 {
            return Err(ConfigError::Zero {
                key: "IQ_EXAM_TIME_LIMIT_SECS",
            });
        }
        Ok(())
    }

    #[must_use]
    pub fn size_for(&self, mode: TestMode) -> usize {
        match mode {
            TestMode::Practice => self.practice_size,
            TestMode::Exam => self.exam_size,
        }
    }

    /// Exams are timed; practice runs are not.
    #[must_use]
    pub fn time_limit_for(&self, mode: TestMode) -> Option<u32> {
        match mode {
            TestMode::Practice => None,
            TestMode::Exam => Some(self.exam_time_limit_secs),
        }
    }

    /// Only exams are presented easiest-first.
    #[must_use]
    pub fn orders_by_difficulty(&self, mode: TestMode) -> bool {
        mode == TestMode::Exam && self.order_by_difficulty
    }
}

fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<Option<T>, ConfigError> {
    lookup(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|_| ConfigError::Invalid { key, value: raw })
        })
        .transpose()
}

fn parse_flag(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<Option<bool>, ConfigError> {
    lookup(key)
        .map(|raw| match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::Invalid { key, value: raw }),
        })
        .transpose()
}
