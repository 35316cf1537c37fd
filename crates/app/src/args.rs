use std::fmt;

use iq_core::model::{DifficultyLevel, TestMode};

pub const DEFAULT_DB_URL: &str = "sqlite:iq.sqlite3";
pub const DEFAULT_HISTORY_LIMIT: u32 = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgsError {
    MissingCommand,
    MissingValue { flag: &'static str },
    UnknownArg(String),
    UnknownCommand(String),
    InvalidDbUrl { raw: String },
    InvalidNumber { flag: &'static str, raw: String },
    InvalidLevel { raw: String },
    LevelRequiresPractice,
    CorrectExceedsTotal { correct: u32, total: u32 },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingCommand => write!(f, "missing subcommand"),
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::UnknownCommand(cmd) => write!(f, "unknown subcommand: {cmd}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidNumber { flag, raw } => write!(f, "invalid {flag} value: {raw}"),
            ArgsError::InvalidLevel { raw } => {
                write!(f, "invalid --level value: {raw} (easy, medium, hard)")
            }
            ArgsError::LevelRequiresPractice => write!(f, "--level only applies to practice"),
            ArgsError::CorrectExceedsTotal { correct, total } => {
                write!(f, "correct ({correct}) exceeds total ({total})")
            }
        }
    }
}

impl std::error::Error for ArgsError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Take {
        mode: TestMode,
        level: Option<DifficultyLevel>,
    },
    Stats {
        json: bool,
    },
    History {
        limit: u32,
        json: bool,
    },
    Score {
        correct: u32,
        total: u32,
    },
    Help,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Args {
    pub db_url: String,
    pub command: Command,
}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn parse_number(raw: String, flag: &'static str) -> Result<u32, ArgsError> {
    raw.trim()
        .parse()
        .map_err(|_| ArgsError::InvalidNumber { flag, raw })
}

impl Args {
    /// Parse `argv` without the program name. `db_url` is the fallback
    /// used when `--db` is absent.
    pub fn parse(
        argv: impl IntoIterator<Item = String>,
        db_url: String,
    ) -> Result<Self, ArgsError> {
        let mut args = argv.into_iter();
        let mut db_url = db_url;

        let command = match args.next().as_deref() {
            None => return Err(ArgsError::MissingCommand),
            Some("--help" | "-h" | "help") => Command::Help,
            Some("take") => Self::parse_take(&mut args, &mut db_url)?,
            Some("stats") => {
                let mut json = false;
                while let Some(arg) = args.next() {
                    match arg.as_str() {
                        "--json" => json = true,
                        _ => Self::parse_common(arg, &mut args, &mut db_url)?,
                    }
                }
                Command::Stats { json }
            }
            Some("history") => {
                let mut json = false;
                let mut limit = DEFAULT_HISTORY_LIMIT;
                while let Some(arg) = args.next() {
                    match arg.as_str() {
                        "--json" => json = true,
                        "--limit" => {
                            limit = parse_number(require_value(&mut args, "--limit")?, "--limit")?;
                        }
                        _ => Self::parse_common(arg, &mut args, &mut db_url)?,
                    }
                }
                Command::History { limit, json }
            }
            Some("score") => {
                let correct = parse_number(require_value(&mut args, "<correct>")?, "<correct>")?;
                let total = parse_number(require_value(&mut args, "<total>")?, "<total>")?;
                if let Some(extra) = args.next() {
                    return Err(ArgsError::UnknownArg(extra));
                }
                if correct > total {
                    return Err(ArgsError::CorrectExceedsTotal { correct, total });
                }
                Command::Score { correct, total }
            }
            Some(other) => return Err(ArgsError::UnknownCommand(other.to_owned())),
        };

        Ok(Self { db_url, command })
    }

    fn parse_take(
        args: &mut impl Iterator<Item = String>,
        db_url: &mut String,
    ) -> Result<Command, ArgsError> {
        let mut mode = TestMode::Exam;
        let mut level = None;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "exam" => mode = TestMode::Exam,
                "practice" => mode = TestMode::Practice,
                "--level" => {
                    let raw = require_value(args, "--level")?;
                    level = Some(
                        raw.parse::<DifficultyLevel>()
                            .map_err(|_| ArgsError::InvalidLevel { raw })?,
                    );
                }
                _ => Self::parse_common(arg, args, db_url)?,
            }
        }

        if level.is_some() && mode != TestMode::Practice {
            return Err(ArgsError::LevelRequiresPractice);
        }
        Ok(Command::Take { mode, level })
    }

    fn parse_common(
        arg: String,
        args: &mut impl Iterator<Item = String>,
        db_url: &mut String,
    ) -> Result<(), ArgsError> {
        match arg.as_str() {
            "--db" => {
                let value = require_value(args, "--db")?;
                if value.trim().is_empty() {
                    return Err(ArgsError::InvalidDbUrl { raw: value });
                }
                *db_url = value;
                Ok(())
            }
            _ => Err(ArgsError::UnknownArg(arg)),
        }
    }
}

pub fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  iq take [exam|practice] [--level easy|medium|hard] [--db <sqlite_url>]");
    eprintln!("  iq stats [--json] [--db <sqlite_url>]");
    eprintln!("  iq history [--limit <n>] [--json] [--db <sqlite_url>]");
    eprintln!("  iq score <correct> <total>");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db {DEFAULT_DB_URL}");
    eprintln!("  --limit {DEFAULT_HISTORY_LIMIT}");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  IQ_DB_URL, IQ_EXAM_SIZE, IQ_PRACTICE_SIZE, IQ_EXAM_TIME_LIMIT_SECS,");
    eprintln!("  IQ_ORDER_BY_DIFFICULTY, RUST_LOG");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> Result<Args, ArgsError> {
        Args::parse(
            argv.iter().map(|s| (*s).to_owned()),
            DEFAULT_DB_URL.to_owned(),
        )
    }

    #[test]
    fn take_defaults_to_exam() {
        let args = parse(&["take"]).unwrap();
        assert_eq!(args.db_url, DEFAULT_DB_URL);
        assert_eq!(
            args.command,
            Command::Take {
                mode: TestMode::Exam,
                level: None
            }
        );
    }

    #[test]
    fn take_practice_with_level_and_db() {
        let args = parse(&["take", "practice", "--level", "Hard", "--db", "sqlite::memory:"])
            .unwrap();
        assert_eq!(args.db_url, "sqlite::memory:");
        assert_eq!(
            args.command,
            Command::Take {
                mode: TestMode::Practice,
                level: Some(DifficultyLevel::Hard)
            }
        );
    }

    #[test]
    fn level_needs_practice() {
        assert_eq!(
            parse(&["take", "exam", "--level", "easy"]).unwrap_err(),
            ArgsError::LevelRequiresPractice
        );
        assert!(matches!(
            parse(&["take", "practice", "--level", "extreme"]).unwrap_err(),
            ArgsError::InvalidLevel { .. }
        ));
    }

    #[test]
    fn history_and_stats_flags() {
        assert_eq!(
            parse(&["history", "--limit", "3", "--json"]).unwrap().command,
            Command::History {
                limit: 3,
                json: true
            }
        );
        assert_eq!(
            parse(&["stats"]).unwrap().command,
            Command::Stats { json: false }
        );
        assert!(matches!(
            parse(&["stats", "--verbose"]).unwrap_err(),
            ArgsError::UnknownArg(_)
        ));
    }

    #[test]
    fn score_validates_counts() {
        assert_eq!(
            parse(&["score", "28", "35"]).unwrap().command,
            Command::Score {
                correct: 28,
                total: 35
            }
        );
        assert_eq!(
            parse(&["score", "36", "35"]).unwrap_err(),
            ArgsError::CorrectExceedsTotal {
                correct: 36,
                total: 35
            }
        );
        assert_eq!(
            parse(&["score", "1"]).unwrap_err(),
            ArgsError::MissingValue { flag: "<total>" }
        );
    }

    #[test]
    fn missing_or_unknown_command() {
        assert_eq!(parse(&[]).unwrap_err(), ArgsError::MissingCommand);
        assert_eq!(
            parse(&["ui"]).unwrap_err(),
            ArgsError::UnknownCommand("ui".into())
        );
    }
}
