mod args;
mod render;
mod take;

use iq_core::model::TestMode;
use services::history::{HistoryService, PerformanceProfile};
use services::{BankAnalytics, Clock, TestConfig, TestService};
use storage::bank;
use storage::repository::{QuestionBank, Storage};
use tracing::info;
use tracing_subscriber::EnvFilter;

use args::{Args, Command, DEFAULT_DB_URL};

/// Fill an empty bank with the built-in sample questions.
async fn ensure_bank(questions: &dyn QuestionBank) -> Result<(), Box<dyn std::error::Error>> {
    if !questions.list_all().await?.is_empty() {
        return Ok(());
    }

    let sample = bank::sample_questions()?;
    for question in &sample {
        questions.upsert_question(question).await?;
    }
    info!(seeded = sample.len(), "question bank was empty, loaded sample bank");
    Ok(())
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let db_url = std::env::var("IQ_DB_URL").unwrap_or_else(|_| DEFAULT_DB_URL.into());
    let parsed = Args::parse(std::env::args().skip(1), db_url).map_err(|e| {
        eprintln!("{e}");
        args::print_usage();
        e
    })?;

    match parsed.command {
        Command::Help => {
            args::print_usage();
            return Ok(());
        }
        Command::Score { correct, total } => {
            render::score(correct, total);
            return Ok(());
        }
        Command::Take { .. } | Command::Stats { .. } | Command::History { .. } => {}
    }

    let storage = Storage::sqlite(&parsed.db_url).await?;
    ensure_bank(storage.questions.as_ref()).await?;

    match parsed.command {
        Command::Take { mode, level } => {
            let config = TestConfig::from_env()?;
            let clock = Clock::default();
            let svc = TestService::from_storage(clock, config, &storage);
            info!(
                %mode,
                db = %parsed.db_url,
                exam = mode == TestMode::Exam,
                "starting test"
            );
            take::run(&svc, mode, level).await
        }
        Command::Stats { json } => {
            let questions = storage.questions.list_all().await?;
            let stats = BankAnalytics::from_questions(&questions);
            if json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                render::stats(&stats);
            }
            Ok(())
        }
        Command::History { limit, json } => {
            let history = HistoryService::from_storage(&storage);
            let rows = history.recent(limit).await?;
            let profile = PerformanceProfile::from_results(&rows);
            if json {
                let results: Vec<_> = rows.iter().map(|row| &row.result).collect();
                let body = serde_json::json!({ "results": results, "profile": profile });
                println!("{}", serde_json::to_string_pretty(&body)?);
            } else {
                render::history(&rows, &profile);
            }
            Ok(())
        }
        Command::Help | Command::Score { .. } => Ok(()),
    }
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
