use std::io::{self, BufRead, Write};
use std::time::Instant;

use iq_core::model::{DifficultyLevel, TestMode};
use services::{SessionError, SessionManager, Step, TestService};
use tracing::{info, warn};

use crate::render;

/// One line of user input while a test is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Input {
    /// 1-based option number as typed.
    Answer(usize),
    Next,
    Previous,
    GoTo(usize),
    Submit,
    Quit,
    Help,
}

fn parse_input(line: &str) -> Option<Input> {
    let line = line.trim().to_ascii_lowercase();
    match line.as_str() {
        "n" | "next" | "" => Some(Input::Next),
        "p" | "prev" | "previous" => Some(Input::Previous),
        "s" | "submit" => Some(Input::Submit),
        "q" | "quit" => Some(Input::Quit),
        "?" | "h" | "help" => Some(Input::Help),
        other => {
            if let Some(rest) = other.strip_prefix('g') {
                return rest.trim().parse().ok().filter(|n| *n > 0).map(Input::GoTo);
            }
            other.parse().ok().filter(|n| *n > 0).map(Input::Answer)
        }
    }
}

fn print_help() {
    println!("  <number>  choose an option");
    println!("  n         next question (submits on the last one)");
    println!("  p         previous question");
    println!("  g <k>     go to question k");
    println!("  s         submit now");
    println!("  q         quit without saving");
}

fn read_line(prompt: &str) -> io::Result<Option<String>> {
    print!("{prompt}");
    io::stdout().flush()?;
    let mut buf = String::new();
    if io::stdin().lock().read_line(&mut buf)? == 0 {
        return Ok(None);
    }
    Ok(Some(buf))
}

/// True once an exam has run out of time; input after that point is dropped.
fn deadline_passed(svc: &TestService, manager: &SessionManager) -> bool {
    if !svc.is_time_up(manager) {
        return false;
    }
    println!();
    println!("Time is up.");
    info!("exam time limit reached");
    true
}

fn elapsed_secs(since: Instant) -> u32 {
    u32::try_from(since.elapsed().as_secs()).unwrap_or(u32::MAX)
}

/// Run a test on the terminal until it is submitted or abandoned.
pub async fn run(
    svc: &TestService,
    mode: TestMode,
    level: Option<DifficultyLevel>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut manager = match level {
        Some(level) => svc.start_practice(level).await?,
        None => svc.start(mode).await?,
    };

    if let Some(limit) = svc.remaining_secs(&manager) {
        println!(
            "{} questions, {} minutes. Type ? for help.",
            manager.test_size(),
            limit / 60
        );
    } else {
        println!("{} questions. Type ? for help.", manager.test_size());
    }

    loop {
        if deadline_passed(svc, &manager) {
            break;
        }

        let (Some(question), Some(progress)) = (manager.current_question(), manager.progress())
        else {
            return Err(SessionError::NoActiveSession.into());
        };
        let question = question.clone();
        let selected = manager.session().and_then(|s| s.current_answer());
        render::question(&question, &progress, selected);

        let shown = Instant::now();
        let Some(line) = read_line("> ")? else {
            warn!("input closed, submitting");
            break;
        };
        if deadline_passed(svc, &manager) {
            break;
        }
        let Some(input) = parse_input(&line) else {
            println!("Unrecognized input. Type ? for help.");
            continue;
        };

        match input {
            Input::Answer(choice) => {
                if let Err(err) = manager.answer_question(choice - 1, elapsed_secs(shown)) {
                    println!("{err}");
                    continue;
                }
                if manager.mode() == TestMode::Practice {
                    if let Some(feedback) = manager.feedback()? {
                        render::feedback(&feedback, &question);
                    }
                }
                if advance(svc, &mut manager).await? {
                    return Ok(());
                }
            }
            Input::Next => {
                if advance(svc, &mut manager).await? {
                    return Ok(());
                }
            }
            Input::Previous => {
                manager.previous_question()?;
            }
            Input::GoTo(k) => {
                if let Err(err) = manager.go_to_question(k - 1) {
                    println!("{err}");
                }
            }
            Input::Submit => break,
            Input::Quit => {
                manager.reset_test();
                println!("Test abandoned, nothing saved.");
                return Ok(());
            }
            Input::Help => print_help(),
        }
    }

    let persisted = svc.finalize(&mut manager).await?;
    render::result(Some(persisted.id), &persisted.result);
    Ok(())
}

/// Returns `true` once the test has been submitted and saved.
async fn advance(
    svc: &TestService,
    manager: &mut SessionManager,
) -> Result<bool, SessionError> {
    match svc.next_question(manager).await? {
        Step::Moved(_) => Ok(false),
        Step::Finished(persisted) => {
            render::result(Some(persisted.id), &persisted.result);
            Ok(true)
        }
    }
}
