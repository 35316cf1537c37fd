use iq_core::model::{Question, TestResult};
use iq_core::scoring::{self, IqClassification};
use services::history::PerformanceProfile;
use services::{BankAnalytics, Feedback, SessionProgress};
use storage::repository::ResultRow;

fn format_duration(secs: u64) -> String {
    format!("{}m {:02}s", secs / 60, secs % 60)
}

pub fn question(question: &Question, progress: &SessionProgress, selected: Option<usize>) {
    println!();
    println!(
        "Question {}/{}  [{}, difficulty {}]  {} answered",
        progress.current_index + 1,
        progress.total,
        question.category().display_name(),
        question.difficulty(),
        progress.answered
    );
    println!("{}", question.prompt());
    for (i, option) in question.options().iter().enumerate() {
        let marker = if selected == Some(i) { '*' } else { ' ' };
        println!(" {marker}{}) {option}", i + 1);
    }
}

pub fn feedback(feedback: &Feedback, question: &Question) {
    if feedback.is_correct {
        println!("Correct.");
    } else {
        let answer = question
            .options()
            .get(feedback.correct_answer)
            .map_or("?", String::as_str);
        println!("Incorrect. The answer is {}) {answer}", feedback.correct_answer + 1);
    }
    if let Some(explanation) = &feedback.explanation {
        println!("  {explanation}");
    }
}

fn classification(iq: u32, percentile: f64, class: IqClassification, mensa: bool) -> String {
    let mut out = format!(
        "IQ score:       {iq}\nPercentile:     {percentile}\nClassification: {} ({})",
        class.label(),
        class.description()
    );
    if mensa {
        out.push_str("\nMENSA level:    yes");
    }
    out
}

/// Score block of a result, using the values stored with it.
fn result_summary(result: &TestResult) -> String {
    classification(
        result.iq_score(),
        result.percentile(),
        result.classification(),
        result.mensa_qualified(),
    )
}

pub fn result(id: Option<i64>, result: &TestResult) {
    println!();
    match id {
        Some(id) => println!("Result #{id} ({} test)", result.mode()),
        None => println!("Result ({} test, not saved)", result.mode()),
    }
    println!(
        "Correct:        {}/{}",
        result.total_correct(),
        result.total_questions()
    );
    println!("{}", result_summary(result));
    println!(
        "Time spent:     {}",
        format_duration(u64::from(result.time_spent_secs()))
    );
    println!();
    println!("{:<22} {:>9} {:>6}", "Category", "Correct", "%");
    for (category, score) in result.category_scores() {
        println!(
            "{:<22} {:>4}/{:<4} {:>5}%",
            category.display_name(),
            score.correct,
            score.total,
            score.percentage
        );
    }
}

pub fn score(correct: u32, total: u32) {
    let iq = scoring::calculate_iq_score(correct, total);
    println!("Correct:        {correct}/{total}");
    println!(
        "{}",
        classification(
            iq,
            scoring::calculate_percentile(iq),
            scoring::classify(iq),
            scoring::is_mensa_qualified(iq),
        )
    );
}

pub fn stats(stats: &BankAnalytics) {
    println!("Questions:          {}", stats.total);
    println!("Average difficulty: {:.1}", stats.average_difficulty);
    println!(
        "Estimated time:     {} (avg {:.0}s per question)",
        format_duration(stats.time.total_secs),
        stats.time.average_secs
    );
    println!();
    println!("{:<22} {:>5} {:>10}", "Category", "Count", "Time");
    for (category, count) in &stats.by_category {
        let secs = stats
            .time
            .by_category
            .get(category)
            .map_or(0, |t| t.total_secs);
        println!(
            "{:<22} {:>5} {:>10}",
            category.display_name(),
            count,
            format_duration(secs)
        );
    }
    println!();
    for (band, count) in &stats.by_band {
        println!("{band:?}: {count}");
    }
}

pub fn history(rows: &[ResultRow], profile: &PerformanceProfile) {
    if rows.is_empty() {
        println!("No results yet.");
        return;
    }
    for row in rows {
        let r = &row.result;
        println!(
            "#{:<4} {}  {:<8} {:>3}/{:<3} IQ {:>3}  {}",
            row.id,
            r.completed_at().format("%Y-%m-%d %H:%M"),
            r.mode(),
            r.total_correct(),
            r.total_questions(),
            r.iq_score(),
            r.classification().label()
        );
    }
    println!();
    println!("Attempts: {}", profile.attempts);
    if let (Some(best), Some(avg)) = (profile.best_iq, profile.average_iq) {
        println!("Best IQ:  {best}");
        println!("Average:  {avg:.1}");
    }
    let names = |list: &[iq_core::model::Category]| {
        list.iter()
            .map(|c| c.display_name())
            .collect::<Vec<_>>()
            .join(", ")
    };
    if !profile.strengths.is_empty() {
        println!("Strengths:  {}", names(&profile.strengths));
    }
    if !profile.weaknesses.is_empty() {
        println!("Weaknesses: {}", names(&profile.weaknesses));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use iq_core::model::{Category, CategoryScore, CategoryScores, SessionId, TestMode};
    use iq_core::time::fixed_now;

    #[test]
    fn summary_shows_stored_percentile() {
        let mut scores = CategoryScores::new();
        scores.insert(Category::Numerical, CategoryScore::from_counts(9, 10));
        let result = TestResult::from_persisted(
            SessionId::generate(),
            TestMode::Exam,
            10,
            9,
            132,
            97.5,
            scores,
            120,
            fixed_now(),
            fixed_now(),
        )
        .unwrap();

        let summary = result_summary(&result);
        assert!(summary.contains("Percentile:     97.5"));
        assert!(!summary.contains("Percentile:     98"));
        assert!(summary.contains("Very Superior"));
        assert!(summary.ends_with("MENSA level:    yes"));
    }

    #[test]
    fn raw_score_has_no_mensa_line_below_threshold() {
        let out = classification(100, 50.0, scoring::classify(100), false);
        assert!(out.contains("Percentile:     50"));
        assert!(!out.contains("MENSA"));
    }
}
