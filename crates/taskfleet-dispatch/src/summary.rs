//! Human-readable summary table of a run report.

use std::fmt::Write;

use crossterm::style::{style, Attribute, Color, Stylize};

use taskfleet_core::{OutcomeStatus, RunReport};

const STATUS_WIDTH: usize = 8;
const TIME_WIDTH: usize = 8;
const RESULT_WIDTH: usize = 60;

/// Render the per-task table followed by the run metrics.
pub fn render_table(report: &RunReport, colored: bool) -> String {
    let mut out = String::new();

    if report.outcomes.is_empty() {
        writeln!(out, "{}", paint("No results to display", Color::Yellow, colored)).ok();
        return out;
    }

    let name_width = report
        .outcomes
        .keys()
        .map(|name| name.chars().count())
        .max()
        .unwrap_or(0)
        .max("task".len())
        + 2;

    let header = format!(
        "{:<name_width$}{:<STATUS_WIDTH$}{:<TIME_WIDTH$}result",
        "task", "status", "time_s"
    );
    let separator = "-".repeat(name_width + STATUS_WIDTH + TIME_WIDTH + RESULT_WIDTH);

    writeln!(out, "{}", bold(&header, colored)).ok();
    writeln!(out, "{}", paint(&separator, Color::Magenta, colored)).ok();

    for (name, outcome) in &report.outcomes {
        let secs = outcome.duration.as_secs_f64();
        let result = truncate(&outcome.result_text(), RESULT_WIDTH);
        let result_color = if outcome.status.is_success() {
            Color::Green
        } else {
            Color::Red
        };

        writeln!(
            out,
            "{}{}{}{}",
            paint(&format!("{:<name_width$}", name), Color::Cyan, colored),
            paint(
                &format!("{:<STATUS_WIDTH$}", outcome.status.as_str()),
                status_color(outcome.status),
                colored
            ),
            paint(
                &format!("{:<TIME_WIDTH$}", format!("{:.3}", secs)),
                duration_color(secs),
                colored
            ),
            paint(&result, result_color, colored),
        )
        .ok();
    }

    writeln!(out, "{}", paint(&separator, Color::Magenta, colored)).ok();
    writeln!(out).ok();

    let rate = report.success_rate_rounded();
    writeln!(
        out,
        "{}",
        paint(&format!("Success Rate: {}%", rate), rate_color(rate), colored)
    )
    .ok();
    writeln!(
        out,
        "{}",
        paint(
            &format!(
                "Total Execution Time: {:.3}s",
                report.total_elapsed.as_secs_f64()
            ),
            Color::Blue,
            colored
        )
    )
    .ok();

    out
}

/// Cut `text` to `width` characters, ending in `...` when shortened.
fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let kept: String = text.chars().take(width.saturating_sub(3)).collect();
    format!("{kept}...")
}

fn status_color(status: OutcomeStatus) -> Color {
    match status {
        OutcomeStatus::Success => Color::Green,
        OutcomeStatus::Failure => Color::Red,
        OutcomeStatus::Timeout => Color::Magenta,
    }
}

fn duration_color(secs: f64) -> Color {
    if secs < 1.0 {
        Color::Green
    } else if secs < 5.0 {
        Color::Yellow
    } else {
        Color::Red
    }
}

fn rate_color(rate: f64) -> Color {
    if rate >= 100.0 {
        Color::Green
    } else if rate >= 50.0 {
        Color::Yellow
    } else {
        Color::Red
    }
}

fn paint(text: &str, color: Color, colored: bool) -> String {
    if colored {
        style(text).with(color).to_string()
    } else {
        text.to_string()
    }
}

fn bold(text: &str, colored: bool) -> String {
    if colored {
        style(text)
            .with(Color::White)
            .attribute(Attribute::Bold)
            .to_string()
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::BTreeMap;
    use std::time::Duration;
    use taskfleet_core::{finalize, Outcome};

    fn report() -> RunReport {
        let mut outcomes = BTreeMap::new();
        outcomes.insert(
            "task_a".to_string(),
            Outcome::success(json!("Hello from Task A"), 0, Duration::from_millis(512)),
        );
        outcomes.insert(
            "a_rather_long_task_name".to_string(),
            Outcome::failure("x".repeat(80), Duration::from_secs(2)),
        );
        finalize(outcomes)
    }

    #[test]
    fn test_plain_table_layout() {
        let table = render_table(&report(), false);
        let lines: Vec<&str> = table.lines().collect();

        // name column: longest name (23) + 2
        assert_eq!(lines[0], format!("{:<25}{:<8}{:<8}result", "task", "status", "time_s"));
        assert_eq!(lines[1], "-".repeat(25 + 8 + 8 + 60));
        assert!(lines[3].starts_with("task_a"));
        assert!(lines[3].contains("success 0.512   Hello from Task A"));
        assert!(table.contains("Success Rate: 50%"));
        assert!(table.contains("Total Execution Time: 2.000s"));
    }

    #[test]
    fn test_long_result_truncated() {
        let table = render_table(&report(), false);
        let row = table
            .lines()
            .find(|l| l.starts_with("a_rather_long_task_name"))
            .unwrap();
        assert!(row.ends_with(&format!("{}...", "x".repeat(57))));
    }

    #[test]
    fn test_colored_table_keeps_content() {
        let table = render_table(&report(), true);
        assert!(table.contains("task_a"));
        assert!(table.contains("Hello from Task A"));
        assert!(table.contains("Success Rate: 50%"));
    }

    #[test]
    fn test_empty_report() {
        let table = render_table(&finalize(BTreeMap::new()), false);
        assert_eq!(table.trim(), "No results to display");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghij", 6), "abc...");
    }
}
