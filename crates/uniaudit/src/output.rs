//! Output formatting: table, JSON, YAML, plain.
//!
//! Renders data in the format selected by `--output`. Table uses `tabled`,
//! structured formats use serde, plain emits one identifier per line.

use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;
use tabled::{Table, Tabled, settings::Style};

use uniaudit_core::{AuditReport, Severity};

use crate::cli::{ColorMode, OutputFormat};

// ── Color helpers ────────────────────────────────────────────────────

/// Determine whether color output should be enabled.
pub fn should_color(mode: ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err(),
    }
}

pub fn paint_severity(severity: Severity, color: bool) -> String {
    let label = severity.to_string();
    if !color {
        return label;
    }
    match severity {
        Severity::Critical => label.red().bold().to_string(),
        Severity::Recommended => label.yellow().to_string(),
        Severity::Informational => label.cyan().to_string(),
    }
}

/// One-line score summary shown under the findings table.
pub fn score_summary(report: &AuditReport, color: bool) -> String {
    let score = format!("{}/100", report.score);
    let score = if !color {
        score
    } else if report.score >= 90 {
        score.green().bold().to_string()
    } else if report.score >= 70 {
        score.yellow().bold().to_string()
    } else {
        score.red().bold().to_string()
    };
    format!(
        "Security score: {score}  ({} critical, {} recommended, {} informational)",
        report.critical, report.recommended, report.informational
    )
}

// ── Render dispatchers ───────────────────────────────────────────────

/// Render a list of serde-serializable + tabled items in the chosen format.
///
/// - `table`: uses the `Tabled` derive to build a pretty table
/// - `json` / `json-compact`: serializes the original data via serde
/// - `yaml`: serializes via serde_yaml
/// - `plain`: calls `id_fn` on each item to emit one identifier per line
pub fn render_list<T, R>(
    format: OutputFormat,
    data: &[T],
    to_row: impl Fn(&T) -> R,
    id_fn: impl Fn(&T) -> String,
) -> String
where
    T: serde::Serialize,
    R: Tabled,
{
    match format {
        OutputFormat::Table => {
            let rows: Vec<R> = data.iter().map(to_row).collect();
            render_table(&rows)
        }
        OutputFormat::Json => render_json(data, false),
        OutputFormat::JsonCompact => render_json(data, true),
        OutputFormat::Yaml => render_yaml(data),
        OutputFormat::Plain => data.iter().map(&id_fn).collect::<Vec<_>>().join("\n"),
    }
}

/// Render a single serde-serializable item in the chosen format.
///
/// Table rendering uses `detail_fn`, since single-item views don't use `Tabled`.
pub fn render_single<T>(
    format: OutputFormat,
    data: &T,
    detail_fn: impl Fn(&T) -> String,
    id_fn: impl Fn(&T) -> String,
) -> String
where
    T: serde::Serialize,
{
    match format {
        OutputFormat::Table => detail_fn(data),
        OutputFormat::Json => render_json(data, false),
        OutputFormat::JsonCompact => render_json(data, true),
        OutputFormat::Yaml => render_yaml(data),
        OutputFormat::Plain => id_fn(data),
    }
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

// ── Format-specific renderers ────────────────────────────────────────

pub fn render_table<R: Tabled>(rows: &[R]) -> String {
    Table::new(rows).with(Style::rounded()).to_string()
}

fn render_json<T: serde::Serialize + ?Sized>(data: &T, compact: bool) -> String {
    if compact {
        serde_json::to_string(data).expect("serialization should not fail")
    } else {
        serde_json::to_string_pretty(data).expect("serialization should not fail")
    }
}

fn render_yaml<T: serde::Serialize + ?Sized>(data: &T) -> String {
    serde_yaml::to_string(data).expect("serialization should not fail")
}

#[cfg(test)]
mod tests {
    use uniaudit_core::{Issue, IssueType};

    use super::*;

    #[test]
    fn summary_without_color() {
        let report = AuditReport::from_issues(vec![Issue::new(IssueType::BroadRule, "x")]);
        assert_eq!(
            score_summary(&report, false),
            "Security score: 95/100  (0 critical, 1 recommended, 0 informational)"
        );
        assert_eq!(paint_severity(Severity::Critical, false), "critical");
    }

    #[test]
    fn plain_list_is_one_id_per_line() {
        #[derive(serde::Serialize)]
        struct Item(&'static str);
        #[derive(Tabled)]
        struct Row {
            id: &'static str,
        }
        let items = [Item("a"), Item("b")];
        let out = render_list(
            OutputFormat::Plain,
            &items,
            |i| Row { id: i.0 },
            |i| i.0.to_owned(),
        );
        assert_eq!(out, "a\nb");
    }
}
