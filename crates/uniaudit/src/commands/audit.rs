//! `uniaudit audit`: run every enabled check and report findings.

use chrono::Utc;
use serde::Serialize;
use tabled::Tabled;

use uniaudit_config::Config;
use uniaudit_core::{AuditReport, AuditSettings, CheckKind, Issue, parse_severity, run_audit};

use crate::Presentation;
use crate::cli::{AuditArgs, OutputFormat};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct IssueRow {
    #[tabled(rename = "Severity")]
    severity: String,
    #[tabled(rename = "Code")]
    code: String,
    #[tabled(rename = "Score")]
    score: String,
    #[tabled(rename = "Network")]
    network: String,
    #[tabled(rename = "Rule")]
    rule: String,
    #[tabled(rename = "Finding")]
    message: String,
}

impl IssueRow {
    fn new(issue: &Issue, color: bool) -> Self {
        let network = match (&issue.current_network, issue.current_vlan) {
            (Some(name), Some(vlan)) => format!("{name} ({vlan})"),
            (Some(name), None) => name.clone(),
            _ => String::new(),
        };
        let message = if issue.description.is_empty() {
            issue.message.clone()
        } else {
            format!("{}\n[{}]", issue.message, issue.description)
        };
        Self {
            severity: output::paint_severity(issue.severity, color),
            code: issue.issue_type.code().to_owned(),
            score: format!("-{}", issue.score_impact),
            network,
            rule: issue.rule_id.clone().unwrap_or_default(),
            message,
        }
    }
}

/// Structured output: the report plus when it was produced.
#[derive(Serialize)]
struct AuditOutput<'a> {
    generated_at: String,
    #[serde(flatten)]
    report: &'a AuditReport,
}

// ── Settings ────────────────────────────────────────────────────────

/// Config-file settings with command-line flags layered on top.
fn effective_settings(args: &AuditArgs, cfg: &Config) -> Result<AuditSettings, CliError> {
    let mut settings = cfg.audit.to_settings()?;
    if let Some(ref raw) = args.min_severity {
        settings.min_severity = Some(parse_severity(raw)?);
    }
    if let Some(ref raw) = args.fail_on {
        settings.fail_on = Some(parse_severity(raw)?);
    }
    for raw in &args.skip {
        settings.disabled_checks.insert(CheckKind::parse(raw)?);
    }
    Ok(settings)
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: &AuditArgs, cfg: &Config, out: Presentation) -> Result<(), CliError> {
    let settings = effective_settings(args, cfg)?;
    let ctx = util::load_site(&args.site)?;
    let report = AuditReport::from_issues(run_audit(&ctx, &settings));

    let rendered = match out.format {
        OutputFormat::Table => {
            let rows: Vec<IssueRow> = report
                .issues
                .iter()
                .map(|i| IssueRow::new(i, out.color))
                .collect();
            let summary = output::score_summary(&report, out.color);
            if report.is_clean() {
                format!("No findings.\n{summary}")
            } else {
                format!("{}\n{summary}", output::render_table(&rows))
            }
        }
        format => {
            let wrapped = AuditOutput {
                generated_at: Utc::now().to_rfc3339(),
                report: &report,
            };
            output::render_single(
                format,
                &wrapped,
                |_| String::new(),
                |w| {
                    w.report
                        .issues
                        .iter()
                        .map(|i| i.issue_type.code())
                        .collect::<Vec<_>>()
                        .join("\n")
                },
            )
        }
    };
    output::print_output(&rendered, out.quiet);

    if let Some(threshold) = settings.fail_on {
        if report.has_at_least(threshold) {
            return Err(CliError::FindingsAtThreshold {
                count: report.count_at_least(threshold),
                threshold: threshold.to_string(),
            });
        }
    }
    Ok(())
}
