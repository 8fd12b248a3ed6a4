//! `uniaudit trace`: which rule decides traffic between two networks.

use serde::Serialize;

use uniaudit_core::{FirewallRule, Protocol, TrafficFilter};

use crate::Presentation;
use crate::cli::TraceArgs;
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Serialize)]
struct RuleRef {
    id: String,
    name: String,
    index: i64,
    action: String,
}

impl From<&FirewallRule> for RuleRef {
    fn from(r: &FirewallRule) -> Self {
        Self {
            id: r.id.clone(),
            name: r.name.clone(),
            index: r.index,
            action: r.action.to_string(),
        }
    }
}

#[derive(Serialize)]
struct TraceOutput {
    from: String,
    to: String,
    protocol: Option<String>,
    port: Option<String>,
    new_connections: bool,
    verdict: &'static str,
    effective_rule: Option<RuleRef>,
    eclipsed_rule: Option<RuleRef>,
}

fn describe(rule: Option<&RuleRef>) -> String {
    rule.map_or_else(
        || "-".into(),
        |r| format!("{} [{}] ({}, index {})", r.name, r.id, r.action, r.index),
    )
}

fn trace_detail(t: &TraceOutput) -> String {
    [
        format!("From:       {}", t.from),
        format!("To:         {}", t.to),
        format!("Protocol:   {}", t.protocol.as_deref().unwrap_or("any")),
        format!("Port:       {}", t.port.as_deref().unwrap_or("any")),
        format!("Verdict:    {}", t.verdict),
        format!("Effective:  {}", describe(t.effective_rule.as_ref())),
        format!("Eclipsed:   {}", describe(t.eclipsed_rule.as_ref())),
    ]
    .join("\n")
}

pub fn handle(args: &TraceArgs, out: Presentation) -> Result<(), CliError> {
    let ctx = util::load_site(&args.site)?;
    let from = util::resolve_network(&ctx, &args.from)?;
    let to = util::resolve_network(&ctx, &args.to)?;

    let filter = TrafficFilter {
        protocol: args.protocol.as_deref().map(Protocol::parse),
        port: args.port.clone(),
    };
    let result = ctx.trace_traffic(from, to, &filter, args.new);

    let verdict = match result.effective_rule {
        None => "no matching rule (default policy applies)",
        Some(_) if result.is_allowed => "allowed",
        Some(_) if result.is_blocked => "blocked",
        Some(_) => "blocked (established/related only)",
    };

    let trace = TraceOutput {
        from: from.name.clone(),
        to: to.name.clone(),
        protocol: filter.protocol.as_ref().map(ToString::to_string),
        port: filter.port.clone(),
        new_connections: args.new,
        verdict,
        effective_rule: result.effective_rule.map(RuleRef::from),
        eclipsed_rule: result
            .eclipsed_block_rule
            .or(result.eclipsed_allow_rule)
            .map(RuleRef::from),
    };

    let rendered = output::render_single(out.format, &trace, trace_detail, |t| t.verdict.into());
    output::print_output(&rendered, out.quiet);
    Ok(())
}
