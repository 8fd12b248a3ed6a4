//! Rule ordering conflicts.
//!
//! Looks at ordered pairs of user rules with opposite actions:
//!
//! * an earlier allow that covers a later deny makes the deny dead
//!   (`ALLOW_SUBVERTS_DENY`);
//! * an earlier deny that covers a later allow makes the allow dead
//!   (`DENY_SHADOWS_ALLOW`);
//! * an earlier allow that only carves part out of a later deny is the
//!   usual exception pattern, reported for review (`ALLOW_EXCEPTION_PATTERN`).

use std::collections::BTreeSet;

use super::AuditContext;
use super::management::is_carve_out;
use super::scope::{
    Reach, endpoint_purpose, rule_contains, rules_overlap, selects_network,
};
use crate::model::{FirewallRule, Issue, IssueType, Severity};

fn ordered_user_rules(ctx: &AuditContext) -> Vec<&FirewallRule> {
    let mut rules: Vec<&FirewallRule> = ctx
        .user_rules()
        .filter(|r| r.is_allow() || r.is_block())
        .collect();
    rules.sort_by_key(|r| r.index);
    rules
}

/// `"{Src} -> {Dst}"` for the traffic a deny rule targets.
fn deny_description(ctx: &AuditContext, deny: &FirewallRule) -> String {
    let dst_zone = deny.destination.zone_id.as_deref();
    if ctx.zones.is_external(dst_zone) {
        return "External Access".to_owned();
    }
    if ctx.zones.is_gateway(dst_zone) {
        return String::new();
    }
    match (
        endpoint_purpose(ctx, &deny.source),
        endpoint_purpose(ctx, &deny.destination),
    ) {
        (Some(src), Some(dst)) => format!("{src} -> {dst}"),
        _ => String::new(),
    }
}

/// Whether the allow opens a path into a management or security network.
fn opens_sensitive(ctx: &AuditContext, allow: &FirewallRule) -> bool {
    ctx.networks
        .iter()
        .filter(|n| n.purpose.is_sensitive())
        .any(|n| selects_network(ctx, &allow.destination, n, Reach::Touches) && !allow.destination.is_any())
}

pub(super) fn check(ctx: &AuditContext) -> Vec<Issue> {
    let rules = ordered_user_rules(ctx);
    let mut issues = Vec::new();
    let mut dead_allows: BTreeSet<&str> = BTreeSet::new();

    for (j, later) in rules.iter().enumerate() {
        let earlier = &rules[..j];
        if later.is_block() {
            if let Some(allow) = earlier
                .iter()
                .find(|e| e.is_allow() && rule_contains(ctx, e, later))
            {
                issues.push(
                    Issue::new(
                        IssueType::AllowSubvertsDeny,
                        format!(
                            "Block rule '{}' never matches: allow rule '{}' (index {}) accepts the same traffic first",
                            later.name, allow.name, allow.index
                        ),
                    )
                    .with_rule(&later.id)
                    .with_meta("allow_rule_id", &allow.id),
                );
            }
        } else if let Some(deny) = earlier
            .iter()
            .find(|e| e.is_block() && e.blocks_new_connections() && rule_contains(ctx, e, later))
        {
            dead_allows.insert(&later.id);
            issues.push(
                Issue::new(
                    IssueType::DenyShadowsAllow,
                    format!(
                        "Allow rule '{}' never matches: block rule '{}' (index {}) drops the same traffic first",
                        later.name, deny.name, deny.index
                    ),
                )
                .with_rule(&later.id)
                .with_meta("block_rule_id", &deny.id),
            );
        }
    }

    for (i, allow) in rules.iter().enumerate() {
        if !allow.is_allow() || dead_allows.contains(allow.id.as_str()) || is_carve_out(ctx, allow) {
            continue;
        }
        let Some(deny) = rules[i + 1..].iter().find(|d| {
            d.is_block() && rules_overlap(ctx, allow, d) && !rule_contains(ctx, allow, d)
        }) else {
            continue;
        };

        let issue = Issue::new(
            IssueType::AllowExceptionPattern,
            format!(
                "Allow rule '{}' makes an exception to block rule '{}'",
                allow.name, deny.name
            ),
        )
        .with_description(deny_description(ctx, deny))
        .with_rule(&allow.id)
        .with_meta("block_rule_id", &deny.id);

        issues.push(if opens_sensitive(ctx, allow) {
            issue.with_severity(Severity::Recommended, 3)
        } else {
            issue
        });
    }

    issues
}
