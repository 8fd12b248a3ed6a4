//! Holes punched through system network isolation.

use super::AuditContext;
use super::management::is_carve_out;
use super::scope::{Reach, endpoint_purpose, selects_network};
use crate::model::{FirewallRule, Issue, IssueType, MatchTarget, NetworkInfo};

const ISOLATION_RULE_MARKER: &str = "isolated networks";

/// The controller's generated block for isolated networks, scoped to (or
/// at least not excluding) `network`.
fn has_isolation_rule(ctx: &AuditContext, network: &NetworkInfo) -> bool {
    ctx.rules.iter().any(|r| {
        r.enabled
            && r.predefined
            && r.is_block()
            && r.name.to_lowercase().contains(ISOLATION_RULE_MARKER)
            && selects_network(ctx, &r.source, network, Reach::Touches)
    })
}

/// A user allow whose source is this network, directly or via a CIDR that
/// covers its subnet.
fn sourced_from(ctx: &AuditContext, rule: &FirewallRule, network: &NetworkInfo) -> bool {
    match &rule.source.target {
        MatchTarget::Network {
            ids,
            match_opposite: false,
        } => ids.contains(&network.id),
        MatchTarget::Ip {
            match_opposite: false,
            ..
        } => selects_network(ctx, &rule.source, network, Reach::Covers),
        _ => false,
    }
}

fn punches_through(ctx: &AuditContext, rule: &FirewallRule) -> bool {
    !ctx.zones.is_external(rule.destination.zone_id.as_deref())
        && !matches!(
            rule.destination.target,
            MatchTarget::Web { .. } | MatchTarget::App { .. } | MatchTarget::AppCategory { .. }
        )
        && !is_carve_out(ctx, rule)
}

pub(super) fn check(ctx: &AuditContext) -> Vec<Issue> {
    let mut issues = Vec::new();
    for network in ctx
        .networks
        .iter()
        .filter(|n| n.network_isolation_enabled && has_isolation_rule(ctx, n))
    {
        for rule in ctx
            .user_rules()
            .filter(|r| r.is_allow() && sourced_from(ctx, r, network) && punches_through(ctx, r))
        {
            let description = match endpoint_purpose(ctx, &rule.destination) {
                Some(dst) => format!("{} -> {dst}", network.purpose),
                None => format!("{} ->", network.purpose),
            };
            issues.push(
                Issue::new(
                    IssueType::NetworkIsolationException,
                    format!(
                        "Rule '{}' opens an exception to the isolation of '{}' ({})",
                        rule.name,
                        network.name,
                        rule.destination.summary()
                    ),
                )
                .with_description(description)
                .with_rule(&rule.id)
                .with_current(&network.name, Some(network.vlan_id)),
            );
        }
    }
    issues
}
