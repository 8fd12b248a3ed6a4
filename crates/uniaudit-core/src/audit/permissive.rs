//! Overly broad and stale rules.

use std::collections::BTreeSet;

use super::AuditContext;
use crate::model::{Endpoint, FirewallRule, Issue, IssueType, MatchTarget};

/// A side that selects everything: any target, any port.
fn is_open(endpoint: &Endpoint) -> bool {
    endpoint.is_any() && endpoint.port.is_none()
}

/// Narrowed by a specific port, address, network or client.
fn is_pinned(endpoint: &Endpoint) -> bool {
    endpoint.port.is_some()
        || matches!(
            endpoint.target,
            MatchTarget::Network { .. } | MatchTarget::Ip { .. } | MatchTarget::Client { .. }
        )
}

enum Breadth {
    Permissive,
    Broad,
}

fn breadth(ctx: &AuditContext, rule: &FirewallRule) -> Option<Breadth> {
    if !rule.is_user_rule() || !rule.allows_new_connections() {
        return None;
    }
    let to_internet = ctx.zones.is_external(rule.destination.zone_id.as_deref());
    let all_protocols = rule.protocol.is_all() && !rule.match_opposite_protocol;

    if is_open(&rule.source) && is_open(&rule.destination) && all_protocols && !to_internet {
        return Some(Breadth::Permissive);
    }
    let any_source = rule.source.is_any() && !is_pinned(&rule.destination);
    let any_destination = rule.destination.is_any() && !is_pinned(&rule.source);
    (any_source || any_destination).then_some(Breadth::Broad)
}

pub(super) fn check_permissive(ctx: &AuditContext) -> Vec<Issue> {
    ctx.rules
        .iter()
        .filter_map(|rule| {
            let issue = match breadth(ctx, rule)? {
                Breadth::Permissive => Issue::new(
                    IssueType::PermissiveRule,
                    format!(
                        "Rule '{}' allows all traffic from any source to any destination",
                        rule.name
                    ),
                ),
                Breadth::Broad => Issue::new(
                    IssueType::BroadRule,
                    format!(
                        "Rule '{}' allows traffic with an unrestricted {} ({} -> {})",
                        rule.name,
                        if rule.source.is_any() { "source" } else { "destination" },
                        rule.source.summary(),
                        rule.destination.summary()
                    ),
                ),
            };
            Some(
                issue
                    .with_rule(&rule.id)
                    .with_meta("protocol", rule.protocol_summary()),
            )
        })
        .collect()
}

pub(super) fn check_orphaned(ctx: &AuditContext) -> Vec<Issue> {
    // Without a network list every reference would look stale.
    if ctx.networks.is_empty() {
        return Vec::new();
    }
    ctx.rules
        .iter()
        .filter(|r| r.enabled)
        .filter_map(|rule| {
            let missing: BTreeSet<&str> = rule
                .referenced_network_ids()
                .map(String::as_str)
                .filter(|id| ctx.network(id).is_none())
                .collect();
            if missing.is_empty() {
                return None;
            }
            let missing = missing.into_iter().collect::<Vec<_>>().join(", ");
            Some(
                Issue::new(
                    IssueType::OrphanedRule,
                    format!("Rule '{}' references deleted network(s): {missing}", rule.name),
                )
                .with_rule(&rule.id)
                .with_meta("missing_network_ids", missing),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        ConnectionStateType, FirewallZone, NetworkInfo, Protocol, RuleAction, Severity, ZoneTable,
    };

    fn any_any() -> FirewallRule {
        FirewallRule::new("r1", "Allow Everything", RuleAction::Allow)
    }

    #[test]
    fn any_any_all_is_critical() {
        let ctx = AuditContext::new(vec![any_any()], Vec::new());
        let issues = check_permissive(&ctx);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].issue_type, IssueType::PermissiveRule);
        assert_eq!(issues[0].severity, Severity::Critical);
        assert_eq!(issues[0].score_impact, 15);
    }

    #[test]
    fn destination_port_downgrades() {
        let mut rule = any_any();
        rule.destination.port = Some("443".into());
        let issues = check_permissive(&AuditContext::new(vec![rule], Vec::new()));
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].issue_type, IssueType::BroadRule);
        assert_eq!(issues[0].severity, Severity::Recommended);
        assert_eq!(issues[0].score_impact, 5);
        assert_eq!(issues[0].rule_id.as_deref(), Some("r1"));
    }

    #[test]
    fn pinned_sides_are_not_broad() {
        let mut rule = any_any();
        rule.source.target = MatchTarget::Network {
            ids: vec!["lan".into()],
            match_opposite: false,
        };
        rule.destination.target = MatchTarget::Ip {
            addrs: vec!["10.0.0.5".into()],
            match_opposite: false,
        };
        assert!(check_permissive(&AuditContext::new(vec![rule], Vec::new())).is_empty());
    }

    #[test]
    fn any_source_to_app_is_broad() {
        let mut rule = any_any();
        rule.destination.target = MatchTarget::App { ids: vec![42] };
        let issues = check_permissive(&AuditContext::new(vec![rule], Vec::new()));
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].issue_type, IssueType::BroadRule);
    }

    #[test]
    fn respond_only_block_predefined_and_disabled_are_exempt() {
        let mut respond = any_any();
        respond.connection_state_type = ConnectionStateType::RespondOnly;
        let block = FirewallRule::new("b", "Block", RuleAction::Block);
        let mut system = any_any();
        system.predefined = true;
        let mut off = any_any();
        off.enabled = false;
        let ctx = AuditContext::new(vec![respond, block, system, off], Vec::new());
        assert!(check_permissive(&ctx).is_empty());
    }

    #[test]
    fn tcp_only_any_any_is_broad() {
        let mut rule = any_any();
        rule.protocol = Protocol::Tcp;
        let issues = check_permissive(&AuditContext::new(vec![rule], Vec::new()));
        assert_eq!(issues[0].issue_type, IssueType::BroadRule);
    }

    #[test]
    fn allow_to_internet_is_broad_not_permissive() {
        let mut rule = any_any();
        rule.destination.zone_id = Some("z-ext".into());
        let ctx = AuditContext::new(vec![rule], Vec::new()).with_zones(ZoneTable::new(vec![
            FirewallZone {
                id: "z-ext".into(),
                name: "External".into(),
                zone_key: None,
                network_ids: vec![],
            },
        ]));
        let issues = check_permissive(&ctx);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].issue_type, IssueType::BroadRule);
    }

    #[test]
    fn orphaned_references() {
        let mut rule = FirewallRule::new("r", "Old", RuleAction::Block);
        rule.source.target = MatchTarget::Network {
            ids: vec!["gone".into(), "lan".into()],
            match_opposite: false,
        };
        let mut off = rule.clone();
        off.id = "off".into();
        off.enabled = false;
        let ctx = AuditContext::new(vec![rule, off], vec![NetworkInfo::new("lan", "LAN", 1)]);
        let issues = check_orphaned(&ctx);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].metadata["missing_network_ids"], "gone");
        assert_eq!(issues[0].severity, Severity::Informational);
    }
}
