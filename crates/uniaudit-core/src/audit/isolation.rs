//! Inter-VLAN isolation.
//!
//! Every unordered pair of networks whose purposes should not talk needs
//! a blocking rule in at least one direction. An explicit allow that wins
//! evaluation for the pair is worse than no block at all and is reported
//! on its own.

use super::AuditContext;
use super::scope::{Reach, selects_network};
use crate::model::{
    FirewallRule, Issue, IssueType, MatchTarget, NetworkInfo, NetworkPurpose, Severity,
};

/// Expected separation for a pair of purposes, or `None` when the pair
/// may share traffic.
pub(crate) fn pair_severity(a: NetworkPurpose, b: NetworkPurpose) -> Option<Severity> {
    use NetworkPurpose as P;
    if a == b {
        return None;
    }
    if a.is_sensitive() || b.is_sensitive() {
        return Some(Severity::Critical);
    }
    let involves = |p: P| a == p || b == p;
    let other = |p: P| if a == p { b } else { a };

    if involves(P::Guest) && other(P::Guest).is_trusted() {
        Some(Severity::Critical)
    } else if involves(P::IoT) && (other(P::IoT).is_trusted() || other(P::IoT) == P::Guest) {
        Some(Severity::Recommended)
    } else {
        None
    }
}

fn score_for(severity: Severity) -> u32 {
    match severity {
        Severity::Critical => 15,
        Severity::Recommended => 5,
        Severity::Informational => 0,
    }
}

fn blocks_direction(
    ctx: &AuditContext,
    rule: &FirewallRule,
    from: &NetworkInfo,
    to: &NetworkInfo,
) -> bool {
    rule.enabled
        && rule.blocks_new_connections()
        && selects_network(ctx, &rule.source, from, Reach::Touches)
        && selects_network(ctx, &rule.destination, to, Reach::Touches)
}

fn is_blocked(ctx: &AuditContext, a: &NetworkInfo, b: &NetworkInfo) -> bool {
    ctx.rules
        .iter()
        .any(|r| blocks_direction(ctx, r, a, b) || blocks_direction(ctx, r, b, a))
}

/// A user allow, scoped to specific sources, that decides new traffic
/// from `from` to `to`.
fn bypass_rule<'a>(
    ctx: &'a AuditContext,
    from: &NetworkInfo,
    to: &NetworkInfo,
) -> Option<&'a FirewallRule> {
    ctx.trace(from, to, true).effective_rule.filter(|r| {
        r.is_allow()
            && !r.predefined
            && matches!(r.source.target, MatchTarget::Network { .. } | MatchTarget::Ip { .. })
            && !ctx.zones.is_external(r.destination.zone_id.as_deref())
    })
}

pub(super) fn check(ctx: &AuditContext) -> Vec<Issue> {
    let mut issues = Vec::new();
    let nets = &ctx.networks;

    for (i, a) in nets.iter().enumerate() {
        for b in &nets[i + 1..] {
            if a.network_isolation_enabled && b.network_isolation_enabled {
                continue;
            }
            let Some(severity) = pair_severity(a.purpose, b.purpose) else {
                continue;
            };
            let description = format!("{} <-> {}", a.purpose, b.purpose);

            let bypass = bypass_rule(ctx, a, b)
                .map(|r| (r, a, b))
                .or_else(|| bypass_rule(ctx, b, a).map(|r| (r, b, a)));
            if let Some((rule, from, to)) = bypass {
                issues.push(
                    Issue::new(
                        IssueType::IsolationBypassed,
                        format!(
                            "Allow rule '{}' lets {} (VLAN {}) open connections to {} (VLAN {})",
                            rule.name, from.name, from.vlan_id, to.name, to.vlan_id
                        ),
                    )
                    .with_description(description)
                    .with_rule(&rule.id)
                    .with_current(&from.name, Some(from.vlan_id))
                    .with_meta("destination_network_id", &to.id),
                );
                continue;
            }

            if !is_blocked(ctx, a, b) {
                issues.push(
                    Issue::new(
                        IssueType::MissingIsolation,
                        format!(
                            "No firewall rule blocks traffic between {} (VLAN {}) and {} (VLAN {})",
                            a.name, a.vlan_id, b.name, b.vlan_id
                        ),
                    )
                    .with_severity(severity, score_for(severity))
                    .with_description(description)
                    .with_current(&a.name, Some(a.vlan_id))
                    .with_meta("network_a_id", &a.id)
                    .with_meta("network_b_id", &b.id),
                );
            }
        }
    }
    issues
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Endpoint, RuleAction};

    fn net(id: &str, purpose: NetworkPurpose, vlan: u16) -> NetworkInfo {
        let mut n = NetworkInfo::new(id, id, vlan);
        n.purpose = purpose;
        n.subnet = format!("192.168.{vlan}.0/24").parse().ok();
        n
    }

    fn on(id: &str) -> Endpoint {
        Endpoint {
            target: MatchTarget::Network {
                ids: vec![id.to_owned()],
                match_opposite: false,
            },
            ..Endpoint::default()
        }
    }

    fn block(id: &str, src: Endpoint, dst: Endpoint) -> FirewallRule {
        FirewallRule {
            source: src,
            destination: dst,
            index: 100,
            ..FirewallRule::new(id, id, RuleAction::Block)
        }
    }

    #[test]
    fn pair_table() {
        use NetworkPurpose as P;
        assert_eq!(pair_severity(P::Management, P::Home), Some(Severity::Critical));
        assert_eq!(pair_severity(P::Guest, P::Corporate), Some(Severity::Critical));
        assert_eq!(pair_severity(P::IoT, P::Corporate), Some(Severity::Recommended));
        assert_eq!(pair_severity(P::Guest, P::IoT), Some(Severity::Recommended));
        assert_eq!(pair_severity(P::Home, P::Corporate), None);
        assert_eq!(pair_severity(P::IoT, P::IoT), None);
        assert_eq!(pair_severity(P::Unknown, P::Home), None);
    }

    #[test]
    fn block_in_either_direction_round_trip() {
        let nets = vec![net("iot", NetworkPurpose::IoT, 40), net("lan", NetworkPurpose::Home, 10)];

        let bare = AuditContext::new(Vec::new(), nets.clone());
        let issues = check(&bare);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].issue_type, IssueType::MissingIsolation);
        assert_eq!(issues[0].severity, Severity::Recommended);
        assert_eq!(issues[0].score_impact, 5);

        let reverse = AuditContext::new(vec![block("b", on("lan"), on("iot"))], nets.clone());
        assert!(check(&reverse).is_empty());

        let mut disabled = block("b", on("iot"), on("lan"));
        disabled.enabled = false;
        let off = AuditContext::new(vec![disabled], nets);
        assert_eq!(check(&off).len(), 1);
    }

    #[test]
    fn rfc1918_block_covers_all_pairs() {
        let nets = vec![
            net("iot", NetworkPurpose::IoT, 40),
            net("lan", NetworkPurpose::Home, 10),
            net("guest", NetworkPurpose::Guest, 60),
        ];
        let private = Endpoint {
            target: MatchTarget::Ip {
                addrs: vec!["10.0.0.0/8".into(), "172.16.0.0/12".into(), "192.168.0.0/16".into()],
                match_opposite: false,
            },
            ..Endpoint::default()
        };
        let ctx = AuditContext::new(vec![block("rfc", private.clone(), private)], nets);
        assert!(check(&ctx).is_empty());
    }

    #[test]
    fn inverted_source_that_excludes_network_does_not_count() {
        let nets = vec![net("iot", NetworkPurpose::IoT, 40), net("lan", NetworkPurpose::Home, 10)];
        let mut not_iot = on("iot");
        not_iot.target = MatchTarget::Network {
            ids: vec!["iot".into(), "lan".into()],
            match_opposite: true,
        };
        let ctx = AuditContext::new(vec![block("b", not_iot, Endpoint::any())], nets);
        assert_eq!(check(&ctx).len(), 1);
    }

    #[test]
    fn explicit_allow_is_a_bypass() {
        let nets = vec![
            net("mgmt", NetworkPurpose::Management, 99),
            net("lan", NetworkPurpose::Home, 10),
        ];
        let mut allow = FirewallRule::new("a", "LAN to switches", RuleAction::Allow);
        allow.source = on("lan");
        allow.destination = on("mgmt");
        allow.index = 10;
        let rules = vec![allow, block("b", on("lan"), on("mgmt"))];
        let issues = check(&AuditContext::new(rules, nets));
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].issue_type, IssueType::IsolationBypassed);
        assert_eq!(issues[0].severity, Severity::Critical);
        assert_eq!(issues[0].rule_id.as_deref(), Some("a"));
    }

    #[test]
    fn isolated_pairs_are_skipped() {
        let mut a = net("cams", NetworkPurpose::Security, 50);
        let mut b = net("iot", NetworkPurpose::IoT, 40);
        a.network_isolation_enabled = true;
        b.network_isolation_enabled = true;
        assert!(check(&AuditContext::new(Vec::new(), vec![a, b])).is_empty());
    }
}
