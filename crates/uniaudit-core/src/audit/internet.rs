//! Internet-block bypass: a network that is meant to be offline but has a
//! user allow rule opening general web access again.

use super::AuditContext;
use super::scope::{Reach, reaches_internet, selects_network};
use crate::groups::{allows_protocol, endpoint_includes_port};
use crate::model::{FirewallRule, Issue, IssueType, MatchTarget, NetworkInfo, Protocol};

/// Why a rule counts as reopening the internet.
fn bypass_reason(rule: &FirewallRule) -> Option<&'static str> {
    let dst = &rule.destination;
    match dst.target {
        MatchTarget::Web { .. } | MatchTarget::Unsupported { .. } => return None,
        MatchTarget::App { .. } | MatchTarget::AppCategory { .. } => {
            return Some("application match");
        }
        _ => {}
    }
    let tcp = allows_protocol(&rule.protocol, rule.match_opposite_protocol, &Protocol::Tcp);
    match dst.port {
        None if rule.protocol.is_all() && !rule.match_opposite_protocol => Some("all protocols"),
        None if tcp => Some("web ports"),
        Some(_)
            if tcp
                && (endpoint_includes_port(dst, "80") || endpoint_includes_port(dst, "443")) =>
        {
            Some("web ports")
        }
        _ => None,
    }
}

fn bypasses(ctx: &AuditContext, rule: &FirewallRule, network: &NetworkInfo) -> Option<&'static str> {
    if !rule.is_user_rule() || !rule.allows_new_connections() {
        return None;
    }
    if !selects_network(ctx, &rule.source, network, Reach::Touches)
        || !reaches_internet(ctx, &rule.destination)
    {
        return None;
    }
    bypass_reason(rule)
}

pub(super) fn check(ctx: &AuditContext) -> Vec<Issue> {
    let mut issues = Vec::new();
    for network in ctx.networks.iter().filter(|n| ctx.internet_blocked(n)) {
        for rule in &ctx.rules {
            let Some(reason) = bypasses(ctx, rule, network) else {
                continue;
            };
            issues.push(
                Issue::new(
                    IssueType::InternetBlockBypassed,
                    format!(
                        "Network '{}' has internet access blocked, but rule '{}' allows it again ({reason})",
                        network.name, rule.name
                    ),
                )
                .with_rule(&rule.id)
                .with_current(&network.name, Some(network.vlan_id))
                .with_meta("reason", reason),
            );
        }
    }
    issues
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Endpoint, FirewallZone, RuleAction, Severity, ZoneTable};

    fn offline() -> NetworkInfo {
        let mut n = NetworkInfo::new("cams", "Cameras", 50);
        n.internet_access_enabled = false;
        n.subnet = "192.168.50.0/24".parse().ok();
        n
    }

    fn from(ids: &[&str], inverted: bool) -> FirewallRule {
        let mut r = FirewallRule::new("r", "Outbound", RuleAction::Allow);
        r.source = Endpoint {
            target: MatchTarget::Network {
                ids: ids.iter().map(|s| (*s).to_owned()).collect(),
                match_opposite: inverted,
            },
            ..Endpoint::default()
        };
        r
    }

    fn run(rule: FirewallRule) -> Vec<Issue> {
        check(&AuditContext::new(vec![rule], vec![offline()]))
    }

    #[test]
    fn all_protocol_allow_reopens_internet() {
        let issues = run(from(&["cams"], false));
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].severity, Severity::Recommended);
        assert_eq!(issues[0].score_impact, 5);
    }

    #[test]
    fn https_range_reopens_internet() {
        let mut rule = from(&["cams"], false);
        rule.protocol = Protocol::Tcp;
        rule.destination.port = Some("400-500".into());
        assert_eq!(run(rule).len(), 1);
    }

    #[test]
    fn tcp_without_port_reopens_internet() {
        let mut rule = from(&["cams"], false);
        rule.protocol = Protocol::Tcp;
        let issues = run(rule);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].metadata["reason"], "web ports");

        let mut udp = from(&["cams"], false);
        udp.protocol = Protocol::Udp;
        assert!(run(udp).is_empty());
    }

    #[test]
    fn allow_into_external_zone_reopens_internet() {
        let zones = ZoneTable::new(vec![
            FirewallZone {
                id: "z-ext".into(),
                name: "External".into(),
                zone_key: None,
                network_ids: vec![],
            },
            FirewallZone {
                id: "z-lan".into(),
                name: "Internal".into(),
                zone_key: Some("internal".into()),
                network_ids: vec!["cams".into()],
            },
        ]);
        let audit = |zone: &str| {
            let mut rule = from(&["cams"], false);
            rule.destination.zone_id = Some(zone.into());
            check(&AuditContext::new(vec![rule], vec![offline()]).with_zones(zones.clone()))
        };

        let issues = audit("z-ext");
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].issue_type, IssueType::InternetBlockBypassed);
        assert_eq!(issues[0].rule_id.as_deref(), Some("r"));
        assert!(audit("z-lan").is_empty());
    }

    #[test]
    fn app_match_reopens_internet() {
        let mut rule = from(&["cams"], false);
        rule.destination.target = MatchTarget::AppCategory { ids: vec![5] };
        assert_eq!(run(rule).len(), 1);
    }

    #[test]
    fn exemptions() {
        let mut ntp = from(&["cams"], false);
        ntp.protocol = Protocol::Udp;
        ntp.destination.port = Some("123".into());
        assert!(run(ntp).is_empty());

        let mut domain = from(&["cams"], false);
        domain.destination.target = MatchTarget::Web {
            domains: vec!["ui.com".into()],
        };
        assert!(run(domain).is_empty());

        let mut system = from(&["cams"], false);
        system.predefined = true;
        assert!(run(system).is_empty());

        assert!(run(from(&["cams"], true)).is_empty());

        let mut udp_web = from(&["cams"], false);
        udp_web.protocol = Protocol::Udp;
        udp_web.destination.port = Some("443".into());
        assert!(run(udp_web).is_empty());
    }

    #[test]
    fn online_networks_are_ignored() {
        let mut net = offline();
        net.internet_access_enabled = true;
        let ctx = AuditContext::new(vec![from(&["cams"], false)], vec![net]);
        assert!(check(&ctx).is_empty());
    }
}
