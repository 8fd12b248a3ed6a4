//! Management access floor.
//!
//! An isolated management VLAN without internet still has to reach a few
//! cloud services or the devices on it degrade silently: controller
//! adoption and firmware, AFC for 6 GHz radios, time sync, and carrier
//! registration for cellular backup modems.

use serde::Serialize;
use strum::Display;

use super::AuditContext;
use super::scope::{Reach, domain_covers, reaches_internet, selects_network};
use crate::groups::endpoint_includes_port;
use crate::model::{FirewallRule, Issue, IssueType, MatchTarget, NetworkInfo};

const UNIFI_HOSTS: &[&str] = &["ui.com", "ubnt.com", "unifi.ui.com"];
const AFC_HOSTS: &[&str] = &["afc.ui.com", "federatedwireless.com"];
const CARRIER_HOSTS: &[&str] = &["3gppnetwork.org"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display)]
pub enum ManagementRequirement {
    #[strum(serialize = "UniFi cloud")]
    Unifi,
    #[strum(serialize = "AFC")]
    Afc,
    #[strum(serialize = "NTP")]
    Ntp,
    #[strum(serialize = "5G carrier registration")]
    Cellular,
}

impl ManagementRequirement {
    fn issue_type(self) -> IssueType {
        match self {
            Self::Unifi => IssueType::MgmtMissingUnifiAccess,
            Self::Afc => IssueType::MgmtMissingAfcAccess,
            Self::Ntp => IssueType::MgmtMissingNtpAccess,
            Self::Cellular => IssueType::MgmtMissing5gAccess,
        }
    }

    fn hint(self) -> &'static str {
        match self {
            Self::Unifi => "allow ui.com so devices can reach the UniFi cloud for adoption and updates",
            Self::Afc => "allow afc.ui.com so 6 GHz radios can obtain AFC power grants",
            Self::Ntp => "allow port 123 (or an NTP domain) so devices keep accurate time",
            Self::Cellular => "allow 3gppnetwork.org so the cellular modem can register with its carrier",
        }
    }
}

fn web_covers_any(rule: &FirewallRule, hosts: &[&str]) -> bool {
    rule.destination
        .web_domains()
        .iter()
        .any(|d| hosts.iter().any(|h| domain_covers(d, h)))
}

fn is_ntp_domain(domain: &str) -> bool {
    let lower = domain.to_ascii_lowercase();
    lower.contains("ntp") || lower.starts_with("time.")
}

fn satisfies(ctx: &AuditContext, rule: &FirewallRule, req: ManagementRequirement) -> bool {
    match req {
        ManagementRequirement::Unifi => web_covers_any(rule, UNIFI_HOSTS),
        ManagementRequirement::Afc => web_covers_any(rule, AFC_HOSTS),
        ManagementRequirement::Ntp => {
            (rule.destination.port.is_some() && endpoint_includes_port(&rule.destination, "123"))
                || rule.destination.web_domains().iter().any(|d| is_ntp_domain(d))
        }
        ManagementRequirement::Cellular => {
            web_covers_any(rule, CARRIER_HOSTS)
                || (matches!(rule.destination.target, MatchTarget::Any)
                    && rule.destination.port.is_none()
                    && rule.protocol.is_all()
                    && !rule.match_opposite_protocol
                    && reaches_internet(ctx, &rule.destination))
        }
    }
}

/// Requirements an allow rule fulfils on its own, regardless of source.
pub fn requirements_met(ctx: &AuditContext, rule: &FirewallRule) -> Vec<ManagementRequirement> {
    if !rule.is_allow() {
        return Vec::new();
    }
    [
        ManagementRequirement::Unifi,
        ManagementRequirement::Afc,
        ManagementRequirement::Ntp,
        ManagementRequirement::Cellular,
    ]
    .into_iter()
    .filter(|req| satisfies(ctx, rule, *req))
    .collect()
}

/// A user allow rule that exists to give a management network one of
/// its required services. Other checks leave these alone.
pub(crate) fn is_carve_out(ctx: &AuditContext, rule: &FirewallRule) -> bool {
    rule.is_allow()
        && !rule.source.is_any()
        && ctx
            .management_networks()
            .any(|n| selects_network(ctx, &rule.source, n, Reach::Touches))
        && !requirements_met(ctx, rule).is_empty()
}

fn needs_floor(ctx: &AuditContext, network: &NetworkInfo) -> bool {
    network.network_isolation_enabled && ctx.internet_blocked(network)
}

pub(super) fn check(ctx: &AuditContext) -> Vec<Issue> {
    let mut issues = Vec::new();
    let mut required = vec![
        ManagementRequirement::Unifi,
        ManagementRequirement::Afc,
        ManagementRequirement::Ntp,
    ];
    if ctx.has_cellular_device() {
        required.push(ManagementRequirement::Cellular);
    }

    for network in ctx.management_networks().filter(|n| needs_floor(ctx, n)) {
        let candidates: Vec<&FirewallRule> = ctx
            .user_rules()
            .filter(|r| r.is_allow())
            .filter(|r| selects_network(ctx, &r.source, network, Reach::Touches))
            .collect();

        for req in &required {
            if candidates.iter().any(|r| satisfies(ctx, r, *req)) {
                continue;
            }
            issues.push(
                Issue::new(
                    req.issue_type(),
                    format!(
                        "Management network '{}' has no internet access and no rule allowing {req}",
                        network.name
                    ),
                )
                .with_description(req.hint())
                .with_current(&network.name, Some(network.vlan_id))
                .with_meta("network_id", &network.id),
            );
        }
    }
    issues
}
