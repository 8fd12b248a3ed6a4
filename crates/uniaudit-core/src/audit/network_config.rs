//! Per-network settings that contradict the network's inferred role.

use super::AuditContext;
use crate::model::{Issue, IssueType, NetworkInfo, NetworkPurpose};

fn network_issue(kind: IssueType, network: &NetworkInfo, message: String) -> Issue {
    Issue::new(kind, message)
        .with_current(&network.name, Some(network.vlan_id))
        .with_meta("network_id", &network.id)
}

/// DHCP-advertised DNS servers that live inside another internal network.
fn foreign_dns_servers(ctx: &AuditContext, network: &NetworkInfo) -> Vec<String> {
    network
        .dhcp_dns_servers
        .iter()
        .filter(|ip| !network.contains_ip(**ip))
        .filter(|ip| ctx.networks.iter().any(|n| n.id != network.id && n.contains_ip(**ip)))
        .map(ToString::to_string)
        .collect()
}

fn check_network(ctx: &AuditContext, net: &NetworkInfo, issues: &mut Vec<Issue>) {
    let name = &net.name;
    let has_internet = !ctx.internet_blocked(net);
    // The native VLAN carries untagged traffic and cannot follow
    // management VLAN hardening.
    let mgmt = net.purpose == NetworkPurpose::Management && !net.is_native_vlan();

    match net.purpose {
        NetworkPurpose::Security => {
            if !net.network_isolation_enabled {
                issues.push(network_issue(
                    IssueType::SecurityNetworkNotIsolated,
                    net,
                    format!("Security network '{name}' is not isolated from other networks"),
                ));
            }
            if has_internet {
                issues.push(network_issue(
                    IssueType::SecurityNetworkHasInternet,
                    net,
                    format!("Security network '{name}' has internet access"),
                ));
            }
        }
        NetworkPurpose::Management if mgmt => {
            if !net.network_isolation_enabled {
                issues.push(network_issue(
                    IssueType::MgmtNetworkNotIsolated,
                    net,
                    format!("Management network '{name}' is not isolated from other networks"),
                ));
            }
            if has_internet {
                issues.push(network_issue(
                    IssueType::MgmtNetworkHasInternet,
                    net,
                    format!("Management network '{name}' has unrestricted internet access"),
                ));
            }
            if net.dhcp_enabled {
                issues.push(network_issue(
                    IssueType::MgmtDhcpEnabled,
                    net,
                    format!("Management network '{name}' hands out DHCP leases"),
                ));
            }
        }
        NetworkPurpose::IoT if !net.network_isolation_enabled => {
            issues.push(network_issue(
                IssueType::IotNetworkNotIsolated,
                net,
                format!("IoT network '{name}' is not isolated from other networks"),
            ));
        }
        _ => {}
    }

    if net.network_isolation_enabled {
        let shared = foreign_dns_servers(ctx, net);
        if !shared.is_empty() {
            let servers = shared.join(", ");
            issues.push(
                network_issue(
                    IssueType::DnsSharedServers,
                    net,
                    format!("Isolated network '{name}' uses DNS servers on other networks: {servers}"),
                )
                .with_meta("dns_servers", servers),
            );
        }
    }

    let segmented = matches!(
        net.purpose,
        NetworkPurpose::Security | NetworkPurpose::IoT | NetworkPurpose::Guest
    ) || mgmt;
    if segmented && net.switch_routed {
        issues.push(network_issue(
            IssueType::RoutingEnabled,
            net,
            format!(
                "Network '{name}' is routed by a layer-3 switch, bypassing the gateway firewall"
            ),
        ));
    }
}

pub(super) fn check(ctx: &AuditContext) -> Vec<Issue> {
    let mut issues = Vec::new();
    for net in &ctx.networks {
        check_network(ctx, net, &mut issues);
    }
    issues
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::Severity;

    fn net(id: &str, purpose: NetworkPurpose, vlan: u16) -> NetworkInfo {
        let mut n = NetworkInfo::new(id, id, vlan);
        n.purpose = purpose;
        n.subnet = format!("10.0.{vlan}.0/24").parse().ok();
        n
    }

    fn codes(nets: Vec<NetworkInfo>) -> Vec<IssueType> {
        check(&AuditContext::new(Vec::new(), nets))
            .into_iter()
            .map(|i| i.issue_type)
            .collect()
    }

    #[test]
    fn open_security_network() {
        let issues = check(&AuditContext::new(
            Vec::new(),
            vec![net("cams", NetworkPurpose::Security, 50)],
        ));
        let found: Vec<IssueType> = issues.iter().map(|i| i.issue_type).collect();
        assert_eq!(
            found,
            vec![
                IssueType::SecurityNetworkNotIsolated,
                IssueType::SecurityNetworkHasInternet
            ]
        );
        assert_eq!(issues[0].severity, Severity::Critical);
        assert_eq!(issues[0].score_impact, 15);
    }

    #[test]
    fn management_hardening_skips_native_vlan() {
        let mut tagged = net("mgmt", NetworkPurpose::Management, 99);
        tagged.dhcp_enabled = true;
        assert_eq!(
            codes(vec![tagged]),
            vec![
                IssueType::MgmtNetworkNotIsolated,
                IssueType::MgmtNetworkHasInternet,
                IssueType::MgmtDhcpEnabled
            ]
        );

        let mut native = net("default", NetworkPurpose::Management, 1);
        native.dhcp_enabled = true;
        native.switch_routed = true;
        assert!(codes(vec![native]).is_empty());
    }

    #[test]
    fn isolated_iot_with_lan_dns() {
        let lan = net("lan", NetworkPurpose::Home, 10);
        let mut iot = net("iot", NetworkPurpose::IoT, 40);
        iot.network_isolation_enabled = true;
        iot.dhcp_dns_servers = vec![
            "10.0.10.53".parse().unwrap(),
            "10.0.40.1".parse().unwrap(),
            "1.1.1.1".parse().unwrap(),
        ];
        let issues = check(&AuditContext::new(Vec::new(), vec![lan, iot]));
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].issue_type, IssueType::DnsSharedServers);
        assert_eq!(issues[0].metadata["dns_servers"], "10.0.10.53");
    }

    #[test]
    fn switch_routed_guest() {
        let mut guest = net("guest", NetworkPurpose::Guest, 60);
        guest.switch_routed = true;
        assert_eq!(codes(vec![guest]), vec![IssueType::RoutingEnabled]);

        let mut home = net("lan", NetworkPurpose::Home, 10);
        home.switch_routed = true;
        assert!(codes(vec![home]).is_empty());
    }

    #[test]
    fn unisolated_iot() {
        assert_eq!(
            codes(vec![net("iot", NetworkPurpose::IoT, 40)]),
            vec![IssueType::IotNetworkNotIsolated]
        );
    }
}
