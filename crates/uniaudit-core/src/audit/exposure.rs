//! Inbound exposure: UPnP and static port forwards.

use super::AuditContext;
use crate::groups::includes_port;
use crate::model::{Issue, IssueType, PortForward};

const REMOTE_ADMIN_PORTS: &[u16] = &[22, 23, 445, 3389, 5900];

fn exposed_admin_ports(forward: &PortForward) -> Vec<u16> {
    REMOTE_ADMIN_PORTS
        .iter()
        .copied()
        .filter(|p| {
            let port = p.to_string();
            [&forward.forward_port, &forward.destination_port]
                .into_iter()
                .flatten()
                .any(|spec| includes_port(spec, &port))
        })
        .collect()
}

pub(super) fn check(ctx: &AuditContext) -> Vec<Issue> {
    let mut issues = Vec::new();
    if ctx.upnp_enabled {
        issues.push(Issue::new(
            IssueType::UpnpEnabled,
            "UPnP is enabled: any LAN device can open inbound ports on the gateway",
        ));
    }

    for forward in ctx.port_forwards.iter().filter(|f| f.enabled) {
        if let Some(target) = forward.forward_ip {
            if let Some(net) = ctx
                .network_containing(target)
                .filter(|n| n.purpose.is_sensitive())
            {
                issues.push(
                    Issue::new(
                        IssueType::PortForwardToIsolated,
                        format!(
                            "Port forward '{}' exposes {target} on {} network '{}'",
                            forward.name, net.purpose, net.name
                        ),
                    )
                    .with_current(&net.name, Some(net.vlan_id))
                    .with_meta("port_forward_id", &forward.id),
                );
            }
        }

        if forward.is_source_restricted() {
            continue;
        }
        let ports = exposed_admin_ports(forward);
        if !ports.is_empty() {
            let list = ports
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            issues.push(
                Issue::new(
                    IssueType::PortForwardUnrestricted,
                    format!(
                        "Port forward '{}' exposes remote administration port(s) {list} to any source",
                        forward.name
                    ),
                )
                .with_meta("port_forward_id", &forward.id)
                .with_meta("ports", list),
            );
        }
    }
    issues
}
