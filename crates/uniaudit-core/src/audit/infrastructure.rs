//! Infrastructure devices belong on the management VLAN.

use super::AuditContext;
use crate::model::{DeviceKind, Issue, IssueType};

pub(super) fn check(ctx: &AuditContext) -> Vec<Issue> {
    let mut management: Vec<_> = ctx
        .management_networks()
        .filter(|n| n.subnet.is_some())
        .collect();
    // A tagged management VLAN supersedes the native one.
    if management.iter().any(|n| !n.is_native_vlan()) {
        management.retain(|n| !n.is_native_vlan());
    }
    let Some(recommended) = management.first() else {
        return Vec::new();
    };

    ctx.devices
        .iter()
        .filter(|d| d.kind.is_managed_infrastructure())
        .filter_map(|device| {
            let ip = device.ip?;
            if management.iter().any(|n| n.contains_ip(ip)) {
                return None;
            }
            let current = ctx.network_containing(ip);
            let mut issue = Issue::new(
                IssueType::InfraNotOnMgmt,
                format!(
                    "{} '{}' ({ip}) is not on the management network",
                    kind_label(device.kind),
                    device.name
                ),
            )
            .with_recommended(&recommended.name, recommended.vlan_id)
            .with_meta("device_mac", &device.mac);
            if let Some(current) = current {
                issue = issue.with_current(&current.name, Some(current.vlan_id));
            }
            Some(issue)
        })
        .collect()
}

fn kind_label(kind: DeviceKind) -> &'static str {
    match kind {
        DeviceKind::Switch => "Switch",
        DeviceKind::AccessPoint => "Access point",
        DeviceKind::Bridge => "Bridge",
        DeviceKind::Gateway => "Gateway",
        DeviceKind::Cellular => "Cellular modem",
        DeviceKind::Other => "Device",
    }
}
