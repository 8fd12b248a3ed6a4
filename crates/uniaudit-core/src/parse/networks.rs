// ── Network parsing ──

use std::net::IpAddr;

use ipnet::IpNet;
use serde_json::Value;
use tracing::debug;

use super::{array_field, bool_field, int_field, row_id, str_field, unwrap_envelope};
use crate::classify::{NetworkSignals, classify_network};
use crate::model::NetworkInfo;

/// Purposes that describe uplinks and tunnels rather than local VLANs.
const NON_LAN_PURPOSES: &[&str] = &["wan", "remote-user-vpn", "site-vpn", "vpn-client"];

/// Parse networks from a `networkconf` export, or from the
/// `network_table` a gateway embeds in the devices payload.
///
/// When the same id appears more than once, the first occurrence wins.
pub fn parse_networks(doc: &Value) -> Vec<NetworkInfo> {
    let mut networks: Vec<NetworkInfo> = Vec::new();
    for item in unwrap_envelope(doc) {
        let rows: Vec<&Value> = if item.get("network_table").is_some() {
            array_field(item, "network_table").iter().collect()
        } else if item.get("mac").is_some() {
            // A device without a network table.
            Vec::new()
        } else {
            vec![item]
        };
        for row in rows {
            if let Some(network) = parse_network(row) {
                if networks.iter().any(|n| n.id == network.id) {
                    continue;
                }
                networks.push(network);
            }
        }
    }
    debug!(count = networks.len(), "parsed networks");
    networks
}

/// Parse one network row and classify it. `None` for rows without an id
/// and for WAN/VPN entries.
pub fn parse_network(row: &Value) -> Option<NetworkInfo> {
    let Some(id) = row_id(row) else {
        debug!(name = ?str_field(row, "name"), "dropping network without id");
        return None;
    };
    let raw_purpose = str_field(row, "purpose").map(str::to_ascii_lowercase);
    if raw_purpose
        .as_deref()
        .is_some_and(|p| NON_LAN_PURPOSES.contains(&p))
    {
        debug!(network_id = %id, purpose = ?raw_purpose, "skipping non-LAN network");
        return None;
    }

    let name = str_field(row, "name").unwrap_or_default().to_owned();
    let vlan_id = int_field(row, "vlan")
        .and_then(|v| u16::try_from(v).ok())
        .filter(|v| *v > 0)
        .unwrap_or(1);

    let interface: Option<IpNet> = str_field(row, "ip_subnet").and_then(|s| s.parse().ok());

    let dhcp_enabled = bool_field(row, "dhcpd_enabled").unwrap_or(false);
    let isolation = bool_field(row, "network_isolation_enabled");
    let internet = bool_field(row, "internet_access_enabled");

    let purpose = classify_network(
        &name,
        NetworkSignals {
            purpose: raw_purpose.as_deref(),
            vlan_id: Some(vlan_id),
            dhcp_enabled: Some(dhcp_enabled),
            network_isolation_enabled: isolation,
            internet_access_enabled: internet,
        },
    );

    let dhcp_dns_servers = (1..=4)
        .filter_map(|i| str_field(row, &format!("dhcpd_dns_{i}")))
        .filter_map(|s| s.parse::<IpAddr>().ok())
        .collect();

    Some(NetworkInfo {
        id,
        name,
        vlan_id,
        purpose,
        raw_purpose,
        subnet: interface.map(|net| net.trunc()),
        gateway: interface.map(|net| net.addr()),
        dhcp_enabled,
        dhcp_dns_servers,
        network_isolation_enabled: isolation.unwrap_or(false),
        internet_access_enabled: internet.unwrap_or(true),
        firewall_zone_id: str_field(row, "firewall_zone_id").map(str::to_owned),
        network_group: str_field(row, "networkgroup").map(str::to_owned),
        switch_routed: str_field(row, "gateway_type")
            .is_some_and(|t| t.eq_ignore_ascii_case("switch")),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::model::NetworkPurpose;

    #[test]
    fn parses_and_classifies() {
        let row = json!({
            "_id": "n30",
            "name": "Cameras",
            "purpose": "corporate",
            "vlan": 30,
            "ip_subnet": "192.168.30.1/24",
            "dhcpd_enabled": true,
            "dhcpd_dns_1": "1.1.1.1",
            "dhcpd_dns_2": "bogus",
            "network_isolation_enabled": true,
            "internet_access_enabled": false,
            "firewall_zone_id": "z-cam"
        });
        let net = parse_network(&row).unwrap();
        assert_eq!(net.purpose, NetworkPurpose::Security);
        assert_eq!(net.vlan_id, 30);
        assert_eq!(net.subnet, "192.168.30.0/24".parse().ok());
        assert_eq!(net.gateway, "192.168.30.1".parse().ok());
        assert_eq!(net.dhcp_dns_servers, vec!["1.1.1.1".parse::<IpAddr>().unwrap()]);
        assert!(net.network_isolation_enabled);
        assert!(!net.internet_access_enabled);
        assert_eq!(net.firewall_zone_id.as_deref(), Some("z-cam"));
    }

    #[test]
    fn missing_vlan_is_native() {
        let net = parse_network(&json!({ "_id": "d", "name": "Default" })).unwrap();
        assert_eq!(net.vlan_id, 1);
        assert_eq!(net.purpose, NetworkPurpose::Management);
        assert!(net.internet_access_enabled);
    }

    #[test]
    fn skips_wan_and_vpn() {
        let doc = json!({ "data": [
            { "_id": "w", "name": "WAN", "purpose": "wan" },
            { "_id": "v", "name": "VPN", "purpose": "remote-user-vpn" },
            { "_id": "l", "name": "LAN", "purpose": "corporate", "vlan": 10 }
        ]});
        let nets = parse_networks(&doc);
        assert_eq!(nets.len(), 1);
        assert_eq!(nets[0].id, "l");
    }

    #[test]
    fn reads_gateway_network_table() {
        let doc = json!([
            { "type": "usw", "mac": "aa" },
            { "type": "udm", "mac": "bb", "network_table": [
                { "_id": "n1", "name": "IoT", "vlan": "40", "gateway_type": "switch" },
                { "_id": "n1", "name": "IoT duplicate", "vlan": 41 }
            ]}
        ]);
        let nets = parse_networks(&doc);
        assert_eq!(nets.len(), 1);
        assert_eq!(nets[0].vlan_id, 40);
        assert!(nets[0].switch_routed);
        assert_eq!(nets[0].purpose, NetworkPurpose::IoT);
    }
}
