// ── Devices, zones, groups, port forwards, site settings ──

use std::net::IpAddr;
use std::str::FromStr;

use serde_json::Value;
use tracing::debug;

use super::{
    array_field, bool_field, row_id, str_field, string_field, string_list, unwrap_envelope,
};
use crate::groups::{FirewallGroup, GroupType};
use crate::model::{DeviceInfo, DeviceKind, FirewallZone, PortForward};

// ── Devices ─────────────────────────────────────────────────────────

fn kind_from_type(raw: &str) -> Option<DeviceKind> {
    match raw.to_ascii_lowercase().as_str() {
        "uap" => Some(DeviceKind::AccessPoint),
        "usw" => Some(DeviceKind::Switch),
        "ubb" => Some(DeviceKind::Bridge),
        "ugw" | "udm" | "uxg" | "ucg" => Some(DeviceKind::Gateway),
        "umbb" => Some(DeviceKind::Cellular),
        _ => None,
    }
}

fn kind_from_model(model: &str) -> DeviceKind {
    let upper = model.to_ascii_uppercase();
    let starts = |prefixes: &[&str]| prefixes.iter().any(|p| upper.starts_with(p));
    if starts(&["U5G", "UMBB"]) {
        DeviceKind::Cellular
    } else if starts(&["USW"]) {
        DeviceKind::Switch
    } else if starts(&["UAP", "U6", "U7"]) {
        DeviceKind::AccessPoint
    } else if starts(&["UDM", "UCG", "UXG", "UDR", "UGW"]) {
        DeviceKind::Gateway
    } else {
        DeviceKind::Other
    }
}

/// Parse adopted devices from the devices payload.
pub fn parse_devices(doc: &Value) -> Vec<DeviceInfo> {
    let devices: Vec<DeviceInfo> = unwrap_envelope(doc)
        .into_iter()
        .filter_map(parse_device)
        .collect();
    debug!(count = devices.len(), "parsed devices");
    devices
}

fn parse_device(row: &Value) -> Option<DeviceInfo> {
    let mac = str_field(row, "mac")?.to_ascii_lowercase();
    let model = str_field(row, "model").map(str::to_owned);
    let kind = str_field(row, "type")
        .and_then(kind_from_type)
        .or_else(|| model.as_deref().map(kind_from_model))
        .unwrap_or(DeviceKind::Other);
    Some(DeviceInfo {
        id: row_id(row).unwrap_or_else(|| mac.clone()),
        name: str_field(row, "name").unwrap_or(&mac).to_owned(),
        mac,
        model,
        kind,
        ip: str_field(row, "ip").and_then(|s| s.parse().ok()),
    })
}

/// Whether any device is a cellular (5G/LTE) backup modem.
pub fn has_cellular_device(devices: &[DeviceInfo]) -> bool {
    devices.iter().any(|d| d.kind == DeviceKind::Cellular)
}

// ── Zones ───────────────────────────────────────────────────────────

/// A zone row needs an id and at least a name or a key; anything else is
/// some other object that happens to sit in the same payload.
fn parse_zone(row: &Value) -> Option<FirewallZone> {
    let id = row_id(row)?;
    let name = str_field(row, "name");
    let zone_key = str_field(row, "zone_key").or_else(|| str_field(row, "key"));
    if (name.is_none() && zone_key.is_none()) || row.get("action").is_some() {
        return None;
    }
    Some(FirewallZone {
        name: name.unwrap_or_default().to_owned(),
        zone_key: zone_key.map(str::to_owned),
        network_ids: string_list(row, "network_ids"),
        id,
    })
}

/// Parse firewall zones from a zones export, or from the `firewall_zones`
/// array a gateway embeds in the devices payload.
pub fn parse_zones(doc: &Value) -> Vec<FirewallZone> {
    let mut zones = Vec::new();
    for item in unwrap_envelope(doc) {
        if item.get("firewall_zones").is_some() {
            zones.extend(array_field(item, "firewall_zones").iter().filter_map(parse_zone));
        } else if item.get("mac").is_none() {
            zones.extend(parse_zone(item));
        }
    }
    debug!(count = zones.len(), "parsed firewall zones");
    zones
}

// ── Groups ──────────────────────────────────────────────────────────

/// Parse firewall groups. Groups of an unknown type are dropped.
pub fn parse_groups(doc: &Value) -> Vec<FirewallGroup> {
    unwrap_envelope(doc)
        .into_iter()
        .filter_map(|row| {
            let id = row_id(row)?;
            let raw_type = str_field(row, "group_type")?;
            let Ok(group_type) = GroupType::from_str(raw_type) else {
                debug!(group_id = %id, group_type = raw_type, "skipping unknown group type");
                return None;
            };
            Some(FirewallGroup {
                name: str_field(row, "name").unwrap_or_default().to_owned(),
                group_type,
                members: string_list(row, "group_members"),
                id,
            })
        })
        .collect()
}

// ── Port forwards ───────────────────────────────────────────────────

/// Parse static port-forward entries.
pub fn parse_port_forwards(doc: &Value) -> Vec<PortForward> {
    unwrap_envelope(doc)
        .into_iter()
        .filter_map(|row| {
            let id = row_id(row)?;
            let source = str_field(row, "src")
                .filter(|s| !s.eq_ignore_ascii_case("any"))
                .map(str::to_owned);
            Some(PortForward {
                name: str_field(row, "name").unwrap_or_default().to_owned(),
                enabled: bool_field(row, "enabled").unwrap_or(true),
                forward_ip: str_field(row, "fwd").and_then(|s| s.parse::<IpAddr>().ok()),
                forward_port: string_field(row, "fwd_port"),
                destination_port: string_field(row, "dst_port"),
                protocol: str_field(row, "proto").unwrap_or("tcp_udp").to_ascii_lowercase(),
                source,
                id,
            })
        })
        .collect()
}

// ── Site settings ───────────────────────────────────────────────────

/// Whether UPnP is switched on in the gateway (`usg`) settings section.
pub fn parse_upnp_enabled(doc: &Value) -> bool {
    unwrap_envelope(doc)
        .into_iter()
        .filter(|row| str_field(row, "key") == Some("usg"))
        .any(|row| bool_field(row, "upnp_enabled").unwrap_or(false))
}
