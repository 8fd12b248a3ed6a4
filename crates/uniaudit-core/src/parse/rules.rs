// ── Firewall rule parsing ──
//
// Two dialects share one output type. Legacy rules carry flat
// `src_*`/`dst_*` fields; zone-based policies nest `source` and
// `destination` objects. Both funnel through `SideFields`, which is the
// only place a `MatchTarget` gets built.

use std::collections::BTreeSet;

use serde_json::Value;
use tracing::debug;

use super::{
    array_field, bool_field, int_field, int_list, row_id, str_field, string_field, string_list,
    unwrap_envelope,
};
use crate::groups::GroupTable;
use crate::model::{
    ConnectionStateType, Endpoint, FirewallRule, MatchTarget, Protocol, RuleAction,
};

const GATEWAY_TYPES: &[&str] = &["ugw", "udm", "uxg", "ucg"];

/// Extract every rule from a devices payload, a policies export, or a
/// bare rule list.
///
/// Gateway devices contribute their embedded `firewall_rules` and
/// `firewall_policies`; other devices are ignored.
pub fn parse_firewall_rules(doc: &Value, groups: &GroupTable) -> Vec<FirewallRule> {
    let mut rules = Vec::new();
    for item in unwrap_envelope(doc) {
        match str_field(item, "type") {
            Some(kind) if GATEWAY_TYPES.contains(&kind.to_ascii_lowercase().as_str()) => {
                collect_embedded(item, groups, &mut rules);
            }
            Some(kind) if item.get("mac").is_some() => {
                debug!(device_type = kind, "skipping non-gateway device");
            }
            _ if item.get("firewall_rules").is_some()
                || item.get("policies").is_some()
                || item.get("firewall_policies").is_some() =>
            {
                collect_embedded(item, groups, &mut rules);
            }
            _ => rules.extend(parse_row(item, groups)),
        }
    }
    debug!(count = rules.len(), "parsed firewall rules");
    rules
}

fn collect_embedded(item: &Value, groups: &GroupTable, out: &mut Vec<FirewallRule>) {
    out.extend(
        array_field(item, "firewall_rules")
            .iter()
            .filter_map(|row| parse_row(row, groups)),
    );
    for key in ["policies", "firewall_policies"] {
        out.extend(
            array_field(item, key)
                .iter()
                .filter_map(|row| parse_policy(row, groups)),
        );
    }
}

/// Pick the dialect from the row's shape.
fn parse_row(row: &Value, groups: &GroupTable) -> Option<FirewallRule> {
    let nested = |key: &str| row.get(key).is_some_and(Value::is_object);
    if nested("source") || nested("destination") {
        parse_policy(row, groups)
    } else {
        parse_legacy_rule(row, groups)
    }
}

// ── Shared fields ───────────────────────────────────────────────────

struct Common {
    id: String,
    name: String,
    action: RuleAction,
    enabled: bool,
    predefined: bool,
    protocol: Protocol,
    hit_count: Option<u64>,
}

fn common_fields(row: &Value, dialect: &str) -> Option<Common> {
    let Some(id) = row_id(row) else {
        debug!(dialect, name = ?str_field(row, "name"), "dropping rule without id");
        return None;
    };
    Some(Common {
        id,
        name: str_field(row, "name").unwrap_or_default().to_owned(),
        action: str_field(row, "action").map_or(RuleAction::Unknown, RuleAction::parse),
        enabled: bool_field(row, "enabled").unwrap_or(true),
        predefined: bool_field(row, "predefined").unwrap_or(false),
        protocol: str_field(row, "protocol").map_or(Protocol::All, Protocol::parse),
        hit_count: int_field(row, "hit_count").and_then(|n| u64::try_from(n).ok()),
    })
}

fn explicit_states(row: &Value) -> Option<(ConnectionStateType, BTreeSet<String>)> {
    let kind = str_field(row, "connection_state_type").and_then(ConnectionStateType::parse)?;
    let states = string_list(row, "connection_states")
        .into_iter()
        .map(|s| s.to_ascii_uppercase())
        .collect();
    Some((kind, states))
}

/// Fold the legacy `state_*` booleans into a state type.
///
/// No flags or all four flags mean every state. Only `established`
/// and/or `related` is the respond-only shape.
fn legacy_states(row: &Value) -> (ConnectionStateType, BTreeSet<String>) {
    let states: BTreeSet<String> = ["new", "established", "related", "invalid"]
        .into_iter()
        .filter(|s| bool_field(row, &format!("state_{s}")).unwrap_or(false))
        .map(str::to_ascii_uppercase)
        .collect();

    let respond_only = !states.is_empty()
        && states
            .iter()
            .all(|s| s == "ESTABLISHED" || s == "RELATED");
    if states.is_empty() || states.len() == 4 {
        (ConnectionStateType::All, BTreeSet::new())
    } else if respond_only {
        (ConnectionStateType::RespondOnly, states)
    } else {
        (ConnectionStateType::Custom, states)
    }
}

// ── Side fields ─────────────────────────────────────────────────────

#[derive(Default)]
struct SideFields {
    matching_target: Option<String>,
    network_ids: Vec<String>,
    ips: Vec<String>,
    macs: Vec<String>,
    web_domains: Vec<String>,
    app_ids: Vec<i64>,
    app_category_ids: Vec<i64>,
    zone_id: Option<String>,
    port: Option<String>,
    match_opposite_networks: bool,
    match_opposite_ips: bool,
    match_opposite_ports: bool,
}

impl SideFields {
    fn into_endpoint(mut self) -> Endpoint {
        let zone_id = self.zone_id.take();
        let port = self.port.take();
        let match_opposite_ports = self.match_opposite_ports;
        let target = match self.matching_target.as_deref() {
            Some(raw) => match raw.to_ascii_uppercase().as_str() {
                "ANY" => MatchTarget::Any,
                "NETWORK" => MatchTarget::Network {
                    ids: self.network_ids,
                    match_opposite: self.match_opposite_networks,
                },
                "IP" => MatchTarget::Ip {
                    addrs: self.ips,
                    match_opposite: self.match_opposite_ips,
                },
                "CLIENT" | "MAC" => MatchTarget::Client { macs: self.macs },
                "WEB" | "DOMAIN" => MatchTarget::Web {
                    domains: self.web_domains,
                },
                "APP" => MatchTarget::App { ids: self.app_ids },
                "APP_CATEGORY" => MatchTarget::AppCategory {
                    ids: self.app_category_ids,
                },
                other => {
                    debug!(matching_target = other, "unsupported matching target");
                    MatchTarget::Unsupported {
                        raw: other.to_owned(),
                    }
                }
            },
            None => self.infer_target(),
        };
        Endpoint {
            target,
            zone_id,
            port,
            match_opposite_ports,
        }
    }

    /// Legacy rows never say what they match; the first populated list wins.
    fn infer_target(self) -> MatchTarget {
        if !self.network_ids.is_empty() {
            MatchTarget::Network {
                ids: self.network_ids,
                match_opposite: self.match_opposite_networks,
            }
        } else if !self.ips.is_empty() {
            MatchTarget::Ip {
                addrs: self.ips,
                match_opposite: self.match_opposite_ips,
            }
        } else if !self.macs.is_empty() {
            MatchTarget::Client { macs: self.macs }
        } else if !self.web_domains.is_empty() {
            MatchTarget::Web {
                domains: self.web_domains,
            }
        } else if !self.app_ids.is_empty() {
            MatchTarget::App { ids: self.app_ids }
        } else if !self.app_category_ids.is_empty() {
            MatchTarget::AppCategory {
                ids: self.app_category_ids,
            }
        } else {
            MatchTarget::Any
        }
    }
}

fn push_unique(list: &mut Vec<String>, items: impl IntoIterator<Item = String>) {
    for item in items {
        if !list.contains(&item) {
            list.push(item);
        }
    }
}

// ── Legacy dialect ──────────────────────────────────────────────────

fn legacy_side(row: &Value, side: &str, groups: &GroupTable) -> SideFields {
    let key = |suffix: &str| format!("{side}_{suffix}");
    let mut fields = SideFields {
        matching_target: str_field(row, &key("matching_target")).map(str::to_owned),
        zone_id: str_field(row, &key("zone_id")).map(str::to_owned),
        port: string_field(row, &key("port")),
        match_opposite_networks: bool_field(row, &key("match_opposite_networks")).unwrap_or(false),
        match_opposite_ips: bool_field(row, &key("match_opposite_ips")).unwrap_or(false),
        match_opposite_ports: bool_field(row, &key("match_opposite_ports")).unwrap_or(false),
        web_domains: string_list(row, &key("web_domains")),
        ..SideFields::default()
    };

    push_unique(&mut fields.network_ids, string_list(row, &key("network_ids")));
    for single in ["network_id", "networkconf_id"] {
        push_unique(&mut fields.network_ids, string_field(row, &key(single)));
    }
    push_unique(&mut fields.ips, string_list(row, &key("ips")));
    push_unique(&mut fields.ips, string_field(row, &key("address")));
    push_unique(&mut fields.macs, string_list(row, &key("mac_addresses")));
    push_unique(&mut fields.macs, string_field(row, &key("mac_address")));

    for group_id in string_list(row, &key("firewallgroup_ids")) {
        if let Some(addrs) = groups.resolve_address_group(&group_id) {
            push_unique(&mut fields.ips, addrs);
        } else if let Some(ports) = groups.resolve_port_group(&group_id) {
            if fields.port.is_none() {
                fields.port = Some(ports);
            }
        } else {
            debug!(side, %group_id, "unresolved firewall group reference");
        }
    }

    fields
}

/// Parse one flat legacy rule row.
pub fn parse_legacy_rule(row: &Value, groups: &GroupTable) -> Option<FirewallRule> {
    let common = common_fields(row, "legacy")?;
    let (connection_state_type, connection_states) =
        explicit_states(row).unwrap_or_else(|| legacy_states(row));

    Some(FirewallRule {
        id: common.id,
        name: common.name,
        action: common.action,
        enabled: common.enabled,
        predefined: common.predefined,
        index: int_field(row, "rule_index")
            .or_else(|| int_field(row, "index"))
            .unwrap_or(0),
        protocol: common.protocol,
        match_opposite_protocol: bool_field(row, "protocol_match_excepted")
            .or_else(|| bool_field(row, "match_opposite_protocol"))
            .unwrap_or(false),
        connection_state_type,
        connection_states,
        source: legacy_side(row, "src", groups).into_endpoint(),
        destination: legacy_side(row, "dst", groups).into_endpoint(),
        ruleset: str_field(row, "ruleset").map(str::to_owned),
        hit_count: common.hit_count,
    })
}

// ── Zone-based policies ─────────────────────────────────────────────

fn policy_port(side: &Value, groups: &GroupTable) -> Option<String> {
    let kind = str_field(side, "port_matching_type").map(str::to_ascii_uppercase);
    match kind.as_deref() {
        Some("ANY") => None,
        Some("OBJECT") => {
            let group_id = str_field(side, "port_group_id")?;
            let resolved = groups.resolve_port_group(group_id);
            if resolved.is_none() {
                debug!(group_id, "port group did not resolve, treating as any port");
            }
            resolved
        }
        _ => string_field(side, "port"),
    }
}

fn policy_side(side: Option<&Value>, groups: &GroupTable) -> SideFields {
    let Some(side) = side.filter(|v| v.is_object()) else {
        return SideFields::default();
    };

    let mut ips = string_list(side, "ips");
    if let Some(group_id) = str_field(side, "ip_group_id") {
        match groups.resolve_address_group(group_id) {
            Some(addrs) => push_unique(&mut ips, addrs),
            None => debug!(group_id, "address group did not resolve"),
        }
    }

    SideFields {
        matching_target: str_field(side, "matching_target").map(str::to_owned),
        network_ids: string_list(side, "network_ids"),
        ips,
        macs: string_list(side, "client_macs"),
        web_domains: string_list(side, "web_domains"),
        app_ids: int_list(side, "app_ids"),
        app_category_ids: int_list(side, "app_category_ids"),
        zone_id: str_field(side, "zone_id").map(str::to_owned),
        port: policy_port(side, groups),
        match_opposite_networks: bool_field(side, "match_opposite_networks").unwrap_or(false),
        match_opposite_ips: bool_field(side, "match_opposite_ips").unwrap_or(false),
        match_opposite_ports: bool_field(side, "match_opposite_ports").unwrap_or(false),
    }
}

/// Parse one zone-based policy object.
pub fn parse_policy(row: &Value, groups: &GroupTable) -> Option<FirewallRule> {
    let common = common_fields(row, "policy")?;
    let (connection_state_type, connection_states) =
        explicit_states(row).unwrap_or_else(|| legacy_states(row));

    Some(FirewallRule {
        id: common.id,
        name: common.name,
        action: common.action,
        enabled: common.enabled,
        predefined: common.predefined,
        index: int_field(row, "index")
            .or_else(|| int_field(row, "rule_index"))
            .unwrap_or(0),
        protocol: common.protocol,
        match_opposite_protocol: bool_field(row, "match_opposite_protocol").unwrap_or(false),
        connection_state_type,
        connection_states,
        source: policy_side(row.get("source"), groups).into_endpoint(),
        destination: policy_side(row.get("destination"), groups).into_endpoint(),
        ruleset: None,
        hit_count: common.hit_count,
    })
}
