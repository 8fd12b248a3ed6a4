//! Firewall group resolution and port/protocol predicates.
//!
//! Policies reference named port groups and address groups by id. The
//! parser resolves those references through a [`GroupTable`] so the rule
//! model only ever carries concrete port specs and address lists. The free
//! functions here are the primitive "does this rule cover that traffic"
//! tests shared by the evaluator and the audit checks.

use std::ops::RangeInclusive;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::model::{Endpoint, FirewallRule, Protocol, RuleAction};

// ── Groups ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum GroupType {
    PortGroup,
    AddressGroup,
    Ipv6AddressGroup,
}

impl GroupType {
    fn is_address(self) -> bool {
        matches!(self, Self::AddressGroup | Self::Ipv6AddressGroup)
    }
}

/// A named list of ports or addresses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FirewallGroup {
    pub id: String,
    pub name: String,
    pub group_type: GroupType,
    /// Port tokens (`"443"`, `"8000-8080"`) or address tokens (`"10.0.0.5"`, `"10.1.0.0/16"`).
    pub members: Vec<String>,
}

/// Id-keyed group lookup, in load order.
#[derive(Debug, Clone, Default)]
pub struct GroupTable {
    groups: IndexMap<String, FirewallGroup>,
}

impl GroupTable {
    pub fn new(groups: impl IntoIterator<Item = FirewallGroup>) -> Self {
        Self {
            groups: groups.into_iter().map(|g| (g.id.clone(), g)).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&FirewallGroup> {
        self.groups.get(id)
    }

    fn members_of(&self, id: &str, accept: impl Fn(GroupType) -> bool) -> Option<Vec<String>> {
        let group = self.get(id)?;
        if !accept(group.group_type) {
            tracing::debug!(
                group_id = id,
                group_type = %group.group_type,
                "group reference has unexpected type"
            );
            return None;
        }
        let members: Vec<String> = group
            .members
            .iter()
            .map(|m| m.trim())
            .filter(|m| !m.is_empty())
            .map(String::from)
            .collect();
        (!members.is_empty()).then_some(members)
    }

    /// Resolve a port group into a comma-separated spec, keeping ranges intact.
    ///
    /// `None` on a missing id, an empty group, or a non-port group.
    pub fn resolve_port_group(&self, id: &str) -> Option<String> {
        self.members_of(id, |t| t == GroupType::PortGroup)
            .map(|members| members.join(","))
    }

    /// Resolve an IPv4 or IPv6 address group into its literal/CIDR members.
    pub fn resolve_address_group(&self, id: &str) -> Option<Vec<String>> {
        self.members_of(id, GroupType::is_address)
    }
}

// ── Inversion ───────────────────────────────────────────────────────

/// Apply a "match opposite" flag to a coverage result.
///
/// Used identically for the network, IP, port and protocol dimensions.
#[inline]
pub fn invert_if(flag: bool, matched: bool) -> bool {
    matched != flag
}

// ── Ports ───────────────────────────────────────────────────────────

/// Parse a port spec (`"22,50-100,443"`) into inclusive ranges.
///
/// Empty tokens are ignored. Any other malformed token, or a range whose
/// start exceeds its end, rejects the whole spec.
pub fn parse_port_spec(spec: &str) -> Option<Vec<RangeInclusive<u16>>> {
    let mut ranges = Vec::new();
    for token in spec.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        let range = match token.split_once('-') {
            Some((lo, hi)) => {
                let lo: u16 = lo.trim().parse().ok()?;
                let hi: u16 = hi.trim().parse().ok()?;
                if lo > hi {
                    return None;
                }
                lo..=hi
            }
            None => {
                let p: u16 = token.parse().ok()?;
                p..=p
            }
        };
        ranges.push(range);
    }
    (!ranges.is_empty()).then_some(ranges)
}

/// Whether `port` falls inside any literal or range of `spec`.
///
/// Never fails: a non-numeric port or a malformed spec yields `false`.
pub fn includes_port(spec: &str, port: &str) -> bool {
    let Ok(port) = port.trim().parse::<u16>() else {
        return false;
    };
    parse_port_spec(spec).is_some_and(|ranges| ranges.iter().any(|r| r.contains(&port)))
}

/// Whether two port specs share at least one port. Unparseable specs are
/// treated as overlapping, since nothing proves them disjoint.
pub fn port_specs_overlap(a: &str, b: &str) -> bool {
    match (parse_port_spec(a), parse_port_spec(b)) {
        (Some(a), Some(b)) => a
            .iter()
            .any(|x| b.iter().any(|y| x.start() <= y.end() && y.start() <= x.end())),
        _ => true,
    }
}

/// Whether every port of `inner` is also in `outer`.
pub fn port_spec_contains(outer: &str, inner: &str) -> bool {
    match (parse_port_spec(outer), parse_port_spec(inner)) {
        (Some(outer), Some(inner)) => inner.iter().all(|r| {
            outer
                .iter()
                .any(|o| o.start() <= r.start() && r.end() <= o.end())
        }),
        _ => false,
    }
}

/// Port test for one endpoint, honoring `match_opposite_ports`.
///
/// An endpoint without a port spec matches every port; inversion only
/// applies when there is a list to invert.
pub fn endpoint_includes_port(endpoint: &Endpoint, port: &str) -> bool {
    match endpoint.port.as_deref() {
        None => true,
        Some(spec) => invert_if(endpoint.match_opposite_ports, includes_port(spec, port)),
    }
}

// ── Protocols ───────────────────────────────────────────────────────

/// Whether an allow rule's protocol selector admits `target`.
///
/// With `match_opposite`, the plain coverage result is negated: an
/// inverted `tcp` rule covers everything except tcp.
pub fn allows_protocol(rule_protocol: &Protocol, match_opposite: bool, target: &Protocol) -> bool {
    invert_if(match_opposite, rule_protocol.covers(target))
}

/// Block-side twin of [`allows_protocol`]; the coverage logic is identical.
pub fn blocks_protocol(rule_protocol: &Protocol, match_opposite: bool, target: &Protocol) -> bool {
    allows_protocol(rule_protocol, match_opposite, target)
}

fn rule_covers_port_and_protocol(rule: &FirewallRule, port: &str, protocol: &Protocol) -> bool {
    endpoint_includes_port(&rule.destination, port)
        && allows_protocol(&rule.protocol, rule.match_opposite_protocol, protocol)
}

/// An allow rule that admits traffic to destination `port` over `protocol`.
pub fn rule_allows_port_and_protocol(rule: &FirewallRule, port: &str, protocol: &Protocol) -> bool {
    rule.action == RuleAction::Allow && rule_covers_port_and_protocol(rule, port, protocol)
}

/// A block rule that drops traffic to destination `port` over `protocol`.
pub fn rule_blocks_port_and_protocol(rule: &FirewallRule, port: &str, protocol: &Protocol) -> bool {
    rule.action == RuleAction::Block && rule_covers_port_and_protocol(rule, port, protocol)
}
