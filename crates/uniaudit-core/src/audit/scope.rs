// ── Scope relations ──
//
// Set-like questions over rule selectors: does this endpoint select that
// network, do two rules overlap, does one contain the other. Every
// relation honors the "match opposite" flags. When an inverted selector
// is compared against a different selector kind the answer cannot be
// proven, and overlap is assumed while containment is denied.

use std::collections::BTreeSet;
use std::net::IpAddr;

use ipnet::IpNet;

use super::AuditContext;
use crate::groups::{invert_if, port_spec_contains, port_specs_overlap};
use crate::model::{
    ConnectionStateType, Endpoint, FirewallRule, MatchTarget, NetworkInfo, NetworkPurpose,
    Protocol,
};

// ── Addresses ───────────────────────────────────────────────────────

/// Parse an address token: a CIDR or a bare host address.
pub(crate) fn parse_net(raw: &str) -> Option<IpNet> {
    let raw = raw.trim();
    raw.parse::<IpNet>()
        .ok()
        .or_else(|| raw.parse::<IpAddr>().ok().map(IpNet::from))
}

fn nets_overlap(a: &IpNet, b: &IpNet) -> bool {
    a.contains(b) || b.contains(a)
}

fn any_overlap(addrs: &[String], net: &IpNet) -> bool {
    addrs
        .iter()
        .filter_map(|a| parse_net(a))
        .any(|a| nets_overlap(&a, net))
}

fn any_contains(addrs: &[String], net: &IpNet) -> bool {
    addrs
        .iter()
        .filter_map(|a| parse_net(a))
        .any(|a| a.contains(net))
}

pub(crate) fn is_public(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            let [a, b, ..] = v4.octets();
            !(v4.is_private()
                || v4.is_loopback()
                || v4.is_link_local()
                || v4.is_unspecified()
                || v4.is_broadcast()
                || v4.is_multicast()
                || (a == 100 && (64..128).contains(&b)))
        }
        IpAddr::V6(v6) => {
            let first = v6.segments()[0];
            !(v6.is_loopback()
                || v6.is_unspecified()
                || v6.is_multicast()
                || (first & 0xfe00) == 0xfc00
                || (first & 0xffc0) == 0xfe80)
        }
    }
}

// ── Endpoint vs. network ────────────────────────────────────────────

/// How much of a network an endpoint has to select.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Reach {
    /// At least part of the network's traffic.
    Touches,
    /// All of it.
    Covers,
}

fn zone_admits(ctx: &AuditContext, endpoint: &Endpoint, network: &NetworkInfo) -> bool {
    let Some(zone) = endpoint.zone_id.as_deref() else {
        return true;
    };
    if ctx.zones.is_external(Some(zone)) || ctx.zones.is_gateway(Some(zone)) {
        return false;
    }
    match network.firewall_zone_id.as_deref() {
        Some(own) => own == zone,
        None => ctx
            .zones
            .zone_of_network(&network.id)
            .is_none_or(|z| z.id == zone),
    }
}

/// Whether `endpoint` selects traffic of `network`.
pub(crate) fn selects_network(
    ctx: &AuditContext,
    endpoint: &Endpoint,
    network: &NetworkInfo,
    reach: Reach,
) -> bool {
    if !zone_admits(ctx, endpoint, network) {
        return false;
    }
    match &endpoint.target {
        MatchTarget::Any => true,
        MatchTarget::Network {
            ids,
            match_opposite,
        } => invert_if(*match_opposite, ids.contains(&network.id)),
        MatchTarget::Ip {
            addrs,
            match_opposite,
        } => {
            let Some(subnet) = network.subnet else {
                return false;
            };
            // Inversion swaps the two questions: the complement touches the
            // subnet unless the list covers all of it, and vice versa.
            match (reach, *match_opposite) {
                (Reach::Touches, false) => any_overlap(addrs, &subnet),
                (Reach::Covers, false) => any_contains(addrs, &subnet),
                (Reach::Touches, true) => !any_contains(addrs, &subnet),
                (Reach::Covers, true) => !any_overlap(addrs, &subnet),
            }
        }
        MatchTarget::Client { .. }
        | MatchTarget::Web { .. }
        | MatchTarget::App { .. }
        | MatchTarget::AppCategory { .. }
        | MatchTarget::Unsupported { .. } => false,
    }
}

/// Whether traffic to `endpoint` can leave the site.
pub(crate) fn reaches_internet(ctx: &AuditContext, endpoint: &Endpoint) -> bool {
    match endpoint.zone_id.as_deref() {
        Some(zone) if ctx.zones.is_external(Some(zone)) => true,
        Some(_) => false,
        None => match &endpoint.target {
            MatchTarget::Any
            | MatchTarget::Web { .. }
            | MatchTarget::App { .. }
            | MatchTarget::AppCategory { .. } => true,
            MatchTarget::Ip {
                addrs,
                match_opposite,
            } => {
                *match_opposite
                    || addrs
                        .iter()
                        .filter_map(|a| parse_net(a))
                        .any(|net| net.prefix_len() == 0 || is_public(net.network()))
            }
            MatchTarget::Network { .. }
            | MatchTarget::Client { .. }
            | MatchTarget::Unsupported { .. } => false,
        },
    }
}

/// Purpose of the network an endpoint points at, when that is a single
/// known network (or an address inside one).
pub(crate) fn endpoint_purpose(ctx: &AuditContext, endpoint: &Endpoint) -> Option<NetworkPurpose> {
    match &endpoint.target {
        MatchTarget::Network {
            ids,
            match_opposite: false,
        } => ids.first().and_then(|id| ctx.network(id)).map(|n| n.purpose),
        MatchTarget::Ip {
            addrs,
            match_opposite: false,
        } => addrs
            .iter()
            .filter_map(|a| parse_net(a))
            .find_map(|net| ctx.network_containing(net.network()))
            .map(|n| n.purpose),
        _ => None,
    }
}

// ── Domains ─────────────────────────────────────────────────────────

/// Whether a rule domain covers `host`: exact match or a parent domain.
/// A leading `*.` on the rule domain is ignored.
pub(crate) fn domain_covers(rule_domain: &str, host: &str) -> bool {
    let domain = rule_domain.trim().trim_start_matches("*.").to_ascii_lowercase();
    let host = host.to_ascii_lowercase();
    !domain.is_empty() && (host == domain || host.ends_with(&format!(".{domain}")))
}

// ── Target relations ────────────────────────────────────────────────

fn subset<T: PartialEq>(inner: &[T], outer: &[T]) -> bool {
    inner.iter().all(|x| outer.contains(x))
}

fn intersects<T: PartialEq>(a: &[T], b: &[T]) -> bool {
    a.iter().any(|x| b.contains(x))
}

fn macs_subset(inner: &[String], outer: &[String]) -> bool {
    inner
        .iter()
        .all(|m| outer.iter().any(|o| o.eq_ignore_ascii_case(m)))
}

fn subnets_of<'a>(ctx: &'a AuditContext, ids: &'a [String]) -> impl Iterator<Item = Option<IpNet>> + 'a {
    ids.iter().map(|id| ctx.network(id).and_then(|n| n.subnet))
}

fn target_contains(ctx: &AuditContext, outer: &MatchTarget, inner: &MatchTarget) -> bool {
    use MatchTarget as T;
    match (outer, inner) {
        (T::Any, _) => true,
        (_, T::Any) => false,
        (
            T::Network {
                ids: o,
                match_opposite: om,
            },
            T::Network {
                ids: i,
                match_opposite: im,
            },
        ) => match (om, im) {
            (false, false) => subset(i, o),
            (true, false) => !intersects(i, o),
            (true, true) => subset(o, i),
            (false, true) => false,
        },
        (
            T::Ip {
                addrs: o,
                match_opposite: om,
            },
            T::Ip {
                addrs: i,
                match_opposite: im,
            },
        ) => {
            let inner_nets: Vec<IpNet> = i.iter().filter_map(|a| parse_net(a)).collect();
            if inner_nets.len() != i.len() {
                return false;
            }
            match (om, im) {
                (false, false) => inner_nets.iter().all(|n| any_contains(o, n)),
                (true, false) => !inner_nets.iter().any(|n| any_overlap(o, n)),
                (true, true) => o
                    .iter()
                    .filter_map(|a| parse_net(a))
                    .all(|n| any_contains(i, &n)),
                (false, true) => false,
            }
        }
        (
            T::Ip {
                addrs,
                match_opposite: false,
            },
            T::Network {
                ids,
                match_opposite: false,
            },
        ) => subnets_of(ctx, ids).all(|s| s.is_some_and(|s| any_contains(addrs, &s))),
        (
            T::Network {
                ids,
                match_opposite: false,
            },
            T::Ip {
                addrs,
                match_opposite: false,
            },
        ) => addrs.iter().all(|a| {
            parse_net(a).is_some_and(|a| {
                subnets_of(ctx, ids).any(|s| s.is_some_and(|s| s.contains(&a)))
            })
        }),
        (T::Client { macs: o }, T::Client { macs: i }) => macs_subset(i, o),
        (T::Web { domains: o }, T::Web { domains: i }) => {
            i.iter().all(|h| o.iter().any(|d| domain_covers(d, h)))
        }
        (T::App { ids: o }, T::App { ids: i })
        | (T::AppCategory { ids: o }, T::AppCategory { ids: i }) => subset(i, o),
        _ => false,
    }
}

fn target_overlaps(ctx: &AuditContext, a: &MatchTarget, b: &MatchTarget) -> bool {
    use MatchTarget as T;
    match (a, b) {
        (T::Unsupported { .. }, _) | (_, T::Unsupported { .. }) => false,
        (T::Any, _) | (_, T::Any) => true,
        (
            T::Network {
                ids: x,
                match_opposite: xm,
            },
            T::Network {
                ids: y,
                match_opposite: ym,
            },
        ) => match (xm, ym) {
            (false, false) => intersects(x, y),
            (true, false) => !subset(y, x),
            (false, true) => !subset(x, y),
            (true, true) => true,
        },
        (
            T::Ip {
                addrs: x,
                match_opposite: xm,
            },
            T::Ip {
                addrs: y,
                match_opposite: ym,
            },
        ) => match (xm, ym) {
            (false, false) => x
                .iter()
                .filter_map(|a| parse_net(a))
                .any(|n| any_overlap(y, &n)),
            (true, false) => !y
                .iter()
                .filter_map(|a| parse_net(a))
                .all(|n| any_contains(x, &n)),
            (false, true) => !x
                .iter()
                .filter_map(|a| parse_net(a))
                .all(|n| any_contains(y, &n)),
            (true, true) => true,
        },
        (
            T::Network {
                ids,
                match_opposite: false,
            },
            T::Ip {
                addrs,
                match_opposite: false,
            },
        )
        | (
            T::Ip {
                addrs,
                match_opposite: false,
            },
            T::Network {
                ids,
                match_opposite: false,
            },
        ) => subnets_of(ctx, ids).any(|s| s.is_some_and(|s| any_overlap(addrs, &s))),
        (T::Network { .. } | T::Ip { .. }, T::Network { .. } | T::Ip { .. }) => true,
        (T::Client { macs: x }, T::Client { macs: y }) => {
            x.iter().any(|m| y.iter().any(|o| o.eq_ignore_ascii_case(m)))
        }
        (T::Web { domains: x }, T::Web { domains: y }) => x
            .iter()
            .any(|d| y.iter().any(|e| domain_covers(d, e) || domain_covers(e, d))),
        (T::App { ids: x }, T::App { ids: y })
        | (T::AppCategory { ids: x }, T::AppCategory { ids: y }) => intersects(x, y),
        _ => false,
    }
}

// ── Ports, zones, protocols, states ─────────────────────────────────

fn ports_contain(outer: &Endpoint, inner: &Endpoint) -> bool {
    match (outer.port.as_deref(), inner.port.as_deref()) {
        (None, _) => true,
        (Some(_), None) => false,
        (Some(o), Some(i)) => match (outer.match_opposite_ports, inner.match_opposite_ports) {
            (false, false) => port_spec_contains(o, i),
            (true, false) => !port_specs_overlap(o, i),
            (true, true) => port_spec_contains(i, o),
            (false, true) => false,
        },
    }
}

fn ports_overlap(a: &Endpoint, b: &Endpoint) -> bool {
    match (a.port.as_deref(), b.port.as_deref()) {
        (None, _) | (_, None) => true,
        (Some(x), Some(y)) => match (a.match_opposite_ports, b.match_opposite_ports) {
            (false, false) => port_specs_overlap(x, y),
            (true, false) => !port_spec_contains(x, y),
            (false, true) => !port_spec_contains(y, x),
            (true, true) => true,
        },
    }
}

fn zones_contain(outer: &Endpoint, inner: &Endpoint) -> bool {
    match (&outer.zone_id, &inner.zone_id) {
        (None, _) => true,
        (Some(o), Some(i)) => o == i,
        (Some(_), None) => false,
    }
}

fn zones_overlap(a: &Endpoint, b: &Endpoint) -> bool {
    match (&a.zone_id, &b.zone_id) {
        (Some(x), Some(y)) => x == y,
        _ => true,
    }
}

pub(crate) fn endpoint_contains(ctx: &AuditContext, outer: &Endpoint, inner: &Endpoint) -> bool {
    zones_contain(outer, inner)
        && ports_contain(outer, inner)
        && target_contains(ctx, &outer.target, &inner.target)
}

pub(crate) fn endpoints_overlap(ctx: &AuditContext, a: &Endpoint, b: &Endpoint) -> bool {
    zones_overlap(a, b) && ports_overlap(a, b) && target_overlaps(ctx, &a.target, &b.target)
}

fn protocols_overlap(a: &Protocol, a_inv: bool, b: &Protocol, b_inv: bool) -> bool {
    match (a_inv, b_inv) {
        (false, false) => a.covers(b) || b.covers(a),
        (true, false) => !a.covers(b),
        (false, true) => !b.covers(a),
        (true, true) => !a.is_all() && !b.is_all(),
    }
}

fn protocol_contains(outer: &Protocol, outer_inv: bool, inner: &Protocol, inner_inv: bool) -> bool {
    match (outer_inv, inner_inv) {
        (false, false) => outer.covers(inner),
        (true, false) => !protocols_overlap(outer, false, inner, false),
        (false, true) => outer.is_all(),
        (true, true) => inner.covers(outer),
    }
}

fn state_set(rule: &FirewallRule) -> BTreeSet<&str> {
    match rule.connection_state_type {
        ConnectionStateType::All => ["NEW", "ESTABLISHED", "RELATED", "INVALID"].into(),
        ConnectionStateType::RespondOnly => ["ESTABLISHED", "RELATED"].into(),
        ConnectionStateType::Custom => rule.connection_states.iter().map(String::as_str).collect(),
    }
}

// ── Whole rules ─────────────────────────────────────────────────────

/// Whether every flow `inner` matches is also matched by `outer`.
pub(crate) fn rule_contains(ctx: &AuditContext, outer: &FirewallRule, inner: &FirewallRule) -> bool {
    protocol_contains(
        &outer.protocol,
        outer.match_opposite_protocol,
        &inner.protocol,
        inner.match_opposite_protocol,
    ) && state_set(inner).is_subset(&state_set(outer))
        && endpoint_contains(ctx, &outer.source, &inner.source)
        && endpoint_contains(ctx, &outer.destination, &inner.destination)
}

/// Whether some flow could be matched by both rules.
pub(crate) fn rules_overlap(ctx: &AuditContext, a: &FirewallRule, b: &FirewallRule) -> bool {
    protocols_overlap(
        &a.protocol,
        a.match_opposite_protocol,
        &b.protocol,
        b.match_opposite_protocol,
    ) && !state_set(a).is_disjoint(&state_set(b))
        && endpoints_overlap(ctx, &a.source, &b.source)
        && endpoints_overlap(ctx, &a.destination, &b.destination)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FirewallZone, RuleAction, ZoneTable};

    fn net(id: &str, cidr: &str, zone: Option<&str>) -> NetworkInfo {
        let mut n = NetworkInfo::new(id, id, 10);
        n.subnet = cidr.parse().ok();
        n.firewall_zone_id = zone.map(str::to_owned);
        n
    }

    fn ctx() -> AuditContext {
        AuditContext::new(
            Vec::new(),
            vec![
                net("lan", "192.168.1.0/24", Some("z-int")),
                net("iot", "192.168.40.0/24", Some("z-int")),
            ],
        )
        .with_zones(ZoneTable::new(vec![
            FirewallZone {
                id: "z-int".into(),
                name: "Internal".into(),
                zone_key: Some("internal".into()),
                network_ids: vec!["lan".into(), "iot".into()],
            },
            FirewallZone {
                id: "z-ext".into(),
                name: "External".into(),
                zone_key: Some("external".into()),
                network_ids: vec![],
            },
        ]))
    }

    fn ip(addrs: &[&str], inverted: bool) -> Endpoint {
        Endpoint {
            target: MatchTarget::Ip {
                addrs: addrs.iter().map(|a| (*a).to_owned()).collect(),
                match_opposite: inverted,
            },
            ..Endpoint::default()
        }
    }

    fn network(ids: &[&str], inverted: bool) -> Endpoint {
        Endpoint {
            target: MatchTarget::Network {
                ids: ids.iter().map(|a| (*a).to_owned()).collect(),
                match_opposite: inverted,
            },
            ..Endpoint::default()
        }
    }

    #[test]
    fn rfc1918_touches_every_lan() {
        let ctx = ctx();
        let private = ip(&["10.0.0.0/8", "172.16.0.0/12", "192.168.0.0/16"], false);
        for n in &ctx.networks {
            assert!(selects_network(&ctx, &private, n, Reach::Touches));
            assert!(selects_network(&ctx, &private, n, Reach::Covers));
        }
    }

    #[test]
    fn inversion_swaps_reach() {
        let ctx = ctx();
        let lan = &ctx.networks[0];
        let not_lan = network(&["lan"], true);
        assert!(!selects_network(&ctx, &not_lan, lan, Reach::Touches));
        let not_host = ip(&["192.168.1.5"], true);
        assert!(selects_network(&ctx, &not_host, lan, Reach::Touches));
        assert!(!selects_network(&ctx, &not_host, lan, Reach::Covers));
    }

    #[test]
    fn zones_gate_selection() {
        let ctx = ctx();
        let lan = &ctx.networks[0];
        let external_any = Endpoint {
            zone_id: Some("z-ext".into()),
            ..Endpoint::default()
        };
        assert!(!selects_network(&ctx, &external_any, lan, Reach::Touches));
        assert!(reaches_internet(&ctx, &external_any));

        let internal_any = Endpoint {
            zone_id: Some("z-int".into()),
            ..Endpoint::default()
        };
        assert!(selects_network(&ctx, &internal_any, lan, Reach::Covers));
        assert!(!reaches_internet(&ctx, &internal_any));
    }

    #[test]
    fn public_addresses_reach_internet() {
        let ctx = ctx();
        assert!(reaches_internet(&ctx, &ip(&["8.8.8.8"], false)));
        assert!(!reaches_internet(&ctx, &ip(&["192.168.1.1"], false)));
        assert!(!reaches_internet(&ctx, &network(&["lan"], false)));
    }

    #[test]
    fn domains() {
        assert!(domain_covers("ui.com", "unifi.ui.com"));
        assert!(domain_covers("*.ui.com", "afc.ui.com"));
        assert!(domain_covers("UI.com", "ui.com"));
        assert!(!domain_covers("ui.com", "notui.com"));
        assert!(!domain_covers("unifi.ui.com", "ui.com"));
    }

    #[test]
    fn rule_containment_and_overlap() {
        let ctx = ctx();
        let mut broad = FirewallRule::new("b", "Block IoT", RuleAction::Block);
        broad.source = network(&["iot"], false);

        let mut narrow = FirewallRule::new("a", "Allow IoT to printer", RuleAction::Allow);
        narrow.source = network(&["iot"], false);
        narrow.destination = ip(&["192.168.1.20"], false);
        narrow.protocol = Protocol::Tcp;
        narrow.destination.port = Some("631".into());

        assert!(rule_contains(&ctx, &broad, &narrow));
        assert!(!rule_contains(&ctx, &narrow, &broad));
        assert!(rules_overlap(&ctx, &broad, &narrow));

        let mut other = narrow.clone();
        other.source = network(&["lan"], false);
        assert!(!rules_overlap(&ctx, &broad, &other));
    }

    #[test]
    fn network_and_cidr_relations() {
        let ctx = ctx();
        let lan_cidr = ip(&["192.168.1.0/24"], false);
        let lan = network(&["lan"], false);
        assert!(endpoint_contains(&ctx, &lan_cidr, &lan));
        assert!(endpoint_contains(&ctx, &lan, &lan_cidr));
        assert!(endpoints_overlap(&ctx, &lan, &ip(&["192.168.1.7"], false)));
        assert!(!endpoints_overlap(&ctx, &lan, &ip(&["192.168.40.7"], false)));
    }

    #[test]
    fn respond_only_does_not_overlap_new_only() {
        let ctx = ctx();
        let mut a = FirewallRule::new("a", "est", RuleAction::Allow);
        a.connection_state_type = ConnectionStateType::RespondOnly;
        let mut b = FirewallRule::new("b", "new", RuleAction::Block);
        b.connection_state_type = ConnectionStateType::Custom;
        b.connection_states = BTreeSet::from(["NEW".to_owned()]);
        assert!(!rules_overlap(&ctx, &a, &b));
    }
}
