// ── Firewall domain types ──
//
// Schema-independent representation of a firewall rule. Both the legacy
// flat-field rules and the zone-based v2 policies parse into `FirewallRule`;
// nothing downstream knows which dialect a rule came from.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

// ── Action ──────────────────────────────────────────────────────────

/// Normalized rule action.
///
/// `Block` folds together every dropping verb the controller uses
/// (`drop`, `block`, `reject`, `deny`). Anything unrecognized becomes
/// `Unknown`, which neither allows nor blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RuleAction {
    Allow,
    Block,
    Unknown,
}

impl RuleAction {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "allow" | "accept" => Self::Allow,
            "drop" | "block" | "reject" | "deny" => Self::Block,
            _ => Self::Unknown,
        }
    }

    /// The opposite action, used by eclipse scanning. `Unknown` has none.
    pub fn opposite(self) -> Option<Self> {
        match self {
            Self::Allow => Some(Self::Block),
            Self::Block => Some(Self::Allow),
            Self::Unknown => None,
        }
    }
}

impl fmt::Display for RuleAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Allow => "allow",
            Self::Block => "block",
            Self::Unknown => "unknown",
        })
    }
}

// ── Protocol ────────────────────────────────────────────────────────

/// IP protocol selector. Open-ended: unknown names are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Protocol {
    #[default]
    All,
    Tcp,
    Udp,
    TcpUdp,
    Icmp,
    Icmpv6,
    Other(String),
}

impl Protocol {
    pub fn parse(raw: &str) -> Self {
        let lower = raw.trim().to_ascii_lowercase();
        match lower.as_str() {
            "" | "all" | "any" => Self::All,
            "tcp" => Self::Tcp,
            "udp" => Self::Udp,
            "tcp_udp" | "tcp-udp" | "tcp/udp" => Self::TcpUdp,
            "icmp" => Self::Icmp,
            "icmpv6" | "ipv6-icmp" => Self::Icmpv6,
            _ => Self::Other(lower),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::All => "all",
            Self::Tcp => "tcp",
            Self::Udp => "udp",
            Self::TcpUdp => "tcp_udp",
            Self::Icmp => "icmp",
            Self::Icmpv6 => "icmpv6",
            Self::Other(s) => s,
        }
    }

    /// Coverage test without inversion: `all` covers anything, `tcp_udp`
    /// covers either transport, everything else needs an exact match.
    pub fn covers(&self, target: &Protocol) -> bool {
        match self {
            Self::All => true,
            Self::TcpUdp => matches!(target, Self::Tcp | Self::Udp | Self::TcpUdp),
            other => other == target,
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }
}

impl From<String> for Protocol {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl From<Protocol> for String {
    fn from(p: Protocol) -> Self {
        p.as_str().to_owned()
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Connection state ────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConnectionStateType {
    #[default]
    All,
    RespondOnly,
    Custom,
}

impl ConnectionStateType {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "ALL" => Some(Self::All),
            "RESPOND_ONLY" => Some(Self::RespondOnly),
            "CUSTOM" => Some(Self::Custom),
            _ => None,
        }
    }
}

// ── Match target ────────────────────────────────────────────────────

/// What a source or destination selects.
///
/// Each variant carries exactly the data that kind of selector needs, so
/// "which list is set" is never guessed at. `Unsupported` keeps selectors
/// this model does not understand (regions, VPN tunnels, ...); they match
/// nothing, which makes them inert in every check.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MatchTarget {
    #[default]
    Any,
    Network {
        ids: Vec<String>,
        match_opposite: bool,
    },
    Ip {
        addrs: Vec<String>,
        match_opposite: bool,
    },
    Client {
        macs: Vec<String>,
    },
    Web {
        domains: Vec<String>,
    },
    App {
        ids: Vec<i64>,
    },
    AppCategory {
        ids: Vec<i64>,
    },
    Unsupported {
        raw: String,
    },
}

impl MatchTarget {
    /// Short label used in tables and issue metadata.
    pub fn label(&self) -> &str {
        match self {
            Self::Any => "ANY",
            Self::Network { .. } => "NETWORK",
            Self::Ip { .. } => "IP",
            Self::Client { .. } => "CLIENT",
            Self::Web { .. } => "WEB",
            Self::App { .. } => "APP",
            Self::AppCategory { .. } => "APP_CATEGORY",
            Self::Unsupported { raw } => raw,
        }
    }
}

/// One side (source or destination) of a rule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    pub target: MatchTarget,
    pub zone_id: Option<String>,
    /// Port spec after group resolution: `"443"`, `"8000-8080"`, `"22,80,443"`.
    /// `None` means any port, or a port group that could not be resolved.
    pub port: Option<String>,
    pub match_opposite_ports: bool,
}

impl Endpoint {
    pub fn any() -> Self {
        Self::default()
    }

    pub fn is_any(&self) -> bool {
        matches!(self.target, MatchTarget::Any)
    }

    pub fn network_ids(&self) -> &[String] {
        match &self.target {
            MatchTarget::Network { ids, .. } => ids,
            _ => &[],
        }
    }

    pub fn ips(&self) -> &[String] {
        match &self.target {
            MatchTarget::Ip { addrs, .. } => addrs,
            _ => &[],
        }
    }

    pub fn web_domains(&self) -> &[String] {
        match &self.target {
            MatchTarget::Web { domains } => domains,
            _ => &[],
        }
    }

    pub fn summary(&self) -> String {
        let mut parts = Vec::new();
        let target = match &self.target {
            MatchTarget::Any => "any".to_owned(),
            MatchTarget::Network { ids, match_opposite } => {
                format!("{}net:{}", negation(*match_opposite), ids.join(","))
            }
            MatchTarget::Ip {
                addrs,
                match_opposite,
            } => format!("{}ip:{}", negation(*match_opposite), addrs.join(",")),
            MatchTarget::Client { macs } => format!("mac:{}", macs.join(",")),
            MatchTarget::Web { domains } => format!("web:{}", domains.join(",")),
            MatchTarget::App { ids } => format!("app:{}", join_ids(ids)),
            MatchTarget::AppCategory { ids } => format!("app-cat:{}", join_ids(ids)),
            MatchTarget::Unsupported { raw } => format!("({raw})"),
        };
        parts.push(target);
        if let Some(ref zone) = self.zone_id {
            parts.push(format!("zone:{zone}"));
        }
        if let Some(ref port) = self.port {
            parts.push(format!("{}port:{port}", negation(self.match_opposite_ports)));
        }
        parts.join(" ")
    }
}

fn negation(flag: bool) -> &'static str {
    if flag { "!" } else { "" }
}

fn join_ids(ids: &[i64]) -> String {
    ids.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

// ── Rule ────────────────────────────────────────────────────────────

/// The canonical firewall rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FirewallRule {
    pub id: String,
    pub name: String,
    pub action: RuleAction,
    pub enabled: bool,
    /// System-generated rule (zone defaults, "Isolated Networks", ...).
    pub predefined: bool,
    pub index: i64,

    pub protocol: Protocol,
    pub match_opposite_protocol: bool,

    pub connection_state_type: ConnectionStateType,
    /// Upper-cased state names, only meaningful for `Custom`.
    pub connection_states: BTreeSet<String>,

    pub source: Endpoint,
    pub destination: Endpoint,

    /// Legacy ruleset (`LAN_IN`, `WAN_OUT`, ...). Absent for v2 policies.
    pub ruleset: Option<String>,
    pub hit_count: Option<u64>,
}

impl FirewallRule {
    /// A minimal enabled rule matching everything. Handy as a base for
    /// struct-update syntax.
    pub fn new(id: impl Into<String>, name: impl Into<String>, action: RuleAction) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            action,
            enabled: true,
            predefined: false,
            index: 0,
            protocol: Protocol::All,
            match_opposite_protocol: false,
            connection_state_type: ConnectionStateType::All,
            connection_states: BTreeSet::new(),
            source: Endpoint::any(),
            destination: Endpoint::any(),
            ruleset: None,
            hit_count: None,
        }
    }

    pub fn is_allow(&self) -> bool {
        self.action == RuleAction::Allow
    }

    pub fn is_block(&self) -> bool {
        self.action == RuleAction::Block
    }

    /// Enabled and user-authored.
    pub fn is_user_rule(&self) -> bool {
        self.enabled && !self.predefined
    }

    /// Whether the controller reported any traffic hitting this rule.
    pub fn has_been_hit(&self) -> bool {
        self.hit_count.is_some_and(|n| n > 0)
    }

    fn matches_new_state(&self) -> bool {
        match self.connection_state_type {
            ConnectionStateType::All => true,
            ConnectionStateType::RespondOnly => false,
            ConnectionStateType::Custom => self.connection_states.contains("NEW"),
        }
    }

    /// Whether this rule's action applies to freshly initiated connections.
    ///
    /// False for respond-only rules and for custom state sets without
    /// `NEW` (an `INVALID`-only drop rule, for instance).
    pub fn blocks_new_connections(&self) -> bool {
        self.is_block() && self.matches_new_state()
    }

    /// Allow-side counterpart of [`blocks_new_connections`](Self::blocks_new_connections).
    pub fn allows_new_connections(&self) -> bool {
        self.is_allow() && self.matches_new_state()
    }

    pub fn referenced_network_ids(&self) -> impl Iterator<Item = &String> {
        self.source
            .network_ids()
            .iter()
            .chain(self.destination.network_ids())
    }

    pub fn protocol_summary(&self) -> String {
        format!(
            "{}{}",
            negation(self.match_opposite_protocol),
            self.protocol
        )
    }
}

// ── Zones ───────────────────────────────────────────────────────────

/// Firewall zone: a named grouping of networks that policies run between.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FirewallZone {
    pub id: String,
    pub name: String,
    /// Controller key (`internal`, `external`, `gateway`, `vpn`, ...).
    pub zone_key: Option<String>,
    pub network_ids: Vec<String>,
}

impl FirewallZone {
    fn is_kind(&self, key: &str) -> bool {
        match self.zone_key.as_deref() {
            Some(k) => k.eq_ignore_ascii_case(key),
            None => self.name.eq_ignore_ascii_case(key),
        }
    }

    pub fn is_external(&self) -> bool {
        self.is_kind("external")
    }

    pub fn is_gateway(&self) -> bool {
        self.is_kind("gateway")
    }
}

/// Lookup table over the site's zones.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ZoneTable {
    zones: Vec<FirewallZone>,
}

impl ZoneTable {
    pub fn new(zones: Vec<FirewallZone>) -> Self {
        Self { zones }
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FirewallZone> {
        self.zones.iter()
    }

    pub fn get(&self, id: &str) -> Option<&FirewallZone> {
        self.zones.iter().find(|z| z.id == id)
    }

    pub fn is_external(&self, zone_id: Option<&str>) -> bool {
        zone_id
            .and_then(|id| self.get(id))
            .is_some_and(FirewallZone::is_external)
    }

    pub fn is_gateway(&self, zone_id: Option<&str>) -> bool {
        zone_id
            .and_then(|id| self.get(id))
            .is_some_and(FirewallZone::is_gateway)
    }

    /// The zone a network belongs to according to the zone export.
    pub fn zone_of_network(&self, network_id: &str) -> Option<&FirewallZone> {
        self.zones
            .iter()
            .find(|z| z.network_ids.iter().any(|n| n == network_id))
    }
}
