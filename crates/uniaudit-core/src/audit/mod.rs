// ── Firewall audit engine ──
//
// Each check is a pure function `fn(&AuditContext) -> Vec<Issue>`. The
// registry below fixes their order so merged output is deterministic.

mod exceptions;
mod exposure;
mod infrastructure;
mod internet;
mod isolation;
mod management;
mod network_config;
mod permissive;
pub(crate) mod scope;
mod shadowing;

use std::net::IpAddr;

use serde_json::Value;
use tracing::{debug, info};

use crate::evaluate::{EvaluationResult, evaluate};
use crate::groups::{GroupTable, allows_protocol, endpoint_includes_port};
use crate::model::{
    DeviceInfo, FirewallRule, Issue, NetworkInfo, NetworkPurpose, PortForward, Protocol, ZoneTable,
};
use crate::parse;
use crate::settings::{AuditSettings, CheckKind};

use self::scope::{Reach, reaches_internet, selects_network};

pub use self::management::{ManagementRequirement, requirements_met};

/// Everything the checks look at, parsed once per run.
#[derive(Debug, Clone, Default)]
pub struct AuditContext {
    pub rules: Vec<FirewallRule>,
    pub networks: Vec<NetworkInfo>,
    pub zones: ZoneTable,
    pub devices: Vec<DeviceInfo>,
    pub port_forwards: Vec<PortForward>,
    pub upnp_enabled: bool,
}

/// Optional protocol and destination-port narrowing for [`AuditContext::trace_traffic`].
#[derive(Debug, Clone, Default)]
pub struct TrafficFilter {
    pub protocol: Option<Protocol>,
    pub port: Option<String>,
}

impl TrafficFilter {
    fn admits(&self, rule: &FirewallRule) -> bool {
        let protocol_ok = self.protocol.as_ref().is_none_or(|p| {
            allows_protocol(&rule.protocol, rule.match_opposite_protocol, p)
        });
        let port_ok = self
            .port
            .as_deref()
            .is_none_or(|port| endpoint_includes_port(&rule.destination, port));
        protocol_ok && port_ok
    }
}

/// Raw controller documents for one site. Only `devices` is required.
#[derive(Debug, Clone, Copy)]
pub struct SiteExport<'a> {
    pub devices: &'a Value,
    pub networks: Option<&'a Value>,
    pub groups: Option<&'a Value>,
    pub zones: Option<&'a Value>,
    pub port_forwards: Option<&'a Value>,
    pub settings: Option<&'a Value>,
}

impl<'a> SiteExport<'a> {
    pub fn new(devices: &'a Value) -> Self {
        Self {
            devices,
            networks: None,
            groups: None,
            zones: None,
            port_forwards: None,
            settings: None,
        }
    }
}

impl AuditContext {
    pub fn new(rules: Vec<FirewallRule>, networks: Vec<NetworkInfo>) -> Self {
        Self {
            rules,
            networks,
            ..Self::default()
        }
    }

    /// Parse every supplied document. Networks and zones fall back to the
    /// copies embedded in the devices payload.
    pub fn from_export(export: &SiteExport<'_>) -> Self {
        let groups = GroupTable::new(export.groups.map(parse::parse_groups).unwrap_or_default());
        if !groups.is_empty() {
            debug!(groups = groups.len(), "loaded firewall groups");
        }
        let networks = parse::parse_networks(export.networks.unwrap_or(export.devices));
        let zones = parse::parse_zones(export.zones.unwrap_or(export.devices));
        Self {
            rules: parse::parse_firewall_rules(export.devices, &groups),
            networks,
            zones: ZoneTable::new(zones),
            devices: parse::parse_devices(export.devices),
            port_forwards: export
                .port_forwards
                .map(parse::parse_port_forwards)
                .unwrap_or_default(),
            upnp_enabled: export.settings.is_some_and(parse::parse_upnp_enabled),
        }
    }

    pub fn with_zones(mut self, zones: ZoneTable) -> Self {
        self.zones = zones;
        self
    }

    pub fn with_devices(mut self, devices: Vec<DeviceInfo>) -> Self {
        self.devices = devices;
        self
    }

    pub fn with_port_forwards(mut self, port_forwards: Vec<PortForward>) -> Self {
        self.port_forwards = port_forwards;
        self
    }

    pub fn with_upnp(mut self, enabled: bool) -> Self {
        self.upnp_enabled = enabled;
        self
    }

    pub fn network(&self, id: &str) -> Option<&NetworkInfo> {
        self.networks.iter().find(|n| n.id == id)
    }

    /// Look a network up by id or by (case-insensitive) name.
    pub fn find_network(&self, key: &str) -> Option<&NetworkInfo> {
        self.network(key)
            .or_else(|| self.networks.iter().find(|n| n.name.eq_ignore_ascii_case(key)))
    }

    pub fn network_containing(&self, ip: IpAddr) -> Option<&NetworkInfo> {
        self.networks.iter().find(|n| n.contains_ip(ip))
    }

    pub fn has_cellular_device(&self) -> bool {
        parse::has_cellular_device(&self.devices)
    }

    pub(crate) fn user_rules(&self) -> impl Iterator<Item = &FirewallRule> {
        self.rules.iter().filter(|r| r.is_user_rule())
    }

    /// Whether clients on `network` end up without internet access: the
    /// network's own switch is off, or a blocking rule toward the internet
    /// decides its outbound traffic.
    pub fn internet_blocked(&self, network: &NetworkInfo) -> bool {
        if !network.internet_access_enabled {
            return true;
        }
        self.rules.iter().any(|r| {
            r.enabled
                && r.blocks_new_connections()
                && r.destination.is_any()
                && r.destination.port.is_none()
                && r.protocol.is_all()
                && !r.match_opposite_protocol
                && reaches_internet(self, &r.destination)
                && selects_network(self, &r.source, network, Reach::Covers)
        })
    }

    /// Evaluate traffic from one network to another, any port and protocol.
    pub fn trace<'a>(
        &'a self,
        from: &NetworkInfo,
        to: &NetworkInfo,
        for_new_connections: bool,
    ) -> EvaluationResult<'a> {
        self.trace_traffic(from, to, &TrafficFilter::default(), for_new_connections)
    }

    /// Evaluate traffic from one network to another, optionally narrowed to
    /// a protocol and a destination port.
    pub fn trace_traffic<'a>(
        &'a self,
        from: &NetworkInfo,
        to: &NetworkInfo,
        filter: &TrafficFilter,
        for_new_connections: bool,
    ) -> EvaluationResult<'a> {
        evaluate(
            &self.rules,
            |r| {
                selects_network(self, &r.source, from, Reach::Touches)
                    && selects_network(self, &r.destination, to, Reach::Touches)
                    && filter.admits(r)
            },
            for_new_connections,
        )
    }

    pub(crate) fn management_networks(&self) -> impl Iterator<Item = &NetworkInfo> {
        self.networks
            .iter()
            .filter(|n| n.purpose == NetworkPurpose::Management)
    }
}

/// Run one check family.
pub fn run_check(check: CheckKind, ctx: &AuditContext) -> Vec<Issue> {
    match check {
        CheckKind::ManagementAccess => management::check(ctx),
        CheckKind::Shadowing => shadowing::check(ctx),
        CheckKind::Permissive => permissive::check_permissive(ctx),
        CheckKind::Orphaned => permissive::check_orphaned(ctx),
        CheckKind::InterVlanIsolation => isolation::check(ctx),
        CheckKind::InternetBypass => internet::check(ctx),
        CheckKind::IsolationExceptions => exceptions::check(ctx),
        CheckKind::InfrastructurePlacement => infrastructure::check(ctx),
        CheckKind::NetworkConfiguration => network_config::check(ctx),
        CheckKind::Exposure => exposure::check(ctx),
    }
}

/// Run every enabled check in registry order and apply the severity floor.
pub fn run_audit(ctx: &AuditContext, settings: &AuditSettings) -> Vec<Issue> {
    use strum::IntoEnumIterator;

    let issues: Vec<Issue> = CheckKind::iter()
        .filter(|c| settings.is_enabled(*c))
        .flat_map(|c| run_check(c, ctx))
        .filter(|i| settings.keeps(i.severity))
        .collect();

    info!(
        rules = ctx.rules.len(),
        networks = ctx.networks.len(),
        issues = issues.len(),
        "audit complete"
    );
    issues
}
