// ── Network domain types ──

use std::net::IpAddr;

use ipnet::IpNet;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Inferred role of a network. Always set; `Unknown` is a valid result.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[strum(ascii_case_insensitive)]
pub enum NetworkPurpose {
    Home,
    Guest,
    #[strum(serialize = "IoT")]
    #[serde(rename = "IoT")]
    IoT,
    Security,
    Management,
    Corporate,
    Server,
    Unknown,
}

impl NetworkPurpose {
    /// Purposes that hold trusted, general-use clients.
    pub fn is_trusted(self) -> bool {
        matches!(self, Self::Home | Self::Corporate | Self::Server)
    }

    /// Purposes whose networks are expected to sit behind isolation.
    pub fn is_sensitive(self) -> bool {
        matches!(self, Self::Management | Self::Security)
    }
}

/// The canonical network (VLAN) record used by every check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkInfo {
    pub id: String,
    pub name: String,
    pub vlan_id: u16,
    pub purpose: NetworkPurpose,
    /// Controller's own purpose string (`corporate`, `guest`, `vlan-only`).
    pub raw_purpose: Option<String>,

    pub subnet: Option<IpNet>,
    pub gateway: Option<IpAddr>,

    pub dhcp_enabled: bool,
    pub dhcp_dns_servers: Vec<IpAddr>,

    pub network_isolation_enabled: bool,
    pub internet_access_enabled: bool,

    pub firewall_zone_id: Option<String>,
    pub network_group: Option<String>,
    /// Routed by a layer-3 switch rather than the gateway.
    pub switch_routed: bool,
}

impl NetworkInfo {
    pub fn new(id: impl Into<String>, name: impl Into<String>, vlan_id: u16) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            vlan_id,
            purpose: NetworkPurpose::Unknown,
            raw_purpose: None,
            subnet: None,
            gateway: None,
            dhcp_enabled: false,
            dhcp_dns_servers: Vec::new(),
            network_isolation_enabled: false,
            internet_access_enabled: true,
            firewall_zone_id: None,
            network_group: None,
            switch_routed: false,
        }
    }

    /// VLAN 1 is the untagged native VLAN.
    pub fn is_native_vlan(&self) -> bool {
        self.vlan_id == 1
    }

    pub fn contains_ip(&self, ip: IpAddr) -> bool {
        self.subnet.is_some_and(|net| net.contains(&ip))
    }
}
