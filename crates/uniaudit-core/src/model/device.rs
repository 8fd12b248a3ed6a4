// ── Device and exposure types ──

use std::net::IpAddr;

use serde::{Deserialize, Serialize};

/// Hardware role, inferred from the controller's `type` and `model` fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviceKind {
    Gateway,
    Switch,
    AccessPoint,
    Bridge,
    Cellular,
    Other,
}

impl DeviceKind {
    /// Infrastructure that belongs on the management VLAN. Gateways own
    /// every VLAN, so they are not included.
    pub fn is_managed_infrastructure(self) -> bool {
        matches!(self, Self::Switch | Self::AccessPoint | Self::Bridge)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub id: String,
    pub mac: String,
    pub name: String,
    pub model: Option<String>,
    pub kind: DeviceKind,
    pub ip: Option<IpAddr>,
}

/// One static port-forward (DNAT) entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortForward {
    pub id: String,
    pub name: String,
    pub enabled: bool,
    pub forward_ip: Option<IpAddr>,
    pub forward_port: Option<String>,
    pub destination_port: Option<String>,
    pub protocol: String,
    /// Allowed source (`None` when unrestricted).
    pub source: Option<String>,
}

impl PortForward {
    pub fn is_source_restricted(&self) -> bool {
        self.source.is_some()
    }
}
