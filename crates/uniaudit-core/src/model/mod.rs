// ── Unified domain model ──
//
// Every type in this module is created once per audit run from already
// fetched controller JSON and is read-only afterwards.

pub mod device;
pub mod firewall;
pub mod issue;
pub mod network;

// ── Re-exports ──────────────────────────────────────────────────────

pub use device::{DeviceInfo, DeviceKind, PortForward};
pub use firewall::{
    ConnectionStateType, Endpoint, FirewallRule, FirewallZone, MatchTarget, Protocol, RuleAction,
    ZoneTable,
};
pub use issue::{Issue, IssueType, Severity};
pub use network::{NetworkInfo, NetworkPurpose};
