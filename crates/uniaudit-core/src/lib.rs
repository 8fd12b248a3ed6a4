//! Firewall and VLAN security audit engine for UniFi gateways.
//!
//! The crate works on controller JSON that has already been fetched; it
//! never talks to a controller itself. The pipeline is:
//!
//! - **[`parse`]** decodes devices, networks, firewall groups, zones and
//!   port forwards into the [`model`] types. Both rule dialects are
//!   accepted: legacy `src_*`/`dst_*` rules and zone-based policies with
//!   nested `source`/`destination` objects.
//!
//! - **[`groups`]** resolves address and port groups and answers the port
//!   and protocol questions every check asks.
//!
//! - **[`evaluate`]** applies first-match-wins semantics to find the rule
//!   that decides some traffic and any opposite-action rule it eclipses.
//!
//! - **[`classify`]** infers each network's [`NetworkPurpose`] from its name
//!   and configuration.
//!
//! - **[`audit`]** runs the check registry over an [`AuditContext`] and
//!   returns [`Issue`]s; [`AuditReport`] turns them into a score.

pub mod audit;
pub mod classify;
pub mod error;
pub mod evaluate;
pub mod groups;
pub mod model;
pub mod parse;
pub mod report;
pub mod settings;

// ── Primary re-exports ──────────────────────────────────────────────
pub use audit::{
    AuditContext, ManagementRequirement, SiteExport, TrafficFilter, requirements_met, run_audit,
    run_check,
};
pub use classify::{NetworkSignals, classify_by_name, classify_network};
pub use error::CoreError;
pub use evaluate::{EvaluationResult, evaluate};
pub use groups::{FirewallGroup, GroupTable, GroupType};
pub use report::AuditReport;
pub use settings::{AuditSettings, CheckKind, parse_severity};

pub use model::{
    ConnectionStateType, DeviceInfo, DeviceKind, Endpoint, FirewallRule, FirewallZone, Issue,
    IssueType, MatchTarget, NetworkInfo, NetworkPurpose, PortForward, Protocol, RuleAction,
    Severity, ZoneTable,
};
