// ── Audit findings ──

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

/// How urgently a finding should be addressed. Ordered least to most severe.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Severity {
    Informational,
    Recommended,
    Critical,
}

/// Stable issue codes. The string form is part of the output contract.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    IntoStaticStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueType {
    // Rule hygiene
    PermissiveRule,
    BroadRule,
    OrphanedRule,
    DenyShadowsAllow,
    AllowSubvertsDeny,
    AllowExceptionPattern,

    // Segmentation
    MissingIsolation,
    IsolationBypassed,
    InternetBlockBypassed,
    NetworkIsolationException,
    InfraNotOnMgmt,

    // Management access floor
    MgmtMissingUnifiAccess,
    MgmtMissingAfcAccess,
    MgmtMissingNtpAccess,
    #[serde(rename = "MGMT_MISSING_5G_ACCESS")]
    #[strum(serialize = "MGMT_MISSING_5G_ACCESS")]
    MgmtMissing5gAccess,

    // Network configuration
    SecurityNetworkNotIsolated,
    MgmtNetworkNotIsolated,
    IotNetworkNotIsolated,
    SecurityNetworkHasInternet,
    MgmtNetworkHasInternet,
    DnsSharedServers,
    MgmtDhcpEnabled,
    RoutingEnabled,

    // Exposure
    UpnpEnabled,
    PortForwardToIsolated,
    PortForwardUnrestricted,
}

impl IssueType {
    pub fn code(self) -> &'static str {
        self.into()
    }

    /// Default severity. A few checks override it per finding.
    pub fn default_severity(self) -> Severity {
        match self {
            Self::PermissiveRule
            | Self::MissingIsolation
            | Self::IsolationBypassed
            | Self::InfraNotOnMgmt
            | Self::SecurityNetworkNotIsolated
            | Self::MgmtNetworkNotIsolated
            | Self::PortForwardToIsolated => Severity::Critical,

            Self::BroadRule
            | Self::AllowSubvertsDeny
            | Self::InternetBlockBypassed
            | Self::IotNetworkNotIsolated
            | Self::SecurityNetworkHasInternet
            | Self::MgmtNetworkHasInternet
            | Self::RoutingEnabled
            | Self::UpnpEnabled
            | Self::PortForwardUnrestricted => Severity::Recommended,

            Self::OrphanedRule
            | Self::DenyShadowsAllow
            | Self::AllowExceptionPattern
            | Self::NetworkIsolationException
            | Self::MgmtMissingUnifiAccess
            | Self::MgmtMissingAfcAccess
            | Self::MgmtMissingNtpAccess
            | Self::MgmtMissing5gAccess
            | Self::DnsSharedServers
            | Self::MgmtDhcpEnabled => Severity::Informational,
        }
    }

    /// Points deducted from the security score for the default severity.
    pub fn default_score_impact(self) -> u32 {
        match self {
            Self::PermissiveRule | Self::MissingIsolation | Self::SecurityNetworkNotIsolated => 15,
            Self::IsolationBypassed
            | Self::InfraNotOnMgmt
            | Self::MgmtNetworkNotIsolated
            | Self::PortForwardToIsolated => 10,
            Self::BroadRule
            | Self::AllowSubvertsDeny
            | Self::InternetBlockBypassed
            | Self::IotNetworkNotIsolated
            | Self::SecurityNetworkHasInternet
            | Self::RoutingEnabled
            | Self::UpnpEnabled => 5,
            Self::MgmtNetworkHasInternet | Self::PortForwardUnrestricted => 3,
            Self::OrphanedRule
            | Self::DenyShadowsAllow
            | Self::AllowExceptionPattern
            | Self::NetworkIsolationException
            | Self::MgmtMissingUnifiAccess
            | Self::MgmtMissingAfcAccess
            | Self::MgmtMissingNtpAccess
            | Self::MgmtMissing5gAccess
            | Self::DnsSharedServers
            | Self::MgmtDhcpEnabled => 0,
        }
    }
}

/// One audit finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    #[serde(rename = "type")]
    pub issue_type: IssueType,
    pub severity: Severity,
    pub score_impact: u32,
    pub message: String,
    /// Short summary such as `"IoT -> Home"`. May be empty.
    pub description: String,
    pub rule_id: Option<String>,

    pub current_network: Option<String>,
    pub current_vlan: Option<u16>,
    pub recommended_network: Option<String>,
    pub recommended_vlan: Option<u16>,

    #[serde(skip_serializing_if = "BTreeMap::is_empty", default)]
    pub metadata: BTreeMap<String, String>,
}

impl Issue {
    pub fn new(issue_type: IssueType, message: impl Into<String>) -> Self {
        Self {
            issue_type,
            severity: issue_type.default_severity(),
            score_impact: issue_type.default_score_impact(),
            message: message.into(),
            description: String::new(),
            rule_id: None,
            current_network: None,
            current_vlan: None,
            recommended_network: None,
            recommended_vlan: None,
            metadata: BTreeMap::new(),
        }
    }

    pub fn with_severity(mut self, severity: Severity, score_impact: u32) -> Self {
        self.severity = severity;
        self.score_impact = score_impact;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_rule(mut self, rule_id: impl Into<String>) -> Self {
        self.rule_id = Some(rule_id.into());
        self
    }

    pub fn with_current(mut self, network: impl Into<String>, vlan: Option<u16>) -> Self {
        self.current_network = Some(network.into());
        self.current_vlan = vlan;
        self
    }

    pub fn with_recommended(mut self, network: impl Into<String>, vlan: u16) -> Self {
        self.recommended_network = Some(network.into());
        self.recommended_vlan = Some(vlan);
        self
    }

    pub fn with_meta(mut self, key: &str, value: impl Into<String>) -> Self {
        self.metadata.insert(key.to_owned(), value.into());
        self
    }
}
