//! Knobs that shape an audit run.

use std::collections::BTreeSet;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

use crate::error::CoreError;
use crate::model::Severity;

/// One family of audit checks. Ids are stable and used by `--skip` and
/// the `disabled_checks` config key.
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
    EnumIter,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum CheckKind {
    ManagementAccess,
    Shadowing,
    Permissive,
    Orphaned,
    InterVlanIsolation,
    InternetBypass,
    IsolationExceptions,
    InfrastructurePlacement,
    NetworkConfiguration,
    Exposure,
}

impl CheckKind {
    /// Parse a check id, listing the valid ids on failure.
    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        Self::from_str(raw.trim()).map_err(|_| CoreError::InvalidSetting {
            setting: "check",
            value: raw.to_owned(),
            expected: Self::iter()
                .map(|c| c.to_string())
                .collect::<Vec<_>>()
                .join(", "),
        })
    }
}

/// Parse a severity name, listing the valid names on failure.
pub fn parse_severity(raw: &str) -> Result<Severity, CoreError> {
    Severity::from_str(raw.trim()).map_err(|_| CoreError::InvalidSetting {
        setting: "severity",
        value: raw.to_owned(),
        expected: "informational, recommended, critical".to_owned(),
    })
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditSettings {
    /// Drop findings below this severity from the report.
    pub min_severity: Option<Severity>,
    pub disabled_checks: BTreeSet<CheckKind>,
    /// Threshold the CLI uses to pick a failing exit code.
    pub fail_on: Option<Severity>,
}

impl AuditSettings {
    pub fn is_enabled(&self, check: CheckKind) -> bool {
        !self.disabled_checks.contains(&check)
    }

    pub fn keeps(&self, severity: Severity) -> bool {
        self.min_severity.is_none_or(|min| severity >= min)
    }
}
