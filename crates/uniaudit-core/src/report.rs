// ── Audit report and security score ──

use serde::{Deserialize, Serialize};

use crate::model::{Issue, Severity};

/// Score every site starts from before deductions.
pub const MAX_SCORE: u32 = 100;

/// Findings of one audit run plus the derived score and per-severity counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditReport {
    pub issues: Vec<Issue>,
    pub score: u32,
    pub critical: usize,
    pub recommended: usize,
    pub informational: usize,
}

impl AuditReport {
    pub fn from_issues(issues: Vec<Issue>) -> Self {
        let deducted: u32 = issues.iter().map(|i| i.score_impact).sum();
        let count = |sev: Severity| issues.iter().filter(|i| i.severity == sev).count();
        Self {
            score: MAX_SCORE.saturating_sub(deducted),
            critical: count(Severity::Critical),
            recommended: count(Severity::Recommended),
            informational: count(Severity::Informational),
            issues,
        }
    }

    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    /// Highest severity present, if any.
    pub fn worst_severity(&self) -> Option<Severity> {
        self.issues.iter().map(|i| i.severity).max()
    }

    /// Whether any finding is at or above `threshold`.
    pub fn has_at_least(&self, threshold: Severity) -> bool {
        self.worst_severity().is_some_and(|s| s >= threshold)
    }

    /// Number of findings at or above `threshold`.
    pub fn count_at_least(&self, threshold: Severity) -> usize {
        self.issues.iter().filter(|i| i.severity >= threshold).count()
    }
}
