//! Install Report
//!
//! Per-group outcome record produced by execution and verification.
//!
//! # Transitions
//!
//! ```text
//! Skipped ──execute──► Installed ──verify──► Failed
//!    │
//!    └─────execute──► Failed
//! ```
//!
//! Each group is attempted at most once. Verification can only downgrade
//! `Installed` to `Failed`. Every other transition is rejected, which keeps
//! the report monotonic.

use crate::logic::planner::InstallPlan;
use crate::profiles::{GroupKind, Package};
use serde::Serialize;
use std::fmt;
use strum::{Display, EnumString};
use thiserror::Error;

/// Outcome of one package group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum GroupOutcome {
    /// Not attempted (yet)
    Skipped,
    /// Package manager succeeded (and, after verification, every module imports)
    Installed,
    /// Package manager failed, or a module failed to import
    Failed,
}

/// Invalid report transitions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReportTransitionError {
    #[error("group '{0}' is not part of this report")]
    UnknownGroup(GroupKind),

    #[error("group '{group}' was already attempted (outcome: {outcome})")]
    AlreadyAttempted { group: GroupKind, outcome: GroupOutcome },

    #[error("group '{group}' cannot be attempted as {outcome}")]
    InvalidAttempt { group: GroupKind, outcome: GroupOutcome },

    #[error("group '{group}' cannot be downgraded from {outcome}")]
    NotInstalled { group: GroupKind, outcome: GroupOutcome },
}

/// One group's row in the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportEntry {
    pub group: GroupKind,
    pub packages: Vec<Package>,
    pub required: bool,
    pub outcome: GroupOutcome,
    /// Why the group failed (exit code, failing import)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Mapping from group to outcome, in plan order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstallReport {
    entries: Vec<ReportEntry>,
}

impl InstallReport {
    /// Start a report with every planned group `Skipped`
    pub fn from_plan(plan: &InstallPlan) -> Self {
        let entries = plan
            .groups()
            .iter()
            .map(|g| ReportEntry {
                group: g.kind,
                packages: g.packages.clone(),
                required: g.required,
                outcome: GroupOutcome::Skipped,
                detail: None,
            })
            .collect();
        Self { entries }
    }

    pub fn entries(&self) -> &[ReportEntry] {
        &self.entries
    }

    pub fn entry(&self, group: GroupKind) -> Option<&ReportEntry> {
        self.entries.iter().find(|e| e.group == group)
    }

    pub fn outcome(&self, group: GroupKind) -> Option<GroupOutcome> {
        self.entry(group).map(|e| e.outcome)
    }

    fn entry_mut(&mut self, group: GroupKind) -> Result<&mut ReportEntry, ReportTransitionError> {
        self.entries
            .iter_mut()
            .find(|e| e.group == group)
            .ok_or(ReportTransitionError::UnknownGroup(group))
    }

    /// Record the result of installing a group. Allowed once, from `Skipped`.
    pub fn record_attempt(
        &mut self,
        group: GroupKind,
        outcome: GroupOutcome,
        detail: Option<String>,
    ) -> Result<(), ReportTransitionError> {
        if outcome == GroupOutcome::Skipped {
            return Err(ReportTransitionError::InvalidAttempt { group, outcome });
        }
        let entry = self.entry_mut(group)?;
        if entry.outcome != GroupOutcome::Skipped {
            return Err(ReportTransitionError::AlreadyAttempted {
                group,
                outcome: entry.outcome,
            });
        }
        entry.outcome = outcome;
        entry.detail = detail;
        Ok(())
    }

    /// Mark an installed group as failed after verification.
    pub fn downgrade(&mut self, group: GroupKind, detail: String) -> Result<(), ReportTransitionError> {
        let entry = self.entry_mut(group)?;
        if entry.outcome != GroupOutcome::Installed {
            return Err(ReportTransitionError::NotInstalled {
                group,
                outcome: entry.outcome,
            });
        }
        entry.outcome = GroupOutcome::Failed;
        entry.detail = Some(detail);
        Ok(())
    }

    /// Returns true if a required group did not end up installed
    pub fn required_failed(&self) -> bool {
        self.entries
            .iter()
            .any(|e| e.required && e.outcome != GroupOutcome::Installed)
    }

    /// Groups with the given outcome
    pub fn groups_with(&self, outcome: GroupOutcome) -> Vec<GroupKind> {
        self.entries
            .iter()
            .filter(|e| e.outcome == outcome)
            .map(|e| e.group)
            .collect()
    }

    /// Serialize to pretty JSON for `--report`
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl fmt::Display for InstallReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in &self.entries {
            let mark = match entry.outcome {
                GroupOutcome::Installed => "✓",
                GroupOutcome::Failed => "✗",
                GroupOutcome::Skipped => "-",
            };
            write!(
                f,
                "  {} {:<7} {:<10} {}",
                mark,
                entry.group.to_string(),
                entry.outcome.to_string(),
                entry.group.feature()
            )?;
            if let Some(detail) = &entry.detail {
                write!(f, " ({})", detail)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
