//! Target and worker state types

use std::fmt;

use serde::Serialize;

/// Outcome of evaluating a single inventory item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetState {
    /// Item is part of the output
    Active,
    /// Skipped for a reason not covered below
    SkippedOther,
    /// Owning device or VM isn't active, or the interface is disabled
    SkippedBadStatus,
    /// A custom field couldn't be turned into a label
    SkippedBadCustomField,
    /// No usable address
    SkippedNoValidIp,
    /// Rejected by the group's filters
    SkippedNotMatchingFilters,
}

impl TargetState {
    /// Gauge value exported for this state
    #[must_use]
    pub fn value(self) -> f64 {
        match self {
            TargetState::Active => 1.0,
            TargetState::SkippedOther => 0.0,
            TargetState::SkippedBadStatus => -1.0,
            TargetState::SkippedBadCustomField => -2.0,
            TargetState::SkippedNoValidIp => -3.0,
            TargetState::SkippedNotMatchingFilters => -4.0,
        }
    }
}

impl fmt::Display for TargetState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TargetState::Active => "active",
            TargetState::SkippedOther => "skipped_other",
            TargetState::SkippedBadStatus => "skipped_bad_status",
            TargetState::SkippedBadCustomField => "skipped_bad_custom_field",
            TargetState::SkippedNoValidIp => "skipped_no_valid_ip",
            TargetState::SkippedNotMatchingFilters => "skipped_not_matching_filters",
        };
        write!(f, "{s}")
    }
}

/// States of a group worker
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerState {
    /// Waiting for the scan interval to pass
    #[default]
    Idle,
    /// Cycle in progress
    Running,
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkerState::Idle => write!(f, "idle"),
            WorkerState::Running => write!(f, "running"),
        }
    }
}
