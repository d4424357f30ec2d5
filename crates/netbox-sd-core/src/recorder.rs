//! Observability hooks
//!
//! Workers report through a [`Recorder`] handed to them at construction, so the
//! pipeline can run without a metrics registry.

use std::time::Duration;

use chrono::{DateTime, Utc};

use netbox_sd_inventory::Device;

use crate::state::TargetState;

/// Receives per-item and per-cycle observations, keyed by group file
pub trait Recorder: Send + Sync {
    /// Outcome for one inventory item
    fn target_state(&self, group: &str, node: &Device, state: TargetState);

    /// Candidate addresses that were not selected for an item
    fn addresses_skipped(&self, group: &str, node_name: &str, count: usize);

    /// A cycle was discarded because an inventory query failed
    fn update_error(&self, group: &str);

    /// A cycle produced targets but the file couldn't be written
    fn write_error(&self, group: &str);

    /// Number of records written by the last committed cycle
    fn target_count(&self, group: &str, count: usize);

    /// Any cycle finished, successful or not
    fn cycle_finished(&self, group: &str, duration: Duration, finished_at: DateTime<Utc>);
}

/// Recorder that drops everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopRecorder;

impl Recorder for NoopRecorder {
    fn target_state(&self, _group: &str, _node: &Device, _state: TargetState) {}
    fn addresses_skipped(&self, _group: &str, _node_name: &str, _count: usize) {}
    fn update_error(&self, _group: &str) {}
    fn write_error(&self, _group: &str) {}
    fn target_count(&self, _group: &str, _count: usize) {}
    fn cycle_finished(&self, _group: &str, _duration: Duration, _finished_at: DateTime<Utc>) {}
}
