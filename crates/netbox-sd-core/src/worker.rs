//! Group worker
//!
//! Owns one group and runs its cycles: assemble targets, then either write the
//! complete file or leave the previous one untouched.

use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use kameo_macros::Reply;
use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use netbox_sd_inventory::InventorySource;

use crate::assembler::Assembler;
use crate::config::{Group, GroupKind};
use crate::output::TargetSink;
use crate::recorder::Recorder;
use crate::state::WorkerState;
use crate::target::render_targets;

/// How often a worker checks whether its scan interval has passed
pub const WORKER_TICK: Duration = Duration::from_millis(500);

/// Result of a single cycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Reply)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CycleReport {
    /// File replaced with this many records
    Committed { targets: usize },
    /// Inventory query failed, file left as it was
    Discarded { error: String },
    /// Targets assembled but the file couldn't be written
    WriteFailed { error: String },
}

impl CycleReport {
    #[must_use]
    pub fn is_committed(&self) -> bool {
        matches!(self, CycleReport::Committed { .. })
    }
}

/// Snapshot of a worker for status queries
#[derive(Debug, Clone, Serialize, Reply)]
pub struct GroupStatus {
    /// Output file
    pub file: String,
    pub kind: GroupKind,
    /// Tag or service name
    pub match_value: String,
    pub scan_interval_secs: u64,
    pub state: WorkerState,
    /// When the last cycle finished
    pub last_run: Option<DateTime<Utc>>,
    pub last_report: Option<CycleReport>,
    /// Records in the file as of the last committed cycle
    pub target_count: usize,
    /// Discarded cycles since start
    pub update_errors: u64,
    /// Failed writes since start
    pub write_errors: u64,
}

/// Receives a new [`GroupStatus`] whenever the worker changes state
pub type StatusWatcher = watch::Receiver<GroupStatus>;

/// Runs the cycles of one group
pub struct GroupWorker {
    group: Arc<Group>,
    inventory: Arc<dyn InventorySource>,
    recorder: Arc<dyn Recorder>,
    sink: Arc<dyn TargetSink>,
    state: WorkerState,
    last_run: Option<Instant>,
    last_run_at: Option<DateTime<Utc>>,
    last_report: Option<CycleReport>,
    target_count: usize,
    update_errors: u64,
    write_errors: u64,
    status: watch::Sender<GroupStatus>,
}

impl fmt::Debug for GroupWorker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GroupWorker")
            .field("group", &self.group.file)
            .field("state", &self.state)
            .field("last_report", &self.last_report)
            .finish_non_exhaustive()
    }
}

impl GroupWorker {
    /// Create a worker. The first cycle is due immediately.
    pub fn new(
        group: Group,
        inventory: Arc<dyn InventorySource>,
        recorder: Arc<dyn Recorder>,
        sink: Arc<dyn TargetSink>,
    ) -> Self {
        let group = Arc::new(group);
        let (status, _rx) = watch::channel(GroupStatus {
            file: group.file.clone(),
            kind: group.kind,
            match_value: group.match_value.clone(),
            scan_interval_secs: group.scan_interval.as_secs(),
            state: WorkerState::Idle,
            last_run: None,
            last_report: None,
            target_count: 0,
            update_errors: 0,
            write_errors: 0,
        });

        Self {
            group,
            inventory,
            recorder,
            sink,
            state: WorkerState::Idle,
            last_run: None,
            last_run_at: None,
            last_report: None,
            target_count: 0,
            update_errors: 0,
            write_errors: 0,
            status,
        }
    }

    /// Watch the worker's status without going through its owner
    #[must_use]
    pub fn subscribe(&self) -> StatusWatcher {
        self.status.subscribe()
    }

    /// The group this worker owns
    #[must_use]
    pub fn group(&self) -> &Group {
        &self.group
    }

    #[must_use]
    pub fn state(&self) -> WorkerState {
        self.state
    }

    /// Whether the scan interval has passed since the last cycle finished
    #[must_use]
    pub fn is_due(&self, now: Instant) -> bool {
        self.last_run
            .is_none_or(|last| now.saturating_duration_since(last) >= self.group.scan_interval)
    }

    /// Run one full cycle
    ///
    /// The target file is only replaced if every inventory query succeeded.
    pub async fn run_cycle(&mut self) -> CycleReport {
        let group = Arc::clone(&self.group);
        let file = group.file.as_str();
        let started = Instant::now();

        self.state = WorkerState::Running;
        self.publish();
        debug!(group = %file, kind = %group.kind, "new scan");

        let assembler = Assembler::new(&group, self.inventory.as_ref(), self.recorder.as_ref());

        let report = match assembler.assemble().await {
            Ok(records) => {
                let data = render_targets(&records);
                match self.sink.write(Path::new(file), data.into_bytes()).await {
                    Ok(()) => {
                        self.target_count = records.len();
                        self.recorder.target_count(file, records.len());
                        info!(group = %file, targets = records.len(), "targets updated");
                        CycleReport::Committed {
                            targets: records.len(),
                        }
                    }
                    Err(e) => {
                        self.write_errors += 1;
                        self.recorder.write_error(file);
                        error!(group = %file, error = %e, "failed to write target file");
                        CycleReport::WriteFailed {
                            error: e.to_string(),
                        }
                    }
                }
            }
            Err(e) => {
                self.update_errors += 1;
                self.recorder.update_error(file);
                warn!(
                    group = %file,
                    error = %e,
                    retryable = e.is_retryable(),
                    "getting targets failed, keeping previous file"
                );
                CycleReport::Discarded {
                    error: e.to_string(),
                }
            }
        };

        let finished_at = Utc::now();
        self.last_run = Some(Instant::now());
        self.last_run_at = Some(finished_at);
        self.recorder
            .cycle_finished(file, started.elapsed(), finished_at);

        self.last_report = Some(report.clone());
        self.state = WorkerState::Idle;
        self.publish();

        report
    }

    fn publish(&self) {
        self.status.send_replace(self.status());
    }

    /// Current status snapshot
    #[must_use]
    pub fn status(&self) -> GroupStatus {
        GroupStatus {
            file: self.group.file.clone(),
            kind: self.group.kind,
            match_value: self.group.match_value.clone(),
            scan_interval_secs: self.group.scan_interval.as_secs(),
            state: self.state,
            last_run: self.last_run_at,
            last_report: self.last_report.clone(),
            target_count: self.target_count,
            update_errors: self.update_errors,
            write_errors: self.write_errors,
        }
    }
}
