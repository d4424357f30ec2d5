//! netbox-sd-core: Target generation and group scheduling
//!
//! Turns inventory records into file_sd target lists. Contains address
//! selection, label generation, filters, the per-kind target assemblers, the
//! group worker and the kameo actors hosting one worker per group.

pub mod actor;
pub mod assembler;
pub mod config;
pub mod error;
pub mod filter;
pub mod labels;
pub mod message;
pub mod output;
pub mod recorder;
pub mod select;
pub mod state;
pub mod target;
pub mod worker;

pub use actor::{GroupActor, GroupActorArgs, SupervisorActor, SupervisorActorArgs};
pub use assembler::Assembler;
pub use config::{
    Filter, FilterConfig, Flags, FlagsConfig, Group, GroupConfig, GroupKind, InetFamily,
    parse_interval, validate_groups,
};
pub use error::{ConfigError, CoreError};
pub use labels::LabelSet;
pub use message::{GetGroup, ListGroups, RegisterGroup, RunGroup, RunNow, Tick};
pub use output::{FileSink, TargetSink};
pub use recorder::{NoopRecorder, Recorder};
pub use select::{AddressPolicy, select_addresses};
pub use state::{TargetState, WorkerState};
pub use target::{TargetRecord, render_targets};
pub use worker::{CycleReport, GroupStatus, GroupWorker, StatusWatcher, WORKER_TICK};
