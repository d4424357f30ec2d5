//! Message types for actor communication
//!
//! Message handlers are implemented in their respective actor modules.

use crate::worker::GroupWorker;

// ============================================================================
// GroupActor Messages
// ============================================================================

/// Scheduler tick: run a cycle if the scan interval has passed
#[derive(Debug)]
pub struct Tick;

/// Run a cycle right away, regardless of the interval
#[derive(Debug)]
pub struct RunNow;

// ============================================================================
// SupervisorActor Messages
// ============================================================================

/// Start an actor for a group
#[derive(Debug)]
pub struct RegisterGroup {
    /// Worker owning the group
    pub worker: GroupWorker,
}

/// List the status of all groups
#[derive(Debug)]
pub struct ListGroups;

/// Get the status of one group
#[derive(Debug)]
pub struct GetGroup {
    /// Output file of the group
    pub file: String,
}

/// Run a cycle of one group right away
#[derive(Debug)]
pub struct RunGroup {
    /// Output file of the group
    pub file: String,
}
