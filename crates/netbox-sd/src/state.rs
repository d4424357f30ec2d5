//! Application state shared across HTTP handlers

use std::sync::Arc;

use kameo::actor::ActorRef;
use netbox_sd_core::SupervisorActor;

use crate::metrics::PrometheusRecorder;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    /// Reference to the group registry
    pub supervisor: ActorRef<SupervisorActor>,
    /// Metrics of all group workers
    pub recorder: Arc<PrometheusRecorder>,
}

impl AppState {
    /// Create new application state
    pub fn new(supervisor: ActorRef<SupervisorActor>, recorder: Arc<PrometheusRecorder>) -> Self {
        Self {
            supervisor,
            recorder,
        }
    }
}
