//! HTTP router configuration

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};

use crate::api::{groups, system};
use crate::state::AppState;

/// Create the application router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // System endpoints
        .route("/", get(system::index))
        .route("/metrics", get(system::metrics))
        // Group endpoints
        .route("/groups", get(groups::list_groups))
        .route("/group", get(groups::get_group))
        .route("/group/run", post(groups::run_group))
        // State
        .with_state(state)
}
