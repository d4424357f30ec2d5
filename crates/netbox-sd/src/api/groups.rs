//! Group status API endpoints

use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State},
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use netbox_sd_core::{CycleReport, GetGroup, GroupStatus, ListGroups, RunGroup};

use crate::api::error::AppError;
use crate::state::AppState;

/// Selects one group by output file
#[derive(Debug, Deserialize)]
pub struct GroupQuery {
    /// Output file of the group
    pub file: String,
}

/// Group list response
#[derive(Debug, Serialize)]
pub struct GroupListResponse {
    /// Status of every group
    pub groups: Vec<GroupStatus>,
    /// Number of groups
    pub total: usize,
}

/// List all groups
///
/// # Errors
/// Returns `AppError` if supervisor communication fails
pub async fn list_groups(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    let groups = state
        .supervisor
        .ask(ListGroups)
        .await
        .map_err(|e| AppError::internal(format!("failed to list groups: {e}")))?;

    Ok(Json(GroupListResponse {
        total: groups.len(),
        groups,
    }))
}

/// Get the status of one group
///
/// # Errors
/// Returns `AppError` if the group doesn't exist or supervisor communication fails
pub async fn get_group(
    State(state): State<Arc<AppState>>,
    Query(query): Query<GroupQuery>,
) -> Result<Json<GroupStatus>, AppError> {
    let status = state
        .supervisor
        .ask(GetGroup { file: query.file })
        .await?;

    Ok(Json(status))
}

/// Run a cycle of one group right away
///
/// # Errors
/// Returns `AppError` if the group doesn't exist or supervisor communication fails
pub async fn run_group(
    State(state): State<Arc<AppState>>,
    Query(query): Query<GroupQuery>,
) -> Result<Json<CycleReport>, AppError> {
    info!(group = %query.file, "manual run requested over http");

    let report = state
        .supervisor
        .ask(RunGroup { file: query.file })
        .await?;

    Ok(Json(report))
}
