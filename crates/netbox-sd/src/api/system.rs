//! Landing page and metrics exposition

use std::sync::Arc;

use axum::{
    extract::State,
    http::header,
    response::{Html, IntoResponse},
};

use crate::api::error::AppError;
use crate::state::AppState;

const LANDING_PAGE: &str =
    r#"<h1>Netbox_SD Prometheus Metrics</h1><a href="/metrics">see metrics here</a>"#;

/// Landing page pointing at the metrics
pub async fn index() -> Html<&'static str> {
    Html(LANDING_PAGE)
}

/// Prometheus text exposition of all metrics
///
/// # Errors
/// Returns `AppError` if the metrics can't be encoded
pub async fn metrics(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, AppError> {
    let body = state
        .recorder
        .encode()
        .map_err(|e| AppError::internal(format!("failed to encode metrics: {e}")))?;

    Ok((
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
        body,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_index_links_metrics() {
        let Html(page) = index().await;
        assert!(page.starts_with("<h1>Netbox_SD Prometheus Metrics</h1>"));
        assert_eq!(page.matches("<h1>").count(), 1);
        assert!(page.contains(r#"<a href="/metrics">"#));
    }
}
