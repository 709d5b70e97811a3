use std::sync::Arc;

use axum::extract::State;
use axum::response::Json;
use serde_json::{json, Value};

use crate::error::AppError;
use crate::state::AppState;

/// POST /api/refresh
///
/// Re-fetch the price feed and return the recomputed report. Answers 409
/// while another refresh is still running.
pub async fn refresh(State(state): State<Arc<AppState>>) -> Result<Json<Value>, AppError> {
    let report = state.pulse.refresh().await?;
    tracing::info!(
        records = report.records_used,
        skipped = report.records_skipped,
        months = report.trend.len(),
        "price feed refreshed"
    );
    let empty = report.is_empty();
    Ok(Json(json!({ "data": report, "empty": empty })))
}
