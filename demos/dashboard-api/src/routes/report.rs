use std::sync::Arc;

use axum::extract::{Query, State};
use axum::response::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use weekpulse::chart::{self, ChartKind};

use crate::error::AppError;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct TrendParams {
    pub chart: Option<String>,
}

/// GET /api/report
///
/// The full report: buckets by id, ranking and trend table.
pub async fn get_report(State(state): State<Arc<AppState>>) -> Result<Json<Value>, AppError> {
    let report = state.pulse.report().await?;
    let empty = report.is_empty();
    Ok(Json(json!({ "data": report, "empty": empty })))
}

/// GET /api/buckets
///
/// Mean deviation per week-of-month bucket, ordered by bucket id, with the
/// bar colour for each value.
pub async fn get_buckets(State(state): State<Arc<AppState>>) -> Result<Json<Value>, AppError> {
    let report = state.pulse.report().await?;
    let data: Vec<Value> = report
        .buckets
        .iter()
        .map(|b| {
            json!({
                "bucket": b,
                "color": chart::deviation_color(b.deviation),
                "display": chart::format_deviation(b.deviation),
            })
        })
        .collect();
    let count = data.len();
    Ok(Json(json!({ "data": data, "count": count })))
}

/// GET /api/ranking
///
/// Buckets ordered from strongest to weakest against their month's average.
pub async fn get_ranking(State(state): State<Arc<AppState>>) -> Result<Json<Value>, AppError> {
    let report = state.pulse.report().await?;
    let count = report.ranked_buckets.len();
    Ok(Json(json!({ "data": report.ranked_buckets, "count": count })))
}

/// GET /api/trend?chart=line
///
/// Monthly trend table plus one series per bucket, for a bar, line or area chart.
pub async fn get_trend(
    State(state): State<Arc<AppState>>,
    Query(params): Query<TrendParams>,
) -> Result<Json<Value>, AppError> {
    let kind = match params.chart.as_deref() {
        Some(s) => s.parse::<ChartKind>()?,
        None => ChartKind::default(),
    };

    let report = state.pulse.report().await?;
    let series = chart::trend_series(&report.trend);
    Ok(Json(json!({
        "chart": kind,
        "rows": report.trend,
        "series": series,
    })))
}

/// GET /api/best
///
/// The most consistent overperformer, or `null` when there is no data.
pub async fn get_best(State(state): State<Arc<AppState>>) -> Result<Json<Value>, AppError> {
    let best = state.pulse.best_week().await?;
    let headline = best.as_ref().map(chart::best_week_headline);
    Ok(Json(json!({ "data": best, "headline": headline })))
}
