use crate::{AppState, error::AppError};
use analytics::HeatmapReport;
use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct HeatmapQuery {
    /// One of `1M, 3M, 6M, 1Y, 2Y, 3Y, 4Y`. Absent or empty means month-over-month.
    #[serde(default)]
    pub forward_period: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct IndicesResponse {
    pub indices: Vec<String>,
}

/// # GET /
pub async fn root() -> Json<Value> {
    Json(json!({
        "message": "Index Heatmap API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "/indices": "Get list of all available indices",
            "/heatmap/{index_name}": "Get heatmap data for a specific index",
        }
    }))
}

/// # GET /indices (also /api/indices)
pub async fn get_indices(State(state): State<Arc<AppState>>) -> Json<IndicesResponse> {
    Json(IndicesResponse {
        indices: state.service.index_names().to_vec(),
    })
}

/// # GET /heatmap/:index_name?forward_period=1Y (also under /api)
/// Every metric for one index. The `heatmap` field holds forward returns when a
/// forward period is given and month-over-month returns otherwise.
pub async fn get_heatmap(
    Path(index_name): Path<String>,
    Query(query): Query<HeatmapQuery>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<HeatmapReport>, AppError> {
    let forward_period = query
        .forward_period
        .as_deref()
        .filter(|token| !token.is_empty());

    tracing::debug!(index = %index_name, forward_period = ?forward_period, "Building heatmap.");
    let report = state.service.report(&index_name, forward_period)?;
    Ok(Json(report))
}
