//! Position routes

use axum::{
    extract::{Path, State},
    response::Json,
    routing::get,
    Router,
};
use std::path::Path as FsPath;

use super::{ApiError, ApiState};
use crate::dataset::PositionRecord;

const DUMP_FILE: &str = "positionall.json";

pub(super) fn router() -> Router<ApiState> {
    Router::new()
        .route("/position/all", get(all_positions))
        .route("/position/:epoch", get(position_by_epoch))
}

/// GET /position/all - Every state vector in source order
async fn all_positions(
    State(state): State<ApiState>,
) -> Result<Json<Vec<PositionRecord>>, ApiError> {
    let records = state.store().all_positions()?;

    if let Some(dir) = &state.dump_dir {
        dump_positions(dir, &records).await;
    }

    Ok(Json(records))
}

/// GET /position/:epoch - State vectors whose EPOCH matches exactly
async fn position_by_epoch(
    State(state): State<ApiState>,
    Path(epoch): Path<String>,
) -> Result<Json<Vec<PositionRecord>>, ApiError> {
    let records = state.store().position_by_epoch(&epoch)?;
    tracing::debug!(epoch = %epoch, matches = records.len(), "epoch lookup");
    Ok(Json(records))
}

/// Write served records to `<dir>/positionall.json`. Failures are logged only.
async fn dump_positions(dir: &FsPath, records: &[PositionRecord]) {
    let path = dir.join(DUMP_FILE);
    let body = match serde_json::to_vec_pretty(records) {
        Ok(body) => body,
        Err(e) => {
            tracing::warn!("Failed to serialize position dump: {}", e);
            return;
        }
    };

    if let Err(e) = tokio::fs::create_dir_all(dir).await {
        tracing::warn!("Failed to create dump dir {}: {}", dir.display(), e);
        return;
    }
    match tokio::fs::write(&path, body).await {
        Ok(()) => tracing::debug!("Position data written to {}", path.display()),
        Err(e) => tracing::warn!("Failed to write {}: {}", path.display(), e),
    }
}
