//! Help, reload and status routes

use axum::{extract::State, response::Json, routing::get, Router};

use super::{ApiError, ApiState};
use crate::dataset::StoreStatus;

const HELP_TEXT: &str = "
    Retrieve and filter ISS position and sighting data.

    /load_data (POST) -> read position and sighting data into memory
    required once after the server starts, unless preload is enabled

    /status -> load state, record count and last error for each dataset

    /position/all -> every epoch in the position data

    /position/<epoch> -> state vectors for one epoch
    EXAMPLE: /position/2022-042T12:00:00.000Z

    /sightings/all -> every visible pass in the sighting data

    /sightings/countries -> distinct countries in the sighting data

    /sightings/countries/<country> -> every pass in one country
    EXAMPLE: /sightings/countries/United_States

    /sightings/countries/<country>/regions -> distinct regions of one country
    EXAMPLE: /sightings/countries/United_States/regions

    /sightings/regions/<region> -> every pass in one region
    EXAMPLE: /sightings/regions/Massachusetts

    /sightings/countries/<country>/<region>/cities -> distinct cities of a country and region
    EXAMPLE: /sightings/countries/United_States/Massachusetts/cities

    /sightings/cities/<city> -> every pass for one city
    EXAMPLE: /sightings/cities/Flemington
";

const LOAD_DATA_USAGE: &str = "
    This route reloads the stored data. Send a POST request to it, e.g.:

    curl -X POST localhost:5011/load_data
";

pub(super) fn router() -> Router<ApiState> {
    Router::new()
        .route("/help", get(help))
        .route("/load_data", get(load_data_usage).post(load_data))
        .route("/status", get(status))
}

/// GET /help - Route listing
async fn help() -> &'static str {
    HELP_TEXT
}

/// GET /load_data - Usage text
async fn load_data_usage() -> &'static str {
    LOAD_DATA_USAGE
}

/// POST /load_data - Reload positions, then sightings
async fn load_data(State(state): State<ApiState>) -> Result<String, ApiError> {
    let report = state.loader.reload_all().await?;
    Ok(format!(
        "Data has been read from file\npositions: {}\nsightings: {}\n",
        report.positions, report.sightings
    ))
}

/// GET /status - Load status of both datasets
async fn status(State(state): State<ApiState>) -> Json<StoreStatus> {
    Json(state.store().status())
}
