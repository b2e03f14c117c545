//! Sighting routes

use axum::{
    extract::{Path, State},
    response::Json,
    routing::get,
    Router,
};

use super::{ApiError, ApiState};
use crate::dataset::SightingRecord;

type Records = Result<Json<Vec<SightingRecord>>, ApiError>;
type Names = Result<Json<Vec<String>>, ApiError>;

pub(super) fn router() -> Router<ApiState> {
    Router::new()
        .route("/sightings/all", get(all_sightings))
        .route("/sightings/countries", get(countries))
        .route("/sightings/countries/:country", get(by_country))
        .route("/sightings/countries/:country/regions", get(regions_for))
        .route(
            "/sightings/countries/:country/:region/cities",
            get(cities_for),
        )
        .route("/sightings/regions/:region", get(by_region))
        .route("/sightings/cities/:city", get(by_city))
}

/// GET /sightings/all
async fn all_sightings(State(state): State<ApiState>) -> Records {
    Ok(Json(state.store().all_sightings()?))
}

/// GET /sightings/countries - Distinct countries, first-occurrence order
async fn countries(State(state): State<ApiState>) -> Names {
    Ok(Json(state.store().countries()?))
}

/// GET /sightings/countries/:country
async fn by_country(State(state): State<ApiState>, Path(country): Path<String>) -> Records {
    Ok(Json(state.store().by_country(&country)?))
}

/// GET /sightings/countries/:country/regions
async fn regions_for(State(state): State<ApiState>, Path(country): Path<String>) -> Names {
    Ok(Json(state.store().regions_for(&country)?))
}

/// GET /sightings/countries/:country/:region/cities
async fn cities_for(
    State(state): State<ApiState>,
    Path((country, region)): Path<(String, String)>,
) -> Names {
    Ok(Json(state.store().cities_for(&country, &region)?))
}

/// GET /sightings/regions/:region - Not scoped to a country
async fn by_region(State(state): State<ApiState>, Path(region): Path<String>) -> Records {
    Ok(Json(state.store().by_region(&region)?))
}

/// GET /sightings/cities/:city
async fn by_city(State(state): State<ApiState>, Path(city): Path<String>) -> Records {
    Ok(Json(state.store().by_city(&city)?))
}
