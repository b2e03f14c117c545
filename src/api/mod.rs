//! HTTP facade over the dataset store
//!
//! Routes:
//! - GET  /help                                            - Route listing
//! - GET  /load_data                                       - Usage text
//! - POST /load_data                                       - Reload both datasets
//! - GET  /status                                          - Per-dataset load status
//! - GET  /position/all                                    - Every state vector
//! - GET  /position/:epoch                                 - State vectors for one epoch
//! - GET  /sightings/all                                   - Every visible pass
//! - GET  /sightings/countries                             - Distinct countries
//! - GET  /sightings/countries/:country                    - Passes in one country
//! - GET  /sightings/countries/:country/regions            - Regions of one country
//! - GET  /sightings/countries/:country/:region/cities     - Cities of a country+region
//! - GET  /sightings/regions/:region                       - Passes in one region
//! - GET  /sightings/cities/:city                          - Passes for one city

mod admin_routes;
mod error;
mod position_routes;
mod sighting_routes;

pub use error::ApiError;

use axum::Router;
use std::path::PathBuf;
use std::sync::Arc;

use crate::dataset::DatasetStore;
use crate::loader::DatasetLoader;

// ============================================================================
// State
// ============================================================================

#[derive(Clone)]
pub struct ApiState {
    pub loader: Arc<DatasetLoader>,
    /// When set, `GET /position/all` also writes `positionall.json` here
    pub dump_dir: Option<PathBuf>,
}

impl ApiState {
    pub fn new(loader: Arc<DatasetLoader>) -> Self {
        Self {
            loader,
            dump_dir: None,
        }
    }

    pub fn with_dump_dir(mut self, dump_dir: Option<PathBuf>) -> Self {
        self.dump_dir = dump_dir;
        self
    }

    pub(crate) fn store(&self) -> &DatasetStore {
        self.loader.store()
    }
}

// ============================================================================
// Router
// ============================================================================

pub fn create_router(state: ApiState) -> Router {
    Router::new()
        .merge(admin_routes::router())
        .merge(position_routes::router())
        .merge(sighting_routes::router())
        .with_state(state)
}
