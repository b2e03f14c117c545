//! Dataset store: typed records, immutable snapshots and the query surface
//!
//! Two datasets are held side by side:
//!
//! - `positions`: OEM ephemeris state vectors, found at
//!   `ndm.oem.body.segment.data.stateVector`
//! - `sightings`: visible passes, found at `visible_passes.visible_pass`
//!
//! A load builds a complete `Snapshot` off to the side and publishes it with a
//! single pointer swap. Readers never block and never see a partial dataset.

mod query;
pub mod records;
pub mod snapshot;
pub mod store;

pub use records::{PositionRecord, SightingRecord, StateComponent};
pub use snapshot::Snapshot;
pub use store::{DatasetStatus, DatasetStore, LoadState, StoreStatus};

use serde::Serialize;
use std::fmt;

/// Which of the two datasets an operation targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DatasetKind {
    /// Ephemeris samples from the OEM file
    Positions,
    /// Visible passes from the sighting file
    Sightings,
}

impl DatasetKind {
    /// Nested path of the record list inside the parsed document.
    pub fn record_path(&self) -> &'static [&'static str] {
        match self {
            DatasetKind::Positions => &["ndm", "oem", "body", "segment", "data", "stateVector"],
            DatasetKind::Sightings => &["visible_passes", "visible_pass"],
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DatasetKind::Positions => "positions",
            DatasetKind::Sightings => "sightings",
        }
    }
}

impl fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
