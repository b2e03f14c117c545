//! ISS Tracker - in-memory ephemeris and sighting dataset store
//!
//! The crate retrieves two published ISS datasets (the OEM ephemeris and the
//! visible-pass sighting list), parses the markup into a generic tree, and
//! installs typed records into a snapshot store that answers lookups by epoch,
//! country, region and city.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  HTTP facade (feature = "server")                               │
//! │        /position/...   /sightings/...   /load_data              │
//! └─────────────────────────────────────────────────────────────────┘
//!                               │
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     Dataset Loader                              │
//! │          SourceFetcher (file / URL) -> raw bytes                │
//! └─────────────────────────────────────────────────────────────────┘
//!                               │
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     Dataset Store                               │
//! │   RecordParser -> RawTree -> typed records -> snapshot swap     │
//! │   positions: ArcSwap<Slot>     sightings: ArcSwap<Slot>         │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use iss_tracker::{DatasetKind, DatasetStore};
//!
//! let store = DatasetStore::new();
//! let raw = std::fs::read("data/XMLsightingData_citiesUSA06.xml").unwrap();
//! let count = store.load(DatasetKind::Sightings, &raw).unwrap();
//! println!("installed {count} sightings");
//!
//! let countries = store.countries().unwrap();
//! let regions = store.regions_for(&countries[0]).unwrap();
//! ```

pub mod config;
pub mod dataset;
pub mod error;
pub mod loader;
pub mod markup;
pub mod retrieval;

#[cfg(feature = "server")]
pub mod api;

// Re-export main types
pub use config::{AppConfig, ConfigError, SourceLocation};
pub use dataset::{
    DatasetKind, DatasetStatus, DatasetStore, LoadState, PositionRecord, SightingRecord,
    Snapshot, StateComponent, StoreStatus,
};
pub use error::{ParseError, StoreError, StoreResult};
pub use loader::{DatasetLoader, LoadError, LoadReport};
pub use markup::{RawTree, RecordParser, XmlTreeParser};
pub use retrieval::{DefaultFetcher, RetrievalError, SourceFetcher};
