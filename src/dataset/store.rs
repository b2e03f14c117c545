//! The dataset store
//!
//! Each dataset lives in an `ArcSwap<Slot<_>>`. A load parses and normalizes
//! the whole document first; only a fully built snapshot is published, with a
//! single `store`. Readers `load()` the slot without taking any lock.
//!
//! A failed load records the failure in the slot but carries the previous
//! snapshot over untouched, so queries keep answering from the last good data.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwap;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::dataset::records::{extract_records, DatasetRecord, PositionRecord, SightingRecord};
use crate::dataset::snapshot::Snapshot;
use crate::dataset::DatasetKind;
use crate::error::{ParseError, StoreError, StoreResult};
use crate::markup::{RawTree, RecordParser, XmlTreeParser};

/// Load status of one dataset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadState {
    /// No load has succeeded yet. Queries fail with `StoreError::NotLoaded`.
    NeverLoaded,
    /// The last load succeeded.
    Loaded,
    /// The last load failed. The previous snapshot, if any, is still served.
    LoadFailed,
}

/// Published state of one dataset.
struct Slot<T> {
    state: LoadState,
    snapshot: Option<Arc<Snapshot<T>>>,
    last_error: Option<ParseError>,
}

impl<T> Slot<T> {
    fn empty() -> Self {
        Self {
            state: LoadState::NeverLoaded,
            snapshot: None,
            last_error: None,
        }
    }

    fn loaded(snapshot: Snapshot<T>) -> Self {
        Self {
            state: LoadState::Loaded,
            snapshot: Some(Arc::new(snapshot)),
            last_error: None,
        }
    }

    fn failed(&self, error: &ParseError) -> Self {
        Self {
            state: LoadState::LoadFailed,
            snapshot: self.snapshot.clone(),
            last_error: Some(error.clone()),
        }
    }

    fn status(&self, dataset: DatasetKind) -> DatasetStatus {
        DatasetStatus {
            dataset,
            state: self.state,
            records: self.snapshot.as_ref().map(|s| s.len()).unwrap_or(0),
            generation: self.snapshot.as_ref().map(|s| s.generation()),
            loaded_at: self.snapshot.as_ref().map(|s| s.loaded_at()),
            last_error: self.last_error.as_ref().map(|e| e.to_string()),
        }
    }
}

/// Status report for one dataset
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetStatus {
    pub dataset: DatasetKind,
    pub state: LoadState,
    /// Records in the snapshot currently served
    pub records: usize,
    pub generation: Option<u64>,
    pub loaded_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

/// Status report for both datasets
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoreStatus {
    pub positions: DatasetStatus,
    pub sightings: DatasetStatus,
}

/// In-memory store for the position and sighting datasets
///
/// Construct one per process (or per test) and share it behind an `Arc`.
pub struct DatasetStore {
    parser: Arc<dyn RecordParser>,
    positions: ArcSwap<Slot<PositionRecord>>,
    sightings: ArcSwap<Slot<SightingRecord>>,
    generation: AtomicU64,
}

impl Default for DatasetStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DatasetStore {
    /// Create an empty store that parses XML.
    pub fn new() -> Self {
        Self::with_parser(Arc::new(XmlTreeParser::new()))
    }

    /// Create an empty store with a custom record parser.
    pub fn with_parser(parser: Arc<dyn RecordParser>) -> Self {
        Self {
            parser,
            positions: ArcSwap::from_pointee(Slot::empty()),
            sightings: ArcSwap::from_pointee(Slot::empty()),
            generation: AtomicU64::new(0),
        }
    }

    // ── Load ──

    /// Parse `raw` and replace the `kind` dataset with its records.
    ///
    /// Returns the number of records installed. On error the dataset keeps
    /// serving its previous snapshot.
    pub fn load(&self, kind: DatasetKind, raw: &[u8]) -> Result<usize, ParseError> {
        match self.parser.parse(raw) {
            Ok(tree) => self.load_tree(kind, &tree),
            Err(err) => {
                self.record_failure(kind, &err);
                Err(err)
            }
        }
    }

    /// Replace the `kind` dataset with the records of an already parsed tree.
    pub fn load_tree(&self, kind: DatasetKind, tree: &RawTree) -> Result<usize, ParseError> {
        match kind {
            DatasetKind::Positions => self.install(&self.positions, tree),
            DatasetKind::Sightings => self.install(&self.sightings, tree),
        }
    }

    fn install<T: DatasetRecord>(
        &self,
        slot: &ArcSwap<Slot<T>>,
        tree: &RawTree,
    ) -> Result<usize, ParseError> {
        let records = match extract_records::<T>(tree) {
            Ok(records) => records,
            Err(err) => {
                self.record_failure(T::KIND, &err);
                return Err(err);
            }
        };

        let kind = T::KIND;
        let count = records.len();
        let generation = self.generation.fetch_add(1, Ordering::Relaxed) + 1;
        slot.store(Arc::new(Slot::loaded(Snapshot::new(records, generation))));

        tracing::info!(
            dataset = %kind,
            records = count,
            generation,
            "dataset snapshot installed"
        );
        Ok(count)
    }

    fn record_failure(&self, kind: DatasetKind, err: &ParseError) {
        tracing::warn!(dataset = %kind, error = %err, "dataset load failed, keeping previous snapshot");
        match kind {
            DatasetKind::Positions => {
                self.positions.rcu(|current| current.failed(err));
            }
            DatasetKind::Sightings => {
                self.sightings.rcu(|current| current.failed(err));
            }
        }
    }

    // ── Status ──

    pub fn state(&self, kind: DatasetKind) -> LoadState {
        match kind {
            DatasetKind::Positions => self.positions.load().state,
            DatasetKind::Sightings => self.sightings.load().state,
        }
    }

    pub fn status(&self) -> StoreStatus {
        StoreStatus {
            positions: self.positions.load().status(DatasetKind::Positions),
            sightings: self.sightings.load().status(DatasetKind::Sightings),
        }
    }

    // ── Pinned snapshots ──

    /// Current position snapshot.
    pub fn positions(&self) -> StoreResult<Arc<Snapshot<PositionRecord>>> {
        self.positions
            .load()
            .snapshot
            .clone()
            .ok_or(StoreError::NotLoaded(DatasetKind::Positions))
    }

    /// Current sighting snapshot.
    pub fn sightings(&self) -> StoreResult<Arc<Snapshot<SightingRecord>>> {
        self.sightings
            .load()
            .snapshot
            .clone()
            .ok_or(StoreError::NotLoaded(DatasetKind::Sightings))
    }

    // ── Position queries ──

    pub fn all_positions(&self) -> StoreResult<Vec<PositionRecord>> {
        Ok(self.positions()?.records().to_vec())
    }

    pub fn position_by_epoch(&self, epoch: &str) -> StoreResult<Vec<PositionRecord>> {
        let snapshot = self.positions()?;
        Ok(snapshot.by_epoch(epoch).into_iter().cloned().collect())
    }

    // ── Sighting queries ──

    pub fn all_sightings(&self) -> StoreResult<Vec<SightingRecord>> {
        Ok(self.sightings()?.records().to_vec())
    }

    pub fn countries(&self) -> StoreResult<Vec<String>> {
        let snapshot = self.sightings()?;
        Ok(owned(snapshot.countries()))
    }

    pub fn by_country(&self, country: &str) -> StoreResult<Vec<SightingRecord>> {
        let snapshot = self.sightings()?;
        Ok(snapshot.by_country(country).into_iter().cloned().collect())
    }

    pub fn regions_for(&self, country: &str) -> StoreResult<Vec<String>> {
        let snapshot = self.sightings()?;
        Ok(owned(snapshot.regions_for(country)))
    }

    pub fn by_region(&self, region: &str) -> StoreResult<Vec<SightingRecord>> {
        let snapshot = self.sightings()?;
        Ok(snapshot.by_region(region).into_iter().cloned().collect())
    }

    pub fn cities_for(&self, country: &str, region: &str) -> StoreResult<Vec<String>> {
        let snapshot = self.sightings()?;
        Ok(owned(snapshot.cities_for(country, region)))
    }

    pub fn by_city(&self, city: &str) -> StoreResult<Vec<SightingRecord>> {
        let snapshot = self.sightings()?;
        Ok(snapshot.by_city(city).into_iter().cloned().collect())
    }
}

fn owned(values: Vec<&str>) -> Vec<String> {
    values.into_iter().map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const POSITIONS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<ndm>
  <oem id="CCSDS_OEM_VERS" version="2.0">
    <body>
      <segment>
        <metadata><OBJECT_NAME>ISS</OBJECT_NAME></metadata>
        <data>
          <stateVector>
            <EPOCH>2022-042T12:00:00.000Z</EPOCH>
            <X units="km">-5097.51</X>
            <Y units="km">1610.39</Y>
            <Z units="km">-4002.41</Z>
            <X_DOT units="km/s">-4.5</X_DOT>
            <Y_DOT units="km/s">-5.2</Y_DOT>
            <Z_DOT units="km/s">3.1</Z_DOT>
          </stateVector>
        </data>
      </segment>
    </body>
  </oem>
</ndm>"#;

    fn sightings_xml(passes: &[(&str, &str, &str)]) -> String {
        let mut xml = String::from("<visible_passes>");
        for (country, region, city) in passes {
            xml.push_str(&format!(
                "<visible_pass><country>{country}</country><region>{region}</region>\
                 <city>{city}</city><spacecraft>ISS</spacecraft>\
                 <max_elevation>42</max_elevation></visible_pass>"
            ));
        }
        xml.push_str("</visible_passes>");
        xml
    }

    #[test]
    fn test_queries_before_load_are_not_loaded() {
        let store = DatasetStore::new();
        let not_positions = Err(StoreError::NotLoaded(DatasetKind::Positions));
        let not_sightings = Err(StoreError::NotLoaded(DatasetKind::Sightings));

        assert_eq!(store.all_positions(), not_positions.clone());
        assert_eq!(store.position_by_epoch("x"), not_positions);
        assert_eq!(store.all_sightings(), not_sightings.clone());
        assert_eq!(store.by_country("x"), not_sightings.clone());
        assert_eq!(store.by_region("x"), not_sightings.clone());
        assert_eq!(store.by_city("x"), not_sightings.clone());
        assert_eq!(
            store.countries(),
            Err(StoreError::NotLoaded(DatasetKind::Sightings))
        );
        assert_eq!(
            store.regions_for("x"),
            Err(StoreError::NotLoaded(DatasetKind::Sightings))
        );
        assert_eq!(
            store.cities_for("x", "y"),
            Err(StoreError::NotLoaded(DatasetKind::Sightings))
        );
        assert_eq!(store.state(DatasetKind::Positions), LoadState::NeverLoaded);
    }

    #[test]
    fn test_single_position_record_lookup() {
        let store = DatasetStore::new();
        assert_eq!(
            store.load(DatasetKind::Positions, POSITIONS_XML.as_bytes()),
            Ok(1)
        );

        let found = store.position_by_epoch("2022-042T12:00:00.000Z").unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].position[1].value, 1610.39);
        assert!(store.position_by_epoch("bogus").unwrap().is_empty());
    }

    #[test]
    fn test_cities_for_first_occurrence_order() {
        let store = DatasetStore::new();
        let xml = sightings_xml(&[
            ("United_States", "Massachusetts", "Flemington"),
            ("United_States", "Massachusetts", "Boston"),
        ]);
        store.load(DatasetKind::Sightings, xml.as_bytes()).unwrap();

        assert_eq!(
            store.cities_for("United_States", "Massachusetts").unwrap(),
            vec!["Flemington", "Boston"]
        );
    }

    #[test]
    fn test_unknown_filter_after_load_is_empty_not_error() {
        let store = DatasetStore::new();
        let xml = sightings_xml(&[("United_States", "Ohio", "Dayton")]);
        store.load(DatasetKind::Sightings, xml.as_bytes()).unwrap();

        assert_eq!(store.by_country("Atlantis"), Ok(vec![]));
        assert_eq!(store.regions_for("Atlantis"), Ok(vec![]));
        assert_eq!(store.cities_for("United_States", "Texas"), Ok(vec![]));
        assert_eq!(store.by_city("Nowhere"), Ok(vec![]));
    }

    #[test]
    fn test_failed_load_keeps_previous_snapshot() {
        let store = DatasetStore::new();
        let xml = sightings_xml(&[("Canada", "Ontario", "Ottawa")]);
        store.load(DatasetKind::Sightings, xml.as_bytes()).unwrap();
        let before = store.all_sightings().unwrap();

        let err = store
            .load(DatasetKind::Sightings, b"<visible_passes><oops/></visible_passes>")
            .unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedSchema { .. }));

        assert_eq!(store.all_sightings().unwrap(), before);
        assert_eq!(store.state(DatasetKind::Sightings), LoadState::LoadFailed);
        let status = store.status().sightings;
        assert_eq!(status.records, 1);
        assert!(status.last_error.is_some());
    }

    #[test]
    fn test_nested_filter_key_fails_the_load() {
        let store = DatasetStore::new();
        let xml = "<visible_passes><visible_pass><country>A</country><region>r</region>\
                   <city><name>X</name></city></visible_pass></visible_passes>";
        let err = store.load(DatasetKind::Sightings, xml.as_bytes()).unwrap_err();
        assert!(matches!(err, ParseError::InvalidField { ref key, .. } if key == "city"));
        assert_eq!(
            store.cities_for("A", "r"),
            Err(StoreError::NotLoaded(DatasetKind::Sightings))
        );
    }

    #[test]
    fn test_failed_first_load_is_still_not_loaded() {
        let store = DatasetStore::new();
        let err = store
            .load(DatasetKind::Positions, b"<ndm><oem>")
            .unwrap_err();
        assert!(matches!(err, ParseError::Markup(_)));
        assert_eq!(store.state(DatasetKind::Positions), LoadState::LoadFailed);
        assert_eq!(
            store.all_positions(),
            Err(StoreError::NotLoaded(DatasetKind::Positions))
        );
    }

    #[test]
    fn test_loading_one_dataset_leaves_the_other_alone() {
        let store = DatasetStore::new();
        store
            .load(DatasetKind::Positions, POSITIONS_XML.as_bytes())
            .unwrap();
        assert_eq!(store.state(DatasetKind::Sightings), LoadState::NeverLoaded);

        let xml = sightings_xml(&[("Canada", "Ontario", "Ottawa")]);
        store.load(DatasetKind::Sightings, xml.as_bytes()).unwrap();
        assert_eq!(store.all_positions().unwrap().len(), 1);
    }

    #[test]
    fn test_reload_replaces_wholesale_and_bumps_generation() {
        let store = DatasetStore::new();
        let first = sightings_xml(&[("Canada", "Ontario", "Ottawa")]);
        let second = sightings_xml(&[
            ("Mexico", "Jalisco", "Guadalajara"),
            ("Mexico", "Jalisco", "Zapopan"),
        ]);

        store.load(DatasetKind::Sightings, first.as_bytes()).unwrap();
        let pinned = store.sightings().unwrap();
        store.load(DatasetKind::Sightings, second.as_bytes()).unwrap();

        assert_eq!(store.countries().unwrap(), vec!["Mexico"]);
        assert_eq!(pinned.countries(), vec!["Canada"]);
        assert!(store.sightings().unwrap().generation() > pinned.generation());
    }

    #[test]
    fn test_load_tree_accepts_parsed_documents() {
        let store = DatasetStore::new();
        let tree = serde_json::json!({"visible_passes": {"visible_pass": {
            "country": "Canada", "region": "Ontario", "city": "Ottawa"
        }}});
        assert_eq!(store.load_tree(DatasetKind::Sightings, &tree), Ok(1));
        assert_eq!(store.countries().unwrap(), vec!["Canada"]);
    }

    #[test]
    fn test_custom_parser_is_used() {
        struct FixedParser;
        impl RecordParser for FixedParser {
            fn parse(&self, _raw: &[u8]) -> Result<RawTree, ParseError> {
                Ok(serde_json::json!({"visible_passes": {"visible_pass": []}}))
            }
        }

        let store = DatasetStore::with_parser(Arc::new(FixedParser));
        assert_eq!(store.load(DatasetKind::Sightings, b"ignored"), Ok(0));
        assert_eq!(store.all_sightings(), Ok(vec![]));
        assert_eq!(store.state(DatasetKind::Sightings), LoadState::Loaded);
    }

    #[test]
    fn test_concurrent_readers_see_whole_snapshots() {
        let store = Arc::new(DatasetStore::new());
        let small = sightings_xml(&[("A", "r", "c")]);
        let large = sightings_xml(&[("B", "r", "c"); 50]);
        store.load(DatasetKind::Sightings, small.as_bytes()).unwrap();

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    for _ in 0..200 {
                        let snapshot = store.sightings().unwrap();
                        let countries = snapshot.countries();
                        match countries.as_slice() {
                            ["A"] => assert_eq!(snapshot.len(), 1),
                            ["B"] => assert_eq!(snapshot.len(), 50),
                            other => panic!("mixed snapshot: {:?}", other),
                        }
                    }
                })
            })
            .collect();

        for i in 0..50 {
            let xml = if i % 2 == 0 { &large } else { &small };
            store.load(DatasetKind::Sightings, xml.as_bytes()).unwrap();
        }
        for reader in readers {
            reader.join().unwrap();
        }
    }
}
