//! Immutable dataset snapshots
//!
//! A `Snapshot` is never mutated after construction. Holding an
//! `Arc<Snapshot<_>>` pins one consistent view: several queries against the
//! same handle see the same records even if a reload lands in between.

use chrono::{DateTime, Utc};

use crate::dataset::query::{distinct_in_order, filter_records};
use crate::dataset::records::{PositionRecord, SightingRecord};

/// The records installed by one successful load
#[derive(Debug)]
pub struct Snapshot<T> {
    records: Vec<T>,
    generation: u64,
    loaded_at: DateTime<Utc>,
}

impl<T> Snapshot<T> {
    pub(crate) fn new(records: Vec<T>, generation: u64) -> Self {
        Self {
            records,
            generation,
            loaded_at: Utc::now(),
        }
    }

    /// All records in source order.
    pub fn records(&self) -> &[T] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Store-wide load counter at the time this snapshot was installed.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }
}

impl Snapshot<PositionRecord> {
    /// Every record whose epoch equals `epoch` exactly.
    pub fn by_epoch(&self, epoch: &str) -> Vec<&PositionRecord> {
        filter_records(&self.records, "epoch", |r| r.epoch == epoch)
    }
}

impl Snapshot<SightingRecord> {
    pub fn countries(&self) -> Vec<&str> {
        distinct_in_order(self.records.iter().map(SightingRecord::country))
    }

    pub fn by_country(&self, country: &str) -> Vec<&SightingRecord> {
        filter_records(&self.records, "country", |r| r.country() == country)
    }

    pub fn regions_for(&self, country: &str) -> Vec<&str> {
        distinct_in_order(
            self.by_country(country)
                .into_iter()
                .map(SightingRecord::region),
        )
    }

    /// Matches `region` across all countries.
    pub fn by_region(&self, region: &str) -> Vec<&SightingRecord> {
        filter_records(&self.records, "region", |r| r.region() == region)
    }

    pub fn cities_for(&self, country: &str, region: &str) -> Vec<&str> {
        let matched = filter_records(&self.records, "country+region", |r| {
            r.country() == country && r.region() == region
        });
        distinct_in_order(matched.into_iter().map(SightingRecord::city))
    }

    pub fn by_city(&self, city: &str) -> Vec<&SightingRecord> {
        filter_records(&self.records, "city", |r| r.city() == city)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::records::DatasetRecord;
    use serde_json::json;

    fn sighting(country: &str, region: &str, city: &str) -> SightingRecord {
        SightingRecord::from_node(&json!({
            "country": country,
            "region": region,
            "city": city,
            "spacecraft": "ISS"
        }))
        .unwrap()
    }

    fn sample() -> Snapshot<SightingRecord> {
        Snapshot::new(
            vec![
                sighting("United_States", "Massachusetts", "Flemington"),
                sighting("United_States", "Ohio", "Dayton"),
                sighting("Canada", "Ontario", "Ottawa"),
                sighting("United_States", "Massachusetts", "Boston"),
                sighting("United_States", "Massachusetts", "Flemington"),
                sighting("Mexico", "Ohio", "Nowhere"),
            ],
            1,
        )
    }

    #[test]
    fn test_countries_first_occurrence() {
        assert_eq!(
            sample().countries(),
            vec!["United_States", "Canada", "Mexico"]
        );
    }

    #[test]
    fn test_regions_for_country() {
        let snapshot = sample();
        assert_eq!(
            snapshot.regions_for("United_States"),
            vec!["Massachusetts", "Ohio"]
        );
        assert!(snapshot.regions_for("Atlantis").is_empty());
    }

    #[test]
    fn test_cities_for_country_and_region() {
        assert_eq!(
            sample().cities_for("United_States", "Massachusetts"),
            vec!["Flemington", "Boston"]
        );
    }

    #[test]
    fn test_by_region_is_not_scoped_to_country() {
        let snapshot = sample();
        let matched = snapshot.by_region("Ohio");
        let cities: Vec<&str> = matched.iter().map(|r| r.city()).collect();
        assert_eq!(cities, vec!["Dayton", "Nowhere"]);
    }

    #[test]
    fn test_by_city_returns_every_pass() {
        assert_eq!(sample().by_city("Flemington").len(), 2);
        assert!(sample().by_city("flemington").is_empty());
    }

    #[test]
    fn test_metadata() {
        let snapshot = sample();
        assert_eq!(snapshot.generation(), 1);
        assert_eq!(snapshot.len(), 6);
        assert!(!snapshot.is_empty());
        assert!(snapshot.loaded_at() <= Utc::now());
    }
}
