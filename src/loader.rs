//! Dataset loader: fetch raw bytes for a configured source and install them
//!
//! The loader is the only place retrieval and the store meet. Each dataset is
//! installed independently; a failure for one leaves the other untouched.

use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;

use crate::config::{AppConfig, SourceLocation};
use crate::dataset::{DatasetKind, DatasetStore};
use crate::error::ParseError;
use crate::retrieval::{DefaultFetcher, RetrievalError, SourceFetcher};

/// Errors from a fetch-and-load cycle
#[derive(Debug, Error)]
pub enum LoadError {
    #[error(transparent)]
    Retrieval(#[from] RetrievalError),

    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// Record counts installed by `reload_all`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    pub positions: usize,
    pub sightings: usize,
}

/// Fetches configured sources into a shared `DatasetStore`
pub struct DatasetLoader {
    store: Arc<DatasetStore>,
    fetcher: Arc<dyn SourceFetcher>,
    position_source: SourceLocation,
    sighting_source: SourceLocation,
}

impl DatasetLoader {
    pub fn new(
        store: Arc<DatasetStore>,
        fetcher: Arc<dyn SourceFetcher>,
        position_source: SourceLocation,
        sighting_source: SourceLocation,
    ) -> Self {
        Self {
            store,
            fetcher,
            position_source,
            sighting_source,
        }
    }

    /// Loader using `DefaultFetcher` and the sources in `config`.
    pub fn from_config(store: Arc<DatasetStore>, config: &AppConfig) -> Result<Self, RetrievalError> {
        let fetcher = DefaultFetcher::new(config.fetch_timeout())?;
        Ok(Self::new(
            store,
            Arc::new(fetcher),
            config.position_source.clone(),
            config.sighting_source.clone(),
        ))
    }

    pub fn store(&self) -> &Arc<DatasetStore> {
        &self.store
    }

    pub fn source(&self, kind: DatasetKind) -> &SourceLocation {
        match kind {
            DatasetKind::Positions => &self.position_source,
            DatasetKind::Sightings => &self.sighting_source,
        }
    }

    /// Fetch and install one dataset. Returns the record count.
    pub async fn reload(&self, kind: DatasetKind) -> Result<usize, LoadError> {
        let source = self.source(kind);
        tracing::info!(dataset = %kind, source = %source, "reloading dataset");

        let raw = self.fetcher.fetch(source).await.map_err(|err| {
            tracing::warn!(dataset = %kind, error = %err, "source retrieval failed");
            err
        })?;
        let count = self.store.load(kind, &raw)?;
        Ok(count)
    }

    /// Reload positions, then sightings. Stops at the first failure; a
    /// dataset installed before the failure stays installed.
    pub async fn reload_all(&self) -> Result<LoadReport, LoadError> {
        let positions = self.reload(DatasetKind::Positions).await?;
        let sightings = self.reload(DatasetKind::Sightings).await?;
        Ok(LoadReport {
            positions,
            sightings,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::path::PathBuf;

    use crate::dataset::LoadState;

    /// In-memory fetcher keyed by the location's display string.
    struct MapFetcher {
        files: HashMap<String, Vec<u8>>,
    }

    #[async_trait]
    impl SourceFetcher for MapFetcher {
        async fn fetch(&self, location: &SourceLocation) -> Result<Vec<u8>, RetrievalError> {
            self.files
                .get(&location.to_string())
                .cloned()
                .ok_or_else(|| RetrievalError::Io {
                    path: PathBuf::from(location.to_string()),
                    source: std::io::Error::from(std::io::ErrorKind::NotFound),
                })
        }
    }

    const POSITIONS: &str = "<ndm><oem><body><segment><data>\
        <stateVector><EPOCH>2022-042T12:00:00.000Z</EPOCH>\
        <X>1</X><Y>2</Y><Z>3</Z><X_DOT>4</X_DOT><Y_DOT>5</Y_DOT><Z_DOT>6</Z_DOT></stateVector>\
        <stateVector><EPOCH>2022-042T12:04:00.000Z</EPOCH>\
        <X>1</X><Y>2</Y><Z>3</Z><X_DOT>4</X_DOT><Y_DOT>5</Y_DOT><Z_DOT>6</Z_DOT></stateVector>\
        </data></segment></body></oem></ndm>";

    const SIGHTINGS: &str = "<visible_passes><visible_pass>\
        <country>United_States</country><region>Ohio</region><city>Dayton</city>\
        </visible_pass></visible_passes>";

    fn loader(files: &[(&str, &str)]) -> DatasetLoader {
        let fetcher = MapFetcher {
            files: files
                .iter()
                .map(|(k, v)| (k.to_string(), v.as_bytes().to_vec()))
                .collect(),
        };
        DatasetLoader::new(
            Arc::new(DatasetStore::new()),
            Arc::new(fetcher),
            SourceLocation::from("oem.xml"),
            SourceLocation::from("https://example.com/sightings.xml"),
        )
    }

    #[tokio::test]
    async fn test_reload_all() {
        let loader = loader(&[
            ("oem.xml", POSITIONS),
            ("https://example.com/sightings.xml", SIGHTINGS),
        ]);
        let report = loader.reload_all().await.unwrap();
        assert_eq!(
            report,
            LoadReport {
                positions: 2,
                sightings: 1
            }
        );
        assert_eq!(loader.store().countries().unwrap(), vec!["United_States"]);
    }

    #[tokio::test]
    async fn test_retrieval_failure_leaves_store_untouched() {
        let loader = loader(&[("oem.xml", POSITIONS)]);
        let err = loader.reload_all().await.unwrap_err();
        assert!(matches!(err, LoadError::Retrieval(RetrievalError::Io { .. })));

        let store = loader.store();
        assert_eq!(store.state(DatasetKind::Positions), LoadState::Loaded);
        assert_eq!(store.state(DatasetKind::Sightings), LoadState::NeverLoaded);
    }

    #[tokio::test]
    async fn test_parse_failure_is_reported() {
        let loader = loader(&[("oem.xml", "<ndm><oem/></ndm>")]);
        let err = loader.reload(DatasetKind::Positions).await.unwrap_err();
        assert!(matches!(
            err,
            LoadError::Parse(ParseError::UnexpectedSchema { .. })
        ));
    }

    #[test]
    fn test_from_config_uses_configured_sources() {
        let config = AppConfig::default();
        let loader = DatasetLoader::from_config(Arc::new(DatasetStore::new()), &config).unwrap();
        assert_eq!(loader.source(DatasetKind::Positions), &config.position_source);
        assert_eq!(loader.source(DatasetKind::Sightings), &config.sighting_source);
    }
}
