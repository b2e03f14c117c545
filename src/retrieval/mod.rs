//! Source retrieval
//!
//! Fetches raw dataset bytes from a file or URL. Nothing here knows about
//! records; the bytes go straight to `DatasetStore::load`.

use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::config::SourceLocation;

/// Errors raised while acquiring raw source bytes
#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("Request to {url} failed: {source}")]
    Http {
        url: String,
        source: reqwest::Error,
    },

    #[error("{url} responded with status {status}")]
    Status { url: String, status: u16 },

    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Fetches the raw bytes behind a `SourceLocation`
#[async_trait]
pub trait SourceFetcher: Send + Sync {
    async fn fetch(&self, location: &SourceLocation) -> Result<Vec<u8>, RetrievalError>;
}

/// Reads files with `tokio::fs` and URLs with `reqwest`
#[derive(Clone)]
pub struct DefaultFetcher {
    client: reqwest::Client,
}

impl DefaultFetcher {
    pub fn new(timeout: Duration) -> Result<Self, RetrievalError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(RetrievalError::Client)?;
        Ok(Self { client })
    }
}

#[async_trait]
impl SourceFetcher for DefaultFetcher {
    async fn fetch(&self, location: &SourceLocation) -> Result<Vec<u8>, RetrievalError> {
        match location {
            SourceLocation::File(path) => {
                tracing::debug!(path = %path.display(), "reading source file");
                tokio::fs::read(path)
                    .await
                    .map_err(|source| RetrievalError::Io {
                        path: path.clone(),
                        source,
                    })
            }
            SourceLocation::Url(url) => {
                tracing::debug!(url = %url, "requesting source");
                let http_err = |source: reqwest::Error| RetrievalError::Http {
                    url: url.clone(),
                    source,
                };

                let response = self.client.get(url).send().await.map_err(http_err)?;
                let status = response.status();
                if !status.is_success() {
                    return Err(RetrievalError::Status {
                        url: url.clone(),
                        status: status.as_u16(),
                    });
                }

                let body = response.bytes().await.map_err(http_err)?;
                tracing::debug!(url = %url, bytes = body.len(), "response received");
                Ok(body.to_vec())
            }
        }
    }
}
