// Series provider port - where chart data comes from
use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::commit::CommitId;
use crate::domain::series::{CommitRecord, CommitSummary};

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("commit {0} has no detail record")]
    NotFound(CommitId),
    #[error("request failed: {0}")]
    Transport(String),
    #[error("upstream returned status {status} for {url}")]
    Upstream { status: u16, url: String },
    #[error("invalid payload: {0}")]
    Payload(String),
    #[error("could not read {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Read side of the feed, as seen by a chart session host.
#[async_trait]
pub trait SeriesProvider: Send + Sync {
    /// The summary feed, fetched once when a dashboard opens.
    async fn fetch_summary(&self) -> Result<Vec<CommitSummary>, FetchError>;

    /// One commit's full record.
    async fn fetch_series(&self, key: &CommitId) -> Result<CommitRecord, FetchError>;
}
