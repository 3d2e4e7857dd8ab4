// Feed service - read side of the published feeds, backing the HTTP layer
use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::commit::CommitId;
use crate::domain::series::{CommitRecord, CommitSummary};

/// Where the published feeds live. The ingest side writes them, the
/// server reads them back out.
#[async_trait]
pub trait FeedStore: Send + Sync {
    /// All summaries, feed order. An absent feed reads as empty.
    async fn load_summary(&self) -> anyhow::Result<Vec<CommitSummary>>;

    async fn load_record(&self, key: &CommitId) -> anyhow::Result<Option<CommitRecord>>;

    async fn write_summary(&self, summaries: &[CommitSummary]) -> anyhow::Result<()>;

    async fn write_record(&self, record: &CommitRecord) -> anyhow::Result<()>;
}

#[derive(Clone)]
pub struct FeedService {
    store: Arc<dyn FeedStore>,
}

impl FeedService {
    pub fn new(store: Arc<dyn FeedStore>) -> Self {
        FeedService { store }
    }

    pub async fn summary(&self) -> anyhow::Result<Vec<CommitSummary>> {
        self.store.load_summary().await
    }

    /// Look up one commit by the hash given in the URL. Anything that is
    /// not a plausible hash is treated as absent rather than an error.
    pub async fn detail(&self, hash: &str) -> anyhow::Result<Option<CommitRecord>> {
        let key = match CommitId::parse(hash) {
            Ok(key) => key,
            Err(error) => {
                tracing::warn!(hash, %error, "rejected detail request");
                return Ok(None);
            }
        };
        self.store.load_record(&key).await
    }
}
