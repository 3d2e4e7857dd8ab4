// Disk feed store - the published out/ directory of JSON feeds
use std::path::{Path, PathBuf};

use anyhow::Context;
use async_trait::async_trait;
use tokio::fs;

use crate::application::feed_service::FeedStore;
use crate::application::provider::{FetchError, SeriesProvider};
use crate::domain::commit::CommitId;
use crate::domain::series::{CommitRecord, CommitSummary};

const SUMMARY_FILE: &str = "summary.json";

/// Feeds laid out as flat files: `summary.json` plus one `<hash>.json`
/// per commit, exactly what the HTTP layer serves.
#[derive(Debug, Clone)]
pub struct DiskFeedStore {
    out_dir: PathBuf,
}

impl DiskFeedStore {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        DiskFeedStore {
            out_dir: out_dir.into(),
        }
    }

    fn summary_path(&self) -> PathBuf {
        self.out_dir.join(SUMMARY_FILE)
    }

    fn record_path(&self, key: &CommitId) -> PathBuf {
        self.out_dir.join(format!("{}.json", key.as_str()))
    }

    async fn read_optional(path: &Path) -> std::io::Result<Option<Vec<u8>>> {
        match fs::read(path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(error) => Err(error),
        }
    }
}

#[async_trait]
impl FeedStore for DiskFeedStore {
    async fn load_summary(&self) -> anyhow::Result<Vec<CommitSummary>> {
        let path = self.summary_path();
        match Self::read_optional(&path)
            .await
            .with_context(|| format!("reading {}", path.display()))?
        {
            Some(bytes) => serde_json::from_slice(&bytes)
                .with_context(|| format!("parsing {}", path.display())),
            None => Ok(vec![]),
        }
    }

    async fn load_record(&self, key: &CommitId) -> anyhow::Result<Option<CommitRecord>> {
        let path = self.record_path(key);
        match Self::read_optional(&path)
            .await
            .with_context(|| format!("reading {}", path.display()))?
        {
            Some(bytes) => Ok(Some(
                serde_json::from_slice(&bytes)
                    .with_context(|| format!("parsing {}", path.display()))?,
            )),
            None => Ok(None),
        }
    }

    async fn write_summary(&self, summaries: &[CommitSummary]) -> anyhow::Result<()> {
        fs::create_dir_all(&self.out_dir)
            .await
            .with_context(|| format!("creating {}", self.out_dir.display()))?;
        let text = serde_json::to_string(summaries)?;
        // one commit per line, so feed diffs stay small
        let text = text.replace('{', "\n{").replace(']', "\n]");
        let path = self.summary_path();
        fs::write(&path, text)
            .await
            .with_context(|| format!("writing {}", path.display()))
    }

    async fn write_record(&self, record: &CommitRecord) -> anyhow::Result<()> {
        fs::create_dir_all(&self.out_dir)
            .await
            .with_context(|| format!("creating {}", self.out_dir.display()))?;
        let path = self.record_path(&record.summary.hash);
        let bytes = serde_json::to_vec(record)?;
        fs::write(&path, bytes)
            .await
            .with_context(|| format!("writing {}", path.display()))
    }
}

// Serving a dashboard straight off the local out/ directory.
#[async_trait]
impl SeriesProvider for DiskFeedStore {
    async fn fetch_summary(&self) -> Result<Vec<CommitSummary>, FetchError> {
        let path = self.summary_path();
        match Self::read_optional(&path)
            .await
            .map_err(|source| FetchError::Io {
                path: path.clone(),
                source,
            })? {
            Some(bytes) => serde_json::from_slice(&bytes)
                .map_err(|error| FetchError::Payload(error.to_string())),
            None => Ok(vec![]),
        }
    }

    async fn fetch_series(&self, key: &CommitId) -> Result<CommitRecord, FetchError> {
        let path = self.record_path(key);
        let bytes = Self::read_optional(&path)
            .await
            .map_err(|source| FetchError::Io {
                path: path.clone(),
                source,
            })?
            .ok_or_else(|| FetchError::NotFound(key.clone()))?;
        serde_json::from_slice(&bytes).map_err(|error| FetchError::Payload(error.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use crate::domain::series::{PassTiming, SamplePoint};

    use super::*;

    fn temp_store(tag: &str) -> DiskFeedStore {
        let dir = std::env::temp_dir().join(format!(
            "build-telemetry-store-{tag}-{}",
            std::process::id()
        ));
        let _ = std::fs::remove_dir_all(&dir);
        DiskFeedStore::new(dir)
    }

    fn record(hash: &str) -> CommitRecord {
        CommitRecord {
            summary: CommitSummary {
                timestamp: 1400000000,
                hash: CommitId::parse(hash).unwrap(),
                max_memory: 4096.0,
                cpu_time: Some(11.5),
                pull_request: Some(13921),
            },
            memory_data: vec![SamplePoint::new(0.0, 1.0), SamplePoint::new(2.0, 4096.0)],
            pass_timing: vec![PassTiming {
                name: "parsing".to_string(),
                seconds: 0.456,
            }],
        }
    }

    #[tokio::test]
    async fn test_absent_feeds_read_as_empty() {
        let store = temp_store("absent");
        assert!(store.load_summary().await.unwrap().is_empty());
        let key = CommitId::parse("ab34fe017cd8").unwrap();
        assert!(store.load_record(&key).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_record_round_trip() {
        let store = temp_store("record");
        let written = record("ab34fe017cd8");
        store.write_record(&written).await.unwrap();

        let loaded = store
            .load_record(&written.summary.hash)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(loaded, written);

        std::fs::remove_dir_all(&store.out_dir).unwrap();
    }

    #[tokio::test]
    async fn test_summary_is_written_one_commit_per_line() {
        let store = temp_store("summary");
        let summaries = vec![
            record("aa11fe017cd8").summary,
            record("bb22fe017cd8").summary,
        ];
        store.write_summary(&summaries).await.unwrap();

        let text = std::fs::read_to_string(store.summary_path()).unwrap();
        assert_eq!(text.matches('\n').count(), 3);
        let loaded = store.load_summary().await.unwrap();
        assert_eq!(loaded, summaries);

        std::fs::remove_dir_all(&store.out_dir).unwrap();
    }

    #[tokio::test]
    async fn test_provider_view_of_the_store() {
        let store = temp_store("provider");
        let written = record("ab34fe017cd8");
        store.write_record(&written).await.unwrap();
        store.write_summary(&[written.summary.clone()]).await.unwrap();

        let summaries = store.fetch_summary().await.unwrap();
        assert_eq!(summaries.len(), 1);
        let fetched = store.fetch_series(&written.summary.hash).await.unwrap();
        assert_eq!(fetched, written);

        let missing = CommitId::parse("39e7ba176bbf").unwrap();
        assert!(matches!(
            store.fetch_series(&missing).await,
            Err(FetchError::NotFound(_))
        ));

        std::fs::remove_dir_all(&store.out_dir).unwrap();
    }
}
