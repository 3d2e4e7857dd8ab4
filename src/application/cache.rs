// Series cache - session-lifetime memoization of fetched series
use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::commit::CommitId;
use crate::domain::series::SeriesData;

use super::provider::{FetchError, SeriesProvider};

/// Fetched series, kept for the whole session. Entries are immutable and
/// shared; there is no eviction and no caching of failures, so a failed
/// fetch is simply retried the next time the commit is requested.
#[derive(Debug, Default)]
pub struct SeriesCache {
    entries: HashMap<CommitId, Arc<SeriesData>>,
}

impl SeriesCache {
    pub fn new() -> Self {
        SeriesCache {
            entries: HashMap::new(),
        }
    }

    pub fn contains(&self, key: &CommitId) -> bool {
        self.entries.contains_key(key)
    }

    pub fn get(&self, key: &CommitId) -> Option<Arc<SeriesData>> {
        self.entries.get(key).cloned()
    }

    /// Store a fetched series. If the key is already present the existing
    /// entry wins, so shared handles stay stable.
    pub fn insert(&mut self, data: SeriesData) -> Arc<SeriesData> {
        self.entries
            .entry(data.key.clone())
            .or_insert_with(|| Arc::new(data))
            .clone()
    }

    pub async fn get_or_fetch(
        &mut self,
        key: &CommitId,
        provider: &dyn SeriesProvider,
    ) -> Result<Arc<SeriesData>, FetchError> {
        if let Some(hit) = self.entries.get(key) {
            tracing::debug!(%key, "series cache hit");
            return Ok(hit.clone());
        }
        let record = provider.fetch_series(key).await?;
        tracing::debug!(%key, samples = record.memory_data.len(), "series fetched");
        Ok(self.insert(SeriesData::from_record(record)))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use crate::domain::series::{CommitRecord, CommitSummary, SamplePoint};

    use super::*;

    struct CountingProvider {
        calls: AtomicUsize,
        fail_first: AtomicUsize,
    }

    impl CountingProvider {
        fn new(failures: usize) -> Self {
            CountingProvider {
                calls: AtomicUsize::new(0),
                fail_first: AtomicUsize::new(failures),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl SeriesProvider for CountingProvider {
        async fn fetch_summary(&self) -> Result<Vec<CommitSummary>, FetchError> {
            Ok(vec![])
        }

        async fn fetch_series(&self, key: &CommitId) -> Result<CommitRecord, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_first.load(Ordering::SeqCst) > 0 {
                self.fail_first.fetch_sub(1, Ordering::SeqCst);
                return Err(FetchError::Transport("connection reset".to_string()));
            }
            Ok(CommitRecord {
                summary: CommitSummary {
                    timestamp: 1400000000,
                    hash: key.clone(),
                    max_memory: 2048.0,
                    cpu_time: None,
                    pull_request: None,
                },
                memory_data: vec![SamplePoint::new(0.0, 1.0), SamplePoint::new(1.0, 2048.0)],
                pass_timing: vec![],
            })
        }
    }

    fn key(hash: &str) -> CommitId {
        CommitId::parse(hash).unwrap()
    }

    #[tokio::test]
    async fn test_second_request_is_a_hit() {
        let provider = CountingProvider::new(0);
        let mut cache = SeriesCache::new();
        let k = key("ab34fe017cd8");
        let first = cache.get_or_fetch(&k, &provider).await.unwrap();
        let second = cache.get_or_fetch(&k, &provider).await.unwrap();
        assert_eq!(provider.calls(), 1);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn test_failures_are_not_cached() {
        let provider = CountingProvider::new(1);
        let mut cache = SeriesCache::new();
        let k = key("ab34fe017cd8");
        assert!(cache.get_or_fetch(&k, &provider).await.is_err());
        assert!(!cache.contains(&k));
        let retried = cache.get_or_fetch(&k, &provider).await.unwrap();
        assert_eq!(retried.key, k);
        assert_eq!(provider.calls(), 2);
        assert!(cache.contains(&k));
    }

    #[tokio::test]
    async fn test_insert_keeps_first_entry() {
        let provider = CountingProvider::new(0);
        let mut cache = SeriesCache::new();
        let k = key("ab34fe017cd8");
        let first = cache.get_or_fetch(&k, &provider).await.unwrap();
        let record = provider.fetch_series(&k).await.unwrap();
        let again = cache.insert(SeriesData::from_record(record));
        assert!(Arc::ptr_eq(&first, &again));
        assert_eq!(cache.len(), 1);
    }
}
