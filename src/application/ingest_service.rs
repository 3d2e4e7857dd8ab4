// Ingest service - turns raw capture directories into the published feeds
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use futures::future::join_all;

use crate::domain::commit::CommitId;
use crate::domain::series::{CommitRecord, CommitSummary};
use crate::domain::simplify;
use crate::infrastructure::capture::{self, RawCapture};

use super::feed_service::FeedStore;

pub struct IngestService {
    store: Arc<dyn FeedStore>,
    capture_dir: PathBuf,
    simplify_area: f64,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct IngestReport {
    pub processed: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl IngestService {
    pub fn new(
        store: Arc<dyn FeedStore>,
        capture_dir: impl Into<PathBuf>,
        simplify_area: f64,
    ) -> Self {
        IngestService {
            store,
            capture_dir: capture_dir.into(),
            simplify_area,
        }
    }

    /// Process every capture that is not already in the summary feed, then
    /// rewrite the feed. A capture that cannot be parsed is logged and left
    /// out; it does not fail the run.
    pub async fn run(&self) -> anyhow::Result<IngestReport> {
        let mut summaries = self.store.load_summary().await?;
        let done: HashSet<CommitId> = summaries.iter().map(|s| s.hash.clone()).collect();
        let captures = capture::scan_captures(&self.capture_dir).await?;

        let mut report = IngestReport::default();
        let mut tasks = Vec::new();
        for (hash, dir) in captures {
            if done.contains(&hash) {
                report.skipped += 1;
                continue;
            }
            let area = self.simplify_area;
            tasks.push(tokio::spawn(async move {
                let outcome = RawCapture::load(&dir)
                    .await
                    .map(|raw| build_record(hash.clone(), raw, area));
                (hash, outcome)
            }));
        }

        for joined in join_all(tasks).await {
            match joined {
                Ok((hash, Ok(record))) => {
                    self.store.write_record(&record).await?;
                    tracing::info!(%hash, "capture processed");
                    summaries.push(record.summary);
                    report.processed += 1;
                }
                Ok((hash, Err(error))) => {
                    tracing::warn!(%hash, %error, "capture skipped");
                    report.failed += 1;
                }
                Err(error) => {
                    tracing::error!(%error, "capture task aborted");
                    report.failed += 1;
                }
            }
        }

        summaries.sort_by(|a, b| {
            a.timestamp
                .cmp(&b.timestamp)
                .then_with(|| a.hash.cmp(&b.hash))
        });
        self.store.write_summary(&summaries).await?;
        Ok(report)
    }
}

fn build_record(hash: CommitId, raw: RawCapture, simplify_area: f64) -> CommitRecord {
    let samples = simplify::visvalingam(&raw.memory_data, simplify_area);
    tracing::debug!(
        %hash,
        before = raw.memory_data.len(),
        after = samples.len(),
        "memory curve simplified"
    );
    let pass_timing = capture::parse_pass_timings(&raw.stdout);
    CommitRecord {
        summary: CommitSummary {
            timestamp: raw.timestamp,
            hash,
            max_memory: raw.max_memory,
            cpu_time: raw.cpu_time,
            pull_request: raw.pull_request,
        },
        memory_data: samples,
        pass_timing,
    }
}
