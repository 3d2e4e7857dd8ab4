// Commit index - the summary feed held resolvable by short form
use std::collections::HashMap;
use std::collections::hash_map::Entry;

use chrono::{DateTime, Utc};

use super::commit::CommitId;
use super::series::CommitSummary;

/// Fraction of the timestamp span added on each side of the overview
/// domain so edge commits do not sit on the frame.
const TIME_EXTENT_PAD: f64 = 0.03;

/// All known commits, in feed order, resolvable by their short form.
#[derive(Debug, Default)]
pub struct CommitIndex {
    summaries: Vec<CommitSummary>,
    by_short: HashMap<String, usize>,
}

impl CommitIndex {
    pub fn new(summaries: Vec<CommitSummary>) -> Self {
        let mut by_short = HashMap::new();
        for (position, summary) in summaries.iter().enumerate() {
            match by_short.entry(summary.hash.short().to_string()) {
                Entry::Vacant(slot) => {
                    slot.insert(position);
                }
                Entry::Occupied(_) => {
                    tracing::warn!(
                        short = summary.hash.short(),
                        hash = %summary.hash,
                        "short form collision in summary feed, keeping the first"
                    );
                }
            }
        }
        CommitIndex {
            summaries,
            by_short,
        }
    }

    /// Resolve a short form (as produced by the selection codec) to its key.
    pub fn resolve(&self, short: &str) -> Option<&CommitId> {
        self.by_short
            .get(short)
            .map(|&position| &self.summaries[position].hash)
    }

    pub fn summary(&self, key: &CommitId) -> Option<&CommitSummary> {
        self.by_short
            .get(key.short())
            .map(|&position| &self.summaries[position])
            .filter(|summary| &summary.hash == key)
    }

    pub fn summaries(&self) -> &[CommitSummary] {
        &self.summaries
    }

    pub fn len(&self) -> usize {
        self.summaries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.summaries.is_empty()
    }

    /// Padded time span of the feed, for the overview x axis.
    pub fn time_extent(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let first = self.summaries.iter().map(|s| s.timestamp).min()?;
        let last = self.summaries.iter().map(|s| s.timestamp).max()?;
        let pad = (last - first) as f64 * TIME_EXTENT_PAD;
        let lo = ((first as f64 - pad) * 1000.0) as i64;
        let hi = ((last as f64 + pad) * 1000.0) as i64;
        Some((
            DateTime::from_timestamp_millis(lo)?,
            DateTime::from_timestamp_millis(hi)?,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(hash: &str, timestamp: u64) -> CommitSummary {
        CommitSummary {
            timestamp,
            hash: CommitId::parse(hash).unwrap(),
            max_memory: 0.0,
            cpu_time: None,
            pull_request: None,
        }
    }

    #[test]
    fn test_resolve_by_short_form() {
        let index = CommitIndex::new(vec![
            summary("ab34fe017cd8", 100),
            summary("39e7ba176bbf", 200),
        ]);
        let key = index.resolve("39e7ba1").unwrap();
        assert_eq!(key.as_str(), "39e7ba176bbf");
        assert!(index.resolve("0000000").is_none());
    }

    #[test]
    fn test_collision_keeps_first() {
        let index = CommitIndex::new(vec![
            summary("ab34fe017cd8", 100),
            summary("ab34fe0aaaaa", 200),
        ]);
        assert_eq!(index.len(), 2);
        let key = index.resolve("ab34fe0").unwrap();
        assert_eq!(key.as_str(), "ab34fe017cd8");
    }

    #[test]
    fn test_summary_lookup_checks_full_hash() {
        let index = CommitIndex::new(vec![summary("ab34fe017cd8", 100)]);
        assert!(index.summary(&CommitId::parse("ab34fe017cd8").unwrap()).is_some());
        // same short form, different tail
        assert!(index.summary(&CommitId::parse("ab34fe0ffff").unwrap()).is_none());
    }

    #[test]
    fn test_time_extent_is_padded() {
        let index = CommitIndex::new(vec![
            summary("ab34fe017cd8", 1000),
            summary("39e7ba176bbf", 2000),
        ]);
        let (lo, hi) = index.time_extent().unwrap();
        assert_eq!(lo.timestamp_millis(), 970_000);
        assert_eq!(hi.timestamp_millis(), 2_030_000);
    }

    #[test]
    fn test_time_extent_of_empty_feed() {
        assert!(CommitIndex::new(vec![]).time_extent().is_none());
    }
}
