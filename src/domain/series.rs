// Feed record shapes and the cached per-commit series
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::commit::CommitId;

/// One memory sample: seconds since build start on x, bytes in use on y.
/// Encoded on the wire as a bare `[x, y]` pair to keep the feeds compact.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "(f64, f64)", into = "(f64, f64)")]
pub struct SamplePoint {
    pub x: f64,
    pub y: f64,
}

impl SamplePoint {
    pub fn new(x: f64, y: f64) -> Self {
        SamplePoint { x, y }
    }
}

impl From<(f64, f64)> for SamplePoint {
    fn from((x, y): (f64, f64)) -> Self {
        SamplePoint { x, y }
    }
}

impl From<SamplePoint> for (f64, f64) {
    fn from(point: SamplePoint) -> (f64, f64) {
        (point.x, point.y)
    }
}

/// One compiler pass and how long it took. Encoded as `[name, seconds]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "(String, f64)", into = "(String, f64)")]
pub struct PassTiming {
    pub name: String,
    pub seconds: f64,
}

impl From<(String, f64)> for PassTiming {
    fn from((name, seconds): (String, f64)) -> Self {
        PassTiming { name, seconds }
    }
}

impl From<PassTiming> for (String, f64) {
    fn from(timing: PassTiming) -> (String, f64) {
        (timing.name, timing.seconds)
    }
}

/// One line of the summary feed: enough to label a commit on the overview
/// chart without fetching its full record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommitSummary {
    pub timestamp: u64,
    pub hash: CommitId,
    pub max_memory: f64,
    pub cpu_time: Option<f64>,
    pub pull_request: Option<u32>,
}

impl CommitSummary {
    pub fn time(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.timestamp as i64, 0).unwrap_or(DateTime::UNIX_EPOCH)
    }
}

/// The full per-commit record served as `<hash>.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommitRecord {
    pub summary: CommitSummary,
    pub memory_data: Vec<SamplePoint>,
    pub pass_timing: Vec<PassTiming>,
}

/// Extents of a series, computed once when it enters the cache.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesBounds {
    pub x_max: f64,
    pub y_max: f64,
}

/// A fetched series in render-ready form. Immutable once built; the cache
/// hands out shared references so deactivating a commit never drops its data.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesData {
    pub key: CommitId,
    pub samples: Vec<SamplePoint>,
    pub passes: Vec<PassTiming>,
    pub bounds: SeriesBounds,
    /// Total cpu time of the build, drawn as a marker line when known.
    pub secondary_marker: Option<f64>,
}

impl SeriesData {
    pub fn from_record(record: CommitRecord) -> Self {
        let x_max = record
            .memory_data
            .iter()
            .map(|p| p.x)
            .fold(0.0, f64::max);
        // the summary carries the true peak; samples may undershoot it
        let y_max = record
            .memory_data
            .iter()
            .map(|p| p.y)
            .fold(record.summary.max_memory, f64::max);
        SeriesData {
            key: record.summary.hash.clone(),
            samples: record.memory_data,
            passes: record.pass_timing,
            bounds: SeriesBounds { x_max, y_max },
            secondary_marker: record.summary.cpu_time,
        }
    }
}
