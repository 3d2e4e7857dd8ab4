// Active set - which series are currently drawn, in stable key order
use std::collections::BTreeMap;

use super::commit::CommitId;

/// Per-series extents kept alongside membership so full-view domains can be
/// computed without touching the sample data.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActiveEntry {
    pub x_max: f64,
    pub y_max: f64,
}

/// The set of series shown on the chart. Iteration order is the key order,
/// so redraws and encoded selections come out deterministic.
#[derive(Debug, Default)]
pub struct ActiveSet {
    entries: BTreeMap<CommitId, ActiveEntry>,
}

impl ActiveSet {
    pub fn new() -> Self {
        ActiveSet {
            entries: BTreeMap::new(),
        }
    }

    pub fn add(&mut self, key: CommitId, entry: ActiveEntry) {
        self.entries.insert(key, entry);
    }

    pub fn remove(&mut self, key: &CommitId) -> Option<ActiveEntry> {
        self.entries.remove(key)
    }

    pub fn contains(&self, key: &CommitId) -> bool {
        self.entries.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &CommitId> {
        self.entries.keys()
    }

    pub fn entries(&self) -> impl Iterator<Item = (&CommitId, &ActiveEntry)> {
        self.entries.iter()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
