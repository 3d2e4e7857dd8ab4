// Chart session - incremental state manager for the overlay chart
//
// Series move through Inactive -> Fetching -> Active. Every public
// operation settles the chart in one shot: at most one draw call and one
// selection replacement, no matter how many series it touched.
use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::active::{ActiveEntry, ActiveSet};
use crate::domain::commit::CommitId;
use crate::domain::index::CommitIndex;
use crate::domain::selection::{self, SelectionWarning};
use crate::domain::series::SeriesData;
use crate::domain::viewport;

use super::cache::SeriesCache;
use super::provider::FetchError;

/// Fraction added above the tallest visible sample.
pub const DEFAULT_Y_PADDING: f64 = 0.01;

/// Domain used when nothing is visible, so the empty chart still has axes.
const EMPTY_DOMAIN: (f64, f64) = (0.0, 1.0);

/// What the render surface is asked to paint.
#[derive(Debug, Clone)]
pub struct ChartFrame {
    pub lines: Vec<ChartLine>,
    pub x_domain: (f64, f64),
    pub y_domain: (f64, f64),
}

#[derive(Debug, Clone)]
pub struct ChartLine {
    pub key: CommitId,
    pub data: Arc<SeriesData>,
}

/// Output port for the chart itself. `draw` replaces the whole picture.
pub trait RenderSurface {
    fn draw(&mut self, frame: &ChartFrame);
}

/// Output port for the shareable selection string. `replace` overwrites
/// the current value without growing any history.
pub trait SelectionSink {
    fn replace(&mut self, encoded: &str);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesPhase {
    Inactive,
    Fetching,
    Active,
}

/// Permission to fetch one series. Redeem with
/// [`ChartSession::complete_activation`]; redeeming is what decides
/// whether the result still matters.
#[derive(Debug)]
pub struct FetchTicket {
    key: CommitId,
    epoch: u64,
}

impl FetchTicket {
    pub fn key(&self) -> &CommitId {
        &self.key
    }
}

#[derive(Debug)]
pub enum Toggled {
    /// The series was drawn from cache.
    Activated,
    /// The series was removed from the chart.
    Deactivated,
    /// The series needs data; fetch it and redeem the ticket.
    FetchNeeded(FetchTicket),
    /// The series was mid-fetch and the toggle called that off.
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// The fetch was still wanted; the series is now on the chart.
    Activated,
    /// Something cancelled the fetch while it ran; nothing changed.
    Stale,
    /// The fetch failed; the series is back to Inactive.
    Failed,
}

pub struct ChartSession<R: RenderSurface, S: SelectionSink> {
    index: CommitIndex,
    cache: SeriesCache,
    active: ActiveSet,
    /// In-flight fetches by the epoch their ticket carries. A ticket is
    /// live only while its exact epoch is still recorded here.
    fetching: HashMap<CommitId, u64>,
    next_epoch: u64,
    view_window: Option<(f64, f64)>,
    y_padding: f64,
    surface: R,
    selection: S,
    redraw_pending: bool,
    selection_dirty: bool,
    draws: u64,
}

impl<R: RenderSurface, S: SelectionSink> ChartSession<R, S> {
    pub fn new(index: CommitIndex, y_padding: f64, surface: R, selection: S) -> Self {
        ChartSession {
            index,
            cache: SeriesCache::new(),
            active: ActiveSet::new(),
            fetching: HashMap::new(),
            next_epoch: 0,
            view_window: None,
            y_padding,
            surface,
            selection,
            redraw_pending: false,
            selection_dirty: false,
            draws: 0,
        }
    }

    pub fn index(&self) -> &CommitIndex {
        &self.index
    }

    pub fn phase(&self, key: &CommitId) -> SeriesPhase {
        if self.active.contains(key) {
            SeriesPhase::Active
        } else if self.fetching.contains_key(key) {
            SeriesPhase::Fetching
        } else {
            SeriesPhase::Inactive
        }
    }

    pub fn is_active(&self, key: &CommitId) -> bool {
        self.active.contains(key)
    }

    pub fn is_cached(&self, key: &CommitId) -> bool {
        self.cache.contains(key)
    }

    pub fn active_keys(&self) -> Vec<CommitId> {
        self.active.keys().cloned().collect()
    }

    /// The current selection in fragment form, active keys in key order.
    pub fn selection_string(&self) -> String {
        selection::encode(self.active.keys())
    }

    /// Total draw calls issued so far.
    pub fn draws(&self) -> u64 {
        self.draws
    }

    /// Flip one series. Activation is immediate on a cache hit; otherwise
    /// the caller gets a ticket and runs the fetch however it likes.
    /// Toggling a series that is mid-fetch cancels the pending activation
    /// instead of starting a second fetch.
    pub fn toggle(&mut self, key: &CommitId) -> Toggled {
        let outcome = self.toggle_series(key);
        self.settle();
        outcome
    }

    fn toggle_series(&mut self, key: &CommitId) -> Toggled {
        if self.active.contains(key) {
            self.deactivate(key);
            Toggled::Deactivated
        } else if self.fetching.remove(key).is_some() {
            tracing::debug!(%key, "pending activation cancelled");
            Toggled::Cancelled
        } else if let Some(data) = self.cache.get(key) {
            self.activate(data);
            Toggled::Activated
        } else {
            let epoch = self.next_epoch;
            self.next_epoch += 1;
            self.fetching.insert(key.clone(), epoch);
            tracing::debug!(%key, "series fetch started");
            Toggled::FetchNeeded(FetchTicket {
                key: key.clone(),
                epoch,
            })
        }
    }

    /// Redeem a fetch ticket. A ticket whose fetch was cancelled in the
    /// meantime resolves to `Stale`: the cache still takes the data, but
    /// the chart is left alone.
    pub fn complete_activation(
        &mut self,
        ticket: FetchTicket,
        result: Result<SeriesData, FetchError>,
    ) -> Resolution {
        let live = self.fetching.get(&ticket.key) == Some(&ticket.epoch);
        let resolution = match result {
            Ok(data) => {
                let data = self.cache.insert(data);
                if live {
                    self.fetching.remove(&ticket.key);
                    self.activate(data);
                    Resolution::Activated
                } else {
                    tracing::debug!(key = %ticket.key, "stale fetch result kept for the cache");
                    Resolution::Stale
                }
            }
            Err(error) => {
                if live {
                    self.fetching.remove(&ticket.key);
                    tracing::warn!(key = %ticket.key, %error, "series fetch failed");
                    Resolution::Failed
                } else {
                    tracing::debug!(key = %ticket.key, %error, "stale fetch failure ignored");
                    Resolution::Stale
                }
            }
        };
        self.settle();
        resolution
    }

    /// Deactivate everything except `key`, cancelling other pending
    /// fetches, in one redraw.
    pub fn keep_only(&mut self, key: &CommitId) {
        let others: Vec<CommitId> = self
            .active
            .keys()
            .filter(|active| *active != key)
            .cloned()
            .collect();
        for other in &others {
            self.deactivate(other);
        }
        self.fetching.retain(|pending, _| {
            if pending == key {
                true
            } else {
                tracing::debug!(key = %pending, "pending activation cancelled by keep-only");
                false
            }
        });
        self.settle();
    }

    /// Deactivate everything, cancelling pending fetches, in one redraw.
    pub fn clear_all(&mut self) {
        let all: Vec<CommitId> = self.active.keys().cloned().collect();
        for key in &all {
            self.deactivate(key);
        }
        for key in self.fetching.keys() {
            tracing::debug!(%key, "pending activation cancelled by clear-all");
        }
        self.fetching.clear();
        self.settle();
    }

    /// Zoom to the given x window. Domains follow the window until
    /// [`ChartSession::reset_viewport`].
    pub fn set_viewport(&mut self, x_lo: f64, x_hi: f64) {
        self.view_window = Some((x_lo, x_hi));
        self.redraw_pending = true;
        self.settle();
    }

    pub fn reset_viewport(&mut self) {
        if self.view_window.take().is_some() {
            self.redraw_pending = true;
        }
        self.settle();
    }

    /// Apply a selection fragment: resolve each short form and activate
    /// it, returning tickets for the series that need fetching. Entries
    /// that cannot be resolved are dropped with a warning; the rest of
    /// the fragment still applies.
    pub fn restore_selection(
        &mut self,
        fragment: &str,
    ) -> (Vec<FetchTicket>, Vec<SelectionWarning>) {
        let (candidates, mut warnings) = selection::decode(fragment);
        let mut tickets = Vec::new();
        for short in candidates {
            let Some(key) = self.index.resolve(&short) else {
                warnings.push(SelectionWarning::Unknown(short));
                continue;
            };
            let key = key.clone();
            if self.phase(&key) != SeriesPhase::Inactive {
                continue;
            }
            if let Toggled::FetchNeeded(ticket) = self.toggle_series(&key) {
                tickets.push(ticket);
            }
        }
        for warning in &warnings {
            tracing::warn!(%warning, "selection entry dropped");
        }
        self.settle();
        (tickets, warnings)
    }

    fn activate(&mut self, data: Arc<SeriesData>) {
        let entry = ActiveEntry {
            x_max: data.bounds.x_max,
            y_max: data.bounds.y_max,
        };
        self.active.add(data.key.clone(), entry);
        self.redraw_pending = true;
        self.selection_dirty = true;
    }

    fn deactivate(&mut self, key: &CommitId) {
        if self.active.remove(key).is_some() {
            self.redraw_pending = true;
            self.selection_dirty = true;
        }
    }

    /// Emit at most one draw and one selection replacement for whatever
    /// the current operation changed.
    fn settle(&mut self) {
        if self.redraw_pending {
            let frame = self.frame();
            self.surface.draw(&frame);
            self.draws += 1;
            self.redraw_pending = false;
        }
        if self.selection_dirty {
            let encoded = self.selection_string();
            self.selection.replace(&encoded);
            self.selection_dirty = false;
        }
    }

    fn frame(&self) -> ChartFrame {
        let mut lines = Vec::with_capacity(self.active.len());
        for (key, _) in self.active.entries() {
            if let Some(data) = self.cache.get(key) {
                lines.push(ChartLine {
                    key: key.clone(),
                    data,
                });
            }
        }
        ChartFrame {
            lines,
            x_domain: self.x_domain(),
            y_domain: self.y_domain(),
        }
    }

    fn x_domain(&self) -> (f64, f64) {
        if let Some(window) = self.view_window {
            return window;
        }
        let x_max = self
            .active
            .entries()
            .map(|(_, entry)| entry.x_max)
            .fold(0.0, f64::max);
        if x_max > 0.0 { (0.0, x_max) } else { EMPTY_DOMAIN }
    }

    fn y_domain(&self) -> (f64, f64) {
        let peak = match self.view_window {
            None => self
                .active
                .entries()
                .map(|(_, entry)| entry.y_max)
                .fold(f64::NEG_INFINITY, f64::max),
            Some((x_lo, x_hi)) => {
                let mut peak = f64::NEG_INFINITY;
                for (key, _) in self.active.entries() {
                    if let Some(data) = self.cache.get(key) {
                        let (_, high) = viewport::y_bounds(&data.samples, x_lo, x_hi);
                        peak = peak.max(high);
                    }
                }
                peak
            }
        };
        if peak.is_finite() && peak > 0.0 {
            (0.0, viewport::pad_upper(peak, self.y_padding))
        } else {
            EMPTY_DOMAIN
        }
    }
}
