// In-memory series store: address -> time-ordered samples.
// One reader/writer lock guards the whole map. Inserts take it exclusively;
// range queries and key listing share it, so a reader never sees a half-inserted sample.

use std::collections::HashMap;

use chrono::NaiveDateTime;
use parking_lot::{RwLock, RwLockReadGuard};

use crate::models::{Sample, Timestamp};

/// Lowest timestamp; pass as `low` for a full-history query.
pub const MIN_TIMESTAMP: Timestamp = NaiveDateTime::MIN;
/// Highest timestamp; pass as `high` for a full-history query.
pub const MAX_TIMESTAMP: Timestamp = NaiveDateTime::MAX;

/// Time-ordered samples for one address. Equal timestamps keep arrival order.
#[derive(Debug, Clone, Default)]
pub struct Series {
    samples: Vec<Sample>,
}

impl Series {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stable ordered insert: the sample lands after every sample whose timestamp is <= its own.
    /// Log time is mostly increasing, so the common path is a plain push.
    pub fn insert(&mut self, sample: Sample) {
        match self.samples.last() {
            Some(last) if last.timestamp > sample.timestamp => {
                let pos = self
                    .samples
                    .partition_point(|s| s.timestamp <= sample.timestamp);
                self.samples.insert(pos, sample);
            }
            _ => self.samples.push(sample),
        }
    }

    /// Samples with `low <= timestamp <= high`, ascending. Empty when `low > high`.
    pub fn range(&self, low: Timestamp, high: Timestamp) -> &[Sample] {
        if low > high {
            return &[];
        }
        let start = self.samples.partition_point(|s| s.timestamp < low);
        let end = self.samples.partition_point(|s| s.timestamp <= high);
        &self.samples[start..end]
    }

    pub fn as_slice(&self) -> &[Sample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Owner of every series seen during ingestion. Construct one and share it (e.g. behind `Arc`)
/// between the ingestion path and the report driver.
#[derive(Debug, Default)]
pub struct SeriesStore {
    series: RwLock<HashMap<String, Series>>,
}

impl SeriesStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `sample` to its address's series, creating the series on first use.
    /// Callers must not pass an empty address.
    pub fn insert(&self, sample: Sample) {
        debug_assert!(!sample.address.is_empty(), "sample address must be non-empty");
        let mut map = self.series.write();
        if let Some(series) = map.get_mut(&sample.address) {
            series.insert(sample);
        } else {
            let address = sample.address.clone();
            let mut series = Series::new();
            series.insert(sample);
            map.insert(address, series);
        }
    }

    /// Owned copy of the samples for `address` in `[low, high]`. Unknown address yields an empty vec.
    pub fn range_query(&self, address: &str, low: Timestamp, high: Timestamp) -> Vec<Sample> {
        self.view().range_query(address, low, high).to_vec()
    }

    /// Known addresses, in no particular order.
    pub fn keys(&self) -> Vec<String> {
        self.view().keys()
    }

    pub fn contains(&self, address: &str) -> bool {
        self.view().contains(address)
    }

    /// Number of addresses with a series.
    pub fn len(&self) -> usize {
        self.series.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.read().is_empty()
    }

    /// Total samples across all series.
    pub fn sample_count(&self) -> usize {
        self.series.read().values().map(Series::len).sum()
    }

    /// Holds the shared lock for as long as the view lives, so several queries see one snapshot.
    pub fn view(&self) -> StoreView<'_> {
        StoreView {
            guard: self.series.read(),
        }
    }
}

/// Read-only snapshot of the store; inserts block until it is dropped.
pub struct StoreView<'a> {
    guard: RwLockReadGuard<'a, HashMap<String, Series>>,
}

impl StoreView<'_> {
    pub fn keys(&self) -> Vec<String> {
        self.guard.keys().cloned().collect()
    }

    pub fn contains(&self, address: &str) -> bool {
        self.guard.contains_key(address)
    }

    pub fn series(&self, address: &str) -> Option<&Series> {
        self.guard.get(address)
    }

    /// Borrowed samples for `address` in `[low, high]`; empty when the address is unknown.
    pub fn range_query(&self, address: &str, low: Timestamp, high: Timestamp) -> &[Sample] {
        self.guard
            .get(address)
            .map(|s| s.range(low, high))
            .unwrap_or(&[])
    }

    /// Full history for `address`.
    pub fn full_range(&self, address: &str) -> &[Sample] {
        self.range_query(address, MIN_TIMESTAMP, MAX_TIMESTAMP)
    }
}
