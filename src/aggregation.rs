// Group aggregation: sum several per-address series into one series.
// Join key is exact timestamp equality, not a tolerance window: samples one second apart
// stay as two rows.

use std::collections::HashMap;

use crate::models::{Sample, Timestamp};

/// Aggregate entries in first-seen timestamp order, with lookup by timestamp.
#[derive(Debug, Default)]
struct FirstSeenIndex {
    entries: Vec<Sample>,
    by_timestamp: HashMap<Timestamp, usize>,
}

impl FirstSeenIndex {
    fn add(&mut self, sample: &Sample) {
        match self.by_timestamp.get(&sample.timestamp) {
            Some(&idx) => {
                // Identity fields stay with the first contributor; only rates sum.
                let entry = &mut self.entries[idx];
                entry.in_rate += sample.in_rate;
                entry.out_rate += sample.out_rate;
            }
            None => {
                self.by_timestamp
                    .insert(sample.timestamp, self.entries.len());
                self.entries.push(sample.clone());
            }
        }
    }

    fn into_entries(self) -> Vec<Sample> {
        self.entries
    }
}

/// Merges `series` (one slice per contributing address, already range-filtered) into one
/// aggregated series. Each slice is scanned once, in the order given; output order is the
/// order in which timestamps were first encountered. An empty slice contributes nothing.
pub fn merge<'a, I>(series: I) -> Vec<Sample>
where
    I: IntoIterator<Item = &'a [Sample]>,
{
    let mut index = FirstSeenIndex::default();
    for samples in series {
        for sample in samples {
            index.add(sample);
        }
    }
    index.into_entries()
}
