// Ingestion callback: turns a matched log line into samples and inserts them into the store.
//
// A line carries a bracketed list of tuples:
//   ... [{36.42.77.1 677 0 1762.19 6077.3 0} {36.42.77.2 677 1 10.5 20.25 1}]
// Each tuple is `address siteId isServer inRate outRate sourceKindCode`.
// Malformed tuples are skipped; ingestion never fails.

use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use crate::models::{Sample, SourceKind, Timestamp};
use crate::source::LineHandler;
use crate::store::SeriesStore;

#[derive(Debug, Error, PartialEq)]
pub enum TupleError {
    #[error("expected 6 fields, got {0}")]
    FieldCount(usize),
    #[error("empty address")]
    EmptyAddress,
    #[error("invalid {field}: {value:?}")]
    InvalidNumber { field: &'static str, value: String },
}

/// Splits the tuple list out of `text`. `None` when the line has no `[{` or more than one.
pub fn split_tuples(text: &str) -> Option<impl Iterator<Item = &str>> {
    let mut parts = text.split("[{");
    parts.next()?;
    let tail = parts.next()?;
    if parts.next().is_some() {
        return None;
    }
    Some(
        tail.trim_end()
            .trim_matches(|c| c == '}' || c == ']')
            .split("} {"),
    )
}

fn parse_number<T: std::str::FromStr>(field: &'static str, value: &str) -> Result<T, TupleError> {
    value.parse().map_err(|_| TupleError::InvalidNumber {
        field,
        value: value.to_string(),
    })
}

/// Bandwidth rates must be finite and non-negative.
fn parse_rate(field: &'static str, value: &str) -> Result<f64, TupleError> {
    let rate: f64 = parse_number(field, value)?;
    if !rate.is_finite() || rate < 0.0 {
        return Err(TupleError::InvalidNumber {
            field,
            value: value.to_string(),
        });
    }
    Ok(rate)
}

/// Parses one space-separated tuple into a sample stamped with `timestamp`.
pub fn parse_tuple(tuple: &str, timestamp: Timestamp) -> Result<Sample, TupleError> {
    let fields: Vec<&str> = tuple.split(' ').collect();
    let &[address, site_id, is_server, in_rate, out_rate, source_kind] = fields.as_slice() else {
        return Err(TupleError::FieldCount(fields.len()));
    };
    if address.is_empty() {
        return Err(TupleError::EmptyAddress);
    }
    Ok(Sample {
        address: address.to_string(),
        site_id: parse_number("siteId", site_id)?,
        is_server: is_server == "1",
        in_rate: parse_rate("inRate", in_rate)?,
        out_rate: parse_rate("outRate", out_rate)?,
        source_kind: SourceKind::from_code(source_kind),
        timestamp: Sample::truncate_timestamp(timestamp),
    })
}

/// Counters for one ingestion run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct IngestStats {
    pub lines: u64,
    /// Lines that carried no `[{...}]` tuple list.
    pub lines_without_tuples: u64,
    pub samples: u64,
    pub skipped_tuples: u64,
}

/// Line handler feeding a shared [`SeriesStore`]. Not reentrant; the log source calls it
/// from a single task.
pub struct Ingestor {
    store: Arc<SeriesStore>,
    stats: IngestStats,
}

impl Ingestor {
    pub fn new(store: Arc<SeriesStore>) -> Self {
        Self {
            store,
            stats: IngestStats::default(),
        }
    }

    pub fn stats(&self) -> IngestStats {
        self.stats
    }

    /// Parses `text` and inserts every well-formed tuple. Returns the number of samples inserted.
    pub fn ingest(&mut self, timestamp: Timestamp, text: &str) -> usize {
        self.stats.lines += 1;
        let Some(tuples) = split_tuples(text) else {
            self.stats.lines_without_tuples += 1;
            debug!(line = text, "no tuple list in line");
            return 0;
        };
        let mut inserted = 0;
        for tuple in tuples {
            match parse_tuple(tuple, timestamp) {
                Ok(sample) => {
                    self.store.insert(sample);
                    inserted += 1;
                }
                Err(e) => {
                    self.stats.skipped_tuples += 1;
                    debug!(tuple, error = %e, "skipping tuple");
                }
            }
        }
        self.stats.samples += inserted as u64;
        inserted
    }
}

impl LineHandler for Ingestor {
    fn on_line(&mut self, timestamp: Timestamp, line: &str) {
        self.ingest(timestamp, line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts() -> Timestamp {
        NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(3, 4, 5)
            .unwrap()
    }

    #[test]
    fn parse_tuple_reads_all_fields() {
        let s = parse_tuple("36.42.77.1 677 1 1762.19 6077.3 1", ts()).unwrap();
        assert_eq!(s.address, "36.42.77.1");
        assert_eq!(s.site_id, 677);
        assert!(s.is_server);
        assert_eq!(s.in_rate, 1762.19);
        assert_eq!(s.out_rate, 6077.3);
        assert_eq!(s.source_kind, SourceKind::FromSync);
        assert_eq!(s.timestamp, ts());
    }

    #[test]
    fn parse_tuple_defaults_unknown_codes() {
        let s = parse_tuple("a 1 2 0 0 7", ts()).unwrap();
        assert!(!s.is_server);
        assert_eq!(s.source_kind, SourceKind::FromApi);
    }

    #[test]
    fn parse_tuple_rejects_wrong_field_count() {
        assert_eq!(
            parse_tuple("a 1 0 1.0 2.0", ts()),
            Err(TupleError::FieldCount(5))
        );
        assert_eq!(
            parse_tuple("a  1 0 1.0 2.0 0", ts()),
            Err(TupleError::FieldCount(7))
        );
    }

    #[test]
    fn parse_tuple_rejects_bad_numbers_and_empty_address() {
        assert!(matches!(
            parse_tuple("a x 0 1.0 2.0 0", ts()),
            Err(TupleError::InvalidNumber { field: "siteId", .. })
        ));
        assert!(matches!(
            parse_tuple("a 1 0 1.0 fast 0", ts()),
            Err(TupleError::InvalidNumber { field: "outRate", .. })
        ));
        assert!(matches!(
            parse_tuple("a 1 0 -3 2.0 0", ts()),
            Err(TupleError::InvalidNumber { field: "inRate", .. })
        ));
        assert!(matches!(
            parse_tuple("a 1 0 NaN 2.0 0", ts()),
            Err(TupleError::InvalidNumber { field: "inRate", .. })
        ));
        assert_eq!(
            parse_tuple(" 1 0 1.0 2.0 0", ts()),
            Err(TupleError::EmptyAddress)
        );
    }

    #[test]
    fn split_tuples_handles_list_and_rejects_odd_lines() {
        let line = "2024/01/02 03:04:05 report [{a 1 0 1 2 0} {b 2 1 3 4 1}]";
        let tuples: Vec<&str> = split_tuples(line).unwrap().collect();
        assert_eq!(tuples, vec!["a 1 0 1 2 0", "b 2 1 3 4 1"]);
        assert!(split_tuples("no list here").is_none());
        assert!(split_tuples("[{a}] [{b}]").is_none());
    }

    #[test]
    fn ingestor_inserts_good_tuples_and_counts_skips() {
        let store = Arc::new(SeriesStore::new());
        let mut ingestor = Ingestor::new(store.clone());
        let n = ingestor.ingest(ts(), "x [{a 1 0 1.5 2.5 0} {broken} {b 2 1 3 4 1}]");
        assert_eq!(n, 2);
        ingestor.ingest(ts(), "heartbeat only");
        let stats = ingestor.stats();
        assert_eq!(stats.lines, 2);
        assert_eq!(stats.lines_without_tuples, 1);
        assert_eq!(stats.samples, 2);
        assert_eq!(stats.skipped_tuples, 1);
        assert_eq!(store.len(), 2);
        assert!(store.contains("a"));
        assert!(store.contains("b"));
    }
}
