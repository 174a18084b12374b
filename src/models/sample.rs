// Bandwidth sample model

use chrono::{NaiveDateTime, Timelike};

/// Log-derived observation time, second precision. Used as both sort score and merge key.
pub type Timestamp = NaiveDateTime;

/// Where a sample's numbers came from; carried through, never used for keying.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SourceKind {
    #[default]
    FromApi,
    FromSync,
}

impl SourceKind {
    /// Parse from the numeric code in a log tuple ("1" = sync, anything else = api).
    pub fn from_code(s: &str) -> Self {
        match s {
            "1" => SourceKind::FromSync,
            _ => SourceKind::FromApi,
        }
    }
}

/// One bandwidth observation for an address at a point in time.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub address: String,
    pub site_id: i64,
    pub is_server: bool,
    pub in_rate: f64,
    pub out_rate: f64,
    pub source_kind: SourceKind,
    pub timestamp: Timestamp,
}

impl Sample {
    /// Drops sub-second precision; the store and the aggregator compare whole seconds.
    pub fn truncate_timestamp(ts: Timestamp) -> Timestamp {
        ts.with_nanosecond(0).unwrap_or(ts)
    }
}
