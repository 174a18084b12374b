// Shared test helpers

use bandlog::models::*;
use chrono::NaiveDate;

/// 2024-06-01 at the given wall-clock time.
pub fn ts(h: u32, m: u32, s: u32) -> Timestamp {
    NaiveDate::from_ymd_opt(2024, 6, 1)
        .unwrap()
        .and_hms_opt(h, m, s)
        .unwrap()
}

#[allow(dead_code)]
pub fn sample(address: &str, timestamp: Timestamp, in_rate: f64, out_rate: f64) -> Sample {
    Sample {
        address: address.to_string(),
        site_id: 1,
        is_server: false,
        in_rate,
        out_rate,
        source_kind: SourceKind::FromApi,
        timestamp,
    }
}
