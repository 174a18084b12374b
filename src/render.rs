// Report line rendering: one line per key, two dialects, three value projections.

use std::fmt;

use serde::Deserialize;

use crate::models::{Sample, Timestamp};

/// Time-range marker format: `month/dayThour:minute:second`.
const RANGE_TIME_FORMAT: &str = "%m/%dT%H:%M:%S";

/// Field separator and label padding style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// Comma-joined, label unpadded.
    Csv,
    /// Space-joined, label left-aligned to the report's column width.
    Space,
}

impl Dialect {
    fn separator(self) -> &'static str {
        match self {
            Dialect::Csv => ",",
            Dialect::Space => " ",
        }
    }

    fn label(self, label: &str, width: usize) -> String {
        match self {
            Dialect::Csv => label.to_string(),
            Dialect::Space => format!("{label:<width$}"),
        }
    }
}

/// Which bandwidth direction(s) a line exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Projection {
    In,
    Out,
    #[serde(alias = "all")]
    Both,
}

impl Projection {
    fn value(self, sample: &Sample) -> String {
        match self {
            Projection::In => format!("{:.2}", sample.in_rate),
            Projection::Out => format!("{:.2}", sample.out_rate),
            Projection::Both => format!("{:.2}|{:.2}", sample.in_rate, sample.out_rate),
        }
    }
}

impl fmt::Display for Projection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Projection::In => "in",
            Projection::Out => "out",
            Projection::Both => "both",
        })
    }
}

fn format_time(ts: &Timestamp) -> String {
    ts.format(RANGE_TIME_FORMAT).to_string()
}

/// Renders `series` as one line: label, then (if non-empty) `first-last` time range, then one
/// value per sample. An empty series renders as just the label.
pub fn render(
    dialect: Dialect,
    label: &str,
    width: usize,
    series: &[Sample],
    projection: Projection,
) -> String {
    let mut fields = Vec::with_capacity(series.len() + 2);
    fields.push(dialect.label(label, width));
    if let (Some(first), Some(last)) = (series.first(), series.last()) {
        fields.push(format!(
            "{}-{}",
            format_time(&first.timestamp),
            format_time(&last.timestamp)
        ));
    }
    fields.extend(series.iter().map(|s| projection.value(s)));
    fields.join(dialect.separator())
}

/// Renders a label followed by a fixed marker (e.g. `no-data`) instead of values.
pub fn render_placeholder(dialect: Dialect, label: &str, width: usize, text: &str) -> String {
    [dialect.label(label, width), text.to_string()].join(dialect.separator())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SourceKind;
    use chrono::NaiveDate;

    fn sample(h: u32, m: u32, s: u32, in_rate: f64, out_rate: f64) -> Sample {
        Sample {
            address: "1.2.3.4".into(),
            site_id: 7,
            is_server: false,
            in_rate,
            out_rate,
            source_kind: SourceKind::FromApi,
            timestamp: NaiveDate::from_ymd_opt(2024, 3, 5)
                .unwrap()
                .and_hms_opt(h, m, s)
                .unwrap(),
        }
    }

    #[test]
    fn single_sample_csv_in() {
        let line = render(
            Dialect::Csv,
            "1.2.3.4",
            15,
            &[sample(9, 8, 7, 12.346, 1.0)],
            Projection::In,
        );
        assert_eq!(line, "1.2.3.4,03/05T09:08:07-03/05T09:08:07,12.35");
    }

    #[test]
    fn space_dialect_pads_label_and_uses_first_and_last_time() {
        let series = [sample(10, 0, 0, 1.0, 2.0), sample(10, 5, 0, 3.0, 4.5)];
        let line = render(Dialect::Space, "1.2.3.4", 15, &series, Projection::Both);
        assert_eq!(
            line,
            "1.2.3.4         03/05T10:00:00-03/05T10:05:00 1.00|2.00 3.00|4.50"
        );
    }

    #[test]
    fn out_projection_uses_out_rate() {
        let line = render(
            Dialect::Csv,
            "k",
            0,
            &[sample(1, 2, 3, 1.0, 99.999)],
            Projection::Out,
        );
        assert!(line.ends_with(",100.00"));
    }

    #[test]
    fn empty_series_is_just_label() {
        assert_eq!(render(Dialect::Csv, "k", 10, &[], Projection::In), "k");
        assert_eq!(
            render(Dialect::Space, "k", 4, &[], Projection::In),
            "k   "
        );
    }

    #[test]
    fn placeholder_rows() {
        assert_eq!(
            render_placeholder(Dialect::Csv, "a(b)", 25, "no-data"),
            "a(b),no-data"
        );
        assert_eq!(
            render_placeholder(Dialect::Space, "a(b)", 6, "no-data"),
            "a(b)   no-data"
        );
    }

    #[test]
    fn projection_display_is_canonical_name() {
        assert_eq!(Projection::Both.to_string(), "both");
        assert_eq!(Projection::Out.to_string(), "out");
    }
}
