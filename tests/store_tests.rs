// Series store tests: ordering, ties, range bounds, concurrent insert/read

mod common;

use bandlog::store::{MAX_TIMESTAMP, MIN_TIMESTAMP, SeriesStore};
use common::{sample, ts};
use std::sync::Arc;

#[test]
fn increasing_inserts_come_back_in_insertion_order() {
    let store = SeriesStore::new();
    for (i, s) in [0, 10, 20, 30].into_iter().enumerate() {
        store.insert(sample("10.0.0.1", ts(12, 0, s), i as f64, 0.0));
    }
    let out = store.range_query("10.0.0.1", MIN_TIMESTAMP, MAX_TIMESTAMP);
    let rates: Vec<f64> = out.iter().map(|s| s.in_rate).collect();
    assert_eq!(rates, vec![0.0, 1.0, 2.0, 3.0]);
}

#[test]
fn out_of_order_insert_lands_in_time_order() {
    let store = SeriesStore::new();
    store.insert(sample("a", ts(12, 0, 30), 3.0, 0.0));
    store.insert(sample("a", ts(12, 0, 10), 1.0, 0.0));
    store.insert(sample("a", ts(12, 0, 20), 2.0, 0.0));
    let out = store.range_query("a", MIN_TIMESTAMP, MAX_TIMESTAMP);
    let times: Vec<_> = out.iter().map(|s| s.timestamp).collect();
    assert_eq!(times, vec![ts(12, 0, 10), ts(12, 0, 20), ts(12, 0, 30)]);
}

#[test]
fn equal_timestamps_are_both_kept_in_arrival_order() {
    let store = SeriesStore::new();
    store.insert(sample("a", ts(12, 0, 0), 1.0, 0.0));
    store.insert(sample("a", ts(12, 0, 5), 9.0, 0.0));
    store.insert(sample("a", ts(12, 0, 0), 2.0, 0.0));
    let out = store.range_query("a", MIN_TIMESTAMP, MAX_TIMESTAMP);
    let rates: Vec<f64> = out.iter().map(|s| s.in_rate).collect();
    assert_eq!(rates, vec![1.0, 2.0, 9.0]);
}

#[test]
fn range_query_is_inclusive_on_both_ends() {
    let store = SeriesStore::new();
    for s in 0..10 {
        store.insert(sample("a", ts(12, 0, s), s as f64, 0.0));
    }
    let out = store.range_query("a", ts(12, 0, 3), ts(12, 0, 6));
    let rates: Vec<f64> = out.iter().map(|s| s.in_rate).collect();
    assert_eq!(rates, vec![3.0, 4.0, 5.0, 6.0]);

    assert!(store.range_query("a", ts(13, 0, 0), ts(14, 0, 0)).is_empty());
    assert!(store.range_query("a", ts(12, 0, 6), ts(12, 0, 3)).is_empty());
}

#[test]
fn unknown_address_yields_empty_range() {
    let store = SeriesStore::new();
    store.insert(sample("a", ts(12, 0, 0), 1.0, 0.0));
    assert!(store.range_query("b", MIN_TIMESTAMP, MAX_TIMESTAMP).is_empty());
    assert!(!store.contains("b"));
}

#[test]
fn keys_and_counts_track_addresses() {
    let store = SeriesStore::new();
    assert!(store.is_empty());
    store.insert(sample("a", ts(12, 0, 0), 1.0, 0.0));
    store.insert(sample("b", ts(12, 0, 0), 1.0, 0.0));
    store.insert(sample("a", ts(12, 0, 1), 1.0, 0.0));
    let mut keys = store.keys();
    keys.sort();
    assert_eq!(keys, vec!["a".to_string(), "b".to_string()]);
    assert_eq!(store.len(), 2);
    assert_eq!(store.sample_count(), 3);
}

#[test]
fn view_sees_a_consistent_snapshot() {
    let store = SeriesStore::new();
    store.insert(sample("a", ts(12, 0, 0), 1.0, 0.0));
    let view = store.view();
    assert_eq!(view.full_range("a").len(), 1);
    assert_eq!(view.series("a").map(|s| s.len()), Some(1));
    assert!(view.series("missing").is_none());
}

#[test]
fn concurrent_inserts_and_reads_stay_ordered() {
    let store = Arc::new(SeriesStore::new());
    let writers = 4;
    let per_writer = 500;

    std::thread::scope(|scope| {
        for w in 0..writers {
            let store = store.clone();
            scope.spawn(move || {
                for i in 0..per_writer {
                    // Interleaved, partly out-of-order timestamps across writers.
                    let secs = ((i * writers + w) % 3600) as u32;
                    store.insert(sample("shared", ts(10, secs / 60, secs % 60), 1.0, 0.0));
                }
            });
        }
        for _ in 0..2 {
            let store = store.clone();
            scope.spawn(move || {
                for _ in 0..200 {
                    let out = store.range_query("shared", MIN_TIMESTAMP, MAX_TIMESTAMP);
                    assert!(out.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
                }
            });
        }
    });

    let out = store.range_query("shared", MIN_TIMESTAMP, MAX_TIMESTAMP);
    assert_eq!(out.len(), writers * per_writer);
    assert!(out.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
}
