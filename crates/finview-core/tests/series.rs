// File: crates/finview-core/tests/series.rs
// Purpose: Store normalization, merging onto a shared time axis, live updates and row slicing.

use chrono::{TimeZone, Utc};
use finview_core::{ChartConfig, ChartError, RawTable, RawValues, SeriesStore, YScale};

const T0: f64 = 1_600_000_000_000.0;
const MINUTE: f64 = 60_000.0;

fn cfg() -> ChartConfig {
    ChartConfig::default()
}

fn minutes(range: std::ops::Range<usize>) -> Vec<f64> {
    range.map(|i| T0 + i as f64 * MINUTE).collect()
}

fn store(raw: RawTable) -> SeriesStore {
    SeriesStore::normalize(raw, &cfg()).unwrap()
}

#[test]
fn second_epochs_become_milliseconds() {
    let s = store(RawTable::from_xy(vec![1.6e9, 1.6e9 + 60.0], vec![1.0, 2.0]));
    assert_eq!(s.table().time(), &[1.6e12, 1.6e12 + 60_000.0]);
    assert!(s.timebased());
}

#[test]
fn microsecond_epochs_are_scaled_down() {
    let s = store(RawTable::from_xy(vec![1.6e15, 1.6e15 + 60e6], vec![1.0, 2.0]));
    assert_eq!(s.table().time(), &[1.6e12, 1.6e12 + 60_000.0]);
}

#[test]
fn small_indices_are_not_time() {
    let s = store(RawTable::from_xy(vec![0.0, 1.0, 2.0], vec![5.0, 6.0, 7.0]));
    assert_eq!(s.table().time(), &[0.0, 1.0, 2.0]);
    assert!(!s.timebased());
}

#[test]
fn text_and_chrono_times_are_converted() {
    let text = RawTable::new()
        .with_text("time", vec![Some("2020-01-01"), Some("2020-01-02 00:00:00")])
        .with_numeric("v", vec![1.0, 2.0]);
    let s = store(text);
    let jan1 = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap().timestamp_millis() as f64;
    assert_eq!(s.table().time(), &[jan1, jan1 + 86_400_000.0]);

    let stamps = RawTable::new()
        .with_column("time", RawValues::Timestamps(vec![Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap()]))
        .with_numeric("v", vec![1.0]);
    assert_eq!(store(stamps).table().time(), &[jan1]);
}

#[test]
fn unparseable_time_is_an_error() {
    let raw = RawTable::new().with_text("time", vec![Some("yesterday")]).with_numeric("v", vec![1.0]);
    let err = SeriesStore::normalize(raw, &cfg()).unwrap_err();
    assert_eq!(err, ChartError::TimeParse { value: "yesterday".into() });
}

#[test]
fn ragged_tables_are_rejected() {
    let raw = RawTable::from_xy(vec![1.0, 2.0, 3.0], vec![1.0]);
    assert!(matches!(SeriesStore::normalize(raw, &cfg()), Err(ChartError::DataShape(_))));
}

#[test]
fn two_reversals_in_ten_rows_is_standalone() {
    let t = vec![0.0, 1.0, 2.0, 3.0, 2.0, 5.0, 6.0, 7.0, 6.0, 9.0];
    assert!(store(RawTable::from_xy(t, vec![0.0; 10])).standalone());

    let t = vec![0.0, 1.0, 2.0, 3.0, 2.0, 5.0, 6.0, 7.0, 8.0, 9.0];
    let s = store(RawTable::from_xy(t, vec![0.0; 10]));
    assert!(!s.standalone());
    assert!(!s.is_monotonic());
}

#[test]
fn label_columns_never_scale() {
    let raw = RawTable::new()
        .with_numeric("time", minutes(0..3))
        .with_numeric("price", vec![1.0, 2.0, 3.0])
        .with_text("note", vec![Some("a"), None, Some("c")]);
    let mut s = store(raw);
    assert_eq!(s.scale_cols(), &[1]);
    assert!(matches!(s.set_scale_cols(vec![2]), Err(ChartError::DataShape(_))));
    assert!(matches!(s.set_scale_cols(vec![7]), Err(ChartError::DataShape(_))));
}

#[test]
fn merge_joins_on_time_and_renames_collisions() {
    let mut a = store(RawTable::from_xy(minutes(0..5), vec![10.0, 11.0, 12.0, 13.0, 14.0]));
    let mut b = store(RawTable::from_xy(minutes(2..7), vec![20.0, 21.0, 22.0, 23.0, 24.0]));
    a.merge(&mut b).unwrap();

    assert_eq!(a.len(), 7);
    assert_eq!(a.table().names(), vec!["0", "1", "1+"]);
    assert_eq!(b.renames().get("1").map(String::as_str), Some("1+"));
    assert_eq!(b.col_data_offset(), 2);
    assert_eq!(b.scale_cols(), &[2]);
    assert_eq!(a.scale_cols(), &[1, 2]);
    assert!(a.shares_table(&b));

    let t = a.table();
    assert_eq!(t.time(), minutes(0..7).as_slice());
    assert!(t.value(2, 0).is_nan());
    assert_eq!(t.value(2, 2), 20.0);
    assert!(t.value(1, 6).is_nan());
}

#[test]
fn merging_shared_stores_is_a_no_op() {
    let mut a = store(RawTable::from_xy(minutes(0..3), vec![1.0, 2.0, 3.0]));
    let mut b = store(RawTable::from_xy(minutes(0..3), vec![4.0, 5.0, 6.0]));
    a.merge(&mut b).unwrap();
    a.merge(&mut b).unwrap();
    assert_eq!(a.ncols(), 3);
}

#[test]
fn merge_pairs_repeated_times_by_occurrence() {
    let mut t = minutes(0..20);
    t[10] = t[9];
    let mut a = store(RawTable::from_xy(t.clone(), (0..20).map(|i| i as f64).collect()));
    assert!(!a.standalone());
    let mut b = store(RawTable::from_xy(t, (0..20).map(|i| 100.0 + i as f64).collect()));
    a.merge(&mut b).unwrap();

    assert_eq!(a.len(), 20);
    assert_eq!(a.hilo(-0.5, 19.5).count, 20);
    let table = a.table();
    assert_eq!((table.value(1, 9), table.value(2, 9)), (9.0, 109.0));
    assert_eq!((table.value(1, 10), table.value(2, 10)), (10.0, 110.0));
}

#[test]
fn merge_keeps_rows_without_time() {
    let mut t = minutes(0..20);
    t[5] = f64::NAN;
    let mut a = store(RawTable::from_xy(t.clone(), (0..20).map(|i| i as f64).collect()));
    let mut b = store(RawTable::from_xy(t, vec![1.0; 20]));
    a.merge(&mut b).unwrap();

    assert_eq!(a.len(), 20);
    assert!(a.y().unwrap().contains(&5.0));
}

#[test]
fn timeless_store_adopts_the_merged_time_axis() {
    let mut a = store(RawTable::from_values(vec![1.0, 2.0, 3.0]));
    let mut b = store(RawTable::from_xy(minutes(0..3), vec![50.0, 60.0, 70.0]));
    a.merge(&mut b).unwrap();

    assert_eq!(a.table().time(), minutes(0..3).as_slice());
    assert_eq!(a.col_data_offset(), 1);
    assert_eq!(a.y().unwrap(), vec![1.0, 2.0, 3.0]);
    assert_eq!(b.col_data_offset(), 2);
    assert_eq!(b.scale_cols(), &[2]);
    assert_eq!(b.y().unwrap(), vec![50.0, 60.0, 70.0]);
    assert_eq!(a.scale_cols(), &[1, 2]);

    let h = b.hilo(-0.5, 2.5);
    assert_eq!((h.hi, h.lo, h.t0), (70.0, 50.0, T0));
    let h = a.hilo(-0.5, 2.5);
    assert_eq!((h.hi, h.lo), (70.0, 1.0));
}

#[test]
fn closest_time_floors_the_row() {
    let s = store(RawTable::from_xy(minutes(0..5), vec![1.0; 5]));
    assert_eq!(s.closest_time(2.7), Some(T0 + 2.0 * MINUTE));
    assert_eq!(s.closest_time(0.0), Some(T0));
    assert_eq!(s.closest_time(-0.5), None);
    assert_eq!(s.closest_time(5.0), None);
    assert_eq!(s.closest_time(f64::NAN), None);
}

#[test]
fn update_carries_missing_columns_forward_by_time() {
    let mut a = store(RawTable::from_xy(minutes(0..5), vec![10.0, 11.0, 12.0, 13.0, 14.0]));
    let mut b = store(RawTable::from_xy(minutes(2..7), vec![20.0, 21.0, 22.0, 23.0, 24.0]));
    a.merge(&mut b).unwrap();

    let fresh = store(RawTable::from_xy(minutes(0..8), (0..8).map(|i| 100.0 + i as f64).collect()));
    a.update(fresh).unwrap();

    assert_eq!(a.len(), 8);
    assert_eq!(b.len(), 8, "aliased store sees the new rows");
    let t = a.table();
    assert_eq!(t.value(1, 7), 107.0);
    assert_eq!(t.value(2, 2), 20.0);
    assert_eq!(t.value(2, 6), 24.0);
    assert!(t.value(2, 7).is_nan());
}

#[test]
fn update_matches_columns_through_renames() {
    let mut a = store(RawTable::from_xy(minutes(0..3), vec![1.0, 2.0, 3.0]));
    let mut b = store(RawTable::from_xy(minutes(0..3), vec![4.0, 5.0, 6.0]));
    a.merge(&mut b).unwrap();

    let fresh = store(RawTable::from_xy(minutes(0..4), vec![40.0, 50.0, 60.0, 70.0]));
    b.update(fresh).unwrap();

    let t = a.table();
    assert_eq!(t.names(), vec!["0", "1", "1+"]);
    assert_eq!(t.value(2, 3), 70.0);
    assert_eq!(t.value(1, 0), 1.0);
    assert!(t.value(1, 3).is_nan());
}

#[test]
fn update_needs_time() {
    let mut a = store(RawTable::from_xy(minutes(0..3), vec![1.0, 2.0, 3.0]));
    let fresh = store(RawTable::from_values(vec![1.0, 2.0]));
    assert!(matches!(a.update(fresh), Err(ChartError::DataShape(_))));
}

#[test]
fn rows_are_stride_decimated_above_threshold() {
    let n = 10_000;
    let s = store(RawTable::from_xy(minutes(0..n), (0..n).map(|i| i as f64).collect()));
    let rows = s.rows(2, -0.5, n as f64 - 0.5, &YScale::linear(), true).unwrap();
    assert_eq!(rows.len(), 2500);
    assert_eq!(rows.source_len, n);
    assert_eq!(&rows.index[..3], &[0, 4, 8]);

    let slice = s.rows(2, 10.0, 20.0, &YScale::linear(), true).unwrap();
    assert_eq!(slice.len(), 11);
    assert_eq!(slice.value(1, 0), 10.0);
}

#[test]
fn rows_are_in_view_space() {
    let s = store(RawTable::from_xy(minutes(0..3), vec![1.0, 10.0, 100.0]));
    let rows = s.rows(2, 0.0, 2.0, &YScale::log10(), false).unwrap();
    assert_eq!(rows.columns[1].as_numeric().unwrap(), &[0.0, 1.0, 2.0]);
    assert_eq!(rows.value(0, 2), T0 + 2.0 * MINUTE);
}

#[test]
fn too_many_requested_columns_is_a_shape_error() {
    let s = store(RawTable::from_xy(minutes(0..3), vec![1.0, 2.0, 3.0]));
    assert!(matches!(s.rows(5, 0.0, 2.0, &YScale::linear(), true), Err(ChartError::DataShape(_))));
}

#[test]
fn y_and_z_columns() {
    let s = store(RawTable::from_xy(minutes(0..3), vec![1.0, 2.0, 3.0]));
    assert_eq!(s.y().unwrap(), vec![1.0, 2.0, 3.0]);
    assert!(matches!(s.z(), Err(ChartError::DataShape(_))));
}

#[test]
fn volume_adjustment_reorders_columns() {
    let raw = RawTable::new()
        .with_numeric("time", minutes(0..3))
        .with_numeric("open", vec![1.0, 2.0, 3.0])
        .with_numeric("close", vec![2.0, 1.0, 4.0])
        .with_numeric("volume", vec![100.0, 200.0, 300.0]);
    let mut s = store(raw);
    s.adjust_for_volume().unwrap();
    assert_eq!(s.table().names(), vec!["time", "_zero_", "volume", "open", "close"]);
    assert_eq!(s.scale_cols(), &[1, 2]);
    assert_eq!(s.table().value(1, 2), 0.0);

    let mut short = store(RawTable::from_xy(minutes(0..3), vec![1.0, 2.0, 3.0]));
    assert!(short.adjust_for_volume().is_err());
}

#[test]
fn period_is_median_step_in_seconds() {
    let s = store(RawTable::from_xy(minutes(0..10), vec![0.0; 10]));
    assert_eq!(s.period(), 60.0);
    let one = store(RawTable::from_xy(minutes(0..1), vec![0.0]));
    assert!(one.period().is_nan());
}

#[test]
fn init_x_spans_the_last_steps() {
    let mut s = store(RawTable::from_xy(minutes(0..300), vec![0.0; 300]));
    s.update_init_x(100.0);
    assert_eq!(s.init_x(), (204.5, 304.5));
    s.update_init_x(1e10);
    assert_eq!(s.init_x(), (-0.5, 304.5));
}

#[test]
fn significant_decimals_follow_data_resolution() {
    let s = store(RawTable::from_xy(minutes(0..4), vec![1.0, 1.25, 1.5, 2.0]));
    let p = s.calc_significant_decimals().unwrap();
    assert_eq!(p.decimals, 1);
    assert_eq!(p.eps, 0.25);
}
