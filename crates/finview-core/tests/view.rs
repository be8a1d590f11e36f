// File: crates/finview-core/tests/view.rs
// Purpose: Viewport clamping, pan/zoom sequences, Y auto-scale formulas and linked-row following.

use finview_core::geometry::XRange;
use finview_core::view::rigid_edge_clamp;
use finview_core::{ChartConfig, PanBy, RawTable, SeriesStore, Viewport, YScale};

fn store(n: usize) -> SeriesStore {
    let t: Vec<f64> = (0..n).map(|i| 1_600_000_000_000.0 + i as f64 * 60_000.0).collect();
    let y: Vec<f64> = (0..n).map(|i| 100.0 + (i % 17) as f64).collect();
    SeriesStore::normalize(RawTable::from_xy(t, y), &ChartConfig::default()).unwrap()
}

fn attached(n: usize) -> (Viewport, SeriesStore) {
    let mut s = store(n);
    let mut v = Viewport::new(&ChartConfig::default(), YScale::linear());
    v.attach(&mut s);
    (v, s)
}

fn xr(v: &Viewport) -> (f64, f64) {
    let r = v.x_range();
    (r.left, r.right)
}

#[test]
fn clamp_snaps_to_cell_edges() {
    assert_eq!(rigid_edge_clamp(3.2, 47.9, 105.0), (2.5, 48.5));
    assert_eq!(rigid_edge_clamp(2.5, 48.5, 105.0), (2.5, 48.5));
}

#[test]
fn clamp_keeps_width_at_the_left_bound() {
    assert_eq!(rigid_edge_clamp(-3.5, 6.5, 100.0), (-0.5, 9.5));
}

#[test]
fn clamp_keeps_width_at_the_right_bound() {
    assert_eq!(rigid_edge_clamp(95.5, 110.5, 105.0), (89.5, 104.5));
}

#[test]
fn attach_sets_scroll_limits_with_margin() {
    let (v, _) = attached(300);
    assert_eq!(v.limits(), XRange { left: -0.5, right: 304.5 });
}

#[test]
fn zoom_in_until_max_zoom_points() {
    let (mut v, mut s) = attached(300);
    assert!(v.update_y_zoom(&mut s, 99.5, 299.5));
    assert_eq!(xr(&v), (99.5, 299.5));

    assert!(v.zoom(&mut s, 0.5, 199.5));
    assert_eq!(xr(&v), (149.5, 249.5));
    assert!(v.zoom(&mut s, 0.5, 199.5));
    assert_eq!(xr(&v), (174.5, 224.5));

    // 14 rows would remain: below the minimum, ignored
    assert!(!v.zoom(&mut s, 0.25, 199.5));
    assert_eq!(xr(&v), (174.5, 224.5));
}

#[test]
fn fifty_row_window_zoomed_twice_stops_at_the_minimum() {
    let (mut v, mut s) = attached(300);
    v.update_y_zoom(&mut s, 99.5, 299.5);
    assert!(v.update_y_zoom(&mut s, 149.5, 199.5));
    assert_eq!(v.width(), 50.0);

    assert!(v.zoom(&mut s, 0.5, 149.5));
    assert_eq!(xr(&v), (149.5, 174.5));
    // 12 rows is under both the width and the 20-point minimum
    assert!(!v.zoom(&mut s, 0.5, 149.5));
    assert_eq!(xr(&v), (149.5, 174.5));
    assert_eq!(v.width(), 25.0);
}

#[test]
fn pan_stops_at_right_margin() {
    let (mut v, mut s) = attached(300);
    v.update_y_zoom(&mut s, 99.5, 199.5);
    assert!(v.pan(&mut s, PanBy::Steps(1e10)));
    assert_eq!(xr(&v), (204.5, 304.5));
    assert_eq!(v.x_range().right, s.len() as f64 - 0.5 + 5.0);
}

#[test]
fn pan_by_percent_truncates_to_whole_rows() {
    let (mut v, mut s) = attached(300);
    v.update_y_zoom(&mut s, 99.5, 199.5);
    v.pan(&mut s, PanBy::Percent(10.0));
    assert_eq!(xr(&v), (109.5, 209.5));
}

#[test]
fn pan_stops_at_left_edge() {
    let (mut v, mut s) = attached(300);
    v.update_y_zoom(&mut s, 99.5, 199.5);
    v.pan(&mut s, PanBy::Steps(-1e10));
    assert_eq!(xr(&v), (-0.5, 99.5));
}

#[test]
fn zoom_near_edge_snaps_pivot() {
    let (mut v, mut s) = attached(300);
    v.update_y_zoom(&mut s, 99.5, 299.5);
    v.zoom(&mut s, 0.5, 102.0);
    assert_eq!(xr(&v), (99.5, 199.5));
}

#[test]
fn linear_range_adds_headroom() {
    let v = Viewport::new(&ChartConfig::default(), YScale::linear());
    let (y0, y1) = v.compute_y_range(110.0, 90.0);
    assert!((y0 - 89.6907).abs() < 1e-3, "{y0}");
    assert!((y1 - 110.3093).abs() < 1e-3, "{y1}");
}

#[test]
fn zero_baseline_pins_bottom() {
    let mut v = Viewport::new(&ChartConfig::default(), YScale::linear());
    v.zoom_baseline = 0.0;
    let (y0, y1) = v.compute_y_range(110.0, 90.0);
    assert_eq!(y0, 0.0);
    assert!(y1 > 0.0);
}

#[test]
fn log_range_stays_positive() {
    let v = Viewport::new(&ChartConfig::default(), YScale::log10());
    let (y0, y1) = v.compute_y_range(1000.0, 10.0);
    assert!(y0 > 0.0 && y0 < 10.0);
    assert!(y1 > 1000.0);
    let (y0, _) = v.compute_y_range(1000.0, 0.0);
    assert!(y0 > 0.0);
}

#[test]
fn flat_data_gets_minimum_height() {
    let v = Viewport::new(&ChartConfig::default(), YScale::linear());
    let (y0, y1) = v.compute_y_range(5.0, 5.0);
    assert!(y1 - y0 >= 2e-7 * 0.999);
    assert!(y0 < 5.0 && y1 > 5.0);
}

#[test]
fn nan_ranges_are_rejected() {
    let (mut v, mut s) = attached(50);
    v.update_y_zoom(&mut s, -0.5, 49.5);
    let before = v.clone();
    assert!(!v.set_range(0.0, f64::NAN, 10.0, 1.0));
    assert_eq!(v, before);
}

#[test]
fn y_is_stored_in_view_space() {
    let mut v = Viewport::new(&ChartConfig::default(), YScale::log10());
    v.set_range(0.0, 10.0, 5.0, 1000.0);
    let (y0, y1) = v.y_range();
    assert!((y0 - 1.0).abs() < 1e-12 && (y1 - 3.0).abs() < 1e-12);
    let (lo, hi) = v.natural_y_range();
    assert!((lo - 10.0).abs() < 1e-9 && (hi - 1000.0).abs() < 1e-9);
}

#[test]
fn manual_y_survives_without_autozoom() {
    let (mut v, mut s) = attached(300);
    v.set_range(99.5, 50.0, 199.5, 60.0);
    v.autozoom = false;
    v.zoom_scale = 1.0;
    assert!(v.update_y_zoom(&mut s, 99.5, 199.5));
    let (y0, y1) = v.y_range();
    assert!((y0 - 50.0).abs() < 1e-9 && (y1 - 60.0).abs() < 1e-9);
}

#[test]
fn pre_process_tracks_extremes_and_sign() {
    let (mut v, s) = attached(300);
    v.pre_process(&s);
    assert_eq!((v.y_min, v.y_max), (100.0, 116.0));
    assert!(v.y_positive);

    let mut neg = SeriesStore::normalize(RawTable::from_xy(vec![0.0, 1.0], vec![-1.0, 1.0]), &ChartConfig::default()).unwrap();
    let mut w = Viewport::new(&ChartConfig::default(), YScale::linear());
    w.attach(&mut neg);
    w.pre_process(&neg);
    assert!(!w.y_positive);
}

#[test]
fn vertical_wheel_changes_only_zoom_scale() {
    let (mut v, mut s) = attached(300);
    v.update_y_zoom(&mut s, 99.5, 199.5);
    let before = v.zoom_scale;
    v.wheel(&mut s, 1.0, 150.0, true);
    assert_eq!(xr(&v), (99.5, 199.5));
    assert!((v.zoom_scale - before / 1.02).abs() < 1e-12);
}

#[test]
fn follower_ignores_sub_row_moves_unless_forced() {
    let (mut v, mut s) = attached(300);
    v.update_y_zoom(&mut s, 99.5, 199.5);

    let mut force = 0;
    assert!(!v.follow(&mut s, XRange { left: 99.7, right: 199.7 }, &mut force));

    let mut force = 1;
    assert!(v.follow(&mut s, XRange { left: 99.5, right: 199.5 }, &mut force));
    assert_eq!(force, 0);

    let mut force = 0;
    assert!(v.follow(&mut s, XRange { left: 149.5, right: 249.5 }, &mut force));
    assert_eq!(xr(&v), (149.5, 249.5));
}

#[test]
fn overlay_uses_quarter_height() {
    let v = Viewport::overlay(&ChartConfig::default(), YScale::linear());
    assert_eq!(v.zoom_scale, 0.25);
}
