// File: crates/finview-core/tests/axis.rs
// Purpose: Value-axis precision merging, label rounding, %g formatting and grid snapping.

use finview_core::axis::{calc_significant_decimals, clamp_xy, format_g, round_to_significant};
use finview_core::{Precision, YScale};

const DEFAULTS: Precision = Precision::new(8, 1e-8);

#[test]
fn precision_updates_from_defaults_only_unless_forced() {
    let mut p = DEFAULTS;
    p.update(Some(Precision::new(2, 0.01)), &DEFAULTS, false);
    assert_eq!(p, Precision::new(2, 0.01));

    // no longer at defaults
    p.update(Some(Precision::new(4, 1e-4)), &DEFAULTS, false);
    assert_eq!(p, Precision::new(2, 0.01));

    p.update(Some(Precision::new(4, 1e-4)), &DEFAULTS, true);
    assert_eq!(p, Precision::new(4, 1e-4));

    // forced, but coarser: kept
    p.update(Some(Precision::new(1, 0.5)), &DEFAULTS, true);
    assert_eq!(p, Precision::new(4, 1e-4));

    p.update(None, &DEFAULTS, true);
    assert_eq!(p, Precision::new(4, 1e-4));
}

#[test]
fn decimals_from_smallest_step() {
    assert_eq!(calc_significant_decimals(&[1.0, 1.25, 1.5]).map(|p| p.decimals), Some(1));
    assert_eq!(calc_significant_decimals(&[0.001, 0.002, 0.004]).map(|p| p.decimals), Some(3));
    assert_eq!(calc_significant_decimals(&[10.0, 20.0]).map(|p| p.decimals), Some(1));
}

#[test]
fn degenerate_columns_have_no_precision() {
    assert_eq!(calc_significant_decimals(&[f64::NAN, f64::NAN]), None);
    assert_eq!(calc_significant_decimals(&[2.0, 2.0, 2.0]), None);
    assert_eq!(calc_significant_decimals(&[2.0]), None);
}

#[test]
fn labels_round_to_eps() {
    let p = Precision::new(2, 0.01);
    assert_eq!(round_to_significant(10.0, 110.0, 100.123, p), "100.12");
    assert_eq!(round_to_significant(10.0, 110.0, 100.127, p), "100.13");
}

#[test]
fn high_resolution_labels_are_scientific() {
    let s = round_to_significant(0.005, 0.005, 1.23e-4, DEFAULTS);
    assert_eq!(s, "1.23000e-4");
}

#[test]
fn g_formatting() {
    assert_eq!(format_g(0.0001), "0.0001");
    assert_eq!(format_g(123_456_789.0), "1.23457e+08");
    assert_eq!(format_g(1.5), "1.5");
    assert_eq!(format_g(100.0), "100");
    assert_eq!(format_g(1e-5), "1e-05");
    assert_eq!(format_g(-2.0), "-2");
    assert_eq!(format_g(0.0), "0");
}

#[test]
fn crosshair_snaps_to_grid() {
    let (x, y) = clamp_xy(3.6, 1.3, &YScale::linear(), 0.25, true);
    assert_eq!(x, 4.0);
    assert!((y - 1.25).abs() < 1e-9, "{y}");

    let (x, y) = clamp_xy(3.6, 1.3, &YScale::linear(), 0.25, false);
    assert_eq!((x, y), (3.6, 1.3));
}
