// File: crates/finview-core/src/view.rs
// Summary: Viewport controller: visible row range, rigid-edge clamping, pan/zoom and Y auto-scaling.
// Notes:
// - X is row-index space; each row `i` covers the cell `[i - 0.5, i + 0.5]`.
// - Y bounds are kept in view space (after the inverse Y-scale transform).

use tracing::trace;

use crate::config::ChartConfig;
use crate::geometry::XRange;
use crate::scale::YScale;
use crate::series::SeriesStore;
use crate::types::{LOG_FLOOR, MAX_LOG_RANGE, MIN_LINEAR_RANGE};

/// Zoom scale used by overlay rows, so overlays occupy a quarter of their host's height.
pub const OVERLAY_ZOOM_SCALE: f64 = 0.25;
/// Per-notch wheel zoom base.
pub const WHEEL_BASE: f64 = 1.02;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PanBy {
    /// Whole rows; positive moves right.
    Steps(f64),
    /// Percentage of the current visible width.
    Percent(f64),
}

/// Snap both edges onto half-integer cell boundaries inside `[-0.5, xlen - 0.5]`.
/// When one edge hits a bound, the other moves by the same delta so the width survives.
pub fn rigid_edge_clamp(x0: f64, x1: f64, xlen: f64) -> (f64, f64) {
    let (mut x0, mut x1) = (x0, x1);
    let end = xlen - 0.5;
    let xl = ((x0 - 0.5).round_ties_even() + 0.5).max(-0.5);
    let xr = ((x1 - 0.5).round_ties_even() + 0.5).min(end);
    let dxl = xl - x0;
    let dxr = xr - x1;
    if dxl > 0.0 { x1 += dxl; }
    if dxr < 0.0 { x0 += dxr; }
    x0 = ((x0 - 0.5).round_ties_even() + 0.5).max(-0.5);
    x1 = ((x1 - 0.5).round_ties_even() + 0.5).min(end);
    (x0, x1)
}

/// Scale `range` around `pivot`; a factor below 1 zooms in.
pub fn zoom_range(range: XRange, factor: f64, pivot: f64) -> XRange {
    XRange {
        left: pivot + (range.left - pivot) * factor,
        right: pivot + (range.right - pivot) * factor,
    }
}

/// Pivots within `snap` (fraction of the width) of an edge move onto that edge.
pub fn snap_pivot(range: XRange, pivot: f64, snap: f64) -> f64 {
    let w = range.width();
    if w <= 0.0 { return pivot; }
    let f = (pivot - range.left) / w;
    if f < snap {
        range.left
    } else if f > 1.0 - snap {
        range.right
    } else {
        pivot
    }
}

/// Visible window of one chart row.
#[derive(Clone, Debug, PartialEq)]
pub struct Viewport {
    x0: f64,
    x1: f64,
    y0: f64,
    y1: f64,
    pub yscale: YScale,
    /// Fraction of the Y-range the data occupies; below 1 leaves headroom.
    pub zoom_scale: f64,
    /// Anchor inside the Y-range: 0.5 centers, 0 keeps the bottom fixed.
    pub zoom_baseline: f64,
    pub autozoom: bool,
    /// False once any scale-relevant value is `<= 0`.
    pub y_positive: bool,
    pub y_max: f64,
    pub y_min: f64,
    /// Pending forced Y refreshes requested by linked rows.
    pub force_range_update: usize,
    limits: XRange,
    max_zoom_points: usize,
    right_margin: usize,
    edge_snap: f64,
    init_steps: f64,
}

impl Viewport {
    pub fn new(cfg: &ChartConfig, yscale: YScale) -> Self {
        Self {
            x0: -0.5,
            x1: -0.5,
            y0: 0.0,
            y1: 1.0,
            yscale,
            zoom_scale: cfg.v_zoom_scale,
            zoom_baseline: 0.5,
            autozoom: true,
            y_positive: true,
            y_max: 1000.0,
            y_min: 0.0,
            force_range_update: 0,
            limits: XRange { left: -0.5, right: -0.5 },
            max_zoom_points: cfg.max_zoom_points,
            right_margin: cfg.right_margin,
            edge_snap: cfg.edge_snap,
            init_steps: cfg.init_zoom_periods,
        }
    }

    /// Viewport for a row drawn on top of another row.
    pub fn overlay(cfg: &ChartConfig, yscale: YScale) -> Self {
        Self { zoom_scale: OVERLAY_ZOOM_SCALE, ..Self::new(cfg, yscale) }
    }

    pub fn x_range(&self) -> XRange { XRange { left: self.x0, right: self.x1 } }
    pub fn width(&self) -> f64 { self.x1 - self.x0 }
    /// Y bounds in view space.
    pub fn y_range(&self) -> (f64, f64) { (self.y0, self.y1) }
    /// Y bounds in natural units.
    pub fn natural_y_range(&self) -> (f64, f64) { (self.yscale.xform(self.y0), self.yscale.xform(self.y1)) }
    pub fn limits(&self) -> XRange { self.limits }
    pub fn max_zoom_points(&self) -> usize { self.max_zoom_points }

    /// Bind a store: compute its initial range and the X limits (data plus margin).
    pub fn attach(&mut self, store: &mut SeriesStore) {
        store.update_init_x(self.init_steps);
        self.set_x_limits(store);
    }

    /// Limits for scrolling; one more margin than the zoom clamp so panning can "snap back".
    pub fn set_x_limits(&mut self, store: &SeriesStore) -> XRange {
        self.limits = XRange { left: -0.5, right: store.xlen() as f64 - 0.5 + self.right_margin as f64 };
        self.limits
    }

    /// Share scroll limits computed for another row.
    pub fn set_limits(&mut self, limits: XRange) { self.limits = limits; }

    /// Whole-store extremes and positivity over the scale columns.
    pub fn pre_process(&mut self, store: &SeriesStore) {
        let cols = store.scale_cols();
        if cols.is_empty() { return; }
        let table = store.table();
        let mut hi = f64::NAN;
        let mut lo = f64::NAN;
        for &c in cols {
            for &v in table.columns.get(c).and_then(|c| c.data.as_numeric()).unwrap_or(&[]) {
                hi = hi.max(v);
                lo = lo.min(v);
            }
        }
        self.y_max = hi;
        self.y_min = lo;
        if lo <= 0.0 { self.y_positive = false; }
    }

    /// Set the visible window. NaN Y bounds leave the window untouched.
    /// `y0`/`y1` are natural units and stored in view space.
    pub fn set_range(&mut self, x0: f64, y0: f64, x1: f64, y1: f64) -> bool {
        if y0.is_nan() || y1.is_nan() { return false; }
        self.x0 = x0;
        self.x1 = x1;
        self.y0 = self.yscale.invxform_verified(y0);
        self.y1 = self.yscale.invxform_verified(y1);
        true
    }

    /// Set only X, e.g. for rows whose store is missing.
    pub fn set_x_range(&mut self, range: XRange) {
        self.x0 = range.left;
        self.x1 = range.right;
    }

    /// Natural-unit Y bounds for the given data extremes, applying baseline and zoom scale.
    pub fn compute_y_range(&self, hi: f64, lo: f64) -> (f64, f64) {
        let b = self.zoom_baseline;
        if self.yscale.is_log() {
            let lo = lo.max(LOG_FLOOR);
            let rng = (hi / lo).powf(1.0 / self.zoom_scale).min(MAX_LOG_RANGE);
            let base = (hi * lo).powf(b);
            (base / rng.powf(b), base * rng.powf(1.0 - b))
        } else {
            let rng = ((hi - lo) / self.zoom_scale).max(MIN_LINEAR_RANGE);
            let base = (hi + lo) * b;
            (base - rng * b, base + rng * (1.0 - b))
        }
    }

    /// Clamp `[x0, x1]` onto the data, then auto-scale Y from its hi-lo.
    /// Returns false when the update was skipped (too few rows to zoom further, or NaN bounds).
    pub fn update_y_zoom(&mut self, store: &mut SeriesStore, x0: f64, x1: f64) -> bool {
        let (x0, x1) = rigid_edge_clamp(x0, x1, store.xlen() as f64);
        let hl = store.hilo(x0, x1);
        if hl.is_empty() {
            trace!(x0, x1, "y zoom over empty range ignored");
            return false;
        }
        let cnt = hl.count as f64;
        if cnt < self.width() && cnt < self.max_zoom_points as f64 {
            trace!(x0, x1, count = hl.count, "y zoom skipped");
            return false;
        }
        let (hi, lo) = if self.autozoom {
            (hl.hi, hl.lo)
        } else {
            let (lo, hi) = self.natural_y_range();
            (hi, lo)
        };
        let (y0, y1) = self.compute_y_range(hi, lo);
        self.set_range(x0, y0, x1, y1)
    }

    /// Re-run the Y auto-scale on the current window.
    pub fn refresh_y_zoom(&mut self, store: &mut SeriesStore) -> bool {
        self.update_y_zoom(store, self.x0, self.x1)
    }

    pub fn pan(&mut self, store: &mut SeriesStore, by: PanBy) -> bool {
        let w = self.width();
        let steps = match by {
            PanBy::Steps(s) => s,
            PanBy::Percent(p) => (p / 100.0 * w).trunc(),
        };
        let end = store.xlen() as f64 - 0.5;
        let x1 = (self.x1 + steps).min(end);
        let mut x0 = x1 - w;
        let mut x1 = x1;
        if x0 < -0.5 {
            x0 = -0.5;
            x1 = x0 + w;
        }
        self.update_y_zoom(store, x0, x1)
    }

    /// Scale the current window around `pivot` without edge snapping.
    pub fn zoom_rect(&mut self, store: &mut SeriesStore, factor: f64, pivot: f64) -> bool {
        let r = zoom_range(self.x_range(), factor, pivot);
        self.update_y_zoom(store, r.left, r.right)
    }

    /// Cursor-anchored zoom; pivots near an edge zoom onto that edge.
    pub fn zoom(&mut self, store: &mut SeriesStore, factor: f64, pivot: f64) -> bool {
        let pivot = snap_pivot(self.x_range(), pivot, self.edge_snap);
        self.zoom_rect(store, factor, pivot)
    }

    /// Mouse wheel: `WHEEL_BASE^delta` on X, or with `vertical` only the Y zoom scale changes.
    pub fn wheel(&mut self, store: &mut SeriesStore, delta: f64, pivot: f64, vertical: bool) -> bool {
        let f = WHEEL_BASE.powf(delta);
        if vertical {
            self.zoom_scale /= f;
            self.zoom(store, 1.0, pivot)
        } else {
            self.zoom(store, f, pivot)
        }
    }

    /// Follow the X-range of a linked leader. Moves of less than one row are ignored unless
    /// the leader requested a forced refresh, which is consumed here.
    pub fn follow(&mut self, store: &mut SeriesStore, leader: XRange, leader_force: &mut usize) -> bool {
        let dirty = *leader_force > 0;
        if dirty || (leader.left - self.x0).abs() >= 1.0 || (leader.right - self.x1).abs() >= 1.0 {
            if dirty { *leader_force -= 1; }
            return self.update_y_zoom(store, leader.left, leader.right);
        }
        false
    }
}

