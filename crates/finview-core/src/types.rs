// File: crates/finview-core/src/types.rs
// Summary: Shared constants and small value types used across the core.

/// Default slice length above which rows are decimated.
pub const LOD_THRESHOLD: usize = 3000;
/// Default upper bound of scatter labels generated per buffer.
pub const LOD_LABELS: usize = 700;
/// Visible rows at maximum zoom.
pub const MAX_ZOOM_POINTS: usize = 20;
/// Whitespace cells at the right-hand side.
pub const RIGHT_MARGIN: usize = 5;
/// Extra widths rendered into an LOD buffer.
pub const CACHE_FACTOR: f64 = 3.0;
pub const HILO_CAPACITY: usize = 100;
pub const STANDALONE_RATIO: f64 = 0.1;
pub const SIGNIFICANT_DECIMALS: usize = 8;
pub const SIGNIFICANT_EPS: f64 = 1e-8;
/// Two years in milliseconds.
pub const LONG_TIME_MS: f64 = 2.0 * 365.0 * 24.0 * 60.0 * 60.0 * 1000.0;

/// Smallest linear Y-range; narrower ranges stop rendering in some hosts.
pub const MIN_LINEAR_RANGE: f64 = 2e-7;
/// Floor for the low value on log scales.
pub const LOG_FLOOR: f64 = 1e-100;
/// Ceiling for the log-scale ratio range.
pub const MAX_LOG_RANGE: f64 = 1e50;

/// Per-column kind; only numeric columns ever take part in Y auto-scaling.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColumnKind {
    Numeric,
    Label,
}

/// Result of a hi-lo query over a row range.
/// Contract: `count == 0` means the range was empty and the other fields are zero.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HiLo {
    pub t0: f64,
    pub t1: f64,
    pub hi: f64,
    pub lo: f64,
    pub count: usize,
}

impl HiLo {
    pub const EMPTY: HiLo = HiLo { t0: 0.0, t1: 0.0, hi: 0.0, lo: 0.0, count: 0 };
    pub const fn is_empty(&self) -> bool { self.count == 0 }
}
