// File: crates/finview-core/src/geometry.rs
// Summary: Row-index span helpers used by the viewport and LOD caches.

/// Closed span in row-index space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct XRange {
    pub left: f64,
    pub right: f64,
}

impl XRange {
    pub const fn from_lw(left: f64, width: f64) -> Self {
        Self { left, right: left + width }
    }
    #[inline]
    pub fn width(&self) -> f64 { self.right - self.left }
    #[inline]
    pub fn contains(&self, other: &XRange) -> bool {
        other.left >= self.left && other.right <= self.right
    }
}
