// File: crates/finview-core/src/host.rs
// Summary: Interfaces to the host graphics layer: draw sink, repaint trigger and pixel mapping.

use crate::geometry::XRange;
use crate::item::{CandleBuffer, HeatmapBuffer, LabelBuffer, LineBuffer};

/// Receives decimated draw buffers; coordinates are row index (X) and view-space value (Y).
pub trait DrawSink {
    fn candles(&mut self, row: usize, buf: &CandleBuffer);
    fn line(&mut self, row: usize, buf: &LineBuffer);
    fn labels(&mut self, row: usize, buf: &LabelBuffer);
    fn heatmap(&mut self, row: usize, buf: &HeatmapBuffer);
}

/// Called by the chart after a row's visible window changed.
pub trait RepaintHost {
    fn viewport_changed(&mut self, row: usize);
}

/// Host that ignores repaint requests (headless use).
#[derive(Clone, Copy, Debug, Default)]
pub struct NoRepaint;

impl RepaintHost for NoRepaint {
    fn viewport_changed(&mut self, _row: usize) {}
}

/// Converts between pixels and (row index, view-space value) for a visible window.
pub trait CoordinateMapper {
    fn to_view(&self, px: f64, py: f64, x: XRange, y: (f64, f64)) -> (f64, f64);
    fn to_pixel(&self, x: f64, y: f64, xr: XRange, yr: (f64, f64)) -> (f64, f64);
}

/// Screen margins, in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Insets {
    pub left: u32,
    pub right: u32,
    pub top: u32,
    pub bottom: u32,
}

impl Insets {
    pub const fn new(left: u32, right: u32, top: u32, bottom: u32) -> Self {
        Self { left, right, top, bottom }
    }
}

impl Default for Insets {
    fn default() -> Self { Self::new(72, 24, 24, 56) }
}

/// Rectangular plot surface with margins; Y grows downwards in pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlotArea {
    pub width: f64,
    pub height: f64,
    pub insets: Insets,
}

impl PlotArea {
    pub fn new(width: f64, height: f64, insets: Insets) -> Self { Self { width, height, insets } }

    fn inner(&self) -> (f64, f64, f64, f64) {
        let l = self.insets.left as f64;
        let r = self.width - self.insets.right as f64;
        let t = self.insets.top as f64;
        let b = self.height - self.insets.bottom as f64;
        (l, (r - l).max(1.0), t, (b - t).max(1.0))
    }
}

impl CoordinateMapper for PlotArea {
    fn to_view(&self, px: f64, py: f64, x: XRange, y: (f64, f64)) -> (f64, f64) {
        let (l, w, t, h) = self.inner();
        let cx = px.clamp(l, l + w);
        let cy = py.clamp(t, t + h);
        let vx = x.left + (cx - l) / w * x.width();
        let vy = y.1 - (cy - t) / h * (y.1 - y.0);
        (vx, vy)
    }

    fn to_pixel(&self, x: f64, y: f64, xr: XRange, yr: (f64, f64)) -> (f64, f64) {
        let (l, w, t, h) = self.inner();
        let xs = xr.width();
        let ys = yr.1 - yr.0;
        let px = if xs == 0.0 { l } else { l + (x - xr.left) / xs * w };
        let py = if ys == 0.0 { t + h } else { t + (yr.1 - y) / ys * h };
        (px, py)
    }
}
