// File: crates/finview-core/src/config.rs
// Summary: Explicit chart configuration (thresholds, margins, precision defaults).
// Notes:
// - Every field has a serde default so partial TOML files are accepted.

use serde::{Deserialize, Serialize};

use crate::error::{ChartError, ChartResult};
use crate::types;

/// Settings passed to chart and viewport construction.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartConfig {
    /// Slice length above which rows are stride-decimated.
    pub lod_threshold: usize,
    /// Scatter labels are not generated at all above this count.
    pub lod_labels: usize,
    /// Number of visible rows at maximum zoom.
    pub max_zoom_points: usize,
    /// Empty cells kept to the right of the last row.
    pub right_margin: usize,
    /// Width multiple rendered into an item's LOD buffer.
    pub cache_factor: f64,
    pub hilo_capacity: usize,
    /// Rows shown when a store is first attached.
    pub init_zoom_periods: f64,
    pub v_zoom_scale: f64,
    /// Fraction of gaps/reversals above which a time column is standalone.
    pub standalone_ratio: f64,
    pub significant_decimals: usize,
    pub significant_eps: f64,
    pub clamp_grid: bool,
    /// Values above this switch the Y-scale into magnitude compression.
    pub magnitude_limit: f64,
    /// Wheel pivots this close to an edge snap onto it.
    pub edge_snap: f64,
    /// Visible spans longer than this get year-only X labels.
    pub long_time_ms: f64,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            lod_threshold: types::LOD_THRESHOLD,
            lod_labels: types::LOD_LABELS,
            max_zoom_points: types::MAX_ZOOM_POINTS,
            right_margin: types::RIGHT_MARGIN,
            cache_factor: types::CACHE_FACTOR,
            hilo_capacity: types::HILO_CAPACITY,
            init_zoom_periods: 1e10,
            v_zoom_scale: 0.97,
            standalone_ratio: types::STANDALONE_RATIO,
            significant_decimals: types::SIGNIFICANT_DECIMALS,
            significant_eps: types::SIGNIFICANT_EPS,
            clamp_grid: true,
            magnitude_limit: 1e8,
            edge_snap: 0.05,
            long_time_ms: types::LONG_TIME_MS,
        }
    }
}

impl ChartConfig {
    pub fn from_toml_str(s: &str) -> ChartResult<Self> {
        let cfg: Self = toml::from_str(s).map_err(|e| ChartError::Config(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn load(path: impl AsRef<std::path::Path>) -> ChartResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| ChartError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    pub fn to_toml_string(&self) -> ChartResult<String> {
        toml::to_string_pretty(self).map_err(|e| ChartError::Config(e.to_string()))
    }

    pub fn validate(&self) -> ChartResult<()> {
        if self.lod_threshold == 0 { return Err(ChartError::Config("lod_threshold must be > 0".into())); }
        if self.hilo_capacity == 0 { return Err(ChartError::Config("hilo_capacity must be > 0".into())); }
        if !(self.cache_factor >= 1.0) { return Err(ChartError::Config("cache_factor must be >= 1".into())); }
        if !(self.v_zoom_scale > 0.0) { return Err(ChartError::Config("v_zoom_scale must be > 0".into())); }
        if !(self.significant_eps > 0.0) { return Err(ChartError::Config("significant_eps must be > 0".into())); }
        if !(0.0..0.5).contains(&self.edge_snap) { return Err(ChartError::Config("edge_snap must be in [0, 0.5)".into())); }
        Ok(())
    }
}
