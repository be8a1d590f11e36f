// File: crates/finview-core/src/api.rs
// Summary: Stateless entry points over a single store: create, hi-lo, Y-range and decimation.

use crate::config::ChartConfig;
use crate::error::{ChartError, ChartResult};
use crate::scale::YScale;
use crate::series::{RowSet, SeriesStore};
use crate::table::RawTable;
use crate::types::HiLo;
use crate::view::Viewport;

pub fn create_store(raw: RawTable, cfg: &ChartConfig) -> ChartResult<SeriesStore> {
    SeriesStore::normalize(raw, cfg)
}

pub fn query_hilo(store: &mut SeriesStore, x0: f64, x1: f64) -> HiLo {
    store.hilo(x0, x1)
}

/// View-space Y-range a fresh viewport over `[x0, x1]` would show.
/// `None` when the range holds no rows or no finite values.
pub fn compute_viewport(store: &mut SeriesStore, x0: f64, x1: f64, cfg: &ChartConfig, yscale: YScale) -> Option<(f64, f64)> {
    let mut view = Viewport::new(cfg, yscale);
    view.update_y_zoom(store, x0, x1).then(|| view.y_range())
}

/// All data columns of `[x0, x1]`, stride-decimated to at most `max_points` rows.
pub fn decimate(store: &SeriesStore, x0: f64, x1: f64, max_points: usize) -> ChartResult<RowSet> {
    if max_points == 0 {
        return Err(ChartError::Config("max_points must be > 0".into()));
    }
    let colcnt = store.ncols() - store.col_data_offset() + 1;
    store.rows_limited(colcnt, x0, x1, &YScale::linear(), Some(max_points))
}
