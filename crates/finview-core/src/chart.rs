// File: crates/finview-core/src/chart.rs
// Summary: Chart session: rows with viewports, stores and items; X-link propagation, live updates and painting.
// Notes:
// - Row 0 is the X leader; other rows follow it and auto-scale their own Y.
// - The session's current row replaces an implicit "last used axis".

use tracing::{debug, warn};

use crate::axis::{clamp_xy, round_to_significant, y_tick_label, Precision};
use crate::config::ChartConfig;
use crate::error::{ChartError, ChartResult};
use crate::geometry::XRange;
use crate::host::{CoordinateMapper, DrawSink, NoRepaint, RepaintHost};
use crate::item::{CandlestickItem, ColorFilter, DrawBuffer, HeatmapItem, LabelItem, LineItem, PlotItem};
use crate::lod::LodCache;
use crate::scale::YScale;
use crate::series::SeriesStore;
use crate::table::{RawColumn, RawTable, RawValues};
use crate::timeindex::{self, LabelZone};
use crate::view::{PanBy, Viewport};

pub type StoreId = usize;
pub type ItemId = usize;

/// Re-applied to live data before it replaces an item's store.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DataAdjust {
    #[default]
    None,
    Volume,
}

/// One horizontal chart row (or overlay) with its viewport.
#[derive(Debug)]
pub struct ChartRow {
    pub view: Viewport,
    pub precision: Precision,
    store: Option<StoreId>,
    link: Option<usize>,
    overlay_of: Option<usize>,
}

impl ChartRow {
    /// Store driving this row's X-range and Y auto-scale.
    pub fn store(&self) -> Option<StoreId> { self.store }
    /// Row whose X-range this row follows.
    pub fn link(&self) -> Option<usize> { self.link }
    pub fn overlay_of(&self) -> Option<usize> { self.overlay_of }
}

struct ItemSlot {
    row: usize,
    store: StoreId,
    item: Box<dyn PlotItem>,
    cache: LodCache<DrawBuffer>,
    adjust: DataAdjust,
}

/// Crosshair readout at a snapped position.
#[derive(Clone, Debug, PartialEq)]
pub struct Crosshair {
    pub x: f64,
    pub y: f64,
    pub x_text: String,
    pub y_text: String,
}

pub struct Chart {
    cfg: ChartConfig,
    rows: Vec<ChartRow>,
    stores: Vec<SeriesStore>,
    items: Vec<ItemSlot>,
    epoch_period: f64,
    current: usize,
    pub zone: LabelZone,
    host: Box<dyn RepaintHost>,
}

impl std::fmt::Debug for Chart {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Chart")
            .field("rows", &self.rows.len())
            .field("stores", &self.stores.len())
            .field("items", &self.items.len())
            .field("epoch_period", &self.epoch_period)
            .finish()
    }
}

impl Chart {
    /// One row per Y-scale; every row after the first follows row 0 on X.
    pub fn new(cfg: ChartConfig, yscales: &[YScale]) -> ChartResult<Self> {
        cfg.validate()?;
        if yscales.is_empty() {
            return Err(ChartError::Config("a chart needs at least one row".into()));
        }
        let precision = Precision::new(cfg.significant_decimals, cfg.significant_eps);
        let rows = yscales
            .iter()
            .enumerate()
            .map(|(i, &ys)| ChartRow {
                view: Viewport::new(&cfg, ys),
                precision,
                store: None,
                link: (i > 0).then_some(0),
                overlay_of: None,
            })
            .collect();
        Ok(Self {
            cfg,
            rows,
            stores: Vec::new(),
            items: Vec::new(),
            epoch_period: 1e30,
            current: 0,
            zone: LabelZone::Local,
            host: Box::new(NoRepaint),
        })
    }

    pub fn with_host(mut self, host: Box<dyn RepaintHost>) -> Self {
        self.host = host;
        self
    }

    pub fn config(&self) -> &ChartConfig { &self.cfg }
    pub fn rows(&self) -> &[ChartRow] { &self.rows }
    pub fn epoch_period(&self) -> f64 { self.epoch_period }
    pub fn current_row(&self) -> usize { self.current }

    pub fn set_current_row(&mut self, row: usize) -> ChartResult<()> {
        self.check_row(row)?;
        self.current = row;
        Ok(())
    }

    pub fn row(&self, row: usize) -> ChartResult<&ChartRow> {
        self.rows.get(row).ok_or(ChartError::UnknownRow(row))
    }

    pub fn view(&self, row: usize) -> ChartResult<&Viewport> {
        Ok(&self.row(row)?.view)
    }

    pub fn view_mut(&mut self, row: usize) -> ChartResult<&mut Viewport> {
        self.rows.get_mut(row).map(|r| &mut r.view).ok_or(ChartError::UnknownRow(row))
    }

    pub fn store(&self, id: StoreId) -> Option<&SeriesStore> { self.stores.get(id) }

    pub fn item_store(&self, item: ItemId) -> ChartResult<StoreId> {
        self.items.get(item).map(|s| s.store).ok_or(ChartError::UnknownItem(item))
    }

    pub fn item_cache(&self, item: ItemId) -> ChartResult<&LodCache<DrawBuffer>> {
        self.items.get(item).map(|s| &s.cache).ok_or(ChartError::UnknownItem(item))
    }

    fn check_row(&self, row: usize) -> ChartResult<()> {
        if row < self.rows.len() { Ok(()) } else { Err(ChartError::UnknownRow(row)) }
    }

    fn row_store(&self, row: usize) -> ChartResult<StoreId> {
        self.row(row)?.store.ok_or_else(|| ChartError::shape(format!("row {row} has no data")))
    }

    /// Add a row drawn on top of `parent`, sharing its X-range with a compressed Y zoom.
    pub fn add_overlay(&mut self, parent: usize, yscale: YScale) -> ChartResult<usize> {
        self.check_row(parent)?;
        let mut view = Viewport::overlay(&self.cfg, yscale);
        view.set_x_range(self.rows[parent].view.x_range());
        self.rows.push(ChartRow {
            view,
            precision: self.rows[parent].precision,
            store: None,
            link: Some(parent),
            overlay_of: Some(parent),
        });
        Ok(self.rows.len() - 1)
    }

    /// Stop following the X leader.
    pub fn unlink_x(&mut self, row: usize) -> ChartResult<()> {
        self.check_row(row)?;
        self.rows[row].link = None;
        Ok(())
    }

    fn x_leader(&self, mut row: usize) -> usize {
        while let Some(l) = self.rows[row].link {
            row = l;
        }
        row
    }

    /// Normalize raw input for `row`. A single value column borrows the time column of the
    /// first row holding time-indexed data; very large values switch on magnitude compression.
    pub fn create_store(&mut self, row: usize, raw: RawTable) -> ChartResult<SeriesStore> {
        self.check_row(row)?;
        let raw = if raw.ncols() == 1 { self.borrow_time_column(raw)? } else { raw };
        let store = SeriesStore::normalize(raw, &self.cfg)?;
        if store.max_value() > self.cfg.magnitude_limit {
            debug!(row, limit = self.cfg.magnitude_limit, "magnitude compression enabled");
            self.rows[row].view.yscale.set_factor(self.cfg.magnitude_limit);
        }
        Ok(store)
    }

    fn borrow_time_column(&self, mut raw: RawTable) -> ChartResult<RawTable> {
        let donor = self.rows.iter().filter_map(|r| r.store).map(|s| &self.stores[s]).find(|s| s.ncols() >= 2);
        let Some(donor) = donor else { return Ok(raw) };
        let table = donor.table();
        if table.len() != raw.nrows() {
            return Err(ChartError::shape(format!("{} values cannot share a {}-row time axis", raw.nrows(), table.len())));
        }
        for (c, src) in raw.columns.iter_mut().zip(table.columns.iter().skip(1)) {
            c.name = src.name.clone();
        }
        raw.columns.insert(0, RawColumn { name: table.columns[0].name.clone(), values: RawValues::Numeric(table.time().to_vec()) });
        Ok(raw)
    }

    /// Attach a store to `row`. The first non-standalone store drives the row; later ones
    /// are merged onto its time axis. Standalone stores keep their own axis.
    pub fn set_store(&mut self, row: usize, mut store: SeriesStore) -> ChartResult<StoreId> {
        self.check_row(row)?;
        let standalone = store.standalone();
        let mut drives_row = false;
        if standalone {
            store.update_init_x(self.cfg.init_zoom_periods);
        } else {
            match self.rows[row].store {
                None => {
                    self.rows[row].view.attach(&mut store);
                    drives_row = true;
                }
                Some(main) => {
                    self.stores[main].merge(&mut store)?;
                    for slot in self.items.iter_mut().filter(|s| s.row == row) {
                        slot.cache.mark_dirty();
                    }
                    let view = &mut self.rows[row].view;
                    view.attach(&mut self.stores[main]);
                    store.update_init_x(self.cfg.init_zoom_periods);
                }
            }
        }
        if self.epoch_period > 1e7 || !standalone {
            let ep = store.period();
            if ep < self.epoch_period {
                self.epoch_period = ep;
            }
        }
        self.stores.push(store);
        let id = self.stores.len() - 1;
        if drives_row {
            self.rows[row].store = Some(id);
        }
        Ok(id)
    }

    fn add_item(&mut self, row: usize, store: StoreId, item: Box<dyn PlotItem>, adjust: DataAdjust) -> ItemId {
        let cache = LodCache::new(item.lod(), self.cfg.cache_factor);
        debug!(row, store, kind = item.id(), "plot item added");
        self.items.push(ItemSlot { row, store, item, cache, adjust });
        self.current = row;
        self.items.len() - 1
    }

    /// Merge the precision implied by `store` into the row's precision.
    pub fn update_significants(&mut self, row: usize, store: StoreId, force: bool) {
        let defaults = Precision::new(self.cfg.significant_decimals, self.cfg.significant_eps);
        let candidate = self.stores.get(store).and_then(SeriesStore::calc_significant_decimals);
        if let Some(r) = self.rows.get_mut(row) {
            r.precision.update(candidate, &defaults, force);
        }
    }

    /// `(time, open, close, high, low)` candles; only high and low scale the Y-axis.
    pub fn candlestick_ochl(&mut self, row: usize, raw: RawTable) -> ChartResult<ItemId> {
        self.candlestick_with(row, raw, CandlestickItem::default())
    }

    pub fn candlestick_with(&mut self, row: usize, raw: RawTable, item: CandlestickItem) -> ChartResult<ItemId> {
        let mut store = self.create_store(row, raw)?;
        if store.ncols() < 5 {
            return Err(ChartError::shape(format!("candles need time, open, close, high and low, got {} columns", store.ncols())));
        }
        store.set_scale_cols(vec![3, 4])?;
        let sid = self.set_store(row, store)?;
        let id = self.add_item(row, sid, Box::new(item), DataAdjust::None);
        self.update_significants(row, sid, true);
        Ok(id)
    }

    /// `(time, open, close, volume)` bars from a zero baseline.
    pub fn volume_ocv(&mut self, row: usize, raw: RawTable, filter: ColorFilter) -> ChartResult<ItemId> {
        let mut store = self.create_store(row, raw)?;
        store.adjust_for_volume()?;
        let sid = self.set_store(row, store)?;
        let id = self.add_item(row, sid, Box::new(CandlestickItem::volume(filter)), DataAdjust::Volume);
        self.update_significants(row, sid, true);
        if filter == ColorFilter::Volume {
            self.rows[row].view.zoom_baseline = 0.0;
        }
        Ok(id)
    }

    /// Line plot; `zoomscale` false keeps it out of the Y auto-scale.
    pub fn plot(&mut self, row: usize, raw: RawTable, zoomscale: bool) -> ChartResult<ItemId> {
        let mut store = self.create_store(row, raw)?;
        if !zoomscale {
            store.set_scale_cols(Vec::new())?;
        }
        let sid = self.set_store(row, store)?;
        let id = self.add_item(row, sid, Box::new(LineItem), DataAdjust::None);
        self.update_significants(row, sid, false);
        Ok(id)
    }

    /// `(time, y, text)` scatter labels. Never scales Y; makes room for the text instead.
    pub fn labels(&mut self, row: usize, raw: RawTable) -> ChartResult<ItemId> {
        let mut store = self.create_store(row, raw)?;
        if store.ncols() < 3 {
            return Err(ChartError::shape(format!("labels need time, y and text columns, got {}", store.ncols())));
        }
        store.set_scale_cols(Vec::new())?;
        let sid = self.set_store(row, store)?;
        let item = LabelItem { max_labels: self.cfg.lod_labels };
        let id = self.add_item(row, sid, Box::new(item), DataAdjust::None);
        self.update_significants(row, sid, false);
        let view = &mut self.rows[row].view;
        if view.zoom_scale > 0.9 {
            view.zoom_scale = 0.9;
        }
        Ok(id)
    }

    /// `time x price` intensity grid; data columns are named by price.
    pub fn heatmap(&mut self, row: usize, raw: RawTable) -> ChartResult<ItemId> {
        self.check_row(row)?;
        if self.rows[row].view.zoom_scale >= 0.9 {
            self.rows[row].view.zoom_scale = 0.6;
        }
        let mut store = self.create_store(row, raw)?;
        store.set_scale_cols(Vec::new())?;
        let prices = HeatmapItem::new(store.ncols()).prices(&store)?;
        let sid = self.set_store(row, store)?;
        let item = HeatmapItem::new(self.stores[sid].ncols());
        let id = self.add_item(row, sid, Box::new(item), DataAdjust::None);

        if let Some(main) = self.rows[row].store {
            if !self.stores[main].timebased() {
                // index-based heatmaps frame themselves
                self.rows[row].link = None;
                let lo = prices.iter().copied().fold(f64::NAN, f64::min);
                let hi = prices.iter().copied().fold(f64::NAN, f64::max);
                let dp = (prices[0] - prices[1]).abs();
                let len = self.stores[main].len() as f64;
                self.rows[row].view.set_range(0.0, lo, len, hi + dp);
            }
        }
        Ok(id)
    }

    /// Initial framing: whole-store extremes, then every X leader zooms to its store's
    /// initial range and followers catch up.
    pub fn init_view(&mut self) {
        for r in &mut self.rows {
            if let Some(sid) = r.store {
                r.view.pre_process(&self.stores[sid]);
            }
        }
        for row in 0..self.rows.len() {
            if self.rows[row].link.is_some() { continue; }
            let Some(sid) = self.rows[row].store else { continue };
            let (x0, x1) = self.stores[sid].init_x();
            if self.rows[row].view.update_y_zoom(&mut self.stores[sid], x0, x1) {
                self.host.viewport_changed(row);
            }
            self.propagate(row);
        }
    }

    /// Hand the leader's X-range to every row that follows it.
    fn propagate(&mut self, leader: usize) {
        let range = self.rows[leader].view.x_range();
        let mut force = self.rows[leader].view.force_range_update;
        for r in 0..self.rows.len() {
            if r == leader || self.x_leader(r) != leader { continue; }
            let row = &mut self.rows[r];
            let changed = match row.store {
                Some(sid) => row.view.follow(&mut self.stores[sid], range, &mut force),
                None => {
                    row.view.set_x_range(range);
                    true
                }
            };
            if changed {
                self.host.viewport_changed(r);
            }
        }
        self.rows[leader].view.force_range_update = force;
    }

    fn with_leader<F>(&mut self, row: usize, op: F) -> ChartResult<bool>
    where
        F: FnOnce(&mut Viewport, &mut SeriesStore) -> bool,
    {
        self.check_row(row)?;
        let leader = self.x_leader(row);
        let Some(sid) = self.rows[leader].store else { return Ok(false) };
        let changed = op(&mut self.rows[leader].view, &mut self.stores[sid]);
        if changed {
            self.host.viewport_changed(leader);
            self.propagate(leader);
        }
        Ok(changed)
    }

    pub fn pan(&mut self, row: usize, by: PanBy) -> ChartResult<bool> {
        self.with_leader(row, |v, s| v.pan(s, by))
    }

    pub fn zoom(&mut self, row: usize, factor: f64, pivot: f64) -> ChartResult<bool> {
        self.with_leader(row, |v, s| v.zoom(s, factor, pivot))
    }

    pub fn wheel(&mut self, row: usize, delta: f64, pivot: f64, vertical: bool) -> ChartResult<bool> {
        self.with_leader(row, |v, s| v.wheel(s, delta, pivot, vertical))
    }

    /// Wheel event at a pixel position of `row`, mapped through the host's coordinates.
    pub fn wheel_at(&mut self, row: usize, mapper: &dyn CoordinateMapper, px: f64, py: f64, delta: f64, vertical: bool) -> ChartResult<bool> {
        let view = self.view(row)?;
        let (pivot, _) = mapper.to_view(px, py, view.x_range(), view.y_range());
        self.wheel(row, delta, pivot, vertical)
    }

    /// Re-scale Y on every row, e.g. after a drag finished. Each follower gets one forced update.
    pub fn refresh_all_y_zoom(&mut self, row: usize) -> ChartResult<()> {
        self.check_row(row)?;
        let leader = self.x_leader(row);
        self.rows[leader].view.force_range_update = self.rows.len() - 1;
        if let Some(sid) = self.rows[leader].store {
            if self.rows[leader].view.refresh_y_zoom(&mut self.stores[sid]) {
                self.host.viewport_changed(leader);
            }
        }
        self.propagate(leader);
        Ok(())
    }

    /// Replace an item's data. Buffers over the same table are invalidated, X limits follow
    /// the new length, and a view parked at the right edge scrolls along on every row.
    pub fn update_data(&mut self, item: ItemId, raw: RawTable) -> ChartResult<()> {
        let (row, sid, adjust) = {
            let slot = self.items.get(item).ok_or(ChartError::UnknownItem(item))?;
            (slot.row, slot.store, slot.adjust)
        };
        let mut fresh = self.create_store(row, raw)?;
        if adjust == DataAdjust::Volume {
            fresh.adjust_for_volume()?;
        }
        self.stores[sid].update(fresh)?;
        for slot in &mut self.items {
            if self.stores[slot.store].shares_table(&self.stores[sid]) {
                slot.cache.mark_dirty();
            }
        }

        let limits = self.rows[row].view.set_x_limits(&self.stores[sid]);
        let x1 = limits.right;
        let tr = self.rows[row].view.x_range();
        let x0 = x1 - tr.width();
        for r in &mut self.rows {
            r.view.set_limits(limits);
        }
        let margin = self.cfg.right_margin as f64;
        if tr.right >= x1 - 5.0 - 2.0 * margin {
            debug!(x0, x1, "scrolling to new data");
            for r in 0..self.rows.len() {
                let Some(s) = self.rows[r].store else { continue };
                if self.rows[r].view.update_y_zoom(&mut self.stores[s], x0, x1) {
                    self.host.viewport_changed(r);
                }
            }
        }
        Ok(())
    }

    /// Bring every item's buffer up to date with its row's visible range and hand it to `sink`.
    /// An item that fails is skipped; the others still paint. Returns the number painted.
    pub fn paint(&mut self, sink: &mut dyn DrawSink) -> usize {
        let mut painted = 0;
        for (id, slot) in self.items.iter_mut().enumerate() {
            let view = &self.rows[slot.row].view;
            let visible = view.x_range();
            let yscale = view.yscale;
            let store = &self.stores[slot.store];
            let ItemSlot { row, item, cache, .. } = slot;
            match cache.ensure_fresh(visible, |r| item.generate(store, r, &yscale)) {
                Ok(buf) => {
                    buf.draw_to(*row, sink);
                    painted += 1;
                }
                Err(e) => warn!(item = id, kind = item.id(), error = %e, "item not painted"),
            }
        }
        painted
    }

    /// Fractional row index of time `t` on the row's time axis.
    pub fn time_to_index(&self, row: usize, t: f64) -> ChartResult<f64> {
        let sid = self.row_store(row)?;
        timeindex::time_to_index(self.stores[sid].table().time(), t)
    }

    pub fn times_to_index(&self, row: usize, ts: &[f64]) -> ChartResult<Vec<f64>> {
        let sid = self.row_store(row)?;
        timeindex::times_to_index(self.stores[sid].table().time(), ts)
    }

    pub fn x_label(&mut self, row: usize, x: f64) -> ChartResult<String> {
        let sid = self.row_store(row)?;
        Ok(timeindex::x_label(&mut self.stores[sid], x, self.epoch_period, self.zone))
    }

    /// Year ticks with their labels when the visible span is long; `None` otherwise.
    pub fn x_year_ticks(&mut self, row: usize) -> ChartResult<Option<Vec<(f64, String)>>> {
        let sid = self.row_store(row)?;
        let xr = self.rows[row].view.x_range();
        let store = &mut self.stores[sid];
        let Some(ticks) = timeindex::year_ticks(store, xr.left, xr.right, self.cfg.long_time_ms) else { return Ok(None) };
        Ok(Some(ticks.into_iter().map(|x| (x, timeindex::x_year_label(store, x, self.zone))).collect()))
    }

    /// Value label at view-space `y`, rounded to the row's precision (defaults without grid clamping).
    pub fn y_label(&self, row: usize, y: f64) -> ChartResult<String> {
        let r = self.row(row)?;
        let p = if self.cfg.clamp_grid {
            r.precision
        } else {
            Precision::new(self.cfg.significant_decimals, self.cfg.significant_eps)
        };
        let v = r.view.yscale.xform(y);
        let rng = r.view.y_max - r.view.y_min;
        let rngmax = r.view.y_min.abs() + rng;
        Ok(round_to_significant(rng, rngmax, v, p))
    }

    pub fn y_tick_label(&self, row: usize, y: f64) -> ChartResult<String> {
        Ok(y_tick_label(&self.row(row)?.view.yscale, y))
    }

    /// Snap a view-space point to the grid and label it.
    pub fn crosshair(&mut self, row: usize, x: f64, y: f64) -> ChartResult<Crosshair> {
        let r = self.row(row)?;
        let (cx, cy) = clamp_xy(x, y, &r.view.yscale, r.precision.eps, self.cfg.clamp_grid);
        let y_text = self.y_label(row, cy)?;
        let x_text = match self.rows[row].store {
            Some(_) => self.x_label(row, cx)?,
            None => String::new(),
        };
        Ok(Crosshair { x: cx, y: cy, x_text, y_text })
    }
}
