// File: crates/finview-core/src/item.rs
// Summary: Renderable plot items (candles, lines, scatter labels, heatmap) and their draw buffers.
// Notes:
// - Items are renderer-agnostic: they turn store rows into buffers a `DrawSink` consumes.

use crate::error::{ChartError, ChartResult};
use crate::geometry::XRange;
use crate::host::DrawSink;
use crate::scale::YScale;
use crate::series::{RowSet, SeriesStore};

/// Classification tag attached to each candle; the host picks colors from it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CandleTag {
    Bull,
    Bear,
    WeakBull,
    WeakBear,
}

/// How candles are classified.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ColorFilter {
    /// open <= close is bullish.
    #[default]
    Price,
    /// Like `Price`, but on the original open/close kept behind volume rows.
    Volume,
    /// Direction from open/close, strength from the two following columns.
    Strength,
}

impl ColorFilter {
    pub fn classify(self, rows: &RowSet, i: usize) -> CandleTag {
        let up = |a: usize, b: usize| rows.value(a, i) <= rows.value(b, i);
        match self {
            ColorFilter::Price => if up(1, 2) { CandleTag::Bull } else { CandleTag::Bear },
            ColorFilter::Volume => if up(3, 4) { CandleTag::Bull } else { CandleTag::Bear },
            ColorFilter::Strength => match (up(1, 2), up(3, 4)) {
                (true, true) => CandleTag::Bull,
                (true, false) => CandleTag::WeakBull,
                (false, true) => CandleTag::WeakBear,
                (false, false) => CandleTag::Bear,
            },
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CandleRow {
    pub x: f64,
    pub open: f64,
    pub close: f64,
    pub high: f64,
    pub low: f64,
    pub tag: CandleTag,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct CandleBuffer {
    pub rows: Vec<CandleRow>,
    pub width: f64,
    pub shadows: bool,
    /// False when the slice is too dense for bodies and only shadows are drawn.
    pub bodies: bool,
}

/// Polyline points; NaN values split the line.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LineBuffer {
    pub points: Vec<(f64, f64)>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LabelRow {
    pub x: f64,
    pub t: f64,
    pub y: f64,
    pub text: String,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct LabelBuffer {
    pub rows: Vec<LabelRow>,
    /// Set when there were too many labels to generate any.
    pub suppressed: bool,
}

/// One filled cell; `intensity` is in `[0, 1]` after the color curve.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HeatCell {
    pub x: f64,
    pub width: f64,
    pub y: f64,
    pub height: f64,
    pub intensity: f64,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct HeatmapBuffer {
    pub cells: Vec<HeatCell>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum DrawBuffer {
    Candles(CandleBuffer),
    Line(LineBuffer),
    Labels(LabelBuffer),
    Heatmap(HeatmapBuffer),
}

impl DrawBuffer {
    pub fn draw_to(&self, row: usize, sink: &mut dyn DrawSink) {
        match self {
            DrawBuffer::Candles(b) => sink.candles(row, b),
            DrawBuffer::Line(b) => sink.line(row, b),
            DrawBuffer::Labels(b) => sink.labels(row, b),
            DrawBuffer::Heatmap(b) => sink.heatmap(row, b),
        }
    }

    /// Number of primitives the host will draw.
    pub fn len(&self) -> usize {
        match self {
            DrawBuffer::Candles(b) => b.rows.len(),
            DrawBuffer::Line(b) => b.points.len(),
            DrawBuffer::Labels(b) => b.rows.len(),
            DrawBuffer::Heatmap(b) => b.cells.len(),
        }
    }
    pub fn is_empty(&self) -> bool { self.len() == 0 }
}

/// Something that draws rows of one store.
pub trait PlotItem {
    fn id(&self) -> &'static str;
    /// Whether the item's buffer is decimated and cached per visible range.
    fn lod(&self) -> bool;
    fn generate(&self, store: &SeriesStore, range: XRange, yscale: &YScale) -> ChartResult<DrawBuffer>;
}

/// Expects `(time, open, close, high, low)` from the store's data offset.
#[derive(Clone, Debug, PartialEq)]
pub struct CandlestickItem {
    pub draw_body: bool,
    pub draw_shadow: bool,
    pub candle_width: f64,
    pub filter: ColorFilter,
}

impl Default for CandlestickItem {
    fn default() -> Self {
        Self { draw_body: true, draw_shadow: true, candle_width: 0.6, filter: ColorFilter::Price }
    }
}

impl CandlestickItem {
    /// Volume bars: bodies from the zero column, no shadows.
    pub fn volume(filter: ColorFilter) -> Self {
        Self { draw_body: true, draw_shadow: false, candle_width: 0.8, filter }
    }
}

impl PlotItem for CandlestickItem {
    fn id(&self) -> &'static str { "candlestick" }
    fn lod(&self) -> bool { true }

    fn generate(&self, store: &SeriesStore, range: XRange, yscale: &YScale) -> ChartResult<DrawBuffer> {
        let rows = store.rows(5, range.left, range.right, yscale, true)?;
        let many_shadows = self.draw_shadow && rows.source_len > store.lod_threshold() * 2 / 3;
        let out = (0..rows.len())
            .map(|i| CandleRow {
                x: rows.index[i] as f64,
                open: rows.value(1, i),
                close: rows.value(2, i),
                high: rows.value(3, i),
                low: rows.value(4, i),
                tag: self.filter.classify(&rows, i),
            })
            .collect();
        Ok(DrawBuffer::Candles(CandleBuffer {
            rows: out,
            width: self.candle_width,
            shadows: self.draw_shadow,
            bodies: self.draw_body && !many_shadows,
        }))
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LineItem;

impl PlotItem for LineItem {
    fn id(&self) -> &'static str { "line" }
    fn lod(&self) -> bool { true }

    fn generate(&self, store: &SeriesStore, range: XRange, yscale: &YScale) -> ChartResult<DrawBuffer> {
        let rows = store.rows(2, range.left, range.right, yscale, true)?;
        let points = rows.index.iter().enumerate().map(|(i, &x)| (x as f64, rows.value(1, i))).collect();
        Ok(DrawBuffer::Line(LineBuffer { points }))
    }
}

/// Text at `(time, y)`; rows with a missing cell or empty text are skipped.
#[derive(Clone, Debug, PartialEq)]
pub struct LabelItem {
    pub max_labels: usize,
}

impl PlotItem for LabelItem {
    fn id(&self) -> &'static str { "labels" }
    fn lod(&self) -> bool { true }

    fn generate(&self, store: &SeriesStore, range: XRange, yscale: &YScale) -> ChartResult<DrawBuffer> {
        let rows = store.rows(3, range.left, range.right, yscale, false)?;
        let mut out = Vec::new();
        for i in 0..rows.len() {
            if rows.has_missing(i) { continue; }
            let Some(text) = rows.label(2, i).filter(|s| !s.is_empty()) else { continue };
            out.push(LabelRow { x: rows.index[i] as f64, t: rows.value(0, i), y: rows.value(1, i), text: text.to_string() });
        }
        if out.len() > self.max_labels {
            return Ok(DrawBuffer::Labels(LabelBuffer { rows: Vec::new(), suppressed: true }));
        }
        Ok(DrawBuffer::Labels(LabelBuffer { rows: out, suppressed: false }))
    }
}

/// Grid of `time x price` intensities. Data columns are named by their price.
#[derive(Clone, Debug, PartialEq)]
pub struct HeatmapItem {
    pub rect_size: f64,
    pub filter_limit: f64,
    pub whiteout: f64,
    /// One past the last price column (absolute index).
    pub col_data_end: usize,
}

impl HeatmapItem {
    pub fn new(col_data_end: usize) -> Self {
        Self { rect_size: 0.9, filter_limit: 0.0, whiteout: 0.0, col_data_end }
    }

    /// Price levels from the column names.
    pub fn prices(&self, store: &SeriesStore) -> ChartResult<Vec<f64>> {
        let table = store.table();
        let from = store.col_data_offset();
        let to = self.col_data_end.min(table.ncols());
        let prices = table.columns[from.min(to)..to]
            .iter()
            .map(|c| c.name.trim().parse::<f64>().map_err(|_| ChartError::shape(format!("heatmap column {:?} is not a price", c.name))))
            .collect::<ChartResult<Vec<f64>>>()?;
        if prices.len() < 2 {
            return Err(ChartError::shape(format!("heatmap needs at least two price columns, got {}", prices.len())));
        }
        Ok(prices)
    }
}

/// `1 - (1 - x)^4` shaping of an above-limit value.
fn color_curve(v: f64, lim: f64) -> f64 {
    let x = 1.0 - (v - lim) / (1.0 - lim);
    1.0 - x.powi(4)
}

impl PlotItem for HeatmapItem {
    fn id(&self) -> &'static str { "heatmap" }
    fn lod(&self) -> bool { false }

    fn generate(&self, store: &SeriesStore, _range: XRange, yscale: &YScale) -> ChartResult<DrawBuffer> {
        let prices = self.prices(store)?;
        let table = store.table();
        let from = store.col_data_offset();
        let cols: Vec<&[f64]> = table.columns[from..from + prices.len()]
            .iter()
            .map(|c| c.data.as_numeric().ok_or_else(|| ChartError::shape(format!("heatmap column {:?} is not numeric", c.name))))
            .collect::<ChartResult<_>>()?;

        let all = cols.iter().flat_map(|c| c.iter().copied());
        let min = all.clone().fold(f64::NAN, f64::min);
        let max = all.fold(f64::NAN, f64::max) - min;
        let scale = if max > 0.0 { max / (1.0 + self.whiteout) } else { 1.0 };
        let lim = self.filter_limit * (1.0 + self.whiteout);

        let dp = prices[0] - prices[1];
        let h0 = dp * (1.0 - self.rect_size);
        let h1 = dp * (1.0 - (1.0 - self.rect_size) * 2.0);
        let half = 0.5 * self.rect_size;
        let mut cells = Vec::new();
        for t in 0..table.len() {
            for (ci, &price) in prices.iter().enumerate() {
                let v = (cols[ci][t] - min) / scale;
                if !(v >= lim) { continue; }
                let y0 = yscale.invxform(price + h0);
                let y1 = yscale.invxform(price + h0 + h1);
                cells.push(HeatCell { x: t as f64 - half, width: self.rect_size, y: y0, height: y1 - y0, intensity: color_curve(v, lim) });
            }
        }
        Ok(DrawBuffer::Heatmap(HeatmapBuffer { cells }))
    }
}
