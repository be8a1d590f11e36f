// File: crates/finview-examples/src/bin/session.rs
// Summary: Scripted headless session: candles + volume + SMA overlay, then wheel, pan and a live append.

use anyhow::{Context, Result};
use finview_core::item::{CandleBuffer, HeatmapBuffer, LabelBuffer, LineBuffer};
use finview_core::{Chart, ChartConfig, ColorFilter, DrawSink, Insets, PanBy, PlotArea, RawTable, YScale};
use tracing::info;
use tracing_subscriber::EnvFilter;

const T0: f64 = 1_600_000_000_000.0;
const MINUTE: f64 = 60_000.0;

/// Prints one line per buffer instead of drawing.
#[derive(Default)]
struct PrintSink {
    primitives: usize,
}

impl DrawSink for PrintSink {
    fn candles(&mut self, row: usize, buf: &CandleBuffer) {
        let (first, last) = (buf.rows.first().map(|c| c.x), buf.rows.last().map(|c| c.x));
        println!("  row {row}: {} candles x={first:?}..{last:?} bodies={}", buf.rows.len(), buf.bodies);
        self.primitives += buf.rows.len();
    }
    fn line(&mut self, row: usize, buf: &LineBuffer) {
        println!("  row {row}: line with {} points", buf.points.len());
        self.primitives += buf.points.len();
    }
    fn labels(&mut self, row: usize, buf: &LabelBuffer) {
        println!("  row {row}: {} labels (suppressed={})", buf.rows.len(), buf.suppressed);
        self.primitives += buf.rows.len();
    }
    fn heatmap(&mut self, row: usize, buf: &HeatmapBuffer) {
        println!("  row {row}: {} heatmap cells", buf.cells.len());
        self.primitives += buf.cells.len();
    }
}

fn gen_ohlcv(n: usize) -> (RawTable, RawTable) {
    let mut t = Vec::with_capacity(n);
    let (mut o, mut c, mut h, mut l, mut v) = (Vec::new(), Vec::new(), Vec::new(), Vec::new(), Vec::new());
    let mut price = 100.0f64;
    for i in 0..n {
        t.push(T0 + i as f64 * MINUTE);
        let open = price;
        let close = open + (i as f64 * 0.05).sin() * 0.8 + 0.02;
        o.push(open);
        c.push(close);
        h.push(open.max(close) + 0.3);
        l.push(open.min(close) - 0.3);
        v.push(1_000.0 + (i as f64 * 0.11).cos().abs() * 500.0);
        price = close;
    }
    let candles = RawTable::new()
        .with_numeric("time", t.clone())
        .with_numeric("open", o.clone())
        .with_numeric("close", c.clone())
        .with_numeric("high", h)
        .with_numeric("low", l);
    let volume = RawTable::new()
        .with_numeric("time", t)
        .with_numeric("open", o)
        .with_numeric("close", c)
        .with_numeric("volume", v);
    (candles, volume)
}

fn sma(values: &[f64], w: usize) -> Vec<f64> {
    (0..values.len())
        .map(|i| if i + 1 < w { f64::NAN } else { values[i + 1 - w..=i].iter().sum::<f64>() / w as f64 })
        .collect()
}

fn paint(chart: &mut Chart, step: &str) {
    println!("{step}:");
    for (i, r) in chart.rows().iter().enumerate() {
        let x = r.view.x_range();
        let (y0, y1) = r.view.natural_y_range();
        println!("  row {i}: x=[{:.1}, {:.1}] y=[{y0:.3}, {y1:.3}]", x.left, x.right);
    }
    let mut sink = PrintSink::default();
    let n = chart.paint(&mut sink);
    info!(items = n, primitives = sink.primitives, "painted");
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cfg = match std::env::var("FINVIEW_CONFIG") {
        Ok(path) => ChartConfig::load(&path).with_context(|| format!("loading config {path}"))?,
        Err(_) => ChartConfig::default(),
    };

    let n = 2_000;
    let (candles, volume) = gen_ohlcv(n);
    let closes = match &candles.columns[2].values {
        finview_core::RawValues::Numeric(v) => v.clone(),
        _ => anyhow::bail!("close column is not numeric"),
    };

    let mut chart = Chart::new(cfg, &[YScale::linear(), YScale::linear()])?;
    let candle_item = chart.candlestick_ochl(0, candles)?;
    chart.plot(0, RawTable::from_values(sma(&closes, 20)), true)?;
    chart.volume_ocv(1, volume, ColorFilter::Volume)?;
    chart.init_view();
    paint(&mut chart, "initial");

    let area = PlotArea::new(1280.0, 720.0, Insets::default());
    chart.wheel_at(0, &area, 900.0, 300.0, -40.0, false)?;
    paint(&mut chart, "wheel zoom-in near the right side");

    chart.pan(0, PanBy::Percent(-30.0))?;
    paint(&mut chart, "pan left 30%");

    chart.pan(0, PanBy::Steps(1e10))?;
    let (more, _) = gen_ohlcv(n + 25);
    chart.update_data(candle_item, more)?;
    paint(&mut chart, "live append of 25 rows");

    let x = chart.view(0)?.x_range().right - 10.0;
    let mid = {
        let (y0, y1) = chart.view(0)?.y_range();
        (y0 + y1) / 2.0
    };
    let ch = chart.crosshair(0, x, mid)?;
    println!("crosshair: x={} ({}) y={} ({})", ch.x, ch.x_text, ch.y, ch.y_text);
    Ok(())
}
