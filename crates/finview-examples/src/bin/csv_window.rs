// File: crates/finview-examples/src/bin/csv_window.rs
// Summary: Load OHLC(V) CSV into a chart session and print the visible window and its labels.

use anyhow::{Context, Result};
use finview_core::{Chart, ChartConfig, ColorFilter, LabelZone, PanBy, RawTable, RawValues, YScale};
use std::path::Path;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let path = std::env::args().nth(1).context("usage: example-csv <ohlc.csv> [config.toml]")?;
    let cfg = match std::env::args().nth(2) {
        Some(p) => ChartConfig::load(&p).with_context(|| format!("loading config {p}"))?,
        None => ChartConfig::default(),
    };

    let data = load_csv(Path::new(&path)).with_context(|| format!("failed to load CSV '{path}'"))?;
    info!(rows = data.candles.nrows(), volume = data.volume.is_some(), "csv loaded");
    if data.candles.nrows() == 0 {
        anyhow::bail!("no rows loaded, check headers/delimiter");
    }

    let yscales = if data.volume.is_some() { vec![YScale::linear(), YScale::linear()] } else { vec![YScale::linear()] };
    let mut chart = Chart::new(cfg, &yscales)?;
    chart.zone = LabelZone::Utc;
    chart.candlestick_ochl(0, data.candles)?;
    if let Some(v) = data.volume {
        chart.volume_ocv(1, v, ColorFilter::Volume)?;
    }
    chart.init_view();
    report(&mut chart, "full range")?;

    let view = chart.view(0)?;
    let (factor, pivot) = (100.0 / view.width().max(100.0), view.x_range().right);
    chart.zoom(0, factor, pivot)?;
    report(&mut chart, "last 100 rows")?;

    chart.pan(0, PanBy::Percent(-50.0))?;
    report(&mut chart, "half a window back")?;
    Ok(())
}

fn report(chart: &mut Chart, title: &str) -> Result<()> {
    let xr = chart.view(0)?.x_range();
    let (y0, y1) = chart.view(0)?.y_range();
    let left = chart.x_label(0, xr.left.max(0.0))?;
    let right = chart.x_label(0, xr.right)?;
    println!("{title}: [{left}] .. [{right}]");
    println!("  price {} .. {}", chart.y_label(0, y0)?, chart.y_label(0, y1)?);
    if let Some(ticks) = chart.x_year_ticks(0)? {
        let years: Vec<&str> = ticks.iter().map(|(_, s)| s.as_str()).collect();
        println!("  years: {}", years.join(" "));
    }
    Ok(())
}

struct CsvData {
    candles: RawTable,
    volume: Option<RawTable>,
}

/// Header-driven column pick; time is kept as text unless every cell is numeric.
fn load_csv(path: &Path) -> Result<CsvData> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("opening {}", path.display()))?;

    let headers = rdr.headers()?.iter().map(|h| h.trim().to_lowercase()).collect::<Vec<_>>();
    let idx = |names: &[&str]| headers.iter().position(|h| names.contains(&h.as_str()));
    let i_time = idx(&["time", "timestamp", "open_time", "date", "datetime"]).context("no time column")?;
    let i_open = idx(&["open", "o"]).context("no open column")?;
    let i_close = idx(&["close", "c", "adj_close"]).context("no close column")?;
    let i_high = idx(&["high", "h"]).context("no high column")?;
    let i_low = idx(&["low", "l"]).context("no low column")?;
    let i_vol = idx(&["volume", "vol", "v"]);

    let mut time = Vec::new();
    let mut cols: [Vec<f64>; 5] = Default::default();
    let mut skipped = 0usize;
    for rec in rdr.records() {
        let rec = rec?;
        let num = |i: usize| rec.get(i).and_then(|s| s.trim().parse::<f64>().ok());
        let (Some(o), Some(c), Some(h), Some(l)) = (num(i_open), num(i_close), num(i_high), num(i_low)) else {
            skipped += 1;
            continue;
        };
        time.push(rec.get(i_time).unwrap_or_default().trim().to_string());
        cols[0].push(o);
        cols[1].push(c);
        cols[2].push(h);
        cols[3].push(l);
        cols[4].push(i_vol.and_then(num).unwrap_or(f64::NAN));
    }
    if skipped > 0 {
        warn!(skipped, "rows without open/close/high/low dropped");
    }

    let numeric: Option<Vec<f64>> = time.iter().map(|s| s.parse::<f64>().ok()).collect();
    let time = match numeric {
        Some(v) => RawValues::Numeric(v),
        None => RawValues::Text(time.into_iter().map(Some).collect()),
    };
    let [o, c, h, l, v] = cols;
    let candles = RawTable::new()
        .with_column("time", time.clone())
        .with_numeric("open", o.clone())
        .with_numeric("close", c.clone())
        .with_numeric("high", h)
        .with_numeric("low", l);
    let volume = i_vol.map(|_| {
        RawTable::new()
            .with_column("time", time)
            .with_numeric("open", o)
            .with_numeric("close", c)
            .with_numeric("volume", v)
    });
    Ok(CsvData { candles, volume })
}
