// File: crates/finview-core/src/timeindex.rs
// Summary: Time <-> fractional row-index mapping, epoch normalization and X-axis labels.

use chrono::{DateTime, Datelike, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};

use crate::axis::format_g;
use crate::error::{ChartError, ChartResult};
use crate::series::SeriesStore;

/// Largest finite value, ignoring NaN.
fn nanmax(values: &[f64]) -> f64 {
    values.iter().fold(f64::NAN, |m, &v| m.max(v))
}

/// Bring numeric epochs to milliseconds in place: >1e13 is treated as a finer unit
/// (divided by 1e3), <1e10 as seconds (multiplied by 1e3).
pub fn normalize_epoch(values: &mut [f64]) {
    let max = nanmax(values);
    if max > 1e13 {
        values.iter_mut().for_each(|v| *v /= 1e3);
    } else if max < 1e10 {
        values.iter_mut().for_each(|v| *v *= 1e3);
    }
}

pub fn datetime_to_ms(t: &DateTime<Utc>) -> f64 {
    t.timestamp_millis() as f64
}

/// Parse a textual timestamp into epoch milliseconds (UTC for naive inputs).
pub fn parse_time(s: &str) -> ChartResult<f64> {
    let s = s.trim();
    if let Ok(t) = DateTime::parse_from_rfc3339(s) {
        return Ok(t.timestamp_millis() as f64);
    }
    for fmt in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M"] {
        if let Ok(t) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(t.and_utc().timestamp_millis() as f64);
        }
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        if let Some(t) = d.and_hms_opt(0, 0, 0) {
            return Ok(t.and_utc().timestamp_millis() as f64);
        }
    }
    Err(ChartError::TimeParse { value: s.to_string() })
}

/// Index of the first sample strictly after `t`. Sorted axes use a binary search.
fn first_after(times: &[f64], t: f64, sorted: bool) -> Option<usize> {
    if sorted {
        let i = times.partition_point(|&x| x <= t);
        (i < times.len()).then_some(i)
    } else {
        times.iter().position(|&x| x > t)
    }
}

fn is_sorted(times: &[f64]) -> bool {
    times.windows(2).all(|w| w[0] <= w[1])
}

/// Fractional row index of time `t` on the reference axis `times`, interpolated linearly
/// between the bracketing samples. Times outside the known range are rejected, except an
/// exact hit on the last sample.
pub fn time_to_index(times: &[f64], t: f64) -> ChartResult<f64> {
    let Some(&last) = times.last() else {
        return Err(ChartError::TimeAlignment { t, reason: "reference axis is empty" });
    };
    let Some(i1) = first_after(times, t, is_sorted(times)) else {
        if last == t { return Ok((times.len() - 1) as f64); }
        return Err(ChartError::TimeAlignment { t, reason: "must be placed within the prior time range" });
    };
    if i1 == 0 {
        return Err(ChartError::TimeAlignment { t, reason: "precedes the first sample" });
    }
    let i0 = i1 - 1;
    let (t0, t1) = (times[i0], times[i1]);
    Ok(i0 as f64 + (t - t0) / (t1 - t0))
}

/// Map a batch of times (any epoch resolution) onto the reference axis.
/// Only the first time may trail the axis end; later trailing times are dropped.
pub fn times_to_index(times: &[f64], ts: &[f64]) -> ChartResult<Vec<f64>> {
    let mut ts = ts.to_vec();
    normalize_epoch(&mut ts);
    let sorted = is_sorted(times);
    let last = times.last().copied().unwrap_or(f64::NAN);
    let mut out = Vec::with_capacity(ts.len());
    for (i, &t) in ts.iter().enumerate() {
        if first_after(times, t, sorted).is_none() && last != t && i > 0 {
            continue;
        }
        out.push(time_to_index(times, t)?);
    }
    Ok(out)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LabelZone {
    Local,
    Utc,
}

fn iso_string<Tz: TimeZone>(t: DateTime<Tz>, with_micros: bool) -> String
where
    Tz::Offset: std::fmt::Display,
{
    if with_micros || t.timestamp_subsec_micros() != 0 {
        t.format("%Y-%m-%d %H:%M:%S%.6f").to_string()
    } else {
        t.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

/// Format an epoch-ms time, truncated to the resolution implied by `epoch_period` (seconds).
pub fn format_time(t_ms: f64, epoch_period: f64, zone: LabelZone) -> String {
    let Some(utc) = DateTime::<Utc>::from_timestamp_micros((t_ms * 1e3) as i64) else { return String::new() };
    let fine = epoch_period < 1.0;
    let s = match zone {
        LabelZone::Utc => iso_string(utc, fine),
        LabelZone::Local => iso_string(utc.with_timezone(&Local), fine),
    };
    let end = if epoch_period >= 24.0 * 60.0 * 60.0 {
        s.find(' ').unwrap_or(s.len())
    } else if epoch_period >= 60.0 {
        s.rfind(':').unwrap_or(s.len())
    } else if epoch_period >= 1.0 {
        s.find('.').unwrap_or(s.len())
    } else if epoch_period >= 0.001 {
        s.len().saturating_sub(3)
    } else {
        s.len()
    };
    s[..end].to_string()
}

/// X-axis label for view coordinate `x`: the time of the nearest row, or `%g` of the
/// first column for stores that are not time based.
pub fn x_label(store: &mut SeriesStore, x: f64, epoch_period: f64, zone: LabelZone) -> String {
    let x = x + 0.5;
    let h = store.hilo(x, x);
    if h.is_empty() { return String::new(); }
    if !store.timebased() { return format_g(h.t0); }
    format_time(h.t0, epoch_period, zone)
}

/// Year-only label for view coordinate `x`.
pub fn x_year_label(store: &mut SeriesStore, x: f64, zone: LabelZone) -> String {
    x_label(store, x, 1.0, zone).chars().take(4).collect()
}

/// Tick indices at January 1st when the visible span is longer than `long_time_ms`.
/// `None` means regular numeric ticks should be used.
pub fn year_ticks(store: &mut SeriesStore, x0: f64, x1: f64, long_time_ms: f64) -> Option<Vec<f64>> {
    if !store.timebased() { return None; }
    let h = store.hilo(x0, x1);
    if h.is_empty() || h.t1 - h.t0 <= long_time_ms { return None; }
    let last_row = store.len().saturating_sub(1) as f64;
    let x1 = x1.min(last_row);
    let year_of = |s: &mut SeriesStore, x: f64| -> Option<i32> {
        let t = s.hilo(x + 0.5, x + 0.5);
        if t.is_empty() { return None; }
        DateTime::<Utc>::from_timestamp_millis(t.t0 as i64).map(|d| d.year())
    };
    let y0 = year_of(store, x0.max(0.0))?;
    let y1 = year_of(store, x1)?;
    let step = ((y1 - y0) / 12).max(1) as usize;
    let table = store.table();
    let times = table.time();
    let first = *times.first()?;
    let starts: Vec<f64> = (y0..=y1)
        .step_by(step)
        .filter_map(|y| Utc.with_ymd_and_hms(y, 1, 1, 0, 0, 0).single())
        .map(|d| datetime_to_ms(&d))
        .filter(|&t| t >= first)
        .collect();
    let idx = times_to_index(times, &starts).ok()?;
    Some(idx.into_iter().map(f64::ceil).collect())
}
