// File: crates/finview-core/src/axis.rs
// Summary: Value-axis precision: significant decimals, label rounding and grid snapping.

use tracing::warn;

use crate::scale::YScale;

/// Number of decimals shown on the value axis and the smallest meaningful value step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Precision {
    pub decimals: usize,
    pub eps: f64,
}

impl Precision {
    pub const fn new(decimals: usize, eps: f64) -> Self { Self { decimals, eps } }

    fn has_default_decimals(&self, defaults: &Precision) -> bool {
        let r = self.decimals as f64 / defaults.decimals.max(1) as f64;
        0.99 < r && r < 1.01
    }

    fn has_default_eps(&self, defaults: &Precision) -> bool {
        let r = self.eps / defaults.eps;
        0.99 < r && r < 1.01
    }

    /// Merge a freshly computed precision into this one.
    /// Applied when forced or while still at defaults; decimals only grow and eps only shrinks
    /// unless the current value is a default. A missing candidate keeps the current precision.
    pub fn update(&mut self, candidate: Option<Precision>, defaults: &Precision, force: bool) {
        let default_dec = self.has_default_decimals(defaults);
        let default_eps = self.has_default_eps(defaults);
        if !(force || (default_dec && default_eps)) { return; }
        let Some(c) = candidate else {
            warn!("no significant decimals derivable from data, keeping {} decimals", self.decimals);
            return;
        };
        if default_dec || c.decimals > self.decimals { self.decimals = c.decimals; }
        if default_eps || c.eps < self.eps { self.eps = c.eps; }
    }
}

/// Precision implied by the smallest absolute step between consecutive values.
/// All-NaN and constant columns have no usable step and yield `None`.
pub fn calc_significant_decimals(values: &[f64]) -> Option<Precision> {
    let mut smallest = f64::NAN;
    for w in values.windows(2) {
        let mut d = (w[1] - w[0]).abs();
        if d < 1e-30 { d = 1e30; }
        smallest = smallest.min(d);
    }
    if smallest.is_nan() || smallest >= 1e30 { return None; }
    let exp = exponent_of(smallest)?;
    let decimals = (-exp).clamp(1, 10) as usize;
    Some(Precision { decimals, eps: smallest })
}

/// Decimal exponent of `x` after rounding to one significant digit (as `%.0e` prints it).
fn exponent_of(x: f64) -> Option<i32> {
    let s = format!("{x:.0e}");
    s.split_once('e').and_then(|(_, e)| e.parse().ok())
}

/// Format `x` for the value axis.
/// High-resolution ranges (many eps steps over tiny or huge magnitudes) switch to scientific form.
pub fn round_to_significant(rng: f64, rngmax: f64, x: f64, p: Precision) -> String {
    let is_highres = rng / p.eps > 1e2 && (rngmax > 1e7 || rngmax < 1e-2);
    let sd = p.decimals;
    if is_highres && x.abs() > 0.0 {
        let exp10 = x.abs().log10().floor();
        let m = x / 10f64.powf(exp10);
        let sd = (sd as i64 + rngmax.log10() as i64).clamp(0, 5) as usize;
        format!("{m:sd$.sd$}e{}", exp10 as i64)
    } else {
        let mut eps = x % p.eps;
        if eps.abs() >= p.eps / 2.0 {
            // round up
            eps -= eps.signum() * p.eps;
        }
        format!("{:sd$.sd$}", x - eps)
    }
}

/// Snap a view-space point to the value grid: integer X, Y on multiples of `eps` in natural units.
pub fn clamp_xy(x: f64, y: f64, yscale: &YScale, eps: f64, clamp_grid: bool) -> (f64, f64) {
    let mut x = x;
    let mut y = yscale.xform(y);
    if clamp_grid {
        x = x.round_ties_even();
        let sign = if y > 0.0 { 1.0 } else if y < 0.0 { -1.0 } else { 0.0 };
        let eps2 = sign * 0.5 * eps;
        y -= (y + eps2) % eps - eps2;
    }
    (x, yscale.invxform_verified(y))
}

/// `%g`-style formatting: six significant digits, trailing zeros dropped.
pub fn format_g(v: f64) -> String {
    if v.is_nan() { return "nan".into(); }
    if v.is_infinite() { return if v > 0.0 { "inf".into() } else { "-inf".into() }; }
    if v == 0.0 { return "0".into(); }
    let sci = format!("{v:.5e}");
    let Some((mant, exp)) = sci.split_once('e') else { return sci };
    let exp: i32 = exp.parse().unwrap_or(0);
    if !(-4..6).contains(&exp) {
        let sign = if exp < 0 { '-' } else { '+' };
        format!("{}e{sign}{:02}", trim_zeros(mant), exp.abs())
    } else {
        let decimals = (5 - exp).max(0) as usize;
        trim_zeros(&format!("{v:.decimals$}"))
    }
}

fn trim_zeros(s: &str) -> String {
    if s.contains('.') { s.trim_end_matches('0').trim_end_matches('.').to_string() } else { s.to_string() }
}

/// Tick label for a view-space Y value.
pub fn y_tick_label(yscale: &YScale, value: f64) -> String {
    format_g(yscale.xform(value))
}
