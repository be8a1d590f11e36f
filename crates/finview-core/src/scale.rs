// File: crates/finview-core/src/scale.rs
// Summary: Y-scale transform between natural values and view space (linear/log10, magnitude factor).

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScaleKind {
    Linear,
    Log10,
}

/// Stateless value transform. `xform` maps view space to natural units, `invxform` the reverse.
/// Log scales never carry a magnitude factor.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct YScale {
    pub kind: ScaleKind,
    factor: f64,
}

impl Default for YScale {
    fn default() -> Self { Self::linear() }
}

impl YScale {
    pub const fn linear() -> Self { Self { kind: ScaleKind::Linear, factor: 1.0 } }
    pub const fn log10() -> Self { Self { kind: ScaleKind::Log10, factor: 1.0 } }
    pub fn new(kind: ScaleKind) -> Self { Self { kind, factor: 1.0 } }

    #[inline]
    pub fn factor(&self) -> f64 { self.factor }
    #[inline]
    pub fn is_log(&self) -> bool { self.kind == ScaleKind::Log10 }

    /// Set the magnitude-compression factor; ignored (reset to 1) on log scales.
    pub fn set_factor(&mut self, factor: f64) {
        self.factor = if self.is_log() { 1.0 } else { factor };
    }

    /// True when rows can be handed to the host untransformed.
    pub fn is_identity(&self) -> bool { !self.is_log() && self.factor == 1.0 }

    #[inline]
    pub fn xform(&self, y: f64) -> f64 {
        let y = if self.is_log() { 10f64.powf(y) } else { y };
        y * self.factor
    }

    #[inline]
    pub fn invxform(&self, y: f64) -> f64 {
        if self.is_log() { y.log10() } else { y / self.factor }
    }

    /// Like `invxform`, but non-positive values on a log scale map to -1e6 instead of NaN.
    #[inline]
    pub fn invxform_verified(&self, y: f64) -> f64 {
        if self.is_log() && y <= 0.0 { return -1e6; }
        self.invxform(y)
    }
}
