// File: crates/finview-core/src/lod.rs
// Summary: Per-item level-of-detail cache: regenerates a draw buffer only when the view leaves it.

use tracing::debug;

use crate::geometry::XRange;

/// Draw buffer plus the row range it was generated for.
/// Regeneration covers `factor` widths starting one width left of the visible range,
/// so small pans in either direction stay inside the buffer.
#[derive(Debug)]
pub struct LodCache<B> {
    dirty: bool,
    lod: bool,
    factor: f64,
    cached: XRange,
    buffer: Option<B>,
    regenerations: u64,
}

impl<B> LodCache<B> {
    /// `lod` false means the buffer covers all data and only `mark_dirty` triggers a rebuild.
    pub fn new(lod: bool, factor: f64) -> Self {
        Self { dirty: true, lod, factor, cached: XRange { left: 0.0, right: 0.0 }, buffer: None, regenerations: 0 }
    }

    pub fn is_dirty(&self) -> bool { self.dirty }
    pub fn lod(&self) -> bool { self.lod }
    pub fn cached_range(&self) -> XRange { self.cached }
    pub fn buffer(&self) -> Option<&B> { self.buffer.as_ref() }
    pub fn regenerations(&self) -> u64 { self.regenerations }

    pub fn mark_dirty(&mut self) { self.dirty = true; }

    pub fn needs_regen(&self, visible: XRange) -> bool {
        self.dirty
            || (self.lod
                && (!self.cached.contains(&visible) || visible.width() < self.cached.width() / self.factor))
    }

    /// Range a regeneration for `visible` would cover.
    pub fn margin_range(&self, visible: XRange) -> XRange {
        let w = visible.width();
        XRange::from_lw(visible.left - w, self.factor * w)
    }

    /// Return the buffer for `visible`, rebuilding it through `generate` when stale.
    /// A failed rebuild leaves the cache dirty and the previous buffer in place.
    pub fn ensure_fresh<E, F>(&mut self, visible: XRange, generate: F) -> Result<&B, E>
    where
        F: FnOnce(XRange) -> Result<B, E>,
    {
        let stale = self.needs_regen(visible);
        let buf = match self.buffer.take() {
            Some(b) if !stale => b,
            previous => {
                let range = self.margin_range(visible);
                match generate(range) {
                    Ok(b) => {
                        self.cached = range;
                        self.dirty = false;
                        self.regenerations += 1;
                        debug!(left = range.left, right = range.right, n = self.regenerations, "lod buffer regenerated");
                        b
                    }
                    Err(e) => {
                        self.buffer = previous;
                        return Err(e);
                    }
                }
            }
        };
        Ok(&*self.buffer.insert(buf))
    }
}
