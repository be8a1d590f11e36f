// File: crates/finview-core/src/downsample.rs
// Summary: Level-of-detail stride decimation over row ranges.

/// Stride that keeps at most `threshold` rows out of `len`.
#[inline]
pub fn lod_stride(len: usize, threshold: usize) -> usize {
    if threshold == 0 || len <= threshold { 1 } else { len.div_ceil(threshold) }
}

/// Row indices of the inclusive slice `[x0, x1]` of a table with `len` rows.
/// Fractional bounds select every row whose index lies inside them.
pub fn slice_bounds(len: usize, x0: f64, x1: f64) -> Option<(usize, usize)> {
    if len == 0 || x0.is_nan() || x1.is_nan() { return None; }
    let start = x0.ceil().max(0.0);
    let end = x1.floor().min((len - 1) as f64);
    if start > end { return None; }
    Some((start as usize, end as usize))
}

/// Indices of `[x0, x1]`, decimated by stride when `lod` is set and the slice is too long.
/// Returns the picked indices and the un-decimated slice length.
pub fn decimate_indices(len: usize, x0: f64, x1: f64, threshold: usize, lod: bool) -> (Vec<usize>, usize) {
    let Some((start, end)) = slice_bounds(len, x0, x1) else { return (Vec::new(), 0) };
    let n = end - start + 1;
    let stride = if lod { lod_stride(n, threshold) } else { 1 };
    ((start..=end).step_by(stride).collect(), n)
}
