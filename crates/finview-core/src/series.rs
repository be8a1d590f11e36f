// File: crates/finview-core/src/series.rs
// Summary: Series store: time-normalized columnar data, scale columns, merge/update and row slicing.
// Notes:
// - Stores merged onto one time axis alias the same `Table` through `TableRef`.
// - Everything here runs on the chart's event-loop thread; `Rc<RefCell<_>>` is the sharing primitive.

use std::cell::{Ref, RefCell};
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

use tracing::{debug, warn};

use crate::axis::{calc_significant_decimals, Precision};
use crate::config::ChartConfig;
use crate::downsample::decimate_indices;
use crate::error::{ChartError, ChartResult};
use crate::hilo::HiLoCache;
use crate::scale::YScale;
use crate::table::{Column, ColumnData, RawTable, RawValues, Table};
use crate::timeindex::{datetime_to_ms, normalize_epoch, parse_time};
use crate::types::{ColumnKind, HiLo};

pub type TableRef = Rc<RefCell<Table>>;

/// Marker appended to colliding column names on merge.
pub const RENAME_MARKER: char = '+';

/// Decimated slice of a store: row indices plus time and the requested value columns.
#[derive(Clone, Debug, PartialEq)]
pub struct RowSet {
    pub index: Vec<usize>,
    /// Column 0 is time; the rest are data columns, numeric ones in view space.
    pub columns: Vec<ColumnData>,
    /// Slice length before decimation.
    pub source_len: usize,
}

impl RowSet {
    pub fn len(&self) -> usize { self.index.len() }
    pub fn is_empty(&self) -> bool { self.index.is_empty() }
    #[inline]
    pub fn value(&self, col: usize, i: usize) -> f64 {
        self.columns.get(col).map_or(f64::NAN, |c| c.value(i))
    }
    pub fn label(&self, col: usize, i: usize) -> Option<&str> {
        self.columns.get(col)?.as_labels()?.get(i)?.as_deref()
    }
    /// True when any requested cell of row `i` is missing.
    pub fn has_missing(&self, i: usize) -> bool {
        self.columns.iter().any(|c| c.is_missing(i))
    }
}

/// More than `ratio` of the rows being gaps or time reversals marks a standalone series.
/// The ratio is a policy knob carried in `ChartConfig`, not a derived bound.
pub fn is_standalone(time: &[f64], ratio: f64) -> bool {
    let nulls = time.iter().filter(|t| t.is_nan()).count();
    let reversals = time.windows(2).filter(|w| w[1] - w[0] <= 0.0).count();
    (nulls + reversals) as f64 > time.len() as f64 * ratio
}

fn convert_column(name: String, values: RawValues) -> Column {
    match values {
        RawValues::Numeric(v) => Column::numeric(name, v),
        RawValues::Text(v) => Column::labels(name, v),
        RawValues::Timestamps(v) => Column::numeric(name, v.iter().map(datetime_to_ms).collect()),
    }
}

fn convert_time_column(name: String, values: RawValues) -> ChartResult<Column> {
    let ms = match values {
        RawValues::Numeric(mut v) => {
            // small trailing values are plain indices, not epochs
            let isnum = v.last().is_some_and(|&t| t < 1e7);
            if !isnum { normalize_epoch(&mut v); }
            v
        }
        RawValues::Text(v) => v
            .iter()
            .map(|s| s.as_deref().map_or(Ok(f64::NAN), parse_time))
            .collect::<ChartResult<Vec<f64>>>()?,
        RawValues::Timestamps(v) => v.iter().map(datetime_to_ms).collect(),
    };
    Ok(Column::numeric(name, ms))
}

fn numeric_cols(table: &Table, from: usize) -> Vec<usize> {
    (from..table.ncols()).filter(|&i| table.columns[i].data.kind() == ColumnKind::Numeric).collect()
}

fn time_key(t: f64) -> u64 {
    // -0.0 and 0.0 must join
    if t == 0.0 { 0 } else { t.to_bits() }
}

/// Join keys for a time column: the k-th copy of a time gets occurrence k.
fn occurrence_keys(time: &[f64]) -> Vec<(OrdF64, usize)> {
    let mut seen: HashMap<u64, usize> = HashMap::new();
    time.iter()
        .map(|&t| {
            let k = seen.entry(time_key(t)).or_insert(0);
            let key = (OrdF64(if t == 0.0 { 0.0 } else { t }), *k);
            *k += 1;
            key
        })
        .collect()
}

/// Time-indexed data of one logical source.
pub struct SeriesStore {
    table: TableRef,
    col_data_offset: usize,
    scale_cols: Vec<usize>,
    standalone: bool,
    monotonic: bool,
    renames: HashMap<String, String>,
    hilo: HiLoCache,
    right_margin: usize,
    lod_threshold: usize,
    init_x: (f64, f64),
}

impl std::fmt::Debug for SeriesStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SeriesStore")
            .field("rows", &self.len())
            .field("columns", &self.table().names())
            .field("col_data_offset", &self.col_data_offset)
            .field("scale_cols", &self.scale_cols)
            .field("standalone", &self.standalone)
            .finish()
    }
}

impl SeriesStore {
    /// Build a store from raw input. Tables with two or more columns carry time in column 0.
    pub fn normalize(raw: RawTable, cfg: &ChartConfig) -> ChartResult<Self> {
        raw.validate()?;
        let has_time = raw.ncols() >= 2;
        let mut columns = Vec::with_capacity(raw.ncols());
        for (i, c) in raw.columns.into_iter().enumerate() {
            if i == 0 && has_time {
                columns.push(convert_time_column(c.name, c.values)?);
            } else {
                columns.push(convert_column(c.name, c.values));
            }
        }
        let table = Table::new(columns);
        let (offset, standalone) = if has_time {
            (1, is_standalone(table.time(), cfg.standalone_ratio))
        } else {
            (0, false)
        };
        if standalone {
            warn!(rows = table.len(), "time column has many gaps or reversals; series is standalone");
        }
        let scale_cols = numeric_cols(&table, offset);
        let monotonic = table.time().windows(2).all(|w| w[0] <= w[1]);
        debug!(rows = table.len(), cols = table.ncols(), ?scale_cols, "series store created");
        Ok(Self {
            table: Rc::new(RefCell::new(table)),
            col_data_offset: offset,
            scale_cols,
            standalone,
            monotonic,
            renames: HashMap::new(),
            hilo: HiLoCache::new(cfg.hilo_capacity),
            right_margin: cfg.right_margin,
            lod_threshold: cfg.lod_threshold,
            init_x: (-0.5, -0.5),
        })
    }

    pub fn table(&self) -> Ref<'_, Table> { self.table.borrow() }
    pub fn table_ref(&self) -> TableRef { Rc::clone(&self.table) }
    /// True when both stores read the same underlying table.
    pub fn shares_table(&self, other: &SeriesStore) -> bool { Rc::ptr_eq(&self.table, &other.table) }

    pub fn len(&self) -> usize { self.table.borrow().len() }
    pub fn is_empty(&self) -> bool { self.len() == 0 }
    pub fn ncols(&self) -> usize { self.table.borrow().ncols() }
    pub fn col_data_offset(&self) -> usize { self.col_data_offset }
    pub fn standalone(&self) -> bool { self.standalone }
    pub fn is_monotonic(&self) -> bool { self.monotonic }
    pub fn renames(&self) -> &HashMap<String, String> { &self.renames }
    pub fn lod_threshold(&self) -> usize { self.lod_threshold }
    pub fn hilo_cache(&self) -> &HiLoCache { &self.hilo }

    pub fn scale_cols(&self) -> &[usize] { &self.scale_cols }

    /// Default: every numeric data column. Callers may narrow it (e.g. candle high/low).
    pub fn scale_relevant_columns(&self) -> Vec<usize> {
        numeric_cols(&self.table.borrow(), self.col_data_offset)
    }

    /// Replace the scale columns. Label columns are rejected since they never scale.
    pub fn set_scale_cols(&mut self, cols: Vec<usize>) -> ChartResult<()> {
        {
            let table = self.table.borrow();
            for &c in &cols {
                match table.columns.get(c) {
                    None => return Err(ChartError::shape(format!("scale column {c} out of range ({} columns)", table.ncols()))),
                    Some(col) if col.data.kind() != ColumnKind::Numeric => {
                        return Err(ChartError::shape(format!("scale column {c} ({:?}) is not numeric", col.name)))
                    }
                    Some(_) => {}
                }
            }
        }
        self.scale_cols = cols;
        self.hilo.invalidate();
        Ok(())
    }

    /// Row count plus the right-hand margin of empty cells.
    pub fn xlen(&self) -> usize { self.len() + self.right_margin }

    pub fn timebased(&self) -> bool {
        self.table.borrow().time().last().is_some_and(|&t| t > 1e7)
    }

    /// Median time step in seconds.
    pub fn period(&self) -> f64 {
        let table = self.table.borrow();
        let mut diffs: Vec<f64> = table.time().windows(2).map(|w| w[1] - w[0]).filter(|d| !d.is_nan()).collect();
        if diffs.is_empty() { return f64::NAN; }
        diffs.sort_by(f64::total_cmp);
        let n = diffs.len();
        let median = if n % 2 == 1 { diffs[n / 2] } else { (diffs[n / 2 - 1] + diffs[n / 2]) / 2.0 };
        median / 1000.0
    }

    /// Largest numeric data value, used to detect magnitudes that need compression.
    pub fn max_value(&self) -> f64 {
        let table = self.table.borrow();
        let from = usize::from(table.has_time_col());
        table.columns[from..]
            .iter()
            .filter_map(|c| c.data.as_numeric())
            .flat_map(|v| v.iter().copied())
            .fold(f64::NAN, f64::max)
    }

    pub fn update_init_x(&mut self, init_steps: f64) {
        let xlen = self.xlen() as f64;
        self.init_x = ((xlen - init_steps).max(0.0) - 0.5, xlen - 0.5);
    }
    pub fn init_x(&self) -> (f64, f64) { self.init_x }

    /// Time value of row `floor(x)`.
    pub fn closest_time(&self, x: f64) -> Option<f64> {
        if x < 0.0 || x.is_nan() { return None; }
        let table = self.table.borrow();
        table.time().get(x as usize).copied()
    }

    /// Numeric values of absolute column `col`.
    pub fn column_values(&self, col: usize) -> ChartResult<Vec<f64>> {
        let table = self.table.borrow();
        let c = table.columns.get(col)
            .ok_or_else(|| ChartError::shape(format!("column {col} requested from a {}-column store", table.ncols())))?;
        c.data.as_numeric()
            .map(<[f64]>::to_vec)
            .ok_or_else(|| ChartError::shape(format!("column {:?} is not numeric", c.name)))
    }

    /// First data column.
    pub fn y(&self) -> ChartResult<Vec<f64>> { self.column_values(self.col_data_offset) }
    /// Second data column.
    pub fn z(&self) -> ChartResult<Vec<f64>> { self.column_values(self.col_data_offset + 1) }

    /// Precision from `z` when more than one column scales, else from `y`.
    /// Missing or degenerate columns give `None`.
    pub fn calc_significant_decimals(&self) -> Option<Precision> {
        let values = if self.scale_cols.len() > 1 { self.z() } else { self.y() };
        calc_significant_decimals(&values.ok()?)
    }

    /// Reorder `(time, open, close, volume)` input into `(time, zero, volume, open, close)`
    /// so volume bars render as bodies from a zero baseline; only baseline and volume scale.
    pub fn adjust_for_volume(&mut self) -> ChartResult<()> {
        let mut table = self.table.borrow_mut();
        let n = table.len();
        let mut cols = table.columns.clone();
        if cols.len() < 4 {
            return Err(ChartError::shape(format!("volume needs time, open, close and volume columns, got {}", cols.len())));
        }
        if cols.len() <= 4 {
            cols.insert(3, Column::numeric("_zero_", vec![0.0; n]));
        }
        let order = [0usize, 3, 4, 1, 2];
        let mut picked: Vec<Column> = order.iter().map(|&i| cols[i].clone()).collect();
        picked.extend(cols.into_iter().skip(5));
        table.replace(picked);
        drop(table);
        self.scale_cols = vec![1, 2];
        self.hilo.invalidate();
        Ok(())
    }

    /// Union `other` onto this store's time axis (outer join on time, or by row position
    /// when either side lacks a time column). Repeated times pair up by occurrence. A store
    /// without time adopts the time column of `other`. Colliding names in `other` get
    /// `RENAME_MARKER` appended and the rename is recorded on `other`. Afterwards both
    /// stores share one table.
    pub fn merge(&mut self, other: &mut SeriesStore) -> ChartResult<()> {
        if self.shares_table(other) { return Ok(()); }
        let merged = {
            let mine = self.table.borrow();
            let theirs = other.table.borrow();
            let their_time = usize::from(theirs.has_time_col());
            let by_time = theirs.has_time_col() && mine.has_time_col();
            let adopt_time = theirs.has_time_col() && !mine.has_time_col();

            let mut taken: Vec<String> = mine.columns.iter().map(|c| c.name.clone()).collect();
            let adopted_name = adopt_time.then(|| {
                let mut name = theirs.columns[0].name.clone();
                while taken.contains(&name) {
                    name.push(RENAME_MARKER);
                }
                taken.push(name.clone());
                name
            });
            // rename colliding columns of `other`
            let mut new_names = Vec::new();
            for c in &theirs.columns[their_time..] {
                let mut name = c.name.clone();
                while taken.contains(&name) {
                    name.push(RENAME_MARKER);
                }
                if name != c.name {
                    other.renames.insert(c.name.clone(), name.clone());
                }
                taken.push(name.clone());
                new_names.push(name);
            }

            let (rows_mine, rows_theirs, time) = if by_time {
                let mut union: BTreeMap<(OrdF64, usize), (Option<usize>, Option<usize>)> = BTreeMap::new();
                for (i, key) in occurrence_keys(mine.time()).into_iter().enumerate() {
                    union.entry(key).or_insert((None, None)).0 = Some(i);
                }
                for (i, key) in occurrence_keys(theirs.time()).into_iter().enumerate() {
                    union.entry(key).or_insert((None, None)).1 = Some(i);
                }
                let time: Vec<f64> = union.keys().map(|k| k.0 .0).collect();
                let (a, b): (Vec<_>, Vec<_>) = union.into_values().unzip();
                (a, b, Some(time))
            } else {
                let n = mine.len().max(theirs.len());
                let a: Vec<_> = (0..n).map(|i| (i < mine.len()).then_some(i)).collect();
                let b: Vec<_> = (0..n).map(|i| (i < theirs.len()).then_some(i)).collect();
                (a, b, None)
            };

            let mut columns = Vec::with_capacity(taken.len());
            if let Some(name) = adopted_name {
                columns.push(Column { name, data: theirs.columns[0].data.gather(&rows_theirs) });
            }
            let mine_shift = columns.len();
            for (i, c) in mine.columns.iter().enumerate() {
                let data = match (&time, i) {
                    (Some(t), 0) => ColumnData::Numeric(t.clone()),
                    _ => c.data.gather(&rows_mine),
                };
                columns.push(Column { name: c.name.clone(), data });
            }
            let base = columns.len();
            for (c, name) in theirs.columns[their_time..].iter().zip(new_names) {
                columns.push(Column { name, data: c.data.gather(&rows_theirs) });
            }

            let new_scale: Vec<usize> = other.scale_cols.iter().filter(|&&c| c >= their_time).map(|&c| c - their_time + base).collect();
            (columns, new_scale, mine_shift, base)
        };
        let (columns, new_scale, mine_shift, base) = merged;
        self.table.borrow_mut().replace(columns);
        if mine_shift > 0 {
            self.col_data_offset += mine_shift;
            self.scale_cols.iter_mut().for_each(|c| *c += mine_shift);
        }
        self.scale_cols.extend(new_scale.iter().copied());
        self.monotonic = self.table.borrow().time().windows(2).all(|w| w[0] <= w[1]);
        self.hilo.invalidate();

        other.table = Rc::clone(&self.table);
        other.col_data_offset = base;
        other.scale_cols = new_scale;
        other.monotonic = self.monotonic;
        other.init_x = self.init_x;
        other.hilo.invalidate();
        debug!(cols = self.ncols(), rows = self.len(), renames = other.renames.len(), "stores merged");
        Ok(())
    }

    /// Replace the data wholesale with `fresh`, matching columns through the rename map.
    /// Columns missing from `fresh` are carried forward, aligned on time; the column set
    /// and order of the current table are kept.
    pub fn update(&mut self, fresh: SeriesStore) -> ChartResult<()> {
        let new_columns = {
            let old = self.table.borrow();
            let new = fresh.table.borrow();
            if old.ncols() == 0 {
                return Err(ChartError::shape("cannot update an empty store"));
            }
            if !new.has_time_col() {
                return Err(ChartError::shape("live update needs a time column"));
            }
            let new_time = new.time().to_vec();
            let old_rows: HashMap<u64, usize> = old.time().iter().enumerate().map(|(i, &t)| (time_key(t), i)).collect();
            let carry: Vec<Option<usize>> = new_time.iter().map(|&t| old_rows.get(&time_key(t)).copied()).collect();
            let renamed: HashMap<&str, usize> = new.columns.iter().enumerate().skip(1)
                .map(|(i, c)| (self.renames.get(&c.name).map_or(c.name.as_str(), String::as_str), i))
                .collect();

            let mut columns = Vec::with_capacity(old.ncols());
            columns.push(Column { name: old.columns[0].name.clone(), data: ColumnData::Numeric(new_time) });
            for c in &old.columns[1..] {
                let data = match renamed.get(c.name.as_str()) {
                    Some(&i) => new.columns[i].data.clone(),
                    None => c.data.gather(&carry),
                };
                columns.push(Column { name: c.name.clone(), data });
            }
            columns
        };
        self.table.borrow_mut().replace(new_columns);
        self.monotonic = self.table.borrow().time().windows(2).all(|w| w[0] <= w[1]);
        self.init_x.1 = self.xlen() as f64 - 0.5;
        self.hilo.invalidate();
        debug!(rows = self.len(), "series store updated");
        Ok(())
    }

    /// (t0, t1, hi, lo, count) over the canonicalized integer rows of `[x0, x1]`.
    pub fn hilo(&mut self, x0: f64, x1: f64) -> HiLo {
        let table = self.table.borrow();
        self.hilo.query(&table, &self.scale_cols, x0, x1)
    }

    /// Time plus `colcnt - 1` data columns over rows `[x0, x1]`, stride-decimated above the
    /// LOD threshold, numeric values converted into view space of `yscale`.
    pub fn rows(&self, colcnt: usize, x0: f64, x1: f64, yscale: &YScale, lod: bool) -> ChartResult<RowSet> {
        self.rows_limited(colcnt, x0, x1, yscale, lod.then_some(self.lod_threshold))
    }

    /// Like `rows`, with an explicit decimation limit (`None` keeps every row).
    pub fn rows_limited(&self, colcnt: usize, x0: f64, x1: f64, yscale: &YScale, max_points: Option<usize>) -> ChartResult<RowSet> {
        let table = self.table.borrow();
        let ndata = colcnt.saturating_sub(1);
        if self.col_data_offset + ndata > table.ncols() {
            return Err(ChartError::shape(format!(
                "{colcnt} columns requested from offset {} of a {}-column store",
                self.col_data_offset,
                table.ncols()
            )));
        }
        let (index, source_len) = decimate_indices(table.len(), x0, x1, max_points.unwrap_or(0), max_points.is_some());
        let mut columns = Vec::with_capacity(ndata + 1);
        columns.push(table.columns[0].data.take(&index));
        for c in self.col_data_offset..self.col_data_offset + ndata {
            let mut data = table.columns[c].data.take(&index);
            if !yscale.is_identity() {
                if let ColumnData::Numeric(v) = &mut data {
                    v.iter_mut().for_each(|y| *y = yscale.invxform(*y));
                }
            }
            columns.push(data);
        }
        Ok(RowSet { index, columns, source_len })
    }
}

/// Total-order wrapper so time values can key a `BTreeMap`.
#[derive(Clone, Copy, Debug)]
struct OrdF64(f64);

impl PartialEq for OrdF64 {
    fn eq(&self, other: &Self) -> bool { self.0.total_cmp(&other.0).is_eq() }
}
impl Eq for OrdF64 {}
impl PartialOrd for OrdF64 {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> { Some(self.cmp(other)) }
}
impl Ord for OrdF64 {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering { self.0.total_cmp(&other.0) }
}
