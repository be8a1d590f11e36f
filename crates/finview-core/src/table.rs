// File: crates/finview-core/src/table.rs
// Summary: Raw input tables and the normalized columnar table shared by series stores.

use chrono::{DateTime, Utc};

use crate::error::{ChartError, ChartResult};
use crate::types::ColumnKind;

/// Values of one raw input column, before time normalization.
#[derive(Clone, Debug, PartialEq)]
pub enum RawValues {
    Numeric(Vec<f64>),
    Text(Vec<Option<String>>),
    Timestamps(Vec<DateTime<Utc>>),
}

impl RawValues {
    pub fn len(&self) -> usize {
        match self {
            RawValues::Numeric(v) => v.len(),
            RawValues::Text(v) => v.len(),
            RawValues::Timestamps(v) => v.len(),
        }
    }
    pub fn is_empty(&self) -> bool { self.len() == 0 }
}

#[derive(Clone, Debug, PartialEq)]
pub struct RawColumn {
    pub name: String,
    pub values: RawValues,
}

/// Tabular input as handed over by a caller: first column is time when there are two or more.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RawTable {
    pub columns: Vec<RawColumn>,
}

impl RawTable {
    pub fn new() -> Self { Self::default() }

    pub fn with_column(mut self, name: impl Into<String>, values: RawValues) -> Self {
        self.columns.push(RawColumn { name: name.into(), values });
        self
    }
    pub fn with_numeric(self, name: impl Into<String>, values: Vec<f64>) -> Self {
        self.with_column(name, RawValues::Numeric(values))
    }
    pub fn with_text<S: Into<String>>(self, name: impl Into<String>, values: Vec<Option<S>>) -> Self {
        self.with_column(name, RawValues::Text(values.into_iter().map(|v| v.map(Into::into)).collect()))
    }

    /// Single value column; the row index serves as X.
    pub fn from_values(y: Vec<f64>) -> Self {
        Self::new().with_numeric("0", y)
    }

    /// Time/x column plus one value column.
    pub fn from_xy(x: Vec<f64>, y: Vec<f64>) -> Self {
        Self::new().with_numeric("0", x).with_numeric("1", y)
    }

    pub fn ncols(&self) -> usize { self.columns.len() }
    pub fn nrows(&self) -> usize { self.columns.first().map_or(0, |c| c.values.len()) }

    pub fn validate(&self) -> ChartResult<()> {
        if self.columns.is_empty() {
            return Err(ChartError::shape("table has no columns"));
        }
        let n = self.nrows();
        if let Some(c) = self.columns.iter().find(|c| c.values.len() != n) {
            return Err(ChartError::shape(format!("column {:?} has {} rows, expected {n}", c.name, c.values.len())));
        }
        Ok(())
    }
}

/// Normalized column storage. Missing numbers are NaN, missing labels are `None`.
#[derive(Clone, Debug, PartialEq)]
pub enum ColumnData {
    Numeric(Vec<f64>),
    Label(Vec<Option<String>>),
}

impl ColumnData {
    pub fn kind(&self) -> ColumnKind {
        match self {
            ColumnData::Numeric(_) => ColumnKind::Numeric,
            ColumnData::Label(_) => ColumnKind::Label,
        }
    }
    pub fn len(&self) -> usize {
        match self {
            ColumnData::Numeric(v) => v.len(),
            ColumnData::Label(v) => v.len(),
        }
    }
    pub fn is_empty(&self) -> bool { self.len() == 0 }
    pub fn as_numeric(&self) -> Option<&[f64]> {
        match self {
            ColumnData::Numeric(v) => Some(v),
            ColumnData::Label(_) => None,
        }
    }
    pub fn as_labels(&self) -> Option<&[Option<String>]> {
        match self {
            ColumnData::Label(v) => Some(v),
            ColumnData::Numeric(_) => None,
        }
    }
    /// Numeric value at `i`; labels and out-of-range rows read as NaN.
    #[inline]
    pub fn value(&self, i: usize) -> f64 {
        match self {
            ColumnData::Numeric(v) => v.get(i).copied().unwrap_or(f64::NAN),
            ColumnData::Label(_) => f64::NAN,
        }
    }
    pub fn is_missing(&self, i: usize) -> bool {
        match self {
            ColumnData::Numeric(v) => v.get(i).map_or(true, |x| x.is_nan()),
            ColumnData::Label(v) => v.get(i).map_or(true, |x| x.is_none()),
        }
    }
    pub fn take(&self, idx: &[usize]) -> ColumnData {
        match self {
            ColumnData::Numeric(v) => ColumnData::Numeric(idx.iter().map(|&i| v.get(i).copied().unwrap_or(f64::NAN)).collect()),
            ColumnData::Label(v) => ColumnData::Label(idx.iter().map(|&i| v.get(i).cloned().flatten()).collect()),
        }
    }
    /// Gather rows by optional source index; `None` produces a missing cell.
    pub fn gather(&self, idx: &[Option<usize>]) -> ColumnData {
        match self {
            ColumnData::Numeric(v) => ColumnData::Numeric(idx.iter().map(|i| i.and_then(|i| v.get(i).copied()).unwrap_or(f64::NAN)).collect()),
            ColumnData::Label(v) => ColumnData::Label(idx.iter().map(|i| i.and_then(|i| v.get(i).cloned().flatten())).collect()),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Column {
    pub name: String,
    pub data: ColumnData,
}

impl Column {
    pub fn numeric(name: impl Into<String>, values: Vec<f64>) -> Self {
        Self { name: name.into(), data: ColumnData::Numeric(values) }
    }
    pub fn labels(name: impl Into<String>, values: Vec<Option<String>>) -> Self {
        Self { name: name.into(), data: ColumnData::Label(values) }
    }
}

/// Columnar table. Row order is the canonical X index space.
/// `generation` changes on every wholesale replacement so dependent caches can tell.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Table {
    pub columns: Vec<Column>,
    generation: u64,
}

impl Table {
    pub fn new(columns: Vec<Column>) -> Self { Self { columns, generation: 0 } }

    pub fn len(&self) -> usize { self.columns.first().map_or(0, |c| c.data.len()) }
    pub fn is_empty(&self) -> bool { self.len() == 0 }
    pub fn ncols(&self) -> usize { self.columns.len() }
    pub fn generation(&self) -> u64 { self.generation }

    /// Tables with two or more columns carry time in column 0.
    pub fn has_time_col(&self) -> bool { self.columns.len() >= 2 }

    pub fn time(&self) -> &[f64] {
        self.columns.first().and_then(|c| c.data.as_numeric()).unwrap_or(&[])
    }

    #[inline]
    pub fn value(&self, col: usize, row: usize) -> f64 {
        self.columns.get(col).map_or(f64::NAN, |c| c.data.value(row))
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Swap in new contents, keeping the generation counter moving forward.
    pub fn replace(&mut self, columns: Vec<Column>) {
        self.columns = columns;
        self.generation += 1;
    }
}
