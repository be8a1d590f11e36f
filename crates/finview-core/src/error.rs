// File: crates/finview-core/src/error.rs
// Summary: Error taxonomy for store construction, plotting and time alignment.

use thiserror::Error;

pub type ChartResult<T> = Result<T, ChartError>;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ChartError {
    /// Input has an unexpected column count or column kind.
    #[error("data shape: {0}")]
    DataShape(String),

    /// A time lies outside the reference time axis of the row.
    #[error("time {t} cannot be placed on the reference axis: {reason}")]
    TimeAlignment { t: f64, reason: &'static str },

    #[error("cannot parse time value {value:?}")]
    TimeParse { value: String },

    #[error("invalid config: {0}")]
    Config(String),

    #[error("unknown chart row {0}")]
    UnknownRow(usize),

    #[error("unknown plot item {0}")]
    UnknownItem(usize),
}

impl ChartError {
    pub(crate) fn shape(msg: impl Into<String>) -> Self {
        ChartError::DataShape(msg.into())
    }
}
