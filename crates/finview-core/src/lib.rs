// File: crates/finview-core/src/lib.rs
// Summary: Core library entry point; exports the data-windowing engine and chart session API.

pub mod api;
pub mod axis;
pub mod chart;
pub mod config;
pub mod downsample;
pub mod error;
pub mod geometry;
pub mod hilo;
pub mod host;
pub mod item;
pub mod lod;
pub mod scale;
pub mod series;
pub mod table;
pub mod timeindex;
pub mod types;
pub mod view;

pub use axis::Precision;
pub use chart::{Chart, ChartRow, Crosshair, DataAdjust, ItemId, StoreId};
pub use config::ChartConfig;
pub use error::{ChartError, ChartResult};
pub use geometry::XRange;
pub use hilo::{HiLoCache, Lru};
pub use host::{CoordinateMapper, DrawSink, Insets, NoRepaint, PlotArea, RepaintHost};
pub use item::{CandleTag, ColorFilter, DrawBuffer, PlotItem};
pub use lod::LodCache;
pub use scale::{ScaleKind, YScale};
pub use series::{RowSet, SeriesStore};
pub use table::{RawTable, RawValues, Table};
pub use timeindex::LabelZone;
pub use types::{ColumnKind, HiLo};
pub use view::{PanBy, Viewport};
