//! Campaign analytics core — multi-dimensional rollups, cross-filtering,
//! source resolution, period comparison, and the record store.

pub mod comparison;
pub mod crossfilter;
pub mod periods;
pub mod resolver;
pub mod rollup;
pub mod store;

pub use comparison::{compare, snapshot, MetricDelta, MetricSnapshot, Trend};
pub use crossfilter::{FilterAxis, FilterSelection};
pub use periods::{
    resolve_periods, resolve_periods_with_fallback, ComparisonMode, ComparisonWindow, DateRange,
    PresetWindow, RelativePeriod,
};
pub use resolver::{resolve, resolve_rollup, Resolution, RollupSource};
pub use rollup::{rollup, rollup_by, sort_rollups, SortOrder};
pub use store::{FetchTicket, RecordStore, StoreSnapshot};
