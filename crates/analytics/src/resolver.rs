//! Source resolver — picks the most granular dataset able to answer the
//! active cross-filter selection, falling back to coarser ones when a finer
//! dataset lacks coverage or yields no rows.

use adpulse_core::types::{Dimension, PerformanceRecord, RollupRecord};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::crossfilter::FilterSelection;
use crate::rollup;

/// A pre-joined dataset at one grain. Sources are kept ordered finest to
/// coarsest; the flat record set is registered last with full grain so any
/// rollup can be reproduced when the pre-aggregated accelerants are absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RollupSource {
    pub name: String,
    /// Dimensions this dataset is joined on. Filters on any other axis
    /// cannot be answered by this source.
    pub grain: Vec<Dimension>,
    pub records: Vec<PerformanceRecord>,
}

impl RollupSource {
    pub fn new(name: impl Into<String>, grain: Vec<Dimension>, records: Vec<PerformanceRecord>) -> Self {
        Self {
            name: name.into(),
            grain,
            records,
        }
    }

    /// Whether this source can answer every active axis of a selection.
    pub fn covers(&self, selection: &FilterSelection) -> bool {
        selection
            .active()
            .iter()
            .all(|(axis, _)| self.grain.contains(&axis.dimension()))
    }

    /// Whether this source carries real values for every listed dimension.
    /// A dimension outside the grain would collapse into the `unknown`
    /// bucket, so such a source cannot serve a rollup grouped by it.
    pub fn covers_dims(&self, dims: &[Dimension]) -> bool {
        dims.iter().all(|d| self.grain.contains(d))
    }
}

/// The outcome of source resolution: which dataset answered and the rows
/// that passed the selection. An empty resolution is a normal, renderable
/// state, never an error.
#[derive(Debug, Default)]
pub struct Resolution<'a> {
    pub source: Option<&'a str>,
    pub records: Vec<&'a PerformanceRecord>,
}

/// Walk sources finest to coarsest and return the first dataset covering
/// both the active selection and the dimensions the caller needs per-record
/// values for, with rows left once the selection is applied. Evaluated
/// fresh on every call; nothing is cached across selections.
pub fn resolve<'a>(
    sources: &'a [RollupSource],
    selection: &FilterSelection,
    dims: &[Dimension],
) -> Resolution<'a> {
    for source in sources {
        if !source.covers(selection) || !source.covers_dims(dims) {
            debug!(source = %source.name, "Source grain does not cover request, skipping");
            continue;
        }
        let records: Vec<&PerformanceRecord> = source
            .records
            .iter()
            .filter(|r| selection.matches(r))
            .collect();
        if !records.is_empty() {
            debug!(source = %source.name, rows = records.len(), "Source resolved");
            return Resolution {
                source: Some(&source.name),
                records,
            };
        }
        debug!(source = %source.name, "Source empty under selection, falling back");
    }
    Resolution::default()
}

/// Resolve, then roll the surviving rows up by the requested dimensions.
pub fn resolve_rollup(
    sources: &[RollupSource],
    selection: &FilterSelection,
    dims: &[Dimension],
) -> Vec<RollupRecord> {
    let resolution = resolve(sources, selection, dims);
    rollup::rollup(resolution.records.into_iter(), dims)
}
