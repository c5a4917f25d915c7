//! Comparison calculator — absolute and percentage deltas between two
//! aggregated metric snapshots, with direction-of-good metadata.

use adpulse_core::metrics::{Direction, Metric};
use adpulse_core::types::{BaseMetrics, DerivedMetrics, PerformanceRecord};
use serde::{Deserialize, Serialize};

/// All metrics of one period, summed over its records with ratios
/// recomputed from the summed bases.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricSnapshot {
    pub base: BaseMetrics,
    pub derived: DerivedMetrics,
}

impl MetricSnapshot {
    pub fn metric(&self, metric: Metric) -> f64 {
        match metric {
            Metric::Spend => self.base.spend,
            Metric::Impressions => self.base.impressions,
            Metric::Clicks => self.base.clicks,
            Metric::Conversions => self.base.conversions,
            Metric::Revenue => self.base.revenue,
            Metric::Reach => self.base.reach,
            Metric::Ctr => self.derived.ctr,
            Metric::Cpc => self.derived.cpc,
            Metric::Cpm => self.derived.cpm,
            Metric::Cpa => self.derived.cpa,
            Metric::ConversionRate => self.derived.conversion_rate,
            Metric::Roas => self.derived.roas,
        }
    }
}

/// Aggregate one period's records into a snapshot.
pub fn snapshot<'a, I>(records: I) -> MetricSnapshot
where
    I: IntoIterator<Item = &'a PerformanceRecord>,
{
    let mut base = BaseMetrics::default();
    for record in records {
        base.absorb(record);
    }
    MetricSnapshot {
        base,
        derived: DerivedMetrics::from_base(&base),
    }
}

/// Whether a delta moved the metric in its good direction. Presentation
/// metadata only; the arithmetic is identical for every metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Favorable,
    Unfavorable,
    Flat,
}

/// One metric's comparison between the current and previous period.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricDelta {
    pub metric: Metric,
    pub current: f64,
    pub previous: f64,
    pub delta: f64,
    pub delta_percent: f64,
    pub direction: Direction,
    pub trend: Trend,
}

/// Compare two snapshots across every metric.
pub fn compare(current: &MetricSnapshot, previous: &MetricSnapshot) -> Vec<MetricDelta> {
    Metric::ALL
        .iter()
        .map(|&metric| compare_metric(metric, current.metric(metric), previous.metric(metric)))
        .collect()
}

fn compare_metric(metric: Metric, current: f64, previous: f64) -> MetricDelta {
    let delta = current - previous;
    let delta_percent = if previous > 0.0 {
        delta / previous * 100.0
    } else if current > 0.0 {
        100.0
    } else {
        0.0
    };

    let direction = metric.direction();
    let trend = if delta == 0.0 {
        Trend::Flat
    } else {
        let improved = match direction {
            Direction::HigherIsBetter => delta > 0.0,
            Direction::LowerIsBetter => delta < 0.0,
        };
        if improved {
            Trend::Favorable
        } else {
            Trend::Unfavorable
        }
    };

    MetricDelta {
        metric,
        current,
        previous,
        delta,
        delta_percent,
        direction,
        trend,
    }
}
