//! Core data model — performance records, rollup keys, and aggregated buckets.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::metrics::{self, Metric};

/// Bucket label used when an optional dimension is absent from a record.
pub const UNKNOWN_DIMENSION: &str = "unknown";

/// One row of campaign activity, as fetched from the analytics API.
///
/// Immutable once fetched; the record store replaces the whole set on
/// refetch, there is no partial mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceRecord {
    pub date: NaiveDate,
    pub platform: String,
    pub channel: String,
    #[serde(default)]
    pub funnel_stage: Option<String>,
    #[serde(default)]
    pub device: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub ad_type: Option<String>,
    #[serde(default)]
    pub placement: Option<String>,
    #[serde(default)]
    pub spend: f64,
    #[serde(default)]
    pub impressions: f64,
    #[serde(default)]
    pub clicks: f64,
    #[serde(default)]
    pub conversions: f64,
    #[serde(default)]
    pub revenue: f64,
    #[serde(default)]
    pub reach: f64,
}

impl PerformanceRecord {
    /// Calendar month of this record, formatted `YYYY-MM`.
    pub fn month(&self) -> String {
        format!("{:04}-{:02}", self.date.year(), self.date.month())
    }

    /// Clamp malformed base metrics to zero. Missing fields already default
    /// to zero at deserialization; negative or non-finite values are logged
    /// and zeroed rather than rejected.
    pub fn sanitize(&mut self) {
        for (name, value) in [
            ("spend", &mut self.spend),
            ("impressions", &mut self.impressions),
            ("clicks", &mut self.clicks),
            ("conversions", &mut self.conversions),
            ("revenue", &mut self.revenue),
            ("reach", &mut self.reach),
        ] {
            if !value.is_finite() || *value < 0.0 {
                warn!(
                    date = %self.date,
                    platform = %self.platform,
                    field = name,
                    value = *value,
                    "Malformed base metric, defaulting to zero"
                );
                *value = 0.0;
            }
        }
    }
}

/// A dimension axis records can be grouped or filtered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Date,
    Month,
    Platform,
    Channel,
    FunnelStage,
    Device,
    Region,
    AdType,
    Placement,
}

impl Dimension {
    /// Extract this dimension's value from a record. Absent optional fields
    /// map to the `unknown` bucket so their metrics are still aggregated.
    pub fn value_of(&self, record: &PerformanceRecord) -> String {
        match self {
            Dimension::Date => record.date.to_string(),
            Dimension::Month => record.month(),
            Dimension::Platform => record.platform.clone(),
            Dimension::Channel => record.channel.clone(),
            Dimension::FunnelStage => opt(&record.funnel_stage),
            Dimension::Device => opt(&record.device),
            Dimension::Region => opt(&record.region),
            Dimension::AdType => opt(&record.ad_type),
            Dimension::Placement => opt(&record.placement),
        }
    }
}

fn opt(value: &Option<String>) -> String {
    value
        .clone()
        .unwrap_or_else(|| UNKNOWN_DIMENSION.to_string())
}

/// Identifies one aggregation bucket: an ordered tuple of dimension values.
///
/// Keys with identical tuples merge into exactly one rollup record; `Eq` and
/// `Hash` over the ordered parts are the bucket address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct RollupKey {
    pub parts: Vec<(Dimension, String)>,
}

impl RollupKey {
    pub fn new(parts: Vec<(Dimension, String)>) -> Self {
        Self { parts }
    }

    /// Build the key for a record over the given dimensions.
    pub fn of(record: &PerformanceRecord, dims: &[Dimension]) -> Self {
        Self {
            parts: dims
                .iter()
                .map(|d| (*d, d.value_of(record)))
                .collect(),
        }
    }

    /// Value of one dimension within the key, if present.
    pub fn get(&self, dim: Dimension) -> Option<&str> {
        self.parts
            .iter()
            .find(|(d, _)| *d == dim)
            .map(|(_, v)| v.as_str())
    }

    /// Human-readable label, e.g. `2024-01 / Google Ads`.
    pub fn label(&self) -> String {
        self.parts
            .iter()
            .map(|(_, v)| v.as_str())
            .collect::<Vec<_>>()
            .join(" / ")
    }
}

/// The six summable base metrics of a record or bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BaseMetrics {
    pub spend: f64,
    pub impressions: f64,
    pub clicks: f64,
    pub conversions: f64,
    pub revenue: f64,
    pub reach: f64,
}

impl BaseMetrics {
    /// Add one record's metrics into this accumulator.
    pub fn absorb(&mut self, record: &PerformanceRecord) {
        self.spend += record.spend;
        self.impressions += record.impressions;
        self.clicks += record.clicks;
        self.conversions += record.conversions;
        self.revenue += record.revenue;
        self.reach += record.reach;
    }

    /// Merge another accumulator into this one.
    pub fn merge(&mut self, other: &BaseMetrics) {
        self.spend += other.spend;
        self.impressions += other.impressions;
        self.clicks += other.clicks;
        self.conversions += other.conversions;
        self.revenue += other.revenue;
        self.reach += other.reach;
    }

    pub fn is_zero(&self) -> bool {
        self.spend == 0.0
            && self.impressions == 0.0
            && self.clicks == 0.0
            && self.conversions == 0.0
            && self.revenue == 0.0
            && self.reach == 0.0
    }
}

/// Ratio metrics derived from a bucket's summed base metrics.
///
/// Never stored independently of the bases they were computed from, and
/// never produced by averaging per-row ratios — always recomputed from the
/// summed numerator/denominator so high-volume rows carry their weight.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DerivedMetrics {
    pub ctr: f64,
    pub cpc: f64,
    pub cpm: f64,
    pub cpa: f64,
    pub conversion_rate: f64,
    pub roas: f64,
}

impl DerivedMetrics {
    pub fn from_base(base: &BaseMetrics) -> Self {
        Self {
            ctr: metrics::ctr(base.clicks, base.impressions),
            cpc: metrics::cpc(base.spend, base.clicks),
            cpm: metrics::cpm(base.spend, base.impressions),
            cpa: metrics::cpa(base.spend, base.conversions),
            conversion_rate: metrics::conversion_rate(base.conversions, base.clicks),
            roas: metrics::roas(base.revenue, base.spend),
        }
    }
}

/// One aggregated bucket: key, summed bases, and recomputed ratios.
///
/// Created fresh on every rollup invocation and never mutated after.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RollupRecord {
    pub key: RollupKey,
    pub base: BaseMetrics,
    pub derived: DerivedMetrics,
}

impl RollupRecord {
    pub fn new(key: RollupKey, base: BaseMetrics) -> Self {
        let derived = DerivedMetrics::from_base(&base);
        Self { key, base, derived }
    }

    /// Read any metric off this bucket, for sorting and comparison.
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

#[cfg(test)]
mod tests {
    use super::*;

    pub fn record(date: &str, platform: &str, channel: &str) -> PerformanceRecord {
        PerformanceRecord {
            date: date.parse().unwrap(),
            platform: platform.to_string(),
            channel: channel.to_string(),
            funnel_stage: None,
            device: None,
            region: None,
            ad_type: None,
            placement: None,
            spend: 0.0,
            impressions: 0.0,
            clicks: 0.0,
            conversions: 0.0,
            revenue: 0.0,
            reach: 0.0,
        }
    }

    #[test]
    fn test_month_formatting() {
        let r = record("2024-03-15", "Google Ads", "Search");
        assert_eq!(r.month(), "2024-03");
    }

    #[test]
    fn test_sanitize_clamps_negative_and_nan() {
        let mut r = record("2024-03-15", "Meta", "Social");
        r.spend = -50.0;
        r.clicks = f64::NAN;
        r.revenue = 120.0;
        r.sanitize();
        assert_eq!(r.spend, 0.0);
        assert_eq!(r.clicks, 0.0);
        assert_eq!(r.revenue, 120.0);
    }

    #[test]
    fn test_missing_metrics_default_to_zero() {
        let r: PerformanceRecord = serde_json::from_str(
            r#"{"date":"2024-01-02","platform":"Meta","channel":"Social","spend":10.0}"#,
        )
        .unwrap();
        assert_eq!(r.spend, 10.0);
        assert_eq!(r.impressions, 0.0);
        assert_eq!(r.reach, 0.0);
        assert!(r.funnel_stage.is_none());
    }

    #[test]
    fn test_rollup_key_identity() {
        let a = RollupKey::of(
            &record("2024-01-05", "Google Ads", "Search"),
            &[Dimension::Month, Dimension::Platform],
        );
        let b = RollupKey::of(
            &record("2024-01-20", "Google Ads", "Display"),
            &[Dimension::Month, Dimension::Platform],
        );
        // Same month and platform, different day and channel: same bucket.
        assert_eq!(a, b);
        assert_eq!(a.get(Dimension::Platform), Some("Google Ads"));
        assert_eq!(a.label(), "2024-01 / Google Ads");
    }

    #[test]
    fn test_missing_dimension_buckets_as_unknown() {
        let r = record("2024-01-05", "Meta", "Social");
        assert_eq!(Dimension::FunnelStage.value_of(&r), UNKNOWN_DIMENSION);
    }

    #[test]
    fn test_derived_from_base_is_weighted() {
        let base = BaseMetrics {
            spend: 0.0,
            impressions: 1100.0,
            clicks: 60.0,
            conversions: 0.0,
            revenue: 0.0,
            reach: 0.0,
        };
        let derived = DerivedMetrics::from_base(&base);
        assert!((derived.ctr - 60.0 / 1100.0 * 100.0).abs() < 1e-9);
    }
}
