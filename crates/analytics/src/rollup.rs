//! Rollup engine — single-pass grouping of performance rows into buckets
//! with summed base metrics and recomputed ratio metrics.

use std::cmp::Ordering;
use std::collections::HashMap;

use adpulse_core::metrics::Metric;
use adpulse_core::types::{BaseMetrics, Dimension, PerformanceRecord, RollupKey, RollupRecord};
use serde::{Deserialize, Serialize};

/// Group records into buckets addressed by an arbitrary key function.
///
/// Every input record lands in exactly one bucket, and the per-metric sums
/// across all buckets equal the sums across the input (conservation). Keys
/// observed with all-zero metrics are still emitted. Output order is
/// unspecified; ordering is the caller's explicit [`sort_rollups`] step.
pub fn rollup_by<'a, I, F>(records: I, key_fn: F) -> Vec<RollupRecord>
where
    I: IntoIterator<Item = &'a PerformanceRecord>,
    F: Fn(&PerformanceRecord) -> RollupKey,
{
    let mut buckets: HashMap<RollupKey, BaseMetrics> = HashMap::new();
    for record in records {
        buckets.entry(key_fn(record)).or_default().absorb(record);
    }
    buckets
        .into_iter()
        .map(|(key, base)| RollupRecord::new(key, base))
        .collect()
}

/// Group records by the listed dimensions.
pub fn rollup<'a, I>(records: I, dims: &[Dimension]) -> Vec<RollupRecord>
where
    I: IntoIterator<Item = &'a PerformanceRecord>,
{
    rollup_by(records, |r| RollupKey::of(r, dims))
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Ascending,
    #[default]
    Descending,
}

/// Sort rollup buckets by one metric. Ties keep their relative order.
pub fn sort_rollups(rows: &mut [RollupRecord], metric: Metric, order: SortOrder) {
    rows.sort_by(|a, b| {
        let cmp = a
            .metric(metric)
            .partial_cmp(&b.metric(metric))
            .unwrap_or(Ordering::Equal);
        match order {
            SortOrder::Ascending => cmp,
            SortOrder::Descending => cmp.reverse(),
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(date: &str, platform: &str, metrics: [f64; 5]) -> PerformanceRecord {
        let [spend, impressions, clicks, conversions, revenue] = metrics;
        PerformanceRecord {
            date: date.parse().unwrap(),
            platform: platform.to_string(),
            channel: "Search".to_string(),
            funnel_stage: None,
            device: None,
            region: None,
            ad_type: None,
            placement: None,
            spend,
            impressions,
            clicks,
            conversions,
            revenue,
            reach: 0.0,
        }
    }

    fn sample() -> Vec<PerformanceRecord> {
        vec![
            record("2024-01-10", "Google", [100.0, 1000.0, 50.0, 5.0, 400.0]),
            record("2024-01-20", "Meta", [200.0, 2000.0, 100.0, 20.0, 900.0]),
            record("2024-02-05", "Google", [150.0, 1500.0, 60.0, 6.0, 500.0]),
        ]
    }

    #[test]
    fn test_rollup_by_month_end_to_end() {
        let records = sample();
        let mut rows = rollup(&records, &[Dimension::Month]);
        sort_rollups(&mut rows, Metric::Spend, SortOrder::Descending);

        assert_eq!(rows.len(), 2);
        let jan = &rows[0];
        assert_eq!(jan.key.get(Dimension::Month), Some("2024-01"));
        assert_eq!(jan.base.spend, 300.0);
        assert_eq!(jan.base.clicks, 150.0);
        assert_eq!(jan.base.conversions, 25.0);
        assert_eq!(jan.base.revenue, 1300.0);
        assert!((jan.derived.roas - 1300.0 / 300.0).abs() < 1e-9);

        let feb = &rows[1];
        assert_eq!(feb.base.spend, 150.0);
        assert_eq!(feb.base.clicks, 60.0);
        assert!((feb.derived.roas - 500.0 / 150.0).abs() < 1e-9);
    }

    #[test]
    fn test_conservation_across_buckets() {
        let records = sample();
        let rows = rollup(&records, &[Dimension::Platform]);

        let bucket_spend: f64 = rows.iter().map(|r| r.base.spend).sum();
        let bucket_clicks: f64 = rows.iter().map(|r| r.base.clicks).sum();
        let input_spend: f64 = records.iter().map(|r| r.spend).sum();
        let input_clicks: f64 = records.iter().map(|r| r.clicks).sum();

        assert!((bucket_spend - input_spend).abs() < 1e-9);
        assert!((bucket_clicks - input_clicks).abs() < 1e-9);
    }

    #[test]
    fn test_ratio_recomputed_from_sums_not_averaged() {
        // 50% CTR on 100 impressions plus 1% CTR on 1000 impressions must
        // roll up to 60/1100, not the arithmetic mean of the two CTRs.
        let records = vec![
            record("2024-01-01", "Google", [0.0, 100.0, 50.0, 0.0, 0.0]),
            record("2024-01-02", "Google", [0.0, 1000.0, 10.0, 0.0, 0.0]),
        ];
        let rows = rollup(&records, &[Dimension::Platform]);
        assert_eq!(rows.len(), 1);
        assert!((rows[0].derived.ctr - 60.0 / 1100.0 * 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_activity_bucket_still_emitted() {
        let records = vec![
            record("2024-01-01", "Google", [100.0, 1000.0, 50.0, 5.0, 400.0]),
            record("2024-01-02", "Meta", [0.0, 0.0, 0.0, 0.0, 0.0]),
        ];
        let rows = rollup(&records, &[Dimension::Platform]);
        assert_eq!(rows.len(), 2);
        let meta = rows
            .iter()
            .find(|r| r.key.get(Dimension::Platform) == Some("Meta"))
            .unwrap();
        assert!(meta.base.is_zero());
        assert_eq!(meta.derived.ctr, 0.0);
        assert_eq!(meta.derived.cpc, 0.0);
        assert_eq!(meta.derived.cpm, 0.0);
    }

    #[test]
    fn test_composite_key_and_custom_key_fn() {
        let records = sample();
        let composite = rollup(&records, &[Dimension::Month, Dimension::Platform]);
        assert_eq!(composite.len(), 3);

        // A constant key folds everything into a single bucket.
        let total = rollup_by(&records, |_| RollupKey::default());
        assert_eq!(total.len(), 1);
        assert_eq!(total[0].base.spend, 450.0);
    }

    #[test]
    fn test_sort_orders() {
        let records = sample();
        let mut rows = rollup(&records, &[Dimension::Month]);

        sort_rollups(&mut rows, Metric::Spend, SortOrder::Ascending);
        assert_eq!(rows[0].base.spend, 150.0);

        sort_rollups(&mut rows, Metric::Spend, SortOrder::Descending);
        assert_eq!(rows[0].base.spend, 300.0);
    }
}
