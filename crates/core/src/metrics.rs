//! Ratio-metric formulas — pure functions of summed base metrics.
//!
//! Every formula returns `0.0` when its denominator is zero. Zero-activity
//! buckets must render as zero, not as missing, so downstream comparison and
//! sorting never special-case them.

use serde::{Deserialize, Serialize};

/// Click-through rate as a percentage of impressions.
pub fn ctr(clicks: f64, impressions: f64) -> f64 {
    if impressions > 0.0 {
        clicks / impressions * 100.0
    } else {
        0.0
    }
}

/// Cost per click.
pub fn cpc(spend: f64, clicks: f64) -> f64 {
    if clicks > 0.0 {
        spend / clicks
    } else {
        0.0
    }
}

/// Cost per thousand impressions.
pub fn cpm(spend: f64, impressions: f64) -> f64 {
    if impressions > 0.0 {
        spend / impressions * 1000.0
    } else {
        0.0
    }
}

/// Cost per acquisition.
pub fn cpa(spend: f64, conversions: f64) -> f64 {
    if conversions > 0.0 {
        spend / conversions
    } else {
        0.0
    }
}

/// Conversions as a percentage of clicks.
pub fn conversion_rate(conversions: f64, clicks: f64) -> f64 {
    if clicks > 0.0 {
        conversions / clicks * 100.0
    } else {
        0.0
    }
}

/// Return on ad spend.
pub fn roas(revenue: f64, spend: f64) -> f64 {
    if spend > 0.0 {
        revenue / spend
    } else {
        0.0
    }
}

/// Whether an increase in a metric is favorable or unfavorable.
///
/// Used only for presentation coloring; never alters arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    HigherIsBetter,
    LowerIsBetter,
}

/// Every metric the dashboard can aggregate, sort by, or compare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Spend,
    Impressions,
    Clicks,
    Conversions,
    Revenue,
    Reach,
    Ctr,
    Cpc,
    Cpm,
    Cpa,
    ConversionRate,
    Roas,
}

impl Metric {
    /// All metrics, in display order.
    pub const ALL: [Metric; 12] = [
        Metric::Spend,
        Metric::Impressions,
        Metric::Clicks,
        Metric::Conversions,
        Metric::Revenue,
        Metric::Reach,
        Metric::Ctr,
        Metric::Cpc,
        Metric::Cpm,
        Metric::Cpa,
        Metric::ConversionRate,
        Metric::Roas,
    ];

    /// Direction-of-good for this metric. Cost metrics improve downward.
    pub fn direction(&self) -> Direction {
        match self {
            Metric::Cpc | Metric::Cpm | Metric::Cpa => Direction::LowerIsBetter,
            _ => Direction::HigherIsBetter,
        }
    }

    /// True for metrics derived from a numerator/denominator pair. Ratio
    /// metrics are recomputed from summed bases after aggregation, never
    /// summed or averaged themselves.
    pub fn is_ratio(&self) -> bool {
        matches!(
            self,
            Metric::Ctr
                | Metric::Cpc
                | Metric::Cpm
                | Metric::Cpa
                | Metric::ConversionRate
                | Metric::Roas
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_denominators_yield_zero() {
        assert_eq!(ctr(10.0, 0.0), 0.0);
        assert_eq!(cpc(100.0, 0.0), 0.0);
        assert_eq!(cpm(100.0, 0.0), 0.0);
        assert_eq!(cpa(100.0, 0.0), 0.0);
        assert_eq!(conversion_rate(5.0, 0.0), 0.0);
        assert_eq!(roas(400.0, 0.0), 0.0);
    }

    #[test]
    fn test_formulas() {
        assert!((ctr(50.0, 1000.0) - 5.0).abs() < f64::EPSILON);
        assert!((cpc(100.0, 50.0) - 2.0).abs() < f64::EPSILON);
        assert!((cpm(100.0, 1000.0) - 100.0).abs() < f64::EPSILON);
        assert!((cpa(100.0, 5.0) - 20.0).abs() < f64::EPSILON);
        assert!((conversion_rate(5.0, 50.0) - 10.0).abs() < f64::EPSILON);
        assert!((roas(400.0, 100.0) - 4.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_direction_of_good() {
        assert_eq!(Metric::Revenue.direction(), Direction::HigherIsBetter);
        assert_eq!(Metric::Roas.direction(), Direction::HigherIsBetter);
        assert_eq!(Metric::Cpc.direction(), Direction::LowerIsBetter);
        assert_eq!(Metric::Cpa.direction(), Direction::LowerIsBetter);
    }
}
