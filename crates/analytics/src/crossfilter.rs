//! Cross-filter state machine — at most one active selection per dimension
//! axis, with mutual-exclusion rules between the primary drill-down axes.

use adpulse_core::types::{Dimension, PerformanceRecord};
use serde::{Deserialize, Serialize};

/// The four interactive filter axes of the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterAxis {
    Month,
    Platform,
    Channel,
    FunnelStage,
}

impl FilterAxis {
    pub fn dimension(&self) -> Dimension {
        match self {
            FilterAxis::Month => Dimension::Month,
            FilterAxis::Platform => Dimension::Platform,
            FilterAxis::Channel => Dimension::Channel,
            FilterAxis::FunnelStage => Dimension::FunnelStage,
        }
    }
}

/// The active cross-filter selection. Immutable value type: [`toggle`]
/// returns a new selection rather than mutating in place, so the machine is
/// testable without a UI harness.
///
/// Month and platform are alternative primary drill-down axes and clear each
/// other (and channel); channel and funnel stage are secondary refiners that
/// clear nothing. The asymmetry is deliberate and carried over from product
/// intent.
///
/// [`toggle`]: FilterSelection::toggle
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSelection {
    pub month: Option<String>,
    pub platform: Option<String>,
    pub channel: Option<String>,
    pub funnel_stage: Option<String>,
}

impl FilterSelection {
    /// Apply a click on `axis` with `value`: re-selecting the current value
    /// deselects it, anything else selects it and applies mutual exclusion.
    pub fn toggle(&self, axis: FilterAxis, value: &str) -> FilterSelection {
        let mut next = self.clone();
        let slot = match axis {
            FilterAxis::Month => &mut next.month,
            FilterAxis::Platform => &mut next.platform,
            FilterAxis::Channel => &mut next.channel,
            FilterAxis::FunnelStage => &mut next.funnel_stage,
        };

        if slot.as_deref() == Some(value) {
            *slot = None;
            return next;
        }
        *slot = Some(value.to_string());

        match axis {
            FilterAxis::Month => {
                next.platform = None;
                next.channel = None;
            }
            FilterAxis::Platform => {
                next.month = None;
                next.channel = None;
            }
            FilterAxis::Channel | FilterAxis::FunnelStage => {}
        }
        next
    }

    /// All-null selection.
    pub fn reset() -> FilterSelection {
        FilterSelection::default()
    }

    pub fn is_empty(&self) -> bool {
        self.month.is_none()
            && self.platform.is_none()
            && self.channel.is_none()
            && self.funnel_stage.is_none()
    }

    /// The currently active axes and their values.
    pub fn active(&self) -> Vec<(FilterAxis, &str)> {
        [
            (FilterAxis::Month, &self.month),
            (FilterAxis::Platform, &self.platform),
            (FilterAxis::Channel, &self.channel),
            (FilterAxis::FunnelStage, &self.funnel_stage),
        ]
        .into_iter()
        .filter_map(|(axis, value)| value.as_deref().map(|v| (axis, v)))
        .collect()
    }

    /// Whether a record passes every active filter. A record missing an
    /// optional field never matches a filter on that axis.
    pub fn matches(&self, record: &PerformanceRecord) -> bool {
        if let Some(month) = &self.month {
            if record.month() != *month {
                return false;
            }
        }
        if let Some(platform) = &self.platform {
            if record.platform != *platform {
                return false;
            }
        }
        if let Some(channel) = &self.channel {
            if record.channel != *channel {
                return false;
            }
        }
        if let Some(stage) = &self.funnel_stage {
            if record.funnel_stage.as_deref() != Some(stage.as_str()) {
                return false;
            }
        }
        true
    }
}
