//! Period resolver — turns a comparison mode into two concrete calendar
//! date intervals (current and previous).
//!
//! All arithmetic is calendar-aware (month lengths, leap days); no timezone
//! conversion happens anywhere, dates are plain calendar dates.

use chrono::{Datelike, Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};

/// Trailing-window length substituted for an incomplete custom range.
pub const DEFAULT_FALLBACK_DAYS: u32 = 30;

/// A closed date interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    /// Inclusive length in days.
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

/// The two intervals a comparison operates on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonWindow {
    pub current: DateRange,
    pub previous: DateRange,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelativePeriod {
    Yoy,
    Qoq,
    Mom,
    Wow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PresetWindow {
    #[serde(rename = "last_7_days")]
    Last7Days,
    #[serde(rename = "last_30_days")]
    Last30Days,
    #[serde(rename = "last_90_days")]
    Last90Days,
    LastMonths { months: u32 },
}

/// How the comparison window is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ComparisonMode {
    /// A relative period anchored on today.
    Auto { period: RelativePeriod },
    /// A fixed-length trailing window and the equal-length window before it.
    Preset { window: PresetWindow },
    /// Both ranges verbatim from user input. Missing endpoints fall back to
    /// a default trailing window rather than blocking rendering.
    Custom {
        current: Option<DateRange>,
        previous: Option<DateRange>,
    },
}

/// Resolve a comparison mode against today's date.
pub fn resolve_periods(mode: &ComparisonMode, today: NaiveDate) -> ComparisonWindow {
    resolve_periods_with_fallback(mode, today, DEFAULT_FALLBACK_DAYS)
}

/// Like [`resolve_periods`] with a configurable custom-range fallback.
pub fn resolve_periods_with_fallback(
    mode: &ComparisonMode,
    today: NaiveDate,
    fallback_days: u32,
) -> ComparisonWindow {
    match mode {
        ComparisonMode::Auto { period } => match period {
            RelativePeriod::Yoy => year_over_year(today),
            RelativePeriod::Qoq => quarter_over_quarter(today),
            RelativePeriod::Mom => month_over_month(today),
            RelativePeriod::Wow => trailing_days(today, 7),
        },
        ComparisonMode::Preset { window } => match window {
            PresetWindow::Last7Days => trailing_days(today, 7),
            PresetWindow::Last30Days => trailing_days(today, 30),
            PresetWindow::Last90Days => trailing_days(today, 90),
            PresetWindow::LastMonths { months } => trailing_months(today, *months),
        },
        ComparisonMode::Custom { current, previous } => match (current, previous) {
            (Some(current), Some(previous)) => ComparisonWindow {
                current: *current,
                previous: *previous,
            },
            // Incomplete input degrades to the default trailing preset.
            _ => trailing_days(today, u64::from(fallback_days.max(1))),
        },
    }
}

/// Year to date vs. the same month/day range one calendar year back.
fn year_over_year(today: NaiveDate) -> ComparisonWindow {
    let current = DateRange::new(year_start(today), today);
    let previous_end = one_year_back(today);
    ComparisonWindow {
        current,
        previous: DateRange::new(year_start(previous_end), previous_end),
    }
}

/// Quarter to date vs. the full previous calendar quarter.
fn quarter_over_quarter(today: NaiveDate) -> ComparisonWindow {
    let current_start = quarter_start(today);
    let previous_end = prev_day(current_start);
    ComparisonWindow {
        current: DateRange::new(current_start, today),
        previous: DateRange::new(quarter_start(previous_end), previous_end),
    }
}

/// The two most recent complete calendar months; the in-progress month is
/// never compared against a finished one.
fn month_over_month(today: NaiveDate) -> ComparisonWindow {
    let current_end = prev_day(month_start(today));
    let current_start = month_start(current_end);
    let previous_end = prev_day(current_start);
    ComparisonWindow {
        current: DateRange::new(current_start, current_end),
        previous: DateRange::new(month_start(previous_end), previous_end),
    }
}

/// The `n` days ending yesterday vs. the `n` days before that.
fn trailing_days(today: NaiveDate, n: u64) -> ComparisonWindow {
    let current_end = days_back(today, 1);
    let current_start = days_back(today, n);
    let previous_end = days_back(today, n + 1);
    let previous_start = days_back(today, 2 * n);
    ComparisonWindow {
        current: DateRange::new(current_start, current_end),
        previous: DateRange::new(previous_start, previous_end),
    }
}

/// The `n` calendar months ending yesterday vs. the `n` months before that.
fn trailing_months(today: NaiveDate, n: u32) -> ComparisonWindow {
    let n = n.max(1);
    let current_start = months_back(today, n);
    let previous_start = months_back(today, 2 * n);
    ComparisonWindow {
        current: DateRange::new(current_start, prev_day(today)),
        previous: DateRange::new(previous_start, prev_day(current_start)),
    }
}

fn year_start(d: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(d.year(), 1, 1).unwrap_or(d)
}

fn month_start(d: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(d.year(), d.month(), 1).unwrap_or(d)
}

fn quarter_start(d: NaiveDate) -> NaiveDate {
    let month = (d.month0() / 3) * 3 + 1;
    NaiveDate::from_ymd_opt(d.year(), month, 1).unwrap_or(d)
}

fn prev_day(d: NaiveDate) -> NaiveDate {
    d.pred_opt().unwrap_or(d)
}

fn days_back(d: NaiveDate, n: u64) -> NaiveDate {
    d.checked_sub_days(Days::new(n)).unwrap_or(d)
}

fn months_back(d: NaiveDate, n: u32) -> NaiveDate {
    d.checked_sub_months(Months::new(n)).unwrap_or(d)
}

/// Same month/day one year earlier, clamping Feb 29 to Feb 28.
fn one_year_back(d: NaiveDate) -> NaiveDate {
    months_back(d, 12)
}
