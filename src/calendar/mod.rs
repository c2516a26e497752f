//! Lookback Windows
//!
//! The dashboard offers a fixed set of history lengths. A window of N days
//! is applied as N calendar days back from today, so the provider returns
//! fewer than N trading sessions (weekends and holidays fall out).
//!
//! Date ranges are start-inclusive and end-exclusive.

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

/// History length selectable in the dashboard
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum LookbackWindow {
    #[default]
    OneYear,
    SixMonths,
    Quarter,
    ThirtyDays,
    Week,
}

impl LookbackWindow {
    /// All windows in display order
    pub const ALL: [LookbackWindow; 5] = [
        LookbackWindow::OneYear,
        LookbackWindow::SixMonths,
        LookbackWindow::Quarter,
        LookbackWindow::ThirtyDays,
        LookbackWindow::Week,
    ];

    pub fn days(self) -> u32 {
        match self {
            LookbackWindow::OneYear => 252,
            LookbackWindow::SixMonths => 126,
            LookbackWindow::Quarter => 63,
            LookbackWindow::ThirtyDays => 30,
            LookbackWindow::Week => 5,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            LookbackWindow::OneYear => "Last 1 Year",
            LookbackWindow::SixMonths => "Last 6 Months",
            LookbackWindow::Quarter => "Last Quarter",
            LookbackWindow::ThirtyDays => "Last 30 Days",
            LookbackWindow::Week => "Last Week",
        }
    }

    /// Date range ending (exclusively) at `today`
    pub fn range_ending(self, today: NaiveDate) -> DateRange {
        DateRange {
            start: today - Duration::days(i64::from(self.days())),
            end: today,
        }
    }
}

impl TryFrom<u32> for LookbackWindow {
    type Error = String;

    fn try_from(days: u32) -> Result<Self, Self::Error> {
        LookbackWindow::ALL
            .into_iter()
            .find(|w| w.days() == days)
            .ok_or_else(|| format!("lookback must be one of 252, 126, 63, 30, 5 days, got {}", days))
    }
}

impl From<LookbackWindow> for u32 {
    fn from(window: LookbackWindow) -> Self {
        window.days()
    }
}

/// Half-open date interval [start, end)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Weekdays in the range; an upper bound on sessions a provider can return
    pub fn weekdays(&self) -> u32 {
        let mut count = 0;
        let mut day = self.start;
        while day < self.end {
            if !matches!(day.weekday(), Weekday::Sat | Weekday::Sun) {
                count += 1;
            }
            day += Duration::days(1);
        }
        count
    }
}
