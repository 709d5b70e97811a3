use std::fmt;

use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Serialize};

use super::bucket::WeekOfMonth;

// ---------------------------------------------------------------------------
// MonthKey -- calendar year + month
// ---------------------------------------------------------------------------

/// Identifies one calendar month. Orders chronologically.
///
/// Always holds a real month: it is stored as that month's first day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthKey(NaiveDate);

impl MonthKey {
    /// `None` unless `month` is 1-12 and the year is representable.
    pub fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(Self)
    }

    pub fn of(date: NaiveDate) -> Self {
        Self(date - Days::new(u64::from(date.day0())))
    }

    pub fn year(self) -> i32 {
        self.0.year()
    }

    /// 1-based month number.
    pub fn month(self) -> u32 {
        self.0.month()
    }

    pub fn first_day(self) -> NaiveDate {
        self.0
    }

    /// Short month and two-digit year, e.g. `"Mar 24"`.
    pub fn label(self) -> String {
        self.0.format("%b %y").to_string()
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year(), self.month())
    }
}

// ---------------------------------------------------------------------------
// TrendRow -- one month's per-bucket average prices
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendRow {
    pub month_label: String,
    pub sort_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub week1: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub week2: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub week3: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub week4: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub week5: Option<f64>,
}

impl TrendRow {
    /// Empty row for `month`.
    pub fn new(month: MonthKey) -> Self {
        Self {
            month_label: month.label(),
            sort_date: month.first_day(),
            week1: None,
            week2: None,
            week3: None,
            week4: None,
            week5: None,
        }
    }

    pub fn month(&self) -> MonthKey {
        MonthKey::of(self.sort_date)
    }

    pub fn week(&self, week: WeekOfMonth) -> Option<f64> {
        match week.get() {
            1 => self.week1,
            2 => self.week2,
            3 => self.week3,
            4 => self.week4,
            _ => self.week5,
        }
    }

    pub fn set_week(&mut self, week: WeekOfMonth, average: f64) {
        let slot = match week.get() {
            1 => &mut self.week1,
            2 => &mut self.week2,
            3 => &mut self.week3,
            4 => &mut self.week4,
            _ => &mut self.week5,
        };
        *slot = Some(average);
    }

    /// Buckets with data this month, in bucket order.
    pub fn weeks(&self) -> impl Iterator<Item = (WeekOfMonth, f64)> + '_ {
        WeekOfMonth::ALL
            .into_iter()
            .filter_map(move |w| self.week(w).map(|avg| (w, avg)))
    }
}
