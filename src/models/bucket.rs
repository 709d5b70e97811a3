use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// WeekOfMonth -- the 5 fixed generalized buckets
// ---------------------------------------------------------------------------

/// A week-of-month bucket in `1..=5`.
///
/// Derived from the day of month as `ceil(day / 7)`, capped at 5, so bucket 5
/// absorbs days 29-31 and may span up to ten days in long months.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct WeekOfMonth(u8);

impl WeekOfMonth {
    pub const COUNT: usize = 5;

    pub const ALL: [WeekOfMonth; Self::COUNT] = [
        WeekOfMonth(1),
        WeekOfMonth(2),
        WeekOfMonth(3),
        WeekOfMonth(4),
        WeekOfMonth(5),
    ];

    /// Bucket for a calendar day of month (1-based). Day 0 maps to bucket 1.
    pub fn from_day(day: u32) -> Self {
        let week = day.div_ceil(7).clamp(1, Self::COUNT as u32);
        WeekOfMonth(week as u8)
    }

    pub fn new(week: u8) -> Option<Self> {
        (1..=Self::COUNT as u8).contains(&week).then_some(WeekOfMonth(week))
    }

    pub fn get(self) -> u8 {
        self.0
    }

    /// Zero-based position, for indexing fixed-size per-bucket arrays.
    pub fn index(self) -> usize {
        usize::from(self.0 - 1)
    }

    /// Short name, e.g. `"Week 2"`.
    pub fn name(self) -> String {
        format!("Week {}", self.0)
    }

    /// Human label including the day span covered by the bucket.
    pub fn label(self) -> &'static str {
        match self.0 {
            1 => "1st Week (Days 1-7)",
            2 => "2nd Week (Days 8-14)",
            3 => "3rd Week (Days 15-21)",
            4 => "4th Week (Days 22-28)",
            _ => "5th Week (Days 29-31)",
        }
    }
}

impl fmt::Display for WeekOfMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Week {}", self.0)
    }
}

impl TryFrom<u8> for WeekOfMonth {
    type Error = String;

    fn try_from(week: u8) -> Result<Self, Self::Error> {
        WeekOfMonth::new(week).ok_or_else(|| format!("week of month out of range: {}", week))
    }
}

impl From<WeekOfMonth> for u8 {
    fn from(week: WeekOfMonth) -> u8 {
        week.0
    }
}

// ---------------------------------------------------------------------------
// WeekBucket -- finalized generalized bucket
// ---------------------------------------------------------------------------

/// Mean deviation of one week-of-month bucket across every month that had
/// data for it.
///
/// `deviation` is positive when that week's average typically exceeds its
/// month's average. `sample_count` is the number of month instances that
/// contributed, which distinguishes "no data" from "zero deviation".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekBucket {
    pub id: u8,
    pub name: String,
    pub full_label: String,
    pub deviation: f64,
    pub sample_count: usize,
}

impl WeekBucket {
    pub fn new(week: WeekOfMonth, deviation: f64, sample_count: usize) -> Self {
        Self {
            id: week.get(),
            name: week.name(),
            full_label: week.label().to_string(),
            deviation,
            sample_count,
        }
    }

    pub fn week(&self) -> Option<WeekOfMonth> {
        WeekOfMonth::new(self.id)
    }

    pub fn is_overperformer(&self) -> bool {
        self.deviation >= 0.0
    }
}
