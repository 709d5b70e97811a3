//! Helpers for chart front-ends consuming a [`WeeklyReport`](crate::models::WeeklyReport).
//!
//! Nothing here renders anything; these are the small conversions every
//! dashboard needs: which chart style to draw the trend table with, one
//! series per bucket, fixed bucket colours and display formatting.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::WeekpulseError;
use crate::models::{TrendRow, WeekBucket, WeekOfMonth};

pub const POSITIVE_COLOR: &str = "#10b981";
pub const NEGATIVE_COLOR: &str = "#ef4444";

const WEEK_COLORS: [&str; WeekOfMonth::COUNT] = [
    "#3b82f6", // blue
    "#8b5cf6", // violet
    "#ec4899", // pink
    "#f59e0b", // amber
    "#10b981", // emerald
];

/// Series colour for a bucket in multi-series trend charts.
pub fn week_color(week: WeekOfMonth) -> &'static str {
    WEEK_COLORS[week.index()]
}

/// Bar colour for a deviation value: green at or above zero, red below.
pub fn deviation_color(deviation: f64) -> &'static str {
    if deviation >= 0.0 {
        POSITIVE_COLOR
    } else {
        NEGATIVE_COLOR
    }
}

// ---------------------------------------------------------------------------
// ChartKind
// ---------------------------------------------------------------------------

/// Display style of the monthly trend chart.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    #[default]
    Bar,
    Line,
    Area,
}

impl ChartKind {
    pub const ALL: [ChartKind; 3] = [ChartKind::Bar, ChartKind::Line, ChartKind::Area];

    pub fn as_str(self) -> &'static str {
        match self {
            ChartKind::Bar => "bar",
            ChartKind::Line => "line",
            ChartKind::Area => "area",
        }
    }
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChartKind {
    type Err = WeekpulseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bar" => Ok(ChartKind::Bar),
            "line" => Ok(ChartKind::Line),
            "area" => Ok(ChartKind::Area),
            other => Err(WeekpulseError::InvalidArgument(format!(
                "unknown chart kind '{}' (expected bar, line or area)",
                other
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// TrendSeries
// ---------------------------------------------------------------------------

/// One point of a trend series: a month label and that month's average for
/// the series' bucket, if the bucket had data that month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesPoint {
    pub month_label: String,
    pub value: Option<f64>,
}

/// The trend table pivoted to a single bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendSeries {
    pub week: WeekOfMonth,
    pub name: String,
    pub color: String,
    pub points: Vec<SeriesPoint>,
}

impl TrendSeries {
    /// Number of months where this bucket had data.
    pub fn populated(&self) -> usize {
        self.points.iter().filter(|p| p.value.is_some()).count()
    }
}

/// Pivot trend rows into five series, one per bucket, each with one point per row.
pub fn trend_series(rows: &[TrendRow]) -> Vec<TrendSeries> {
    WeekOfMonth::ALL
        .into_iter()
        .map(|week| TrendSeries {
            week,
            name: week.name(),
            color: week_color(week).to_string(),
            points: rows
                .iter()
                .map(|row| SeriesPoint {
                    month_label: row.month_label.clone(),
                    value: row.week(week),
                })
                .collect(),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Formatting
// ---------------------------------------------------------------------------

/// Signed deviation with four decimals, e.g. `+24.2857` or `-11.4286`.
pub fn format_deviation(deviation: f64) -> String {
    if deviation > 0.0 {
        format!("+{:.4}", deviation)
    } else {
        format!("{:.4}", deviation)
    }
}

/// Price with a dollar sign and two decimals, e.g. `$125.71`.
pub fn format_price(price: f64) -> String {
    format!("${:.2}", price)
}

/// One-line summary of the best-ranked bucket.
pub fn best_week_headline(bucket: &WeekBucket) -> String {
    let verb = if bucket.is_overperformer() {
        "beats"
    } else {
        "trails"
    };
    format!(
        "{} ({}) typically {} its month's average by {}",
        bucket.name,
        bucket.full_label,
        verb,
        format_deviation(bucket.deviation)
    )
}
