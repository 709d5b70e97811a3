//! Weekly-vs-monthly price aggregation.
//!
//! Folds raw price records into per-month and per-specific-week running
//! totals, then derives:
//!
//! - the mean deviation of each week-of-month bucket from its month's
//!   average, ordered by bucket id and by descending deviation, and
//! - a chronological month-by-week table of specific-week averages.
//!
//! The fold is commutative and associative per record, so partial
//! [`Accumulator`]s built over disjoint slices of the input can be
//! [merged](Accumulator::merge) before [finishing](Accumulator::finish).
//!
//! # Example
//!
//! ```rust
//! use weekpulse::aggregate::aggregate;
//! use weekpulse::models::PriceRecord;
//!
//! let records = vec![
//!     PriceRecord::new("2024-03-02T10:00:00Z", "100"),
//!     PriceRecord::new("2024-03-09T10:00:00Z", "150"),
//! ];
//! let report = aggregate(&records);
//! assert_eq!(report.best().map(|b| b.id), Some(2));
//! ```

use std::collections::BTreeMap;

use chrono::Datelike;

use crate::models::{MonthKey, Observation, PriceRecord, TrendRow, WeekBucket, WeekOfMonth, WeeklyReport};

// ---------------------------------------------------------------------------
// Running totals
// ---------------------------------------------------------------------------

/// Running sum and count of prices for one calendar month.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MonthStats {
    pub sum: f64,
    pub count: u64,
}

impl MonthStats {
    pub fn add(&mut self, price: f64) {
        self.sum += price;
        self.count += 1;
    }

    pub fn merge(&mut self, other: &MonthStats) {
        self.sum += other.sum;
        self.count += other.count;
    }

    /// `sum / count`, or 0 for an empty month.
    pub fn average(&self) -> f64 {
        if self.count > 0 {
            self.sum / self.count as f64
        } else {
            0.0
        }
    }
}

/// Running sum and count of prices for one real calendar week instance,
/// e.g. "week 2 of March 2024".
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpecificWeekStats {
    pub month: MonthKey,
    pub week: WeekOfMonth,
    pub sum: f64,
    pub count: u64,
}

impl SpecificWeekStats {
    pub fn new(month: MonthKey, week: WeekOfMonth) -> Self {
        Self {
            month,
            week,
            sum: 0.0,
            count: 0,
        }
    }

    pub fn add(&mut self, price: f64) {
        self.sum += price;
        self.count += 1;
    }

    pub fn average(&self) -> f64 {
        if self.count > 0 {
            self.sum / self.count as f64
        } else {
            0.0
        }
    }
}

// ---------------------------------------------------------------------------
// Accumulator
// ---------------------------------------------------------------------------

/// Fold state for one aggregation pass.
///
/// Keyed by ordered maps so that finalization always visits months and
/// weeks in the same order and repeated runs are bit-identical.
#[derive(Debug, Clone, Default)]
pub struct Accumulator {
    months: BTreeMap<MonthKey, MonthStats>,
    weeks: BTreeMap<(MonthKey, WeekOfMonth), SpecificWeekStats>,
    used: usize,
    skipped: usize,
}

impl Accumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one raw record. Returns `false` (and counts the record as
    /// skipped) if its timestamp or price is malformed.
    pub fn push(&mut self, record: &PriceRecord) -> bool {
        match record.observation() {
            Some(obs) => {
                self.push_observation(obs);
                true
            }
            None => {
                self.skipped += 1;
                false
            }
        }
    }

    pub fn push_observation(&mut self, obs: Observation) {
        let month = MonthKey::of(obs.date);
        let week = WeekOfMonth::from_day(obs.date.day());

        self.months.entry(month).or_default().add(obs.price);
        self.weeks
            .entry((month, week))
            .or_insert_with(|| SpecificWeekStats::new(month, week))
            .add(obs.price);
        self.used += 1;
    }

    /// Combine another partial accumulator into this one.
    pub fn merge(&mut self, other: Accumulator) {
        for (key, stats) in other.months {
            self.months.entry(key).or_default().merge(&stats);
        }
        for (key, stats) in other.weeks {
            let entry = self
                .weeks
                .entry(key)
                .or_insert_with(|| SpecificWeekStats::new(stats.month, stats.week));
            entry.sum += stats.sum;
            entry.count += stats.count;
        }
        self.used += other.used;
        self.skipped += other.skipped;
    }

    pub fn month(&self, month: MonthKey) -> Option<&MonthStats> {
        self.months.get(&month)
    }

    pub fn specific_week(&self, month: MonthKey, week: WeekOfMonth) -> Option<&SpecificWeekStats> {
        self.weeks.get(&(month, week))
    }

    pub fn records_used(&self) -> usize {
        self.used
    }

    pub fn records_skipped(&self) -> usize {
        self.skipped
    }

    /// Finalize averages, deviations, bucket orderings and the trend table.
    pub fn finish(self) -> WeeklyReport {
        let month_avgs: BTreeMap<MonthKey, f64> = self
            .months
            .iter()
            .map(|(key, stats)| (*key, stats.average()))
            .collect();

        let mut deviations: [Vec<f64>; WeekOfMonth::COUNT] = Default::default();
        let mut trend: BTreeMap<MonthKey, TrendRow> = BTreeMap::new();

        for stats in self.weeks.values() {
            let week_avg = stats.average();
            let month_avg = month_avgs.get(&stats.month).copied().unwrap_or(0.0);
            deviations[stats.week.index()].push(week_avg - month_avg);

            trend
                .entry(stats.month)
                .or_insert_with(|| TrendRow::new(stats.month))
                .set_week(stats.week, week_avg);
        }

        let buckets: Vec<WeekBucket> = WeekOfMonth::ALL
            .into_iter()
            .zip(deviations.iter())
            .filter(|(_, diffs)| !diffs.is_empty())
            .map(|(week, diffs)| {
                let mean = diffs.iter().sum::<f64>() / diffs.len() as f64;
                WeekBucket::new(week, mean, diffs.len())
            })
            .collect();

        // Independent copy; both orders are handed out together.
        let mut ranked_buckets = buckets.clone();
        ranked_buckets.sort_by(|a, b| b.deviation.total_cmp(&a.deviation));

        let mut trend: Vec<TrendRow> = trend.into_values().collect();
        trend.sort_by_key(|row| row.sort_date);

        tracing::debug!(
            records = self.used,
            skipped = self.skipped,
            months = self.months.len(),
            weeks = self.weeks.len(),
            "aggregated price records"
        );

        WeeklyReport {
            buckets,
            ranked_buckets,
            trend,
            records_used: self.used,
            records_skipped: self.skipped,
        }
    }
}

impl<'a> Extend<&'a PriceRecord> for Accumulator {
    fn extend<I: IntoIterator<Item = &'a PriceRecord>>(&mut self, iter: I) {
        for record in iter {
            self.push(record);
        }
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Aggregate a sequence of raw price records into a [`WeeklyReport`].
///
/// Pure and deterministic. Malformed records are skipped; an empty or
/// fully-invalid input yields an empty report.
pub fn aggregate<'a, I>(records: I) -> WeeklyReport
where
    I: IntoIterator<Item = &'a PriceRecord>,
{
    let mut acc = Accumulator::new();
    acc.extend(records);
    acc.finish()
}
