//! Aggregation tests: bucketing, deviations, orderings and the trend table.

mod common;

use common::{assert_close, march_2024, record};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use weekpulse::aggregate::{aggregate, Accumulator};
use weekpulse::models::{MonthKey, PriceRecord, WeekOfMonth, WeeklyReport};

// ---------------------------------------------------------------------------
// empty input
// ---------------------------------------------------------------------------

#[test]
fn empty_input_yields_empty_report() {
    let report = aggregate(&Vec::<PriceRecord>::new());
    assert!(report.buckets.is_empty());
    assert!(report.ranked_buckets.is_empty());
    assert!(report.trend.is_empty());
    assert!(report.is_empty());
    assert!(report.best().is_none());
    assert_eq!(report, WeeklyReport::default());
}

#[test]
fn all_invalid_input_yields_empty_report() {
    let records = vec![
        PriceRecord::new("not-a-date", "10"),
        PriceRecord::new("2024-03-01T00:00:00Z", "abc"),
        PriceRecord::new("", ""),
    ];
    let report = aggregate(&records);
    assert!(report.is_empty());
    assert_eq!(report.records_used, 0);
    assert_eq!(report.records_skipped, 3);
}

// ---------------------------------------------------------------------------
// worked example
// ---------------------------------------------------------------------------

#[test]
fn march_example_deviations() {
    let report = aggregate(&march_2024());
    let month_avg = (6.0 * 100.0 + 200.0 + 7.0 * 150.0) / 14.0;
    let week1_avg = (6.0 * 100.0 + 200.0) / 7.0;

    assert_eq!(report.buckets.len(), 2);
    assert_eq!(report.buckets[0].id, 1);
    assert_eq!(report.buckets[1].id, 2);
    assert_close(report.buckets[0].deviation, week1_avg - month_avg);
    assert_close(report.buckets[1].deviation, 150.0 - month_avg);
    assert!(report.buckets[0].deviation < -11.4 && report.buckets[0].deviation > -11.5);
    assert!(report.buckets[1].deviation > 24.2 && report.buckets[1].deviation < 24.3);

    assert_eq!(report.ranked_buckets[0].id, 2);
    assert_eq!(report.best().map(|b| b.id), Some(2));
    assert_eq!(report.worst().map(|b| b.id), Some(1));
}

#[test]
fn march_example_trend_row() {
    let report = aggregate(&march_2024());
    assert_eq!(report.trend.len(), 1);

    let row = &report.trend[0];
    assert_eq!(row.month_label, "Mar 24");
    assert_eq!(row.sort_date.to_string(), "2024-03-01");
    assert_eq!(row.month(), MonthKey::new(2024, 3).unwrap());
    assert_close(row.week1.unwrap(), 800.0 / 7.0);
    assert_close(row.week2.unwrap(), 150.0);
    assert!(row.week3.is_none());
    assert!(row.week4.is_none());
    assert!(row.week5.is_none());
}

#[test]
fn month_keys_are_real_calendar_months() {
    assert!(MonthKey::new(2024, 0).is_none());
    assert!(MonthKey::new(2024, 13).is_none());

    let leap = chrono::NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
    let key = MonthKey::of(leap);
    assert_eq!(key, MonthKey::new(2024, 2).unwrap());
    assert_eq!(key.first_day().to_string(), "2024-02-01");
    assert_eq!(key.label(), "Feb 24");
    assert_eq!(key.to_string(), "2024-02");
}

#[test]
fn bucket_metadata_is_populated() {
    let report = aggregate(&march_2024());
    let bucket = &report.buckets[1];
    assert_eq!(bucket.name, "Week 2");
    assert_eq!(bucket.full_label, "2nd Week (Days 8-14)");
    assert_eq!(bucket.sample_count, 1);
    assert_eq!(bucket.week(), WeekOfMonth::new(2));
}

// ---------------------------------------------------------------------------
// bucketing
// ---------------------------------------------------------------------------

#[test]
fn week_of_month_boundaries() {
    let expected = [(1, 1), (7, 1), (8, 2), (14, 2), (15, 3), (21, 3), (22, 4), (28, 4), (29, 5), (30, 5), (31, 5)];
    for (day, week) in expected {
        assert_eq!(WeekOfMonth::from_day(day).get(), week, "day {day}");
    }
}

#[test]
fn days_29_to_31_share_bucket_five() {
    let records = vec![
        record(2024, 1, 29, 10.0),
        record(2024, 1, 30, 20.0),
        record(2024, 1, 31, 30.0),
    ];
    let report = aggregate(&records);
    assert_eq!(report.buckets.len(), 1);
    assert_eq!(report.buckets[0].id, 5);
    assert_eq!(report.buckets[0].full_label, "5th Week (Days 29-31)");
    assert_close(report.trend[0].week5.unwrap(), 20.0);
    assert!(report.buckets.iter().all(|b| (1..=5).contains(&b.id)));
}

#[test]
fn leap_day_falls_in_bucket_five() {
    let report = aggregate(&[record(2024, 2, 29, 5.0)]);
    assert_eq!(report.buckets[0].id, 5);
}

// ---------------------------------------------------------------------------
// deviation semantics
// ---------------------------------------------------------------------------

#[test]
fn bucket_deviation_is_unweighted_mean_of_months() {
    // January: week 1 has 9 ticks, week 2 has 1 tick.
    let mut records: Vec<PriceRecord> = (1..=7).map(|d| record(2024, 1, d, 10.0)).collect();
    records.push(record(2024, 1, 1, 10.0));
    records.push(record(2024, 1, 2, 10.0));
    records.push(record(2024, 1, 8, 20.0));
    // February: one tick each.
    records.push(record(2024, 2, 1, 30.0));
    records.push(record(2024, 2, 8, 10.0));

    let report = aggregate(&records);

    // Jan avg = 110/10 = 11 -> w1 -1, w2 +9. Feb avg = 20 -> w1 +10, w2 -10.
    let w1 = report.buckets.iter().find(|b| b.id == 1).unwrap();
    let w2 = report.buckets.iter().find(|b| b.id == 2).unwrap();
    assert_close(w1.deviation, (-1.0 + 10.0) / 2.0);
    assert_close(w2.deviation, (9.0 - 10.0) / 2.0);
    assert_eq!(w1.sample_count, 2);
    assert_eq!(w2.sample_count, 2);
}

#[test]
fn overperforming_week_has_positive_deviation() {
    let records = vec![record(2024, 5, 3, 10.0), record(2024, 5, 17, 30.0)];
    let report = aggregate(&records);
    let w3 = report.buckets.iter().find(|b| b.id == 3).unwrap();
    assert!(w3.deviation > 0.0);
    assert!(w3.is_overperformer());
}

#[test]
fn buckets_without_data_are_omitted() {
    let records = vec![record(2024, 5, 3, 10.0), record(2024, 5, 24, 30.0)];
    let report = aggregate(&records);
    let ids: Vec<u8> = report.buckets.iter().map(|b| b.id).collect();
    assert_eq!(ids, vec![1, 4]);
}

// ---------------------------------------------------------------------------
// orderings
// ---------------------------------------------------------------------------

#[test]
fn ranking_is_descending_by_deviation() {
    let records = vec![
        // Month A: w1 = 9, w2 = 13 -> avg 11 -> w1 -2, w2 +2
        record(2024, 1, 1, 9.0),
        record(2024, 1, 8, 13.0),
        // Month B: w1 = 10, w3 = 11 -> avg 10.5 -> w1 -0.5, w3 +0.5
        record(2024, 2, 1, 10.0),
        record(2024, 2, 15, 11.0),
    ];
    let report = aggregate(&records);
    // w1 = (-2 + -0.5) / 2 = -1.25, w2 = +2.0, w3 = +0.5
    let ranked: Vec<u8> = report.ranked_buckets.iter().map(|b| b.id).collect();
    assert_eq!(ranked, vec![2, 3, 1]);
    let devs: Vec<f64> = report.ranked_buckets.iter().map(|b| b.deviation).collect();
    assert_close(devs[0], 2.0);
    assert_close(devs[1], 0.5);
    assert_close(devs[2], -1.25);
}

#[test]
fn both_orderings_hold_the_same_buckets() {
    let report = aggregate(&common_year());
    assert_eq!(report.buckets.len(), report.ranked_buckets.len());

    let ids: Vec<u8> = report.buckets.iter().map(|b| b.id).collect();
    let mut sorted = ids.clone();
    sorted.sort();
    assert_eq!(ids, sorted);

    for pair in report.ranked_buckets.windows(2) {
        assert!(pair[0].deviation >= pair[1].deviation);
    }
    for bucket in &report.ranked_buckets {
        assert!(report.buckets.contains(bucket));
    }
}

#[test]
fn trend_rows_are_chronological_and_unique() {
    let records = vec![
        record(2024, 3, 1, 1.0),
        record(2023, 12, 9, 1.0),
        record(2024, 1, 20, 1.0),
        record(2024, 3, 30, 1.0),
        record(2023, 12, 1, 1.0),
    ];
    let report = aggregate(&records);
    let labels: Vec<&str> = report.trend.iter().map(|r| r.month_label.as_str()).collect();
    assert_eq!(labels, vec!["Dec 23", "Jan 24", "Mar 24"]);
}

// ---------------------------------------------------------------------------
// malformed records
// ---------------------------------------------------------------------------

#[test]
fn malformed_records_never_count() {
    let mut records = march_2024();
    records.push(PriceRecord::new("not-a-date", "1000"));
    records.push(PriceRecord::new("2024-03-20T00:00:00Z", "abc"));

    let report = aggregate(&records);
    let total: usize = report.buckets.iter().map(|b| b.sample_count).sum();
    assert_eq!(total, 2);
    assert!(report.buckets.iter().all(|b| b.id != 3));
    assert_eq!(report.records_used, 14);
    assert_eq!(report.records_skipped, 2);

    let clean = aggregate(&march_2024());
    assert_eq!(report.buckets, clean.buckets);
    assert_eq!(report.trend, clean.trend);
}

// ---------------------------------------------------------------------------
// properties
// ---------------------------------------------------------------------------

fn random_records(seed: u64, n: usize) -> Vec<PriceRecord> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|_| {
            let year = rng.gen_range(2022..=2024);
            let month = rng.gen_range(1..=12);
            let day = rng.gen_range(1..=28);
            let price = rng.gen_range(1.0..500.0);
            record(year, month, day, price)
        })
        .collect()
}

fn common_year() -> Vec<PriceRecord> {
    random_records(7, 400)
}

#[test]
fn repeated_aggregation_is_bit_identical() {
    let records = random_records(42, 1_000);
    let first = aggregate(&records);
    let second = aggregate(&records);
    assert_eq!(first, second);
    for (a, b) in first.buckets.iter().zip(&second.buckets) {
        assert_eq!(a.deviation.to_bits(), b.deviation.to_bits());
    }
}

#[test]
fn month_average_lies_within_price_range() {
    let records = random_records(3, 600);
    let mut acc = Accumulator::new();
    acc.extend(&records);

    for year in 2022..=2024 {
        for month in 1..=12 {
            let key = MonthKey::new(year, month).unwrap();
            let Some(stats) = acc.month(key) else { continue };
            let prices: Vec<f64> = records
                .iter()
                .filter_map(|r| r.observation())
                .filter(|o| MonthKey::of(o.date) == key)
                .map(|o| o.price)
                .collect();
            let min = prices.iter().cloned().fold(f64::INFINITY, f64::min);
            let max = prices.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            assert!(stats.average() >= min - 1e-9 && stats.average() <= max + 1e-9);
        }
    }
}

#[test]
fn weighted_week_deviations_cancel_within_a_month() {
    let records = random_records(11, 800);
    let mut acc = Accumulator::new();
    acc.extend(&records);

    for year in 2022..=2024 {
        for month in 1..=12 {
            let key = MonthKey::new(year, month).unwrap();
            let Some(stats) = acc.month(key) else { continue };
            let weighted: f64 = WeekOfMonth::ALL
                .into_iter()
                .filter_map(|w| acc.specific_week(key, w))
                .map(|w| (w.average() - stats.average()) * w.count as f64)
                .sum();
            assert!(weighted.abs() < 1e-6, "{key}: {weighted}");
        }
    }
}

#[test]
fn merged_partials_match_single_pass() {
    let records = random_records(5, 500);
    let (left, right) = records.split_at(217);

    let mut a = Accumulator::new();
    a.extend(left);
    let mut b = Accumulator::new();
    b.extend(right);
    a.merge(b);
    let merged = a.finish();

    let single = aggregate(&records);
    assert_eq!(merged.records_used, single.records_used);
    assert_eq!(merged.trend.len(), single.trend.len());
    assert_eq!(merged.buckets.len(), single.buckets.len());
    for (m, s) in merged.buckets.iter().zip(&single.buckets) {
        assert_eq!(m.id, s.id);
        assert_eq!(m.sample_count, s.sample_count);
        assert!((m.deviation - s.deviation).abs() < 1e-6);
    }
}

#[test]
fn input_order_does_not_change_structure() {
    let records = random_records(9, 300);
    let mut reversed = records.clone();
    reversed.reverse();

    let a = aggregate(&records);
    let b = aggregate(&reversed);
    let ids = |r: &WeeklyReport| r.ranked_buckets.iter().map(|b| b.id).collect::<Vec<_>>();
    assert_eq!(a.trend.len(), b.trend.len());
    assert_eq!(a.buckets.len(), b.buckets.len());
    for (x, y) in a.buckets.iter().zip(&b.buckets) {
        assert!((x.deviation - y.deviation).abs() < 1e-6);
    }
    // Close deviations can swap under float noise; only check when well separated.
    if a.ranked_buckets.windows(2).all(|p| p[0].deviation - p[1].deviation > 1e-6) {
        assert_eq!(ids(&a), ids(&b));
    }
}
