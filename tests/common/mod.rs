//! Shared fixtures for the weekpulse integration tests.

#![allow(dead_code)]

use std::path::Path;
use std::time::Duration;

use serde_json::json;
use weekpulse::{Endpoint, LogCache, PriceRecord};

/// A record with an ISO timestamp at noon UTC on the given day.
pub fn record(year: i32, month: u32, day: u32, price: f64) -> PriceRecord {
    PriceRecord::new(
        format!("{:04}-{:02}-{:02}T12:00:00Z", year, month, day),
        price.to_string(),
    )
}

/// March 2024: 100 on days 1-6 and 200 on day 7 (bucket 1), 150 on days
/// 8-14 (bucket 2). Month average = 1760 / 14.
pub fn march_2024() -> Vec<PriceRecord> {
    let mut records: Vec<PriceRecord> = (1..=6).map(|d| record(2024, 3, d, 100.0)).collect();
    records.push(record(2024, 3, 7, 200.0));
    records.extend((8..=14).map(|d| record(2024, 3, d, 150.0)));
    records
}

/// A feed body in the wire format, mixing numeric and string prices and
/// including malformed entries.
pub fn feed_body() -> serde_json::Value {
    json!([
        {"ts": "2024-01-03T09:00:00Z", "buy_price": "10.0", "sell_price": "9.5"},
        {"ts": "2024-01-10T09:00:00Z", "buy_price": 14.0},
        {"ts": "2024-01-30T09:00:00Z", "buy_price": "12.0"},
        {"ts": "2024-02-05T09:00:00Z", "buy_price": "20.0"},
        {"ts": "2024-02-12T09:00:00Z", "buy_price": "22.0"},
        {"ts": "not-a-date", "buy_price": "99.0"},
        {"ts": "2024-02-13T09:00:00Z", "buy_price": "abc"},
        {"buy_price": "5.0"},
        42,
        null
    ])
}

/// A `LogCache` in `dir` pointed at `url`.
pub fn cache_at(dir: &Path, url: &str, offline: bool) -> LogCache {
    let endpoint = Endpoint {
        url: url.to_string(),
        currency: "USD".to_string(),
        api_key: Some("test-key".to_string()),
    };
    LogCache::new(endpoint, Some(dir.to_path_buf()), offline, Duration::from_secs(5)).unwrap()
}

/// Write `body` as an uncompressed USD snapshot into `dir`.
pub fn write_snapshot(dir: &Path, body: &serde_json::Value) {
    std::fs::write(dir.join("logs-USD.json"), serde_json::to_vec(body).unwrap()).unwrap();
}

pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}
