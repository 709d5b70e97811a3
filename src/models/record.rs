use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Result, WeekpulseError};

// ---------------------------------------------------------------------------
// PriceRecord -- one entry of the remote price-tick feed
// ---------------------------------------------------------------------------

/// A raw price observation as delivered by the data source.
///
/// Both fields are kept as loose JSON values: the feed is allowed to send
/// string-encoded numbers, and malformed entries must survive decoding so
/// they can be dropped (not errored) during aggregation.
///
/// Decodes from any JSON object: `ts` is read before `timestamp` and
/// `buy_price` before `price`, and every other key is ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Map<String, Value>")]
pub struct PriceRecord {
    #[serde(rename = "ts")]
    pub timestamp: Value,
    #[serde(rename = "buy_price")]
    pub price: Value,
}

impl From<Map<String, Value>> for PriceRecord {
    fn from(mut entry: Map<String, Value>) -> Self {
        let mut take = |primary: &str, fallback: &str| {
            entry
                .remove(primary)
                .or_else(|| entry.remove(fallback))
                .unwrap_or(Value::Null)
        };
        let timestamp = take("ts", "timestamp");
        let price = take("buy_price", "price");
        Self { timestamp, price }
    }
}

/// A record that passed timestamp and price validation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    pub date: NaiveDate,
    pub price: f64,
}

impl PriceRecord {
    pub fn new(timestamp: impl Into<String>, price: impl Into<String>) -> Self {
        Self {
            timestamp: Value::String(timestamp.into()),
            price: Value::String(price.into()),
        }
    }

    /// Validate both fields. `None` means the record is to be skipped.
    pub fn observation(&self) -> Option<Observation> {
        let date = parse_timestamp(&self.timestamp)?;
        let price = parse_price(&self.price)?;
        Some(Observation { date, price })
    }
}

/// Decode a feed body into records.
///
/// The body must be a JSON array. Entries that are not objects are skipped;
/// every object becomes a record and field-level validation is left to
/// [`PriceRecord::observation`].
pub fn records_from_json(body: Value) -> Result<Vec<PriceRecord>> {
    let Value::Array(entries) = body else {
        return Err(WeekpulseError::InvalidResponse(format!(
            "expected a JSON array of price records, got {}",
            json_kind(&body)
        )));
    };

    let total = entries.len();
    let records: Vec<PriceRecord> = entries
        .into_iter()
        .filter_map(|entry| match entry {
            Value::Object(map) => Some(PriceRecord::from(map)),
            _ => None,
        })
        .collect();

    if records.len() < total {
        tracing::debug!(
            skipped = total - records.len(),
            "non-object entries dropped from feed body"
        );
    }
    Ok(records)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// ---------------------------------------------------------------------------
// Field parsing
// ---------------------------------------------------------------------------

const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Calendar date of a feed timestamp.
///
/// Timestamps carrying an offset are normalized to UTC first. Numbers are
/// epoch milliseconds.
pub fn parse_timestamp(value: &Value) -> Option<NaiveDate> {
    match value {
        Value::String(s) => parse_timestamp_str(s.trim()),
        Value::Number(n) => {
            let millis = n
                .as_i64()
                .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f as i64))?;
            DateTime::<Utc>::from_timestamp_millis(millis).map(|dt| dt.date_naive())
        }
        _ => None,
    }
}

fn parse_timestamp_str(s: &str) -> Option<NaiveDate> {
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc).date_naive());
    }
    for fmt in NAIVE_DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(date);
    }
    DateTime::parse_from_rfc2822(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc).date_naive())
}

/// Numeric price of a feed entry; strings must hold a finite number.
///
/// The whole trimmed string has to parse. A string with trailing text such
/// as `"12.5 USD"` is rejected rather than read as its numeric prefix, so
/// such records are skipped.
pub fn parse_price(value: &Value) -> Option<f64> {
    let price = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    price.is_finite().then_some(price)
}
