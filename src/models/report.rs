use serde::{Deserialize, Serialize};

use super::bucket::WeekBucket;
use super::trend::TrendRow;

// ---------------------------------------------------------------------------
// WeeklyReport -- the three derived views
// ---------------------------------------------------------------------------

/// Result of one aggregation pass over the price feed.
///
/// `buckets` and `ranked_buckets` hold the same entries: the former ordered
/// by bucket id for charting, the latter by descending mean deviation. An
/// empty report is the "no data" state, not an error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyReport {
    pub buckets: Vec<WeekBucket>,
    pub ranked_buckets: Vec<WeekBucket>,
    pub trend: Vec<TrendRow>,
    /// Records that contributed to the aggregation.
    #[serde(default)]
    pub records_used: usize,
    /// Records dropped for a malformed timestamp or price.
    #[serde(default)]
    pub records_skipped: usize,
}

impl WeeklyReport {
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty() && self.trend.is_empty()
    }

    /// The bucket whose weeks most consistently beat their month's average.
    pub fn best(&self) -> Option<&WeekBucket> {
        self.ranked_buckets.first()
    }

    /// The bucket whose weeks fall furthest below their month's average.
    pub fn worst(&self) -> Option<&WeekBucket> {
        self.ranked_buckets.last()
    }
}
