//! Week-of-month price analytics for Rust.
//!
//! Fetches a flat feed of timestamped price observations, caches it locally,
//! and compares each calendar week's average price against its month's
//! average. The result ranks the five week-of-month buckets by how
//! consistently they beat their month, and tabulates per-week averages month
//! by month for trend charts.
//!
//! # Quick start
//!
//! ```no_run
//! use weekpulse::Weekpulse;
//!
//! let pulse = Weekpulse::builder()
//!     .endpoint("http://localhost:3001/logs/")
//!     .api_key("secret")
//!     .build()
//!     .unwrap();
//!
//! let report = pulse.report().unwrap();
//! if let Some(best) = report.best() {
//!     println!("{}", weekpulse::chart::best_week_headline(best));
//! }
//! ```

pub mod aggregate;
#[cfg(feature = "async")]
pub mod async_client;
pub mod cache;
pub mod chart;
pub mod config;
pub mod error;
pub mod models;

pub use aggregate::{aggregate, Accumulator};
#[cfg(feature = "async")]
pub use async_client::AsyncWeekpulse;
pub use cache::LogCache;
pub use chart::ChartKind;
pub use config::Endpoint;
pub use error::{Result, WeekpulseError};
pub use models::{PriceRecord, TrendRow, WeekBucket, WeekOfMonth, WeeklyReport};

use std::cell::RefCell;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

// ---------------------------------------------------------------------------
// WeekpulseBuilder
// ---------------------------------------------------------------------------

/// Builder for configuring and constructing a [`Weekpulse`] instance.
///
/// Use [`Weekpulse::builder()`] for compiled-in defaults or
/// [`Weekpulse::from_env()`] to start from the `WEEKPULSE_*` environment
/// variables, chain overrides, and call [`build()`](WeekpulseBuilder::build).
#[derive(Debug, Clone)]
pub struct WeekpulseBuilder {
    endpoint: Endpoint,
    cache_dir: Option<PathBuf>,
    offline: bool,
    compress: bool,
    timeout: Duration,
}

impl Default for WeekpulseBuilder {
    fn default() -> Self {
        Self {
            endpoint: Endpoint::default(),
            cache_dir: None,
            offline: false,
            compress: false,
            timeout: config::DEFAULT_TIMEOUT,
        }
    }
}

impl WeekpulseBuilder {
    /// Set the URL of the price feed.
    pub fn endpoint(mut self, url: impl Into<String>) -> Self {
        self.endpoint.url = url.into();
        self
    }

    /// Set the API key sent in the `x-api-key` header.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.endpoint.api_key = Some(key.into());
        self
    }

    /// Set the currency requested from the feed. Defaults to `USD`.
    pub fn currency(mut self, currency: impl Into<String>) -> Self {
        self.endpoint.currency = currency.into();
        self
    }

    /// Set a custom cache directory.
    ///
    /// If not set, the platform-appropriate default cache directory is used
    /// (e.g. `~/.cache/weekpulse` on Linux).
    pub fn cache_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.cache_dir = Some(path.as_ref().to_path_buf());
        self
    }

    /// Enable or disable offline mode.
    ///
    /// When offline, the endpoint is never contacted and only a previously
    /// saved snapshot is used. Defaults to `false`.
    pub fn offline(mut self, offline: bool) -> Self {
        self.offline = offline;
        self
    }

    /// Store snapshots gzip-compressed. Defaults to `false`.
    pub fn compress(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }

    /// Set the HTTP request timeout. Defaults to 30 seconds.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build the client. Does not contact the endpoint.
    pub fn build(self) -> Result<Weekpulse> {
        if self.endpoint.url.trim().is_empty() {
            return Err(WeekpulseError::InvalidArgument(
                "price feed endpoint must not be empty".into(),
            ));
        }
        let mut cache = LogCache::new(self.endpoint, self.cache_dir, self.offline, self.timeout)?;
        cache.compress = self.compress;
        Ok(Weekpulse {
            cache: RefCell::new(cache),
        })
    }
}

// ---------------------------------------------------------------------------
// Weekpulse
// ---------------------------------------------------------------------------

/// The main entry point: price feed access plus aggregation.
///
/// Every report is recomputed from scratch from the current record set;
/// nothing derived is kept between calls.
pub struct Weekpulse {
    cache: RefCell<LogCache>,
}

impl Weekpulse {
    /// Create a new builder with compiled-in defaults.
    pub fn builder() -> WeekpulseBuilder {
        WeekpulseBuilder::default()
    }

    /// Create a new builder seeded from the `WEEKPULSE_*` environment variables.
    pub fn from_env() -> WeekpulseBuilder {
        WeekpulseBuilder {
            endpoint: Endpoint::from_env(),
            ..WeekpulseBuilder::default()
        }
    }

    fn cache_mut(&self) -> Result<std::cell::RefMut<'_, LogCache>> {
        self.cache
            .try_borrow_mut()
            .map_err(|_| WeekpulseError::RefreshInProgress)
    }

    /// Raw records, from the snapshot if present, otherwise fetched.
    pub fn records(&self) -> Result<Vec<PriceRecord>> {
        self.cache_mut()?.load()
    }

    /// Aggregate the current record set.
    pub fn report(&self) -> Result<WeeklyReport> {
        let records = self.records()?;
        Ok(aggregate(&records))
    }

    /// Re-fetch the feed and aggregate it.
    ///
    /// Fails with [`WeekpulseError::RefreshInProgress`] if the cache is
    /// already in use, and propagates fetch failures unchanged so the caller
    /// can report them and let the user retry.
    pub fn refresh(&self) -> Result<WeeklyReport> {
        let records = self.cache_mut()?.fetch()?;
        Ok(aggregate(&records))
    }

    /// The best-ranked bucket of the current report, if there is any data.
    pub fn best_week(&self) -> Result<Option<WeekBucket>> {
        Ok(self.report()?.best().cloned())
    }

    /// Delete the on-disk snapshot.
    pub fn clear_cache(&self) -> Result<()> {
        self.cache_mut()?.clear()
    }

    /// The configured endpoint.
    pub fn endpoint(&self) -> Endpoint {
        self.cache.borrow().endpoint().clone()
    }

    /// Drop the HTTP connection pool. A later fetch builds a new one.
    pub fn disconnect(&self) -> Result<()> {
        self.cache_mut()?.close();
        Ok(())
    }

    /// Consume the client and release the HTTP connection pool.
    pub fn close(self) {
        self.cache.into_inner().close();
    }
}

// ---------------------------------------------------------------------------
// Display
// ---------------------------------------------------------------------------

impl fmt::Display for Weekpulse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.cache.try_borrow() {
            Ok(cache) => write!(
                f,
                "Weekpulse(endpoint={}, currency={}, cache_dir={}, offline={})",
                cache.endpoint().url,
                cache.endpoint().currency,
                cache.cache_dir.display(),
                cache.offline
            ),
            Err(_) => f.write_str("Weekpulse(<busy>)"),
        }
    }
}
