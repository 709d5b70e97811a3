//! Price feed download and local snapshot cache.
//!
//! Fetches the raw price-tick feed from the configured endpoint and keeps the
//! last successful response on disk, so reports can be rebuilt without the
//! network and the feed is only re-downloaded on an explicit refresh.

use crate::config::{self, Endpoint};
use crate::error::{Result, WeekpulseError};
use crate::models::{records_from_json, PriceRecord};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use reqwest::blocking::Client;
use std::fs;
use std::io::{BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Downloads the price feed and caches the last response on disk.
pub struct LogCache {
    /// Directory where snapshots are stored.
    pub cache_dir: PathBuf,
    /// If true, never contact the endpoint (use the snapshot only).
    pub offline: bool,
    /// If true, snapshots are written gzip-compressed.
    pub compress: bool,
    endpoint: Endpoint,
    timeout: Duration,
    client: Option<Client>,
}

impl LogCache {
    /// Create a new cache for `endpoint`.
    ///
    /// If `cache_dir` is `None`, uses the platform-appropriate default cache directory.
    /// Creates the cache directory if it does not exist.
    pub fn new(
        endpoint: Endpoint,
        cache_dir: Option<PathBuf>,
        offline: bool,
        timeout: Duration,
    ) -> Result<Self> {
        let dir = cache_dir.unwrap_or_else(config::default_cache_dir);
        fs::create_dir_all(&dir)?;
        Ok(Self {
            cache_dir: dir,
            offline,
            compress: false,
            endpoint,
            timeout,
            client: None,
        })
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Lazy HTTP client, created on first use.
    fn client(&mut self) -> Result<Client> {
        if let Some(client) = &self.client {
            return Ok(client.clone());
        }
        let client = Client::builder()
            .timeout(self.timeout)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()?;
        self.client = Some(client.clone());
        Ok(client)
    }

    /// Path the next snapshot will be written to.
    pub fn snapshot_path(&self) -> PathBuf {
        self.cache_dir.join(self.endpoint.snapshot_file(self.compress))
    }

    /// Existing snapshot for this endpoint, compressed or not.
    fn existing_snapshot(&self) -> Option<PathBuf> {
        let preferred = self.snapshot_path();
        if preferred.exists() {
            return Some(preferred);
        }
        let other = self
            .cache_dir
            .join(self.endpoint.snapshot_file(!self.compress));
        other.exists().then_some(other)
    }

    pub fn has_snapshot(&self) -> bool {
        self.existing_snapshot().is_some()
    }

    /// Download the feed body.
    ///
    /// A non-success status becomes [`WeekpulseError::Status`]; nothing is
    /// retried.
    fn download(&mut self) -> Result<Vec<u8>> {
        let client = self.client()?;
        tracing::debug!(url = %self.endpoint.url, currency = %self.endpoint.currency, "fetching price feed");

        let mut request = client
            .get(&self.endpoint.url)
            .query(&[("currency", self.endpoint.currency.as_str())]);
        if let Some(key) = &self.endpoint.api_key {
            request = request.header(config::API_KEY_HEADER, key);
        }

        let resp = request.send().inspect_err(|e| {
            tracing::warn!(error = %e, "price feed request failed");
        })?;
        let status = resp.status();
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "price feed returned an error status");
            return Err(WeekpulseError::Status(status.as_u16()));
        }
        Ok(resp.bytes()?.to_vec())
    }

    /// Write a snapshot atomically.
    ///
    /// Writes to a temp file first and renames on success, so an interrupted
    /// write never leaves a corrupt partial snapshot behind.
    fn save_snapshot(&self, body: &[u8]) -> Result<PathBuf> {
        let dest = self.snapshot_path();
        let tmp_dest = dest.with_extension(format!(
            "{}.tmp",
            dest.extension().and_then(|e| e.to_str()).unwrap_or("")
        ));

        let result = (|| -> Result<()> {
            if self.compress {
                let file = fs::File::create(&tmp_dest)?;
                let mut encoder = GzEncoder::new(file, Compression::default());
                encoder.write_all(body)?;
                encoder.finish()?;
            } else {
                fs::write(&tmp_dest, body)?;
            }
            fs::rename(&tmp_dest, &dest)?;
            Ok(())
        })();

        if result.is_err() {
            let _ = fs::remove_file(&tmp_dest);
        }
        result?;

        // Drop a stale snapshot of the other encoding so reads stay unambiguous.
        let other = self
            .cache_dir
            .join(self.endpoint.snapshot_file(!self.compress));
        if other.exists() {
            let _ = fs::remove_file(other);
        }
        Ok(dest)
    }

    /// Fetch the feed from the endpoint, replace the snapshot and return the records.
    ///
    /// The body is validated before it is written, so a malformed response
    /// never replaces a good snapshot.
    pub fn fetch(&mut self) -> Result<Vec<PriceRecord>> {
        if self.offline {
            return Err(WeekpulseError::InvalidArgument(
                "cannot fetch the price feed in offline mode".into(),
            ));
        }
        let body = self.download()?;
        let value: serde_json::Value = serde_json::from_slice(&body)?;
        let records = records_from_json(value)?;
        let path = self.save_snapshot(&body)?;
        tracing::debug!(records = records.len(), path = %path.display(), "price feed snapshot saved");
        Ok(records)
    }

    /// Records from the snapshot if one exists, otherwise from the endpoint.
    pub fn load(&mut self) -> Result<Vec<PriceRecord>> {
        if self.has_snapshot() {
            return self.load_snapshot();
        }
        if self.offline {
            return Err(WeekpulseError::NotFound(format!(
                "no cached price feed for {} and offline mode is enabled",
                self.endpoint.currency
            )));
        }
        self.fetch()
    }

    /// Load and parse the snapshot (handles `.gz` transparently).
    ///
    /// If the snapshot is corrupt (truncated write, disk error), it is
    /// deleted automatically so the next load fetches a fresh copy.
    pub fn load_snapshot(&self) -> Result<Vec<PriceRecord>> {
        let path = self.existing_snapshot().ok_or_else(|| {
            WeekpulseError::NotFound(format!(
                "no cached price feed for {}",
                self.endpoint.currency
            ))
        })?;

        let parse_result = read_snapshot(&path).and_then(records_from_json);

        match parse_result {
            Ok(records) => Ok(records),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "corrupt price feed snapshot, removing");
                let _ = fs::remove_file(&path);
                Err(WeekpulseError::NotFound(format!(
                    "Snapshot '{}' was corrupt and has been removed. \
                     Refresh to re-download. Original error: {}",
                    path.file_name()
                        .and_then(|n| n.to_str())
                        .unwrap_or("unknown"),
                    e
                )))
            }
        }
    }

    /// Remove all cached files and recreate the cache directory.
    pub fn clear(&self) -> Result<()> {
        if self.cache_dir.exists() {
            fs::remove_dir_all(&self.cache_dir)?;
            fs::create_dir_all(&self.cache_dir)?;
        }
        Ok(())
    }

    /// Close the HTTP client, if open.
    pub fn close(&mut self) {
        self.client = None;
    }
}

fn read_snapshot(path: &Path) -> Result<serde_json::Value> {
    if path.extension().and_then(|e| e.to_str()) == Some("gz") {
        let file = fs::File::open(path)?;
        let decoder = GzDecoder::new(BufReader::new(file));
        let mut contents = String::new();
        BufReader::new(decoder).read_to_string(&mut contents)?;
        Ok(serde_json::from_str(&contents)?)
    } else {
        let contents = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }
}
