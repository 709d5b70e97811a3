use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_ENDPOINT: &str = "http://localhost:3001/logs/";
pub const DEFAULT_CURRENCY: &str = "USD";
pub const API_KEY_HEADER: &str = "x-api-key";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

pub const ENV_ENDPOINT: &str = "WEEKPULSE_ENDPOINT";
pub const ENV_API_KEY: &str = "WEEKPULSE_API_KEY";
pub const ENV_CURRENCY: &str = "WEEKPULSE_CURRENCY";

/// Where the price-tick feed lives and how to authenticate against it.
#[derive(Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub url: String,
    pub currency: String,
    pub api_key: Option<String>,
}

impl Default for Endpoint {
    fn default() -> Self {
        Self {
            url: DEFAULT_ENDPOINT.to_string(),
            currency: DEFAULT_CURRENCY.to_string(),
            api_key: None,
        }
    }
}

impl Endpoint {
    /// Defaults overridden by `WEEKPULSE_ENDPOINT`, `WEEKPULSE_API_KEY` and
    /// `WEEKPULSE_CURRENCY` when set and non-empty.
    pub fn from_env() -> Self {
        let mut endpoint = Self::default();
        if let Some(url) = env_var(ENV_ENDPOINT) {
            endpoint.url = url;
        }
        if let Some(currency) = env_var(ENV_CURRENCY) {
            endpoint.currency = currency;
        }
        endpoint.api_key = env_var(ENV_API_KEY);
        endpoint
    }

    /// File name of the on-disk snapshot for this endpoint's currency.
    pub fn snapshot_file(&self, compressed: bool) -> String {
        let currency: String = self
            .currency
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect();
        if compressed {
            format!("logs-{}.json.gz", currency)
        } else {
            format!("logs-{}.json", currency)
        }
    }
}

impl fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Endpoint")
            .field("url", &self.url)
            .field("currency", &self.currency)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub fn default_cache_dir() -> PathBuf {
    if let Some(cache) = dirs::cache_dir() {
        cache.join("weekpulse")
    } else {
        PathBuf::from(".weekpulse-cache")
    }
}
