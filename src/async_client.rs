//! Async wrapper around [`Weekpulse`] for use in async runtimes (Tokio, etc.).
//!
//! Runs all operations on a blocking thread pool via
//! [`tokio::task::spawn_blocking`], keeping the async event loop free.
//! Only one refresh may be in flight at a time; a second one is rejected
//! rather than queued behind the first.
//!
//! # Example
//!
//! ```no_run
//! use weekpulse::AsyncWeekpulse;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let pulse = AsyncWeekpulse::new(weekpulse::Weekpulse::from_env()).await.unwrap();
//!     let report = pulse.refresh().await.unwrap();
//!     println!("{} months", report.trend.len());
//! }
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::error::{Result, WeekpulseError};
use crate::models::{WeekBucket, WeeklyReport};
use crate::{Weekpulse, WeekpulseBuilder};

/// Async wrapper around [`Weekpulse`].
///
/// The underlying client is protected by a [`Mutex`] since it uses
/// `RefCell` internally.
#[derive(Clone)]
pub struct AsyncWeekpulse {
    inner: Arc<Mutex<Weekpulse>>,
    refreshing: Arc<AtomicBool>,
}

/// Clears the in-flight flag when the blocking refresh finishes, however it
/// finishes. Owned by the blocking task, not the awaiting future.
struct RefreshGuard(Arc<AtomicBool>);

impl Drop for RefreshGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl AsyncWeekpulse {
    /// Build the client from a configured builder on the blocking pool.
    pub async fn new(builder: WeekpulseBuilder) -> Result<Self> {
        tokio::task::spawn_blocking(move || {
            let pulse = builder.build()?;
            Ok(AsyncWeekpulse {
                inner: Arc::new(Mutex::new(pulse)),
                refreshing: Arc::new(AtomicBool::new(false)),
            })
        })
        .await
        .map_err(|e| WeekpulseError::InvalidArgument(format!("Task join error: {e}")))?
    }

    /// Run a sync operation on the blocking thread pool.
    pub async fn run<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Weekpulse) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let pulse = self.inner.clone();
        tokio::task::spawn_blocking(move || {
            let guard = pulse
                .lock()
                .map_err(|_| WeekpulseError::InvalidArgument("client lock poisoned".into()))?;
            f(&guard)
        })
        .await
        .map_err(|e| WeekpulseError::InvalidArgument(format!("Task join error: {e}")))?
    }

    /// Whether a refresh is currently running.
    pub fn is_refreshing(&self) -> bool {
        self.refreshing.load(Ordering::Acquire)
    }

    /// Aggregate the current record set.
    pub async fn report(&self) -> Result<WeeklyReport> {
        self.run(|p| p.report()).await
    }

    /// Re-fetch the feed and aggregate it.
    ///
    /// Returns [`WeekpulseError::RefreshInProgress`] immediately if another
    /// refresh has not finished yet. Dropping the returned future does not
    /// cancel a fetch that has started; the flag stays set until it ends.
    pub async fn refresh(&self) -> Result<WeeklyReport> {
        if self
            .refreshing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(WeekpulseError::RefreshInProgress);
        }
        let guard = RefreshGuard(self.refreshing.clone());
        self.run(move |p| {
            let _guard = guard;
            p.refresh()
        })
        .await
    }

    /// The best-ranked bucket of the current report.
    pub async fn best_week(&self) -> Result<Option<WeekBucket>> {
        self.run(|p| p.best_week()).await
    }

    /// Close the client, releasing its HTTP connection pool.
    pub async fn close(self) -> Result<()> {
        self.run(|p| p.disconnect()).await
    }
}
