//! Async wrapper around [`ReeSdk`] for use in async runtimes (Tokio, etc.).
//!
//! Runs the blocking fetch pipeline on a blocking thread pool via
//! [`tokio::task::spawn_blocking`], keeping the async event loop free.
//!
//! # Example
//!
//! ```no_run
//! use ree_sdk::{AsyncReeSdk, DateRange};
//!
//! async fn show() {
//!     let sdk = AsyncReeSdk::builder().token("my-token").build().await.unwrap();
//!
//!     let today = chrono::Local::now().date_naive();
//!     let series = sdk.series(DateRange::day(today)).await.unwrap();
//!
//!     // Run any sync SDK method via closure
//!     let week = sdk.run(|s| Ok(s.prices().last_7_days())).await.unwrap();
//! }
//! ```

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::cache::PriceCache;
use crate::error::{ReeError, Result};
use crate::models::{DateRange, Series};
use crate::summary::{CurrentHourPolicy, Summary};
use crate::ReeSdk;

// ---------------------------------------------------------------------------
// AsyncReeSdkBuilder
// ---------------------------------------------------------------------------

/// Builder for configuring and constructing an [`AsyncReeSdk`] instance.
#[derive(Default)]
pub struct AsyncReeSdkBuilder {
    api_base_url: Option<String>,
    token: Option<String>,
    timeout: Option<Duration>,
    cache: Option<Box<dyn PriceCache>>,
    duckdb_path: Option<PathBuf>,
    current_hour: Option<CurrentHourPolicy>,
    geo_zone: Option<String>,
}

impl AsyncReeSdkBuilder {
    /// Override the price endpoint.
    pub fn api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = Some(url.into());
        self
    }

    /// Set the bearer token.
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Set the HTTP request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Use a caller-provided row cache.
    pub fn cache(mut self, cache: Box<dyn PriceCache>) -> Self {
        self.cache = Some(cache);
        self.duckdb_path = None;
        self
    }

    /// Cache rows in a DuckDB file at `path`.
    pub fn duckdb_cache<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.duckdb_path = Some(path.as_ref().to_path_buf());
        self.cache = None;
        self
    }

    /// Choose how the "current" hour is picked.
    pub fn current_hour_policy(mut self, policy: CurrentHourPolicy) -> Self {
        self.current_hour = Some(policy);
        self
    }

    /// Geo zone kept from multi-zone feeds.
    pub fn geo_zone(mut self, zone: impl Into<String>) -> Self {
        self.geo_zone = Some(zone.into());
        self
    }

    /// Build the async SDK.
    ///
    /// Initialization runs on the blocking thread pool so opening the
    /// cache file won't block the async event loop.
    pub async fn build(self) -> Result<AsyncReeSdk> {
        tokio::task::spawn_blocking(move || {
            let mut builder = ReeSdk::builder();
            if let Some(url) = self.api_base_url {
                builder = builder.api_base_url(url);
            }
            if let Some(token) = self.token {
                builder = builder.token(token);
            }
            if let Some(timeout) = self.timeout {
                builder = builder.timeout(timeout);
            }
            if let Some(cache) = self.cache {
                builder = builder.cache(cache);
            }
            if let Some(path) = self.duckdb_path {
                builder = builder.duckdb_cache(path);
            }
            if let Some(policy) = self.current_hour {
                builder = builder.current_hour_policy(policy);
            }
            if let Some(zone) = self.geo_zone {
                builder = builder.geo_zone(zone);
            }
            let sdk = builder.build()?;
            Ok(AsyncReeSdk {
                inner: Arc::new(Mutex::new(sdk)),
            })
        })
        .await
        .map_err(|e| ReeError::InvalidArgument(format!("Task join error: {e}")))?
    }
}

// ---------------------------------------------------------------------------
// AsyncReeSdk
// ---------------------------------------------------------------------------

/// Async wrapper around [`ReeSdk`].
///
/// All operations are dispatched to a blocking thread pool via
/// [`tokio::task::spawn_blocking`]. The underlying [`ReeSdk`] is
/// protected by a [`Mutex`] since its cache is not `Sync`.
#[derive(Clone)]
pub struct AsyncReeSdk {
    inner: Arc<Mutex<ReeSdk>>,
}

impl AsyncReeSdk {
    /// Create a new builder for configuring the async SDK.
    pub fn builder() -> AsyncReeSdkBuilder {
        AsyncReeSdkBuilder::default()
    }

    /// Wrap an already built [`ReeSdk`].
    pub fn from_sdk(sdk: ReeSdk) -> Self {
        Self {
            inner: Arc::new(Mutex::new(sdk)),
        }
    }

    /// Run a sync SDK operation on the blocking thread pool.
    ///
    /// The closure receives an `&ReeSdk` reference and should return
    /// a `Result<T>`.
    pub async fn run<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&ReeSdk) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let sdk = self.inner.clone();
        tokio::task::spawn_blocking(move || {
            let guard = sdk
                .lock()
                .map_err(|_| ReeError::InvalidArgument("SDK lock poisoned".into()))?;
            f(&guard)
        })
        .await
        .map_err(|e| ReeError::InvalidArgument(format!("Task join error: {e}")))?
    }

    /// Normalized series for `range`; `Ok(None)` when no data is available.
    pub async fn series(&self, range: DateRange) -> Result<Option<Series>> {
        self.run(move |s| Ok(s.get_series(&range))).await
    }

    /// Summary for `range` at the current time.
    pub async fn summary(&self, range: DateRange) -> Result<Option<Summary>> {
        self.run(move |s| Ok(s.get_summary(&range))).await
    }
}
