//! REE electricity price SDK for Rust.
//!
//! Fetches Spanish market prices from the REE public API, converts them to
//! €/kWh with calendar-aware labels, and summarizes each series (min, max,
//! current price, colour bucket) for chart and table renderers.
//!
//! # Quick start
//!
//! ```no_run
//! use ree_sdk::ReeSdk;
//!
//! let sdk = ReeSdk::builder().token("my-token").build().unwrap();
//!
//! // Today's hourly prices
//! if let Some(series) = sdk.prices().today() {
//!     println!("{:?}", series.labels());
//! }
//!
//! // Cheapest, dearest and current hour
//! let summary = sdk.prices().summary_today();
//! ```

#[cfg(feature = "async")]
pub mod async_client;
pub mod cache;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod models;
pub mod normalizer;
pub mod queries;
pub mod summary;

#[cfg(feature = "async")]
pub use async_client::AsyncReeSdk;
pub use cache::{CacheKey, DuckDbCache, MemoryCache, PriceCache};
pub use config::Config;
pub use error::{ReeError, Result};
pub use fetcher::PriceFetcher;
pub use models::{DateRange, Granularity, PricePoint, RawPricePoint, Series};
pub use summary::{CurrentHourPolicy, HourClock, Palette, RankedPoint, Summary};

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Local, NaiveDate, Utc};
use log::{debug, warn};

// ---------------------------------------------------------------------------
// ReeSdkBuilder
// ---------------------------------------------------------------------------

/// Builder for configuring and constructing a [`ReeSdk`] instance.
///
/// Use [`ReeSdk::builder()`] to obtain a builder, chain configuration
/// methods, and call [`build()`](ReeSdkBuilder::build) to create the SDK.
pub struct ReeSdkBuilder {
    api_base_url: String,
    token: Option<String>,
    timeout: Duration,
    cache: Option<Box<dyn PriceCache>>,
    duckdb_path: Option<PathBuf>,
    current_hour: CurrentHourPolicy,
    geo_zone: String,
}

impl Default for ReeSdkBuilder {
    fn default() -> Self {
        Self {
            api_base_url: config::API_BASE.to_string(),
            token: None,
            timeout: config::DEFAULT_TIMEOUT,
            cache: None,
            duckdb_path: None,
            current_hour: CurrentHourPolicy::default(),
            geo_zone: config::DEFAULT_GEO_ZONE.to_string(),
        }
    }
}

impl ReeSdkBuilder {
    /// Override the price endpoint.
    pub fn api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    /// Set the bearer token.
    ///
    /// If not set, `REE_API_TOKEN` is read at build time.
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Set the HTTP request timeout. Defaults to 30 seconds.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Use a caller-provided row cache.
    pub fn cache(mut self, cache: Box<dyn PriceCache>) -> Self {
        self.cache = Some(cache);
        self.duckdb_path = None;
        self
    }

    /// Cache rows in a DuckDB file at `path`.
    ///
    /// See [`config::default_cache_path`] for a platform default.
    pub fn duckdb_cache<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.duckdb_path = Some(path.as_ref().to_path_buf());
        self.cache = None;
        self
    }

    /// Choose how the "current" hour is picked. Defaults to local time.
    pub fn current_hour_policy(mut self, policy: CurrentHourPolicy) -> Self {
        self.current_hour = policy;
        self
    }

    /// Geo zone kept from multi-zone feeds. Defaults to `Peninsula`.
    pub fn geo_zone(mut self, zone: impl Into<String>) -> Self {
        self.geo_zone = zone.into();
        self
    }

    /// Build the SDK.
    ///
    /// Fails when no token is configured, or when the DuckDB cache cannot
    /// be opened.
    pub fn build(self) -> Result<ReeSdk> {
        let token = self
            .token
            .or_else(config::token_from_env)
            .ok_or_else(|| {
                ReeError::InvalidArgument(format!(
                    "No API token: call .token() or set {}",
                    config::TOKEN_ENV
                ))
            })?;

        let fetcher = PriceFetcher::new(Config {
            api_base_url: self.api_base_url,
            token,
            timeout: self.timeout,
        })?;

        let cache = match self.duckdb_path {
            Some(path) => Some(Box::new(DuckDbCache::open(path)?) as Box<dyn PriceCache>),
            None => self.cache,
        };

        Ok(ReeSdk {
            fetcher,
            cache,
            current_hour: self.current_hour,
            geo_zone: self.geo_zone,
        })
    }
}

// ---------------------------------------------------------------------------
// ReeSdk
// ---------------------------------------------------------------------------

/// The main entry point for the REE price SDK.
///
/// Each call runs fetch → normalize → summarize for one range. Nothing is
/// shared between calls except the optional row cache.
///
/// Created via [`ReeSdk::builder()`].
pub struct ReeSdk {
    fetcher: PriceFetcher,
    cache: Option<Box<dyn PriceCache>>,
    current_hour: CurrentHourPolicy,
    geo_zone: String,
}

impl ReeSdk {
    /// Create a new builder for configuring the SDK.
    pub fn builder() -> ReeSdkBuilder {
        ReeSdkBuilder::default()
    }

    // -- Query accessors ---------------------------------------------------

    /// Price queries anchored at today's local date.
    pub fn prices(&self) -> queries::prices::PriceQuery<'_> {
        self.prices_on(Local::now().date_naive())
    }

    /// Price queries anchored at `date` ("today" for the helpers).
    pub fn prices_on(&self, date: NaiveDate) -> queries::prices::PriceQuery<'_> {
        queries::prices::PriceQuery::new(self, date)
    }

    // -- Pipeline ----------------------------------------------------------

    /// Normalized series for `range`, or `None` when no data is available.
    ///
    /// Transport and parse failures are logged and collapse to `None`.
    pub fn get_series(&self, range: &DateRange) -> Option<Series> {
        match self.try_series(range) {
            Ok(series) => Some(series),
            Err(e) => {
                warn!("No price data for {}: {}", range, e);
                None
            }
        }
    }

    /// Summary of `range` at the current time, or `None` when the series
    /// is unavailable or empty.
    pub fn get_summary(&self, range: &DateRange) -> Option<Summary> {
        self.summary_at(range, Utc::now())
    }

    /// Summary of `range` with "now" given explicitly.
    pub fn summary_at(&self, range: &DateRange, now: DateTime<Utc>) -> Option<Summary> {
        let series = self.get_series(range);
        if series.as_ref().is_some_and(Series::is_empty) {
            debug!("Series for {} is empty; no summary", range);
        }
        summary::summarize(series.as_ref(), &self.current_hour, now)
    }

    /// Normalized series for `range`, surfacing the failure reason.
    ///
    /// Consults the cache first; on a miss, fetches and writes the rows
    /// back. Cache errors are logged and bypassed.
    pub fn try_series(&self, range: &DateRange) -> Result<Series> {
        let key = CacheKey::for_range(range);

        if let Some(cache) = &self.cache {
            match cache.get(&key) {
                Ok(Some(rows)) => {
                    debug!("Cache hit for {:?} ({} rows)", key, rows.len());
                    return Ok(normalizer::to_series(
                        rows,
                        range.granularity(),
                        &self.geo_zone,
                    ));
                }
                Ok(None) => debug!("Cache miss for {:?}", key),
                Err(e) => warn!("Cache lookup failed for {:?}: {}", key, e),
            }
        }

        let body = self.fetcher.fetch(range)?;
        let rows = normalizer::parse_points(&body)?;

        if let Some(cache) = &self.cache {
            if !rows.is_empty() {
                if let Err(e) = cache.put(&key, &rows) {
                    warn!("Cache write failed for {:?}: {}", key, e);
                }
            }
        }

        Ok(normalizer::to_series(rows, range.granularity(), &self.geo_zone))
    }

    // -- Accessors ---------------------------------------------------------

    pub fn fetcher(&self) -> &PriceFetcher {
        &self.fetcher
    }

    pub fn current_hour_policy(&self) -> CurrentHourPolicy {
        self.current_hour
    }

    pub fn geo_zone(&self) -> &str {
        &self.geo_zone
    }

    pub fn has_cache(&self) -> bool {
        self.cache.is_some()
    }
}

// ---------------------------------------------------------------------------
// Display
// ---------------------------------------------------------------------------

impl fmt::Display for ReeSdk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ReeSdk(api={}, geo_zone={}, cache={})",
            self.fetcher.config().api_base_url,
            self.geo_zone,
            self.cache.is_some()
        )
    }
}
