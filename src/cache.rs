//! Read-through / write-through lookup of upstream price rows.
//!
//! The pipeline consults a [`PriceCache`] before fetching and stores rows
//! after a successful fetch. Two implementations are provided: an
//! in-process [`MemoryCache`] and a table-backed [`DuckDbCache`].

use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use chrono::{NaiveDate, NaiveTime};
use duckdb::{params, Connection as DuckDbConnection};
use log::debug;

use crate::error::Result;
use crate::models::{DateRange, RawPricePoint};

// ---------------------------------------------------------------------------
// CacheKey
// ---------------------------------------------------------------------------

/// Identifies the rows of one upstream request.
///
/// Two ranges share a key only when they cover the same window with the
/// same upstream truncation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    /// First day of the range.
    pub date: NaiveDate,
    /// Days between the first and last day of the range.
    pub day_offset: i64,
    /// Wall-clock start on `date`.
    pub start_time: NaiveTime,
    /// Wall-clock end on the last day.
    pub end_time: NaiveTime,
    /// Upstream truncation (`hour` or `month`).
    pub time_trunc: String,
}

impl CacheKey {
    /// Key for whole days, `00:00` on `date` through `23:59` on the last day.
    pub fn new(date: NaiveDate, day_offset: i64, time_trunc: impl Into<String>) -> Self {
        Self {
            date,
            day_offset,
            start_time: NaiveTime::MIN,
            end_time: NaiveTime::from_hms_opt(23, 59, 0).unwrap_or(NaiveTime::MIN),
            time_trunc: time_trunc.into(),
        }
    }

    /// Same days, narrowed to `start_time`..`end_time`.
    pub fn with_times(mut self, start_time: NaiveTime, end_time: NaiveTime) -> Self {
        self.start_time = start_time;
        self.end_time = end_time;
        self
    }

    /// Key for the rows `range` would fetch.
    ///
    /// Hour and day views of the same window share rows.
    pub fn for_range(range: &DateRange) -> Self {
        Self::new(
            range.start().date(),
            range.span_days(),
            range.granularity().time_trunc(),
        )
        .with_times(range.start().time(), range.end().time())
    }
}

// ---------------------------------------------------------------------------
// PriceCache
// ---------------------------------------------------------------------------

/// Key-value store for upstream rows.
///
/// `get` returns `None` on a miss. Implementations own their consistency;
/// the pipeline treats each call as atomic.
pub trait PriceCache: Send {
    fn get(&self, key: &CacheKey) -> Result<Option<Vec<RawPricePoint>>>;

    fn put(&self, key: &CacheKey, rows: &[RawPricePoint]) -> Result<()>;
}

// ---------------------------------------------------------------------------
// MemoryCache
// ---------------------------------------------------------------------------

/// Process-local cache, dropped with the SDK.
#[derive(Debug, Default)]
pub struct MemoryCache {
    rows: RefCell<HashMap<CacheKey, Vec<RawPricePoint>>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.borrow().is_empty()
    }
}

impl PriceCache for MemoryCache {
    fn get(&self, key: &CacheKey) -> Result<Option<Vec<RawPricePoint>>> {
        Ok(self.rows.borrow().get(key).cloned())
    }

    fn put(&self, key: &CacheKey, rows: &[RawPricePoint]) -> Result<()> {
        self.rows.borrow_mut().insert(key.clone(), rows.to_vec());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// DuckDbCache
// ---------------------------------------------------------------------------

const CREATE_TABLE: &str = "\
    CREATE TABLE IF NOT EXISTS price_cache (\
        cache_date VARCHAR NOT NULL, \
        day_offset BIGINT NOT NULL, \
        start_time VARCHAR NOT NULL, \
        end_time VARCHAR NOT NULL, \
        time_trunc VARCHAR NOT NULL, \
        position BIGINT NOT NULL, \
        value DOUBLE NOT NULL, \
        datetime VARCHAR NOT NULL, \
        geo_name VARCHAR\
    )";

/// Rows stored in a single DuckDB table, one row per price point.
pub struct DuckDbCache {
    conn: DuckDbConnection,
}

impl DuckDbCache {
    /// Open (or create) a file-backed cache at `path`.
    ///
    /// Creates the parent directory if it does not exist.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        Self::init(DuckDbConnection::open(path)?)
    }

    /// Open a cache that lives only as long as this value.
    pub fn open_in_memory() -> Result<Self> {
        Self::init(DuckDbConnection::open_in_memory()?)
    }

    fn init(conn: DuckDbConnection) -> Result<Self> {
        conn.execute_batch(CREATE_TABLE)?;
        Ok(Self { conn })
    }

    /// Number of cached keys.
    pub fn key_count(&self) -> Result<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM (\
                SELECT DISTINCT cache_date, day_offset, start_time, end_time, time_trunc \
                FROM price_cache\
            )",
            [],
            |row| row.get(0),
        )?;
        Ok(count.max(0) as usize)
    }

    /// Remove every cached row.
    pub fn clear(&self) -> Result<()> {
        self.conn.execute_batch("DELETE FROM price_cache")?;
        Ok(())
    }

    /// Access the underlying DuckDB connection for advanced usage.
    pub fn raw(&self) -> &DuckDbConnection {
        &self.conn
    }

    fn replace_rows(&self, key: &CacheKey, rows: &[RawPricePoint]) -> Result<()> {
        let (date, start, end) = key_columns(key);
        self.conn.execute(
            &format!("DELETE FROM price_cache WHERE {}", KEY_FILTER),
            params![date, key.day_offset, start, end, key.time_trunc],
        )?;

        let mut stmt = self.conn.prepare(
            "INSERT INTO price_cache \
             (cache_date, day_offset, start_time, end_time, time_trunc, \
              position, value, datetime, geo_name) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )?;
        for (position, row) in rows.iter().enumerate() {
            stmt.execute(params![
                date,
                key.day_offset,
                start,
                end,
                key.time_trunc,
                position as i64,
                row.value,
                row.datetime,
                row.geo_name,
            ])?;
        }
        Ok(())
    }
}

const KEY_FILTER: &str = "cache_date = ? AND day_offset = ? AND start_time = ? \
                          AND end_time = ? AND time_trunc = ?";

fn key_columns(key: &CacheKey) -> (String, String, String) {
    (
        key.date.to_string(),
        key.start_time.format("%H:%M").to_string(),
        key.end_time.format("%H:%M").to_string(),
    )
}

impl PriceCache for DuckDbCache {
    fn get(&self, key: &CacheKey) -> Result<Option<Vec<RawPricePoint>>> {
        let (date, start, end) = key_columns(key);
        let mut stmt = self.conn.prepare(&format!(
            "SELECT value, datetime, geo_name FROM price_cache WHERE {} ORDER BY position",
            KEY_FILTER
        ))?;
        let rows = stmt
            .query_map(
                params![date, key.day_offset, start, end, key.time_trunc],
                |row| {
                    Ok(RawPricePoint {
                        value: row.get(0)?,
                        datetime: row.get(1)?,
                        geo_name: row.get(2)?,
                    })
                },
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        if rows.is_empty() {
            Ok(None)
        } else {
            Ok(Some(rows))
        }
    }

    fn put(&self, key: &CacheKey, rows: &[RawPricePoint]) -> Result<()> {
        self.conn.execute_batch("BEGIN TRANSACTION")?;
        let written = self
            .replace_rows(key, rows)
            .and_then(|()| self.conn.execute_batch("COMMIT").map_err(Into::into));
        match written {
            Ok(()) => {
                debug!("Cached {} rows for {:?}", rows.len(), key);
                Ok(())
            }
            Err(e) => {
                // Close the transaction whether the rows or the commit failed.
                let _ = self.conn.execute_batch("ROLLBACK");
                Err(e)
            }
        }
    }
}
