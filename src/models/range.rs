use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Days, Months, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::config::QUERY_DATE_FORMAT;
use crate::error::{ReeError, Result};

// ---------------------------------------------------------------------------
// Granularity
// ---------------------------------------------------------------------------

/// Time bucketing of a requested range.
///
/// Drives both the upstream `time_trunc` parameter and the label format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Hour,
    Day,
    Month,
}

impl Granularity {
    /// Upstream truncation: `month` for year views, `hour` otherwise.
    pub fn time_trunc(self) -> &'static str {
        match self {
            Granularity::Month => "month",
            Granularity::Hour | Granularity::Day => "hour",
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Granularity::Hour => write!(f, "hour"),
            Granularity::Day => write!(f, "day"),
            Granularity::Month => write!(f, "month"),
        }
    }
}

impl FromStr for Granularity {
    type Err = ReeError;

    /// Accepts `hour|day|month` and the range names `horas|dias|meses`.
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "hour" | "horas" => Ok(Granularity::Hour),
            "day" | "dias" | "días" => Ok(Granularity::Day),
            "month" | "meses" => Ok(Granularity::Month),
            other => Err(ReeError::InvalidArgument(format!(
                "Unknown granularity: {}",
                other
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// DateRange
// ---------------------------------------------------------------------------

/// A requested price window. `start <= end` always holds, including for
/// deserialized values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "DateRangeFields")]
pub struct DateRange {
    start: NaiveDateTime,
    end: NaiveDateTime,
    granularity: Granularity,
}

/// Wire form of [`DateRange`], checked through [`DateRange::new`].
#[derive(Deserialize)]
struct DateRangeFields {
    start: NaiveDateTime,
    end: NaiveDateTime,
    granularity: Granularity,
}

impl TryFrom<DateRangeFields> for DateRange {
    type Error = ReeError;

    fn try_from(fields: DateRangeFields) -> Result<Self> {
        DateRange::new(fields.start, fields.end, fields.granularity)
    }
}

impl DateRange {
    /// Create a range, rejecting `start > end`.
    pub fn new(start: NaiveDateTime, end: NaiveDateTime, granularity: Granularity) -> Result<Self> {
        if start > end {
            return Err(ReeError::InvalidArgument(format!(
                "Range start {} is after end {}",
                start, end
            )));
        }
        Ok(Self {
            start,
            end,
            granularity,
        })
    }

    /// A single calendar day, `00:00` through `23:59`, hourly.
    pub fn day(date: NaiveDate) -> Self {
        Self {
            start: start_of(date),
            end: end_of(date),
            granularity: Granularity::Hour,
        }
    }

    /// The `days` calendar days ending on `end` (inclusive), daily.
    pub fn last_days(end: NaiveDate, days: u64) -> Result<Self> {
        if days == 0 {
            return Err(ReeError::InvalidArgument(
                "A range needs at least one day".into(),
            ));
        }
        let first = end.checked_sub_days(Days::new(days - 1)).ok_or_else(|| {
            ReeError::InvalidArgument(format!("{} days before {} is out of range", days, end))
        })?;
        Self::new(start_of(first), end_of(end), Granularity::Day)
    }

    /// The calendar month containing `date`, daily.
    pub fn month(date: NaiveDate) -> Result<Self> {
        let first = date
            .with_day(1)
            .ok_or_else(|| ReeError::InvalidArgument(format!("No first day for {}", date)))?;
        let last = first
            .checked_add_months(Months::new(1))
            .and_then(|next| next.pred_opt())
            .ok_or_else(|| ReeError::InvalidArgument(format!("No last day for {}", date)))?;
        Self::new(start_of(first), end_of(last), Granularity::Day)
    }

    /// The calendar year containing `date`, monthly.
    pub fn year(date: NaiveDate) -> Result<Self> {
        let first = NaiveDate::from_ymd_opt(date.year(), 1, 1);
        let last = NaiveDate::from_ymd_opt(date.year(), 12, 31);
        match (first, last) {
            (Some(first), Some(last)) => {
                Self::new(start_of(first), end_of(last), Granularity::Month)
            }
            _ => Err(ReeError::InvalidArgument(format!(
                "Year of {} is out of range",
                date
            ))),
        }
    }

    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    pub fn end(&self) -> NaiveDateTime {
        self.end
    }

    pub fn granularity(&self) -> Granularity {
        self.granularity
    }

    /// Same window with a different label granularity.
    pub fn with_granularity(mut self, granularity: Granularity) -> Self {
        self.granularity = granularity;
        self
    }

    /// Whole days between the start and end dates.
    pub fn span_days(&self) -> i64 {
        (self.end.date() - self.start.date()).num_days()
    }

    /// `start_date` query value.
    pub fn start_param(&self) -> String {
        self.start.format(QUERY_DATE_FORMAT).to_string()
    }

    /// `end_date` query value.
    pub fn end_param(&self) -> String {
        self.end.format(QUERY_DATE_FORMAT).to_string()
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}..{} ({})",
            self.start_param(),
            self.end_param(),
            self.granularity
        )
    }
}

fn start_of(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}

fn end_of(date: NaiveDate) -> NaiveDateTime {
    // 23:59 is always a valid wall-clock time.
    date.and_hms_opt(23, 59, 0).unwrap_or_else(|| date.and_time(NaiveTime::MIN))
}
