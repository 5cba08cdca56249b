//! Min / max / current price selection and colour bucketing.

use chrono::{DateTime, Local, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::config::COLOR_SCALE;
use crate::error::{ReeError, Result};
use crate::models::{PricePoint, Series};

// ---------------------------------------------------------------------------
// CurrentHourPolicy
// ---------------------------------------------------------------------------

/// Clock whose hour-of-day picks the "current" point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HourClock {
    #[default]
    Local,
    Utc,
}

/// How the "current" point is chosen from an hourly series.
///
/// `index = clamp(hour(clock) + offset_hours, 0, len - 1)`. The default is
/// the plain local hour; `{ clock: Utc, offset_hours: 1 }` approximates
/// peninsular winter time on a UTC host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CurrentHourPolicy {
    pub clock: HourClock,
    pub offset_hours: i32,
}

impl CurrentHourPolicy {
    pub fn new(clock: HourClock, offset_hours: i32) -> Self {
        Self {
            clock,
            offset_hours,
        }
    }

    /// Hour of day for `now` on this policy's clock, before the offset.
    pub fn hour_of(&self, now: DateTime<Utc>) -> u32 {
        match self.clock {
            HourClock::Local => now.with_timezone(&Local).hour(),
            HourClock::Utc => now.hour(),
        }
    }

    /// Series index treated as "now"; `None` for an empty series.
    pub fn index_at(&self, now: DateTime<Utc>, len: usize) -> Option<usize> {
        current_index(self.hour_of(now), self.offset_hours, len)
    }
}

/// Clamp `hour + offset_hours` into `0..len`.
///
/// An hour past the end of a short series falls back to the last point.
pub fn current_index(hour: u32, offset_hours: i32, len: usize) -> Option<usize> {
    if len == 0 {
        return None;
    }
    let wanted = i64::from(hour) + i64::from(offset_hours);
    let last = (len - 1) as i64;
    Some(wanted.clamp(0, last) as usize)
}

// ---------------------------------------------------------------------------
// Palette
// ---------------------------------------------------------------------------

/// Ordered colour scale, cheapest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    colors: Vec<String>,
}

impl Palette {
    /// Create a palette; at least one colour is required.
    pub fn new<S: Into<String>>(colors: impl IntoIterator<Item = S>) -> Result<Self> {
        let colors: Vec<String> = colors.into_iter().map(Into::into).collect();
        if colors.is_empty() {
            return Err(ReeError::InvalidArgument("Palette needs at least one colour".into()));
        }
        Ok(Self { colors })
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Colour at `bucket`, clamped to the last entry.
    pub fn color(&self, bucket: usize) -> &str {
        let i = bucket.min(self.colors.len().saturating_sub(1));
        self.colors.get(i).map(String::as_str).unwrap_or_default()
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            colors: COLOR_SCALE.iter().map(|c| c.to_string()).collect(),
        }
    }
}

/// Linear bucket of `value` within `[min, max]` over `buckets` colours.
///
/// A flat range (`max == min`) maps everything to bucket 0.
pub fn color_bucket(value: f64, min: f64, max: f64, buckets: usize) -> usize {
    if buckets <= 1 {
        return 0;
    }
    let spread = max - min;
    if spread.is_nan() || spread <= 0.0 || !value.is_finite() {
        return 0;
    }
    let last = (buckets - 1) as f64;
    let scaled = ((value - min) / spread * last).floor();
    scaled.clamp(0.0, last) as usize
}

// ---------------------------------------------------------------------------
// Summary
// ---------------------------------------------------------------------------

/// A point together with its position in the series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedPoint {
    pub index: usize,
    pub point: PricePoint,
}

/// Extremes and current price of one series. Computed per request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub max: RankedPoint,
    pub min: RankedPoint,
    pub current: RankedPoint,
}

impl Summary {
    /// Summarize with an explicit current index (clamped into range).
    ///
    /// Ties on max or min resolve to the first occurrence.
    pub fn compute(series: &Series, current: usize) -> Result<Self> {
        let first = series.get(0).ok_or(ReeError::EmptySeries)?;
        let mut max_i = 0;
        let mut min_i = 0;
        let (mut max_v, mut min_v) = (first.value_eur_per_kwh, first.value_eur_per_kwh);
        for (i, p) in series.iter().enumerate().skip(1) {
            if p.value_eur_per_kwh > max_v {
                max_v = p.value_eur_per_kwh;
                max_i = i;
            }
            if p.value_eur_per_kwh < min_v {
                min_v = p.value_eur_per_kwh;
                min_i = i;
            }
        }
        let current = current.min(series.len() - 1);
        Ok(Self {
            max: ranked(series, max_i)?,
            min: ranked(series, min_i)?,
            current: ranked(series, current)?,
        })
    }

    pub fn spread(&self) -> f64 {
        self.max.point.value_eur_per_kwh - self.min.point.value_eur_per_kwh
    }

    /// True when every point has the same price.
    pub fn is_flat(&self) -> bool {
        let spread = self.spread();
        spread.is_nan() || spread <= 0.0
    }

    /// Bucket of `point` over `buckets` colours.
    pub fn color_bucket(&self, point: &PricePoint, buckets: usize) -> usize {
        color_bucket(
            point.value_eur_per_kwh,
            self.min.point.value_eur_per_kwh,
            self.max.point.value_eur_per_kwh,
            buckets,
        )
    }

    /// Colour of `point` on `palette`.
    pub fn color_for<'p>(&self, point: &PricePoint, palette: &'p Palette) -> &'p str {
        palette.color(self.color_bucket(point, palette.len()))
    }
}

fn ranked(series: &Series, index: usize) -> Result<RankedPoint> {
    series
        .get(index)
        .cloned()
        .map(|point| RankedPoint { index, point })
        .ok_or(ReeError::EmptySeries)
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Summarize a series at `now`; `None` for a missing or empty series.
pub fn summarize(
    series: Option<&Series>,
    policy: &CurrentHourPolicy,
    now: DateTime<Utc>,
) -> Option<Summary> {
    let series = series?;
    let current = policy.index_at(now, series.len())?;
    Summary::compute(series, current).ok()
}

/// Summarize with the current hour given directly.
pub fn summarize_at_hour(series: Option<&Series>, hour: u32, offset_hours: i32) -> Option<Summary> {
    let series = series?;
    let current = current_index(hour, offset_hours, series.len())?;
    Summary::compute(series, current).ok()
}
