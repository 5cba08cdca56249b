//! Response parsing, unit conversion and label derivation.
//!
//! Turns an upstream JSON body into a [`Series`]. The upstream nesting has
//! changed between API revisions, so the values array is located by a
//! short list of known paths followed by a structural search.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use log::{debug, warn};
use serde_json::Value;

use crate::config::{DEFAULT_GEO_ZONE, MONTH_ABBREV, WEEKDAY_ABBREV};
use crate::error::{ReeError, Result};
use crate::models::{Granularity, PricePoint, RawPricePoint, Series};

/// €/MWh → €/kWh.
const MWH_PER_KWH: f64 = 1000.0;

/// Known locations of the values array, most specific first.
const VALUE_POINTERS: [&str; 2] = ["/included/0/attributes/values", "/data/attributes/values"];

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

// ---------------------------------------------------------------------------
// Public entry points
// ---------------------------------------------------------------------------

/// Parse and normalize a response body, keeping the default geo zone.
///
/// Returns `None` when the body is empty, malformed, or carries no price
/// values; callers treat that as "no data for this range".
pub fn normalize(body: &[u8], granularity: Granularity) -> Option<Series> {
    normalize_in_zone(body, granularity, DEFAULT_GEO_ZONE)
}

/// Like [`normalize`], retaining `geo_zone` from multi-zone feeds.
pub fn normalize_in_zone(body: &[u8], granularity: Granularity, geo_zone: &str) -> Option<Series> {
    match parse_points(body) {
        Ok(rows) => Some(to_series(rows, granularity, geo_zone)),
        Err(e) => {
            warn!("Discarding price response: {}", e);
            None
        }
    }
}

/// Extract the flat list of upstream points from a response body.
///
/// Items without a numeric `value` or a string `datetime` are skipped.
pub fn parse_points(body: &[u8]) -> Result<Vec<RawPricePoint>> {
    if body.iter().all(|b| b.is_ascii_whitespace()) {
        return Err(ReeError::MalformedResponse("empty body".into()));
    }

    let json: Value = serde_json::from_slice(body)?;
    if is_empty_document(&json) {
        return Err(ReeError::MalformedResponse("empty document".into()));
    }

    let items = locate_values(&json)
        .ok_or_else(|| ReeError::MalformedResponse("no price values array".into()))?;

    let mut points = Vec::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        match raw_point(item) {
            Some(point) => points.push(point),
            None => warn!("Skipping price item {}: missing value or datetime", i),
        }
    }
    debug!("Parsed {} of {} price items", points.len(), items.len());
    Ok(points)
}

/// Convert upstream points into a series for `granularity`.
///
/// Points tagged with another geo zone are dropped, as are points whose
/// timestamp cannot be read. Order is preserved.
pub fn to_series(rows: Vec<RawPricePoint>, granularity: Granularity, geo_zone: &str) -> Series {
    let wanted = fold_zone(geo_zone);
    let points = rows
        .into_iter()
        .filter(|raw| {
            raw.geo_name
                .as_deref()
                .map_or(true, |zone| fold_zone(zone) == wanted)
        })
        .filter_map(|raw| {
            let Some(timestamp) = parse_datetime(&raw.datetime) else {
                warn!("Skipping price point with unreadable datetime '{}'", raw.datetime);
                return None;
            };
            Some(PricePoint {
                timestamp,
                value_eur_per_kwh: raw.value / MWH_PER_KWH,
                label: label_for(timestamp, granularity),
                raw,
            })
        })
        .collect();
    Series::new(points)
}

/// Display label for a timestamp.
///
/// - hour: `"07h"`
/// - day: `"Lun 01"`
/// - month: `"Ene"`
pub fn label_for(timestamp: NaiveDateTime, granularity: Granularity) -> String {
    match granularity {
        Granularity::Hour => format!("{:02}h", timestamp.hour()),
        Granularity::Day => format!(
            "{} {:02}",
            WEEKDAY_ABBREV[timestamp.weekday().num_days_from_sunday() as usize],
            timestamp.day()
        ),
        Granularity::Month => MONTH_ABBREV[timestamp.month0() as usize].to_string(),
    }
}

/// Read an upstream timestamp as wall-clock time.
///
/// Offsets are accepted and dropped, so `2024-01-01T00:00:00.000+01:00`
/// reads as midnight.
pub fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local());
    }
    if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%dT%H:%M%:z") {
        return Some(dt.naive_local());
    }
    for format in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .map(|d| d.and_time(NaiveTime::MIN))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn is_empty_document(json: &Value) -> bool {
    match json {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

fn locate_values(json: &Value) -> Option<&Vec<Value>> {
    for pointer in VALUE_POINTERS {
        if let Some(Value::Array(items)) = json.pointer(pointer) {
            return Some(items);
        }
    }
    if let Value::Array(items) = json {
        if items.iter().any(is_price_item) {
            return Some(items);
        }
    }
    find_values(json)
}

/// Depth-first search for the first array holding price items, preferring
/// a `values` key at each level.
fn find_values(json: &Value) -> Option<&Vec<Value>> {
    match json {
        Value::Object(map) => {
            if let Some(Value::Array(items)) = map.get("values") {
                if items.iter().any(is_price_item) {
                    return Some(items);
                }
            }
            map.values().find_map(find_values)
        }
        Value::Array(items) if items.iter().any(is_price_item) => Some(items),
        Value::Array(items) => items.iter().find_map(find_values),
        _ => None,
    }
}

fn is_price_item(item: &Value) -> bool {
    item.get("value").is_some() && item.get("datetime").is_some()
}

fn raw_point(item: &Value) -> Option<RawPricePoint> {
    let value = item.get("value").and_then(|v| v.as_f64())?;
    let datetime = item.get("datetime").and_then(|v| v.as_str())?;
    let geo_name = item
        .get("geo_name")
        .and_then(|v| v.as_str())
        .map(|s| s.to_string());
    Some(RawPricePoint {
        value,
        datetime: datetime.to_string(),
        geo_name,
    })
}

/// Case- and accent-insensitive zone key, so `Península` matches `Peninsula`.
fn fold_zone(zone: &str) -> String {
    zone.trim()
        .to_lowercase()
        .chars()
        .map(|c| match c {
            'á' | 'à' => 'a',
            'é' | 'è' => 'e',
            'í' | 'ì' => 'i',
            'ó' | 'ò' => 'o',
            'ú' | 'ù' | 'ü' => 'u',
            other => other,
        })
        .collect()
}
