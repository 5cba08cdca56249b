use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// RawPricePoint — one upstream sample, as published
// ---------------------------------------------------------------------------

/// A single upstream sample in €/MWh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawPricePoint {
    pub value: f64,
    pub datetime: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geo_name: Option<String>,
}

// ---------------------------------------------------------------------------
// PricePoint — normalized sample with its display label
// ---------------------------------------------------------------------------

/// A normalized sample in €/kWh.
///
/// Keeps the upstream point alongside the converted value so tooltips can
/// show full precision while axes use `label`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    /// Wall-clock time as published upstream.
    pub timestamp: NaiveDateTime,
    pub value_eur_per_kwh: f64,
    pub label: String,
    pub raw: RawPricePoint,
}

// ---------------------------------------------------------------------------
// Series — chronological sequence of normalized points
// ---------------------------------------------------------------------------

/// Points in upstream order. Labels may repeat.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub points: Vec<PricePoint>,
}

impl Series {
    pub fn new(points: Vec<PricePoint>) -> Self {
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&PricePoint> {
        self.points.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PricePoint> {
        self.points.iter()
    }

    /// Converted values in series order.
    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value_eur_per_kwh).collect()
    }

    /// Labels in series order, repeats included.
    pub fn labels(&self) -> Vec<&str> {
        self.points.iter().map(|p| p.label.as_str()).collect()
    }

    /// Labels for a chart axis: first occurrence of each label, in order.
    pub fn axis_labels(&self) -> Vec<&str> {
        let mut seen = std::collections::HashSet::new();
        self.points
            .iter()
            .map(|p| p.label.as_str())
            .filter(|label| seen.insert(*label))
            .collect()
    }
}

impl<'a> IntoIterator for &'a Series {
    type Item = &'a PricePoint;
    type IntoIter = std::slice::Iter<'a, PricePoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}
