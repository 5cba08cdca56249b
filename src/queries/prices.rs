//! Calendar helpers over the price pipeline: today, tomorrow, last week,
//! month and year views.

use chrono::{Days, NaiveDate, Utc};

use crate::models::{DateRange, Series};
use crate::summary::Summary;
use crate::ReeSdk;

// ---------------------------------------------------------------------------
// PriceQuery
// ---------------------------------------------------------------------------

/// Price views relative to an anchor date.
///
/// Every method returns `None` when the upstream has no data for the
/// window (e.g. tomorrow's prices before publication).
pub struct PriceQuery<'a> {
    sdk: &'a ReeSdk,
    anchor: NaiveDate,
}

impl<'a> PriceQuery<'a> {
    /// Create a new `PriceQuery` bound to the given SDK and anchor date.
    pub fn new(sdk: &'a ReeSdk, anchor: NaiveDate) -> Self {
        Self { sdk, anchor }
    }

    pub fn anchor(&self) -> NaiveDate {
        self.anchor
    }

    /// Hourly prices for the anchor day.
    pub fn today(&self) -> Option<Series> {
        self.sdk.get_series(&self.today_range())
    }

    /// Hourly prices for the day after the anchor.
    pub fn tomorrow(&self) -> Option<Series> {
        self.sdk.get_series(&self.tomorrow_range()?)
    }

    /// Daily-labelled prices for the seven days ending on the anchor.
    pub fn last_7_days(&self) -> Option<Series> {
        self.sdk.get_series(&DateRange::last_days(self.anchor, 7).ok()?)
    }

    /// Daily-labelled prices for the anchor's month.
    pub fn this_month(&self) -> Option<Series> {
        self.sdk.get_series(&DateRange::month(self.anchor).ok()?)
    }

    /// Monthly prices for the anchor's year.
    pub fn this_year(&self) -> Option<Series> {
        self.sdk.get_series(&DateRange::year(self.anchor).ok()?)
    }

    /// Max, min and current price for the anchor day.
    pub fn summary_today(&self) -> Option<Summary> {
        self.sdk.summary_at(&self.today_range(), Utc::now())
    }

    /// Max, min and current-hour price for the day after the anchor.
    pub fn summary_tomorrow(&self) -> Option<Summary> {
        self.sdk.summary_at(&self.tomorrow_range()?, Utc::now())
    }

    /// Range behind [`today`](Self::today).
    pub fn today_range(&self) -> DateRange {
        DateRange::day(self.anchor)
    }

    /// Range behind [`tomorrow`](Self::tomorrow); `None` past the calendar's end.
    pub fn tomorrow_range(&self) -> Option<DateRange> {
        self.anchor
            .checked_add_days(Days::new(1))
            .map(DateRange::day)
    }
}
