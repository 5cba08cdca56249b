//! Summary tests: extremes, tie-breaks, current price, colour buckets.

mod common;

use chrono::{TimeZone, Utc};
use ree_sdk::summary::{summarize, summarize_at_hour};
use ree_sdk::{CurrentHourPolicy, HourClock, Palette, ReeError, Series, Summary};

// ---------------------------------------------------------------------------
// Extremes
// ---------------------------------------------------------------------------

#[test]
fn ties_resolve_to_first_occurrence() {
    let series = common::series_of(&[1.0, 2.0, 2.0, 0.5]);

    let summary = summarize_at_hour(Some(&series), 0, 0).unwrap();
    assert_eq!(summary.max.index, 1);
    assert_eq!(summary.max.point.value_eur_per_kwh, 2.0);
    assert_eq!(summary.min.index, 3);
    assert_eq!(summary.min.point.value_eur_per_kwh, 0.5);
}

#[test]
fn min_tie_also_keeps_first() {
    let series = common::series_of(&[0.3, 0.1, 0.2, 0.1]);

    let summary = summarize_at_hour(Some(&series), 0, 0).unwrap();
    assert_eq!(summary.min.index, 1);
    assert_eq!(summary.max.index, 0);
}

#[test]
fn every_point_lies_between_min_and_max() {
    let values = [0.121, 0.098, 0.154, 0.201, 0.087, 0.133, 0.176, 0.099];
    let series = common::series_of(&values);

    let summary = summarize_at_hour(Some(&series), 3, 0).unwrap();
    for point in &series {
        assert!(summary.min.point.value_eur_per_kwh <= point.value_eur_per_kwh);
        assert!(point.value_eur_per_kwh <= summary.max.point.value_eur_per_kwh);
    }
    assert_eq!(summary.max.index, 3);
    assert_eq!(summary.min.index, 4);
}

#[test]
fn two_point_example() {
    let body = common::ree_body(&[(100000.0, "2024-01-01T00:00"), (50000.0, "2024-01-01T01:00")]);
    let series = ree_sdk::normalizer::normalize(body.as_bytes(), ree_sdk::Granularity::Hour);

    let summary = summarize_at_hour(series.as_ref(), 0, 0).unwrap();
    assert_eq!(summary.max.index, 0);
    assert_eq!(summary.max.point.value_eur_per_kwh, 100.0);
    assert_eq!(summary.min.index, 1);
    assert_eq!(summary.min.point.value_eur_per_kwh, 50.0);
    assert_eq!(summary.max.point.label, "00h");
}

// ---------------------------------------------------------------------------
// Missing and empty input
// ---------------------------------------------------------------------------

#[test]
fn missing_series_gives_none() {
    assert!(summarize_at_hour(None, 12, 0).is_none());
    assert!(summarize(None, &CurrentHourPolicy::default(), Utc::now()).is_none());
}

#[test]
fn empty_series_gives_none() {
    let empty = Series::default();
    assert!(summarize_at_hour(Some(&empty), 12, 0).is_none());
    assert!(matches!(Summary::compute(&empty, 0), Err(ReeError::EmptySeries)));
}

// ---------------------------------------------------------------------------
// Current price
// ---------------------------------------------------------------------------

#[test]
fn current_follows_hour_of_day() {
    let series = common::series_of(&[0.1; 24]);

    let summary = summarize_at_hour(Some(&series), 13, 0).unwrap();
    assert_eq!(summary.current.index, 13);
    assert_eq!(summary.current.point.label, "13h");
}

#[test]
fn current_falls_back_to_last_point() {
    let series = common::series_of(&[0.1; 10]);

    let summary = summarize_at_hour(Some(&series), 15, 0).unwrap();
    assert_eq!(summary.current.index, 9);
}

#[test]
fn utc_plus_one_policy_advances_one_hour() {
    let series = common::series_of(&[0.1; 24]);
    let policy = CurrentHourPolicy::new(HourClock::Utc, 1);
    let now = Utc.with_ymd_and_hms(2024, 1, 1, 10, 30, 0).unwrap();

    let summary = summarize(Some(&series), &policy, now).unwrap();
    assert_eq!(summary.current.index, 11);
}

#[test]
fn utc_plus_one_at_last_hour_clamps() {
    let series = common::series_of(&[0.1; 24]);
    let policy = CurrentHourPolicy::new(HourClock::Utc, 1);
    let now = Utc.with_ymd_and_hms(2024, 1, 1, 23, 5, 0).unwrap();

    let summary = summarize(Some(&series), &policy, now).unwrap();
    assert_eq!(summary.current.index, 23);
}

#[test]
fn negative_offset_clamps_to_first_point() {
    let series = common::series_of(&[0.1; 24]);

    let summary = summarize_at_hour(Some(&series), 0, -3).unwrap();
    assert_eq!(summary.current.index, 0);
}

// ---------------------------------------------------------------------------
// Colour buckets
// ---------------------------------------------------------------------------

#[test]
fn flat_series_maps_every_point_to_bucket_zero() {
    let series = common::series_of(&[3.0, 3.0, 3.0]);

    let summary = summarize_at_hour(Some(&series), 0, 0).unwrap();
    assert!(summary.is_flat());
    for point in &series {
        assert_eq!(summary.color_bucket(point, 12), 0);
    }
}

#[test]
fn buckets_span_the_palette() {
    let series = common::series_of(&[1.0, 6.5, 12.0]);
    let palette = Palette::default();

    let summary = summarize_at_hour(Some(&series), 0, 0).unwrap();
    assert_eq!(summary.color_bucket(&series.points[0], palette.len()), 0);
    assert_eq!(summary.color_bucket(&series.points[1], palette.len()), 5);
    assert_eq!(summary.color_bucket(&series.points[2], palette.len()), 11);
    assert_eq!(summary.color_for(&summary.min.point, &palette), "#8bc34a");
    assert_eq!(summary.color_for(&summary.max.point, &palette), "#fb8c00");
}

#[test]
fn custom_palette_is_used() {
    let series = common::series_of(&[1.0, 2.0]);
    let palette = Palette::new(["green", "red"]).unwrap();

    let summary = summarize_at_hour(Some(&series), 0, 0).unwrap();
    assert_eq!(summary.color_for(&series.points[0], &palette), "green");
    assert_eq!(summary.color_for(&series.points[1], &palette), "red");
}

#[test]
fn empty_palette_is_rejected() {
    let colors: [&str; 0] = [];
    assert!(matches!(Palette::new(colors), Err(ReeError::InvalidArgument(_))));
}
