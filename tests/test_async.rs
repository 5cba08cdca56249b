//! Async wrapper tests (requires the `async` feature).

#![cfg(feature = "async")]

mod common;

use ree_sdk::{AsyncReeSdk, DateRange, MemoryCache, ReeSdk};

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap()
}

#[test]
fn async_series_matches_blocking_pipeline() {
    let server = common::serve(200, &common::ree_day_body("2024-01-01", 40000.0), 1);
    let base_url = server.base_url.clone();

    // The SDK is handed back so its blocking client drops outside the runtime.
    let (_sdk, series) = runtime().block_on(async move {
        let sdk = AsyncReeSdk::builder()
            .api_base_url(base_url)
            .token("secret-token")
            .build()
            .await
            .unwrap();
        let series = sdk
            .series(DateRange::day(common::date(2024, 1, 1)))
            .await
            .unwrap();
        (sdk, series)
    });

    let series = series.unwrap();
    assert_eq!(series.len(), 24);
    assert_eq!(series.points[0].value_eur_per_kwh, 40.0);
}

#[test]
fn async_run_reports_no_data_as_none() {
    let sdk = ReeSdk::builder()
        .api_base_url(common::dead_url())
        .token("secret-token")
        .build()
        .unwrap();
    let sdk = AsyncReeSdk::from_sdk(sdk);

    let summary = runtime().block_on(async {
        sdk.summary(DateRange::day(common::date(2024, 1, 1)))
            .await
            .unwrap()
    });
    assert!(summary.is_none());
}

#[test]
fn async_builder_accepts_custom_cache() {
    let server = common::serve(200, &common::ree_day_body("2024-01-01", 40000.0), 1);
    let base_url = server.base_url.clone();
    let range = DateRange::day(common::date(2024, 1, 1));

    let (_sdk, first, second) = runtime().block_on(async move {
        let sdk = AsyncReeSdk::builder()
            .api_base_url(base_url)
            .token("secret-token")
            .cache(Box::new(MemoryCache::new()))
            .build()
            .await
            .unwrap();
        let first = sdk.series(range).await.unwrap();
        let second = sdk.series(range).await.unwrap();
        (sdk, first, second)
    });

    assert_eq!(first, second);
    server.next_request();
    assert!(server.no_more_requests());
}
