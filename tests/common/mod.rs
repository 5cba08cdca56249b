//! Shared test fixtures for the REE SDK integration tests.
//!
//! Provides upstream-shaped JSON bodies, hand-built series, and a tiny
//! one-thread HTTP stub so the real fetch path runs without network.

#![allow(dead_code)]

use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::mpsc::{self, Receiver};
use std::thread;
use std::time::Duration;

use chrono::{NaiveDate, NaiveDateTime};
use ree_sdk::{Granularity, PricePoint, RawPricePoint, Series};
use serde_json::{json, Value};

// ---------------------------------------------------------------------------
// Upstream bodies
// ---------------------------------------------------------------------------

/// Body in the upstream shape: `included[0].attributes.values`.
pub fn ree_body(values: &[(f64, &str)]) -> String {
    let items: Vec<Value> = values
        .iter()
        .map(|(value, datetime)| json!({"value": value, "percentage": 1, "datetime": datetime}))
        .collect();
    json!({
        "data": {"type": "Precios mercado peninsular en tiempo real", "id": "mer13"},
        "included": [{
            "type": "PVPC (\u{20ac}/MWh)",
            "id": "1001",
            "attributes": {"title": "PVPC", "values": items}
        }]
    })
    .to_string()
}

/// Twenty-four hourly points for `date`, priced `base + 1000 * hour` €/MWh.
pub fn ree_day_body(date: &str, base: f64) -> String {
    let datetimes: Vec<String> = (0..24)
        .map(|h| format!("{}T{:02}:00:00.000+01:00", date, h))
        .collect();
    let values: Vec<(f64, &str)> = datetimes
        .iter()
        .enumerate()
        .map(|(h, dt)| (base + 1000.0 * h as f64, dt.as_str()))
        .collect();
    ree_body(&values)
}

pub fn raw(value: f64, datetime: &str) -> RawPricePoint {
    RawPricePoint {
        value,
        datetime: datetime.to_string(),
        geo_name: None,
    }
}

pub fn dt(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M").unwrap()
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Hourly series on 2024-01-01 with the given €/kWh values.
pub fn series_of(values: &[f64]) -> Series {
    let points = values
        .iter()
        .enumerate()
        .map(|(h, v)| {
            let datetime = format!("2024-01-01T{:02}:00", h);
            PricePoint {
                timestamp: dt(&datetime),
                value_eur_per_kwh: *v,
                label: ree_sdk::normalizer::label_for(dt(&datetime), Granularity::Hour),
                raw: raw(v * 1000.0, &datetime),
            }
        })
        .collect();
    Series::new(points)
}

// ---------------------------------------------------------------------------
// HTTP stub
// ---------------------------------------------------------------------------

/// One-thread HTTP server answering a fixed number of requests with the
/// same status and body. Each raw request head is forwarded to `requests`.
pub struct StubServer {
    pub base_url: String,
    requests: Receiver<String>,
}

impl StubServer {
    /// Wait for the next captured request head.
    pub fn next_request(&self) -> String {
        self.requests
            .recv_timeout(Duration::from_secs(10))
            .expect("stub server saw no request")
    }

    /// True if no further request has been captured.
    pub fn no_more_requests(&self) -> bool {
        self.requests.try_recv().is_err()
    }
}

pub fn serve(status: u16, body: &str, max_requests: usize) -> StubServer {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");

    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = mpsc::channel();
    let body = body.to_string();

    thread::spawn(move || {
        for _ in 0..max_requests {
            let Ok((mut stream, _)) = listener.accept() else {
                return;
            };
            let mut head = Vec::new();
            let mut buf = [0u8; 4096];
            loop {
                match stream.read(&mut buf) {
                    Ok(0) | Err(_) => break,
                    Ok(n) => {
                        head.extend_from_slice(&buf[..n]);
                        if head.windows(4).any(|w| w == b"\r\n\r\n") {
                            break;
                        }
                    }
                }
            }
            let _ = tx.send(String::from_utf8_lossy(&head).to_string());

            let reason = if status < 400 { "OK" } else { "Error" };
            let response = format!(
                "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                reason,
                body.len(),
                body
            );
            let _ = stream.write_all(response.as_bytes());
            let _ = stream.flush();
        }
    });

    StubServer {
        base_url: format!("http://{}/es/datos/mercados/precios-mercados-tiempo-real", addr),
        requests: rx,
    }
}

/// A URL on a local port nothing listens on.
pub fn dead_url() -> String {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}/precios", addr)
}
