//! Single-request HTTP fetcher for the upstream price endpoint.
//!
//! One GET per range, bearer token in the `Authorization` header, bounded
//! by the configured timeout. No retries.

use log::{debug, info};
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::Url;

use crate::config::Config;
use crate::error::{ReeError, Result};
use crate::models::DateRange;

/// Issues price requests against the configured endpoint.
pub struct PriceFetcher {
    config: Config,
    client: Client,
}

impl PriceFetcher {
    /// Create a fetcher with a client bound to `config.timeout`.
    pub fn new(config: Config) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()?;

        Ok(Self { config, client })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Full request URL for `range`, with encoded query parameters.
    pub fn request_url(&self, range: &DateRange) -> Result<Url> {
        Url::parse_with_params(
            &self.config.api_base_url,
            &[
                ("start_date", range.start_param()),
                ("end_date", range.end_param()),
                ("time_trunc", range.granularity().time_trunc().to_string()),
            ],
        )
        .map_err(|e| {
            ReeError::InvalidArgument(format!(
                "Bad API base URL '{}': {}",
                self.config.api_base_url, e
            ))
        })
    }

    /// Fetch the raw response body for `range`.
    ///
    /// Network failures and non-2xx statuses are returned as
    /// [`ReeError::Http`].
    pub fn fetch(&self, range: &DateRange) -> Result<Vec<u8>> {
        let url = self.request_url(range)?;
        info!("Fetching prices {}", range);
        debug!("GET {}", url);

        let resp = self
            .client
            .get(url)
            .bearer_auth(&self.config.token)
            .send()?
            .error_for_status()?;
        let bytes = resp.bytes()?;

        debug!("Received {} bytes", bytes.len());
        Ok(bytes.to_vec())
    }
}
