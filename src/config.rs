use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{ReeError, Result};

pub const API_BASE: &str =
    "https://apidatos.ree.es/es/datos/mercados/precios-mercados-tiempo-real";

/// Environment variable holding the bearer token.
pub const TOKEN_ENV: &str = "REE_API_TOKEN";

/// Default HTTP timeout for a single price request.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Geographic zone retained from multi-zone feeds.
pub const DEFAULT_GEO_ZONE: &str = "Peninsula";

/// Timestamp layout of the `start_date` / `end_date` query parameters.
pub const QUERY_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// Weekday abbreviations indexed by days from Sunday.
pub const WEEKDAY_ABBREV: [&str; 7] = ["Dom", "Lun", "Mar", "Mié", "Jue", "Vie", "Sáb"];

/// Month abbreviations indexed by zero-based month.
pub const MONTH_ABBREV: [&str; 12] = [
    "Ene", "Feb", "Mar", "Abr", "May", "Jun", "Jul", "Ago", "Sep", "Oct", "Nov", "Dic",
];

/// Price colour scale, cheapest first.
pub const COLOR_SCALE: [&str; 12] = [
    "#8bc34a", "#9ccc65", "#aed581", "#c5e1a5", "#e6ee9c", "#fff59d", "#ffe082", "#ffcc80",
    "#ffb74d", "#ffa726", "#ff9800", "#fb8c00",
];

/// Connection settings for the upstream price endpoint.
#[derive(Clone)]
pub struct Config {
    pub api_base_url: String,
    pub token: String,
    pub timeout: Duration,
}

impl Config {
    /// Create a config for the public endpoint with the given token.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            api_base_url: API_BASE.to_string(),
            token: token.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Build a config from `REE_API_TOKEN`.
    pub fn from_env() -> Result<Self> {
        token_from_env()
            .map(Self::new)
            .ok_or_else(|| ReeError::InvalidArgument(format!("{} is not set", TOKEN_ENV)))
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("api_base_url", &self.api_base_url)
            .field("token", &"<redacted>")
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Read the bearer token from the environment, ignoring blank values.
pub fn token_from_env() -> Option<String> {
    std::env::var(TOKEN_ENV)
        .ok()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

pub fn default_cache_path() -> PathBuf {
    if let Some(cache) = dirs::cache_dir() {
        cache.join("ree-sdk").join("prices.duckdb")
    } else {
        PathBuf::from(".ree-sdk-cache").join("prices.duckdb")
    }
}
