use std::ops::RangeInclusive;
use std::path::Path;
use std::time::Duration;

use secrecy::SecretString;
use url::Url;

use crate::Result;
use crate::store::StoreClient;

mod defaults;
mod env;
mod raw;
mod serde;

pub(crate) use self::serde::DurationString;

const LIST_LIMIT_BOUNDS: RangeInclusive<u32> = 1..=500;

/// Validated application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// REST root of the hosted backend (e.g. `https://<project>.supabase.co/rest/v1`).
    pub base_url: Url,
    pub api_key: SecretString,
    /// Allow plain-HTTP backends; meant for local development only.
    pub insecure_http: bool,
    /// Default row limit applied by callers when listing collections.
    pub limit: u32,
    pub http_connect_timeout: Duration,
    pub http_request_timeout: Duration,
}

impl Config {
    /// Load configuration from a TOML file and the environment.
    ///
    /// The file is optional; `MEDREF`-prefixed variables and the explicit
    /// override names (`STORE_URL`, `STORE_API_KEY`, ...) win over it.
    ///
    /// # Errors
    ///
    /// Returns an error when the configuration file cannot be read or
    /// parsed, when environment overrides are invalid, or when the resulting
    /// values fail validation.
    pub fn from_env_and_file(path: impl AsRef<Path>) -> Result<Self> {
        let mut raw = raw::load(path)?;
        raw.apply_env_overrides()?;
        raw.validate_and_build()
    }

    /// Build a [`StoreClient`] wired with this configuration.
    ///
    /// # Errors
    ///
    /// Propagates client construction failures (URL scheme, API key header,
    /// HTTP client build).
    pub fn store_client(&self) -> Result<StoreClient> {
        StoreClient::new(
            self.base_url.clone(),
            self.api_key.clone(),
            self.http_request_timeout,
            self.http_connect_timeout,
            self.insecure_http,
        )
    }
}
