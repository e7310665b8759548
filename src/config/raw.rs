use std::path::Path;
use std::time::Duration;

use secrecy::SecretString;
use serde::Deserialize;
use serde_with::serde_as;
use url::Url;

use crate::Result;
use crate::error::ConfigError;

use super::defaults::{default_connect_timeout, default_http_timeout, default_limit};
use super::env::{env_duration, env_parse, env_string};
use super::{Config, DurationString, LIST_LIMIT_BOUNDS};

pub(super) fn load(path: impl AsRef<Path>) -> std::result::Result<RawConfig, ConfigError> {
    let mut builder = ::config::Config::builder();
    let path = path.as_ref();
    builder = builder.add_source(::config::File::from(path).required(false));
    builder = builder.add_source(
        ::config::Environment::with_prefix("MEDREF")
            .separator("__")
            .try_parsing(true),
    );

    builder
        .build()
        .map_err(|err| ConfigError::Other(err.to_string()))?
        .try_deserialize()
        .map_err(|err| ConfigError::Parse(err.to_string()))
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct RawConfig {
    #[serde(default)]
    pub(super) store: RawStore,
    #[serde(default)]
    pub(super) app: RawApp,
}

#[serde_as]
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(super) struct RawStore {
    pub(super) url: Option<String>,
    pub(super) api_key: Option<String>,
    pub(super) insecure_http: bool,
    #[serde_as(as = "Option<DurationString>")]
    pub(super) http_timeout: Option<Duration>,
    #[serde_as(as = "Option<DurationString>")]
    pub(super) http_connect_timeout: Option<Duration>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub(super) struct RawApp {
    pub(super) limit: u32,
}

impl Default for RawApp {
    fn default() -> Self {
        Self {
            limit: default_limit(),
        }
    }
}

impl RawConfig {
    pub(super) fn apply_env_overrides(&mut self) -> std::result::Result<(), ConfigError> {
        if let Some(url) = env_string("STORE_URL")? {
            self.store.url = Some(url);
        }
        if let Some(key) = env_string("STORE_API_KEY")? {
            self.store.api_key = Some(key);
        }
        if let Some(insecure) = env_parse::<bool>("STORE_INSECURE_HTTP")? {
            self.store.insecure_http = insecure;
        }
        if let Some(timeout) = env_duration("HTTP_TIMEOUT")? {
            self.store.http_timeout = Some(timeout);
        }
        if let Some(timeout) = env_duration("HTTP_CONNECT_TIMEOUT")? {
            self.store.http_connect_timeout = Some(timeout);
        }
        if let Some(limit) = env_parse::<u32>("LIMIT")? {
            self.app.limit = limit;
        }
        Ok(())
    }

    pub(super) fn validate_and_build(self) -> Result<Config> {
        let url = self
            .store
            .url
            .filter(|u| !u.trim().is_empty())
            .ok_or(ConfigError::MissingField { field: "store.url" })?;
        let base_url = Url::parse(url.trim()).map_err(|err| ConfigError::InvalidField {
            field: "store.url",
            message: err.to_string(),
        })?;

        let api_key = self
            .store
            .api_key
            .filter(|k| !k.trim().is_empty())
            .ok_or(ConfigError::MissingField {
                field: "store.api_key",
            })?;

        if !LIST_LIMIT_BOUNDS.contains(&self.app.limit) {
            return Err(ConfigError::InvalidField {
                field: "app.limit",
                message: format!(
                    "value must be between {} and {}",
                    LIST_LIMIT_BOUNDS.start(),
                    LIST_LIMIT_BOUNDS.end()
                ),
            }
            .into());
        }

        Ok(Config {
            base_url,
            api_key: SecretString::from(api_key),
            insecure_http: self.store.insecure_http,
            limit: self.app.limit,
            http_request_timeout: self.store.http_timeout.unwrap_or(default_http_timeout()),
            http_connect_timeout: self
                .store
                .http_connect_timeout
                .unwrap_or(default_connect_timeout()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{RawConfig, RawStore};
    use crate::error::{ConfigError, Error};

    fn raw_with_store(store: RawStore) -> RawConfig {
        RawConfig {
            store,
            ..RawConfig::default()
        }
    }

    fn build_err(raw: RawConfig) -> Error {
        match raw.validate_and_build() {
            Ok(_) => panic!("expected validation failure"),
            Err(err) => err,
        }
    }

    #[test]
    fn validate_requires_url_and_key() {
        let err = build_err(raw_with_store(RawStore::default()));
        assert!(matches!(
            err,
            Error::Config(ConfigError::MissingField { field: "store.url" })
        ));

        let err = build_err(raw_with_store(RawStore {
            url: Some("https://example.test/rest/v1".to_string()),
            ..RawStore::default()
        }));
        assert!(matches!(
            err,
            Error::Config(ConfigError::MissingField {
                field: "store.api_key"
            })
        ));
    }

    #[test]
    fn validate_applies_defaults() {
        let config = match raw_with_store(RawStore {
            url: Some("https://example.test/rest/v1".to_string()),
            api_key: Some("anon-key".to_string()),
            ..RawStore::default()
        })
        .validate_and_build()
        {
            Ok(config) => config,
            Err(err) => panic!("expected valid config: {err}"),
        };
        assert_eq!(config.limit, 20);
        assert_eq!(config.http_request_timeout.as_secs(), 10);
        assert_eq!(config.http_connect_timeout.as_secs(), 5);
        assert!(!config.insecure_http);
    }

    #[test]
    fn validate_rejects_out_of_bounds_limit() {
        let mut raw = raw_with_store(RawStore {
            url: Some("https://example.test/rest/v1".to_string()),
            api_key: Some("anon-key".to_string()),
            ..RawStore::default()
        });
        raw.app.limit = 0;
        let err = build_err(raw);
        assert!(matches!(
            err,
            Error::Config(ConfigError::InvalidField {
                field: "app.limit",
                ..
            })
        ));
    }

    #[test]
    fn validate_rejects_malformed_url() {
        let err = build_err(raw_with_store(RawStore {
            url: Some("not a url".to_string()),
            api_key: Some("anon-key".to_string()),
            ..RawStore::default()
        }));
        assert!(matches!(
            err,
            Error::Config(ConfigError::InvalidField {
                field: "store.url",
                ..
            })
        ));
    }
}
