//! Process configuration.
//!
//! Built once in `main` from CLI flags and the environment, then handed by
//! reference to the gateway and the template store.

use std::path::PathBuf;

use reqwest::header::HeaderValue;
use reqwest::Url;
use thiserror::Error;

/// Environment variable holding the Motion API key.
pub const API_KEY_VAR: &str = "MOTION_API_KEY";

pub const DEFAULT_API_URL: &str = "https://api.usemotion.com/v1";

pub const DEFAULT_TEMPLATES_DIR: &str = "templates";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("MOTION_API_KEY environment variable must be set.")]
    MissingApiKey,
    #[error("MOTION_API_KEY is not a valid HTTP header value.")]
    InvalidApiKey,
    #[error("invalid API URL '{url}': {reason}")]
    InvalidApiUrl { url: String, reason: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: String,
    pub api_url: String,
    pub templates_dir: PathBuf,
}

impl Config {
    /// Resolve configuration from an already-read API key and the CLI flags.
    pub fn resolve(
        api_key: Option<String>,
        api_url: &str,
        templates_dir: PathBuf,
    ) -> Result<Config, ConfigError> {
        let api_key = api_key
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .ok_or(ConfigError::MissingApiKey)?;
        api_key_header(&api_key)?;

        let parsed = Url::parse(api_url).map_err(|e| ConfigError::InvalidApiUrl {
            url: api_url.to_string(),
            reason: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidApiUrl {
                url: api_url.to_string(),
                reason: "scheme must be http or https".into(),
            });
        }

        Ok(Config {
            api_key,
            api_url: api_url.to_string(),
            templates_dir,
        })
    }

    /// The API key as a sensitive header value.
    pub fn api_key_header(&self) -> Result<HeaderValue, ConfigError> {
        api_key_header(&self.api_key)
    }

    /// Read the API key from the process environment.
    pub fn from_env(api_url: &str, templates_dir: PathBuf) -> Result<Config, ConfigError> {
        Config::resolve(std::env::var(API_KEY_VAR).ok(), api_url, templates_dir)
    }
}

fn api_key_header(key: &str) -> Result<HeaderValue, ConfigError> {
    let mut value = HeaderValue::from_str(key).map_err(|_| ConfigError::InvalidApiKey)?;
    value.set_sensitive(true);
    Ok(value)
}
