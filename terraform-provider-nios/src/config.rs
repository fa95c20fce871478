//! Provider configuration
//!
//! Values come from the `provider "nios"` block first and fall back to
//! environment variables.

use crate::schema::Diagnostic;
use serde::{Deserialize, Deserializer, Serialize};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_WAPI_VERSION: &str = "2.13.6";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_DELETE_RETRIES: u32 = 10;
pub const DEFAULT_DELETE_RETRY_INTERVAL_SECS: u64 = 3;

pub const ENV_HOST_URL: &str = "NIOS_HOST_URL";
pub const ENV_USERNAME: &str = "NIOS_USERNAME";
pub const ENV_PASSWORD: &str = "NIOS_PASSWORD";
pub const ENV_WAPI_VERSION: &str = "NIOS_WAPI_VERSION";
pub const ENV_INSECURE: &str = "NIOS_INSECURE";
pub const ENV_TIMEOUT: &str = "NIOS_TIMEOUT";

/// Configuration errors
#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("{attribute} must be set in the provider block or via {env}")]
    Missing {
        attribute: &'static str,
        env: &'static str,
    },
    #[error("invalid nios_host_url {0:?}: expected an http or https URL")]
    InvalidUrl(String),
    #[error("invalid wapi_version {0:?}: expected a dotted version such as 2.13.6")]
    InvalidVersion(String),
    #[error("invalid value {value:?} for {attribute}")]
    InvalidValue {
        attribute: &'static str,
        value: String,
    },
    #[error("{attribute} must be between {min} and {max}, got {value}")]
    OutOfRange {
        attribute: &'static str,
        min: u64,
        max: u64,
        value: u64,
    },
}

impl ConfigError {
    fn attribute(&self) -> &'static str {
        match self {
            ConfigError::Missing { attribute, .. } => attribute,
            ConfigError::InvalidUrl(_) => "nios_host_url",
            ConfigError::InvalidVersion(_) => "wapi_version",
            ConfigError::InvalidValue { attribute, .. } => attribute,
            ConfigError::OutOfRange { attribute, .. } => attribute,
        }
    }
}

impl From<ConfigError> for Diagnostic {
    fn from(err: ConfigError) -> Self {
        Diagnostic::error("Invalid provider configuration")
            .with_detail(&err.to_string())
            .with_attribute(vec![err.attribute().to_string()])
    }
}

/// Raw `provider` block as sent by Terraform
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default)]
    pub nios_host_url: Option<String>,
    #[serde(default)]
    pub nios_username: Option<String>,
    #[serde(default)]
    pub nios_password: Option<String>,
    #[serde(default)]
    pub wapi_version: Option<String>,
    #[serde(default)]
    pub insecure: Option<bool>,
    #[serde(default, deserialize_with = "whole_number")]
    pub timeout: Option<u64>,
    #[serde(default, deserialize_with = "whole_number")]
    pub delete_retries: Option<u64>,
    #[serde(default, deserialize_with = "whole_number")]
    pub delete_retry_interval: Option<u64>,
}

/// Terraform encodes every number as a JSON number, which may carry a
/// fractional part even for integral values.
fn whole_number<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<f64> = Option::deserialize(deserializer)?;
    match value {
        None => Ok(None),
        Some(v) if v >= 0.0 && v.fract() == 0.0 => Ok(Some(v as u64)),
        Some(v) => Err(serde::de::Error::custom(format!(
            "expected a non-negative whole number, got {}",
            v
        ))),
    }
}

/// Bounded retry used for deletes rejected while an object is still referenced
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub interval: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: DEFAULT_DELETE_RETRIES,
            interval: Duration::from_secs(DEFAULT_DELETE_RETRY_INTERVAL_SECS),
        }
    }
}

/// Fully resolved configuration used to build the WAPI client
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub host_url: String,
    pub username: String,
    pub password: String,
    pub wapi_version: String,
    pub insecure: bool,
    pub timeout: Duration,
    pub delete_retry: RetryPolicy,
}

impl ClientConfig {
    /// `https://grid-master/wapi/v2.13.6`
    pub fn base_url(&self) -> String {
        format!(
            "{}/wapi/v{}",
            self.host_url.trim_end_matches('/'),
            self.wapi_version
        )
    }
}

impl ProviderConfig {
    /// Resolve against the process environment
    pub fn resolve(&self) -> Result<ClientConfig, ConfigError> {
        self.resolve_with(|key| std::env::var(key).ok())
    }

    /// Resolve against an arbitrary environment lookup
    pub fn resolve_with<F>(&self, env: F) -> Result<ClientConfig, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let pick = |value: &Option<String>, key: &str| -> Option<String> {
            value
                .clone()
                .filter(|v| !v.is_empty())
                .or_else(|| env(key).filter(|v| !v.is_empty()))
        };

        let host_url = pick(&self.nios_host_url, ENV_HOST_URL).ok_or(ConfigError::Missing {
            attribute: "nios_host_url",
            env: ENV_HOST_URL,
        })?;
        validate_host_url(&host_url)?;

        let username = pick(&self.nios_username, ENV_USERNAME).ok_or(ConfigError::Missing {
            attribute: "nios_username",
            env: ENV_USERNAME,
        })?;
        let password = pick(&self.nios_password, ENV_PASSWORD).ok_or(ConfigError::Missing {
            attribute: "nios_password",
            env: ENV_PASSWORD,
        })?;

        let wapi_version = pick(&self.wapi_version, ENV_WAPI_VERSION)
            .unwrap_or_else(|| DEFAULT_WAPI_VERSION.to_string());
        validate_wapi_version(&wapi_version)?;

        let insecure = match self.insecure {
            Some(v) => v,
            None => match env(ENV_INSECURE) {
                Some(raw) => parse_bool("insecure", &raw)?,
                None => false,
            },
        };

        let timeout = match self.timeout {
            Some(v) => v,
            None => match env(ENV_TIMEOUT) {
                Some(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
                    attribute: "timeout",
                    value: raw,
                })?,
                None => DEFAULT_TIMEOUT_SECS,
            },
        };
        check_range("timeout", timeout, 1, 3600)?;

        let attempts = self.delete_retries.unwrap_or(DEFAULT_DELETE_RETRIES as u64);
        check_range("delete_retries", attempts, 1, 100)?;
        let interval = self
            .delete_retry_interval
            .unwrap_or(DEFAULT_DELETE_RETRY_INTERVAL_SECS);
        check_range("delete_retry_interval", interval, 0, 300)?;

        Ok(ClientConfig {
            host_url: host_url.trim_end_matches('/').to_string(),
            username,
            password,
            wapi_version,
            insecure,
            timeout: Duration::from_secs(timeout),
            delete_retry: RetryPolicy {
                attempts: attempts as u32,
                interval: Duration::from_secs(interval),
            },
        })
    }
}

fn validate_host_url(raw: &str) -> Result<(), ConfigError> {
    match reqwest::Url::parse(raw) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.host_str().is_some() => Ok(()),
        _ => Err(ConfigError::InvalidUrl(raw.to_string())),
    }
}

fn validate_wapi_version(raw: &str) -> Result<(), ConfigError> {
    let parts: Vec<&str> = raw.split('.').collect();
    let valid = (2..=4).contains(&parts.len())
        && parts
            .iter()
            .all(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_digit()));
    if valid {
        Ok(())
    } else {
        Err(ConfigError::InvalidVersion(raw.to_string()))
    }
}

fn parse_bool(attribute: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" | "" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            attribute,
            value: raw.to_string(),
        }),
    }
}

fn check_range(attribute: &'static str, value: u64, min: u64, max: u64) -> Result<(), ConfigError> {
    if value < min || value > max {
        return Err(ConfigError::OutOfRange {
            attribute,
            min,
            max,
            value,
        });
    }
    Ok(())
}
