//! # Runtime Configuration Module
//!
//! Runtime behaviour of the router that is chosen per deployment rather than
//! per route: how leniently records and bodies are converted, the request
//! size limit, and where request ids come from.
//!
//! ## Sources
//!
//! Defaults, overridden by a TOML file ([`RuntimeConfig::load`]), overridden
//! by environment variables ([`RuntimeConfig::with_env_overrides`]).
//!
//! ## Environment Variables
//!
//! ### `ROUTELOOM_CONVERSION_POLICY`
//!
//! `lenient` or `strict`. Default policy for endpoint param conversion.
//!
//! ### `ROUTELOOM_BODY_POLICY`
//!
//! `lenient` or `strict`. Policy of body parsers built with
//! [`JsonBody::from_config`](crate::middleware::JsonBody::from_config).
//!
//! ### `ROUTELOOM_MAX_BODY_BYTES`
//!
//! Requests with a larger body are answered 413 before routing. Accepts
//! decimal (`1048576`) or hexadecimal (`0x100000`). Default: 1 MiB.
//!
//! ### `ROUTELOOM_REQUEST_ID_HEADER`
//!
//! Header carrying an incoming request id. Default: `x-request-id`.
//!
//! ## Example Configuration
//!
//! ```toml
//! body_policy = "strict"
//! max_body_bytes = 65536
//! ```

use crate::record::ConversionPolicy;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default request body limit: 1 MiB.
pub const DEFAULT_MAX_BODY_BYTES: usize = 0x10_0000;
/// Default request id header.
pub const DEFAULT_REQUEST_ID_HEADER: &str = "x-request-id";

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Runtime configuration of a [`Router`](crate::dispatcher::Router).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Default policy for endpoint param conversion.
    pub conversion_policy: ConversionPolicy,
    /// Policy for body parsers built from this config.
    pub body_policy: ConversionPolicy,
    /// Largest accepted request body in bytes.
    pub max_body_bytes: usize,
    /// Header an incoming request id is read from and echoed in.
    pub request_id_header: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            conversion_policy: ConversionPolicy::Lenient,
            body_policy: ConversionPolicy::Lenient,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            request_id_header: DEFAULT_REQUEST_ID_HEADER.to_string(),
        }
    }
}

impl RuntimeConfig {
    /// Defaults overridden by environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Parse a TOML document. Missing keys keep their defaults.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Parse`] on invalid TOML or values.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Read a TOML file, then apply environment overrides.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Io`] if the file cannot be read, [`ConfigError::Parse`]
    /// if it is not valid.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::from_toml_str(&text)?.with_env_overrides())
    }

    /// Apply any `ROUTELOOM_*` variables that are set. Unparseable values
    /// are ignored.
    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(val) = env::var("ROUTELOOM_CONVERSION_POLICY") {
            self.conversion_policy = ConversionPolicy::parse(&val);
        }
        if let Ok(val) = env::var("ROUTELOOM_BODY_POLICY") {
            self.body_policy = ConversionPolicy::parse(&val);
        }
        if let Some(limit) = env::var("ROUTELOOM_MAX_BODY_BYTES")
            .ok()
            .and_then(|val| parse_size(&val))
        {
            self.max_body_bytes = limit;
        }
        if let Ok(val) = env::var("ROUTELOOM_REQUEST_ID_HEADER") {
            if !val.trim().is_empty() {
                self.request_id_header = val.trim().to_ascii_lowercase();
            }
        }
        self
    }
}

fn parse_size(val: &str) -> Option<usize> {
    let val = val.trim();
    if let Some(hex) = val.strip_prefix("0x") {
        usize::from_str_radix(hex, 16).ok()
    } else {
        val.parse().ok()
    }
}
