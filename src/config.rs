//! Environment-driven configuration.
//!
//! Both config structs deserialize from prefixed environment variables with
//! [`envy`] and fall back to defaults for anything unset:
//!
//! | Variable | Field | Default |
//! |---|---|---|
//! | `VETTED_SANITIZE_MAX_DEPTH` | [`SanitizeConfig::max_depth`] | `64` |
//! | `VETTED_SERVER_ADDR` | [`ServerConfig::addr`] | `0.0.0.0:3000` |
//!
//! Call [`load_dotenv`] first to pick up a `.env` file during development.
//!
//! ```rust,no_run
//! use vetted::config::{self, SanitizeConfig, ServerConfig};
//!
//! config::load_dotenv();
//! let sanitize = SanitizeConfig::from_env().expect("sanitize config");
//! let server = ServerConfig::from_env().expect("server config");
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use serde::Deserialize;
use thiserror::Error;

use crate::sanitize::{DEFAULT_MAX_DEPTH, Sanitizer};

/// Hard ceiling for [`SanitizeConfig::max_depth`].
pub const MAX_DEPTH_CEILING: usize = 1024;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration error: {0}")]
    Env(#[from] envy::Error),

    #[error("invalid configuration: {0}")]
    Invalid(&'static str),
}

/// Loads `.env` from the current directory or its parents, if one exists.
///
/// Returns the path that was loaded. A missing file is not an error.
pub fn load_dotenv() -> Option<PathBuf> {
    dotenvy::dotenv().ok()
}

// ── SanitizeConfig ────────────────────────────────────────────────────────────

#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(default)]
pub struct SanitizeConfig {
    /// Deepest container nesting the sanitizer will enter.
    pub max_depth: usize,
}

impl SanitizeConfig {
    pub const ENV_PREFIX: &'static str = "VETTED_SANITIZE_";

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(std::env::vars())
    }

    /// Same as [`from_env`](Self::from_env) over an explicit variable list.
    pub fn from_vars<I>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let config: Self = envy::prefixed(Self::ENV_PREFIX).from_iter(vars)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_depth > MAX_DEPTH_CEILING {
            return Err(ConfigError::Invalid("max_depth exceeds 1024"));
        }
        Ok(())
    }

    /// Builds the ammonia-backed [`Sanitizer`] this config describes.
    pub fn sanitizer(&self) -> Sanitizer {
        Sanitizer::new().max_depth(self.max_depth)
    }
}

impl Default for SanitizeConfig {
    fn default() -> Self {
        Self { max_depth: DEFAULT_MAX_DEPTH }
    }
}

// ── ServerConfig ──────────────────────────────────────────────────────────────

#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    /// `host:port` to listen on.
    pub addr: String,
}

impl ServerConfig {
    pub const ENV_PREFIX: &'static str = "VETTED_SERVER_";

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(std::env::vars())
    }

    pub fn from_vars<I>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let config: Self = envy::prefixed(Self::ENV_PREFIX).from_iter(vars)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.socket_addr().map(drop)
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.addr.parse().map_err(|_| ConfigError::Invalid("addr is not a host:port socket address"))
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { addr: "0.0.0.0:3000".to_owned() }
    }
}
