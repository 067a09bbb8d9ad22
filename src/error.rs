//! Unified error type.

use thiserror::Error;

use crate::config::ConfigError;

/// The error type returned by vetted's fallible startup operations.
///
/// Per-request failures (404, 400, 415, ...) are expressed as
/// [`Response`](crate::Response) values, not as `Error`s. This type surfaces
/// infrastructure failures: bad configuration, binding to a port, accepting
/// a connection.
#[derive(Debug, Error)]
pub enum Error {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid socket address `{0}`")]
    InvalidAddress(String),

    #[error(transparent)]
    Config(#[from] ConfigError),
}
