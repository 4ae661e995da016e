//! Server configuration
//!
//! Small, immutable after startup. The role table override points at a
//! JSON file in the same shape as the built-in `access_roles.json`.

use easel_access::{AccessConfig, AccessConfigError};
use easel_session::EventPipeline;
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Errors loading configuration files
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File could not be read
    #[error("failed to read {path}: {source}")]
    Io {
        /// Offending path
        path: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// File is not valid JSON of the expected shape
    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),
}

fn default_bind() -> SocketAddr {
    ([127, 0, 0, 1], 8123).into()
}

fn default_queue_capacity() -> usize {
    EventPipeline::DEFAULT_CAPACITY
}

/// Coordinator server configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
    /// Socket address to listen on
    #[serde(default = "default_bind")]
    pub bind: SocketAddr,
    /// Event pipeline queue capacity
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    /// Optional role table override; `None` uses the built-in table
    #[serde(default)]
    pub roles_file: Option<PathBuf>,
}

impl ServerConfig {
    /// Create the default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With a bind address
    #[inline]
    #[must_use]
    pub fn with_bind(mut self, bind: SocketAddr) -> Self {
        self.bind = bind;
        self
    }

    /// With an event queue capacity
    #[inline]
    #[must_use]
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    /// With a role table file override
    #[inline]
    #[must_use]
    pub fn with_roles_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.roles_file = Some(path.into());
        self
    }

    /// Load configuration from a JSON file
    ///
    /// # Errors
    /// `ConfigError::Io` / `ConfigError::Parse` on unreadable or malformed
    /// input.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Load the role table this configuration selects
    ///
    /// # Errors
    /// `AccessConfigError` if the override file is unreadable or invalid.
    pub fn access_config(&self) -> Result<AccessConfig, AccessConfigError> {
        match &self.roles_file {
            Some(path) => AccessConfig::from_file(path),
            None => Ok(AccessConfig::builtin().clone()),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            queue_capacity: default_queue_capacity(),
            roles_file: None,
        }
    }
}
