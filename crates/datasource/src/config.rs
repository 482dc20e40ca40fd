//! Store configuration and its validation errors.

use std::error::Error;
use std::fmt;

use datasource_monitor::{MonitorConfig, MonitorError};
use datasource_pool::{PoolConfig, PoolError};

/// Configuration for a [`Store`](crate::Store).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StoreConfig {
    /// Node pool sizing.
    pub pool: PoolConfig,
    /// Change monitor behavior.
    pub monitor: MonitorConfig,
}

impl StoreConfig {
    /// A default config with `capacity` pool slots.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            pool: PoolConfig::with_capacity(capacity),
            ..Self::default()
        }
    }

    /// Check both halves of the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.pool.validate()?;
        self.monitor.validate()?;
        Ok(())
    }
}

/// Errors detected while building a store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// The pool configuration is invalid.
    Pool(PoolError),
    /// The monitor configuration is invalid.
    Monitor(MonitorError),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pool(e) => write!(f, "pool config: {e}"),
            Self::Monitor(e) => write!(f, "monitor config: {e}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Pool(e) => Some(e),
            Self::Monitor(e) => Some(e),
        }
    }
}

impl From<PoolError> for ConfigError {
    fn from(e: PoolError) -> Self {
        Self::Pool(e)
    }
}

impl From<MonitorError> for ConfigError {
    fn from(e: MonitorError) -> Self {
        Self::Monitor(e)
    }
}
