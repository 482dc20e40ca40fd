//! Monitor configuration parameters.

use crate::error::MonitorError;

/// Configuration for the change monitor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MonitorConfig {
    /// Deliver events as soon as they are queued instead of waiting for the
    /// next `process_events` call. Events queued while a dispatch is running
    /// are still deferred to the next batch.
    ///
    /// Default: `false`.
    pub process_events_immediate: bool,
    /// Number of created/destroyed entries kept in the debug log before the
    /// oldest are evicted.
    ///
    /// Default: 1024.
    pub log_capacity: usize,
}

impl MonitorConfig {
    /// Default debug log length.
    pub const DEFAULT_LOG_CAPACITY: usize = 1024;

    /// Check the configuration.
    pub fn validate(&self) -> Result<(), MonitorError> {
        if self.log_capacity == 0 {
            return Err(MonitorError::ZeroLogCapacity);
        }
        Ok(())
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            process_events_immediate: false,
            log_capacity: Self::DEFAULT_LOG_CAPACITY,
        }
    }
}
