//! Configuration types for the meshping dashboard
//!
//! This module defines all configuration structures used throughout the crate.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main dashboard configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// Remote service configuration
    #[serde(default)]
    pub service: ServiceConfig,

    /// Polling and staleness settings
    #[serde(default)]
    pub sync: SyncConfig,

    /// Where the search string is persisted
    #[serde(default)]
    pub persistence: PersistenceConfig,
}

impl DashboardConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        self.service.validate()?;
        self.sync.validate()?;
        self.persistence.validate()?;
        Ok(())
    }
}

/// Remote service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Base URL of the meshping service (e.g., "http://127.0.0.1:9922")
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl ServiceConfig {
    /// Create a service configuration for the given base URL
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }

    /// Request timeout as a Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Validate the service configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.base_url.is_empty() {
            return Err(crate::Error::config("Service base URL cannot be empty"));
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(crate::Error::config(format!(
                "Service base URL must use http or https: {}",
                self.base_url
            )));
        }
        if self.request_timeout_secs == 0 {
            return Err(crate::Error::config("Request timeout must be > 0"));
        }
        Ok(())
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self::new(default_base_url())
    }
}

/// Polling and staleness settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// How often the staleness check runs (in milliseconds)
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Maximum age of the collection before a refetch is due (in milliseconds)
    ///
    /// The check is strict: a refetch happens once the age exceeds this value.
    #[serde(default = "default_stale_threshold_ms")]
    pub stale_threshold_ms: u64,

    /// Capacity of the sync event channel
    ///
    /// When full, new events are dropped (with a warning log).
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

impl SyncConfig {
    /// Tick cadence as a Duration
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// Staleness threshold as a Duration
    pub fn stale_threshold(&self) -> Duration {
        Duration::from_millis(self.stale_threshold_ms)
    }

    /// Validate the sync configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.tick_interval_ms == 0 {
            return Err(crate::Error::config("Tick interval must be > 0"));
        }
        if self.stale_threshold_ms < self.tick_interval_ms {
            return Err(crate::Error::config(format!(
                "Stale threshold ({}ms) must not be shorter than the tick interval ({}ms)",
                self.stale_threshold_ms, self.tick_interval_ms
            )));
        }
        if self.event_channel_capacity == 0 {
            return Err(crate::Error::config("Event channel capacity must be > 0"));
        }
        Ok(())
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            stale_threshold_ms: default_stale_threshold_ms(),
            event_channel_capacity: default_event_channel_capacity(),
        }
    }
}

/// Search persistence configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PersistenceConfig {
    /// File-backed store
    File {
        /// Path to the store file
        path: String,
    },

    /// In-memory store (not persistent)
    #[default]
    Memory,
}

impl PersistenceConfig {
    /// Validate the persistence configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            PersistenceConfig::File { path } if path.is_empty() => {
                Err(crate::Error::config("Store file path cannot be empty"))
            }
            _ => Ok(()),
        }
    }
}

fn default_base_url() -> String {
    "http://127.0.0.1:9922".to_string()
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_tick_interval_ms() -> u64 {
    1_000
}

fn default_stale_threshold_ms() -> u64 {
    29_500
}

fn default_event_channel_capacity() -> usize {
    100
}
