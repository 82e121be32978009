//! Ads Configuration Module
//!
//! Process-wide settings read once at init: application ids, pool and queue sizing,
//! and the behaviour of the simulated SDK used off-device.

use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::error::AdError;
use crate::types::AdResult;

/// Default number of ad slots
pub const DEFAULT_MAX_ADS: usize = 16;

/// Default initial command queue capacity
pub const DEFAULT_QUEUE_CAPACITY: usize = 8;

/// Default command queue growth step
pub const DEFAULT_QUEUE_GROWTH: usize = 8;

// ============================================================================
// Simulated SDK Configuration
// ============================================================================

/// Simulated SDK Configuration
///
/// Controls how the desktop stand-in resolves native operations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatedSdkConfig {
    /// Delay before each operation resolves (default 50ms)
    pub completion_delay_ms: u64,
    /// Result of every initialize step (default none)
    pub initialize_result: AdResult,
    /// Result of every load step (default none)
    pub load_result: AdResult,
    /// Worker threads completing operations (default 1)
    pub worker_threads: usize,
}

impl Default for SimulatedSdkConfig {
    fn default() -> Self {
        Self {
            completion_delay_ms: 50,
            initialize_result: AdResult::None,
            load_result: AdResult::None,
            worker_threads: 1,
        }
    }
}

impl SimulatedSdkConfig {
    pub fn completion_delay(&self) -> Duration {
        Duration::from_millis(self.completion_delay_ms)
    }

    /// Set completion delay
    pub fn with_completion_delay(mut self, delay: Duration) -> Self {
        self.completion_delay_ms = delay.as_millis() as u64;
        self
    }

    /// Set the result every load resolves with
    pub fn with_load_result(mut self, result: AdResult) -> Self {
        self.load_result = result;
        self
    }

    /// Set the result every initialize resolves with
    pub fn with_initialize_result(mut self, result: AdResult) -> Self {
        self.initialize_result = result;
        self
    }
}

// ============================================================================
// Process Configuration
// ============================================================================

/// Ads process configuration
///
/// # Example
/// ```rust
/// use ad_bridge_ffi::AdsConfig;
///
/// let config = AdsConfig::from_json_str(r#"{"app_id_ios": "ca-app-pub-1~2", "max_ads": 4}"#).unwrap();
/// assert_eq!(config.max_ads, 4);
/// assert_eq!(config.command_queue_capacity, 8);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdsConfig {
    /// Application id used on Android
    pub app_id_android: Option<String>,
    /// Application id used on iOS and every other target
    pub app_id_ios: Option<String>,
    /// Slot pool capacity (default 16)
    pub max_ads: usize,
    /// Initial command queue capacity (default 8)
    pub command_queue_capacity: usize,
    /// Command queue growth step when full (default 8)
    pub command_queue_growth: usize,
    /// Simulated SDK behaviour
    pub simulated: SimulatedSdkConfig,
}

impl Default for AdsConfig {
    fn default() -> Self {
        Self {
            app_id_android: None,
            app_id_ios: None,
            max_ads: DEFAULT_MAX_ADS,
            command_queue_capacity: DEFAULT_QUEUE_CAPACITY,
            command_queue_growth: DEFAULT_QUEUE_GROWTH,
            simulated: SimulatedSdkConfig::default(),
        }
    }
}

impl AdsConfig {
    /// Create configuration with the same app id on every platform
    pub fn with_app_id(app_id: impl Into<String>) -> Self {
        let app_id = app_id.into();
        Self {
            app_id_android: Some(app_id.clone()),
            app_id_ios: Some(app_id),
            ..Self::default()
        }
    }

    /// Parse and validate configuration JSON
    pub fn from_json_str(json: &str) -> Result<Self, AdError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and validate a configuration file
    pub fn from_path(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading ads config {}", path.display()))?;
        let config = Self::from_json_str(&text)
            .with_context(|| format!("parsing ads config {}", path.display()))?;
        Ok(config)
    }

    /// Set slot pool capacity
    pub fn with_max_ads(mut self, max_ads: usize) -> Self {
        self.max_ads = max_ads;
        self
    }

    /// Set initial queue capacity
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.command_queue_capacity = capacity;
        self
    }

    /// Set simulated SDK behaviour
    pub fn with_simulated(mut self, simulated: SimulatedSdkConfig) -> Self {
        self.simulated = simulated;
        self
    }

    pub fn validate(&self) -> Result<(), AdError> {
        if self.max_ads == 0 {
            return Err(AdError::with_message(AdResult::ConfigError, "max_ads must be at least 1"));
        }
        if self.command_queue_growth == 0 {
            return Err(AdError::with_message(
                AdResult::ConfigError,
                "command_queue_growth must be at least 1",
            ));
        }
        Ok(())
    }

    /// App id for the platform this library was built for
    pub fn app_id(&self) -> Result<&str, AdError> {
        let app_id = if cfg!(target_os = "android") {
            self.app_id_android.as_deref()
        } else {
            self.app_id_ios.as_deref()
        };
        app_id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| AdError::with_message(AdResult::ConfigError, "no app id configured"))
    }
}
