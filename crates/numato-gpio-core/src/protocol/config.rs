//! Module configuration

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

use super::{
    ProtocolError, DEFAULT_BAUD_RATE, DEFAULT_POLL_INTERVAL_MS, DEFAULT_STTY_PATH,
    MAX_RESPONSE_LEN,
};

/// How the serial line is prepared and opened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkMethod {
    /// Configure and open through the platform serial API
    Native,
    /// Configure with an external `stty` process and open the device as a file
    Stty,
}

/// Configuration for a single GPIO module
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModuleConfig {
    /// Character device path (e.g., "/dev/ttyACM0")
    pub device_path: String,
    /// Baud rate (ignored by the CDC ACM device but required by the serial API)
    pub baud_rate: u32,
    /// How the line is configured and opened
    pub link_method: LinkMethod,
    /// Path to `stty`, used by [`LinkMethod::Stty`]
    pub stty_path: String,
    /// Overall reply timeout in milliseconds. `None` waits indefinitely.
    pub read_timeout_ms: Option<u64>,
    /// Maximum reply size in bytes
    pub max_response_len: usize,
    /// Wake-up interval for timed reads in milliseconds
    pub poll_interval_ms: u64,
}

impl Default for ModuleConfig {
    fn default() -> Self {
        Self {
            device_path: String::new(),
            baud_rate: DEFAULT_BAUD_RATE,
            link_method: LinkMethod::Native,
            stty_path: DEFAULT_STTY_PATH.to_string(),
            read_timeout_ms: None,
            max_response_len: MAX_RESPONSE_LEN,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl ModuleConfig {
    /// Create a configuration for the given device path with default settings
    pub fn new(device_path: impl Into<String>) -> Self {
        Self {
            device_path: device_path.into(),
            ..Self::default()
        }
    }

    /// Parse a configuration from JSON. Missing fields take their defaults.
    pub fn from_json_str(content: &str) -> Result<Self, ProtocolError> {
        serde_json::from_str(content).map_err(|e| ProtocolError::Config(e.to_string()))
    }

    /// Load a configuration from a JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ProtocolError> {
        let content = fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Get the overall reply timeout, if any
    pub fn read_timeout(&self) -> Option<Duration> {
        self.read_timeout_ms.map(Duration::from_millis)
    }

    /// Get the poll interval for timed reads
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}
