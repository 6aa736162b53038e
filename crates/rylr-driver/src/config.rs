//! Driver configuration.
//!
//! All fields have defaults matching the stock module setup, so an empty YAML
//! document is a valid configuration:
//!
//! ```yaml
//! read_timeout_ms: 100
//! send_timeout_ms: 1000
//! poll_interval_us: 100
//! max_data_len: 100
//! rx_buffer_frames: 3
//! ```

use std::path::Path;
use std::time::Duration;

use rylr_protocol::{MAX_DATA_LEN, MODULE_MAX_DATA_LEN, RX_OVERHEAD, TX_OVERHEAD};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while loading or validating a [`ModemConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Timing and sizing parameters for a [`LoraModem`](crate::LoraModem).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ModemConfig {
    /// Budget for the first byte of a frame and for each byte after it.
    pub read_timeout_ms: u64,
    /// Extra wait for the module's answer after an `AT+SEND`.
    pub send_timeout_ms: u64,
    /// Idle time between transport polls.
    pub poll_interval_us: u64,
    /// Largest payload sent or accepted.
    pub max_data_len: usize,
    /// Receive buffer capacity, in maximum-size frames.
    pub rx_buffer_frames: usize,
}

impl Default for ModemConfig {
    fn default() -> Self {
        ModemConfig {
            read_timeout_ms: 100,
            send_timeout_ms: 1000,
            poll_interval_us: 100,
            max_data_len: MAX_DATA_LEN,
            rx_buffer_frames: 3,
        }
    }
}

impl ModemConfig {
    /// Parse and validate a YAML document.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: ModemConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Check the values are usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.read_timeout_ms == 0 {
            return Err(ConfigError::Invalid("read_timeout_ms must be non-zero".into()));
        }
        if self.send_timeout_ms == 0 {
            return Err(ConfigError::Invalid("send_timeout_ms must be non-zero".into()));
        }
        if !(1..=MODULE_MAX_DATA_LEN).contains(&self.max_data_len) {
            return Err(ConfigError::Invalid(format!(
                "max_data_len must be in 1..={}, got {}",
                MODULE_MAX_DATA_LEN, self.max_data_len
            )));
        }
        if self.rx_buffer_frames == 0 {
            return Err(ConfigError::Invalid("rx_buffer_frames must be at least 1".into()));
        }
        Ok(())
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    pub fn send_timeout(&self) -> Duration {
        Duration::from_millis(self.send_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_micros(self.poll_interval_us)
    }

    /// Largest inbound frame stored, terminator excluded.
    pub fn max_rx_frame(&self) -> usize {
        self.max_data_len + RX_OVERHEAD
    }

    /// Largest outbound command line.
    pub fn max_tx_frame(&self) -> usize {
        self.max_data_len + TX_OVERHEAD
    }

    /// Receive buffer capacity in bytes.
    ///
    /// Each frame slot holds a maximum-size frame plus its NUL separator.
    pub fn rx_buffer_len(&self) -> usize {
        (self.max_rx_frame() + 1) * self.rx_buffer_frames
    }
}
