//! Engine configuration.
//!
//! Every operation waits for its reply within one of a handful of timeout
//! classes. [`EngineConfig`] holds them all, can be built in code or loaded
//! from TOML, and is validated before an engine accepts it.
//!
//! ```
//! use easyvr_core::EngineConfig;
//!
//! let config = EngineConfig::from_toml_str(
//!     r#"
//!     rx_timeout_ms = 800
//!     detect_attempts = 10
//!     "#,
//! )
//! .unwrap();
//! assert_eq!(config.rx_timeout.as_millis(), 800);
//! assert_eq!(config.wake_timeout.as_millis(), 200);
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default timeout for ordinary replies.
pub const DEFAULT_RX_TIMEOUT: Duration = Duration::from_millis(500);
/// Default timeout for operations that touch flash storage.
pub const DEFAULT_STORAGE_TIMEOUT: Duration = Duration::from_millis(500);
/// Default timeout for a wake-up reply.
pub const DEFAULT_WAKE_TIMEOUT: Duration = Duration::from_millis(200);
/// Default timeout for sound playback.
pub const DEFAULT_PLAY_TIMEOUT: Duration = Duration::from_millis(5000);
/// Default timeout for sending a SonicNet token.
pub const DEFAULT_TOKEN_TIMEOUT: Duration = Duration::from_millis(1500);
/// Default timeout for memory reset, repair and similar maintenance.
pub const DEFAULT_MAINTENANCE_TIMEOUT: Duration = Duration::from_secs(30);
/// Default number of break bytes sent while detecting the module.
pub const DEFAULT_DETECT_ATTEMPTS: u32 = 5;
/// Default number of consecutive link faults that count as degraded.
pub const DEFAULT_DEGRADED_AFTER: u64 = 3;

/// Timeouts and limits for an [`EasyVr`](crate::EasyVr) engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Timeout for ordinary replies and argument reads.
    #[serde(rename = "rx_timeout_ms", with = "millis")]
    pub rx_timeout: Duration,
    /// Timeout for replies to storage-affecting operations.
    #[serde(rename = "storage_timeout_ms", with = "millis")]
    pub storage_timeout: Duration,
    /// Timeout for each wake-up attempt.
    #[serde(rename = "wake_timeout_ms", with = "millis")]
    pub wake_timeout: Duration,
    /// Timeout for synchronous sound playback.
    #[serde(rename = "play_timeout_ms", with = "millis")]
    pub play_timeout: Duration,
    /// Timeout for synchronous token transmission.
    #[serde(rename = "token_timeout_ms", with = "millis")]
    pub token_timeout: Duration,
    /// Timeout for waited memory maintenance.
    #[serde(rename = "maintenance_timeout_ms", with = "millis")]
    pub maintenance_timeout: Duration,
    /// Break bytes sent by `detect` before giving up.
    pub detect_attempts: u32,
    /// Consecutive link faults after which the link reports degraded.
    pub degraded_after: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            rx_timeout: DEFAULT_RX_TIMEOUT,
            storage_timeout: DEFAULT_STORAGE_TIMEOUT,
            wake_timeout: DEFAULT_WAKE_TIMEOUT,
            play_timeout: DEFAULT_PLAY_TIMEOUT,
            token_timeout: DEFAULT_TOKEN_TIMEOUT,
            maintenance_timeout: DEFAULT_MAINTENANCE_TIMEOUT,
            detect_attempts: DEFAULT_DETECT_ATTEMPTS,
            degraded_after: DEFAULT_DEGRADED_AFTER,
        }
    }
}

impl EngineConfig {
    /// Create a new config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a config for slow or noisy links.
    ///
    /// Doubles the reply timeouts, which suits 9600 baud links and long
    /// cables.
    pub fn patient() -> Self {
        Self {
            rx_timeout: Duration::from_millis(1000),
            storage_timeout: Duration::from_millis(1000),
            wake_timeout: Duration::from_millis(400),
            detect_attempts: 10,
            ..Self::default()
        }
    }

    /// Parse a config from TOML. Missing keys keep their defaults.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: Self = toml::from_str(source)
            .map_err(|e| Error::invalid_config(format!("bad engine config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize this config as TOML.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string(self).map_err(|e| Error::invalid_config(e.to_string()))
    }

    /// Check that the values make sense.
    pub fn validate(&self) -> Result<()> {
        if self.detect_attempts == 0 {
            return Err(Error::invalid_config("detect_attempts must be at least 1"));
        }
        let timeouts = [
            ("rx_timeout", self.rx_timeout),
            ("storage_timeout", self.storage_timeout),
            ("wake_timeout", self.wake_timeout),
            ("play_timeout", self.play_timeout),
            ("token_timeout", self.token_timeout),
            ("maintenance_timeout", self.maintenance_timeout),
        ];
        for (name, timeout) in timeouts {
            if timeout.is_zero() {
                return Err(Error::invalid_config(format!("{name} must not be zero")));
            }
        }
        Ok(())
    }

    /// Set the reply timeout.
    #[must_use]
    pub fn rx_timeout(mut self, timeout: Duration) -> Self {
        self.rx_timeout = timeout;
        self
    }

    /// Set the storage timeout.
    #[must_use]
    pub fn storage_timeout(mut self, timeout: Duration) -> Self {
        self.storage_timeout = timeout;
        self
    }

    /// Set the wake-up timeout.
    #[must_use]
    pub fn wake_timeout(mut self, timeout: Duration) -> Self {
        self.wake_timeout = timeout;
        self
    }

    /// Set the playback timeout.
    #[must_use]
    pub fn play_timeout(mut self, timeout: Duration) -> Self {
        self.play_timeout = timeout;
        self
    }

    /// Set the token transmission timeout.
    #[must_use]
    pub fn token_timeout(mut self, timeout: Duration) -> Self {
        self.token_timeout = timeout;
        self
    }

    /// Set the maintenance timeout.
    #[must_use]
    pub fn maintenance_timeout(mut self, timeout: Duration) -> Self {
        self.maintenance_timeout = timeout;
        self
    }

    /// Set the number of detection attempts.
    #[must_use]
    pub fn detect_attempts(mut self, attempts: u32) -> Self {
        self.detect_attempts = attempts;
        self
    }

    /// Set the degraded-link threshold.
    #[must_use]
    pub fn degraded_after(mut self, faults: u64) -> Self {
        self.degraded_after = faults;
        self
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.rx_timeout, Duration::from_millis(500));
        assert_eq!(config.wake_timeout, Duration::from_millis(200));
        assert_eq!(config.play_timeout, Duration::from_secs(5));
        assert_eq!(config.token_timeout, Duration::from_millis(1500));
        assert_eq!(config.detect_attempts, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = EngineConfig::new()
            .rx_timeout(Duration::from_millis(50))
            .detect_attempts(2)
            .degraded_after(1);
        assert_eq!(config.rx_timeout, Duration::from_millis(50));
        assert_eq!(config.detect_attempts, 2);
        assert_eq!(config.degraded_after, 1);
    }

    #[test]
    fn test_patient_preset_is_slower() {
        let patient = EngineConfig::patient();
        assert!(patient.rx_timeout > DEFAULT_RX_TIMEOUT);
        assert_eq!(patient.play_timeout, DEFAULT_PLAY_TIMEOUT);
    }

    #[test]
    fn test_zero_detect_attempts_rejected() {
        let err = EngineConfig::new().detect_attempts(0).validate().unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let err = EngineConfig::new()
            .wake_timeout(Duration::ZERO)
            .validate()
            .unwrap_err();
        assert!(err.to_string().contains("wake_timeout"));
    }

    #[test]
    fn test_toml_round_trip() {
        let config = EngineConfig::patient().maintenance_timeout(Duration::from_secs(60));
        let text = config.to_toml_string().unwrap();
        assert!(text.contains("maintenance_timeout_ms = 60000"));
        assert_eq!(EngineConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn test_toml_invalid() {
        assert!(matches!(
            EngineConfig::from_toml_str("detect_attempts = 0"),
            Err(Error::InvalidConfig(_))
        ));
        assert!(matches!(
            EngineConfig::from_toml_str("rx_timeout_ms = \"soon\""),
            Err(Error::InvalidConfig(_))
        ));
    }
}
