//! Session tuning

use std::path::Path;
use std::time::Duration;

use crate::{Error, Result};

/// Idle time after which the link is closed
pub const DISCONNECT_DELAY_SECS: u64 = 120;

/// Send attempts before a transient failure reaches the caller
pub const DEFAULT_ATTEMPTS: u32 = 3;

/// Pause after a transient write failure, before the forced disconnect
pub const BACKOFF_MS: u64 = 250;

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub idle_timeout_secs: u64,
    pub attempts: u32,
    pub backoff_ms: u64,
    /// Used by the btleplug transport when establishing the link
    pub connect_attempts: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            idle_timeout_secs: DISCONNECT_DELAY_SECS,
            attempts: DEFAULT_ATTEMPTS,
            backoff_ms: BACKOFF_MS,
            connect_attempts: DEFAULT_ATTEMPTS,
        }
    }
}

impl SessionConfig {
    /// Load from a JSON file. Missing fields keep their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)
            .map_err(|e| Error::InvalidArgument(format!("{}: {e}", path.display())))?;
        let config: Self = serde_json::from_str(&data)
            .map_err(|e| Error::InvalidArgument(format!("{}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.attempts == 0 {
            return Err(Error::InvalidArgument("attempts must be at least 1".into()));
        }
        if self.connect_attempts == 0 {
            return Err(Error::InvalidArgument(
                "connect_attempts must be at least 1".into(),
            ));
        }
        Ok(())
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    pub fn backoff(&self) -> Duration {
        Duration::from_millis(self.backoff_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = SessionConfig::default();
        assert_eq!(config.idle_timeout(), Duration::from_secs(120));
        assert_eq!(config.attempts, 3);
        assert_eq!(config.backoff(), Duration::from_millis(250));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config: SessionConfig = serde_json::from_str(r#"{"attempts": 5}"#).unwrap();
        assert_eq!(config.attempts, 5);
        assert_eq!(config.idle_timeout_secs, 120);
    }

    #[test]
    fn zero_attempts_rejected() {
        let config = SessionConfig {
            attempts: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(Error::InvalidArgument(_))));
    }
}
