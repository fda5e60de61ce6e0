use std::time::Duration;

use serde::Deserialize;

use crate::error::QuizEngineError;

/// Sizing and timing knobs for the connection pool.
///
/// These are the integers the embedding application supplies at startup;
/// `Deserialize` lets it load them from whatever config format it already
/// uses.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Warm minimum the producer keeps parked in the free queue.
    pub min_connections: usize,
    /// Hard cap on open connections, free plus checked out.
    pub max_connections: usize,
    /// How long [`acquire`](crate::ConnectionPool::acquire) waits before
    /// reporting [`PoolExhausted`](QuizEngineError::PoolExhausted).
    pub acquire_timeout_secs: u64,
    /// Delay between producer replenishment checks.
    pub producer_interval_ms: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            min_connections: 2,
            max_connections: 10,
            acquire_timeout_secs: 5,
            producer_interval_ms: 500,
        }
    }
}

impl PoolConfig {
    /// # Errors
    /// Returns [`QuizEngineError::ConfigError`] when the cap is zero, the warm
    /// minimum exceeds the cap, or the acquire timeout is zero.
    pub fn validate(&self) -> Result<(), QuizEngineError> {
        if self.max_connections == 0 {
            return Err(QuizEngineError::ConfigError(
                "max_connections must be at least 1".to_string(),
            ));
        }
        if self.min_connections > self.max_connections {
            return Err(QuizEngineError::ConfigError(format!(
                "min_connections ({}) must not exceed max_connections ({})",
                self.min_connections, self.max_connections
            )));
        }
        if self.acquire_timeout_secs == 0 {
            return Err(QuizEngineError::ConfigError(
                "acquire_timeout_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    #[must_use]
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_secs)
    }

    #[must_use]
    pub fn producer_interval(&self) -> Duration {
        Duration::from_millis(self.producer_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(PoolConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_cap_rejected() {
        let config = PoolConfig {
            max_connections: 0,
            ..PoolConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(QuizEngineError::ConfigError(_))
        ));
    }

    #[test]
    fn minimum_above_cap_rejected() {
        let config = PoolConfig {
            min_connections: 5,
            max_connections: 3,
            ..PoolConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(QuizEngineError::ConfigError(_))
        ));
    }

    #[test]
    fn zero_timeout_rejected() {
        let config = PoolConfig {
            acquire_timeout_secs: 0,
            ..PoolConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(QuizEngineError::ConfigError(_))
        ));
    }
}
