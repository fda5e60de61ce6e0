use std::time::Duration;

use thiserror::Error;

/// Crate-wide error type.
///
/// Pool failures propagate as typed variants to the acquire site; producer-side
/// connection-open failures are logged and retried internally, so callers only
/// ever observe them indirectly as a longer wait or a [`PoolExhausted`] result.
///
/// [`PoolExhausted`]: QuizEngineError::PoolExhausted
#[derive(Debug, Error)]
pub enum QuizEngineError {
    /// No connection became available before the acquire timeout elapsed.
    /// The caller should abort the current operation; this is not fatal to
    /// the process.
    #[error("no database connection became available within {0:?}")]
    PoolExhausted(Duration),

    /// The wait for a connection was cut short because the pool shut down.
    #[error("interrupted while waiting for a database connection: pool is shutting down")]
    PoolInterrupted,

    #[error(transparent)]
    PostgresError(#[from] tokio_postgres::Error),

    #[error("configuration error: {0}")]
    ConfigError(String),

    #[error("connection error: {0}")]
    ConnectionError(String),

    /// Round metrics rejected at construction; scoring itself never fails.
    #[error("invalid round metrics: {0}")]
    InvalidMetrics(String),
}
