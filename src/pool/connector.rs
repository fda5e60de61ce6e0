use async_trait::async_trait;

use crate::error::QuizEngineError;

/// A live database connection the pool can hold and hand out.
///
/// Closing a connection is dropping it; implementations release their driver
/// resources in `Drop`.
pub trait PooledConnection: Send + 'static {
    /// Zero-cost liveness probe, consulted on checkout and on return.
    fn is_valid(&self) -> bool;
}

/// Connection-opening seam between the pool and a concrete driver.
///
/// The producer owns one connector for the pool's lifetime; tests inject a
/// stub here instead of a real driver.
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    type Conn: PooledConnection;

    /// Open one new connection.
    ///
    /// # Errors
    /// Returns the driver's failure. The producer logs it and retries on its
    /// next tick; it is never surfaced synchronously to an `acquire` caller.
    async fn connect(&self) -> Result<Self::Conn, QuizEngineError>;
}
