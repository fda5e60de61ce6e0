use std::fmt;

use super::connector::PooledConnection;

/// Checkout handle for one pooled connection.
///
/// A slot is exclusively owned by whichever caller currently has it checked
/// out; hand it back with [`ConnectionPool::release`] when done.
///
/// [`ConnectionPool::release`]: super::ConnectionPool::release
pub struct ConnectionSlot<C> {
    id: u64,
    conn: C,
}

impl<C: PooledConnection> ConnectionSlot<C> {
    pub(crate) fn new(id: u64, conn: C) -> Self {
        Self { id, conn }
    }

    /// Pool-wide identity of this slot.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    #[must_use]
    pub fn conn(&self) -> &C {
        &self.conn
    }

    pub fn conn_mut(&mut self) -> &mut C {
        &mut self.conn
    }

    /// Liveness probe of the underlying connection.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.conn.is_valid()
    }
}

// Manual Debug because the driver connection usually is not Debug itself.
impl<C> fmt::Debug for ConnectionSlot<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionSlot")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}
