#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use quiz_engine::{Connector, PoolConfig, PooledConnection, QuizEngineError};
use tokio::time::Instant;

/// In-memory stand-in for the database driver.
pub struct StubConnector {
    opened: Arc<AtomicUsize>,
    closed: Arc<AtomicUsize>,
    fail_opens: Arc<AtomicBool>,
    validity: Arc<Mutex<Vec<Arc<AtomicBool>>>>,
}

/// Test-side view of a [`StubConnector`] after the pool takes ownership of it.
pub struct StubHandles {
    pub opened: Arc<AtomicUsize>,
    pub closed: Arc<AtomicUsize>,
    pub fail_opens: Arc<AtomicBool>,
    /// Validity flag of each connection, in open order.
    pub validity: Arc<Mutex<Vec<Arc<AtomicBool>>>>,
}

impl StubHandles {
    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn set_fail_opens(&self, fail: bool) {
        self.fail_opens.store(fail, Ordering::SeqCst);
    }

    /// Flip the liveness probe of the nth opened connection.
    pub fn set_valid(&self, index: usize, valid: bool) {
        self.validity.lock().unwrap()[index].store(valid, Ordering::SeqCst);
    }
}

impl StubConnector {
    pub fn new() -> (Self, StubHandles) {
        let opened = Arc::new(AtomicUsize::new(0));
        let closed = Arc::new(AtomicUsize::new(0));
        let fail_opens = Arc::new(AtomicBool::new(false));
        let validity = Arc::new(Mutex::new(Vec::new()));
        let handles = StubHandles {
            opened: Arc::clone(&opened),
            closed: Arc::clone(&closed),
            fail_opens: Arc::clone(&fail_opens),
            validity: Arc::clone(&validity),
        };
        (
            Self {
                opened,
                closed,
                fail_opens,
                validity,
            },
            handles,
        )
    }
}

pub struct StubConn {
    valid: Arc<AtomicBool>,
    closed: Arc<AtomicUsize>,
}

impl PooledConnection for StubConn {
    fn is_valid(&self) -> bool {
        self.valid.load(Ordering::SeqCst)
    }
}

impl Drop for StubConn {
    fn drop(&mut self) {
        self.closed.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl Connector for StubConnector {
    type Conn = StubConn;

    async fn connect(&self) -> Result<StubConn, QuizEngineError> {
        if self.fail_opens.load(Ordering::SeqCst) {
            return Err(QuizEngineError::ConnectionError(
                "stub refused to open".to_string(),
            ));
        }
        let valid = Arc::new(AtomicBool::new(true));
        self.validity.lock().unwrap().push(Arc::clone(&valid));
        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(StubConn {
            valid,
            closed: Arc::clone(&self.closed),
        })
    }
}

/// Pool config with a fast producer tick so tests converge quickly.
pub fn test_config(min: usize, max: usize, acquire_timeout_secs: u64) -> PoolConfig {
    PoolConfig {
        min_connections: min,
        max_connections: max,
        acquire_timeout_secs,
        producer_interval_ms: 20,
    }
}

/// Poll `cond` every 10ms until it holds or `deadline` passes.
pub async fn wait_for(cond: impl Fn() -> bool, deadline: Duration) -> bool {
    let end = Instant::now() + deadline;
    while Instant::now() < end {
        if cond() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    cond()
}
