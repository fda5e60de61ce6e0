use std::sync::Arc;
use std::sync::atomic::Ordering;

use super::{ConnectionSlot, Connector, PoolInner};

/// Background replenishing loop, one per pool, runs until shutdown.
///
/// Each tick opens at most one connection, and only while the free queue sits
/// below the warm minimum and the overall cap has headroom. A failed open is
/// logged and retried on the next tick. This is a plain fixed-interval control
/// loop; production deployments under flaky networks usually want backoff
/// here.
pub(super) async fn run<C: Connector>(inner: Arc<PoolInner<C>>) {
    tracing::info!("connection producer started");

    loop {
        if inner.shutdown.is_cancelled() {
            break;
        }

        let free = inner.free_count.load(Ordering::SeqCst);
        let open = inner.open_count.load(Ordering::SeqCst);
        if free < inner.config.min_connections && open < inner.config.max_connections {
            match inner.connector.connect().await {
                Ok(conn) => {
                    let id = inner.next_slot_id.fetch_add(1, Ordering::SeqCst);
                    inner.open_count.fetch_add(1, Ordering::SeqCst);
                    if inner.push_free(ConnectionSlot::new(id, conn)) {
                        tracing::debug!(slot = id, "opened new database connection");
                    } else {
                        inner.open_count.fetch_sub(1, Ordering::SeqCst);
                    }
                }
                Err(err) => {
                    tracing::warn!(error = %err, "failed to open database connection, retrying next tick");
                }
            }
        }

        tokio::select! {
            () = inner.shutdown.cancelled() => break,
            () = tokio::time::sleep(inner.config.producer_interval()) => {}
        }
    }

    tracing::info!("connection producer stopped");
}
