//! Background workers: batch persistence and status refresh.
//!
//! Each worker parks on `select!` over its interval sleep and the pool's
//! shutdown channel, so cancellation interrupts the wait itself rather than
//! waiting out the current sleep.

use super::TokenPool;
use std::sync::Arc;
use tokio::sync::watch;

impl TokenPool {
    /// Spawn the batch-save and status-refresh workers.
    ///
    /// Called once after `load()` succeeds; the handles are owned by the
    /// pool and awaited during shutdown. Calling again is a no-op.
    pub async fn start_workers(self: &Arc<Self>) {
        let mut workers = self.workers.lock().await;
        if !workers.is_empty() {
            return;
        }

        workers.push(tokio::spawn(batch_save_loop(
            Arc::clone(self),
            self.shutdown_tx.subscribe(),
        )));
        workers.push(tokio::spawn(refresh_status_loop(
            Arc::clone(self),
            self.shutdown_tx.subscribe(),
        )));

        tracing::info!(
            "Token pool workers started (save every {}s, refresh every {}s)",
            self.config.save_interval_secs,
            self.config.refresh_interval_secs
        );
    }
}

async fn batch_save_loop(pool: Arc<TokenPool>, mut shutdown_rx: watch::Receiver<bool>) {
    loop {
        tokio::select! {
            () = tokio::time::sleep(pool.config.save_interval()) => {
                match pool.flush_dirty().await {
                    Ok(0) => {},
                    Ok(n) => tracing::debug!("Persisted {} dirty token record(s)", n),
                    Err(e) => {
                        // Dirty flags survive; the next tick retries.
                        tracing::warn!("Batch save failed, will retry: {}", e);
                    },
                }
            }
            _ = shutdown_rx.changed() => {
                tracing::info!("Batch save worker shutting down");
                break;
            }
        }
    }
}

async fn refresh_status_loop(pool: Arc<TokenPool>, mut shutdown_rx: watch::Receiver<bool>) {
    loop {
        tokio::select! {
            () = tokio::time::sleep(pool.config.refresh_interval()) => {
                pool.refresh_statuses();
            }
            _ = shutdown_rx.changed() => {
                tracing::info!("Status refresh worker shutting down");
                break;
            }
        }
    }
}
