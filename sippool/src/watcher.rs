//! Background pool-utilization watcher.
//!
//! Periodically samples [`crate::stats::pool_stats`] and logs a warning when
//! utilization crosses the configured threshold, so operators hear about an
//! almost-exhausted pool before users hit `POOL_EXHAUSTED`. Runs alongside the
//! HTTP server and stops on the shared shutdown token.

use crate::config::WatcherConfig;
use crate::stats;
use sqlx::PgPool;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub struct PoolWatcher {
    db: PgPool,
    config: WatcherConfig,
}

impl PoolWatcher {
    pub fn new(db: PgPool, config: WatcherConfig) -> Self {
        Self { db, config }
    }

    /// Spawn the watcher loop as a background task
    pub fn spawn(self, shutdown: CancellationToken) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move { self.run(shutdown).await })
    }

    async fn run(self, shutdown: CancellationToken) {
        info!(
            interval = ?self.config.interval,
            threshold_pct = self.config.warn_threshold_pct,
            "pool watcher started"
        );

        let mut ticker = tokio::time::interval(self.config.interval);
        // A stalled database should not cause a burst of catch-up samples
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("pool watcher stopping");
                    break;
                }
                _ = ticker.tick() => {
                    match stats::pool_stats(&self.db).await {
                        Ok(stats) if stats.percentage_used >= self.config.warn_threshold_pct => {
                            warn!(
                                total = stats.total,
                                available = stats.available,
                                percentage_used = stats.percentage_used,
                                "SIP pool nearly exhausted"
                            );
                        }
                        Ok(stats) => {
                            debug!(
                                total = stats.total,
                                available = stats.available,
                                percentage_used = stats.percentage_used,
                                "pool utilization sample"
                            );
                        }
                        Err(e) => {
                            warn!("pool watcher failed to sample stats: {e:#}");
                        }
                    }
                }
            }
        }
    }
}
