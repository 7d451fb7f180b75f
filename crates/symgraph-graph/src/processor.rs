use crate::impact;
use crate::metrics::TrackerMetrics;
use crate::store::SharedState;
use crate::subscription::SubscriptionManager;
use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;
use symgraph_core::{ChangeKind, Result, TrackerConfig};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Drains the dirty-symbol queue in bounded batches and pushes qualifying
/// impact results to subscribers.
///
/// The fixed sleep between drains coalesces bursts of related edits into one
/// analysis pass. A failed tick is logged and the loop keeps going; only
/// cancellation stops it, and an in-flight batch always finishes first.
pub(crate) struct AnalysisProcessor {
    state: SharedState,
    subscriptions: Arc<SubscriptionManager>,
    metrics: Arc<TrackerMetrics>,
    config: TrackerConfig,
    shutdown: CancellationToken,
}

impl AnalysisProcessor {
    pub(crate) fn new(
        state: SharedState,
        subscriptions: Arc<SubscriptionManager>,
        metrics: Arc<TrackerMetrics>,
        config: TrackerConfig,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            state,
            subscriptions,
            metrics,
            config,
            shutdown,
        }
    }

    pub(crate) async fn run(self) {
        debug!("analysis processor started");
        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => break,
                _ = tokio::time::sleep(self.config.processing_interval()) => {
                    if let Err(e) = self.tick().await {
                        warn!(error = %e, "analysis tick failed");
                    }
                }
            }
        }
        debug!("analysis processor stopped");
    }

    async fn tick(&self) -> Result<()> {
        let batch = {
            let mut state = self.state.write().await;
            state.drain_dirty(self.config.batch_size)
        };
        if batch.is_empty() {
            return Ok(());
        }
        debug!(batch = batch.len(), "analyzing dirty symbols");

        for id in batch {
            let analysis = {
                let state = self.state.read().await;
                // The symbol may have been removed since it was queued.
                if !state.contains(id) {
                    continue;
                }
                let start = Instant::now();
                let analysis = impact::analyze(
                    &state,
                    &self.config.weights,
                    self.config.max_analysis_depth,
                    id,
                    ChangeKind::Modified,
                );
                self.metrics.record_analysis(start.elapsed());
                analysis
            };

            if analysis.impact_score > self.config.impact_threshold {
                let sent = self.subscriptions.publish(analysis).await;
                self.metrics.record_updates_sent(sent);
            }
        }
        Ok(())
    }
}

/// Low-frequency companion task: keeps the change log inside its retention
/// window.
pub(crate) struct ChangeLogCleanup {
    state: SharedState,
    config: TrackerConfig,
    shutdown: CancellationToken,
}

impl ChangeLogCleanup {
    pub(crate) fn new(state: SharedState, config: TrackerConfig, shutdown: CancellationToken) -> Self {
        Self {
            state,
            config,
            shutdown,
        }
    }

    pub(crate) async fn run(self) {
        debug!("change log cleanup started");
        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => break,
                _ = tokio::time::sleep(self.config.cleanup_interval()) => {
                    let cutoff = Utc::now()
                        - chrono::Duration::seconds(self.config.change_retention_secs as i64);
                    let removed = self.state.write().await.changes.prune_older_than(cutoff);
                    if removed > 0 {
                        debug!(removed, "pruned expired change log entries");
                    }
                }
            }
        }
        debug!("change log cleanup stopped");
    }
}
