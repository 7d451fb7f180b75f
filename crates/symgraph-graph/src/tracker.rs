use crate::impact::{self, ImpactAnalysis};
use crate::metrics::{MetricsSnapshot, TrackerMetrics};
use crate::path::{self, DependencyPath};
use crate::processor::{AnalysisProcessor, ChangeLogCleanup};
use crate::store::{GraphState, SharedState, SymbolDependencies};
use crate::subscription::{NotificationSink, SubscriptionManager};
use std::sync::Arc;
use std::time::Instant;
use symgraph_core::{
    ChangeKind, DependencyEdge, DependencyKind, Result, SourceLocation, SymbolChange,
    SymbolDescriptor, SymbolId, SymbolNode, TrackerConfig,
};
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Per-workspace symbol dependency tracker.
///
/// One instance is constructed per opened workspace and handed by reference
/// to everything that needs it; its background tasks live from [`start`] to
/// [`shutdown`], not for the process lifetime.
///
/// All graph state sits behind a single writer lock: every mutation takes
/// the write guard for its whole effect, so no caller ever observes a
/// half-applied insertion or a symbol missing from only one adjacency
/// direction.
///
/// [`start`]: SymbolDependencyTracker::start
/// [`shutdown`]: SymbolDependencyTracker::shutdown
pub struct SymbolDependencyTracker {
    state: SharedState,
    subscriptions: Arc<SubscriptionManager>,
    metrics: Arc<TrackerMetrics>,
    config: TrackerConfig,
    shutdown: CancellationToken,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl SymbolDependencyTracker {
    pub fn new(config: TrackerConfig, sink: Arc<dyn NotificationSink>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            state: Arc::new(RwLock::new(GraphState::new(config.change_log_capacity))),
            subscriptions: Arc::new(SubscriptionManager::new(sink)),
            metrics: Arc::new(TrackerMetrics::default()),
            config,
            shutdown: CancellationToken::new(),
            tasks: Mutex::new(Vec::new()),
        })
    }

    /// Spawn the background analysis processor and the change-log cleanup
    /// task. Calling this twice is a no-op.
    pub async fn start(&self) {
        let mut tasks = self.tasks.lock().await;
        if !tasks.is_empty() {
            return;
        }
        let processor = AnalysisProcessor::new(
            self.state.clone(),
            self.subscriptions.clone(),
            self.metrics.clone(),
            self.config.clone(),
            self.shutdown.clone(),
        );
        let cleanup = ChangeLogCleanup::new(
            self.state.clone(),
            self.config.clone(),
            self.shutdown.clone(),
        );
        tasks.push(tokio::spawn(processor.run()));
        tasks.push(tokio::spawn(cleanup.run()));
        info!("symbol dependency tracker started");
    }

    /// Cancel the background tasks and wait for them to finish; an in-flight
    /// batch completes before the processor exits.
    pub async fn shutdown(&self) {
        self.shutdown.cancel();
        let mut tasks = self.tasks.lock().await;
        for handle in tasks.drain(..) {
            if let Err(e) = handle.await {
                warn!(error = %e, "background task ended abnormally");
            }
        }
        info!("symbol dependency tracker stopped");
    }

    /// Upsert a symbol reported by the parser. Returns false (and logs)
    /// instead of erroring on malformed input: one bad symbol must not block
    /// the rest of a parse batch.
    pub async fn add_symbol(&self, descriptor: SymbolDescriptor, file_path: &str) -> bool {
        if let Err(e) = descriptor.validate(file_path) {
            warn!(file = file_path, error = %e, "rejected symbol descriptor");
            return false;
        }
        let node = descriptor.into_node(file_path);

        let mut state = self.state.write().await;
        let previous = state.insert_symbol(node.clone());
        let kind = if previous.is_some() {
            ChangeKind::Modified
        } else {
            ChangeKind::Added
        };
        let affected = state.dependents_of(node.id);
        state.changes.push(SymbolChange::new(
            node.id,
            kind,
            previous,
            Some(node.clone()),
            file_path,
            affected,
        ));
        state.mark_dirty(node.id);
        self.metrics.set_total_symbols(state.symbol_count());
        debug!(symbol = %node.name, %kind, "symbol upserted");
        true
    }

    /// Record that `source` depends on `target`. Both endpoints must already
    /// exist; a dangling reference leaves the store unchanged. A cycle-closing
    /// edge is still inserted — cycles are detected and counted, not
    /// prevented.
    pub async fn add_dependency(
        &self,
        source: SymbolId,
        target: SymbolId,
        kind: DependencyKind,
        location: SourceLocation,
    ) -> bool {
        let mut state = self.state.write().await;
        if !state.contains(source) || !state.contains(target) {
            warn!(%source, %target, "dependency references unknown symbol");
            return false;
        }

        let exists = state.edge(source, target).is_some();
        let closes_cycle =
            !exists && state.can_reach(target, source, self.config.max_analysis_depth);
        let file_path = location.file_path.clone();
        state.insert_edge(DependencyEdge::new(source, target, kind, location));
        if closes_cycle {
            self.metrics.record_cycle_detected();
            warn!(%source, %target, "dependency closes a cycle");
        }

        let after = state.symbol(source).cloned();
        state.changes.push(SymbolChange::new(
            source,
            ChangeKind::Modified,
            None,
            after,
            file_path,
            vec![target],
        ));
        state.mark_dirty(source);
        state.mark_dirty(target);
        self.metrics.record_dependency_update();
        self.metrics.set_total_dependencies(state.edge_count());
        debug!(%source, %target, %kind, "dependency recorded");
        true
    }

    /// Remove a symbol and every edge touching it. Returns false on an
    /// unknown id.
    pub async fn remove_symbol(&self, id: SymbolId) -> bool {
        let mut state = self.state.write().await;
        let removed = Self::remove_symbol_locked(&mut state, id);
        if removed {
            self.metrics.set_total_symbols(state.symbol_count());
            self.metrics.set_total_dependencies(state.edge_count());
        }
        removed
    }

    /// Cascade removal of every symbol indexed for a deleted file. Returns
    /// how many symbols were removed.
    pub async fn remove_file_symbols(&self, file_path: &str) -> usize {
        let mut state = self.state.write().await;
        let ids = state.symbols_in_file(file_path);
        let mut removed = 0;
        for id in ids {
            if Self::remove_symbol_locked(&mut state, id) {
                removed += 1;
            }
        }
        if removed > 0 {
            self.metrics.set_total_symbols(state.symbol_count());
            self.metrics.set_total_dependencies(state.edge_count());
            info!(file = file_path, removed, "file symbols removed");
        }
        removed
    }

    fn remove_symbol_locked(state: &mut GraphState, id: SymbolId) -> bool {
        // Captured before removal so the change entry records who was hit.
        let affected = state.dependents_of(id);
        let node = match state.remove_symbol(id) {
            Some(n) => n,
            None => return false,
        };
        state.changes.push(SymbolChange::new(
            id,
            ChangeKind::Deleted,
            Some(node.clone()),
            None,
            node.location.file_path.clone(),
            affected.clone(),
        ));
        // The removed id is queued per protocol (and skipped once gone); its
        // former dependents are the ones whose analyses actually change.
        state.mark_dirty(id);
        for dep in affected {
            state.mark_dirty(dep);
        }
        debug!(symbol = %node.name, "symbol removed");
        true
    }

    pub async fn get_symbol(&self, id: SymbolId) -> Option<SymbolNode> {
        self.state.read().await.symbol(id).cloned()
    }

    /// Direct relations plus a bounded recursive expansion of the symbol's
    /// dependency tree. `depth` is clamped to `max_analysis_depth`. Unknown
    /// ids yield `None`, not an error.
    pub async fn get_symbol_dependencies(
        &self,
        id: SymbolId,
        depth: usize,
    ) -> Option<SymbolDependencies> {
        let depth = depth.min(self.config.max_analysis_depth);
        self.state.read().await.symbol_dependencies(id, depth)
    }

    /// Blast radius of changing `id` with the given change kind.
    pub async fn analyze_symbol_impact(
        &self,
        id: SymbolId,
        change_kind: ChangeKind,
    ) -> ImpactAnalysis {
        let state = self.state.read().await;
        let start = Instant::now();
        let analysis = impact::analyze(
            &state,
            &self.config.weights,
            self.config.max_analysis_depth,
            id,
            change_kind,
        );
        self.metrics.record_analysis(start.elapsed());
        analysis
    }

    /// Minimum-hop dependency path from `source` to `target`, if any exists
    /// within the analysis depth bound.
    pub async fn find_dependency_path(
        &self,
        source: SymbolId,
        target: SymbolId,
    ) -> Option<DependencyPath> {
        let state = self.state.read().await;
        path::find_path(&state, self.config.max_analysis_depth, source, target)
    }

    pub fn subscribe(&self, symbol_id: SymbolId, client_id: impl Into<String>) {
        self.subscriptions.subscribe(symbol_id, client_id);
    }

    pub fn unsubscribe(&self, symbol_id: SymbolId, client_id: &str) {
        self.subscriptions.unsubscribe(symbol_id, client_id);
    }

    pub fn subscription_count(&self, symbol_id: SymbolId) -> usize {
        self.subscriptions.subscriber_count(symbol_id)
    }

    pub async fn recent_changes(&self, limit: usize) -> Vec<SymbolChange> {
        self.state.read().await.changes.recent(limit)
    }

    pub async fn changes_for_symbol(&self, id: SymbolId, limit: usize) -> Vec<SymbolChange> {
        self.state.read().await.changes.for_symbol(id, limit)
    }

    pub async fn symbol_count(&self) -> usize {
        self.state.read().await.symbol_count()
    }

    pub async fn dependency_count(&self) -> usize {
        self.state.read().await.edge_count()
    }

    pub async fn symbols_in_file(&self, file_path: &str) -> Vec<SymbolId> {
        self.state.read().await.symbols_in_file(file_path)
    }

    /// Dirty symbols still waiting for background analysis.
    pub async fn pending_analyses(&self) -> usize {
        self.state.read().await.dirty_len()
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subscription::ImpactUpdate;
    use async_trait::async_trait;
    use symgraph_core::{symbol_id, SymbolKind};

    struct NullSink;

    #[async_trait]
    impl NotificationSink for NullSink {
        async fn deliver(&self, _client_id: &str, _update: ImpactUpdate) -> Result<()> {
            Ok(())
        }
    }

    fn tracker() -> SymbolDependencyTracker {
        SymbolDependencyTracker::new(TrackerConfig::default(), Arc::new(NullSink)).unwrap()
    }

    fn descriptor(name: &str, line: u32) -> SymbolDescriptor {
        SymbolDescriptor::new(name, SymbolKind::Function, line, 0)
    }

    #[tokio::test]
    async fn add_symbol_classifies_added_then_modified() {
        let t = tracker();
        assert!(t.add_symbol(descriptor("f", 1), "src/a.py").await);
        assert!(t.add_symbol(descriptor("f", 1), "src/a.py").await);
        let id = symbol_id("src/a.py", "f", SymbolKind::Function, 1);
        let changes = t.changes_for_symbol(id, 10).await;
        assert_eq!(changes.len(), 2);
        assert_eq!(changes[0].kind, ChangeKind::Modified);
        assert_eq!(changes[1].kind, ChangeKind::Added);
        assert_eq!(t.symbol_count().await, 1);
    }

    #[tokio::test]
    async fn malformed_descriptor_is_rejected_quietly() {
        let t = tracker();
        assert!(!t.add_symbol(descriptor("", 1), "src/a.py").await);
        assert!(!t.add_symbol(descriptor("ok", 1), "").await);
        assert_eq!(t.symbol_count().await, 0);
        assert!(t.recent_changes(10).await.is_empty());
    }

    #[tokio::test]
    async fn dangling_dependency_leaves_store_unchanged() {
        let t = tracker();
        t.add_symbol(descriptor("a", 1), "src/a.py").await;
        let a = symbol_id("src/a.py", "a", SymbolKind::Function, 1);
        let ghost = symbol_id("ghost.py", "g", SymbolKind::Function, 1);
        let loc = SourceLocation::new("src/a.py", 1, 0);
        assert!(
            !t.add_dependency(a, ghost, DependencyKind::FunctionCall, loc.clone())
                .await
        );
        assert!(
            !t.add_dependency(ghost, a, DependencyKind::FunctionCall, loc)
                .await
        );
        assert_eq!(t.dependency_count().await, 0);
        assert_eq!(t.metrics().dependency_updates, 0);
    }

    #[tokio::test]
    async fn unknown_queries_return_empty_not_errors() {
        let t = tracker();
        let ghost = symbol_id("ghost.py", "g", SymbolKind::Function, 1);
        assert!(t.get_symbol(ghost).await.is_none());
        assert!(t.get_symbol_dependencies(ghost, 2).await.is_none());
        assert!(!t.remove_symbol(ghost).await);
        let analysis = t.analyze_symbol_impact(ghost, ChangeKind::Deleted).await;
        assert_eq!(analysis.impact_score, 0.0);
    }

    #[tokio::test]
    async fn double_start_is_a_noop_and_shutdown_joins() {
        let t = tracker();
        t.start().await;
        t.start().await;
        assert_eq!(t.tasks.lock().await.len(), 2);
        t.shutdown().await;
        assert!(t.tasks.lock().await.is_empty());
    }
}
