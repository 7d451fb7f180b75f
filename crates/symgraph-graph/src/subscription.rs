use crate::impact::ImpactAnalysis;
use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use symgraph_core::{Result, SymbolId};
use tracing::{debug, warn};

/// Payload handed to the transport for one subscriber.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImpactUpdate {
    pub symbol_id: SymbolId,
    pub analysis: ImpactAnalysis,
}

/// Transport seam. The tracker knows nothing about WebSockets or message
/// buses; whatever delivers updates to clients implements this and is
/// injected at construction.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn deliver(&self, client_id: &str, update: ImpactUpdate) -> Result<()>;
}

/// Per-symbol subscriber registry with fan-out through the injected sink.
pub struct SubscriptionManager {
    subscribers: DashMap<SymbolId, HashSet<String>>,
    sink: Arc<dyn NotificationSink>,
}

impl SubscriptionManager {
    pub fn new(sink: Arc<dyn NotificationSink>) -> Self {
        Self {
            subscribers: DashMap::new(),
            sink,
        }
    }

    pub fn subscribe(&self, symbol_id: SymbolId, client_id: impl Into<String>) {
        let client_id = client_id.into();
        debug!(%symbol_id, %client_id, "subscribe");
        self.subscribers
            .entry(symbol_id)
            .or_default()
            .insert(client_id);
    }

    pub fn unsubscribe(&self, symbol_id: SymbolId, client_id: &str) {
        if let Some(mut entry) = self.subscribers.get_mut(&symbol_id) {
            entry.remove(client_id);
            if entry.is_empty() {
                drop(entry);
                self.subscribers.remove(&symbol_id);
            }
        }
    }

    pub fn subscriber_count(&self, symbol_id: SymbolId) -> usize {
        self.subscribers
            .get(&symbol_id)
            .map(|s| s.len())
            .unwrap_or(0)
    }

    /// Fan an analysis out to every subscriber of its symbol. One failing
    /// delivery is logged and skipped; the rest still go out. Returns how
    /// many deliveries succeeded.
    pub async fn publish(&self, analysis: ImpactAnalysis) -> usize {
        let symbol_id = analysis.symbol_id;
        let clients: Vec<String> = match self.subscribers.get(&symbol_id) {
            Some(set) => set.iter().cloned().collect(),
            None => return 0,
        };

        let mut delivered = 0;
        for client_id in clients {
            let update = ImpactUpdate {
                symbol_id,
                analysis: analysis.clone(),
            };
            match self.sink.deliver(&client_id, update).await {
                Ok(()) => delivered += 1,
                Err(e) => warn!(%symbol_id, %client_id, error = %e, "notification delivery failed"),
            }
        }
        delivered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use symgraph_core::{symbol_id, ChangeKind, SymbolKind, TrackerError};

    #[derive(Default)]
    struct RecordingSink {
        seen: Mutex<Vec<(String, SymbolId)>>,
        fail_for: Option<String>,
    }

    #[async_trait]
    impl NotificationSink for RecordingSink {
        async fn deliver(&self, client_id: &str, update: ImpactUpdate) -> Result<()> {
            if self.fail_for.as_deref() == Some(client_id) {
                return Err(TrackerError::Delivery("boom".into()));
            }
            self.seen
                .lock()
                .push((client_id.to_string(), update.symbol_id));
            Ok(())
        }
    }

    fn analysis_for(id: SymbolId) -> ImpactAnalysis {
        ImpactAnalysis::empty(id, ChangeKind::Modified)
    }

    #[tokio::test]
    async fn fan_out_reaches_every_subscriber() {
        let sink = Arc::new(RecordingSink::default());
        let manager = SubscriptionManager::new(sink.clone());
        let id = symbol_id("s.py", "s", SymbolKind::Function, 1);
        manager.subscribe(id, "ide-1");
        manager.subscribe(id, "cli-2");

        let delivered = manager.publish(analysis_for(id)).await;
        assert_eq!(delivered, 2);
        assert_eq!(sink.seen.lock().len(), 2);
    }

    #[tokio::test]
    async fn one_failing_client_does_not_block_the_rest() {
        let sink = Arc::new(RecordingSink {
            fail_for: Some("bad".into()),
            ..Default::default()
        });
        let manager = SubscriptionManager::new(sink.clone());
        let id = symbol_id("s.py", "s", SymbolKind::Function, 1);
        manager.subscribe(id, "bad");
        manager.subscribe(id, "good");

        let delivered = manager.publish(analysis_for(id)).await;
        assert_eq!(delivered, 1);
        let seen = sink.seen.lock();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].0, "good");
    }

    #[tokio::test]
    async fn unsubscribe_stops_delivery() {
        let sink = Arc::new(RecordingSink::default());
        let manager = SubscriptionManager::new(sink.clone());
        let id = symbol_id("s.py", "s", SymbolKind::Function, 1);
        manager.subscribe(id, "ide-1");
        manager.unsubscribe(id, "ide-1");
        assert_eq!(manager.subscriber_count(id), 0);
        assert_eq!(manager.publish(analysis_for(id)).await, 0);
    }
}
