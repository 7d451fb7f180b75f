use crate::{ChangeId, ChangeKind, ImpactLevel, SymbolId, SymbolNode};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An immutable entry in the change log: what changed, when, and which
/// symbols were found affected at log time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymbolChange {
    pub id: ChangeId,
    pub symbol_id: SymbolId,
    pub kind: ChangeKind,
    pub before: Option<SymbolNode>,
    pub after: Option<SymbolNode>,
    pub file_path: String,
    pub timestamp: DateTime<Utc>,
    pub impact_level: ImpactLevel,
    pub affected_symbols: Vec<SymbolId>,
}

impl SymbolChange {
    pub fn new(
        symbol_id: SymbolId,
        kind: ChangeKind,
        before: Option<SymbolNode>,
        after: Option<SymbolNode>,
        file_path: impl Into<String>,
        affected_symbols: Vec<SymbolId>,
    ) -> Self {
        let impact_level = ImpactLevel::classify(kind, affected_symbols.len());
        Self {
            id: Uuid::new_v4(),
            symbol_id,
            kind,
            before,
            after,
            file_path: file_path.into(),
            timestamp: Utc::now(),
            impact_level,
            affected_symbols,
        }
    }
}
