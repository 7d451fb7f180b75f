use crate::{DependencyKind, SourceLocation, SymbolId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A directed "source depends on target" relationship.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DependencyEdge {
    pub source: SymbolId,
    pub target: SymbolId,
    pub kind: DependencyKind,
    pub location: SourceLocation,
    /// Propagation weight in [0, 1], fixed per kind.
    pub strength: f64,
    pub is_direct: bool,
    pub created_at: DateTime<Utc>,
    pub last_accessed: DateTime<Utc>,
}

impl DependencyEdge {
    pub fn new(
        source: SymbolId,
        target: SymbolId,
        kind: DependencyKind,
        location: SourceLocation,
    ) -> Self {
        let now = Utc::now();
        Self {
            source,
            target,
            kind,
            location,
            strength: kind.strength(),
            is_direct: true,
            created_at: now,
            last_accessed: now,
        }
    }

    pub fn with_indirect(mut self) -> Self {
        self.is_direct = false;
        self
    }

    /// Refresh the access timestamp; called when the edge is re-reported.
    pub fn touch(&mut self) {
        self.last_accessed = Utc::now();
    }

    /// Re-key the edge onto a new kind, recomputing its strength.
    pub fn rekind(&mut self, kind: DependencyKind) {
        self.kind = kind;
        self.strength = kind.strength();
        self.touch();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol_id;
    use crate::SymbolKind;

    #[test]
    fn strength_follows_kind() {
        let a = symbol_id("a.py", "a", SymbolKind::Function, 1);
        let b = symbol_id("b.py", "b", SymbolKind::Function, 1);
        let e = DependencyEdge::new(
            a,
            b,
            DependencyKind::Inheritance,
            SourceLocation::new("a.py", 1, 0),
        );
        assert_eq!(e.strength, 1.0);
        let mut e = e;
        e.rekind(DependencyKind::Annotation);
        assert_eq!(e.strength, 0.3);
    }
}
