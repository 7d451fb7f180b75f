use crate::{symbol_id, SourceLocation, SymbolId, SymbolKind, TrackerError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A named code entity tracked in the graph.
///
/// The symbol's dependency relations are not stored here — they are computed
/// views over the store's adjacency, so a node snapshot can never disagree
/// with the graph it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolNode {
    pub id: SymbolId,
    pub name: String,
    pub kind: SymbolKind,
    pub location: SourceLocation,
    pub scope: Option<String>,
    pub signature: Option<String>,
    pub is_public: bool,
    pub is_exported: bool,
    pub last_modified: DateTime<Utc>,
}

impl SymbolNode {
    pub fn new(name: impl Into<String>, kind: SymbolKind, location: SourceLocation) -> Self {
        let name = name.into();
        let id = symbol_id(&location.file_path, &name, kind, location.line);
        Self {
            id,
            name,
            kind,
            location,
            scope: None,
            signature: None,
            is_public: false,
            is_exported: false,
            last_modified: Utc::now(),
        }
    }

    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    pub fn with_signature(mut self, signature: impl Into<String>) -> Self {
        self.signature = Some(signature.into());
        self
    }

    pub fn with_visibility(mut self, is_public: bool, is_exported: bool) -> Self {
        self.is_public = is_public;
        self.is_exported = is_exported;
        self
    }
}

/// What the external parser reports for one (re)parsed symbol.
///
/// Validated at the ingestion boundary before it is allowed to touch graph
/// state; a malformed descriptor is rejected and logged, never propagated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymbolDescriptor {
    pub name: String,
    pub kind: SymbolKind,
    pub line: u32,
    pub column: u32,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub signature: Option<String>,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default)]
    pub is_exported: bool,
}

impl SymbolDescriptor {
    pub fn new(name: impl Into<String>, kind: SymbolKind, line: u32, column: u32) -> Self {
        Self {
            name: name.into(),
            kind,
            line,
            column,
            scope: None,
            signature: None,
            is_public: false,
            is_exported: false,
        }
    }

    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    pub fn with_signature(mut self, signature: impl Into<String>) -> Self {
        self.signature = Some(signature.into());
        self
    }

    pub fn with_visibility(mut self, is_public: bool, is_exported: bool) -> Self {
        self.is_public = is_public;
        self.is_exported = is_exported;
        self
    }

    pub fn validate(&self, file_path: &str) -> Result<(), TrackerError> {
        if self.name.trim().is_empty() {
            return Err(TrackerError::InvalidDescriptor(
                "symbol name is empty".into(),
            ));
        }
        if file_path.trim().is_empty() {
            return Err(TrackerError::InvalidDescriptor("file path is empty".into()));
        }
        Ok(())
    }

    /// Materialize the descriptor into a node anchored at `file_path`.
    pub fn into_node(self, file_path: &str) -> SymbolNode {
        let location = SourceLocation::new(file_path, self.line, self.column);
        let mut node = SymbolNode::new(self.name, self.kind, location)
            .with_visibility(self.is_public, self.is_exported);
        node.scope = self.scope;
        node.signature = self.signature;
        node
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptor_materializes_with_deterministic_id() {
        let d = SymbolDescriptor::new("login", SymbolKind::Function, 42, 4)
            .with_signature("def login(user, password)")
            .with_visibility(true, true);
        let n1 = d.clone().into_node("src/auth.py");
        let n2 = d.into_node("src/auth.py");
        assert_eq!(n1.id, n2.id);
        assert!(n1.is_public && n1.is_exported);
        assert_eq!(n1.signature.as_deref(), Some("def login(user, password)"));
    }

    #[test]
    fn empty_name_or_path_is_rejected() {
        let d = SymbolDescriptor::new("  ", SymbolKind::Function, 1, 0);
        assert!(d.validate("src/a.py").is_err());
        let d = SymbolDescriptor::new("ok", SymbolKind::Function, 1, 0);
        assert!(d.validate("").is_err());
        assert!(d.validate("src/a.py").is_ok());
    }
}
