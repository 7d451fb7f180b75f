use crate::store::GraphState;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use symgraph_core::{ChangeKind, DependencyKind, ImpactWeights, SymbolId};

/// Blast radius of a (proposed or observed) change to one symbol.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImpactAnalysis {
    pub symbol_id: SymbolId,
    pub change_kind: ChangeKind,
    /// Dependents one hop away over the reverse adjacency.
    pub directly_affected: Vec<SymbolId>,
    /// Dependents reached at hop 2 and beyond, up to the depth bound.
    pub indirectly_affected: Vec<SymbolId>,
    /// The subset of direct dependents that would stop working.
    pub breaking_changes: Vec<SymbolId>,
    pub impact_score: f64,
    /// BFS depth actually explored.
    pub depth_reached: usize,
    /// True when the depth bound cut the traversal short.
    pub truncated: bool,
    pub suggestions: Vec<String>,
    pub warnings: Vec<String>,
}

impl ImpactAnalysis {
    /// The empty result an unknown symbol yields: the graph is a best-effort
    /// derived index, so a stale id is an answer, not an error.
    pub(crate) fn empty(symbol_id: SymbolId, change_kind: ChangeKind) -> Self {
        Self {
            symbol_id,
            change_kind,
            directly_affected: Vec::new(),
            indirectly_affected: Vec::new(),
            breaking_changes: Vec::new(),
            impact_score: 0.0,
            depth_reached: 0,
            truncated: false,
            suggestions: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn total_affected(&self) -> usize {
        self.directly_affected.len() + self.indirectly_affected.len()
    }
}

/// Layered BFS over the reverse adjacency, bounded by `max_depth` with a
/// global visited set so dense graphs stay cheap.
pub(crate) fn analyze(
    state: &GraphState,
    weights: &ImpactWeights,
    max_depth: usize,
    symbol_id: SymbolId,
    change_kind: ChangeKind,
) -> ImpactAnalysis {
    let node = match state.symbol(symbol_id) {
        Some(n) => n,
        None => return ImpactAnalysis::empty(symbol_id, change_kind),
    };

    let mut visited: HashSet<SymbolId> = HashSet::new();
    visited.insert(symbol_id);

    let mut frontier: Vec<SymbolId> = state
        .dependents_of(symbol_id)
        .into_iter()
        .filter(|d| visited.insert(*d))
        .collect();
    let directly_affected = frontier.clone();

    let mut indirectly_affected: Vec<SymbolId> = Vec::new();
    let mut depth_reached = if frontier.is_empty() { 0 } else { 1 };

    while !frontier.is_empty() && depth_reached < max_depth {
        let mut next: Vec<SymbolId> = Vec::new();
        for &id in &frontier {
            for dep in state.dependents_of(id) {
                if visited.insert(dep) {
                    next.push(dep);
                }
            }
        }
        if next.is_empty() {
            break;
        }
        depth_reached += 1;
        indirectly_affected.extend(next.iter().copied());
        frontier = next;
    }

    // A non-empty unexplored layer past the bound means the result is partial.
    let truncated = depth_reached >= max_depth
        && frontier.iter().any(|&id| {
            state
                .dependents_of(id)
                .into_iter()
                .any(|d| !visited.contains(&d))
        });

    let breaking_changes = classify_breaking(state, symbol_id, change_kind, &directly_affected);

    let base = directly_affected.len() as f64 * weights.direct
        + indirectly_affected.len() as f64 * weights.indirect
        + breaking_changes.len() as f64 * weights.breaking;
    let visibility = if node.is_public {
        weights.public_boost
    } else {
        1.0
    };
    let impact_score = (base * node.kind.impact_multiplier() * visibility).min(weights.score_cap);

    let mut analysis = ImpactAnalysis {
        symbol_id,
        change_kind,
        directly_affected,
        indirectly_affected,
        breaking_changes,
        impact_score,
        depth_reached,
        truncated,
        suggestions: Vec::new(),
        warnings: Vec::new(),
    };
    annotate(state, &mut analysis);
    analysis
}

/// Which direct dependents stop working under this change kind. A move only
/// breaks dependents bound to the symbol's path (imports); deletions and
/// signature changes break every direct dependent.
fn classify_breaking(
    state: &GraphState,
    symbol_id: SymbolId,
    change_kind: ChangeKind,
    direct: &[SymbolId],
) -> Vec<SymbolId> {
    match change_kind {
        ChangeKind::Deleted | ChangeKind::SignatureChanged => direct.to_vec(),
        ChangeKind::Moved => direct
            .iter()
            .copied()
            .filter(|&dep| {
                state
                    .edge(dep, symbol_id)
                    .map(|e| e.kind == DependencyKind::Import)
                    .unwrap_or(false)
            })
            .collect(),
        ChangeKind::Added | ChangeKind::Modified => Vec::new(),
    }
}

/// Threshold-driven heuristics, not machine-learned.
fn annotate(state: &GraphState, analysis: &mut ImpactAnalysis) {
    let total = analysis.total_affected();
    if total > 10 {
        analysis.suggestions.push(format!(
            "{} symbols are affected; consider batch refactoring tooling before applying this change",
            total
        ));
    }
    if let Some(node) = state.symbol(analysis.symbol_id) {
        if node.is_public && node.is_exported {
            analysis
                .suggestions
                .push("symbol is public and exported; update documentation and changelog".into());
        }
    }
    if !analysis.breaking_changes.is_empty() {
        analysis.warnings.push(format!(
            "{} direct dependents would break",
            analysis.breaking_changes.len()
        ));
    }
    if analysis.truncated {
        analysis.warnings.push(format!(
            "analysis truncated at depth {}; the real blast radius may be larger",
            analysis.depth_reached
        ));
    }
}
