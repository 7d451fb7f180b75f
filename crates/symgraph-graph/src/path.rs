use crate::store::GraphState;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};
use symgraph_core::{DependencyKind, SymbolId};

/// A shortest dependency chain from one symbol to another.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DependencyPath {
    /// Symbols along the path, source first.
    pub symbols: Vec<SymbolId>,
    /// Edge kinds traversed; `edge_kinds[i]` connects `symbols[i]` to
    /// `symbols[i + 1]`.
    pub edge_kinds: Vec<DependencyKind>,
    /// Product of per-edge strengths. Multiplicative on purpose: one weak
    /// link dominates the whole chain's confidence.
    pub strength: f64,
    pub length: usize,
    /// Defensive duplicate check; the visited-set discipline should make a
    /// cyclic path structurally impossible.
    pub is_cyclic: bool,
}

/// BFS over the forward adjacency. The first time `target` is dequeued the
/// hop count is minimal, so the reconstructed path has minimum edge count
/// among all paths in the current graph.
pub(crate) fn find_path(
    state: &GraphState,
    max_depth: usize,
    source: SymbolId,
    target: SymbolId,
) -> Option<DependencyPath> {
    if !state.contains(source) || !state.contains(target) {
        return None;
    }
    if source == target {
        return Some(build_path(state, vec![source]));
    }

    let mut visited: HashSet<SymbolId> = HashSet::new();
    let mut predecessor: HashMap<SymbolId, SymbolId> = HashMap::new();
    let mut queue: VecDeque<(SymbolId, usize)> = VecDeque::new();
    visited.insert(source);
    queue.push_back((source, 0));

    while let Some((current, depth)) = queue.pop_front() {
        if depth >= max_depth {
            continue;
        }
        for next in state.dependencies_of(current) {
            if !visited.insert(next) {
                continue;
            }
            predecessor.insert(next, current);
            if next == target {
                let mut path = vec![target];
                let mut cursor = target;
                while let Some(&prev) = predecessor.get(&cursor) {
                    path.push(prev);
                    cursor = prev;
                }
                path.reverse();
                return Some(build_path(state, path));
            }
            queue.push_back((next, depth + 1));
        }
    }
    None
}

fn build_path(state: &GraphState, symbols: Vec<SymbolId>) -> DependencyPath {
    let mut edge_kinds = Vec::with_capacity(symbols.len().saturating_sub(1));
    let mut strength = 1.0;
    for pair in symbols.windows(2) {
        let kind = state
            .edge(pair[0], pair[1])
            .map(|e| {
                strength *= e.strength;
                e.kind
            })
            .unwrap_or_default();
        edge_kinds.push(kind);
    }

    let mut seen = HashSet::new();
    let is_cyclic = symbols.iter().any(|id| !seen.insert(*id));

    DependencyPath {
        length: symbols.len().saturating_sub(1),
        symbols,
        edge_kinds,
        strength,
        is_cyclic,
    }
}
