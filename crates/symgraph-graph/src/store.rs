use crate::changelog::ChangeLog;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use symgraph_core::{DependencyEdge, SymbolId, SymbolNode};

/// Graph state behind the tracker's single writer lock.
pub(crate) type SharedState = Arc<tokio::sync::RwLock<GraphState>>;

/// Answer to a dependency lookup: the symbol, its direct relations, and a
/// bounded expansion of what it depends on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymbolDependencies {
    pub symbol: SymbolNode,
    pub direct_dependencies: Vec<SymbolNode>,
    pub direct_dependents: Vec<SymbolNode>,
    pub dependency_tree: DependencyTreeNode,
}

/// One level of the recursive dependency expansion rooted at `symbol_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyTreeNode {
    pub symbol_id: SymbolId,
    pub children: Vec<DependencyTreeNode>,
}

/// The canonical symbol table and adjacency. Sole owner of graph state;
/// every access goes through the tracker's lock, so methods here are plain
/// synchronous mutations with no interior locking.
///
/// Forward and reverse adjacency are always written together under the same
/// guard — no observer can see an edge present in one direction only.
#[derive(Debug)]
pub(crate) struct GraphState {
    symbols: HashMap<SymbolId, SymbolNode>,
    forward: HashMap<SymbolId, HashSet<SymbolId>>,
    reverse: HashMap<SymbolId, HashSet<SymbolId>>,
    edges: HashMap<(SymbolId, SymbolId), DependencyEdge>,
    file_index: HashMap<String, HashSet<SymbolId>>,
    pub(crate) changes: ChangeLog,
    dirty: VecDeque<SymbolId>,
    dirty_set: HashSet<SymbolId>,
}

impl GraphState {
    pub(crate) fn new(change_log_capacity: usize) -> Self {
        Self {
            symbols: HashMap::new(),
            forward: HashMap::new(),
            reverse: HashMap::new(),
            edges: HashMap::new(),
            file_index: HashMap::new(),
            changes: ChangeLog::new(change_log_capacity),
            dirty: VecDeque::new(),
            dirty_set: HashSet::new(),
        }
    }

    pub(crate) fn contains(&self, id: SymbolId) -> bool {
        self.symbols.contains_key(&id)
    }

    pub(crate) fn symbol(&self, id: SymbolId) -> Option<&SymbolNode> {
        self.symbols.get(&id)
    }

    pub(crate) fn symbol_count(&self) -> usize {
        self.symbols.len()
    }

    pub(crate) fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub(crate) fn edge(&self, source: SymbolId, target: SymbolId) -> Option<&DependencyEdge> {
        self.edges.get(&(source, target))
    }

    /// Upsert a symbol; returns the previous node if one was present.
    pub(crate) fn insert_symbol(&mut self, node: SymbolNode) -> Option<SymbolNode> {
        self.file_index
            .entry(node.location.file_path.clone())
            .or_default()
            .insert(node.id);
        self.symbols.insert(node.id, node)
    }

    /// Remove a symbol and every edge incident to it, in O(degree).
    pub(crate) fn remove_symbol(&mut self, id: SymbolId) -> Option<SymbolNode> {
        let node = self.symbols.remove(&id)?;

        if let Some(targets) = self.forward.remove(&id) {
            for target in targets {
                self.edges.remove(&(id, target));
                if let Some(set) = self.reverse.get_mut(&target) {
                    set.remove(&id);
                    if set.is_empty() {
                        self.reverse.remove(&target);
                    }
                }
            }
        }
        if let Some(sources) = self.reverse.remove(&id) {
            for source in sources {
                self.edges.remove(&(source, id));
                if let Some(set) = self.forward.get_mut(&source) {
                    set.remove(&id);
                    if set.is_empty() {
                        self.forward.remove(&source);
                    }
                }
            }
        }

        if let Some(set) = self.file_index.get_mut(&node.location.file_path) {
            set.remove(&id);
            if set.is_empty() {
                self.file_index.remove(&node.location.file_path);
            }
        }
        Some(node)
    }

    /// Insert an edge into both adjacency directions. Returns true when the
    /// (source, target) pair is new; a re-reported pair refreshes its kind
    /// and access timestamp instead.
    pub(crate) fn insert_edge(&mut self, edge: DependencyEdge) -> bool {
        let key = (edge.source, edge.target);
        if let Some(existing) = self.edges.get_mut(&key) {
            existing.rekind(edge.kind);
            return false;
        }
        self.forward.entry(edge.source).or_default().insert(edge.target);
        self.reverse.entry(edge.target).or_default().insert(edge.source);
        self.edges.insert(key, edge);
        true
    }

    /// Symbols `id` depends on, in stable order.
    pub(crate) fn dependencies_of(&self, id: SymbolId) -> Vec<SymbolId> {
        let mut out: Vec<SymbolId> = self
            .forward
            .get(&id)
            .map(|s| s.iter().copied().collect())
            .unwrap_or_default();
        out.sort_unstable();
        out
    }

    /// Symbols depending on `id`, in stable order.
    pub(crate) fn dependents_of(&self, id: SymbolId) -> Vec<SymbolId> {
        let mut out: Vec<SymbolId> = self
            .reverse
            .get(&id)
            .map(|s| s.iter().copied().collect())
            .unwrap_or_default();
        out.sort_unstable();
        out
    }

    /// Bounded BFS over forward adjacency: can `from` reach `to` within
    /// `max_depth` hops? Used to detect whether a new edge closes a cycle.
    pub(crate) fn can_reach(&self, from: SymbolId, to: SymbolId, max_depth: usize) -> bool {
        if from == to {
            return true;
        }
        let mut visited = HashSet::new();
        let mut queue = VecDeque::new();
        visited.insert(from);
        queue.push_back((from, 0usize));
        while let Some((current, depth)) = queue.pop_front() {
            if depth >= max_depth {
                continue;
            }
            if let Some(neighbors) = self.forward.get(&current) {
                for &next in neighbors {
                    if next == to {
                        return true;
                    }
                    if visited.insert(next) {
                        queue.push_back((next, depth + 1));
                    }
                }
            }
        }
        false
    }

    pub(crate) fn symbols_in_file(&self, file_path: &str) -> Vec<SymbolId> {
        let mut out: Vec<SymbolId> = self
            .file_index
            .get(file_path)
            .map(|s| s.iter().copied().collect())
            .unwrap_or_default();
        out.sort_unstable();
        out
    }

    pub(crate) fn mark_dirty(&mut self, id: SymbolId) {
        if self.dirty_set.insert(id) {
            self.dirty.push_back(id);
        }
    }

    pub(crate) fn drain_dirty(&mut self, max: usize) -> Vec<SymbolId> {
        let n = max.min(self.dirty.len());
        let batch: Vec<SymbolId> = self.dirty.drain(..n).collect();
        for id in &batch {
            self.dirty_set.remove(id);
        }
        batch
    }

    pub(crate) fn dirty_len(&self) -> usize {
        self.dirty.len()
    }

    /// Full dependency report for `id`, expanding the tree to `depth` levels.
    pub(crate) fn symbol_dependencies(
        &self,
        id: SymbolId,
        depth: usize,
    ) -> Option<SymbolDependencies> {
        let symbol = self.symbols.get(&id)?.clone();
        let direct_dependencies = self
            .dependencies_of(id)
            .into_iter()
            .filter_map(|d| self.symbols.get(&d).cloned())
            .collect();
        let direct_dependents = self
            .dependents_of(id)
            .into_iter()
            .filter_map(|d| self.symbols.get(&d).cloned())
            .collect();
        let dependency_tree = self.build_dependency_tree(id, depth, &HashSet::new());
        Some(SymbolDependencies {
            symbol,
            direct_dependencies,
            direct_dependents,
            dependency_tree,
        })
    }

    /// Recursive expansion of forward dependencies. Each sibling branch gets
    /// its own copy of the visited set, so one branch never suppresses
    /// another's traversal; the depth decrement alone guarantees termination
    /// on cyclic graphs.
    fn build_dependency_tree(
        &self,
        id: SymbolId,
        depth: usize,
        visited: &HashSet<SymbolId>,
    ) -> DependencyTreeNode {
        let mut node = DependencyTreeNode {
            symbol_id: id,
            children: Vec::new(),
        };
        if depth == 0 {
            return node;
        }
        let mut on_path = visited.clone();
        on_path.insert(id);
        for dep in self.dependencies_of(id) {
            if on_path.contains(&dep) {
                continue;
            }
            node.children
                .push(self.build_dependency_tree(dep, depth - 1, &on_path));
        }
        node
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use symgraph_core::{DependencyKind, SourceLocation, SymbolKind};

    fn node(name: &str) -> SymbolNode {
        SymbolNode::new(
            name,
            SymbolKind::Function,
            SourceLocation::new("src/lib.py", 1, 0),
        )
    }

    fn edge(a: &SymbolNode, b: &SymbolNode) -> DependencyEdge {
        DependencyEdge::new(
            a.id,
            b.id,
            DependencyKind::FunctionCall,
            SourceLocation::new("src/lib.py", 1, 0),
        )
    }

    fn seeded() -> (GraphState, SymbolNode, SymbolNode, SymbolNode) {
        let mut state = GraphState::new(100);
        let a = node("a");
        let b = node("b");
        let c = node("c");
        for n in [&a, &b, &c] {
            state.insert_symbol(n.clone());
        }
        (state, a, b, c)
    }

    #[test]
    fn edge_appears_in_both_directions() {
        let (mut state, a, b, _) = seeded();
        assert!(state.insert_edge(edge(&a, &b)));
        assert_eq!(state.dependencies_of(a.id), vec![b.id]);
        assert_eq!(state.dependents_of(b.id), vec![a.id]);
        assert!(state.edge(a.id, b.id).is_some());
    }

    #[test]
    fn reinserted_pair_is_an_update_not_a_new_edge() {
        let (mut state, a, b, _) = seeded();
        assert!(state.insert_edge(edge(&a, &b)));
        let mut again = edge(&a, &b);
        again.kind = DependencyKind::Import;
        again.strength = again.kind.strength();
        assert!(!state.insert_edge(again));
        assert_eq!(state.edge_count(), 1);
        assert_eq!(state.edge(a.id, b.id).unwrap().kind, DependencyKind::Import);
    }

    #[test]
    fn removal_cascades_from_both_directions() {
        let (mut state, a, b, c) = seeded();
        state.insert_edge(edge(&a, &b));
        state.insert_edge(edge(&b, &c));
        assert_eq!(state.edge_count(), 2);

        state.remove_symbol(b.id).unwrap();
        assert_eq!(state.edge_count(), 0);
        assert!(state.dependencies_of(a.id).is_empty());
        assert!(state.dependents_of(c.id).is_empty());
        assert!(state.edge(a.id, b.id).is_none());
        assert!(state.edge(b.id, c.id).is_none());
        assert!(state.symbols_in_file("src/lib.py").contains(&a.id));
        assert!(!state.symbols_in_file("src/lib.py").contains(&b.id));
    }

    #[test]
    fn can_reach_is_depth_bounded() {
        let mut state = GraphState::new(100);
        let chain: Vec<SymbolNode> = (0..5u32)
            .map(|i| {
                let n = SymbolNode::new(
                    format!("n{}", i),
                    SymbolKind::Function,
                    SourceLocation::new("chain.py", i, 0),
                );
                state.insert_symbol(n.clone());
                n
            })
            .collect();
        for w in chain.windows(2) {
            state.insert_edge(edge(&w[0], &w[1]));
        }
        assert!(state.can_reach(chain[0].id, chain[4].id, 10));
        assert!(!state.can_reach(chain[0].id, chain[4].id, 3));
        assert!(!state.can_reach(chain[4].id, chain[0].id, 10));
    }

    #[test]
    fn dirty_queue_dedupes_and_drains_fifo() {
        let (mut state, a, b, _) = seeded();
        state.mark_dirty(a.id);
        state.mark_dirty(b.id);
        state.mark_dirty(a.id);
        assert_eq!(state.dirty_len(), 2);
        let batch = state.drain_dirty(1);
        assert_eq!(batch, vec![a.id]);
        assert_eq!(state.drain_dirty(10), vec![b.id]);
        assert_eq!(state.dirty_len(), 0);
    }

    #[test]
    fn sibling_branches_do_not_suppress_each_other() {
        // diamond: r -> x, r -> y, x -> z, y -> z
        let mut state = GraphState::new(100);
        let mk = |name: &str, line: u32| {
            SymbolNode::new(
                name,
                SymbolKind::Function,
                SourceLocation::new("d.py", line, 0),
            )
        };
        let r = mk("r", 1);
        let x = mk("x", 2);
        let y = mk("y", 3);
        let z = mk("z", 4);
        for n in [&r, &x, &y, &z] {
            state.insert_symbol(n.clone());
        }
        state.insert_edge(edge(&r, &x));
        state.insert_edge(edge(&r, &y));
        state.insert_edge(edge(&x, &z));
        state.insert_edge(edge(&y, &z));

        let tree = state.build_dependency_tree(r.id, 2, &HashSet::new());
        assert_eq!(tree.children.len(), 2);
        // z shows up under BOTH x and y: the second branch is not pruned by
        // the first branch's traversal.
        for child in &tree.children {
            assert_eq!(child.children.len(), 1);
            assert_eq!(child.children[0].symbol_id, z.id);
        }
    }

    #[test]
    fn cyclic_tree_terminates_by_depth() {
        let (mut state, a, b, _) = seeded();
        state.insert_edge(edge(&a, &b));
        state.insert_edge(edge(&b, &a));
        let tree = state.build_dependency_tree(a.id, 8, &HashSet::new());
        // a -> b, then b's expansion skips a (on the path), so recursion stops.
        assert_eq!(tree.children.len(), 1);
        assert_eq!(tree.children[0].symbol_id, b.id);
        assert!(tree.children[0].children.is_empty());
    }
}
