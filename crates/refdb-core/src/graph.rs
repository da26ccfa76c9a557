//! Edge store: an insertion-ordered pair list with a hash index for dedup

use crate::model::{is_path_located_in, Edge};
use petgraph::graphmap::DiGraphMap;
use petgraph::visit::{Bfs, Reversed};
use std::collections::{BTreeSet, HashSet};

/// The reference graph, a set of (source, target) pairs.
///
/// Insertion order is kept so that persisted snapshots and query results
/// are deterministic. `index` mirrors `edges` exactly.
#[derive(Clone, Default)]
pub struct ReferenceGraph {
    edges: Vec<Edge>,
    index: HashSet<Edge>,
}

impl std::fmt::Debug for ReferenceGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReferenceGraph")
            .field("edge_count", &self.edges.len())
            .finish()
    }
}

impl ReferenceGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a loaded edge list, dropping duplicate pairs.
    pub fn from_edges(edges: impl IntoIterator<Item = Edge>) -> Self {
        let mut graph = Self::new();
        for edge in edges {
            graph.insert(edge);
        }
        graph
    }

    /// Insert an edge unless an identical one exists. Returns true if inserted.
    pub fn insert(&mut self, edge: Edge) -> bool {
        if self.index.contains(&edge) {
            return false;
        }
        self.index.insert(edge.clone());
        self.edges.push(edge);
        true
    }

    pub fn contains(&self, source: &str, target: &str) -> bool {
        self.index.contains(&Edge::new(source, target))
    }

    /// Total number of edges.
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Edge> {
        self.edges.iter()
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn clear(&mut self) {
        self.edges.clear();
        self.index.clear();
    }

    /// Whether any edge has `path` as its source.
    pub fn has_source(&self, path: &str) -> bool {
        self.edges.iter().any(|e| e.source == path)
    }

    /// Whether any edge touches `path` on either side.
    pub fn mentions(&self, path: &str) -> bool {
        self.edges.iter().any(|e| e.source == path || e.target == path)
    }

    /// Targets referenced by `source`, in insertion order.
    pub fn targets_of(&self, source: &str) -> Vec<String> {
        self.edges
            .iter()
            .filter(|e| e.source == source)
            .map(|e| e.target.clone())
            .collect()
    }

    /// Distinct sources referencing `target`, in first-seen order.
    pub fn sources_of(&self, target: &str) -> Vec<String> {
        let mut seen = HashSet::new();
        self.edges
            .iter()
            .filter(|e| e.target == target)
            .filter(|e| seen.insert(e.source.as_str()))
            .map(|e| e.source.clone())
            .collect()
    }

    /// Remove all edges with the given source. Returns how many were removed.
    pub fn remove_source(&mut self, source: &str) -> usize {
        self.remove_where(|e| e.source == source)
    }

    /// Remove all edges with the given target. Returns how many were removed.
    pub fn remove_target(&mut self, target: &str) -> usize {
        self.remove_where(|e| e.target == target)
    }

    /// Point every edge targeting `old` at `new` instead, in place.
    pub fn retarget(&mut self, old: &str, new: &str) -> usize {
        let mut changed = 0;
        for i in 0..self.edges.len() {
            if self.edges[i].target != old {
                continue;
            }
            let replacement = Edge::new(self.edges[i].source.clone(), new);
            self.replace_at(i, replacement);
            changed += 1;
        }
        self.compact();
        changed
    }

    /// Move every edge sourced at `old` to source `new`.
    ///
    /// The moved edges are appended after the existing ones, then the old
    /// source-keyed entries are removed.
    pub fn rekey_source(&mut self, old: &str, new: &str) -> usize {
        let targets = self.targets_of(old);
        for target in &targets {
            self.insert(Edge::new(new, target.clone()));
        }
        self.remove_source(old);
        targets.len()
    }

    /// Every distinct path (either side) located inside `dir`, in first-seen order.
    pub fn paths_within(&self, dir: &str) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut paths = Vec::new();
        for edge in &self.edges {
            for path in [&edge.source, &edge.target] {
                if is_path_located_in(path, dir) && seen.insert(path.as_str()) {
                    paths.push(path.clone());
                }
            }
        }
        paths
    }

    /// Resources referencing `path`, directly or (if `transitive`) through
    /// chains of references. Sorted, excluding `path` itself.
    pub fn dependents(&self, path: &str, transitive: bool) -> Vec<String> {
        if !transitive {
            let mut direct: Vec<String> = self.sources_of(path);
            direct.retain(|s| s != path);
            direct.sort();
            return direct;
        }

        let mut map: DiGraphMap<&str, ()> = DiGraphMap::new();
        for edge in &self.edges {
            map.add_edge(edge.source.as_str(), edge.target.as_str(), ());
        }
        if !map.contains_node(path) {
            return Vec::new();
        }

        let reversed = Reversed(&map);
        let mut bfs = Bfs::new(reversed, path);
        let mut found = BTreeSet::new();
        while let Some(node) = bfs.next(reversed) {
            if node != path {
                found.insert(node.to_string());
            }
        }
        found.into_iter().collect()
    }

    fn remove_where(&mut self, pred: impl Fn(&Edge) -> bool) -> usize {
        let before = self.edges.len();
        let index = &mut self.index;
        self.edges.retain(|e| {
            if pred(e) {
                index.remove(e);
                false
            } else {
                true
            }
        });
        before - self.edges.len()
    }

    // Replacing can collide with an existing pair; the collision is marked
    // as a tombstone (empty source) and dropped by `compact`.
    fn replace_at(&mut self, i: usize, replacement: Edge) {
        let old = std::mem::replace(&mut self.edges[i], Edge::new("", ""));
        self.index.remove(&old);
        if self.index.insert(replacement.clone()) {
            self.edges[i] = replacement;
        }
    }

    fn compact(&mut self) {
        let index = &self.index;
        self.edges.retain(|e| !e.source.is_empty() || index.contains(e));
    }
}
