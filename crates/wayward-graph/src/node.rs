//! The node table: arena slots, value lookup and iteration order.

use std::cmp::Ordering;
use std::collections::{HashMap, VecDeque};
use std::hash::{BuildHasher, Hash};

use crate::edge::{EdgeId, EdgeTable};

/// Opaque handle to a node slot. Stable for the lifetime of the vertex.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) usize);

/// Per-vertex record: the value, adjacency lists and algorithm scratch.
///
/// Scratch fields are only meaningful when `last_run` matches the owning
/// graph's current run identifier (lazy invalidation).
pub(crate) struct Node<V> {
    pub(crate) value: V,
    /// Position in the table's iteration order. Kept correct across
    /// removal, sorting and topological reordering.
    pub(crate) index: usize,
    /// Outgoing edges. For undirected graphs this is the only adjacency
    /// list and holds every incident edge.
    pub(crate) out: Vec<EdgeId>,
    /// Incoming edges. Unused by undirected graphs.
    pub(crate) inc: Vec<EdgeId>,
    // --- algorithm scratch ---
    pub(crate) distance: f32,
    pub(crate) estimate: f32,
    pub(crate) prev: Option<NodeId>,
    pub(crate) processed: bool,
    pub(crate) on_stack: bool,
    pub(crate) last_run: u64,
}

impl<V> Node<V> {
    fn new(value: V, index: usize) -> Self {
        Self {
            value,
            index,
            out: Vec::new(),
            inc: Vec::new(),
            distance: f32::INFINITY,
            estimate: 0.0,
            prev: None,
            processed: false,
            on_stack: false,
            last_run: 0,
        }
    }

    /// Make the scratch fields valid for `run`, clearing them on first touch.
    pub(crate) fn refresh(&mut self, run: u64) {
        if self.last_run != run {
            self.last_run = run;
            self.distance = f32::INFINITY;
            self.estimate = 0.0;
            self.prev = None;
            self.processed = false;
            self.on_stack = false;
        }
    }

    /// Whether this node was visited (processed) during `run`.
    pub(crate) fn visited(&self, run: u64) -> bool {
        self.last_run == run && self.processed
    }
}

/// Arena-backed vertex store.
///
/// Nodes live in slab slots so that [`NodeId`]s held by edges and algorithm
/// state stay valid across unrelated removals; a separate `order` vector
/// tracks insertion (or sorted) iteration order.
pub(crate) struct NodeTable<V, S> {
    slots: Vec<Option<Node<V>>>,
    free: Vec<usize>,
    lookup: HashMap<V, NodeId, S>,
    order: Vec<NodeId>,
}

impl<V: Eq + Hash + Clone, S: BuildHasher> NodeTable<V, S> {
    pub(crate) fn with_hasher(hasher: S) -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            lookup: HashMap::with_hasher(hasher),
            order: Vec::new(),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.order.len()
    }

    /// Insert `v` if absent. Returns the node id and whether it was new;
    /// an existing node is returned untouched.
    pub(crate) fn put(&mut self, v: V) -> (NodeId, bool) {
        if let Some(&id) = self.lookup.get(&v) {
            return (id, false);
        }
        let node = Node::new(v.clone(), self.order.len());
        let id = match self.free.pop() {
            Some(slot) => {
                self.slots[slot] = Some(node);
                NodeId(slot)
            }
            None => {
                self.slots.push(Some(node));
                NodeId(self.slots.len() - 1)
            }
        };
        self.lookup.insert(v, id);
        self.order.push(id);
        (id, true)
    }

    pub(crate) fn get(&self, v: &V) -> Option<NodeId> {
        self.lookup.get(v).copied()
    }

    pub(crate) fn node(&self, id: NodeId) -> Option<&Node<V>> {
        self.slots.get(id.0)?.as_ref()
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Option<&mut Node<V>> {
        self.slots.get_mut(id.0)?.as_mut()
    }

    pub(crate) fn try_value(&self, id: NodeId) -> Option<&V> {
        self.node(id).map(|n| &n.value)
    }

    /// Remove the node for `v`. The caller must have severed its edges.
    pub(crate) fn remove(&mut self, v: &V) -> Option<NodeId> {
        let id = self.lookup.remove(v)?;
        let index = self.slots.get_mut(id.0)?.take()?.index;
        self.free.push(id.0);
        self.order.remove(index);
        self.reindex_from(index);
        Some(id)
    }

    pub(crate) fn order(&self) -> &[NodeId] {
        &self.order
    }

    pub(crate) fn values(&self) -> impl Iterator<Item = &V> {
        self.order.iter().filter_map(|&id| self.try_value(id))
    }

    /// Stable reorder of iteration order by vertex value.
    pub(crate) fn sort_by(&mut self, mut cmp: impl FnMut(&V, &V) -> Ordering) {
        let mut order = std::mem::take(&mut self.order);
        order.sort_by(|&a, &b| match (self.try_value(a), self.try_value(b)) {
            (Some(x), Some(y)) => cmp(x, y),
            _ => Ordering::Equal,
        });
        self.order = order;
        self.reindex_from(0);
    }

    /// Kahn's in-degree elimination over the current iteration order.
    ///
    /// On success the order is rewritten so that for every edge (u, v), u
    /// precedes v, and `true` is returned. If a cycle prevents a complete
    /// ordering the table is left untouched and `false` is returned.
    pub(crate) fn topological_order(&mut self, edges: &EdgeTable) -> bool {
        let n = self.order.len();
        let mut indeg = vec![0usize; self.slots.len()];
        for &id in &self.order {
            if let Some(node) = self.node(id) {
                indeg[id.0] = node.inc.len();
            }
        }

        let mut queue: VecDeque<NodeId> = self
            .order
            .iter()
            .copied()
            .filter(|id| indeg[id.0] == 0)
            .collect();
        let mut new_order = Vec::with_capacity(n);

        while let Some(id) = queue.pop_front() {
            new_order.push(id);
            let Some(node) = self.node(id) else { continue };
            for &eid in &node.out {
                let Some(conn) = edges.conn(eid) else {
                    continue;
                };
                indeg[conn.b.0] -= 1;
                if indeg[conn.b.0] == 0 {
                    queue.push_back(conn.b);
                }
            }
        }

        if new_order.len() != n {
            return false;
        }
        self.order = new_order;
        self.reindex_from(0);
        true
    }

    fn reindex_from(&mut self, from: usize) {
        for i in from..self.order.len() {
            let id = self.order[i];
            if let Some(node) = self.slots[id.0].as_mut() {
                node.index = i;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::hash::RandomState;

    fn table() -> NodeTable<&'static str, RandomState> {
        NodeTable::with_hasher(RandomState::new())
    }

    #[test]
    fn put_is_idempotent() {
        let mut t = table();
        let (a, new) = t.put("a");
        assert!(new);
        let (a2, new2) = t.put("a");
        assert!(!new2);
        assert_eq!(a, a2);
        assert_eq!(t.len(), 1);
    }

    #[test]
    fn remove_compacts_indices() {
        let mut t = table();
        t.put("a");
        let (b, _) = t.put("b");
        let (c, _) = t.put("c");
        assert!(t.remove(&"b").is_some());
        assert_eq!(t.len(), 2);
        // "c" moved up to index 1.
        assert_eq!(t.node(c).map(|n| n.index), Some(1));
        assert!(t.node(b).is_none());
        assert_eq!(t.values().copied().collect::<Vec<_>>(), vec!["a", "c"]);
    }

    #[test]
    fn slots_are_recycled() {
        let mut t = table();
        let (a, _) = t.put("a");
        t.remove(&"a");
        let (b, _) = t.put("b");
        assert_eq!(a, b);
    }

    #[test]
    fn sort_reindexes() {
        let mut t = table();
        t.put("c");
        t.put("a");
        t.put("b");
        t.sort_by(|x, y| x.cmp(y));
        assert_eq!(t.values().copied().collect::<Vec<_>>(), vec!["a", "b", "c"]);
        for (i, &id) in t.order().iter().enumerate() {
            assert_eq!(t.node(id).map(|n| n.index), Some(i));
        }
    }

    #[test]
    fn refresh_clears_stale_scratch() {
        let mut n = Node::new("x", 0);
        n.refresh(1);
        n.distance = 3.0;
        n.processed = true;
        // Same run: untouched.
        n.refresh(1);
        assert_eq!(n.distance, 3.0);
        assert!(n.visited(1));
        // New run: cleared lazily.
        n.refresh(2);
        assert_eq!(n.distance, f32::INFINITY);
        assert!(!n.visited(2));
        assert!(!n.visited(1));
    }
}
