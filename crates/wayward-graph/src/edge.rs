//! The edge table: slab storage, insertion order and pair lookup.

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::node::NodeId;

/// Opaque handle to an edge slot.
///
/// For undirected graphs, `get_edge(u, v)` and `get_edge(v, u)` yield the
/// same `EdgeId`: both orderings resolve to one connection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EdgeId(pub(crate) usize);

/// A weighted connection between two node slots, in insertion orientation.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Connection {
    pub(crate) a: NodeId,
    pub(crate) b: NodeId,
    pub(crate) weight: f32,
}

/// Slab-backed edge store with insertion-ordered iteration.
///
/// `pairs` maps an endpoint pair to its edge; undirected tables canonicalize
/// the key so either lookup order finds the same connection.
pub(crate) struct EdgeTable {
    slots: Vec<Option<Connection>>,
    free: Vec<usize>,
    order: Vec<EdgeId>,
    pairs: HashMap<(usize, usize), EdgeId>,
    directed: bool,
}

impl EdgeTable {
    pub(crate) fn new(directed: bool) -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            order: Vec::new(),
            pairs: HashMap::new(),
            directed,
        }
    }

    fn key(&self, a: NodeId, b: NodeId) -> (usize, usize) {
        if self.directed || a.0 <= b.0 {
            (a.0, b.0)
        } else {
            (b.0, a.0)
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.order.len()
    }

    /// Insert or update the connection between `a` and `b`.
    ///
    /// Returns the edge id and whether a new edge was created. Re-inserting
    /// an existing pair only updates its weight.
    pub(crate) fn insert(&mut self, a: NodeId, b: NodeId, weight: f32) -> (EdgeId, bool) {
        let key = self.key(a, b);
        if let Some(&id) = self.pairs.get(&key) {
            if let Some(conn) = self.slots[id.0].as_mut() {
                conn.weight = weight;
            }
            return (id, false);
        }
        let conn = Connection { a, b, weight };
        let id = match self.free.pop() {
            Some(slot) => {
                self.slots[slot] = Some(conn);
                EdgeId(slot)
            }
            None => {
                self.slots.push(Some(conn));
                EdgeId(self.slots.len() - 1)
            }
        };
        self.pairs.insert(key, id);
        self.order.push(id);
        (id, true)
    }

    pub(crate) fn get(&self, a: NodeId, b: NodeId) -> Option<EdgeId> {
        self.pairs.get(&self.key(a, b)).copied()
    }

    pub(crate) fn conn(&self, id: EdgeId) -> Option<&Connection> {
        self.slots.get(id.0)?.as_ref()
    }

    /// Remove an edge by id, returning its connection record.
    pub(crate) fn remove(&mut self, id: EdgeId) -> Option<Connection> {
        let conn = self.slots.get_mut(id.0)?.take()?;
        self.pairs.remove(&self.key(conn.a, conn.b));
        self.free.push(id.0);
        if let Some(pos) = self.order.iter().position(|&e| e == id) {
            self.order.remove(pos);
        }
        Some(conn)
    }

    /// Insertion-ordered iteration over live edges.
    pub(crate) fn iter(&self) -> impl Iterator<Item = (EdgeId, &Connection)> {
        self.order.iter().filter_map(|&id| Some((id, self.conn(id)?)))
    }

    /// Stable reorder of edge iteration order.
    pub(crate) fn sort_by(&mut self, mut cmp: impl FnMut(&Connection, &Connection) -> Ordering) {
        let mut order = std::mem::take(&mut self.order);
        order.sort_by(|&a, &b| match (self.conn(a), self.conn(b)) {
            (Some(x), Some(y)) => cmp(x, y),
            _ => Ordering::Equal,
        });
        self.order = order;
    }
}
