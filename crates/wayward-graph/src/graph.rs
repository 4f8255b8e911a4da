//! The graph container: vertex/edge mutation, views and ordering.

use std::cmp::Ordering as CmpOrdering;
use std::hash::{BuildHasher, Hash, RandomState};

use crate::edge::{Connection, EdgeId, EdgeTable};
use crate::error::{GraphError, Result};
use crate::node::{Node, NodeId, NodeTable};

/// Whether a graph's edges are one-way or symmetric. Fixed at construction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Orientation {
    Directed,
    Undirected,
}

/// A read-only view of one edge: identity, endpoints and weight.
#[derive(Clone, Copy, Debug)]
pub struct EdgeRef<'g, V> {
    pub id: EdgeId,
    pub a: &'g V,
    pub b: &'g V,
    pub weight: f32,
}

/// A weighted graph keyed by hashable vertex values.
///
/// Vertices live in arena slots referenced by integer ids everywhere
/// (adjacency lists, edges, `prev` chains), so no reference cycles arise.
/// Iteration follows insertion order until reordered by
/// [`sort_vertices_by`](Graph::sort_vertices_by) or
/// [`topological_sort`](Graph::topological_sort).
///
/// The hasher parameter `S` lets coordinate specializations plug in a fast
/// deterministic hash (see [`crate::grid`]); the default is the standard
/// `RandomState`.
pub struct Graph<V, S = RandomState> {
    pub(crate) nodes: NodeTable<V, S>,
    pub(crate) edges: EdgeTable,
    orientation: Orientation,
    default_weight: f32,
    runs: u64,
}

impl<V: Eq + Hash + Clone> Graph<V> {
    /// Create an empty directed graph.
    pub fn directed() -> Self {
        Self::directed_with_hasher(RandomState::new())
    }

    /// Create an empty undirected graph.
    pub fn undirected() -> Self {
        Self::undirected_with_hasher(RandomState::new())
    }
}

impl<V: Eq + Hash + Clone, S: BuildHasher> Graph<V, S> {
    /// Create an empty directed graph using the given vertex hasher.
    pub fn directed_with_hasher(hasher: S) -> Self {
        Self::with_orientation(Orientation::Directed, hasher)
    }

    /// Create an empty undirected graph using the given vertex hasher.
    pub fn undirected_with_hasher(hasher: S) -> Self {
        Self::with_orientation(Orientation::Undirected, hasher)
    }

    fn with_orientation(orientation: Orientation, hasher: S) -> Self {
        Self {
            nodes: NodeTable::with_hasher(hasher),
            edges: EdgeTable::new(orientation == Orientation::Directed),
            orientation,
            default_weight: 1.0,
            runs: 0,
        }
    }

    // -----------------------------------------------------------------------
    // Basic queries
    // -----------------------------------------------------------------------

    #[inline]
    pub fn is_directed(&self) -> bool {
        self.orientation == Orientation::Directed
    }

    #[inline]
    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    #[inline]
    pub fn contains_vertex(&self, v: &V) -> bool {
        self.nodes.get(v).is_some()
    }

    /// The weight used by [`add_edge`](Graph::add_edge).
    #[inline]
    pub fn default_weight(&self) -> f32 {
        self.default_weight
    }

    pub fn set_default_weight(&mut self, weight: f32) {
        self.default_weight = weight;
    }

    // -----------------------------------------------------------------------
    // Mutation
    // -----------------------------------------------------------------------

    /// Add a vertex. Returns `true` if it was newly inserted; a duplicate
    /// is a graceful no-op.
    pub fn add_vertex(&mut self, v: V) -> bool {
        self.nodes.put(v).1
    }

    /// Add an edge with the graph's default weight.
    pub fn add_edge(&mut self, u: &V, v: &V) -> Result<EdgeId> {
        self.add_edge_weighted(u, v, self.default_weight)
    }

    /// Add an edge with an explicit weight.
    ///
    /// Fails with [`GraphError::SelfLoop`] when `u == v` and
    /// [`GraphError::NotInGraph`] when either endpoint is absent. If the
    /// edge already exists its weight is updated in place.
    pub fn add_edge_weighted(&mut self, u: &V, v: &V, weight: f32) -> Result<EdgeId> {
        if u == v {
            return Err(GraphError::SelfLoop);
        }
        let a = self.nodes.get(u).ok_or(GraphError::NotInGraph)?;
        let b = self.nodes.get(v).ok_or(GraphError::NotInGraph)?;
        Ok(self.link(a, b, weight))
    }

    /// Add an edge, inserting missing endpoints first.
    pub fn add_edge_auto(&mut self, u: V, v: V, weight: f32) -> Result<EdgeId> {
        if u == v {
            return Err(GraphError::SelfLoop);
        }
        let (a, _) = self.nodes.put(u);
        let (b, _) = self.nodes.put(v);
        Ok(self.link(a, b, weight))
    }

    fn link(&mut self, a: NodeId, b: NodeId, weight: f32) -> EdgeId {
        let (id, created) = self.edges.insert(a, b, weight);
        if created {
            match self.orientation {
                Orientation::Directed => {
                    if let Some(n) = self.nodes.node_mut(a) {
                        n.out.push(id);
                    }
                    if let Some(n) = self.nodes.node_mut(b) {
                        n.inc.push(id);
                    }
                }
                Orientation::Undirected => {
                    // One adjacency list per node serves both directions.
                    if let Some(n) = self.nodes.node_mut(a) {
                        n.out.push(id);
                    }
                    if let Some(n) = self.nodes.node_mut(b) {
                        n.out.push(id);
                    }
                }
            }
        }
        id
    }

    /// Remove the edge between `u` and `v`. Returns whether one existed;
    /// absent endpoints or a missing edge are graceful no-ops.
    pub fn remove_edge(&mut self, u: &V, v: &V) -> bool {
        let (Some(a), Some(b)) = (self.nodes.get(u), self.nodes.get(v)) else {
            return false;
        };
        let Some(id) = self.edges.get(a, b) else {
            return false;
        };
        self.unlink(id);
        true
    }

    fn unlink(&mut self, id: EdgeId) {
        let Some(conn) = self.edges.remove(id) else {
            return;
        };
        for endpoint in [conn.a, conn.b] {
            if let Some(n) = self.nodes.node_mut(endpoint) {
                n.out.retain(|&e| e != id);
                n.inc.retain(|&e| e != id);
            }
        }
    }

    /// Remove a vertex and every incident edge (both directions for
    /// directed graphs). Returns whether the vertex existed.
    pub fn remove_vertex(&mut self, v: &V) -> bool {
        let Some(id) = self.nodes.get(v) else {
            return false;
        };
        let incident: Vec<EdgeId> = match self.nodes.node(id) {
            Some(node) => node.out.iter().chain(node.inc.iter()).copied().collect(),
            None => Vec::new(),
        };
        for eid in incident {
            self.unlink(eid);
        }
        self.nodes.remove(v).is_some()
    }

    /// Remove every vertex matching `pred`. The matching set is snapshotted
    /// before any mutation.
    pub fn remove_vertices_if(&mut self, mut pred: impl FnMut(&V) -> bool) -> usize {
        let matches: Vec<V> = self.nodes.values().filter(|v| pred(v)).cloned().collect();
        let mut removed = 0;
        for v in &matches {
            if self.remove_vertex(v) {
                removed += 1;
            }
        }
        removed
    }

    /// Remove every edge whose `(a, b, weight)` triple matches `pred`. The
    /// matching set is snapshotted before any mutation.
    pub fn remove_edges_if(&mut self, mut pred: impl FnMut(&V, &V, f32) -> bool) -> usize {
        let matches: Vec<EdgeId> = self
            .edges
            .iter()
            .filter_map(|(id, conn)| {
                let a = self.nodes.try_value(conn.a)?;
                let b = self.nodes.try_value(conn.b)?;
                pred(a, b, conn.weight).then_some(id)
            })
            .collect();
        let removed = matches.len();
        for id in matches {
            self.unlink(id);
        }
        removed
    }

    // -----------------------------------------------------------------------
    // Views
    // -----------------------------------------------------------------------

    /// Vertices in iteration order.
    pub fn vertices(&self) -> impl Iterator<Item = &V> {
        self.nodes.values()
    }

    /// All edges in iteration order, exactly one view per undirected pair.
    pub fn edges(&self) -> impl Iterator<Item = EdgeRef<'_, V>> {
        self.edges
            .iter()
            .filter_map(|(id, conn)| self.edge_ref(id, conn))
    }

    fn edge_ref(&self, id: EdgeId, conn: &Connection) -> Option<EdgeRef<'_, V>> {
        Some(EdgeRef {
            id,
            a: self.nodes.try_value(conn.a)?,
            b: self.nodes.try_value(conn.b)?,
            weight: conn.weight,
        })
    }

    /// The edge between `u` and `v`, if present. For undirected graphs both
    /// argument orders find the same edge identity.
    pub fn get_edge(&self, u: &V, v: &V) -> Option<EdgeRef<'_, V>> {
        let a = self.nodes.get(u)?;
        let b = self.nodes.get(v)?;
        let id = self.edges.get(a, b)?;
        self.edge_ref(id, self.edges.conn(id)?)
    }

    /// Edges incident to `v`: outgoing for directed graphs, all incident
    /// for undirected ones.
    pub fn edges_of(&self, v: &V) -> Result<Vec<EdgeRef<'_, V>>> {
        let id = self.nodes.get(v).ok_or(GraphError::NotInGraph)?;
        let node = self.nodes.node(id).ok_or(GraphError::NotInGraph)?;
        Ok(node
            .out
            .iter()
            .filter_map(|&eid| self.edge_ref(eid, self.edges.conn(eid)?))
            .collect())
    }

    pub fn out_degree(&self, v: &V) -> Result<usize> {
        let id = self.nodes.get(v).ok_or(GraphError::NotInGraph)?;
        Ok(self.nodes.node(id).map_or(0, |n| n.out.len()))
    }

    pub fn in_degree(&self, v: &V) -> Result<usize> {
        let id = self.nodes.get(v).ok_or(GraphError::NotInGraph)?;
        Ok(self.nodes.node(id).map_or(0, |n| match self.orientation {
            Orientation::Directed => n.inc.len(),
            Orientation::Undirected => n.out.len(),
        }))
    }

    /// Degree of `v`: out-degree for directed graphs, incident count for
    /// undirected ones (out-degree == in-degree == degree there).
    pub fn degree(&self, v: &V) -> Result<usize> {
        self.out_degree(v)
    }

    /// Position of `v` in the current iteration order.
    pub fn vertex_index(&self, v: &V) -> Option<usize> {
        let id = self.nodes.get(v)?;
        self.nodes.node(id).map(|n| n.index)
    }

    // -----------------------------------------------------------------------
    // Ordering
    // -----------------------------------------------------------------------

    /// Stable reorder of vertex iteration (and traversal) order.
    pub fn sort_vertices_by(&mut self, cmp: impl FnMut(&V, &V) -> CmpOrdering) {
        self.nodes.sort_by(cmp);
    }

    /// Stable reorder of edge iteration order by `(a, b, weight)` triples.
    pub fn sort_edges_by(
        &mut self,
        mut cmp: impl FnMut((&V, &V, f32), (&V, &V, f32)) -> CmpOrdering,
    ) {
        let nodes = &self.nodes;
        self.edges.sort_by(|x, y| {
            match (
                nodes.try_value(x.a),
                nodes.try_value(x.b),
                nodes.try_value(y.a),
                nodes.try_value(y.b),
            ) {
                (Some(xa), Some(xb), Some(ya), Some(yb)) => {
                    cmp((xa, xb, x.weight), (ya, yb, y.weight))
                }
                _ => CmpOrdering::Equal,
            }
        });
    }

    /// Reorder vertices so that every edge (u, v) has u before v.
    ///
    /// Returns `false`, leaving the order untouched, if a cycle prevents a
    /// complete ordering. Undirected graphs only admit an ordering when they
    /// have no edges.
    pub fn topological_sort(&mut self) -> bool {
        match self.orientation {
            Orientation::Undirected => self.edge_count() == 0,
            Orientation::Directed => self.nodes.topological_order(&self.edges),
        }
    }

    // -----------------------------------------------------------------------
    // Internal access for the algorithm modules
    // -----------------------------------------------------------------------

    /// Hand out a fresh run identifier. Monotonic for the graph's lifetime;
    /// the u64 width makes wrap-around unreachable in practice.
    pub(crate) fn new_run(&mut self) -> u64 {
        self.runs += 1;
        self.runs
    }

    pub(crate) fn scratch(&self, id: NodeId) -> Option<&Node<V>> {
        self.nodes.node(id)
    }

    pub(crate) fn scratch_mut(&mut self, id: NodeId) -> Option<&mut Node<V>> {
        self.nodes.node_mut(id)
    }

    /// Successor node ids reachable over one edge (outgoing for directed,
    /// all incident for undirected).
    pub(crate) fn adjacent_out(&self, id: NodeId) -> Vec<NodeId> {
        self.weighted_out(id).into_iter().map(|(t, _)| t).collect()
    }

    /// Like [`adjacent_out`](Graph::adjacent_out), with edge weights.
    pub(crate) fn weighted_out(&self, id: NodeId) -> Vec<(NodeId, f32)> {
        let Some(node) = self.nodes.node(id) else {
            return Vec::new();
        };
        node.out
            .iter()
            .filter_map(|&eid| {
                let conn = self.edges.conn(eid)?;
                let other = if conn.a == id { conn.b } else { conn.a };
                Some((other, conn.weight))
            })
            .collect()
    }

    /// Neighbor ids ignoring edge direction, for weak connectivity.
    pub(crate) fn adjacent_all(&self, id: NodeId) -> Vec<NodeId> {
        let Some(node) = self.nodes.node(id) else {
            return Vec::new();
        };
        node.out
            .iter()
            .chain(node.inc.iter())
            .filter_map(|&eid| {
                let conn = self.edges.conn(eid)?;
                Some(if conn.a == id { conn.b } else { conn.a })
            })
            .collect()
    }
}

/// Two graphs are equal when their orientations match and their ordered
/// vertex and edge-triple sequences are value-equal.
impl<V: Eq + Hash + Clone, S: BuildHasher> PartialEq for Graph<V, S> {
    fn eq(&self, other: &Self) -> bool {
        if self.orientation != other.orientation
            || self.vertex_count() != other.vertex_count()
            || self.edge_count() != other.edge_count()
        {
            return false;
        }
        if !self.vertices().eq(other.vertices()) {
            return false;
        }
        self.edges()
            .zip(other.edges())
            .all(|(x, y)| x.a == y.a && x.b == y.b && x.weight == y.weight)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_vertex_is_idempotent() {
        let mut g: Graph<i32> = Graph::directed();
        assert!(g.add_vertex(1));
        assert!(!g.add_vertex(1));
        assert_eq!(g.vertex_count(), 1);
    }

    #[test]
    fn directed_edges_are_asymmetric() {
        let mut g: Graph<i32> = Graph::directed();
        g.add_vertex(1);
        g.add_vertex(2);
        g.add_edge_weighted(&1, &2, 4.0).unwrap();
        assert_eq!(g.get_edge(&1, &2).map(|e| e.weight), Some(4.0));
        assert!(g.get_edge(&2, &1).is_none());
    }

    #[test]
    fn undirected_edge_identity_is_shared() {
        let mut g: Graph<i32> = Graph::undirected();
        g.add_vertex(1);
        g.add_vertex(2);
        let id = g.add_edge_weighted(&1, &2, 2.5).unwrap();
        let fwd = g.get_edge(&1, &2).map(|e| e.id);
        let rev = g.get_edge(&2, &1).map(|e| e.id);
        assert_eq!(fwd, Some(id));
        assert_eq!(fwd, rev);

        assert!(g.remove_edge(&1, &2));
        assert!(g.get_edge(&2, &1).is_none());
    }

    #[test]
    fn re_adding_edge_updates_weight() {
        let mut g: Graph<i32> = Graph::directed();
        g.add_vertex(1);
        g.add_vertex(2);
        g.add_edge_weighted(&1, &2, 1.0).unwrap();
        g.add_edge_weighted(&1, &2, 9.0).unwrap();
        assert_eq!(g.edge_count(), 1);
        assert_eq!(g.get_edge(&1, &2).map(|e| e.weight), Some(9.0));
    }

    #[test]
    fn self_loops_and_missing_endpoints_error() {
        let mut g: Graph<i32> = Graph::directed();
        g.add_vertex(1);
        assert_eq!(g.add_edge(&1, &1), Err(GraphError::SelfLoop));
        assert_eq!(g.add_edge(&1, &2), Err(GraphError::NotInGraph));
        assert_eq!(g.edges_of(&2).unwrap_err(), GraphError::NotInGraph);
    }

    #[test]
    fn add_edge_auto_inserts_endpoints() {
        let mut g: Graph<i32> = Graph::directed();
        g.add_edge_auto(1, 2, 3.0).unwrap();
        assert_eq!(g.vertex_count(), 2);
        assert_eq!(g.get_edge(&1, &2).map(|e| e.weight), Some(3.0));
        assert_eq!(g.add_edge_auto(5, 5, 1.0), Err(GraphError::SelfLoop));
    }

    #[test]
    fn remove_vertex_cascades_both_directions() {
        let mut g: Graph<i32> = Graph::directed();
        for v in 1..=3 {
            g.add_vertex(v);
        }
        g.add_edge(&1, &2).unwrap();
        g.add_edge(&3, &2).unwrap();
        g.add_edge(&2, &1).unwrap();
        assert!(g.remove_vertex(&2));
        assert_eq!(g.edge_count(), 0);
        assert_eq!(g.vertex_count(), 2);
        assert_eq!(g.out_degree(&1), Ok(0));
        assert_eq!(g.out_degree(&3), Ok(0));
    }

    #[test]
    fn bulk_removal_snapshots_matches() {
        let mut g: Graph<i32> = Graph::undirected();
        for v in 0..6 {
            g.add_vertex(v);
        }
        for v in 0..5 {
            g.add_edge(&v, &(v + 1)).unwrap();
        }
        let removed = g.remove_vertices_if(|&v| v % 2 == 0);
        assert_eq!(removed, 3);
        assert_eq!(g.vertex_count(), 3);
        assert_eq!(g.edge_count(), 0);

        let mut h: Graph<i32> = Graph::undirected();
        for v in 0..4 {
            h.add_vertex(v);
        }
        h.add_edge_weighted(&0, &1, 1.0).unwrap();
        h.add_edge_weighted(&1, &2, 5.0).unwrap();
        h.add_edge_weighted(&2, &3, 7.0).unwrap();
        assert_eq!(h.remove_edges_if(|_, _, w| w > 2.0), 2);
        assert_eq!(h.edge_count(), 1);
    }

    #[test]
    fn undirected_degree_counts_both_sides() {
        let mut g: Graph<i32> = Graph::undirected();
        for v in 1..=3 {
            g.add_vertex(v);
        }
        g.add_edge(&1, &2).unwrap();
        g.add_edge(&3, &1).unwrap();
        assert_eq!(g.degree(&1), Ok(2));
        assert_eq!(g.in_degree(&1), Ok(2));
        assert_eq!(g.edges().count(), 2);
    }

    #[test]
    fn sort_vertices_changes_iteration_order() {
        let mut g: Graph<i32> = Graph::directed();
        for v in [3, 1, 2] {
            g.add_vertex(v);
        }
        g.sort_vertices_by(|a, b| a.cmp(b));
        assert_eq!(g.vertices().copied().collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(g.vertex_index(&1), Some(0));
        assert_eq!(g.vertex_index(&3), Some(2));
    }

    #[test]
    fn sort_edges_by_weight() {
        let mut g: Graph<i32> = Graph::directed();
        for v in 1..=3 {
            g.add_vertex(v);
        }
        g.add_edge_weighted(&1, &2, 9.0).unwrap();
        g.add_edge_weighted(&2, &3, 1.0).unwrap();
        g.sort_edges_by(|x, y| x.2.total_cmp(&y.2));
        let weights: Vec<f32> = g.edges().map(|e| e.weight).collect();
        assert_eq!(weights, vec![1.0, 9.0]);
    }

    #[test]
    fn round_trip_rebuild_is_equal() {
        let mut g: Graph<&'static str> = Graph::undirected();
        for v in ["a", "b", "c", "d"] {
            g.add_vertex(v);
        }
        g.add_edge_weighted(&"a", &"b", 1.0).unwrap();
        g.add_edge_weighted(&"b", &"c", 2.0).unwrap();
        g.add_edge_weighted(&"c", &"d", 3.5).unwrap();

        let vertices: Vec<_> = g.vertices().copied().collect();
        let triples: Vec<(&str, &str, f32)> =
            g.edges().map(|e| (*e.a, *e.b, e.weight)).collect();

        let mut h: Graph<&'static str> = Graph::undirected();
        for v in vertices {
            h.add_vertex(v);
        }
        for (a, b, w) in triples {
            h.add_edge_weighted(&a, &b, w).unwrap();
        }
        assert!(g == h);

        // Any divergence breaks equality.
        h.add_edge_weighted(&"a", &"d", 1.0).unwrap();
        assert!(g != h);
    }

    #[test]
    fn default_weight_applies() {
        let mut g: Graph<i32> = Graph::directed();
        g.add_vertex(1);
        g.add_vertex(2);
        g.set_default_weight(7.5);
        g.add_edge(&1, &2).unwrap();
        assert_eq!(g.get_edge(&1, &2).map(|e| e.weight), Some(7.5));
    }
}
