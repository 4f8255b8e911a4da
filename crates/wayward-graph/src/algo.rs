//! Run-once search algorithms over a [`Graph`].
//!
//! Every invocation requests a fresh run identifier from the graph and
//! initializes per-node scratch lazily on first touch, so consecutive
//! searches never pay an O(V) reset.
//!
//! The priority searches and traversals are steppable: construct a
//! [`Traversal`] or [`ShortestPath`], then call `update` once per unit of
//! work until [`SearchState::Finished`]. The one-shot wrappers on [`Graph`]
//! drive the same machinery to completion.

use std::collections::{BinaryHeap, VecDeque};
use std::hash::{BuildHasher, Hash};

use crate::error::{GraphError, Result};
use crate::graph::Graph;
use crate::node::NodeId;

/// Lifecycle of a steppable search instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SearchState {
    Created,
    Running,
    Finished,
}

/// Frontier discipline for [`Traversal`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TraversalOrder {
    /// Queue frontier: breadth-first.
    Breadth,
    /// Stack frontier: depth-first.
    Depth,
}

/// A reconstructed path: vertex sequence plus accumulated edge-weight cost.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Path<V> {
    pub steps: Vec<V>,
    pub cost: f32,
}

// ---------------------------------------------------------------------------
// Traversal (BFS / DFS)
// ---------------------------------------------------------------------------

/// Steppable breadth-first or depth-first traversal.
///
/// Visits every vertex reachable from the start exactly once per run. The
/// graph must not be mutated or searched by another algorithm between
/// `update` calls.
pub struct Traversal {
    order: TraversalOrder,
    run: u64,
    frontier: VecDeque<NodeId>,
    state: SearchState,
}

impl Traversal {
    #[inline]
    pub fn state(&self) -> SearchState {
        self.state
    }

    #[inline]
    pub fn is_finished(&self) -> bool {
        self.state == SearchState::Finished
    }

    /// Visit one vertex, enqueueing its unvisited successors. Returns the
    /// visited vertex, or `None` once the traversal is finished.
    pub fn update<'g, V, S>(&mut self, g: &'g mut Graph<V, S>) -> Option<&'g V>
    where
        V: Eq + Hash + Clone,
        S: BuildHasher,
    {
        if self.state == SearchState::Finished {
            return None;
        }
        self.state = SearchState::Running;

        let popped = match self.order {
            TraversalOrder::Breadth => self.frontier.pop_front(),
            TraversalOrder::Depth => self.frontier.pop_back(),
        };
        let Some(id) = popped else {
            self.state = SearchState::Finished;
            return None;
        };

        for t in g.adjacent_out(id) {
            if let Some(n) = g.scratch_mut(t) {
                n.refresh(self.run);
                if !n.processed {
                    n.processed = true;
                    self.frontier.push_back(t);
                }
            }
        }
        if self.frontier.is_empty() {
            self.state = SearchState::Finished;
        }
        g.nodes.try_value(id)
    }
}

// ---------------------------------------------------------------------------
// Dijkstra / A*
// ---------------------------------------------------------------------------

/// Heap entry ordered by `f`, reversed so the max-heap pops the smallest
/// estimate first.
struct HeapEntry {
    id: NodeId,
    f: f32,
}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.f == other.f && self.id == other.id
    }
}

impl Eq for HeapEntry {}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        other
            .f
            .total_cmp(&self.f)
            .then_with(|| other.id.0.cmp(&self.id.0))
    }
}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

fn zero_estimate<V>(_: &V, _: &V) -> f32 {
    0.0
}

/// Steppable Dijkstra / A* shortest-path search.
///
/// Requires non-negative edge weights; negative weights give unspecified
/// distances but cannot loop forever, because a node settled once is final.
/// The heuristic must be admissible for optimal results; no check is made.
pub struct ShortestPath<V, H = fn(&V, &V) -> f32> {
    run: u64,
    goal: NodeId,
    goal_value: V,
    heap: BinaryHeap<HeapEntry>,
    heuristic: H,
    state: SearchState,
    found: bool,
}

impl<V, H> ShortestPath<V, H>
where
    V: Eq + Hash + Clone,
    H: FnMut(&V, &V) -> f32,
{
    #[inline]
    pub fn state(&self) -> SearchState {
        self.state
    }

    #[inline]
    pub fn is_finished(&self) -> bool {
        self.state == SearchState::Finished
    }

    /// Settle one node and relax its out-edges. Returns the new state.
    pub fn update<S: BuildHasher>(&mut self, g: &mut Graph<V, S>) -> SearchState {
        if self.state == SearchState::Finished {
            return self.state;
        }
        self.state = SearchState::Running;

        loop {
            let Some(entry) = self.heap.pop() else {
                self.state = SearchState::Finished;
                return self.state;
            };
            let id = entry.id;

            let dist = {
                let Some(node) = g.scratch_mut(id) else {
                    continue;
                };
                // Stale heap entries from earlier relaxations are skipped.
                if node.last_run != self.run || node.processed {
                    continue;
                }
                node.processed = true;
                node.distance
            };

            if id == self.goal {
                self.found = true;
                self.state = SearchState::Finished;
                return self.state;
            }

            for (t, weight) in g.weighted_out(id) {
                let tentative = dist + weight;
                let Some(value) = g.nodes.try_value(t).cloned() else {
                    continue;
                };
                let estimate = (self.heuristic)(&value, &self.goal_value);
                let Some(n) = g.scratch_mut(t) else {
                    continue;
                };
                n.refresh(self.run);
                if n.processed || tentative >= n.distance {
                    continue;
                }
                n.distance = tentative;
                n.estimate = estimate;
                n.prev = Some(id);
                self.heap.push(HeapEntry {
                    id: t,
                    f: tentative + estimate,
                });
            }
            return self.state;
        }
    }

    /// Drive the search to completion.
    pub fn run_to_end<S: BuildHasher>(&mut self, g: &mut Graph<V, S>) {
        while self.update(g) != SearchState::Finished {}
    }

    /// Reconstruct the path by walking `prev` links from the goal, reversing
    /// into start→goal order. `None` when the goal was not reached.
    pub fn path<S: BuildHasher>(&self, g: &Graph<V, S>) -> Option<Path<V>> {
        if !self.found {
            return None;
        }
        let cost = g.scratch(self.goal)?.distance;
        let mut steps = Vec::new();
        let mut cur = Some(self.goal);
        while let Some(id) = cur {
            let node = g.scratch(id)?;
            if node.last_run != self.run {
                return None;
            }
            steps.push(node.value.clone());
            cur = node.prev;
        }
        steps.reverse();
        Some(Path { steps, cost })
    }
}

// ---------------------------------------------------------------------------
// Graph entry points
// ---------------------------------------------------------------------------

impl<V: Eq + Hash + Clone, S: BuildHasher> Graph<V, S> {
    /// Begin a steppable traversal from `start`.
    pub fn traversal(&mut self, order: TraversalOrder, start: &V) -> Result<Traversal> {
        let id = self.nodes.get(start).ok_or(GraphError::NotInGraph)?;
        let run = self.new_run();
        if let Some(n) = self.scratch_mut(id) {
            n.refresh(run);
            n.processed = true;
        }
        Ok(Traversal {
            order,
            run,
            frontier: VecDeque::from([id]),
            state: SearchState::Created,
        })
    }

    /// Breadth-first traversal from `start`, invoking `visit` per vertex.
    pub fn bfs(&mut self, start: &V, mut visit: impl FnMut(&V)) -> Result<()> {
        let mut t = self.traversal(TraversalOrder::Breadth, start)?;
        while let Some(v) = t.update(self) {
            visit(v);
        }
        Ok(())
    }

    /// Depth-first traversal from `start`, invoking `visit` per vertex.
    pub fn dfs(&mut self, start: &V, mut visit: impl FnMut(&V)) -> Result<()> {
        let mut t = self.traversal(TraversalOrder::Depth, start)?;
        while let Some(v) = t.update(self) {
            visit(v);
        }
        Ok(())
    }

    fn shortest_path_search<H: FnMut(&V, &V) -> f32>(
        &mut self,
        start: &V,
        goal: &V,
        mut heuristic: H,
    ) -> Result<ShortestPath<V, H>> {
        let s = self.nodes.get(start).ok_or(GraphError::NotInGraph)?;
        let t = self.nodes.get(goal).ok_or(GraphError::NotInGraph)?;
        let run = self.new_run();
        let estimate = heuristic(start, goal);
        if let Some(n) = self.scratch_mut(s) {
            n.refresh(run);
            n.distance = 0.0;
            n.estimate = estimate;
        }
        let mut heap = BinaryHeap::new();
        heap.push(HeapEntry { id: s, f: estimate });
        Ok(ShortestPath {
            run,
            goal: t,
            goal_value: goal.clone(),
            heap,
            heuristic,
            state: SearchState::Created,
            found: false,
        })
    }

    /// Begin a steppable Dijkstra search.
    pub fn dijkstra_search(
        &mut self,
        start: &V,
        goal: &V,
    ) -> Result<ShortestPath<V, fn(&V, &V) -> f32>> {
        self.shortest_path_search(start, goal, zero_estimate)
    }

    /// Begin a steppable A* search with the given heuristic.
    pub fn astar_search<H: FnMut(&V, &V) -> f32>(
        &mut self,
        start: &V,
        goal: &V,
        heuristic: H,
    ) -> Result<ShortestPath<V, H>> {
        self.shortest_path_search(start, goal, heuristic)
    }

    /// Shortest path by edge weight. `Ok(None)` when the goal is
    /// unreachable — a legitimate outcome, not an error.
    pub fn dijkstra_path(&mut self, start: &V, goal: &V) -> Result<Option<Path<V>>> {
        let mut search = self.dijkstra_search(start, goal)?;
        search.run_to_end(self);
        Ok(search.path(self))
    }

    /// Shortest path guided by an admissible heuristic.
    pub fn astar_path(
        &mut self,
        start: &V,
        goal: &V,
        heuristic: impl FnMut(&V, &V) -> f32,
    ) -> Result<Option<Path<V>>> {
        let mut search = self.astar_search(start, goal, heuristic)?;
        search.run_to_end(self);
        Ok(search.path(self))
    }

    /// Count weakly connected components via repeated traversal.
    pub fn number_of_components(&mut self) -> usize {
        let run = self.new_run();
        let order: Vec<NodeId> = self.nodes.order().to_vec();
        let mut components = 0;
        let mut stack = Vec::new();

        for start in order {
            let visited = self.scratch(start).is_some_and(|n| n.visited(run));
            if visited {
                continue;
            }
            components += 1;
            if let Some(n) = self.scratch_mut(start) {
                n.refresh(run);
                n.processed = true;
            }
            stack.push(start);
            while let Some(id) = stack.pop() {
                for t in self.adjacent_all(id) {
                    if let Some(n) = self.scratch_mut(t) {
                        n.refresh(run);
                        if !n.processed {
                            n.processed = true;
                            stack.push(t);
                        }
                    }
                }
            }
        }
        components
    }

    /// Whether every vertex is reachable from every other, ignoring edge
    /// direction. The empty graph is considered connected.
    pub fn is_connected(&mut self) -> bool {
        self.number_of_components() <= 1
    }

    /// Whether the graph contains a cycle.
    ///
    /// A graph with fewer than 3 vertices or edges cannot contain one (no
    /// self-loops, no duplicate edges). For undirected graphs the edge back
    /// to the immediate parent is not a cycle.
    pub fn contains_cycle(&mut self) -> bool {
        if self.vertex_count() < 3 || self.edge_count() < 3 {
            return false;
        }
        let run = self.new_run();
        let directed = self.is_directed();
        let order: Vec<NodeId> = self.nodes.order().to_vec();

        struct Frame {
            id: NodeId,
            parent: Option<NodeId>,
            neighbors: Vec<NodeId>,
            next: usize,
        }

        let mut frames: Vec<Frame> = Vec::new();
        for start in order {
            let visited = self.scratch(start).is_some_and(|n| n.visited(run));
            if visited {
                continue;
            }
            if let Some(n) = self.scratch_mut(start) {
                n.refresh(run);
                n.processed = true;
                n.on_stack = true;
            }
            frames.push(Frame {
                id: start,
                parent: None,
                neighbors: self.adjacent_out(start),
                next: 0,
            });

            while let Some(frame) = frames.last_mut() {
                if frame.next >= frame.neighbors.len() {
                    let done = frame.id;
                    frames.pop();
                    if let Some(n) = self.scratch_mut(done) {
                        n.on_stack = false;
                    }
                    continue;
                }
                let t = frame.neighbors[frame.next];
                frame.next += 1;
                // An undirected edge back to the parent is not a back-edge.
                if !directed && frame.parent == Some(t) {
                    continue;
                }
                let parent = frame.id;
                let Some(n) = self.scratch_mut(t) else {
                    continue;
                };
                n.refresh(run);
                if n.on_stack {
                    return true;
                }
                if !n.processed {
                    n.processed = true;
                    n.on_stack = true;
                    frames.push(Frame {
                        id: t,
                        parent: Some(parent),
                        neighbors: self.adjacent_out(t),
                        next: 0,
                    });
                }
            }
        }
        false
    }
}
