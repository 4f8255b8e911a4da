//! Generic weighted graphs with run-once search algorithms.
//!
//! This crate provides an arena-backed graph container keyed by arbitrary
//! hashable vertex values, together with the usual search algorithms:
//!
//! - **BFS / DFS** traversal ([`Graph::bfs`], [`Graph::dfs`], [`Traversal`])
//! - **Dijkstra / A\*** shortest paths ([`Graph::dijkstra_path`],
//!   [`Graph::astar_path`], [`ShortestPath`])
//! - **Topological sort** ([`Graph::topological_sort`])
//! - **Cycle detection** ([`Graph::contains_cycle`])
//! - **Connected components** ([`Graph::number_of_components`])
//!
//! Repeated invocations never pay an O(V) reset: each run gets a fresh
//! monotonic run identifier, and per-node scratch state is only trusted when
//! its stamp matches the current run.
//!
//! Grid specializations (integer-coordinate vertices with a multiplicative
//! coordinate hash) live in [`grid`].

mod algo;
mod edge;
mod error;
mod graph;
pub mod grid;
mod node;

pub use algo::{Path, SearchState, ShortestPath, Traversal, TraversalOrder};
pub use edge::EdgeId;
pub use error::{GraphError, Result};
pub use graph::{EdgeRef, Graph, Orientation};
pub use grid::{CoordHashBuilder, CoordHasher, GridGraph, GridGraph3};
pub use node::NodeId;
