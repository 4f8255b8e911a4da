//! Error taxonomy for graph mutation and queries.
//!
//! Only programmer errors surface as [`GraphError`]. Legitimate "not found"
//! outcomes (no such edge, no path) are encoded as `Option`/`bool` results.

use thiserror::Error;

/// A usage error raised by graph operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GraphError {
    /// An operation referenced a vertex that is not present in the graph.
    #[error("vertex is not in the graph")]
    NotInGraph,
    /// An edge between a vertex and itself was requested.
    #[error("self-loop edges are not allowed")]
    SelfLoop,
}

/// Convenience alias for fallible graph operations.
pub type Result<T> = std::result::Result<T, GraphError>;
