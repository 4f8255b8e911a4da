//! Shared geometry primitives for the wayward pathfinding crates.
//!
//! Provides the integer coordinate types used as graph vertices and grid
//! cells ([`Point`], [`Point3`]), the half-open rectangle [`Rect`], and the
//! grid distance functions ([`chebyshev`], [`manhattan`]).

mod geom;

pub use geom::{Point, Point3, Rect, RectIter, chebyshev, manhattan};
