//! Dense-grid multi-goal distance fields ("gradient grids") and path
//! extraction for grid-based movement.
//!
//! A [`GradientGrid`] holds two parallel flat buffers over a map rectangle:
//! `physical` (immutable terrain, [`FLOOR`]/[`WALL`] sentinels) and
//! `gradient` (the working distance field). Marking goal cells and scanning
//! produces a multi-source distance field; walking strictly downhill over it
//! extracts a path. This is a Dijkstra-map engine, not a true Dijkstra: all
//! non-wall steps cost one step scaled by the metric's directional factor.
//!
//! Query variants:
//!
//! - [`GradientGrid::scan`] / [`GradientGrid::partial_scan`] /
//!   [`GradientGrid::scan_sized`] — full, bounded and multi-cell-footprint
//!   distance fields ([`GradientGrid::scan_in_place`] recomputes without
//!   returning the field or darkening unreached cells)
//! - [`GradientGrid::find_path`] — budgeted movement toward targets with
//!   deterministic seeded tie-breaking
//! - [`GradientGrid::find_attack_path`] — ranged-attack goals gated by an
//!   injected line-of-sight raycast
//! - [`GradientGrid::find_flee_path`] — inverted-field escape paths with
//!   memoized rescans
//! - [`GradientGrid::flood_fill`] — bounded area queries
//!
//! The grid reuses internal scratch buffers across calls and is not
//! reentrant; use one instance per thread.

mod grid;
mod los;
mod measure;
mod paths;
mod scan;

pub use grid::{DARK, FLOOR, GOAL, GradientGrid, WALL};
pub use los::line_clear;
pub use measure::Measure;
