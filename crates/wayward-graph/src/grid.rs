//! Grid specializations: coordinate-keyed graphs with a fast deterministic
//! vertex hash.
//!
//! The generic container hashes vertices through the standard `RandomState`.
//! For dense integer-coordinate graphs that is wasted work; [`CoordHasher`]
//! folds each written coordinate with a large odd multiplier instead. The
//! hash is a pure function of the written data, so it stays consistent with
//! equality and is reproducible across runs.

use std::hash::{BuildHasher, Hasher};

use wayward_core::{Point, Point3};

use crate::graph::Graph;

/// Large odd 64-bit multiplier (the golden-ratio constant).
const COORD_MULT: u64 = 0x9E37_79B9_7F4A_7C15;

/// Multiplicative coordinate hasher: each coordinate is scaled by
/// [`COORD_MULT`], folded into a rotating accumulator and finished with an
/// xor-shift.
#[derive(Clone, Copy, Debug, Default)]
pub struct CoordHasher {
    state: u64,
}

impl Hasher for CoordHasher {
    #[inline]
    fn finish(&self) -> u64 {
        self.state ^ (self.state >> 31)
    }

    fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.state = self
                .state
                .rotate_left(23)
                .wrapping_add((b as u64).wrapping_mul(COORD_MULT));
        }
    }

    #[inline]
    fn write_i32(&mut self, i: i32) {
        self.state = self
            .state
            .rotate_left(23)
            .wrapping_add((i as u32 as u64).wrapping_mul(COORD_MULT));
    }
}

/// Build-hasher for [`CoordHasher`], usable as the `S` parameter of
/// [`Graph`].
#[derive(Clone, Copy, Debug, Default)]
pub struct CoordHashBuilder;

impl BuildHasher for CoordHashBuilder {
    type Hasher = CoordHasher;

    #[inline]
    fn build_hasher(&self) -> CoordHasher {
        CoordHasher::default()
    }
}

/// A graph keyed by 2D integer grid coordinates.
pub type GridGraph = Graph<Point, CoordHashBuilder>;

/// A graph keyed by 3D integer grid coordinates (layered maps).
pub type GridGraph3 = Graph<Point3, CoordHashBuilder>;

/// An empty undirected 2D grid graph.
pub fn undirected_grid() -> GridGraph {
    Graph::undirected_with_hasher(CoordHashBuilder)
}

/// An empty directed 2D grid graph.
pub fn directed_grid() -> GridGraph {
    Graph::directed_with_hasher(CoordHashBuilder)
}

/// An empty undirected 3D grid graph.
pub fn undirected_grid3() -> GridGraph3 {
    Graph::undirected_with_hasher(CoordHashBuilder)
}

/// Connect every vertex to its present grid neighbors (4-way, or 8-way when
/// `diagonals` is set), assigning each edge the weight returned by `cost`.
///
/// The cost callback doubles as the heuristic used for later A* queries
/// over the same graph.
pub fn connect_grid_neighbors(
    g: &mut GridGraph,
    diagonals: bool,
    mut cost: impl FnMut(Point, Point) -> f32,
) {
    let points: Vec<Point> = g.vertices().copied().collect();
    for &p in &points {
        let neighbors: Vec<Point> = if diagonals {
            p.neighbors_8().to_vec()
        } else {
            p.neighbors_4().to_vec()
        };
        for n in neighbors {
            if g.contains_vertex(&n) {
                let w = cost(p, n);
                let _ = g.add_edge_weighted(&p, &n, w);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wayward_core::chebyshev;

    fn hash_point(p: Point) -> u64 {
        use std::hash::Hash;
        let mut h = CoordHashBuilder.build_hasher();
        p.hash(&mut h);
        h.finish()
    }

    #[test]
    fn coord_hash_is_deterministic_and_order_sensitive() {
        let a = Point::new(3, 7);
        assert_eq!(hash_point(a), hash_point(a));
        // (3, 7) and (7, 3) must not collide by construction.
        assert_ne!(hash_point(Point::new(3, 7)), hash_point(Point::new(7, 3)));
        assert_ne!(hash_point(Point::new(0, 1)), hash_point(Point::new(1, 0)));
    }

    #[test]
    fn grid_graph_round_trips_vertices() {
        let mut g = undirected_grid();
        for y in 0..10 {
            for x in 0..10 {
                g.add_vertex(Point::new(x, y));
            }
        }
        assert_eq!(g.vertex_count(), 100);
        assert!(g.contains_vertex(&Point::new(9, 9)));
        assert!(!g.contains_vertex(&Point::new(10, 0)));
    }

    #[test]
    fn connect_neighbors_assigns_heuristic_weights() {
        let mut g = undirected_grid();
        for y in 0..3 {
            for x in 0..3 {
                g.add_vertex(Point::new(x, y));
            }
        }
        connect_grid_neighbors(&mut g, true, |a, b| {
            if chebyshev(a, b) > 0 && a.x != b.x && a.y != b.y {
                std::f32::consts::SQRT_2
            } else {
                1.0
            }
        });
        // Center cell touches all eight neighbors.
        assert_eq!(g.degree(&Point::new(1, 1)), Ok(8));
        let diag = g
            .get_edge(&Point::new(0, 0), &Point::new(1, 1))
            .map(|e| e.weight);
        assert_eq!(diag, Some(std::f32::consts::SQRT_2));
        let straight = g
            .get_edge(&Point::new(0, 0), &Point::new(1, 0))
            .map(|e| e.weight);
        assert_eq!(straight, Some(1.0));
    }

    #[test]
    fn grid3_vertices() {
        let mut g = undirected_grid3();
        g.add_vertex(Point3::new(1, 2, 0));
        g.add_vertex(Point3::new(1, 2, 1));
        g.add_edge(&Point3::new(1, 2, 0), &Point3::new(1, 2, 1))
            .unwrap();
        assert_eq!(g.edge_count(), 1);
    }
}
