//! The gradient grid: buffers, sentinels, goals and lifecycle.

use std::collections::VecDeque;

use wayward_core::{Point, Rect};

use crate::measure::Measure;

/// Distance of a goal cell.
pub const GOAL: f32 = 0.0;
/// An open cell not yet reached by a scan.
pub const FLOOR: f32 = 999_200.0;
/// Impassable terrain.
pub const WALL: f32 = 999_500.0;
/// A passable cell no completed scan could reach. Only grid-returning scan
/// variants write this; in-place recomputes leave unreached cells at
/// [`FLOOR`].
pub const DARK: f32 = 999_800.0;

/// Cache key for memoized flee-field computation. Point sets are kept
/// sorted so equality is set equality.
#[derive(Clone, PartialEq)]
pub(crate) struct FleeKey {
    pub(crate) prefer_longer: f32,
    pub(crate) impassable: Vec<Point>,
    pub(crate) fear: Vec<Point>,
}

/// A multi-goal distance field over a dense 2D cost grid.
///
/// Holds the immutable `physical` terrain and the mutable `gradient`
/// working field, both flat `y * width + x` buffers. See the crate docs for
/// the scan/path query surface.
pub struct GradientGrid {
    pub(crate) measure: Measure,
    /// How many orthogonal wall neighbours refuse a diagonal step:
    /// 2 = both-corners rule (default), 1 = hard-corner rule, 0 = never.
    pub(crate) blocking_requirement: u8,
    pub(crate) width: i32,
    pub(crate) height: i32,
    pub(crate) physical: Vec<f32>,
    pub(crate) gradient: Vec<f32>,
    pub(crate) goals: Vec<usize>,
    pub(crate) frontier: VecDeque<usize>,
    pub(crate) path: Vec<Point>,
    pub(crate) cut_short: bool,
    pub(crate) scans: u64,
    pub(crate) flee_key: Option<FleeKey>,
    pub(crate) flee_map: Vec<f32>,
    pub(crate) initialized: bool,
}

impl Default for GradientGrid {
    fn default() -> Self {
        Self::new(Measure::Chebyshev)
    }
}

impl GradientGrid {
    /// Create an uninitialized grid using the given metric.
    pub fn new(measure: Measure) -> Self {
        Self {
            measure,
            blocking_requirement: 2,
            width: 0,
            height: 0,
            physical: Vec::new(),
            gradient: Vec::new(),
            goals: Vec::new(),
            frontier: VecDeque::new(),
            path: Vec::new(),
            cut_short: false,
            scans: 0,
            flee_key: None,
            flee_map: Vec::new(),
            initialized: false,
        }
    }

    /// Fill `physical` from a blocking predicate and reset the gradient.
    ///
    /// Non-positive dimensions leave the grid uninitialized.
    pub fn initialize(&mut self, width: i32, height: i32, mut blocking: impl FnMut(Point) -> bool) {
        if width <= 0 || height <= 0 {
            return;
        }
        self.width = width;
        self.height = height;
        let len = (width as usize) * (height as usize);
        self.physical.clear();
        self.physical.reserve(len);
        for y in 0..height {
            for x in 0..width {
                let cell = if blocking(Point::new(x, y)) { WALL } else { FLOOR };
                self.physical.push(cell);
            }
        }
        self.gradient.clear();
        self.gradient.extend_from_slice(&self.physical);
        self.goals.clear();
        self.flee_key = None;
        self.cut_short = false;
        self.initialized = true;
        log::debug!("initialized {width}x{height} gradient grid");
    }

    /// Initialize from rows of map text; `'#'` cells are walls.
    pub fn initialize_rows(&mut self, rows: &[&str]) {
        let height = rows.len() as i32;
        let width = rows.first().map_or(0, |r| r.chars().count()) as i32;
        let cells: Vec<Vec<char>> = rows.iter().map(|r| r.chars().collect()).collect();
        self.initialize(width, height, |p| {
            cells
                .get(p.y as usize)
                .and_then(|row| row.get(p.x as usize))
                .is_some_and(|&c| c == '#')
        });
    }

    #[inline]
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    #[inline]
    pub fn measure(&self) -> Measure {
        self.measure
    }

    #[inline]
    pub fn width(&self) -> i32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> i32 {
        self.height
    }

    /// The grid's bounding rectangle.
    #[inline]
    pub fn bounds(&self) -> Rect {
        Rect::new(0, 0, self.width, self.height)
    }

    /// Set the diagonal blocking rule (clamped to 0..=2).
    pub fn set_blocking_requirement(&mut self, requirement: u8) {
        self.blocking_requirement = requirement.min(2);
    }

    // -----------------------------------------------------------------------
    // Coordinate helpers
    // -----------------------------------------------------------------------

    /// Convert a `Point` to a flat index. `None` if out of bounds.
    #[inline]
    pub(crate) fn idx(&self, p: Point) -> Option<usize> {
        if p.x < 0 || p.y < 0 || p.x >= self.width || p.y >= self.height {
            return None;
        }
        Some((p.y * self.width + p.x) as usize)
    }

    /// Convert a flat index back to a `Point`.
    #[inline]
    pub(crate) fn point(&self, idx: usize) -> Point {
        Point::new(idx as i32 % self.width, idx as i32 / self.width)
    }

    // -----------------------------------------------------------------------
    // Goals
    // -----------------------------------------------------------------------

    /// Mark a distance-0 source. Out-of-bounds or wall cells are silently
    /// ignored.
    pub fn set_goal(&mut self, p: Point) {
        if !self.initialized {
            return;
        }
        let Some(i) = self.idx(p) else {
            return;
        };
        if self.physical[i] > FLOOR {
            return;
        }
        if !self.goals.contains(&i) {
            self.goals.push(i);
        }
    }

    pub fn set_goals(&mut self, goals: impl IntoIterator<Item = Point>) {
        for p in goals {
            self.set_goal(p);
        }
    }

    pub fn clear_goals(&mut self) {
        self.goals.clear();
    }

    pub fn goals(&self) -> impl Iterator<Item = Point> {
        self.goals.iter().map(|&i| self.point(i))
    }

    /// Restore the gradient from the physical terrain and drop all goals.
    pub fn reset(&mut self) {
        self.gradient.clear();
        self.gradient.extend_from_slice(&self.physical);
        self.goals.clear();
    }

    // -----------------------------------------------------------------------
    // Read access
    // -----------------------------------------------------------------------

    /// The physical terrain value at `p`.
    pub fn physical_at(&self, p: Point) -> Option<f32> {
        Some(self.physical[self.idx(p)?])
    }

    /// The gradient value at `p`, as of the last scan.
    pub fn gradient_at(&self, p: Point) -> Option<f32> {
        Some(self.gradient[self.idx(p)?])
    }

    /// The full gradient field, row-major.
    pub fn gradient(&self) -> &[f32] {
        &self.gradient
    }

    /// Whether the last path query was aborted before reaching a goal.
    #[inline]
    pub fn cut_short(&self) -> bool {
        self.cut_short
    }

    /// How many scans have been performed. Exposed so callers (and tests)
    /// can observe the flee-path memoization contract.
    #[inline]
    pub fn scan_count(&self) -> u64 {
        self.scans
    }

    /// The path produced by the last find-path query. Cleared and refilled
    /// on every call; copy it out to persist it.
    pub fn path(&self) -> &[Point] {
        &self.path
    }

    /// Copy the last path into a caller-owned buffer.
    pub fn copy_path_into(&self, buf: &mut Vec<Point>) {
        buf.clear();
        buf.extend_from_slice(&self.path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uninitialized_grid_ignores_goals() {
        let mut gg = GradientGrid::default();
        gg.set_goal(Point::new(1, 1));
        assert_eq!(gg.goals().count(), 0);
        assert!(!gg.is_initialized());
    }

    #[test]
    fn goals_skip_walls_and_out_of_bounds() {
        let mut gg = GradientGrid::default();
        gg.initialize_rows(&["...", ".#.", "..."]);
        gg.set_goal(Point::new(1, 1)); // wall
        gg.set_goal(Point::new(5, 5)); // out of bounds
        gg.set_goal(Point::new(0, 0));
        gg.set_goal(Point::new(0, 0)); // duplicate
        let goals: Vec<Point> = gg.goals().collect();
        assert_eq!(goals, vec![Point::new(0, 0)]);
    }

    #[test]
    fn initialize_rows_marks_walls() {
        let mut gg = GradientGrid::default();
        gg.initialize_rows(&["#..", "..#"]);
        assert_eq!(gg.width(), 3);
        assert_eq!(gg.height(), 2);
        assert_eq!(gg.physical_at(Point::new(0, 0)), Some(WALL));
        assert_eq!(gg.physical_at(Point::new(1, 0)), Some(FLOOR));
        assert_eq!(gg.physical_at(Point::new(2, 1)), Some(WALL));
        assert_eq!(gg.bounds().len(), 6);
        assert!(gg.bounds().contains(Point::new(2, 1)));
        assert!(!gg.bounds().contains(Point::new(3, 0)));
    }

    #[test]
    fn reset_restores_physical() {
        let mut gg = GradientGrid::default();
        gg.initialize_rows(&["...", "..."]);
        gg.set_goal(Point::new(0, 0));
        gg.scan(&[]);
        assert_eq!(gg.gradient_at(Point::new(0, 0)), Some(GOAL));
        gg.reset();
        assert_eq!(gg.gradient_at(Point::new(0, 0)), Some(FLOOR));
        assert_eq!(gg.goals().count(), 0);
    }
}
