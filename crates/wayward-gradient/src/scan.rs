//! Multi-source relaxation: full, bounded and size-aware scans.

use wayward_core::Point;

use crate::grid::{DARK, FLOOR, GOAL, GradientGrid, WALL};

impl GradientGrid {
    /// Full multi-source relaxation from the current goal set.
    ///
    /// `impassable` cells are forced to wall for the duration of the scan
    /// and restored afterwards. Unreached floor cells are rewritten to
    /// [`DARK`] in the returned field.
    pub fn scan(&mut self, impassable: &[Point]) -> &[f32] {
        if !self.initialized {
            return &self.gradient;
        }
        self.scan_internal(impassable, None, None, 1, true);
        &self.gradient
    }

    /// Recompute the field in place. Unlike [`scan`](Self::scan), unreached
    /// floor cells are left at [`FLOOR`] rather than rewritten to [`DARK`].
    pub fn scan_in_place(&mut self, impassable: &[Point]) {
        if !self.initialized {
            return;
        }
        self.scan_internal(impassable, None, None, 1, false);
    }

    /// Like [`scan`](Self::scan), halting after `limit` frontier
    /// expansions. Bounds the flood to a local area around the goals.
    pub fn partial_scan(&mut self, limit: usize, impassable: &[Point]) -> &[f32] {
        if !self.initialized {
            return &self.gradient;
        }
        self.scan_internal(impassable, Some(limit), None, 1, true);
        &self.gradient
    }

    /// Size-aware scan for movers with a `size`×`size` footprint anchored
    /// at their minimum-x, minimum-y cell.
    ///
    /// Every physical wall shadows the `size`×`size` block toward
    /// decreasing coordinates, making those anchors unenterable, and a goal
    /// only seeds the scan when its full footprint is open.
    pub fn scan_sized(&mut self, impassable: &[Point], size: i32) -> &[f32] {
        if !self.initialized {
            return &self.gradient;
        }
        self.scan_internal(impassable, None, None, size.max(1), true);
        &self.gradient
    }

    pub(crate) fn scan_internal(
        &mut self,
        impassable: &[Point],
        limit: Option<usize>,
        max_dist: Option<f32>,
        size: i32,
        dark: bool,
    ) {
        self.scans += 1;

        // Force impassable cells to wall for this scan only.
        let saved: Vec<(usize, f32)> = impassable
            .iter()
            .filter_map(|&p| {
                let i = self.idx(p)?;
                Some((i, self.physical[i]))
            })
            .collect();
        for &(i, _) in &saved {
            self.physical[i] = WALL;
        }

        self.rebuild_gradient(size);
        self.seed_goals(size);
        self.relax(limit, max_dist);

        if dark {
            for v in self.gradient.iter_mut() {
                if *v == FLOOR {
                    *v = DARK;
                }
            }
        }

        for &(i, old) in &saved {
            self.physical[i] = old;
        }
    }

    /// Reset the gradient from the physical terrain, applying footprint
    /// shadowing for multi-cell movers.
    fn rebuild_gradient(&mut self, size: i32) {
        self.gradient.clear();
        self.gradient.extend_from_slice(&self.physical);
        if size <= 1 {
            return;
        }
        // Every wall shadows the size x size anchor block toward
        // decreasing coordinates.
        for y in 0..self.height {
            for x in 0..self.width {
                let Some(i) = self.idx(Point::new(x, y)) else {
                    continue;
                };
                if self.physical[i] <= FLOOR {
                    continue;
                }
                for dy in 0..size {
                    for dx in 0..size {
                        if dx == 0 && dy == 0 {
                            continue;
                        }
                        if let Some(j) = self.idx(Point::new(x - dx, y - dy)) {
                            if self.gradient[j] <= FLOOR {
                                self.gradient[j] = WALL;
                            }
                        }
                    }
                }
            }
        }
        // Anchors whose footprint would leave the grid are unenterable too.
        for y in 0..self.height {
            for x in 0..self.width {
                if x <= self.width - size && y <= self.height - size {
                    continue;
                }
                if let Some(i) = self.idx(Point::new(x, y)) {
                    if self.gradient[i] <= FLOOR {
                        self.gradient[i] = WALL;
                    }
                }
            }
        }
    }

    fn seed_goals(&mut self, size: i32) {
        self.frontier.clear();
        for k in 0..self.goals.len() {
            let gi = self.goals[k];
            if self.gradient[gi] > FLOOR {
                continue;
            }
            if size > 1 && !self.footprint_open(gi, size) {
                continue;
            }
            self.gradient[gi] = GOAL;
            self.frontier.push_back(gi);
        }
    }

    fn footprint_open(&self, i: usize, size: i32) -> bool {
        let p = self.point(i);
        for dy in 0..size {
            for dx in 0..size {
                match self.idx(p.shift(dx, dy)) {
                    Some(j) if self.physical[j] <= FLOOR => {}
                    _ => return false,
                }
            }
        }
        true
    }

    /// Pop-and-relax until the frontier drains, the expansion budget runs
    /// out, or every remaining improvement would exceed `max_dist`.
    pub(crate) fn relax(&mut self, limit: Option<usize>, max_dist: Option<f32>) {
        let dirs = self.measure.directions();
        let mut expansions = 0usize;
        while let Some(ci) = self.frontier.pop_front() {
            if let Some(limit) = limit {
                if expansions >= limit {
                    break;
                }
            }
            expansions += 1;
            let dist = self.gradient[ci];
            let cp = self.point(ci);
            for &d in dirs {
                let np = cp + d;
                let Some(ni) = self.idx(np) else { continue };
                if self.gradient[ni] >= WALL {
                    continue;
                }
                if self.diagonal_blocked(cp, d) {
                    continue;
                }
                let tentative = dist + self.measure.step_cost(d);
                if let Some(max) = max_dist {
                    if tentative > max {
                        continue;
                    }
                }
                if tentative < self.gradient[ni] {
                    self.gradient[ni] = tentative;
                    self.frontier.push_back(ni);
                }
            }
        }
        self.frontier.clear();
        log::trace!("relaxed gradient field in {expansions} expansions");
    }

    /// Whether stepping diagonally along `d` from `cp` is refused by the
    /// corner-cutting rule: the step is blocked when at least
    /// `blocking_requirement` of its two orthogonal corner cells are walls.
    pub(crate) fn diagonal_blocked(&self, cp: Point, d: Point) -> bool {
        if d.x == 0 || d.y == 0 || self.blocking_requirement == 0 {
            return false;
        }
        let mut walls = 0u8;
        if self.wallish(cp.shift(d.x, 0)) {
            walls += 1;
        }
        if self.wallish(cp.shift(0, d.y)) {
            walls += 1;
        }
        walls >= self.blocking_requirement
    }

    fn wallish(&self, p: Point) -> bool {
        match self.idx(p) {
            Some(i) => self.gradient[i] >= WALL,
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::measure::Measure;
    use wayward_core::{chebyshev, manhattan};

    fn open_grid(measure: Measure, w: i32, h: i32) -> GradientGrid {
        let mut gg = GradientGrid::new(measure);
        gg.initialize(w, h, |_| false);
        gg
    }

    #[test]
    fn chebyshev_field_matches_distance() {
        let mut gg = open_grid(Measure::Chebyshev, 5, 5);
        let goal = Point::new(2, 2);
        gg.set_goal(goal);
        gg.scan(&[]);
        for y in 0..5 {
            for x in 0..5 {
                let p = Point::new(x, y);
                assert_eq!(
                    gg.gradient_at(p),
                    Some(chebyshev(p, goal) as f32),
                    "at {p}"
                );
            }
        }
    }

    #[test]
    fn manhattan_field_matches_distance() {
        let mut gg = open_grid(Measure::Manhattan, 5, 5);
        let goal = Point::new(2, 2);
        gg.set_goal(goal);
        gg.scan(&[]);
        for y in 0..5 {
            for x in 0..5 {
                let p = Point::new(x, y);
                assert_eq!(
                    gg.gradient_at(p),
                    Some(manhattan(p, goal) as f32),
                    "at {p}"
                );
            }
        }
    }

    #[test]
    fn euclidean_diagonal_costs_sqrt_two() {
        let mut gg = open_grid(Measure::Euclidean, 3, 3);
        gg.set_goal(Point::new(1, 1));
        gg.scan(&[]);
        assert_eq!(
            gg.gradient_at(Point::new(0, 0)),
            Some(std::f32::consts::SQRT_2)
        );
        assert_eq!(gg.gradient_at(Point::new(1, 0)), Some(1.0));
    }

    #[test]
    fn walls_keep_their_sentinel_and_unreached_go_dark() {
        let mut gg = GradientGrid::default();
        // Right column sealed off by a wall line.
        gg.initialize_rows(&[
            "..#.",
            "..#.",
            "..#.",
            "..#.",
        ]);
        gg.set_goal(Point::new(0, 0));
        gg.scan(&[]);
        assert_eq!(gg.gradient_at(Point::new(2, 1)), Some(WALL));
        assert_eq!(gg.gradient_at(Point::new(3, 0)), Some(DARK));
        assert_eq!(gg.gradient_at(Point::new(3, 3)), Some(DARK));
        assert_eq!(gg.gradient_at(Point::new(1, 3)), Some(3.0));
    }

    #[test]
    fn impassable_cells_are_restored_after_scan() {
        let mut gg = open_grid(Measure::Chebyshev, 4, 4);
        let blocked = Point::new(1, 1);
        gg.set_goal(Point::new(0, 0));
        gg.scan(&[blocked]);
        // The scan treated it as wall...
        assert_eq!(gg.gradient_at(blocked), Some(WALL));
        // ...but the terrain is untouched.
        assert_eq!(gg.physical_at(blocked), Some(FLOOR));
    }

    #[test]
    fn partial_scan_bounds_the_flood() {
        let mut gg = open_grid(Measure::Chebyshev, 9, 9);
        gg.set_goal(Point::new(4, 4));
        // One expansion: only the goal cell gets processed.
        gg.partial_scan(1, &[]);
        assert_eq!(gg.gradient_at(Point::new(4, 4)), Some(GOAL));
        assert_eq!(gg.gradient_at(Point::new(3, 4)), Some(1.0));
        assert_eq!(gg.gradient_at(Point::new(0, 0)), Some(DARK));
    }

    #[test]
    fn both_corners_rule_blocks_diagonal() {
        let mut gg = GradientGrid::default();
        gg.initialize_rows(&[
            ".#.",
            "#..",
            "...",
        ]);
        gg.set_goal(Point::new(0, 0));
        gg.scan(&[]);
        // Both orthogonal corners of the (0,0)->(1,1) diagonal are walls:
        // the entire rest of the grid is unreachable.
        assert_eq!(gg.gradient_at(Point::new(1, 1)), Some(DARK));

        gg.set_blocking_requirement(0);
        gg.set_goal(Point::new(0, 0));
        gg.scan(&[]);
        assert_eq!(gg.gradient_at(Point::new(1, 1)), Some(1.0));
    }

    #[test]
    fn hard_corner_rule_blocks_single_wall_diagonals() {
        let mut gg = GradientGrid::default();
        gg.initialize_rows(&[
            ".#.",
            "...",
            "...",
        ]);
        gg.set_goal(Point::new(0, 0));
        gg.scan(&[]);
        // Default both-corners rule: one wall does not block.
        assert_eq!(gg.gradient_at(Point::new(1, 1)), Some(1.0));

        gg.set_blocking_requirement(1);
        gg.set_goal(Point::new(0, 0));
        gg.scan(&[]);
        // Hard-corner rule: the diagonal is refused, the cell costs 2 via
        // (0,1).
        assert_eq!(gg.gradient_at(Point::new(1, 1)), Some(2.0));
    }

    #[test]
    fn sized_scan_shadows_walls_and_edges() {
        let mut gg = GradientGrid::default();
        gg.initialize_rows(&[
            ".....",
            ".....",
            ".....",
            "...#.",
            ".....",
        ]);
        gg.set_goal(Point::new(0, 0));
        gg.scan_sized(&[], 2);
        // The wall at (3,3) shadows the 2x2 block toward decreasing x/y.
        assert!(gg.gradient_at(Point::new(2, 2)).is_some_and(|v| v >= WALL));
        assert!(gg.gradient_at(Point::new(3, 2)).is_some_and(|v| v >= WALL));
        assert!(gg.gradient_at(Point::new(2, 3)).is_some_and(|v| v >= WALL));
        // Border anchors whose footprint leaves the grid are unenterable.
        assert!(gg.gradient_at(Point::new(4, 0)).is_some_and(|v| v >= WALL));
        assert!(gg.gradient_at(Point::new(0, 4)).is_some_and(|v| v >= WALL));
        // Open anchors still get distances.
        assert_eq!(gg.gradient_at(Point::new(0, 0)), Some(GOAL));
        assert_eq!(gg.gradient_at(Point::new(1, 1)), Some(1.0));
    }

    #[test]
    fn sized_scan_rejects_goals_with_blocked_footprint() {
        let mut gg = GradientGrid::default();
        gg.initialize_rows(&[
            "....",
            "..#.",
            "....",
            "....",
        ]);
        // Footprint of (1,0) covers the wall at (2,1): not a valid goal.
        gg.set_goal(Point::new(1, 0));
        gg.scan_sized(&[], 2);
        assert_ne!(gg.gradient_at(Point::new(1, 0)), Some(GOAL));

        gg.set_goal(Point::new(0, 2));
        gg.scan_sized(&[], 2);
        assert_eq!(gg.gradient_at(Point::new(0, 2)), Some(GOAL));
    }

    #[test]
    fn in_place_scan_never_writes_dark() {
        let mut gg = GradientGrid::default();
        gg.initialize_rows(&[
            "..#.",
            "..#.",
        ]);
        gg.set_goal(Point::new(0, 0));
        gg.scan_in_place(&[]);
        assert_eq!(gg.gradient_at(Point::new(1, 0)), Some(1.0));
        // Sealed-off cells stay at FLOOR in the in-place variant.
        assert_eq!(gg.gradient_at(Point::new(3, 0)), Some(FLOOR));
        assert_eq!(gg.gradient_at(Point::new(2, 1)), Some(WALL));
    }

    #[test]
    fn scan_counter_increments() {
        let mut gg = open_grid(Measure::Chebyshev, 3, 3);
        assert_eq!(gg.scan_count(), 0);
        gg.set_goal(Point::new(0, 0));
        gg.scan(&[]);
        gg.set_goal(Point::new(0, 0));
        gg.partial_scan(4, &[]);
        assert_eq!(gg.scan_count(), 2);
    }
}
