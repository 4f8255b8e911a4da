//! Path extraction: downhill walks over the scanned field, plus the
//! attack- and flee-path variants built on top of them.

use std::collections::HashMap;

use rand::rngs::SmallRng;
use rand::{Rng, RngExt, SeedableRng};

use wayward_core::{Point, chebyshev};

use crate::grid::{FLOOR, FleeKey, GOAL, GradientGrid};
use crate::los::line_clear;

/// Retries tolerated when blocked occupants force re-routing before the
/// search gives up.
const FRUSTRATION_LIMIT: usize = 500;

impl GradientGrid {
    /// Scan toward `targets` and walk from `start` down the resulting
    /// field, spending at most `length` steps.
    ///
    /// `scan_limit > 0` bounds the scan to that many frontier expansions.
    /// Cells in `impassable` are avoided outright; cells in `only_passable`
    /// may be crossed but not stopped on. When the walk would stop on one,
    /// that cell is treated as impassable and the search retried, up to
    /// [`FRUSTRATION_LIMIT`] times.
    ///
    /// Equal-value neighbors are tie-broken by a direction shuffle seeded
    /// from the inputs, so identical calls return identical paths. The
    /// returned slice aliases an internal buffer that the next query
    /// overwrites; use [`copy_path_into`](Self::copy_path_into) to keep it.
    pub fn find_path(
        &mut self,
        length: usize,
        scan_limit: usize,
        impassable: &[Point],
        only_passable: &[Point],
        start: Point,
        targets: &[Point],
    ) -> &[Point] {
        self.clear_goals();
        self.set_goals(targets.iter().copied());
        let seed = path_seed(start, targets.len(), impassable.len(), only_passable.len());
        self.follow_gradient(length, scan_limit, impassable, only_passable, start, seed)
    }

    /// Like [`find_path`](Self::find_path), but the goals are the cells
    /// from which a target can be attacked: Chebyshev distance to some
    /// target within `[min_range, max_range]`, and, when `los` is given,
    /// an unobstructed straight line to that target (`los` returns true
    /// for sight-blocking cells). Cells outside the band or without line
    /// of sight are simply not goals.
    #[allow(clippy::too_many_arguments)]
    pub fn find_attack_path(
        &mut self,
        move_length: usize,
        min_range: i32,
        max_range: i32,
        los: Option<&dyn Fn(i32, i32) -> bool>,
        impassable: &[Point],
        only_passable: &[Point],
        start: Point,
        targets: &[Point],
    ) -> &[Point] {
        self.clear_goals();
        if self.initialized {
            'cells: for p in self.bounds() {
                for &t in targets {
                    let d = chebyshev(p, t);
                    if d < min_range || d > max_range {
                        continue;
                    }
                    if let Some(blocked) = los {
                        if !line_clear(p, t, |x, y| blocked(x, y)) {
                            continue;
                        }
                    }
                    self.set_goal(p);
                    continue 'cells;
                }
            }
        }
        let seed = path_seed(start, targets.len(), impassable.len(), only_passable.len());
        self.follow_gradient(move_length, 0, impassable, only_passable, start, seed)
    }

    /// Walk away from the `fear_sources`: their distance field is negated
    /// (scaled by `prefer_longer`) and re-relaxed, producing a field whose
    /// downhill direction leads away from danger along real routes rather
    /// than straight into walls.
    ///
    /// The inverted field is memoized: a repeat call with an equal
    /// `(prefer_longer, impassable, fear_sources)` triple reuses it
    /// without rescanning, which [`scan_count`](Self::scan_count) makes
    /// observable.
    pub fn find_flee_path(
        &mut self,
        length: usize,
        scan_limit: usize,
        prefer_longer: f32,
        impassable: &[Point],
        fear_sources: &[Point],
        start: Point,
    ) -> &[Point] {
        self.path.clear();
        self.cut_short = false;
        if !self.initialized || length == 0 || fear_sources.is_empty() {
            self.cut_short = true;
            return &self.path;
        }
        let key = FleeKey::new(prefer_longer, impassable, fear_sources);
        if self.flee_key.as_ref() == Some(&key) {
            log::debug!("reusing cached flee field");
            self.gradient.clear();
            self.gradient.extend_from_slice(&self.flee_map);
        } else {
            self.clear_goals();
            self.set_goals(fear_sources.iter().copied());
            let limit = (scan_limit > 0).then_some(scan_limit);
            self.scan_internal(impassable, limit, None, 1, true);
            for v in self.gradient.iter_mut() {
                if *v < FLOOR {
                    *v *= -prefer_longer;
                }
            }
            // Re-relax from the whole inverted field so the walk follows
            // actual escape routes instead of beelining into dead ends.
            self.frontier.clear();
            for i in 0..self.gradient.len() {
                if self.gradient[i] < FLOOR {
                    self.frontier.push_back(i);
                }
            }
            self.relax(None, None);
            self.flee_map.clear();
            self.flee_map.extend_from_slice(&self.gradient);
            self.flee_key = Some(key);
        }
        let seed = path_seed(start, fear_sources.len(), impassable.len(), 0);
        let mut rng = SmallRng::seed_from_u64(seed);
        self.walk_downhill(start, length, &mut rng);
        &self.path
    }

    /// Downhill walk over whatever field the last scan left behind. No
    /// relaxation happens; cost is linear in the path length.
    pub fn find_path_prescanned(&mut self, target: Point) -> &[Point] {
        self.path.clear();
        self.cut_short = false;
        if !self.initialized {
            self.cut_short = true;
            return &self.path;
        }
        let seed = path_seed(target, 0, 0, 0);
        let mut rng = SmallRng::seed_from_u64(seed);
        self.walk_downhill(target, usize::MAX, &mut rng);
        &self.path
    }

    /// Bounded multi-source fill: every cell within `radius` of some start
    /// (by this grid's metric) mapped to its distance.
    pub fn flood_fill(&mut self, radius: f32, starts: &[Point]) -> HashMap<Point, f32> {
        let mut reached = HashMap::new();
        if !self.initialized || radius <= 0.0 {
            return reached;
        }
        let saved_goals = std::mem::take(&mut self.goals);
        self.set_goals(starts.iter().copied());
        self.scan_internal(&[], None, Some(radius), 1, false);
        for i in 0..self.gradient.len() {
            let v = self.gradient[i];
            if v <= radius {
                reached.insert(self.point(i), v);
            }
        }
        self.goals = saved_goals;
        reached
    }

    /// Shared scan-walk-retry loop for the find-path family. Assumes the
    /// goal set is already in place.
    fn follow_gradient(
        &mut self,
        length: usize,
        scan_limit: usize,
        impassable: &[Point],
        only_passable: &[Point],
        start: Point,
        seed: u64,
    ) -> &[Point] {
        self.path.clear();
        self.cut_short = false;
        if !self.initialized || length == 0 || self.goals.is_empty() {
            self.cut_short = true;
            return &self.path;
        }
        let mut rng = SmallRng::seed_from_u64(seed);
        let mut blocked: Vec<Point> = impassable.iter().copied().filter(|&p| p != start).collect();
        let limit = (scan_limit > 0).then_some(scan_limit);
        let mut frustration = 0usize;
        loop {
            self.scan_internal(&blocked, limit, None, 1, true);
            self.walk_downhill(start, length, &mut rng);
            let Some(&end) = self.path.last() else { break };
            if only_passable.contains(&end) {
                frustration += 1;
                if frustration >= FRUSTRATION_LIMIT {
                    log::warn!("path search from {start} gave up after {frustration} re-routes");
                    self.path.clear();
                    self.cut_short = true;
                    break;
                }
                blocked.push(end);
                continue;
            }
            break;
        }
        &self.path
    }

    /// Greedy strictly-downhill walk from `start`, appending up to
    /// `length` cells to the path buffer. Stops at a zero-distance cell
    /// or a local minimum; an immediate dead end (start unreached by the
    /// scan, or off-grid) marks the result cut short.
    fn walk_downhill(&mut self, start: Point, length: usize, rng: &mut impl Rng) {
        self.path.clear();
        self.cut_short = false;
        let Some(si) = self.idx(start) else {
            self.cut_short = true;
            return;
        };
        if self.gradient[si] >= FLOOR {
            self.cut_short = true;
            return;
        }
        let mut dirs: Vec<Point> = self.measure.directions().to_vec();
        let mut cur = start;
        let mut cur_i = si;
        while self.path.len() < length {
            if self.gradient[cur_i] == GOAL {
                return;
            }
            shuffle(&mut dirs, rng);
            let mut best: Option<(usize, Point, f32)> = None;
            for &d in dirs.iter() {
                let np = cur + d;
                let Some(ni) = self.idx(np) else { continue };
                let v = self.gradient[ni];
                if v >= self.gradient[cur_i] {
                    continue;
                }
                if self.diagonal_blocked(cur, d) {
                    continue;
                }
                match best {
                    Some((_, _, bv)) if v >= bv => {}
                    _ => best = Some((ni, np, v)),
                }
            }
            match best {
                Some((ni, np, _)) => {
                    self.path.push(np);
                    cur = np;
                    cur_i = ni;
                }
                None => {
                    // A local minimum mid-walk is a legitimate stop (flee
                    // fields have no zero cell); failing to move at all is
                    // not.
                    if self.path.is_empty() {
                        self.cut_short = true;
                    }
                    return;
                }
            }
        }
    }
}

impl FleeKey {
    fn new(prefer_longer: f32, impassable: &[Point], fear: &[Point]) -> Self {
        let mut impassable = impassable.to_vec();
        impassable.sort();
        let mut fear = fear.to_vec();
        fear.sort();
        Self {
            prefer_longer,
            impassable,
            fear,
        }
    }
}

/// Fisher-Yates over the direction set, so equal-value neighbors are tried
/// in a seed-determined order.
fn shuffle(dirs: &mut [Point], rng: &mut impl Rng) {
    for i in (1..dirs.len()).rev() {
        let j = rng.random_range(0..=i);
        dirs.swap(i, j);
    }
}

/// Deterministic seed for the tie-breaking shuffle, derived from the walk
/// start and the query's collection sizes.
fn path_seed(start: Point, targets: usize, impassable: usize, only_passable: usize) -> u64 {
    let mut seed = ((start.x as u32 as u64) << 32) | (start.y as u32 as u64);
    seed ^= (targets as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15);
    seed ^= (impassable as u64)
        .wrapping_mul(0xC2B2_AE3D_27D4_EB4F)
        .rotate_left(17);
    seed ^= (only_passable as u64)
        .wrapping_mul(0x1656_67B1_9E37_79F9)
        .rotate_left(31);
    seed
}
