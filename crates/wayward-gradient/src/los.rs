//! Straight-line visibility checks for ranged targeting.

use wayward_core::Point;

/// Reports whether the straight line between `from` and `to` crosses no
/// blocked cell. The endpoints themselves are never tested, so a shooter
/// standing in smoke can still fire out of it.
///
/// Uses Bresenham's line algorithm, which matches what a renderer would
/// draw and therefore what a player expects to be able to shoot along.
pub fn line_clear(from: Point, to: Point, mut blocked: impl FnMut(i32, i32) -> bool) -> bool {
    let dx = (to.x - from.x).abs();
    let dy = -(to.y - from.y).abs();
    let sx = if from.x < to.x { 1 } else { -1 };
    let sy = if from.y < to.y { 1 } else { -1 };
    let mut err = dx + dy;
    let mut x = from.x;
    let mut y = from.y;
    loop {
        if x == to.x && y == to.y {
            return true;
        }
        if (x != from.x || y != from.y) && blocked(x, y) {
            return false;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_line_is_clear() {
        assert!(line_clear(Point::new(0, 0), Point::new(4, 2), |_, _| false));
    }

    #[test]
    fn wall_on_the_line_blocks() {
        let wall = Point::new(2, 0);
        assert!(!line_clear(Point::new(0, 0), Point::new(4, 0), |x, y| {
            Point::new(x, y) == wall
        }));
    }

    #[test]
    fn endpoints_are_not_tested() {
        let from = Point::new(0, 0);
        let to = Point::new(3, 3);
        assert!(line_clear(from, to, |x, y| {
            let p = Point::new(x, y);
            p == from || p == to
        }));
    }

    #[test]
    fn adjacent_cells_always_see_each_other() {
        assert!(line_clear(Point::new(1, 1), Point::new(2, 2), |_, _| true));
    }

    #[test]
    fn zero_length_line_is_clear() {
        assert!(line_clear(Point::new(3, 3), Point::new(3, 3), |_, _| true));
    }
}
