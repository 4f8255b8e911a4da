//! Grid distance metrics and their direction sets.

use wayward_core::Point;

const CARDINALS: [Point; 4] = [
    Point::new(0, -1),
    Point::new(1, 0),
    Point::new(0, 1),
    Point::new(-1, 0),
];

const ALL_DIRECTIONS: [Point; 8] = [
    Point::new(0, -1),
    Point::new(1, -1),
    Point::new(1, 0),
    Point::new(1, 1),
    Point::new(0, 1),
    Point::new(-1, 1),
    Point::new(-1, 0),
    Point::new(-1, -1),
];

/// The movement metric used by a gradient grid.
///
/// Manhattan restricts movement to the four cardinal directions; the other
/// two metrics allow diagonals, with Euclidean pricing them at √2.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Measure {
    Manhattan,
    #[default]
    Chebyshev,
    Euclidean,
}

impl Measure {
    /// The active direction set: 4-way for Manhattan, 8-way otherwise.
    #[inline]
    pub fn directions(self) -> &'static [Point] {
        match self {
            Measure::Manhattan => &CARDINALS,
            Measure::Chebyshev | Measure::Euclidean => &ALL_DIRECTIONS,
        }
    }

    /// Cost of one step along direction `d`.
    #[inline]
    pub fn step_cost(self, d: Point) -> f32 {
        match self {
            Measure::Euclidean if d.x != 0 && d.y != 0 => std::f32::consts::SQRT_2,
            _ => 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_sets() {
        assert_eq!(Measure::Manhattan.directions().len(), 4);
        assert_eq!(Measure::Chebyshev.directions().len(), 8);
        assert_eq!(Measure::Euclidean.directions().len(), 8);
    }

    #[test]
    fn step_costs() {
        let diag = Point::new(1, 1);
        let straight = Point::new(1, 0);
        assert_eq!(Measure::Chebyshev.step_cost(diag), 1.0);
        assert_eq!(Measure::Euclidean.step_cost(straight), 1.0);
        assert_eq!(Measure::Euclidean.step_cost(diag), std::f32::consts::SQRT_2);
    }
}
