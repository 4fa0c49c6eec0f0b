// ============================================================================
// spark-marker - Point
// Screen-space pixel point
// ============================================================================

use std::fmt;
use std::ops::{Add, Sub};

/// A point in screen pixels. `x` grows to the right, `y` grows downward.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ZERO: Point = Point { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Convert anything [`PointLike`] into a point.
    pub fn convert(value: impl PointLike) -> Self {
        value.into_point()
    }

    pub fn dist_sqr(&self, other: &Point) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        dx * dx + dy * dy
    }

    /// Round both components to the nearest integer.
    ///
    /// Halves round toward positive infinity (`-2.5` becomes `-2`, `2.5`
    /// becomes `3`) so rounding never flips direction on either side of the
    /// origin.
    pub fn round(&self) -> Self {
        Self::new(round_half_up(self.x), round_half_up(self.y))
    }

    /// True when both components are whole numbers.
    pub fn is_integral(&self) -> bool {
        self.x.fract() == 0.0 && self.y.fract() == 0.0
    }
}

fn round_half_up(v: f64) -> f64 {
    let floor = v.floor();
    let rounded = if v - floor >= 0.5 { floor + 1.0 } else { floor };
    // normalize -0.0
    rounded + 0.0
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

// =============================================================================
// POINT LIKE
// =============================================================================

/// Values accepted wherever a pixel point is expected (offsets mostly).
pub trait PointLike {
    fn into_point(self) -> Point;
}

impl PointLike for Point {
    fn into_point(self) -> Point {
        self
    }
}

impl PointLike for [f64; 2] {
    fn into_point(self) -> Point {
        Point::new(self[0], self[1])
    }
}

impl PointLike for (f64, f64) {
    fn into_point(self) -> Point {
        Point::new(self.0, self.1)
    }
}

// =============================================================================
// TESTS
// =============================================================================
