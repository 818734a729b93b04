//! Plane vectors and wrap-around distance on a torus.

use std::ops::{Add, AddAssign, Mul, Neg, Sub};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn length(self) -> f64 {
        self.x.hypot(self.y)
    }

    pub fn length_squared(self) -> f64 {
        self.x * self.x + self.y * self.y
    }

    pub fn dot(self, other: Vec2) -> f64 {
        self.x * other.x + self.y * other.y
    }

    /// z-component of the 3D cross product.
    pub fn cross(self, other: Vec2) -> f64 {
        self.x * other.y - self.y * other.x
    }

    /// Unit vector in the same direction, or `None` for a (near) zero vector.
    pub fn normalized(self) -> Option<Vec2> {
        let length = self.length();
        if length <= f64::EPSILON || !length.is_finite() {
            return None;
        }
        Some(Vec2::new(self.x / length, self.y / length))
    }

    /// Counter-clockwise rotation by `radians`.
    pub fn rotated(self, radians: f64) -> Vec2 {
        let (sin, cos) = radians.sin_cos();
        Vec2::new(self.x * cos - self.y * sin, self.x * sin + self.y * cos)
    }

    /// Unsigned angle in `[0, π]` between two vectors.
    pub fn angle_between(self, other: Vec2) -> f64 {
        self.cross(other).atan2(self.dot(other)).abs()
    }
}

impl Add for Vec2 {
    type Output = Vec2;
    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Vec2) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Vec2 {
    type Output = Vec2;
    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Vec2 {
    type Output = Vec2;
    fn mul(self, rhs: f64) -> Vec2 {
        Vec2::new(self.x * rhs, self.y * rhs)
    }
}

impl Neg for Vec2 {
    type Output = Vec2;
    fn neg(self) -> Vec2 {
        Vec2::new(-self.x, -self.y)
    }
}

/// A `width × height` plane whose edges wrap around.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Torus {
    pub width: f64,
    pub height: f64,
}

impl Torus {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Maps any point back into `[0, width) × [0, height)`.
    pub fn wrap(&self, point: Vec2) -> Vec2 {
        Vec2::new(point.x.rem_euclid(self.width), point.y.rem_euclid(self.height))
    }

    /// Shortest displacement from `from` to `to`, taking the wrap into account.
    pub fn shortest_delta(&self, from: Vec2, to: Vec2) -> Vec2 {
        Vec2::new(
            wrap_axis(to.x - from.x, self.width),
            wrap_axis(to.y - from.y, self.height),
        )
    }

    pub fn distance(&self, a: Vec2, b: Vec2) -> f64 {
        self.shortest_delta(a, b).length()
    }

    /// Distance from `point` to the segment leaving `start` along `delta`.
    pub fn segment_distance(&self, start: Vec2, delta: Vec2, point: Vec2) -> f64 {
        let relative = self.shortest_delta(start, point);
        let length_squared = delta.length_squared();
        if length_squared <= f64::EPSILON {
            return relative.length();
        }
        let t = (relative.dot(delta) / length_squared).clamp(0.0, 1.0);
        (relative - delta * t).length()
    }
}

fn wrap_axis(delta: f64, span: f64) -> f64 {
    if span <= 0.0 {
        return delta;
    }
    delta - span * (delta / span).round()
}
