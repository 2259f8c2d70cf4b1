use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point2d {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vector2d {
    pub x: f64,
    pub y: f64,
}

impl Point2d {
    pub const ORIGIN: Point2d = Point2d { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Point2d {
        Point2d { x, y }
    }

    pub fn as_vector2d(&self) -> Vector2d {
        Vector2d {
            x: self.x,
            y: self.y,
        }
    }

    pub fn dist(&self, other: &Point2d) -> f64 {
        other.as_vector2d().sub(&self.as_vector2d()).norm()
    }

    pub fn midpoint(&self, other: &Point2d) -> Point2d {
        Point2d {
            x: (self.x + other.x) / 2.0,
            y: (self.y + other.y) / 2.0,
        }
    }

    pub fn offset(&self, v: &Vector2d) -> Point2d {
        Point2d {
            x: self.x + v.x,
            y: self.y + v.y,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Vector2d {
    pub fn new(x: f64, y: f64) -> Vector2d {
        Vector2d { x, y }
    }

    pub fn add(&self, other: &Vector2d) -> Vector2d {
        Vector2d {
            x: self.x + other.x,
            y: self.y + other.y,
        }
    }

    pub fn sub(&self, other: &Vector2d) -> Vector2d {
        Vector2d {
            x: self.x - other.x,
            y: self.y - other.y,
        }
    }

    pub fn mult(&self, factor: f64) -> Vector2d {
        Vector2d {
            x: self.x * factor,
            y: self.y * factor,
        }
    }

    pub fn norm(&self) -> f64 {
        self.x.hypot(self.y)
    }

    /// normalized returns the unit vector, or None for a (near) zero-length vector.
    pub fn normalized(&self) -> Option<Vector2d> {
        let norm = self.norm();
        if norm > f64::EPSILON && norm.is_finite() {
            Some(self.mult(1.0 / norm))
        } else {
            None
        }
    }

    /// perpendicular returns the vector rotated by +90° in a y-down screen frame, i.e. (-y, x).
    pub fn perpendicular(&self) -> Vector2d {
        Vector2d {
            x: -self.y,
            y: self.x,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn perpendicular_of_unit_x_is_unit_y() {
        let v = Vector2d::new(3.0, 0.0).normalized().unwrap().perpendicular();
        assert_relative_eq!(v.x, 0.0);
        assert_relative_eq!(v.y, 1.0);
    }

    #[test]
    fn zero_vector_has_no_direction() {
        assert!(Vector2d::new(0.0, 0.0).normalized().is_none());
    }
}
