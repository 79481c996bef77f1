use crate::error::Result;
use crate::math::{Point3, Vector3};

/// An infinite line defined by an origin point and a direction vector.
///
/// The parametric form is: `P(t) = origin + t * direction`.
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    origin: Point3,
    direction: Vector3,
}

impl Line {
    /// Creates a new line from an origin and direction.
    ///
    /// # Errors
    ///
    /// Returns an error if the direction vector is zero-length.
    pub fn new(origin: Point3, direction: Vector3) -> Result<Self> {
        let len = direction.norm();
        if len < crate::math::TOLERANCE {
            return Err(crate::error::GeometryError::ZeroVector.into());
        }
        Ok(Self {
            origin,
            direction: direction / len,
        })
    }

    /// Creates the line through two points, parametrized by arc length from `a`.
    ///
    /// # Errors
    ///
    /// Returns an error if the points coincide.
    pub fn through(a: &Point3, b: &Point3) -> Result<Self> {
        Self::new(*a, b - a)
    }

    /// Returns the origin point of the line.
    #[must_use]
    pub fn origin(&self) -> &Point3 {
        &self.origin
    }

    /// Returns the unit direction vector of the line.
    #[must_use]
    pub fn direction(&self) -> &Vector3 {
        &self.direction
    }

    /// Evaluates the line at parameter `t`.
    #[must_use]
    pub fn point_at(&self, t: f64) -> Point3 {
        self.origin + self.direction * t
    }

    /// Parameter of the orthogonal projection of `p` onto the line.
    #[must_use]
    pub fn parameter_of(&self, p: &Point3) -> f64 {
        (p - self.origin).dot(&self.direction)
    }

    /// Distance from `p` to the line.
    #[must_use]
    pub fn distance_to(&self, p: &Point3) -> f64 {
        (p - self.point_at(self.parameter_of(p))).norm()
    }
}

/// A bounded straight segment between two points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub start: Point3,
    pub end: Point3,
}

impl Segment {
    /// Creates a new segment.
    #[must_use]
    pub fn new(start: Point3, end: Point3) -> Self {
        Self { start, end }
    }

    /// Length of the segment.
    #[must_use]
    pub fn length(&self) -> f64 {
        (self.end - self.start).norm()
    }

    /// Point at normalized parameter `t` in `[0, 1]`.
    #[must_use]
    pub fn point_at(&self, t: f64) -> Point3 {
        self.start + (self.end - self.start) * t
    }

    /// Normalized parameter of the projection of `p`, unclamped.
    #[must_use]
    pub fn parameter_of(&self, p: &Point3) -> f64 {
        let d = self.end - self.start;
        let len_sq = d.norm_squared();
        if len_sq < crate::math::TOLERANCE * crate::math::TOLERANCE {
            return 0.0;
        }
        (p - self.start).dot(&d) / len_sq
    }

    /// Distance from `p` to the closest point of the segment.
    #[must_use]
    pub fn distance_to(&self, p: &Point3) -> f64 {
        let t = self.parameter_of(p).clamp(0.0, 1.0);
        (p - self.point_at(t)).norm()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    #[test]
    fn line_projection_parameter() {
        let line = Line::through(&p(0.0, 0.0, 0.0), &p(2.0, 0.0, 0.0)).unwrap();
        assert!((line.parameter_of(&p(1.5, 3.0, 0.0)) - 1.5).abs() < 1e-12);
        assert!((line.distance_to(&p(1.5, 3.0, 0.0)) - 3.0).abs() < 1e-12);
    }

    #[test]
    fn segment_distance_clamps_to_endpoints() {
        let seg = Segment::new(p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0));
        assert!((seg.distance_to(&p(2.0, 0.0, 0.0)) - 1.0).abs() < 1e-12);
        assert!((seg.distance_to(&p(0.5, 0.5, 0.0)) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn coincident_points_make_no_line() {
        assert!(Line::through(&p(1.0, 1.0, 1.0), &p(1.0, 1.0, 1.0)).is_err());
    }
}
