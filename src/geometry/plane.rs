use crate::error::{GeometryError, Result};
use crate::math::{Point2, Point3, Vector3, TOLERANCE};

/// An infinite plane in 3D space.
///
/// Defined by an origin point and two orthonormal direction vectors
/// (`u_dir`, `v_dir`). The normal is `u_dir × v_dir`.
///
/// Parametric form: `P(u, v) = origin + u * u_dir + v * v_dir`.
#[derive(Debug, Clone, PartialEq)]
pub struct Plane {
    origin: Point3,
    u_dir: Vector3,
    v_dir: Vector3,
    normal: Vector3,
}

impl Plane {
    /// Creates a new plane from an origin and two direction vectors.
    ///
    /// `v_dir` is re-orthogonalized against `u_dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if the direction vectors are zero-length
    /// or parallel (degenerate plane).
    pub fn new(origin: Point3, u_dir: Vector3, v_dir: Vector3) -> Result<Self> {
        let u_len = u_dir.norm();
        if u_len < TOLERANCE || v_dir.norm() < TOLERANCE {
            return Err(GeometryError::ZeroVector.into());
        }
        let u_dir = u_dir / u_len;

        let normal = u_dir.cross(&v_dir);
        let normal_len = normal.norm();
        if normal_len < TOLERANCE {
            return Err(
                GeometryError::Degenerate("plane directions are parallel".into()).into(),
            );
        }
        let normal = normal / normal_len;
        let v_dir = normal.cross(&u_dir);

        Ok(Self {
            origin,
            u_dir,
            v_dir,
            normal,
        })
    }

    /// Creates a plane from an origin and a normal vector.
    ///
    /// The U and V directions are computed automatically.
    ///
    /// # Errors
    ///
    /// Returns an error if the normal vector is zero-length.
    pub fn from_normal(origin: Point3, normal: Vector3) -> Result<Self> {
        let len = normal.norm();
        if len < TOLERANCE {
            return Err(GeometryError::ZeroVector.into());
        }
        let normal = normal / len;

        // Choose a reference vector not parallel to the normal
        let reference = if normal.x.abs() < 0.9 {
            Vector3::new(1.0, 0.0, 0.0)
        } else {
            Vector3::new(0.0, 1.0, 0.0)
        };

        let u_dir = normal.cross(&reference).normalize();
        let v_dir = normal.cross(&u_dir);

        Ok(Self {
            origin,
            u_dir,
            v_dir,
            normal,
        })
    }

    /// Fits a plane through a closed polygon using Newell's method.
    ///
    /// The normal follows the polygon winding (counter-clockwise seen from
    /// the normal side).
    ///
    /// # Errors
    ///
    /// Returns an error if the polygon has no area.
    pub fn from_polygon(points: &[Point3]) -> Result<Self> {
        let normal = crate::math::polygon_3d::newell_normal(points).ok_or_else(|| {
            GeometryError::Degenerate("polygon has no area".into())
        })?;
        let origin = points
            .first()
            .copied()
            .ok_or_else(|| GeometryError::Degenerate("empty polygon".into()))?;
        Self::from_normal(origin, normal)
    }

    /// Returns the origin point of the plane.
    #[must_use]
    pub fn origin(&self) -> &Point3 {
        &self.origin
    }

    /// Returns the U direction vector.
    #[must_use]
    pub fn u_dir(&self) -> &Vector3 {
        &self.u_dir
    }

    /// Returns the V direction vector.
    #[must_use]
    pub fn v_dir(&self) -> &Vector3 {
        &self.v_dir
    }

    /// Returns the unit normal vector of the plane.
    #[must_use]
    pub fn plane_normal(&self) -> &Vector3 {
        &self.normal
    }

    /// Evaluates the plane at `(u, v)`.
    #[must_use]
    pub fn point_at(&self, uv: &Point2) -> Point3 {
        self.origin + self.u_dir * uv.x + self.v_dir * uv.y
    }

    /// Projects a point into the plane's parameter space.
    #[must_use]
    pub fn to_uv(&self, point: &Point3) -> Point2 {
        let diff = point - self.origin;
        Point2::new(diff.dot(&self.u_dir), diff.dot(&self.v_dir))
    }

    /// Signed distance from a point to the plane.
    /// Positive = on the normal side, negative = opposite.
    #[must_use]
    pub fn signed_distance(&self, point: &Point3) -> f64 {
        self.normal.dot(&(point - self.origin))
    }

    /// Orthogonal projection of a point onto the plane.
    #[must_use]
    pub fn project(&self, point: &Point3) -> Point3 {
        point - self.normal * self.signed_distance(point)
    }

    /// Checks whether two planes describe the same point set within `tol`.
    ///
    /// Orientation is ignored.
    #[must_use]
    pub fn is_coincident(&self, other: &Plane, tol: f64) -> bool {
        self.normal.cross(&other.normal).norm() < crate::math::ANGULAR_TOLERANCE.max(tol)
            && self.signed_distance(&other.origin).abs() < tol
    }
}
