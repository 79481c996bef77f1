use crate::geometry::Plane;

use super::{Point3, Vector3, ANGULAR_TOLERANCE};

/// Relationship between two planes.
#[derive(Debug)]
pub enum PlanePairRelation {
    /// Planes intersect along a line.
    IntersectionLine {
        origin: Point3,
        direction: Vector3,
    },
    /// Planes are parallel but not coincident.
    Parallel { distance: f64 },
    /// Planes are the same point set. `same_sense` is `true` when the
    /// normals agree.
    Coincident { same_sense: bool },
}

/// Computes the intersection of two planes.
///
/// `tol` is the distance below which parallel planes count as coincident.
/// The returned `direction` is `na × nb`, normalized, and `origin` is the
/// point of the line closest to `a`'s origin.
#[must_use]
pub fn plane_plane_intersect(a: &Plane, b: &Plane, tol: f64) -> PlanePairRelation {
    let na = a.plane_normal();
    let nb = b.plane_normal();

    let dir = na.cross(nb);
    let dir_len = dir.norm();

    if dir_len < ANGULAR_TOLERANCE {
        let dist = (b.origin() - a.origin()).dot(na).abs();
        return if dist < tol {
            PlanePairRelation::Coincident {
                same_sense: na.dot(nb) > 0.0,
            }
        } else {
            PlanePairRelation::Parallel { distance: dist }
        };
    }
    let dir = dir / dir_len;

    // p = oa + s*na + t*nb with na.(p - oa) = 0 and nb.(p - ob) = 0
    let d2 = nb.dot(&(b.origin() - a.origin()));
    let dot_nn = na.dot(nb);
    let denom = 1.0 - dot_nn * dot_nn;
    let s = -dot_nn * d2 / denom;
    let t = d2 / denom;
    let base = a.origin() + na * s + nb * t;

    // Slide the base point along the line to sit closest to a's origin.
    let slide = (a.origin() - base).dot(&dir);
    PlanePairRelation::IntersectionLine {
        origin: base + dir * slide,
        direction: dir,
    }
}

/// Relationship of a line with a plane.
#[derive(Debug)]
pub enum LinePlaneRelation {
    /// Line intersects the plane at a single point.
    Point { point: Point3, t: f64 },
    /// Line is parallel to the plane (does not intersect).
    Parallel,
    /// Line lies entirely on the plane.
    OnPlane,
}

/// Computes the intersection of a line `origin + t * dir` with a plane.
#[must_use]
pub fn line_plane_intersect(
    origin: &Point3,
    dir: &Vector3,
    plane: &Plane,
    tol: f64,
) -> LinePlaneRelation {
    let normal = plane.plane_normal();
    let denom = normal.dot(dir);
    let numer = normal.dot(&(plane.origin() - origin));

    if denom.abs() < ANGULAR_TOLERANCE {
        if numer.abs() < tol {
            LinePlaneRelation::OnPlane
        } else {
            LinePlaneRelation::Parallel
        }
    } else {
        let t = numer / denom;
        LinePlaneRelation::Point {
            point: origin + dir * t,
            t,
        }
    }
}

/// Closest points between two bounded segments.
///
/// Returns `(s, t)`, the normalized parameters on `a0..a1` and `b0..b1`.
#[must_use]
pub fn closest_segment_params(a0: &Point3, a1: &Point3, b0: &Point3, b1: &Point3) -> (f64, f64) {
    let d1 = a1 - a0;
    let d2 = b1 - b0;
    let r = a0 - b0;
    let a = d1.norm_squared();
    let e = d2.norm_squared();
    let f = d2.dot(&r);
    let eps = super::TOLERANCE * super::TOLERANCE;

    if a <= eps && e <= eps {
        return (0.0, 0.0);
    }
    if a <= eps {
        return (0.0, (f / e).clamp(0.0, 1.0));
    }
    let c = d1.dot(&r);
    if e <= eps {
        return ((-c / a).clamp(0.0, 1.0), 0.0);
    }

    let b = d1.dot(&d2);
    let denom = a * e - b * b;
    let mut s = if denom > eps {
        ((b * f - c * e) / denom).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let mut t = (b * s + f) / e;
    if t < 0.0 {
        t = 0.0;
        s = (-c / a).clamp(0.0, 1.0);
    } else if t > 1.0 {
        t = 1.0;
        s = ((b - c) / a).clamp(0.0, 1.0);
    }
    (s, t)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    fn v(x: f64, y: f64, z: f64) -> Vector3 {
        Vector3::new(x, y, z)
    }

    #[test]
    fn orthogonal_planes_meet_in_a_line() {
        let xy = Plane::from_normal(p(0.0, 0.0, 0.0), v(0.0, 0.0, 1.0)).unwrap();
        let xz = Plane::from_normal(p(0.0, 2.0, 0.0), v(0.0, 1.0, 0.0)).unwrap();
        match plane_plane_intersect(&xy, &xz, 1e-9) {
            PlanePairRelation::IntersectionLine { origin, direction } => {
                assert!((origin.y - 2.0).abs() < 1e-12);
                assert!(origin.z.abs() < 1e-12);
                assert!((direction.x.abs() - 1.0).abs() < 1e-12);
            }
            other => panic!("expected a line, got {other:?}"),
        }
    }

    #[test]
    fn opposite_coplanar_planes_report_sense() {
        let a = Plane::from_normal(p(0.0, 0.0, 1.0), v(0.0, 0.0, 1.0)).unwrap();
        let b = Plane::from_normal(p(3.0, 1.0, 1.0), v(0.0, 0.0, -1.0)).unwrap();
        assert!(matches!(
            plane_plane_intersect(&a, &b, 1e-9),
            PlanePairRelation::Coincident { same_sense: false }
        ));
    }

    #[test]
    fn parallel_planes_report_distance() {
        let a = Plane::from_normal(p(0.0, 0.0, 0.0), v(0.0, 0.0, 1.0)).unwrap();
        let b = Plane::from_normal(p(0.0, 0.0, 2.5), v(0.0, 0.0, 1.0)).unwrap();
        match plane_plane_intersect(&a, &b, 1e-9) {
            PlanePairRelation::Parallel { distance } => assert!((distance - 2.5).abs() < 1e-12),
            other => panic!("expected parallel, got {other:?}"),
        }
    }

    #[test]
    fn line_hits_plane() {
        let plane = Plane::from_normal(p(0.0, 0.0, 1.0), v(0.0, 0.0, 1.0)).unwrap();
        match line_plane_intersect(&p(1.0, 1.0, 0.0), &v(0.0, 0.0, 1.0), &plane, 1e-9) {
            LinePlaneRelation::Point { point, t } => {
                assert!((t - 1.0).abs() < 1e-12);
                assert!((point.z - 1.0).abs() < 1e-12);
            }
            other => panic!("expected a point, got {other:?}"),
        }
    }

    #[test]
    fn crossing_segments_have_interior_closest_params() {
        let (s, t) = closest_segment_params(
            &p(0.0, 0.0, 0.0),
            &p(2.0, 0.0, 0.0),
            &p(1.0, -1.0, 0.0),
            &p(1.0, 1.0, 0.0),
        );
        assert!((s - 0.5).abs() < 1e-12);
        assert!((t - 0.5).abs() < 1e-12);
    }
}
