use thiserror::Error;

use super::{Line, Plane, Segment};
use crate::math::intersect_3d::{closest_segment_params, plane_plane_intersect, PlanePairRelation};
use crate::math::{Point3, ANGULAR_TOLERANCE};

/// Kind of contact a surface/surface intersection describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurveTag {
    /// Surfaces cross each other along the curve.
    Transverse,
    /// Surfaces touch along the curve without crossing.
    Tangent,
    /// Surfaces share an area instead of a curve.
    Coincident,
}

/// One result of a surface/surface intersection.
#[derive(Debug, Clone, PartialEq)]
pub enum SpaceCurve {
    /// A curve along which the surfaces meet, tagged `Transverse` or `Tangent`.
    Line { line: Line, tag: CurveTag },
    /// The surfaces coincide. `same_sense` is `true` when their normals agree.
    Coincident { same_sense: bool },
}

impl SpaceCurve {
    /// Returns the degeneracy tag of this result.
    #[must_use]
    pub fn tag(&self) -> CurveTag {
        match self {
            Self::Line { tag, .. } => *tag,
            Self::Coincident { .. } => CurveTag::Coincident,
        }
    }
}

/// Numerical failure of the intersection collaborator.
#[derive(Debug, Clone, Error)]
#[error("surface intersection failed: {reason}")]
pub struct IntersectionFailure {
    pub reason: String,
}

/// Surface/curve intersection service consumed by the Boolean classifier
/// and the stitcher.
///
/// Implementations must be callable from several worker threads at once.
pub trait SurfaceIntersector: Sync {
    /// Intersects two carrier surfaces.
    ///
    /// An empty list means the surfaces do not meet. Degenerate
    /// configurations are reported with their [`CurveTag`], never dropped.
    ///
    /// # Errors
    ///
    /// Returns [`IntersectionFailure`] when the computation is numerically
    /// unreliable at the requested tolerance.
    fn intersect_surfaces(
        &self,
        a: &Plane,
        b: &Plane,
        tol: f64,
    ) -> Result<Vec<SpaceCurve>, IntersectionFailure>;

    /// Intersects two edge curves, returning the contact points.
    ///
    /// Collinear overlaps report the endpoints of each segment that lie on
    /// the other one.
    fn intersect_edges(&self, a: &Segment, b: &Segment, tol: f64) -> Vec<Point3>;
}

/// Exact intersector for planes and straight edges.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlanarIntersector;

impl SurfaceIntersector for PlanarIntersector {
    fn intersect_surfaces(
        &self,
        a: &Plane,
        b: &Plane,
        tol: f64,
    ) -> Result<Vec<SpaceCurve>, IntersectionFailure> {
        let finite = |p: &Plane| {
            p.origin().iter().all(|c| c.is_finite())
                && p.plane_normal().iter().all(|c| c.is_finite())
        };
        if !finite(a) || !finite(b) || !tol.is_finite() {
            return Err(IntersectionFailure {
                reason: "non-finite plane or tolerance".into(),
            });
        }

        match plane_plane_intersect(a, b, tol) {
            PlanePairRelation::Parallel { .. } => Ok(Vec::new()),
            PlanePairRelation::Coincident { same_sense } => {
                Ok(vec![SpaceCurve::Coincident { same_sense }])
            }
            PlanePairRelation::IntersectionLine { origin, direction } => {
                let line = Line::new(origin, direction).map_err(|e| IntersectionFailure {
                    reason: e.to_string(),
                })?;
                Ok(vec![SpaceCurve::Line {
                    line,
                    tag: CurveTag::Transverse,
                }])
            }
        }
    }

    fn intersect_edges(&self, a: &Segment, b: &Segment, tol: f64) -> Vec<Point3> {
        let (len_a, len_b) = (a.length(), b.length());
        if len_a < tol || len_b < tol {
            return Vec::new();
        }
        let da = (a.end - a.start) / len_a;
        let db = (b.end - b.start) / len_b;

        if da.cross(&db).norm() < ANGULAR_TOLERANCE.max(tol / len_a.max(len_b)) {
            let mut points = Vec::new();
            for p in [b.start, b.end] {
                if a.distance_to(&p) <= tol {
                    points.push(p);
                }
            }
            for p in [a.start, a.end] {
                if b.distance_to(&p) <= tol
                    && points.iter().all(|q: &Point3| (q - p).norm() > tol)
                {
                    points.push(p);
                }
            }
            return points;
        }

        let (s, t) = closest_segment_params(&a.start, &a.end, &b.start, &b.end);
        let pa = a.point_at(s);
        let pb = b.point_at(t);
        if (pa - pb).norm() <= tol {
            vec![nalgebra::center(&pa, &pb)]
        } else {
            Vec::new()
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::Vector3;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    #[test]
    fn crossing_planes_give_transverse_line() {
        let a = Plane::from_normal(p(0.0, 0.0, 0.0), Vector3::z()).unwrap();
        let b = Plane::from_normal(p(0.5, 0.0, 0.0), Vector3::x()).unwrap();
        let curves = PlanarIntersector.intersect_surfaces(&a, &b, 1e-9).unwrap();
        assert_eq!(curves.len(), 1);
        assert_eq!(curves[0].tag(), CurveTag::Transverse);
    }

    #[test]
    fn coincident_planes_are_tagged() {
        let a = Plane::from_normal(p(0.0, 0.0, 1.0), Vector3::z()).unwrap();
        let b = Plane::from_normal(p(4.0, 4.0, 1.0), -Vector3::z()).unwrap();
        let curves = PlanarIntersector.intersect_surfaces(&a, &b, 1e-9).unwrap();
        assert_eq!(curves, vec![SpaceCurve::Coincident { same_sense: false }]);
    }

    #[test]
    fn parallel_planes_do_not_meet() {
        let a = Plane::from_normal(p(0.0, 0.0, 0.0), Vector3::z()).unwrap();
        let b = Plane::from_normal(p(0.0, 0.0, 1.0), Vector3::z()).unwrap();
        assert!(PlanarIntersector.intersect_surfaces(&a, &b, 1e-9).unwrap().is_empty());
    }

    #[test]
    fn t_junction_reports_endpoint() {
        let long = Segment::new(p(0.0, 0.0, 0.0), p(2.0, 0.0, 0.0));
        let short = Segment::new(p(1.0, 0.0, 0.0), p(1.0, 1.0, 0.0));
        let hits = PlanarIntersector.intersect_edges(&long, &short, 1e-7);
        assert_eq!(hits.len(), 1);
        assert!((hits[0] - p(1.0, 0.0, 0.0)).norm() < 1e-9);
    }

    #[test]
    fn collinear_overlap_reports_inner_endpoints() {
        let long = Segment::new(p(0.0, 0.0, 0.0), p(2.0, 0.0, 0.0));
        let part = Segment::new(p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0));
        let hits = PlanarIntersector.intersect_edges(&long, &part, 1e-7);
        assert_eq!(hits.len(), 2);
    }
}
