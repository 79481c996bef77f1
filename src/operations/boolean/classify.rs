use crate::math::intersect_3d::{line_plane_intersect, LinePlaneRelation};
use crate::math::polygon_2d::PointLocation;
use crate::math::{Aabb, Point3, Vector3};

use super::face_intersection::FacePolygon;

/// Position of a fragment relative to the other operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Classification {
    Inside,
    Outside,
    /// The fragment lies on a face of the other operand.
    /// `same_orientation` tells whether both faces point the same way.
    OnBoundary { same_orientation: bool },
    Ambiguous,
}

impl Classification {
    pub(crate) fn is_volumetric(self) -> bool {
        matches!(self, Self::Inside | Self::Outside)
    }
}

/// Ray directions tried in turn. None is parallel to a coordinate plane,
/// so axis-aligned input rarely produces grazing hits.
pub(super) const RAY_DIRECTIONS: [[f64; 3]; 5] = [
    [0.577_350_3, 0.577_350_2, 0.577_350_4],
    [0.267_261_2, -0.534_522_5, 0.801_783_7],
    [-0.723_746_3, 0.229_578_9, 0.650_610_8],
    [0.412_310_6, 0.848_528_1, -0.331_662_5],
    [-0.301_511_3, -0.904_534_0, -0.301_511_3],
];

enum RayCastResult {
    Clear(Classification),
    Degenerate,
}

/// Classifies a point lying on a fragment with outward `normal` against
/// the faces of the other operand.
///
/// A point on one of those faces is on the boundary. Otherwise rays are
/// cast and crossings counted; rays grazing an edge or running inside a
/// face are discarded and the next direction is tried.
pub(crate) fn classify_point(
    point: &Point3,
    normal: &Vector3,
    others: &[FacePolygon],
    tol: f64,
) -> Classification {
    for face in others {
        if face.plane.signed_distance(point).abs() <= tol
            && face.bounds.overlaps(&Aabb::from_points([point]), tol)
            && face.locate(point, tol) != PointLocation::Outside
        {
            return Classification::OnBoundary {
                same_orientation: normal.dot(&face.normal) > 0.0,
            };
        }
    }

    for dir in RAY_DIRECTIONS {
        let dir = Vector3::from(dir);
        if let RayCastResult::Clear(c) = ray_cast(point, &dir, others, tol) {
            return c;
        }
    }
    Classification::Ambiguous
}

fn ray_cast(point: &Point3, dir: &Vector3, faces: &[FacePolygon], tol: f64) -> RayCastResult {
    let mut crossings = 0u32;
    for face in faces {
        match line_plane_intersect(point, dir, &face.plane, tol) {
            LinePlaneRelation::Point { point: hit, t } => {
                if t <= tol {
                    continue;
                }
                match face.locate(&hit, tol) {
                    PointLocation::Inside => crossings += 1,
                    PointLocation::OnBoundary => return RayCastResult::Degenerate,
                    PointLocation::Outside => {}
                }
            }
            LinePlaneRelation::OnPlane => return RayCastResult::Degenerate,
            LinePlaneRelation::Parallel => {}
        }
    }
    RayCastResult::Clear(if crossings % 2 == 1 {
        Classification::Inside
    } else {
        Classification::Outside
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::naming::NamingContext;
    use crate::operations::MakeBox;
    use crate::topology::TopologyStore;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    fn unit_box() -> Vec<FacePolygon> {
        let mut store = TopologyStore::new();
        let shell = MakeBox::new(p(0.0, 0.0, 0.0), p(1.0, 1.0, 1.0))
            .execute(&mut store, &NamingContext::new())
            .unwrap();
        store
            .shell(shell)
            .unwrap()
            .faces
            .iter()
            .map(|f| FacePolygon::build(&store, *f).unwrap())
            .collect()
    }

    #[test]
    fn ray_directions_are_unit() {
        for d in RAY_DIRECTIONS {
            assert!((Vector3::from(d).norm() - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn inside_and_outside_points() {
        let faces = unit_box();
        let up = Vector3::z();
        assert_eq!(classify_point(&p(0.5, 0.5, 0.5), &up, &faces, 1e-7), Classification::Inside);
        assert_eq!(classify_point(&p(2.0, 0.5, 0.5), &up, &faces, 1e-7), Classification::Outside);
        assert_eq!(classify_point(&p(0.5, 0.5, -3.0), &up, &faces, 1e-7), Classification::Outside);
    }

    #[test]
    fn point_on_face_reports_orientation() {
        let faces = unit_box();
        let on_top = p(0.5, 0.5, 1.0);
        assert_eq!(
            classify_point(&on_top, &Vector3::z(), &faces, 1e-7),
            Classification::OnBoundary { same_orientation: true }
        );
        assert_eq!(
            classify_point(&on_top, &-Vector3::z(), &faces, 1e-7),
            Classification::OnBoundary { same_orientation: false }
        );
    }

    #[test]
    fn point_in_face_plane_but_off_face_is_outside() {
        let faces = unit_box();
        assert_eq!(classify_point(&p(3.0, 3.0, 1.0), &Vector3::z(), &faces, 1e-7), Classification::Outside);
    }
}
