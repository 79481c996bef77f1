use crate::error::Result;
use crate::geometry::{IntersectionFailure, Plane, SpaceCurve, SurfaceIntersector};
use crate::math::polygon_2d::{clip_segment_to_region, locate_point, PointLocation};
use crate::math::{Aabb, Point2, Point3, Vector3};
use crate::naming::Name;
use crate::topology::mutate::ancestry;
use crate::topology::{FaceId, TopologyStore};

/// A planar face flattened into its own 2D frame.
///
/// The frame is the carrier plane's `(u, v)` space with `v` mirrored for
/// faces whose orientation opposes the plane, so the outer ring always
/// runs counter-clockwise and holes clockwise.
#[derive(Debug, Clone)]
pub(crate) struct FacePolygon {
    pub face: FaceId,
    pub plane: Plane,
    pub flip: bool,
    /// Outward normal of the face (not of its carrier plane).
    pub normal: Vector3,
    pub outer: Vec<Point2>,
    pub holes: Vec<Vec<Point2>>,
    /// Loop points in 3D, outer loop first.
    pub rings: Vec<Vec<Point3>>,
    pub bounds: Aabb,
    /// Names the face contributes to its fragments.
    pub lineage: Vec<Name>,
}

impl FacePolygon {
    pub(crate) fn build(store: &TopologyStore, face: FaceId) -> Result<Self> {
        let fd = store.face(face)?;
        let plane = store.face_plane(face)?.clone();
        let flip = !fd.same_sense;
        let normal = store.face_normal(face)?;
        let mut rings = Vec::new();
        for l in fd.loops() {
            rings.push(store.loop_points(l)?);
        }
        let mut poly = Self {
            face,
            plane,
            flip,
            normal,
            outer: Vec::new(),
            holes: Vec::new(),
            rings: Vec::new(),
            bounds: store.face_bounds(face)?,
            lineage: ancestry(fd.name.as_ref(), &fd.lineage),
        };
        let mut flat: Vec<Vec<Point2>> = rings
            .iter()
            .map(|r| r.iter().map(|p| poly.to_frame(p)).collect())
            .collect();
        if !flat.is_empty() {
            poly.outer = flat.remove(0);
        }
        poly.holes = flat;
        poly.rings = rings;
        Ok(poly)
    }

    pub(crate) fn to_frame(&self, p: &Point3) -> Point2 {
        let uv = self.plane.to_uv(p);
        if self.flip {
            Point2::new(uv.x, -uv.y)
        } else {
            uv
        }
    }

    pub(crate) fn from_frame(&self, q: &Point2) -> Point3 {
        let y = if self.flip { -q.y } else { q.y };
        self.plane.point_at(&Point2::new(q.x, y))
    }

    /// Locates a point of the carrier plane within the face region.
    pub(crate) fn locate(&self, p: &Point3, tol: f64) -> PointLocation {
        locate_point(&self.to_frame(p), &self.outer, &self.holes, tol)
    }

    /// Parameter intervals of `a..b` inside the face region.
    fn clip(&self, a: &Point3, b: &Point3, tol: f64) -> Vec<(f64, f64)> {
        clip_segment_to_region(&self.to_frame(a), &self.to_frame(b), &self.outer, &self.holes, tol)
    }
}

/// A straight cut to be imprinted on a face.
#[derive(Debug, Clone)]
pub(crate) struct Cut {
    pub start: Point3,
    pub end: Point3,
    /// Names of the faces whose contact produced the cut.
    pub lineage: Vec<Name>,
}

/// Cuts produced by one face pair, for each side.
#[derive(Debug, Clone, Default)]
pub(crate) struct PairCuts {
    pub on_a: Vec<Cut>,
    pub on_b: Vec<Cut>,
}

impl PairCuts {
    pub(crate) fn is_empty(&self) -> bool {
        self.on_a.is_empty() && self.on_b.is_empty()
    }
}

fn pair_lineage(a: &FacePolygon, b: &FacePolygon) -> Vec<Name> {
    let mut lineage: Vec<Name> = a.lineage.iter().chain(&b.lineage).cloned().collect();
    lineage.sort();
    lineage.dedup();
    lineage
}

/// Intersects two faces of different operands.
///
/// Crossing faces receive the shared stretch of their intersection line.
/// Coincident faces imprint each other's boundaries.
///
/// # Errors
///
/// Propagates [`IntersectionFailure`] from the intersector.
pub(crate) fn intersect_face_pair(
    a: &FacePolygon,
    b: &FacePolygon,
    intersector: &dyn SurfaceIntersector,
    tol: f64,
) -> std::result::Result<PairCuts, IntersectionFailure> {
    let mut cuts = PairCuts::default();
    if !a.bounds.overlaps(&b.bounds, tol) {
        return Ok(cuts);
    }
    let lineage = pair_lineage(a, b);
    for curve in intersector.intersect_surfaces(&a.plane, &b.plane, tol)? {
        match curve {
            SpaceCurve::Line { line, .. } => {
                // A segment of the line covering both faces.
                let (lo, hi) = a
                    .rings
                    .iter()
                    .chain(&b.rings)
                    .flatten()
                    .map(|p| line.parameter_of(p))
                    .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), t| (lo.min(t), hi.max(t)));
                if !lo.is_finite() || !hi.is_finite() {
                    continue;
                }
                let p0 = line.point_at(lo - 1.0);
                let p1 = line.point_at(hi + 1.0);
                let len = (p1 - p0).norm();
                for (s, e) in overlap(&a.clip(&p0, &p1, tol), &b.clip(&p0, &p1, tol)) {
                    if (e - s) * len <= tol {
                        continue;
                    }
                    let cut = Cut {
                        start: p0 + (p1 - p0) * s,
                        end: p0 + (p1 - p0) * e,
                        lineage: lineage.clone(),
                    };
                    cuts.on_a.push(cut.clone());
                    cuts.on_b.push(cut);
                }
            }
            SpaceCurve::Coincident { .. } => {
                cuts.on_a.extend(imprint(a, b, &lineage, tol));
                cuts.on_b.extend(imprint(b, a, &lineage, tol));
            }
        }
    }
    Ok(cuts)
}

/// Boundary pieces of `other` lying within `face`, for coplanar faces.
fn imprint(face: &FacePolygon, other: &FacePolygon, lineage: &[Name], tol: f64) -> Vec<Cut> {
    let mut out = Vec::new();
    for ring in &other.rings {
        let n = ring.len();
        for i in 0..n {
            let (p0, p1) = (face.plane.project(&ring[i]), face.plane.project(&ring[(i + 1) % n]));
            let len = (p1 - p0).norm();
            for (s, e) in face.clip(&p0, &p1, tol) {
                if (e - s) * len > tol {
                    out.push(Cut {
                        start: p0 + (p1 - p0) * s,
                        end: p0 + (p1 - p0) * e,
                        lineage: lineage.to_vec(),
                    });
                }
            }
        }
    }
    out
}

/// Intersection of two sorted interval lists.
fn overlap(a: &[(f64, f64)], b: &[(f64, f64)]) -> Vec<(f64, f64)> {
    let mut out = Vec::new();
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        let s = a[i].0.max(b[j].0);
        let e = a[i].1.min(b[j].1);
        if e > s {
            out.push((s, e));
        }
        if a[i].1 < b[j].1 {
            i += 1;
        } else {
            j += 1;
        }
    }
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::geometry::PlanarIntersector;
    use crate::naming::NamingContext;
    use crate::operations::MakeBox;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    fn polygons(store: &TopologyStore, shell: crate::topology::ShellId) -> Vec<FacePolygon> {
        store
            .shell(shell)
            .unwrap()
            .faces
            .iter()
            .map(|f| FacePolygon::build(store, *f).unwrap())
            .collect()
    }

    #[test]
    fn frame_keeps_outer_ring_counter_clockwise() {
        let mut store = TopologyStore::new();
        let shell = MakeBox::new(p(0.0, 0.0, 0.0), p(1.0, 1.0, 1.0))
            .execute(&mut store, &NamingContext::new())
            .unwrap();
        for poly in polygons(&store, shell) {
            assert!(crate::math::polygon_2d::signed_area(&poly.outer) > 0.0);
            let q = poly.to_frame(&poly.rings[0][0]);
            assert!((poly.from_frame(&q) - poly.rings[0][0]).norm() < 1e-12);
        }
    }

    #[test]
    fn crossing_faces_share_one_cut() {
        let mut store = TopologyStore::new();
        let ctx = NamingContext::new();
        let a = MakeBox::new(p(0.0, 0.0, 0.0), p(2.0, 2.0, 2.0)).execute(&mut store, &ctx).unwrap();
        let b = MakeBox::new(p(1.0, 0.5, 1.0), p(3.0, 1.5, 3.0)).execute(&mut store, &ctx).unwrap();
        let pa = polygons(&store, a);
        let pb = polygons(&store, b);
        // Top of A (z = 2) against the front of B (y = 0.5).
        let cuts = intersect_face_pair(&pa[1], &pb[2], &PlanarIntersector, 1e-7).unwrap();
        assert_eq!(cuts.on_a.len(), 1);
        let cut = &cuts.on_a[0];
        assert!(((cut.end - cut.start).norm() - 1.0).abs() < 1e-9);
        assert_eq!(cut.lineage.len(), 2);
    }

    #[test]
    fn distant_faces_produce_nothing() {
        let mut store = TopologyStore::new();
        let ctx = NamingContext::new();
        let a = MakeBox::new(p(0.0, 0.0, 0.0), p(1.0, 1.0, 1.0)).execute(&mut store, &ctx).unwrap();
        let b = MakeBox::new(p(5.0, 5.0, 5.0), p(6.0, 6.0, 6.0)).execute(&mut store, &ctx).unwrap();
        let pa = polygons(&store, a);
        let pb = polygons(&store, b);
        assert!(intersect_face_pair(&pa[0], &pb[3], &PlanarIntersector, 1e-7).unwrap().is_empty());
    }

    #[test]
    fn coplanar_faces_imprint_each_other() {
        let mut store = TopologyStore::new();
        let ctx = NamingContext::new();
        let a = MakeBox::new(p(0.0, 0.0, 0.0), p(2.0, 2.0, 1.0)).execute(&mut store, &ctx).unwrap();
        let b = MakeBox::new(p(1.0, 1.0, 0.0), p(3.0, 3.0, 1.0)).execute(&mut store, &ctx).unwrap();
        let pa = polygons(&store, a);
        let pb = polygons(&store, b);
        let cuts = intersect_face_pair(&pa[0], &pb[0], &PlanarIntersector, 1e-7).unwrap();
        // Two sides of each square run through the other.
        assert_eq!(cuts.on_a.len(), 2);
        assert_eq!(cuts.on_b.len(), 2);
    }
}
