use std::collections::{HashMap, HashSet, VecDeque};

use rayon::prelude::*;
use tracing::{debug, instrument, warn};

use super::classify::{classify_point, Classification};
use super::face_intersection::{intersect_face_pair, Cut, FacePolygon, PairCuts};
use super::split::{split_face, Fragment};
use crate::error::Result;
use crate::geometry::SurfaceIntersector;
use crate::math::{Aabb, Point3, Vector3, RELAX_FACTOR};
use crate::naming::Name;
use crate::operations::outcome::check_cancel;
use crate::operations::{CancelToken, Operand};
use crate::topology::{FaceId, ShellId, TopologyStore};

/// Every fragment of both operands with its classification.
#[derive(Debug, Clone)]
pub(crate) struct Classified {
    pub fragments: Vec<Fragment>,
    /// Some face of one operand touches or crosses a face of the other.
    pub touched: bool,
    /// Faces of a pair whose intersection failed even with the relaxed
    /// tolerance. Their fragments stay [`Classification::Ambiguous`].
    pub failed: HashSet<FaceId>,
}

fn polygons(store: &TopologyStore, shell: ShellId) -> Result<Vec<FacePolygon>> {
    store
        .shell(shell)?
        .faces
        .iter()
        .map(|f| FacePolygon::build(store, *f))
        .collect()
}

fn overall(polys: &[FacePolygon]) -> Aabb {
    let mut bounds = Aabb::empty();
    for p in polys {
        bounds.merge(&p.bounds);
    }
    bounds
}

/// Intersects, splits and classifies the faces of two operand shells
/// living in the same store.
///
/// Face pairs are processed in parallel. A pair whose intersection fails
/// is retried once with a relaxed tolerance; if that fails too, both faces
/// are left uncut and listed in [`Classified::failed`]. Fragments whose
/// sample rays all graze are classified through their neighbours.
#[instrument(skip_all)]
pub(crate) fn classify_operands(
    store: &TopologyStore,
    a: ShellId,
    b: ShellId,
    intersector: &dyn SurfaceIntersector,
    tol: f64,
    cancel: Option<&CancelToken>,
) -> Result<Classified> {
    let pa = polygons(store, a)?;
    let pb = polygons(store, b)?;

    if !overall(&pa).overlaps(&overall(&pb), tol) {
        debug!("operand boxes are disjoint");
        let mut fragments = Vec::new();
        for (polys, operand) in [(&pa, Operand::A), (&pb, Operand::B)] {
            for poly in polys.iter() {
                for mut f in split_face(store, poly, &[], operand, tol)? {
                    f.classification = Classification::Outside;
                    fragments.push(f);
                }
            }
        }
        return Ok(Classified {
            fragments,
            touched: false,
            failed: HashSet::new(),
        });
    }

    let pairs: Vec<(usize, usize)> = (0..pa.len())
        .flat_map(|i| (0..pb.len()).map(move |j| (i, j)))
        .filter(|&(i, j)| pa[i].bounds.overlaps(&pb[j].bounds, tol))
        .collect();
    debug!(pairs = pairs.len(), "intersecting face pairs");

    let results = pairs
        .par_iter()
        .map(|&(i, j)| -> Result<(usize, usize, Option<PairCuts>)> {
            check_cancel(cancel)?;
            let cuts = match intersect_face_pair(&pa[i], &pb[j], intersector, tol) {
                Ok(c) => Some(c),
                Err(first) => {
                    debug!(%first, "retrying face pair with relaxed tolerance");
                    match intersect_face_pair(&pa[i], &pb[j], intersector, tol * RELAX_FACTOR) {
                        Ok(c) => Some(c),
                        Err(err) => {
                            warn!(%err, "face pair left unresolved");
                            None
                        }
                    }
                }
            };
            Ok((i, j, cuts))
        })
        .collect::<Result<Vec<_>>>()?;

    let mut cuts_a: Vec<Vec<Cut>> = vec![Vec::new(); pa.len()];
    let mut cuts_b: Vec<Vec<Cut>> = vec![Vec::new(); pb.len()];
    let mut failed: HashSet<FaceId> = HashSet::new();
    let mut touched = false;
    for (i, j, cuts) in results {
        match cuts {
            Some(c) => {
                touched |= !c.is_empty();
                cuts_a[i].extend(c.on_a);
                cuts_b[j].extend(c.on_b);
            }
            None => {
                touched = true;
                failed.insert(pa[i].face);
                failed.insert(pb[j].face);
            }
        }
    }

    check_cancel(cancel)?;
    let split = |polys: &[FacePolygon], cuts: &[Vec<Cut>], operand: Operand| -> Result<Vec<Fragment>> {
        let per_face = polys
            .par_iter()
            .zip(cuts.par_iter())
            .map(|(poly, c)| split_face(store, poly, c, operand, tol))
            .collect::<Result<Vec<_>>>()?;
        Ok(per_face.into_iter().flatten().collect())
    };
    let mut fragments = split(&pa, &cuts_a, Operand::A)?;
    fragments.extend(split(&pb, &cuts_b, Operand::B)?);
    debug!(fragments = fragments.len(), "faces split");

    check_cancel(cancel)?;
    let normals: HashMap<FaceId, Vector3> = pa.iter().chain(&pb).map(|p| (p.face, p.normal)).collect();
    fragments.par_iter_mut().for_each(|f| {
        let others = match f.operand {
            Operand::A => &pb,
            Operand::B => &pa,
        };
        f.classification = match (failed.contains(&f.face), f.sample, normals.get(&f.face)) {
            (false, Some(sample), Some(normal)) => classify_point(&sample, normal, others, tol),
            _ => Classification::Ambiguous,
        };
    });

    let ambiguous = fragments
        .iter()
        .filter(|f| f.classification == Classification::Ambiguous)
        .count();
    if ambiguous > 0 {
        let resolved = propagate(&mut fragments, &failed, tol);
        warn!(ambiguous, resolved, failed = failed.len(), "classified fragments through their neighbours");
    }
    Ok(Classified {
        fragments,
        touched,
        failed,
    })
}

/// Gives unclassified fragments the classification of a neighbour of the
/// same operand across a shared face edge, breadth first from the
/// classified fragments in index order. Fragments of `failed` faces were
/// never cut and are left alone. Returns how many were resolved.
fn propagate(fragments: &mut [Fragment], failed: &HashSet<FaceId>, tol: f64) -> usize {
    let mut groups: HashMap<(Operand, Vec<Name>), Vec<(usize, Point3, Point3)>> = HashMap::new();
    for (k, f) in fragments.iter().enumerate() {
        for ring in f.rings() {
            for (a, b, side) in ring.segments() {
                if !side.cut {
                    groups
                        .entry((f.operand, side.lineage.clone()))
                        .or_default()
                        .push((k, *a, *b));
                }
            }
        }
    }
    let mut adjacent: Vec<Vec<usize>> = vec![Vec::new(); fragments.len()];
    for list in groups.values() {
        for (x, &(k, a0, a1)) in list.iter().enumerate() {
            for &(l, b0, b1) in &list[x + 1..] {
                if k != l && sides_overlap(&a0, &a1, &b0, &b1, tol) {
                    adjacent[k].push(l);
                    adjacent[l].push(k);
                }
            }
        }
    }
    for list in &mut adjacent {
        list.sort_unstable();
        list.dedup();
    }

    let mut queue: VecDeque<usize> = (0..fragments.len())
        .filter(|&k| fragments[k].classification.is_volumetric())
        .collect();
    let mut resolved = 0;
    while let Some(k) = queue.pop_front() {
        let c = fragments[k].classification;
        for &l in &adjacent[k] {
            if fragments[l].classification == Classification::Ambiguous && !failed.contains(&fragments[l].face) {
                fragments[l].classification = c;
                queue.push_back(l);
                resolved += 1;
            }
        }
    }
    resolved
}

/// Collinear segments sharing a stretch longer than `tol`.
fn sides_overlap(a0: &Point3, a1: &Point3, b0: &Point3, b1: &Point3, tol: f64) -> bool {
    let d = a1 - a0;
    let len = d.norm();
    if len <= tol {
        return false;
    }
    let u = d / len;
    let offset = |p: &Point3| {
        let w = p - a0;
        (w - u * w.dot(&u)).norm()
    };
    if offset(b0) > tol || offset(b1) > tol {
        return false;
    }
    let (s0, s1) = ((b0 - a0).dot(&u), (b1 - a0).dot(&u));
    s0.max(s1).min(len) - s0.min(s1).max(0.0) > tol
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::geometry::{IntersectionFailure, Plane, PlanarIntersector, Segment, SpaceCurve};
    use crate::naming::NamingContext;
    use crate::operations::boolean::classify::RAY_DIRECTIONS;
    use crate::operations::{MakeBox, MakePolyhedron};
    use crate::topology::transfer::import_shell;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    fn two_boxes(offset: f64) -> (TopologyStore, ShellId, ShellId) {
        let mut store = TopologyStore::new();
        let ctx = NamingContext::new();
        let a = MakeBox::new(p(0.0, 0.0, 0.0), p(2.0, 2.0, 2.0)).execute(&mut store, &ctx).unwrap();
        let b = MakeBox::new(p(offset, 0.5, 0.5), p(offset + 2.0, 1.5, 1.5))
            .execute(&mut store, &ctx)
            .unwrap();
        (store, a, b)
    }

    /// Fails every surface pair.
    struct Broken;

    impl SurfaceIntersector for Broken {
        fn intersect_surfaces(&self, _: &Plane, _: &Plane, _: f64) -> std::result::Result<Vec<SpaceCurve>, IntersectionFailure> {
            Err(IntersectionFailure { reason: "broken".into() })
        }

        fn intersect_edges(&self, a: &Segment, b: &Segment, tol: f64) -> Vec<Point3> {
            PlanarIntersector.intersect_edges(a, b, tol)
        }
    }

    #[test]
    fn disjoint_operands_are_all_outside() {
        let (store, a, b) = two_boxes(5.0);
        let out = classify_operands(&store, a, b, &PlanarIntersector, 1e-7, None).unwrap();
        assert!(!out.touched);
        assert_eq!(out.fragments.len(), 12);
        assert!(out.fragments.iter().all(|f| f.classification == Classification::Outside));
    }

    #[test]
    fn crossing_boxes_are_split_and_classified() {
        let (store, a, b) = two_boxes(1.0);
        let out = classify_operands(&store, a, b, &PlanarIntersector, 1e-7, None).unwrap();
        assert!(out.touched);
        let inside_b = out
            .fragments
            .iter()
            .filter(|f| f.operand == Operand::B && f.classification == Classification::Inside)
            .count();
        let outside_b = out
            .fragments
            .iter()
            .filter(|f| f.operand == Operand::B && f.classification == Classification::Outside)
            .count();
        assert!(inside_b > 0 && outside_b > 0);
        assert!(out.fragments.iter().all(|f| f.classification != Classification::Ambiguous));
    }

    #[test]
    fn identical_operands_lie_on_each_other() {
        let mut store = TopologyStore::new();
        let a = MakeBox::new(p(0.0, 0.0, 0.0), p(1.0, 1.0, 1.0))
            .execute(&mut store, &NamingContext::new())
            .unwrap();
        let src = store.clone();
        let b = import_shell(&mut store, &src, a).unwrap();
        let out = classify_operands(&store, a, b, &PlanarIntersector, 1e-7, None).unwrap();
        assert_eq!(out.fragments.len(), 12);
        assert!(out
            .fragments
            .iter()
            .all(|f| f.classification == Classification::OnBoundary { same_orientation: true }));
    }

    #[test]
    fn failed_pairs_stay_ambiguous() {
        let (store, a, b) = two_boxes(1.0);
        let out = classify_operands(&store, a, b, &Broken, 1e-7, None).unwrap();
        assert!(out.touched);
        assert!(!out.failed.is_empty());
        assert_eq!(out.fragments.len(), 12);
        for f in &out.fragments {
            if out.failed.contains(&f.face) {
                assert_eq!(f.classification, Classification::Ambiguous);
            } else {
                assert!(f.classification.is_volumetric());
            }
        }
    }

    /// A fragment whose every sample ray runs through a vertex of the other
    /// operand takes its classification from a neighbouring fragment.
    #[test]
    fn grazing_sample_takes_a_neighbours_class() {
        let tol = 1e-7;
        let ctx = NamingContext::new();
        let mut store = TopologyStore::new();
        let a = MakeBox::new(p(0.0, 0.0, 0.0), p(1.0, 1.0, 1.0)).execute(&mut store, &ctx).unwrap();
        let target = FacePolygon::build(&store, store.shell(a).unwrap().faces[0]).unwrap();
        let sample = split_face(&store, &target, &[], Operand::A, tol).unwrap()[0].sample.unwrap();

        // One small triangle per ray direction, with a corner on the ray.
        let mut points = Vec::new();
        let mut faces = Vec::new();
        for d in RAY_DIRECTIONS {
            let d = Vector3::from(d);
            let u = d.cross(&Vector3::x()).normalize();
            let v = d.cross(&u);
            let corner = sample + d * 3.0;
            let base = points.len();
            points.extend([corner, corner + u * 0.1, corner + v * 0.1]);
            faces.push(vec![base, base + 1, base + 2]);
        }
        let b = MakePolyhedron::new(points, faces).execute(&mut store, &ctx).unwrap();
        let fins: Vec<FacePolygon> = store
            .shell(b)
            .unwrap()
            .faces
            .iter()
            .map(|f| FacePolygon::build(&store, *f).unwrap())
            .collect();
        assert_eq!(classify_point(&sample, &target.normal, &fins, tol), Classification::Ambiguous);

        let out = classify_operands(&store, a, b, &PlanarIntersector, tol, None).unwrap();
        assert!(out.failed.is_empty());
        let frag = out.fragments.iter().find(|f| f.face == target.face).unwrap();
        assert!(frag.classification.is_volumetric());
    }

    #[test]
    fn cancelled_run_stops() {
        let (store, a, b) = two_boxes(1.0);
        let token = CancelToken::new();
        token.cancel();
        assert!(classify_operands(&store, a, b, &PlanarIntersector, 1e-7, Some(&token)).is_err());
    }

    #[test]
    fn overlapping_sides_are_detected() {
        assert!(sides_overlap(&p(0.0, 0.0, 0.0), &p(2.0, 0.0, 0.0), &p(3.0, 0.0, 0.0), &p(1.0, 0.0, 0.0), 1e-9));
        assert!(!sides_overlap(&p(0.0, 0.0, 0.0), &p(1.0, 0.0, 0.0), &p(1.0, 0.0, 0.0), &p(2.0, 0.0, 0.0), 1e-9));
        assert!(!sides_overlap(&p(0.0, 0.0, 0.0), &p(1.0, 0.0, 0.0), &p(0.0, 1.0, 0.0), &p(1.0, 1.0, 0.0), 1e-9));
    }
}
