use std::collections::HashMap;
use std::f64::consts::TAU;

use crate::error::Result;
use crate::math::intersect_2d::{cross_2d, segment_segment_intersect_2d, SegmentIntersection2d};
use crate::math::polygon_2d::{clip_segment_to_region, interior_point, locate_point, signed_area, PointLocation};
use crate::math::{Point2, Point3, Vector2};
use crate::naming::Name;
use crate::operations::Operand;
use crate::topology::mutate::ancestry;
use crate::topology::{FaceId, TopologyStore};

use super::classify::Classification;
use super::face_intersection::{Cut, FacePolygon};

/// Corner of a fragment ring.
#[derive(Debug, Clone)]
pub(crate) struct RingVertex {
    pub point: Point3,
    pub lineage: Vec<Name>,
}

/// Side of a fragment ring.
#[derive(Debug, Clone)]
pub(crate) struct RingSide {
    pub lineage: Vec<Name>,
    /// The side lies on an intersection cut rather than the face boundary.
    pub cut: bool,
}

/// Closed fragment boundary. Side `i` runs from vertex `i` to `i + 1`.
#[derive(Debug, Clone, Default)]
pub(crate) struct Ring {
    pub vertices: Vec<RingVertex>,
    pub sides: Vec<RingSide>,
}

impl Ring {
    pub(crate) fn reversed(&self) -> Self {
        let n = self.vertices.len();
        let vertices = self.vertices.iter().rev().cloned().collect();
        // New side i joins old vertices n-1-i and n-2-i.
        let sides = (0..n).map(|i| self.sides[(2 * n - 2 - i) % n].clone()).collect();
        Self { vertices, sides }
    }

    pub(crate) fn segments(&self) -> impl Iterator<Item = (&Point3, &Point3, &RingSide)> + '_ {
        let n = self.vertices.len();
        (0..n).map(move |i| {
            (
                &self.vertices[i].point,
                &self.vertices[(i + 1) % n].point,
                &self.sides[i],
            )
        })
    }
}

/// A piece of an operand face bounded by its own edges and the cuts of
/// the other operand.
#[derive(Debug, Clone)]
pub(crate) struct Fragment {
    pub operand: Operand,
    /// Face of the scratch store the fragment was cut from.
    pub face: FaceId,
    pub outer: Ring,
    pub holes: Vec<Ring>,
    /// Point strictly inside the fragment.
    pub sample: Option<Point3>,
    pub classification: Classification,
}

impl Fragment {
    pub(crate) fn rings(&self) -> impl Iterator<Item = &Ring> {
        std::iter::once(&self.outer).chain(&self.holes)
    }
}

#[derive(Debug, Clone)]
struct RawSegment {
    ends2: [Point2; 2],
    ends3: [Point3; 2],
    cut: bool,
    lineage: Vec<Name>,
}

#[derive(Debug, Clone)]
struct ArrEdge {
    a: usize,
    b: usize,
    cut: bool,
    lineage: Vec<Name>,
}

/// Planar graph of face boundary and cut segments with snapped nodes.
struct Arrangement {
    tol: f64,
    nodes2: Vec<Point2>,
    nodes3: Vec<Point3>,
    lineage: Vec<Vec<Name>>,
    fixed: Vec<bool>,
    edges: Vec<ArrEdge>,
    index: HashMap<(usize, usize), usize>,
}

impl Arrangement {
    fn new(tol: f64) -> Self {
        Self {
            tol,
            nodes2: Vec::new(),
            nodes3: Vec::new(),
            lineage: Vec::new(),
            fixed: Vec::new(),
            edges: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Node at `p`, snapping to an existing one within tolerance. Face
    /// corners (`fixed`) keep their own lineage; other nodes collect the
    /// lineage of every segment passing through them.
    fn node(&mut self, p2: Point2, p3: Point3, lineage: &[Name], fixed: bool) -> usize {
        if let Some(i) = self.nodes2.iter().position(|q| (q - p2).norm() <= self.tol) {
            if fixed && !self.fixed[i] {
                self.fixed[i] = true;
                self.lineage[i] = lineage.to_vec();
            } else if !self.fixed[i] {
                let l = &mut self.lineage[i];
                l.extend_from_slice(lineage);
                l.sort();
                l.dedup();
            }
            return i;
        }
        self.nodes2.push(p2);
        self.nodes3.push(p3);
        let mut l = lineage.to_vec();
        l.sort();
        l.dedup();
        self.lineage.push(l);
        self.fixed.push(fixed);
        self.nodes2.len() - 1
    }

    /// Boundary edges override coincident cuts; duplicate cuts collapse.
    fn add_edge(&mut self, a: usize, b: usize, cut: bool, lineage: &[Name]) {
        if a == b {
            return;
        }
        let key = (a.min(b), a.max(b));
        let edge = ArrEdge {
            a,
            b,
            cut,
            lineage: lineage.to_vec(),
        };
        match self.index.get(&key) {
            Some(&i) => {
                if !cut && self.edges[i].cut {
                    self.edges[i] = edge;
                }
            }
            None => {
                self.index.insert(key, self.edges.len());
                self.edges.push(edge);
            }
        }
    }

    /// Removes cut edges hanging from a node of degree one.
    fn prune_dangling(&mut self) {
        loop {
            let mut degree = vec![0usize; self.nodes2.len()];
            for e in &self.edges {
                degree[e.a] += 1;
                degree[e.b] += 1;
            }
            let before = self.edges.len();
            self.edges.retain(|e| !e.cut || (degree[e.a] > 1 && degree[e.b] > 1));
            if self.edges.len() == before {
                break;
            }
        }
        self.index.clear();
    }

    /// Traces the faces of the arrangement, keeping the region on the left.
    ///
    /// Boundary edges are traversed one way only, cuts both ways. Every
    /// traced cycle is returned as a list of half-edges `(from, to, edge)`.
    fn cycles(&self) -> Vec<Vec<(usize, usize, usize)>> {
        let mut half = Vec::new();
        for (k, e) in self.edges.iter().enumerate() {
            half.push((e.a, e.b, k));
            if e.cut {
                half.push((e.b, e.a, k));
            }
        }
        let mut outgoing: Vec<Vec<usize>> = vec![Vec::new(); self.nodes2.len()];
        for (h, &(from, _, _)) in half.iter().enumerate() {
            outgoing[from].push(h);
        }

        let next = |h: usize| -> Option<usize> {
            let (from, to, _) = half[h];
            let back = self.nodes2[from] - self.nodes2[to];
            outgoing[to]
                .iter()
                .map(|&c| (c, turn(&back, &(self.nodes2[half[c].1] - self.nodes2[to]))))
                .min_by(|x, y| x.1.total_cmp(&y.1))
                .map(|(c, _)| c)
        };

        let mut used = vec![false; half.len()];
        let mut cycles = Vec::new();
        for start in 0..half.len() {
            if used[start] {
                continue;
            }
            let mut cycle = Vec::new();
            let mut h = start;
            let closed = loop {
                if used[h] {
                    break h == start;
                }
                used[h] = true;
                cycle.push(half[h]);
                match next(h) {
                    Some(n) => h = n,
                    None => break false,
                }
            };
            if closed {
                cycles.push(cycle);
            }
        }
        cycles
    }

    fn ring(&self, cycle: &[(usize, usize, usize)]) -> Ring {
        Ring {
            vertices: cycle
                .iter()
                .map(|&(from, _, _)| RingVertex {
                    point: self.nodes3[from],
                    lineage: self.lineage[from].clone(),
                })
                .collect(),
            sides: cycle
                .iter()
                .map(|&(_, _, e)| RingSide {
                    lineage: self.edges[e].lineage.clone(),
                    cut: self.edges[e].cut,
                })
                .collect(),
        }
    }

    fn flat(&self, cycle: &[(usize, usize, usize)]) -> Vec<Point2> {
        cycle.iter().map(|&(from, _, _)| self.nodes2[from]).collect()
    }
}

/// Clockwise turn from `back` to `out`, in `(0, 2π]`. Going straight back
/// is the largest turn.
fn turn(back: &Vector2, out: &Vector2) -> f64 {
    let cw = -cross_2d(back, out).atan2(back.dot(out));
    if cw <= 0.0 {
        cw + TAU
    } else {
        cw
    }
}

/// Splits one operand face along the cuts imprinted on it.
///
/// A face without effective cuts comes back as a single fragment.
pub(crate) fn split_face(
    store: &TopologyStore,
    poly: &FacePolygon,
    cuts: &[Cut],
    operand: Operand,
    tol: f64,
) -> Result<Vec<Fragment>> {
    let face = store.face(poly.face)?;
    let mut arr = Arrangement::new(tol);
    let mut raw = Vec::new();

    for l in face.loops() {
        let vertices = store.loop_vertices(l)?;
        let edges = &store.loop_(l)?.edges;
        let n = vertices.len();
        let mut ends = Vec::with_capacity(n);
        for &v in &vertices {
            let vd = store.vertex(v)?;
            let p2 = poly.to_frame(&vd.point);
            arr.node(p2, vd.point, &ancestry(vd.name.as_ref(), &vd.lineage), true);
            ends.push((p2, vd.point));
        }
        for (i, oe) in edges.iter().enumerate() {
            let ed = store.edge(oe.edge)?;
            let (s, e) = (ends[i], ends[(i + 1) % n]);
            raw.push(RawSegment {
                ends2: [s.0, e.0],
                ends3: [s.1, e.1],
                cut: false,
                lineage: ancestry(ed.name.as_ref(), &ed.lineage),
            });
        }
    }

    for cut in cuts {
        let (a2, b2) = (poly.to_frame(&cut.start), poly.to_frame(&cut.end));
        let len = (b2 - a2).norm();
        for (s, e) in clip_segment_to_region(&a2, &b2, &poly.outer, &poly.holes, tol) {
            if (e - s) * len <= tol {
                continue;
            }
            let d3 = cut.end - cut.start;
            raw.push(RawSegment {
                ends2: [a2 + (b2 - a2) * s, a2 + (b2 - a2) * e],
                ends3: [cut.start + d3 * s, cut.start + d3 * e],
                cut: true,
                lineage: cut.lineage.clone(),
            });
        }
    }

    // Split every segment at its contacts with the others.
    let mut params: Vec<Vec<f64>> = vec![vec![0.0, 1.0]; raw.len()];
    for i in 0..raw.len() {
        for j in i + 1..raw.len() {
            let (a, b) = (&raw[i], &raw[j]);
            if !a.cut && !b.cut {
                continue;
            }
            match segment_segment_intersect_2d(&a.ends2[0], &a.ends2[1], &b.ends2[0], &b.ends2[1], tol) {
                SegmentIntersection2d::None => {}
                SegmentIntersection2d::Point { t, u, .. } => {
                    params[i].push(t);
                    params[j].push(u);
                }
                SegmentIntersection2d::Overlap { start, end } => {
                    params[i].extend([start.0, end.0]);
                    params[j].extend([start.1, end.1]);
                }
            }
        }
    }
    for (seg, ts) in raw.iter().zip(params.iter_mut()) {
        let len = (seg.ends2[1] - seg.ends2[0]).norm();
        ts.sort_by(f64::total_cmp);
        ts.dedup_by(|x, y| (*x - *y).abs() * len <= tol);
        let mut prev: Option<usize> = None;
        for &t in ts.iter() {
            let p2 = seg.ends2[0] + (seg.ends2[1] - seg.ends2[0]) * t;
            let p3 = seg.ends3[0] + (seg.ends3[1] - seg.ends3[0]) * t;
            let node = arr.node(p2, p3, &seg.lineage, false);
            if let Some(p) = prev {
                arr.add_edge(p, node, seg.cut, &seg.lineage);
            }
            prev = Some(node);
        }
    }
    arr.prune_dangling();

    let min_area = tol * tol;
    let mut regions = Vec::new();
    let mut holes = Vec::new();
    for cycle in arr.cycles() {
        let flat = arr.flat(&cycle);
        let area = signed_area(&flat);
        if area > min_area {
            regions.push((cycle, flat, area));
        } else if area < -min_area {
            holes.push((cycle, flat));
        }
    }

    let mut region_holes: Vec<Vec<usize>> = vec![Vec::new(); regions.len()];
    for (h, (cycle, _)) in holes.iter().enumerate() {
        let (from, to, _) = cycle[0];
        let (a, b) = (arr.nodes2[from], arr.nodes2[to]);
        let d = (b - a).normalize();
        let probe = a + (b - a) * 0.5 + Vector2::new(-d.y, d.x) * (10.0 * tol);
        let owner = regions
            .iter()
            .enumerate()
            .filter(|(_, (_, flat, _))| locate_point(&probe, flat, &[], tol) == PointLocation::Inside)
            .map(|(r, (_, _, area))| (r, *area))
            .min_by(|x, y| x.1.total_cmp(&y.1))
            .map(|(r, _)| r);
        if let Some(r) = owner {
            region_holes[r].push(h);
        }
    }

    let mut fragments = Vec::with_capacity(regions.len());
    for ((cycle, flat, _), hole_ids) in regions.iter().zip(&region_holes) {
        let flat_holes: Vec<Vec<Point2>> = hole_ids.iter().map(|&h| holes[h].1.clone()).collect();
        fragments.push(Fragment {
            operand,
            face: poly.face,
            outer: arr.ring(cycle),
            holes: hole_ids.iter().map(|&h| arr.ring(&holes[h].0)).collect(),
            sample: interior_point(flat, &flat_holes).map(|q| poly.from_frame(&q)),
            classification: Classification::Ambiguous,
        });
    }
    Ok(fragments)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::naming::NamingContext;
    use crate::operations::MakeBox;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    fn bottom_face(store: &mut TopologyStore) -> FacePolygon {
        let shell = MakeBox::new(p(0.0, 0.0, 0.0), p(4.0, 4.0, 1.0))
            .execute(store, &NamingContext::new())
            .unwrap();
        let face = store.shell(shell).unwrap().faces[0];
        FacePolygon::build(store, face).unwrap()
    }

    fn cut(a: Point3, b: Point3) -> Cut {
        Cut {
            start: a,
            end: b,
            lineage: Vec::new(),
        }
    }

    #[test]
    fn uncut_face_is_one_fragment() {
        let mut store = TopologyStore::new();
        let poly = bottom_face(&mut store);
        let frags = split_face(&store, &poly, &[], Operand::A, 1e-7).unwrap();
        assert_eq!(frags.len(), 1);
        assert_eq!(frags[0].outer.vertices.len(), 4);
        assert!(frags[0].outer.sides.iter().all(|s| !s.cut));
        assert!(frags[0].sample.is_some());
    }

    #[test]
    fn crossing_cut_makes_two_fragments() {
        let mut store = TopologyStore::new();
        let poly = bottom_face(&mut store);
        let frags = split_face(&store, &poly, &[cut(p(2.0, -1.0, 0.0), p(2.0, 5.0, 0.0))], Operand::A, 1e-7).unwrap();
        assert_eq!(frags.len(), 2);
        for f in &frags {
            assert_eq!(f.outer.vertices.len(), 4);
            assert_eq!(f.outer.sides.iter().filter(|s| s.cut).count(), 1);
        }
    }

    #[test]
    fn dangling_cut_is_ignored() {
        let mut store = TopologyStore::new();
        let poly = bottom_face(&mut store);
        let frags = split_face(&store, &poly, &[cut(p(2.0, -1.0, 0.0), p(2.0, 2.0, 0.0))], Operand::A, 1e-7).unwrap();
        assert_eq!(frags.len(), 1);
        assert!(frags[0].outer.sides.iter().all(|s| !s.cut));
    }

    #[test]
    fn closed_cut_loop_leaves_a_hole() {
        let mut store = TopologyStore::new();
        let poly = bottom_face(&mut store);
        let cuts = [
            cut(p(1.0, 1.0, 0.0), p(3.0, 1.0, 0.0)),
            cut(p(3.0, 1.0, 0.0), p(3.0, 3.0, 0.0)),
            cut(p(3.0, 3.0, 0.0), p(1.0, 3.0, 0.0)),
            cut(p(1.0, 3.0, 0.0), p(1.0, 1.0, 0.0)),
        ];
        let mut frags = split_face(&store, &poly, &cuts, Operand::B, 1e-7).unwrap();
        assert_eq!(frags.len(), 2);
        frags.sort_by_key(|f| f.holes.len());
        assert!(frags[0].holes.is_empty());
        assert_eq!(frags[1].holes.len(), 1);
        let inner = frags[0].sample.unwrap();
        assert!(inner.x > 1.0 && inner.x < 3.0 && inner.y > 1.0 && inner.y < 3.0);
    }

    #[test]
    fn reversed_ring_keeps_sides_with_their_ends() {
        let mut store = TopologyStore::new();
        let poly = bottom_face(&mut store);
        let frags = split_face(&store, &poly, &[cut(p(2.0, -1.0, 0.0), p(2.0, 5.0, 0.0))], Operand::A, 1e-7).unwrap();
        let ring = &frags[0].outer;
        let rev = ring.reversed();
        let cut_mid = |r: &Ring| {
            r.segments()
                .find(|(_, _, s)| s.cut)
                .map(|(a, b, _)| (a + b.coords) * 0.5)
                .unwrap()
        };
        assert!((cut_mid(ring) - cut_mid(&rev)).norm() < 1e-12);
    }
}
