use std::collections::HashMap;

use tracing::{debug, warn};

use super::bubble::PointGrid;
use super::union_find::UnionFind;
use crate::error::{BrepError, Result, TopologyError};
use crate::geometry::{Line, Segment, SpaceCurve, SurfaceIntersector};
use crate::math::Aabb;
use crate::naming::Name;
use crate::topology::mutate::{ancestry, merge_edges, merge_vertices, split_edge};
use crate::topology::{EdgeId, ShellId, TopologyStore, VertexId};

/// Rounds of T-junction splitting before the welder gives up.
const MAX_SPLIT_ROUNDS: usize = 8;

/// What a weld pass did to a shell.
#[derive(Debug, Clone, Default)]
pub(crate) struct WeldReport {
    pub merged_vertices: usize,
    pub merged_edges: usize,
    pub split_edges: usize,
    /// Endpoint-sharing edge groups that could not be fused pairwise.
    pub ambiguous_buckets: Vec<Vec<EdgeId>>,
    /// Edges still used by a single face.
    pub unmatched_edges: Vec<EdgeId>,
}

/// Turns coincident boundaries of independent faces into shared topology.
///
/// `vertices` and `radii` give each vertex its matching bubble. Vertices
/// whose bubbles overlap are fused, edges joining the same fused vertices
/// are paired, boundary edges touching another boundary vertex in their
/// interior are split there, and shared edges get the carrier line of the
/// two planes they separate.
pub(crate) fn weld_shell(
    store: &mut TopologyStore,
    shell: ShellId,
    vertices: &[VertexId],
    radii: &[f64],
    intersector: &dyn SurfaceIntersector,
    tol: f64,
) -> Result<WeldReport> {
    let mut report = WeldReport {
        merged_vertices: fuse_vertices(store, vertices, radii)?,
        ..WeldReport::default()
    };
    report.merged_edges += pair_edges(store, shell)?;

    for _ in 0..MAX_SPLIT_ROUNDS {
        let splits = split_t_junctions(store, shell, intersector, tol)?;
        if splits == 0 {
            break;
        }
        report.split_edges += splits;
        report.merged_edges += pair_edges(store, shell)?;
    }

    refine_shared_edges(store, shell, intersector, tol)?;

    let mut buckets: HashMap<(VertexId, VertexId), Vec<EdgeId>> = HashMap::new();
    let mut order = Vec::new();
    for e in store.shell_edges(shell)? {
        let ed = store.edge(e)?;
        if ed.uses.len() == 1 {
            report.unmatched_edges.push(e);
        }
        let key = bucket_key(ed.start, ed.end);
        let bucket = buckets.entry(key).or_default();
        if bucket.is_empty() {
            order.push(key);
        }
        bucket.push(e);
    }
    for key in order {
        if let Some(bucket) = buckets.remove(&key) {
            let open = bucket
                .iter()
                .map(|e| store.edge(*e).map(|d| d.uses.len() < 2))
                .collect::<std::result::Result<Vec<_>, _>>()?;
            if bucket.len() > 1 && open.contains(&true) {
                report.ambiguous_buckets.push(bucket);
            }
        }
    }

    debug!(
        vertices = report.merged_vertices,
        edges = report.merged_edges,
        splits = report.split_edges,
        open = report.unmatched_edges.len(),
        "weld finished"
    );
    Ok(report)
}

fn bucket_key(a: VertexId, b: VertexId) -> (VertexId, VertexId) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// A mutator refusal that only means "this pair cannot be fused".
pub(crate) fn is_refusal(err: &BrepError) -> bool {
    matches!(
        err,
        BrepError::Topology(
            TopologyError::DegenerateLoop(_)
                | TopologyError::InconsistentAdjacency(_)
                | TopologyError::NonManifoldEdge { .. }
        )
    )
}

fn fuse_vertices(store: &mut TopologyStore, vertices: &[VertexId], radii: &[f64]) -> Result<usize> {
    let points = vertices
        .iter()
        .map(|v| store.vertex(*v).map(|d| d.point))
        .collect::<std::result::Result<Vec<_>, _>>()?;
    let max_r = radii.iter().copied().fold(0.0, f64::max);
    let mut grid = PointGrid::new(2.0 * max_r);
    for (i, p) in points.iter().enumerate() {
        grid.insert(i, p);
    }

    let mut uf = UnionFind::new(vertices.len());
    for (i, p) in points.iter().enumerate() {
        for j in grid.near(p) {
            if j > i && (p - points[j]).norm() < radii[i] + radii[j] {
                uf.union(i, j);
            }
        }
    }

    let mut merged = 0;
    for group in uf.groups() {
        let keep = vertices[group[0]];
        for &k in &group[1..] {
            match merge_vertices(store, keep, vertices[k]) {
                Ok(()) => merged += 1,
                Err(e) if is_refusal(&e) => warn!(error = %e, "vertices in one bubble class kept apart"),
                Err(e) => return Err(e),
            }
        }
    }
    Ok(merged)
}

/// Fuses every pair of edges joining the same two vertices.
fn pair_edges(store: &mut TopologyStore, shell: ShellId) -> Result<usize> {
    let mut buckets: HashMap<(VertexId, VertexId), Vec<EdgeId>> = HashMap::new();
    let mut order = Vec::new();
    for e in store.shell_edges(shell)? {
        let ed = store.edge(e)?;
        let key = bucket_key(ed.start, ed.end);
        let bucket = buckets.entry(key).or_default();
        if bucket.is_empty() {
            order.push(key);
        }
        bucket.push(e);
    }

    let mut merged = 0;
    for key in order {
        let Some(bucket) = buckets.get(&key) else {
            continue;
        };
        if bucket.len() > 2 {
            let paired = pair_by_ancestry(store, bucket)?;
            if paired == 0 {
                warn!(edges = bucket.len(), "ambiguous edge bucket left open");
            }
            merged += paired;
            continue;
        }
        if bucket.len() != 2 {
            continue;
        }
        let (keep, remove) = (bucket[0], bucket[1]);
        if store.edge(keep)?.uses.len() + store.edge(remove)?.uses.len() > 2 {
            continue;
        }
        match merge_edges(store, keep, remove) {
            Ok(()) => merged += 1,
            Err(e) if is_refusal(&e) => warn!(error = %e, "edge pair kept apart"),
            Err(e) => return Err(e),
        }
    }
    Ok(merged)
}

/// Pairs the single-use edges of an overfull bucket that descend from the
/// same original edge. Two solids touching along one edge each get their
/// own pair back. Returns the number of pairs fused.
fn pair_by_ancestry(store: &mut TopologyStore, bucket: &[EdgeId]) -> Result<usize> {
    let mut by_origin: HashMap<Vec<Name>, Vec<EdgeId>> = HashMap::new();
    let mut order = Vec::new();
    for &e in bucket {
        let ed = store.edge(e)?;
        let origin = ancestry(ed.name.as_ref(), &ed.lineage);
        if ed.uses.len() != 1 || origin.is_empty() {
            return Ok(0);
        }
        let group = by_origin.entry(origin.clone()).or_default();
        if group.is_empty() {
            order.push(origin);
        }
        group.push(e);
    }
    if by_origin.values().any(|g| g.len() != 2) {
        return Ok(0);
    }

    let mut merged = 0;
    for origin in order {
        let Some(&[keep, remove]) = by_origin.get(&origin).map(Vec::as_slice) else {
            continue;
        };
        match merge_edges(store, keep, remove) {
            Ok(()) => merged += 1,
            Err(e) if is_refusal(&e) => warn!(error = %e, "edge pair kept apart"),
            Err(e) => return Err(e),
        }
    }
    Ok(merged)
}

/// Splits boundary edges at boundary vertices lying in their interior.
fn split_t_junctions(
    store: &mut TopologyStore,
    shell: ShellId,
    intersector: &dyn SurfaceIntersector,
    tol: f64,
) -> Result<usize> {
    let mut boundary: Vec<(EdgeId, Segment, Aabb)> = Vec::new();
    for e in store.shell_edges(shell)? {
        if store.edge(e)?.uses.len() == 1 {
            let seg = store.edge_segment(e)?;
            let aabb = Aabb::from_points([&seg.start, &seg.end]);
            boundary.push((e, seg, aabb));
        }
    }

    let mut splits: HashMap<EdgeId, Vec<(f64, VertexId)>> = HashMap::new();
    for (e, se, ae) in &boundary {
        let ed = store.edge(*e)?;
        for (f, sf, af) in &boundary {
            if e == f || !ae.overlaps(af, tol) {
                continue;
            }
            let ef = store.edge(*f)?;
            for pt in intersector.intersect_edges(se, sf, tol) {
                for vf in [ef.start, ef.end] {
                    if vf == ed.start || vf == ed.end {
                        continue;
                    }
                    let q = store.vertex(vf)?.point;
                    if (pt - q).norm() > tol {
                        continue;
                    }
                    let len = se.length();
                    let t = se.parameter_of(&q);
                    if t * len > tol && (1.0 - t) * len > tol {
                        splits.entry(*e).or_default().push((t, vf));
                    }
                }
            }
        }
    }

    let mut count = 0;
    for (e, _, _) in &boundary {
        let Some(mut list) = splits.remove(e) else {
            continue;
        };
        list.sort_by(|a, b| b.0.total_cmp(&a.0));
        list.dedup_by(|a, b| a.1 == b.1);
        for (_, target) in list {
            let point = store.vertex(target)?.point;
            let (fresh, _) = match split_edge(store, *e, point, tol) {
                Ok(r) => r,
                Err(err) if is_refusal(&err) => continue,
                Err(err) => return Err(err),
            };
            merge_vertices(store, target, fresh)?;
            count += 1;
        }
    }
    Ok(count)
}

/// Replaces the carrier of every two-sided edge with the intersection
/// line of its faces' planes.
fn refine_shared_edges(
    store: &mut TopologyStore,
    shell: ShellId,
    intersector: &dyn SurfaceIntersector,
    tol: f64,
) -> Result<()> {
    for e in store.shell_edges(shell)? {
        let ed = store.edge(e)?;
        let [ua, ub] = ed.uses.as_slice() else {
            continue;
        };
        let (start, end) = (ed.start, ed.end);
        let pa = store.face_plane(ua.face)?;
        let pb = store.face_plane(ub.face)?;
        let Ok(curves) = intersector.intersect_surfaces(pa, pb, tol) else {
            continue;
        };
        let Some(SpaceCurve::Line { line, .. }) = curves.first() else {
            continue;
        };
        let seg = store.edge_segment(e)?;
        let dev_start = line.distance_to(&seg.start);
        let dev_end = line.distance_to(&seg.end);
        if dev_start.max(dev_end) > tol {
            continue;
        }
        let line = if line.direction().dot(&(seg.end - seg.start)) < 0.0 {
            Line::new(*line.origin(), -line.direction())?
        } else {
            line.clone()
        };
        let (t_start, t_end) = (line.parameter_of(&seg.start), line.parameter_of(&seg.end));
        {
            let edge = store.edge_mut(e)?;
            edge.curve = line;
            edge.t_start = t_start;
            edge.t_end = t_end;
        }
        let vs = store.vertex_mut(start)?;
        vs.tolerance = vs.tolerance.max(dev_start);
        let ve = store.vertex_mut(end)?;
        ve.tolerance = ve.tolerance.max(dev_end);
    }
    Ok(())
}
