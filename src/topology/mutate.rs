//! Topology mutators.
//!
//! Every mutator validates its preconditions before writing anything, so a
//! returned error leaves the store exactly as it was.

use std::collections::{BTreeMap, HashSet};

use tracing::{debug, instrument};

use super::{
    EdgeId, EdgeUse, FaceData, FaceId, LoopData, LoopId, OrientedEdge, SurfaceId, TopologyStore,
    VertexData, VertexId,
};
use crate::error::{Result, TopologyError};
use crate::geometry::Segment;
use crate::math::intersect_2d::cross_2d;
use crate::math::polygon_3d::polygon_area_3d;
use crate::math::{Point3, Vector2, TOLERANCE};
use crate::naming::Name;

/// The names an element contributes to whatever replaces it.
pub(crate) fn ancestry(name: Option<&Name>, lineage: &[Name]) -> Vec<Name> {
    match name {
        Some(n) => vec![n.clone()],
        None => lineage.to_vec(),
    }
}

fn merge_lineage(into: &mut Vec<Name>, extra: Vec<Name>) {
    into.extend(extra);
    into.sort();
    into.dedup();
}

/// Records that `face` traverses `edge` in the given sense.
///
/// # Errors
///
/// Returns [`TopologyError::NonManifoldEdge`] if the edge already has two
/// uses, or [`TopologyError::InconsistentAdjacency`] if the face already
/// uses it.
pub fn attach_edge_to_face(
    store: &mut TopologyStore,
    edge: EdgeId,
    face: FaceId,
    forward: bool,
) -> Result<()> {
    store.face(face)?;
    let e = store.edge(edge)?;
    if e.use_of(face).is_some() {
        return Err(TopologyError::InconsistentAdjacency("face already uses edge".into()).into());
    }
    if e.uses.len() >= 2 {
        return Err(TopologyError::NonManifoldEdge {
            uses: e.uses.len() + 1,
        }
        .into());
    }
    store.edge_mut(edge)?.uses.push(EdgeUse { face, forward });
    Ok(())
}

/// Removes the use record of `face` from `edge`.
///
/// # Errors
///
/// Returns [`TopologyError::InconsistentAdjacency`] if the face does not
/// use the edge.
pub fn detach_edge_from_face(store: &mut TopologyStore, edge: EdgeId, face: FaceId) -> Result<()> {
    let e = store.edge(edge)?;
    let Some(pos) = e.uses.iter().position(|u| u.face == face) else {
        return Err(TopologyError::InconsistentAdjacency("face does not use edge".into()).into());
    };
    store.edge_mut(edge)?.uses.remove(pos);
    Ok(())
}

fn check_loop_closed(store: &TopologyStore, edges: &[OrientedEdge]) -> Result<()> {
    if edges.len() < 3 {
        return Err(TopologyError::DegenerateLoop(format!("{} edge(s)", edges.len())).into());
    }
    for (i, oe) in edges.iter().enumerate() {
        let (_, end) = store.oriented_vertices(*oe)?;
        let (next_start, _) = store.oriented_vertices(edges[(i + 1) % edges.len()])?;
        if end != next_start {
            return Err(TopologyError::LoopNotClosed.into());
        }
    }
    Ok(())
}

/// Creates a face on `surface` bounded by existing edges.
///
/// The first loop is the outer boundary. Every edge gets a use record for
/// the new face.
///
/// # Errors
///
/// Returns an error if a loop is open or too short, or if an edge would
/// exceed two uses.
pub fn make_face(
    store: &mut TopologyStore,
    surface: SurfaceId,
    same_sense: bool,
    loops: Vec<Vec<OrientedEdge>>,
) -> Result<FaceId> {
    store.surface(surface)?;
    if loops.is_empty() {
        return Err(TopologyError::DegenerateLoop("face without loops".into()).into());
    }
    let mut extra: BTreeMap<EdgeId, usize> = BTreeMap::new();
    for l in &loops {
        check_loop_closed(store, l)?;
        for oe in l {
            *extra.entry(oe.edge).or_default() += 1;
        }
    }
    for (&e, &n) in &extra {
        let uses = store.edge(e)?.uses.len() + n;
        if uses > 2 || n > 1 {
            return Err(TopologyError::NonManifoldEdge { uses }.into());
        }
    }

    let mut loop_ids: Vec<LoopId> = loops
        .iter()
        .map(|l| store.add_loop(LoopData { edges: l.clone() }))
        .collect();
    let outer_loop = loop_ids.remove(0);
    let face = store.add_face(FaceData {
        surface,
        outer_loop,
        inner_loops: loop_ids,
        same_sense,
        name: None,
        lineage: Vec::new(),
    });
    for l in &loops {
        for oe in l {
            store.edge_mut(oe.edge)?.uses.push(EdgeUse {
                face,
                forward: oe.forward,
            });
        }
    }
    Ok(face)
}

/// Creates a face from vertex cycles, making a fresh edge for every side.
///
/// # Errors
///
/// Returns an error if a cycle has fewer than three vertices, repeats a
/// vertex consecutively, or references a missing vertex.
pub fn make_polygon_face(
    store: &mut TopologyStore,
    surface: SurfaceId,
    same_sense: bool,
    outer: &[VertexId],
    holes: &[Vec<VertexId>],
) -> Result<FaceId> {
    store.surface(surface)?;
    let cycles: Vec<&[VertexId]> = std::iter::once(outer)
        .chain(holes.iter().map(Vec::as_slice))
        .collect();
    for cycle in &cycles {
        if cycle.len() < 3 {
            return Err(TopologyError::DegenerateLoop(format!("{} vertices", cycle.len())).into());
        }
        for (i, &v) in cycle.iter().enumerate() {
            let next = cycle[(i + 1) % cycle.len()];
            let a = store.vertex(v)?.point;
            let b = store.vertex(next)?.point;
            if v == next || (a - b).norm() < TOLERANCE {
                return Err(TopologyError::DegenerateLoop("zero-length side".into()).into());
            }
        }
    }

    let mut loops = Vec::with_capacity(cycles.len());
    for cycle in cycles {
        let mut l = Vec::with_capacity(cycle.len());
        for (i, &v) in cycle.iter().enumerate() {
            let e = store.add_line_edge(v, cycle[(i + 1) % cycle.len()])?;
            l.push(OrientedEdge::new(e, true));
        }
        loops.push(l);
    }
    make_face(store, surface, same_sense, loops)
}

/// Positions of every loop entry that references `edge`, per face use.
fn loop_positions(
    store: &TopologyStore,
    edge: EdgeId,
) -> Result<Vec<(LoopId, usize, OrientedEdge)>> {
    let mut out = Vec::new();
    for u in &store.edge(edge)?.uses {
        for l in store.face(u.face)?.loops() {
            for (i, oe) in store.loop_(l)?.edges.iter().enumerate() {
                if oe.edge == edge {
                    out.push((l, i, *oe));
                }
            }
        }
    }
    Ok(out)
}

/// Splits an edge at the projection of `point`.
///
/// Returns the new vertex and the new edge running from it to the old end
/// vertex. Every loop using the edge receives the new edge.
///
/// # Errors
///
/// Returns [`TopologyError::DegenerateLoop`] if the split point falls
/// within `tol` of an end of the edge.
#[instrument(level = "debug", skip(store))]
pub fn split_edge(
    store: &mut TopologyStore,
    edge: EdgeId,
    point: Point3,
    tol: f64,
) -> Result<(VertexId, EdgeId)> {
    let seg = store.edge_segment(edge)?;
    let len = seg.length();
    let t = seg.parameter_of(&point);
    if t * len <= tol || (1.0 - t) * len <= tol {
        return Err(TopologyError::DegenerateLoop("split point at an edge end".into()).into());
    }
    let positions = loop_positions(store, edge)?;

    let e = store.edge(edge)?.clone();
    let origin = ancestry(e.name.as_ref(), &e.lineage);
    let end_tol = store.vertex(e.end)?.tolerance.max(store.vertex(e.start)?.tolerance);
    let v = store.add_vertex(VertexData {
        point: seg.point_at(t),
        tolerance: end_tol,
        name: None,
        lineage: origin.clone(),
    });

    {
        let old = store.edge_mut(edge)?;
        old.end = v;
        old.name = None;
        old.lineage.clone_from(&origin);
    }
    store.refresh_edge_curve(edge)?;
    let new_edge = store.add_line_edge(v, e.end)?;
    {
        let ne = store.edge_mut(new_edge)?;
        ne.uses.clone_from(&e.uses);
        ne.lineage = origin;
    }

    // Insert from the back so earlier positions in the same loop stay valid.
    let mut positions = positions;
    positions.sort_by(|a, b| b.1.cmp(&a.1));
    for (l, i, oe) in positions {
        let lp = store.loop_mut(l)?;
        if oe.forward {
            lp.edges.insert(i + 1, OrientedEdge::new(new_edge, true));
        } else {
            lp.edges.insert(i, OrientedEdge::new(new_edge, false));
        }
    }
    debug!(?v, ?new_edge, "edge split");
    Ok((v, new_edge))
}

/// Fuses vertex `remove` into `keep`.
///
/// Edges ending at `remove` are redirected to `keep`, whose tolerance grows
/// to cover the distance between the two.
///
/// # Errors
///
/// Returns [`TopologyError::DegenerateLoop`] if an edge joins the two
/// vertices or would shrink to a point at `keep`. The store is left
/// untouched on error.
#[instrument(level = "debug", skip(store))]
pub fn merge_vertices(store: &mut TopologyStore, keep: VertexId, remove: VertexId) -> Result<()> {
    if keep == remove {
        return Ok(());
    }
    let kv = store.vertex(keep)?.clone();
    let rv = store.vertex(remove)?.clone();
    let incident = store.edges_at_vertex(remove);
    for &e in &incident {
        let ed = store.edge(e)?;
        if ed.connects(keep, remove) {
            return Err(TopologyError::DegenerateLoop("edge between merged vertices".into()).into());
        }
        let other = if ed.start == remove { ed.end } else { ed.start };
        if (store.vertex(other)?.point - kv.point).norm() < TOLERANCE {
            return Err(TopologyError::DegenerateLoop("edge would collapse onto merged vertex".into()).into());
        }
    }

    for &e in &incident {
        let ed = store.edge_mut(e)?;
        if ed.start == remove {
            ed.start = keep;
        }
        if ed.end == remove {
            ed.end = keep;
        }
    }
    {
        let dist = (kv.point - rv.point).norm();
        let k = store.vertex_mut(keep)?;
        k.tolerance = k.tolerance.max(rv.tolerance + dist);
        let mut lineage = ancestry(kv.name.as_ref(), &kv.lineage);
        merge_lineage(&mut lineage, ancestry(rv.name.as_ref(), &rv.lineage));
        k.name = None;
        k.lineage = lineage;
    }
    store.remove_vertex(remove);
    for e in incident {
        store.refresh_edge_curve(e)?;
    }
    Ok(())
}

/// Fuses edge `remove` into `keep`. Both must join the same two vertices
/// and together carry at most two uses.
///
/// # Errors
///
/// Returns [`TopologyError::NonManifoldEdge`] for more than two combined
/// uses and [`TopologyError::InconsistentAdjacency`] if the endpoints differ
/// or one face uses both edges.
#[instrument(level = "debug", skip(store))]
pub fn merge_edges(store: &mut TopologyStore, keep: EdgeId, remove: EdgeId) -> Result<()> {
    if keep == remove {
        return Ok(());
    }
    let ke = store.edge(keep)?.clone();
    let re = store.edge(remove)?.clone();
    if !ke.connects(re.start, re.end) {
        return Err(TopologyError::InconsistentAdjacency("edges join different vertices".into()).into());
    }
    let uses = ke.uses.len() + re.uses.len();
    if uses > 2 {
        return Err(TopologyError::NonManifoldEdge { uses }.into());
    }
    if re.uses.iter().any(|u| ke.use_of(u.face).is_some()) {
        return Err(TopologyError::InconsistentAdjacency("one face uses both edges".into()).into());
    }
    let same_dir = ke.start == re.start;
    let positions = loop_positions(store, remove)?;

    for (l, i, oe) in positions {
        store.loop_mut(l)?.edges[i] = OrientedEdge::new(keep, oe.forward == same_dir);
    }
    {
        let k = store.edge_mut(keep)?;
        for u in &re.uses {
            k.uses.push(EdgeUse {
                face: u.face,
                forward: u.forward == same_dir,
            });
        }
        let mut lineage = ancestry(ke.name.as_ref(), &ke.lineage);
        merge_lineage(&mut lineage, ancestry(re.name.as_ref(), &re.lineage));
        k.name = None;
        k.lineage = lineage;
    }
    store.remove_edge(remove);
    Ok(())
}

/// Checks whether [`join_edges`] would succeed at `vertex`.
#[must_use]
pub fn joinable(store: &TopologyStore, vertex: VertexId, sag: f64) -> bool {
    plan_join(store, vertex, sag).is_ok()
}

struct JoinPlan {
    keep: EdgeId,
    drop: EdgeId,
    a: VertexId,
    b: VertexId,
    rewrites: Vec<(LoopId, usize, usize, bool)>,
}

fn plan_join(store: &TopologyStore, vertex: VertexId, sag: f64) -> Result<JoinPlan> {
    let edges = store.edges_at_vertex(vertex);
    let [e1, e2] = edges.as_slice() else {
        return Err(TopologyError::InconsistentAdjacency(format!(
            "vertex has {} incident edges",
            edges.len()
        ))
        .into());
    };
    let (e1, e2) = (*e1, *e2);
    let d1 = store.edge(e1)?;
    let d2 = store.edge(e2)?;
    let a = d1.other_vertex(vertex);
    let b = d2.other_vertex(vertex);
    if a == b || a == vertex || b == vertex {
        return Err(TopologyError::DegenerateLoop("chain closes on itself".into()).into());
    }
    let faces1: HashSet<FaceId> = d1.uses.iter().map(|u| u.face).collect();
    let faces2: HashSet<FaceId> = d2.uses.iter().map(|u| u.face).collect();
    if faces1 != faces2 {
        return Err(TopologyError::InconsistentAdjacency("chain edges border different faces".into()).into());
    }
    let chord = Segment::new(store.vertex(a)?.point, store.vertex(b)?.point);
    if chord.distance_to(&store.vertex(vertex)?.point) > sag {
        return Err(TopologyError::InconsistentAdjacency("chain deviates beyond sag".into()).into());
    }

    let mut rewrites = Vec::new();
    for f in &faces1 {
        for l in store.face(*f)?.loops() {
            let lp = store.loop_(l)?;
            let n = lp.edges.len();
            let i = lp.edges.iter().position(|oe| oe.edge == e1);
            let j = lp.edges.iter().position(|oe| oe.edge == e2);
            let (Some(i), Some(j)) = (i, j) else {
                continue;
            };
            if n <= 3 {
                return Err(TopologyError::DegenerateLoop("joined loop would have two sides".into()).into());
            }
            let (first, second) = if (i + 1) % n == j {
                (i, j)
            } else if (j + 1) % n == i {
                (j, i)
            } else {
                return Err(TopologyError::InconsistentAdjacency("chain edges not adjacent in loop".into()).into());
            };
            rewrites.push((l, first, second, lp.edges[first].edge == e1));
        }
    }
    Ok(JoinPlan {
        keep: e1,
        drop: e2,
        a,
        b,
        rewrites,
    })
}

/// Fuses the two edges meeting at a degree-2 vertex into one edge.
///
/// The vertex must lie within `sag` of the chord between the outer
/// endpoints, and both edges must border the same faces. The vertex is
/// removed; the surviving edge runs between the outer endpoints.
///
/// # Errors
///
/// Returns an error if any of the conditions above does not hold.
#[instrument(level = "debug", skip(store))]
pub fn join_edges(store: &mut TopologyStore, vertex: VertexId, sag: f64) -> Result<EdgeId> {
    let plan = plan_join(store, vertex, sag)?;
    let dropped = store.edge(plan.drop)?.clone();

    for (l, first, second, forward) in plan.rewrites {
        let lp = store.loop_mut(l)?;
        lp.edges[first] = OrientedEdge::new(plan.keep, forward);
        lp.edges.remove(second);
    }
    {
        let k = store.edge_mut(plan.keep)?;
        let prev = k.clone();
        k.start = plan.a;
        k.end = plan.b;
        // The joined edge now runs a -> b.
        if prev.start == vertex {
            for u in &mut k.uses {
                u.forward = !u.forward;
            }
        }
        let mut lineage = ancestry(prev.name.as_ref(), &prev.lineage);
        merge_lineage(&mut lineage, ancestry(dropped.name.as_ref(), &dropped.lineage));
        k.name = None;
        k.lineage = lineage;
    }
    store.remove_edge(plan.drop);
    store.remove_vertex(vertex);
    store.refresh_edge_curve(plan.keep)?;
    Ok(plan.keep)
}

/// Direction of an oriented edge in the face frame.
fn frame_dir(
    store: &TopologyStore,
    oe: OrientedEdge,
    u: &crate::math::Vector3,
    v: &crate::math::Vector3,
) -> Result<Vector2> {
    let (s, e) = store.oriented_vertices(oe)?;
    let d = store.vertex(e)?.point - store.vertex(s)?.point;
    Ok(Vector2::new(d.dot(u), d.dot(v)))
}

/// Chains oriented edges into closed cycles, taking the leftmost turn at
/// vertices with several continuations.
fn chain_loops(
    store: &TopologyStore,
    edges: &[OrientedEdge],
    u: &crate::math::Vector3,
    v: &crate::math::Vector3,
) -> Result<Vec<Vec<OrientedEdge>>> {
    let mut by_start: BTreeMap<VertexId, Vec<usize>> = BTreeMap::new();
    for (i, oe) in edges.iter().enumerate() {
        by_start.entry(store.oriented_vertices(*oe)?.0).or_default().push(i);
    }
    let mut used = vec![false; edges.len()];
    let mut loops = Vec::new();
    for seed in 0..edges.len() {
        if used[seed] {
            continue;
        }
        let start_vertex = store.oriented_vertices(edges[seed])?.0;
        let mut cycle = vec![edges[seed]];
        used[seed] = true;
        let mut current = seed;
        loop {
            let end = store.oriented_vertices(edges[current])?.1;
            if end == start_vertex {
                break;
            }
            let incoming = frame_dir(store, edges[current], u, v)?;
            let mut best: Option<(f64, usize)> = None;
            for &c in by_start.get(&end).map_or(&[][..], Vec::as_slice) {
                if used[c] {
                    continue;
                }
                let out = frame_dir(store, edges[c], u, v)?;
                let turn = cross_2d(&incoming, &out).atan2(incoming.dot(&out));
                if best.is_none_or(|(t, _)| turn > t) {
                    best = Some((turn, c));
                }
            }
            let Some((_, next)) = best else {
                return Err(TopologyError::LoopNotClosed.into());
            };
            used[next] = true;
            cycle.push(edges[next]);
            current = next;
        }
        loops.push(cycle);
    }
    Ok(loops)
}

/// Fuses face `remove` into `keep`.
///
/// Both faces must lie on the same carrier surface with the same sense and
/// share at least one edge. Shared edges are deleted, remaining boundary
/// edges are re-chained into loops of `keep`, and vertices left without
/// edges are deleted.
///
/// # Errors
///
/// Returns an error if the faces are on different surfaces, share no edge,
/// traverse a shared edge in the same direction, or the remaining boundary
/// does not form one region.
#[instrument(level = "debug", skip(store))]
pub fn merge_faces(store: &mut TopologyStore, keep: FaceId, remove: FaceId) -> Result<()> {
    if keep == remove {
        return Err(TopologyError::InconsistentAdjacency("face merged with itself".into()).into());
    }
    let kf = store.face(keep)?.clone();
    let rf = store.face(remove)?.clone();
    if kf.surface != rf.surface || kf.same_sense != rf.same_sense {
        return Err(TopologyError::InconsistentAdjacency("faces on different surfaces".into()).into());
    }

    let mut all = Vec::new();
    for l in kf.loops().chain(rf.loops()) {
        all.extend(store.loop_(l)?.edges.iter().copied());
    }
    let mut shared = Vec::new();
    for oe in &all {
        let e = store.edge(oe.edge)?;
        if let (Some(a), Some(b)) = (e.use_of(keep), e.use_of(remove)) {
            if a.forward == b.forward {
                return Err(TopologyError::InconsistentAdjacency("shared edge has one direction".into()).into());
            }
            if !shared.contains(&oe.edge) {
                shared.push(oe.edge);
            }
        }
    }
    if shared.is_empty() {
        return Err(TopologyError::InconsistentAdjacency("faces share no edge".into()).into());
    }
    let remaining: Vec<OrientedEdge> = all.into_iter().filter(|oe| !shared.contains(&oe.edge)).collect();

    let plane = store.face_plane(keep)?.clone();
    let normal = store.face_normal(keep)?;
    let (u, v) = if kf.same_sense {
        (*plane.u_dir(), *plane.v_dir())
    } else {
        (*plane.u_dir(), -plane.v_dir())
    };
    let cycles = chain_loops(store, &remaining, &u, &v)?;

    let mut outer: Option<(f64, usize)> = None;
    let mut areas = Vec::with_capacity(cycles.len());
    for (i, c) in cycles.iter().enumerate() {
        let mut pts = Vec::with_capacity(c.len());
        for oe in c {
            pts.push(store.vertex(store.oriented_vertices(*oe)?.0)?.point);
        }
        let area = polygon_area_3d(&pts, &normal);
        if area > 0.0 {
            if outer.is_some() {
                return Err(TopologyError::InconsistentAdjacency("merged face would be disconnected".into()).into());
            }
            outer = Some((area, i));
        }
        if c.len() < 3 {
            return Err(TopologyError::DegenerateLoop("merged loop too short".into()).into());
        }
        areas.push(area);
    }
    let Some((_, outer_idx)) = outer else {
        return Err(TopologyError::LoopNotClosed.into());
    };

    // Validation done; write.
    let mut orphan_candidates = Vec::new();
    for e in &shared {
        if let Some(ed) = store.remove_edge(*e) {
            orphan_candidates.push(ed.start);
            orphan_candidates.push(ed.end);
        }
    }
    for l in kf.loops().chain(rf.loops()) {
        store.remove_loop(l);
    }
    for oe in &remaining {
        for u in &mut store.edge_mut(oe.edge)?.uses {
            if u.face == remove {
                u.face = keep;
            }
        }
    }
    let mut new_loops: Vec<LoopId> = Vec::with_capacity(cycles.len());
    let mut outer_loop = None;
    for (i, c) in cycles.into_iter().enumerate() {
        let id = store.add_loop(LoopData { edges: c });
        if i == outer_idx {
            outer_loop = Some(id);
        } else {
            new_loops.push(id);
        }
    }
    let outer_loop = outer_loop.ok_or(TopologyError::LoopNotClosed)?;
    {
        let f = store.face_mut(keep)?;
        f.outer_loop = outer_loop;
        f.inner_loops = new_loops;
        let mut lineage = ancestry(kf.name.as_ref(), &kf.lineage);
        merge_lineage(&mut lineage, ancestry(rf.name.as_ref(), &rf.lineage));
        f.name = None;
        f.lineage = lineage;
    }
    store.remove_face(remove);
    store.detach_face_from_shells(remove);
    for vtx in orphan_candidates {
        if store.edges_at_vertex(vtx).is_empty() {
            store.remove_vertex(vtx);
        }
    }
    debug!(shared = shared.len(), "faces merged");
    Ok(())
}

/// Flips a face: toggles its sense and reverses every loop.
///
/// # Errors
///
/// Returns an error if the face or one of its loops is missing.
pub fn reverse_face(store: &mut TopologyStore, face: FaceId) -> Result<()> {
    let f = store.face(face)?.clone();
    let loops: Vec<LoopId> = f.loops().collect();
    for &l in &loops {
        store.loop_(l)?;
    }
    for l in loops {
        let lp = store.loop_mut(l)?;
        lp.edges.reverse();
        for oe in &mut lp.edges {
            oe.forward = !oe.forward;
        }
        let edges: Vec<EdgeId> = lp.edges.iter().map(|oe| oe.edge).collect();
        for e in edges {
            for u in &mut store.edge_mut(e)?.uses {
                if u.face == face {
                    u.forward = !u.forward;
                }
            }
        }
    }
    store.face_mut(face)?.same_sense = !f.same_sense;
    Ok(())
}

impl TopologyStore {
    /// Drops a face handle from every shell that lists it.
    pub(crate) fn detach_face_from_shells(&mut self, face: FaceId) {
        for s in self.shells.values_mut() {
            s.faces.retain(|f| *f != face);
        }
    }
}
