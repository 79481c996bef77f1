use std::collections::HashMap;

use tracing::{debug, instrument};

use super::{
    EdgeData, EdgeId, EdgeUse, FaceData, FaceId, LoopData, OrientedEdge, ShellData, ShellId,
    SurfaceId, TopologyStore, VertexId,
};
use crate::error::{Result, TopologyError};

/// Correspondence between source and copied entities.
#[derive(Debug, Clone, Default)]
pub struct ImportMap {
    pub vertices: HashMap<VertexId, VertexId>,
    pub edges: HashMap<EdgeId, EdgeId>,
    pub faces: HashMap<FaceId, FaceId>,
}

fn map_surface(
    dst: &mut TopologyStore,
    src: &TopologyStore,
    id: SurfaceId,
    cache: &mut HashMap<SurfaceId, SurfaceId>,
) -> Result<SurfaceId> {
    if let Some(&s) = cache.get(&id) {
        return Ok(s);
    }
    let data = src.surface(id)?;
    let existing = dst
        .surfaces()
        .find(|(_, d)| d.same_identity(data))
        .map(|(sid, _)| sid);
    let mapped = match existing {
        Some(sid) => sid,
        None => dst.add_surface(data.clone()),
    };
    cache.insert(id, mapped);
    Ok(mapped)
}

/// Copies a shell from `src` into `dst`, returning the entity mapping.
///
/// Carrier surfaces already present in `dst` (same identity) are reused.
/// Names and lineage are copied verbatim.
///
/// # Errors
///
/// Returns an error if the shell references missing entities.
pub fn import_shell_mapped(
    dst: &mut TopologyStore,
    src: &TopologyStore,
    shell: ShellId,
) -> Result<(ShellId, ImportMap)> {
    let faces = src.shell(shell)?.faces.clone();
    let edges = src.shell_edges(shell)?;
    let vertices = src.shell_vertices(shell)?;

    let mut map = ImportMap::default();
    for v in vertices {
        let nv = dst.add_vertex(src.vertex(v)?.clone());
        map.vertices.insert(v, nv);
    }
    for e in edges {
        let ed = src.edge(e)?;
        let lookup = |v: VertexId| {
            map.vertices
                .get(&v)
                .copied()
                .ok_or_else(|| TopologyError::EntityNotFound("edge vertex outside shell".into()))
        };
        let ne = dst.add_edge(EdgeData {
            start: lookup(ed.start)?,
            end: lookup(ed.end)?,
            uses: Vec::new(),
            ..ed.clone()
        });
        map.edges.insert(e, ne);
    }

    let mut surfaces = HashMap::new();
    let mut new_faces = Vec::with_capacity(faces.len());
    for f in &faces {
        let fd = src.face(*f)?;
        let surface = map_surface(dst, src, fd.surface, &mut surfaces)?;
        let mut copy_loop = |l| -> Result<super::LoopId> {
            let edges = src
                .loop_(l)?
                .edges
                .iter()
                .map(|oe| {
                    map.edges
                        .get(&oe.edge)
                        .map(|&e| OrientedEdge::new(e, oe.forward))
                        .ok_or_else(|| TopologyError::EntityNotFound("loop edge".into()))
                })
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(dst.add_loop(LoopData { edges }))
        };
        let outer_loop = copy_loop(fd.outer_loop)?;
        let inner_loops = fd
            .inner_loops
            .iter()
            .map(|l| copy_loop(*l))
            .collect::<Result<Vec<_>>>()?;
        let nf = dst.add_face(FaceData {
            surface,
            outer_loop,
            inner_loops,
            same_sense: fd.same_sense,
            name: fd.name.clone(),
            lineage: fd.lineage.clone(),
        });
        map.faces.insert(*f, nf);
        new_faces.push(nf);
    }

    for (&old, &new) in &map.edges {
        let uses: Vec<EdgeUse> = src
            .edge(old)?
            .uses
            .iter()
            .filter_map(|u| {
                map.faces.get(&u.face).map(|&face| EdgeUse {
                    face,
                    forward: u.forward,
                })
            })
            .collect();
        dst.edge_mut(new)?.uses = uses;
    }

    let id = dst.add_shell(ShellData { faces: new_faces });
    Ok((id, map))
}

/// Copies a shell from another store into `dst`.
///
/// # Errors
///
/// Returns an error if the shell references missing entities.
pub fn import_shell(dst: &mut TopologyStore, src: &TopologyStore, shell: ShellId) -> Result<ShellId> {
    import_shell_mapped(dst, src, shell).map(|(id, _)| id)
}

/// Copies a shell into a fresh store of its own.
///
/// # Errors
///
/// Returns an error if the shell references missing entities.
pub fn extract_shell(src: &TopologyStore, shell: ShellId) -> Result<(TopologyStore, ShellId)> {
    let mut dst = TopologyStore::new();
    let id = import_shell(&mut dst, src, shell)?;
    Ok((dst, id))
}

/// Copies a shell within the same store. The copy shares carrier surfaces
/// with the original.
///
/// # Errors
///
/// Returns an error if the shell references missing entities.
pub fn duplicate_shell(store: &mut TopologyStore, shell: ShellId) -> Result<ShellId> {
    let (scratch, id) = extract_shell(store, shell)?;
    import_shell(store, &scratch, id)
}

/// Deletes a shell with all its faces, loops, edges and vertices, and any
/// carrier surface no other face uses.
///
/// # Errors
///
/// Returns an error if the shell does not exist.
#[instrument(level = "debug", skip(store))]
pub fn remove_shell(store: &mut TopologyStore, shell: ShellId) -> Result<()> {
    let faces = store.shell(shell)?.faces.clone();
    let edges = store.shell_edges(shell)?;
    let vertices = store.shell_vertices(shell)?;

    let mut surfaces = Vec::new();
    for f in &faces {
        if let Some(fd) = store.remove_face(*f) {
            surfaces.push(fd.surface);
            for l in std::iter::once(fd.outer_loop).chain(fd.inner_loops) {
                store.remove_loop(l);
            }
        }
    }
    for e in edges {
        store.remove_edge(e);
    }
    for v in vertices {
        if store.edges_at_vertex(v).is_empty() {
            store.remove_vertex(v);
        }
    }
    surfaces.sort();
    surfaces.dedup();
    for s in surfaces {
        if !store.faces().any(|(_, f)| f.surface == s) {
            store.remove_surface(s);
        }
    }
    store.remove_shell_record(shell);
    debug!(faces = faces.len(), "shell removed");
    Ok(())
}
