use std::collections::HashMap;

use tracing::{debug, warn};

use super::split::{Fragment, Ring};
use crate::error::Result;
use crate::geometry::SurfaceIntersector;
use crate::operations::stitch::weld::weld_shell;
use crate::topology::mutate::{ancestry, make_polygon_face};
use crate::topology::{ShellData, ShellId, SurfaceId, TopologyStore, VertexData, VertexId};

/// Builds a candidate shell from the selected fragments.
///
/// Every fragment becomes an independent face with fresh vertices and
/// edges carrying the fragment's lineage; the stitch welder then turns
/// coincident boundaries into shared edges. `kept` pairs each fragment
/// with whether it enters the result reversed.
pub(crate) fn assemble(
    scratch: &TopologyStore,
    kept: &[(&Fragment, bool)],
    intersector: &dyn SurfaceIntersector,
    tol: f64,
) -> Result<(TopologyStore, ShellId)> {
    let mut cand = TopologyStore::new();
    let mut surfaces: HashMap<SurfaceId, SurfaceId> = HashMap::new();
    let mut faces = Vec::with_capacity(kept.len());

    for &(frag, reversed) in kept {
        let source = scratch.face(frag.face)?;
        let surface = match surfaces.get(&source.surface) {
            Some(&s) => s,
            None => {
                let s = cand.add_surface(scratch.surface(source.surface)?.clone());
                surfaces.insert(source.surface, s);
                s
            }
        };
        let rings: Vec<Ring> = frag
            .rings()
            .map(|r| if reversed { r.reversed() } else { r.clone() })
            .collect();
        let cycles: Vec<Vec<VertexId>> = rings
            .iter()
            .map(|r| {
                r.vertices
                    .iter()
                    .map(|v| {
                        let mut data = VertexData::new(v.point);
                        data.lineage.clone_from(&v.lineage);
                        cand.add_vertex(data)
                    })
                    .collect()
            })
            .collect();

        let face = match make_polygon_face(&mut cand, surface, source.same_sense != reversed, &cycles[0], &cycles[1..]) {
            Ok(f) => f,
            Err(err) => {
                warn!(%err, "dropping degenerate fragment");
                continue;
            }
        };
        cand.face_mut(face)?.lineage = ancestry(source.name.as_ref(), &source.lineage);
        let loops: Vec<_> = cand.face(face)?.loops().collect();
        for (l, ring) in loops.into_iter().zip(&rings) {
            let edges: Vec<_> = cand.loop_(l)?.edges.iter().map(|oe| oe.edge).collect();
            for (e, side) in edges.into_iter().zip(&ring.sides) {
                cand.edge_mut(e)?.lineage.clone_from(&side.lineage);
            }
        }
        faces.push(face);
    }

    let shell = cand.add_shell(ShellData { faces });
    let vertices = cand.shell_vertices(shell)?;
    let radii = vec![tol; vertices.len()];
    let report = weld_shell(&mut cand, shell, &vertices, &radii, intersector, tol)?;
    debug!(
        merged_vertices = report.merged_vertices,
        merged_edges = report.merged_edges,
        split_edges = report.split_edges,
        open_edges = report.unmatched_edges.len(),
        "fragments welded"
    );
    Ok((cand, shell))
}
