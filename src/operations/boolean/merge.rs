use tracing::debug;

use crate::error::Result;
use crate::operations::stitch::weld::is_refusal;
use crate::topology::mutate::{join_edges, joinable, merge_faces};
use crate::topology::{FaceId, ShellId, TopologyStore};

/// Fuses neighbouring faces that lie on the same carrier surface with the
/// same sense. Returns the number of merges.
///
/// The face listed first in the shell survives each merge.
pub(crate) fn merge_coplanar_faces(store: &mut TopologyStore, shell: ShellId) -> Result<usize> {
    let mut merged = 0;
    'scan: loop {
        let order = store.shell(shell)?.faces.clone();
        let rank = |f: FaceId| order.iter().position(|g| *g == f).unwrap_or(usize::MAX);
        for e in store.shell_edges(shell)? {
            let (fa, fb) = match store.edge(e)?.uses.as_slice() {
                [ua, ub] if ua.face != ub.face => (ua.face, ub.face),
                _ => continue,
            };
            let (da, db) = (store.face(fa)?, store.face(fb)?);
            if da.surface != db.surface || da.same_sense != db.same_sense {
                continue;
            }
            let (keep, remove) = if rank(fa) <= rank(fb) { (fa, fb) } else { (fb, fa) };
            match merge_faces(store, keep, remove) {
                Ok(()) => {
                    merged += 1;
                    continue 'scan;
                }
                Err(err) if is_refusal(&err) => {
                    debug!(%err, "faces left apart");
                }
                Err(err) => return Err(err),
            }
        }
        break;
    }
    Ok(merged)
}

/// Fuses edge chains through vertices that only join two edges lying
/// within `sag` of a straight line. Returns the number of joins.
pub(crate) fn merge_collinear_edges(store: &mut TopologyStore, shell: ShellId, sag: f64) -> Result<usize> {
    let mut joined = 0;
    loop {
        let mut changed = false;
        for v in store.shell_vertices(shell)? {
            if store.vertex(v).is_ok() && joinable(store, v, sag) {
                join_edges(store, v, sag)?;
                joined += 1;
                changed = true;
            }
        }
        if !changed {
            return Ok(joined);
        }
    }
}
