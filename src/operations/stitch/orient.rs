use std::collections::{HashMap, VecDeque};

use tracing::{debug, warn};

use crate::error::Result;
use crate::operations::query::signed_volume;
use crate::topology::mutate::reverse_face;
use crate::topology::{check_shell, FaceId, ShellId, TopologyStore};

/// Result of making face orientation consistent across input components.
#[derive(Debug, Clone, Default)]
pub(crate) struct OrientReport {
    /// Components whose faces were all reversed.
    pub flipped: Vec<usize>,
    /// Shared edges whose two uses still run the same way.
    pub conflicts: usize,
    /// The whole shell was turned to point outward.
    pub turned_outward: bool,
}

/// Reverses whole components so that every shared edge is traversed in
/// opposite directions by its two faces.
///
/// `component` maps each face to the input it came from. Component 0 (or
/// the lowest-numbered one reached) keeps its orientation. A closed result
/// is finally turned so that its faces point outward.
pub(crate) fn orient_components(
    store: &mut TopologyStore,
    shell: ShellId,
    component: &HashMap<FaceId, usize>,
    components: usize,
) -> Result<OrientReport> {
    // (other component, needs opposite orientation)
    let mut links: Vec<Vec<(usize, bool)>> = vec![Vec::new(); components];
    let mut report = OrientReport::default();
    for e in store.shell_edges(shell)? {
        let ed = store.edge(e)?;
        let [ua, ub] = ed.uses.as_slice() else {
            continue;
        };
        let (Some(&ca), Some(&cb)) = (component.get(&ua.face), component.get(&ub.face)) else {
            continue;
        };
        let mismatch = ua.forward == ub.forward;
        if ca == cb {
            if mismatch {
                report.conflicts += 1;
            }
            continue;
        }
        links[ca].push((cb, mismatch));
        links[cb].push((ca, mismatch));
    }

    let mut flip: Vec<Option<bool>> = vec![None; components];
    for root in 0..components {
        if flip[root].is_some() {
            continue;
        }
        flip[root] = Some(false);
        let mut queue = VecDeque::from([root]);
        while let Some(c) = queue.pop_front() {
            let fc = flip[c].unwrap_or(false);
            for &(d, mismatch) in &links[c] {
                let want = fc ^ mismatch;
                match flip[d] {
                    None => {
                        flip[d] = Some(want);
                        queue.push_back(d);
                    }
                    Some(have) if have != want => report.conflicts += 1,
                    Some(_) => {}
                }
            }
        }
    }

    let faces = store.shell(shell)?.faces.clone();
    for (c, f) in flip.iter().enumerate() {
        if *f == Some(true) {
            report.flipped.push(c);
        }
    }
    for &face in &faces {
        if component.get(&face).is_some_and(|c| flip[*c] == Some(true)) {
            reverse_face(store, face)?;
        }
    }
    if report.conflicts > 0 {
        warn!(conflicts = report.conflicts, "orientation could not be made consistent");
    }

    report.turned_outward = orient_outward(store, shell)?;
    debug!(flipped = report.flipped.len(), "components oriented");
    Ok(report)
}

/// Reverses every face of a closed shell with negative volume. Returns
/// `true` if it did.
pub(crate) fn orient_outward(store: &mut TopologyStore, shell: ShellId) -> Result<bool> {
    if !check_shell(store, shell)?.is_manifold_closed() || signed_volume(store, shell)? >= 0.0 {
        return Ok(false);
    }
    for face in store.shell(shell)?.faces.clone() {
        reverse_face(store, face)?;
    }
    Ok(true)
}
