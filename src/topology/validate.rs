use std::collections::HashMap;

use super::{EdgeId, LoopId, ShellId, TopologyStore};
use crate::error::TopologyError;

/// Structural summary of one shell.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShellReport {
    pub face_count: usize,
    pub edge_count: usize,
    pub vertex_count: usize,
    /// Edges used by exactly one face of the shell.
    pub boundary_edges: Vec<EdgeId>,
    /// Edges used more than twice within the shell.
    pub non_manifold_edges: Vec<EdgeId>,
    /// Edges whose two uses traverse them in the same direction.
    pub misoriented_edges: Vec<EdgeId>,
    /// Loops whose consecutive edges do not connect.
    pub open_loops: Vec<LoopId>,
    /// Edges whose use records disagree with the loops referencing them.
    pub inconsistent_edges: Vec<EdgeId>,
}

impl ShellReport {
    /// Every edge has exactly two oppositely oriented uses and every loop
    /// closes.
    #[must_use]
    pub fn is_manifold_closed(&self) -> bool {
        self.face_count > 0
            && self.boundary_edges.is_empty()
            && self.non_manifold_edges.is_empty()
            && self.misoriented_edges.is_empty()
            && self.open_loops.is_empty()
            && self.inconsistent_edges.is_empty()
    }

    /// Euler characteristic `V - E + F`.
    #[must_use]
    #[allow(clippy::cast_possible_wrap)]
    pub fn euler_characteristic(&self) -> i64 {
        self.vertex_count as i64 - self.edge_count as i64 + self.face_count as i64
    }
}

/// Inspects a shell's loops and edge uses.
///
/// # Errors
///
/// Returns an error only if the shell references missing entities.
pub fn check_shell(store: &TopologyStore, shell: ShellId) -> Result<ShellReport, TopologyError> {
    let faces = &store.shell(shell)?.faces;
    let mut report = ShellReport {
        face_count: faces.len(),
        ..ShellReport::default()
    };

    // (face, forward) pairs seen in loops, per edge.
    let mut seen: HashMap<EdgeId, Vec<(super::FaceId, bool)>> = HashMap::new();
    let mut order = Vec::new();
    for &f in faces {
        for l in store.face(f)?.loops() {
            let lp = store.loop_(l)?;
            let n = lp.edges.len();
            let mut closed = n >= 2;
            for (i, oe) in lp.edges.iter().enumerate() {
                let (_, end) = store.oriented_vertices(*oe)?;
                let (next_start, _) = store.oriented_vertices(lp.edges[(i + 1) % n])?;
                closed &= end == next_start;
                let entry = seen.entry(oe.edge).or_default();
                if entry.is_empty() {
                    order.push(oe.edge);
                }
                entry.push((f, oe.forward));
            }
            if !closed {
                report.open_loops.push(l);
            }
        }
    }

    for e in order {
        let uses = &seen[&e];
        match uses.len() {
            1 => report.boundary_edges.push(e),
            2 => {
                if uses[0].1 == uses[1].1 {
                    report.misoriented_edges.push(e);
                }
            }
            _ => report.non_manifold_edges.push(e),
        }
        let recorded = &store.edge(e)?.uses;
        let agrees = uses.iter().all(|(f, fwd)| {
            recorded.iter().any(|u| u.face == *f && u.forward == *fwd)
        });
        if !agrees || recorded.len() != uses.len() {
            report.inconsistent_edges.push(e);
        }
    }
    report.edge_count = seen.len();
    report.vertex_count = store.shell_vertices(shell)?.len();
    Ok(report)
}

/// Returns `true` if the shell is a closed, consistently oriented
/// two-manifold.
///
/// # Errors
///
/// Returns an error only if the shell references missing entities.
pub fn is_manifold_closed(store: &TopologyStore, shell: ShellId) -> Result<bool, TopologyError> {
    Ok(check_shell(store, shell)?.is_manifold_closed())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::Point3;
    use crate::naming::NamingContext;
    use crate::operations::creation::MakeBox;
    use crate::topology::mutate::reverse_face;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    #[test]
    fn box_is_closed_with_euler_two() {
        let mut store = TopologyStore::new();
        let shell = MakeBox::new(p(0.0, 0.0, 0.0), p(1.0, 2.0, 3.0)).execute(&mut store, &NamingContext::new()).unwrap();
        let report = check_shell(&store, shell).unwrap();
        assert!(report.is_manifold_closed());
        assert_eq!((report.vertex_count, report.edge_count, report.face_count), (8, 12, 6));
        assert_eq!(report.euler_characteristic(), 2);
    }

    #[test]
    fn flipping_one_face_breaks_orientation() {
        let mut store = TopologyStore::new();
        let shell = MakeBox::new(p(0.0, 0.0, 0.0), p(1.0, 1.0, 1.0)).execute(&mut store, &NamingContext::new()).unwrap();
        let f = store.shell(shell).unwrap().faces[0];
        reverse_face(&mut store, f).unwrap();
        let report = check_shell(&store, shell).unwrap();
        assert_eq!(report.misoriented_edges.len(), 4);
        assert!(!report.is_manifold_closed());
    }

    #[test]
    fn dropping_a_face_opens_the_shell() {
        let mut store = TopologyStore::new();
        let shell = MakeBox::new(p(0.0, 0.0, 0.0), p(1.0, 1.0, 1.0)).execute(&mut store, &NamingContext::new()).unwrap();
        store.shell_mut(shell).unwrap().faces.pop();
        let report = check_shell(&store, shell).unwrap();
        assert_eq!(report.boundary_edges.len(), 4);
        assert!(!is_manifold_closed(&store, shell).unwrap());
    }
}
