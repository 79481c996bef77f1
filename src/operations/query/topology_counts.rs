use crate::error::Result;
use crate::topology::{check_shell, ShellId, TopologyStore};

/// Element counts of a shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TopologyCountsResult {
    pub vertices: usize,
    pub edges: usize,
    pub faces: usize,
    pub boundary_edges: usize,
    pub closed: bool,
}

impl TopologyCountsResult {
    /// Euler characteristic `V - E + F`.
    #[must_use]
    #[allow(clippy::cast_possible_wrap)]
    pub fn euler_characteristic(&self) -> i64 {
        self.vertices as i64 - self.edges as i64 + self.faces as i64
    }
}

/// Counts the vertices, edges and faces of a shell.
pub struct TopologyCounts {
    shell: ShellId,
}

impl TopologyCounts {
    /// Creates a new `TopologyCounts` query.
    #[must_use]
    pub fn new(shell: ShellId) -> Self {
        Self { shell }
    }

    /// Executes the query.
    ///
    /// # Errors
    ///
    /// Returns an error if the shell references missing entities.
    pub fn execute(&self, store: &TopologyStore) -> Result<TopologyCountsResult> {
        let report = check_shell(store, self.shell)?;
        Ok(TopologyCountsResult {
            vertices: report.vertex_count,
            edges: report.edge_count,
            faces: report.face_count,
            boundary_edges: report.boundary_edges.len(),
            closed: report.is_manifold_closed(),
        })
    }
}
