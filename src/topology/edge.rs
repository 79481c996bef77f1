use crate::geometry::Line;
use crate::naming::Name;

use super::face::FaceId;
use super::vertex::VertexId;

slotmap::new_key_type! {
    /// Unique identifier for an edge in the topology store.
    pub struct EdgeId;
}

/// One face's use of an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeUse {
    /// The face whose loop traverses the edge.
    pub face: FaceId,
    /// `true` when the loop runs from `start` to `end`.
    pub forward: bool,
}

/// Data associated with a topological edge.
///
/// An edge connects two vertices along a straight carrier line. A manifold
/// edge has at most two uses.
#[derive(Debug, Clone)]
pub struct EdgeData {
    /// Start vertex of the edge.
    pub start: VertexId,
    /// End vertex of the edge.
    pub end: VertexId,
    /// The carrier line, parametrized by arc length.
    pub curve: Line,
    /// Parameter on the curve corresponding to the start vertex.
    pub t_start: f64,
    /// Parameter on the curve corresponding to the end vertex.
    pub t_end: f64,
    /// Faces using this edge, with their traversal sense.
    pub uses: Vec<EdgeUse>,
    pub name: Option<Name>,
    pub lineage: Vec<Name>,
}

impl EdgeData {
    /// Returns `true` if the edge connects `a` and `b` in either direction.
    #[must_use]
    pub fn connects(&self, a: VertexId, b: VertexId) -> bool {
        (self.start == a && self.end == b) || (self.start == b && self.end == a)
    }

    /// Returns the vertex at the other end from `v`.
    #[must_use]
    pub fn other_vertex(&self, v: VertexId) -> VertexId {
        if self.start == v {
            self.end
        } else {
            self.start
        }
    }

    /// Returns the use recorded for `face`, if any.
    #[must_use]
    pub fn use_of(&self, face: FaceId) -> Option<&EdgeUse> {
        self.uses.iter().find(|u| u.face == face)
    }
}
