use super::edge::EdgeId;

slotmap::new_key_type! {
    /// Unique identifier for a loop in the topology store.
    pub struct LoopId;
}

/// An edge with orientation information within a loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrientedEdge {
    /// The edge identifier.
    pub edge: EdgeId,
    /// If `true`, the edge is traversed in its natural direction (start → end).
    /// If `false`, the edge is traversed in reverse (end → start).
    pub forward: bool,
}

impl OrientedEdge {
    /// Creates a new oriented edge.
    #[must_use]
    pub fn new(edge: EdgeId, forward: bool) -> Self {
        Self { edge, forward }
    }

    /// The same edge traversed the other way.
    #[must_use]
    pub fn reversed(self) -> Self {
        Self {
            edge: self.edge,
            forward: !self.forward,
        }
    }
}

/// A closed cycle of oriented edges bounding a face.
///
/// Outer loops run counter-clockwise around the face normal, inner loops
/// clockwise.
#[derive(Debug, Clone, Default)]
pub struct LoopData {
    /// The ordered sequence of oriented edges.
    pub edges: Vec<OrientedEdge>,
}
