use crate::math::Point3;
use crate::naming::Name;

slotmap::new_key_type! {
    /// Unique identifier for a vertex in the topology store.
    pub struct VertexId;
}

/// Data associated with a topological vertex.
#[derive(Debug, Clone)]
pub struct VertexData {
    /// The 3D position of the vertex.
    pub point: Point3,
    /// Radius within which the vertex is considered to be located.
    pub tolerance: f64,
    /// Persistent name, assigned once the owning operation completes.
    pub name: Option<Name>,
    /// Names of the input vertices this vertex was derived from.
    pub lineage: Vec<Name>,
}

impl VertexData {
    /// Creates a new unnamed vertex at the given point.
    #[must_use]
    pub fn new(point: Point3) -> Self {
        Self {
            point,
            tolerance: crate::math::LINEAR_TOLERANCE,
            name: None,
            lineage: Vec::new(),
        }
    }
}
