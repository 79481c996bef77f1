use std::sync::Arc;

use crate::geometry::Plane;

slotmap::new_key_type! {
    /// Unique identifier for a carrier surface in the topology store.
    pub struct SurfaceId;
}

/// A carrier surface shared by one or more faces.
///
/// The geometry is reference-counted so the same surface keeps its
/// identity when shells move between stores.
#[derive(Debug, Clone)]
pub struct SurfaceData {
    pub plane: Arc<Plane>,
}

impl SurfaceData {
    /// Wraps a plane as a surface.
    #[must_use]
    pub fn new(plane: Plane) -> Self {
        Self {
            plane: Arc::new(plane),
        }
    }

    /// Returns `true` if both records carry the very same surface.
    #[must_use]
    pub fn same_identity(&self, other: &SurfaceData) -> bool {
        Arc::ptr_eq(&self.plane, &other.plane)
    }
}
