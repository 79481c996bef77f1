use crate::naming::Name;

use super::loops::LoopId;
use super::surface::SurfaceId;

slotmap::new_key_type! {
    /// Unique identifier for a face in the topology store.
    pub struct FaceId;
}

/// Data associated with a topological face.
///
/// A face is a bounded region on a carrier surface, defined by an outer
/// loop and optionally inner loops (holes).
#[derive(Debug, Clone)]
pub struct FaceData {
    /// The carrier surface on which this face lies.
    pub surface: SurfaceId,
    /// The outer boundary loop.
    pub outer_loop: LoopId,
    /// Inner boundary loops (holes).
    pub inner_loops: Vec<LoopId>,
    /// If `true`, the face normal agrees with the surface normal.
    pub same_sense: bool,
    pub name: Option<Name>,
    pub lineage: Vec<Name>,
}

impl FaceData {
    /// All loops of the face, outer first.
    pub fn loops(&self) -> impl Iterator<Item = LoopId> + '_ {
        std::iter::once(self.outer_loop).chain(self.inner_loops.iter().copied())
    }
}
