//! Boolean combination of two shells.
//!
//! Faces of both operands are intersected pairwise, split along the cuts,
//! classified against the other operand and selected per operation. The
//! kept fragments are welded into a new shell that receives fresh or
//! inherited names.

mod assemble;
mod classifier;
mod classify;
mod engine;
mod face_intersection;
mod merge;
mod select;
mod split;

pub use engine::Boolean;

use std::fmt;

use crate::naming::OperationTag;

/// The type of Boolean operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BooleanOp {
    Union,
    Intersection,
    /// `A - B`.
    Difference,
}

impl BooleanOp {
    /// Tag recorded in the names this operation mints.
    #[must_use]
    pub fn tag(self) -> OperationTag {
        match self {
            Self::Union => OperationTag::Union,
            Self::Intersection => OperationTag::Intersection,
            Self::Difference => OperationTag::Difference,
        }
    }
}

impl fmt::Display for BooleanOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Union => "union",
            Self::Intersection => "intersection",
            Self::Difference => "difference",
        };
        f.write_str(s)
    }
}

/// Boolean configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BooleanFlags {
    /// Fuse adjacent result faces on the same carrier surface.
    pub merge_faces: bool,
    /// Fuse straight edge chains left behind by face merging.
    pub merge_edges: bool,
    /// Turn inside-out closed operands around before classifying.
    pub check_sense: bool,
    /// Operands that do not meet still produce a result.
    pub allow_non_intersecting: bool,
    /// Both operands must be closed, and so must the result.
    pub closed: bool,
    /// Largest deviation from a straight chord accepted when fusing edges.
    pub build_sag: f64,
}

impl Default for BooleanFlags {
    fn default() -> Self {
        Self {
            merge_faces: true,
            merge_edges: true,
            check_sense: true,
            allow_non_intersecting: true,
            closed: true,
            build_sag: 1e-6,
        }
    }
}

impl BooleanFlags {
    /// Sets whether coplanar result faces are fused.
    #[must_use]
    pub fn with_merge_faces(mut self, merge_faces: bool) -> Self {
        self.merge_faces = merge_faces;
        self
    }

    /// Sets whether straight edge chains are fused.
    #[must_use]
    pub fn with_merge_edges(mut self, merge_edges: bool) -> Self {
        self.merge_edges = merge_edges;
        self
    }

    /// Sets whether inside-out operands are turned around.
    #[must_use]
    pub fn with_check_sense(mut self, check_sense: bool) -> Self {
        self.check_sense = check_sense;
        self
    }

    /// Sets whether operands that do not meet still give a result.
    #[must_use]
    pub fn with_allow_non_intersecting(mut self, allow_non_intersecting: bool) -> Self {
        self.allow_non_intersecting = allow_non_intersecting;
        self
    }

    /// Sets whether operands and result must be closed.
    #[must_use]
    pub fn with_closed(mut self, closed: bool) -> Self {
        self.closed = closed;
        self
    }

    /// Sets the largest chord deviation accepted when fusing edges.
    #[must_use]
    pub fn with_build_sag(mut self, build_sag: f64) -> Self {
        self.build_sag = build_sag;
        self
    }
}
