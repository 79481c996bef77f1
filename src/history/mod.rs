//! Operation history.
//!
//! Every modeling step is recorded as a [`Creator`] in a [`History`] arena.
//! Creators reference their operands by [`CreatorId`] handle, so a
//! sub-history shared by several downstream steps is stored once. A
//! creator can be regenerated into a shell at any time; because each
//! creator keeps the operation identity it was given at construction, the
//! regenerated elements carry the same names every time.

mod groups;
mod regenerate;

pub use groups::OperandGroups;

use std::collections::HashSet;

use slotmap::SlotMap;
use tracing::debug;

use crate::error::{HistoryError, Result};
use crate::math::{Point3, Vector3};
use crate::naming::{NamingContext, NamingRule, OperationId, OperationTag};
use crate::operations::{BooleanFlags, BooleanOp, StitchFlags};

slotmap::new_key_type! {
    /// Handle of a creator in a [`History`].
    pub struct CreatorId;
}

/// Leaf shapes built from parameters alone.
#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    Box { min: Point3, max: Point3 },
    Prism { profile: Vec<Point3>, direction: Vector3 },
    Polyhedron { points: Vec<Point3>, faces: Vec<Vec<usize>> },
}

/// What a creator does, with the parameters needed to do it again.
#[derive(Debug, Clone, PartialEq)]
pub enum CreatorKind {
    Simple(Primitive),
    Boolean {
        op: BooleanOp,
        flags: BooleanFlags,
        tolerance: f64,
    },
    /// Union of any number of operands, folded left in operand order.
    Union { flags: BooleanFlags, tolerance: f64 },
    Stitch { flags: StitchFlags },
    Reverse,
}

impl CreatorKind {
    /// Tag stamped on the names this kind mints.
    #[must_use]
    pub fn tag(&self) -> OperationTag {
        match self {
            Self::Simple(Primitive::Box { .. }) => OperationTag::Box,
            Self::Simple(Primitive::Prism { .. }) => OperationTag::Prism,
            Self::Simple(Primitive::Polyhedron { .. }) => OperationTag::Polyhedron,
            Self::Boolean { op, .. } => op.tag(),
            Self::Union { .. } => OperationTag::Union,
            Self::Stitch { .. } => OperationTag::Stitch,
            Self::Reverse => OperationTag::Reverse,
        }
    }

    fn check_arity(&self, operands: &[CreatorId]) -> Result<()> {
        let n = operands.len();
        let ok = match self {
            Self::Simple(_) => n == 0,
            Self::Boolean { .. } => n == 2,
            Self::Union { .. } => n >= 2,
            Self::Stitch { .. } => n >= 1,
            Self::Reverse => n == 1,
        };
        if !ok {
            let msg = format!("{} cannot take {n} operand(s)", self.tag());
            return Err(HistoryError::InvalidOperands(msg).into());
        }
        if matches!(self, Self::Stitch { .. }) {
            let mut seen = HashSet::new();
            if !operands.iter().all(|o| seen.insert(*o)) {
                return Err(HistoryError::InvalidOperands("stitch operand listed twice".into()).into());
            }
        }
        Ok(())
    }
}

/// One recorded modeling step.
///
/// Immutable once added, apart from its version tag.
#[derive(Debug, Clone)]
pub struct Creator {
    kind: CreatorKind,
    operands: Vec<CreatorId>,
    operation: OperationId,
    rule: NamingRule,
    version: u32,
}

impl Creator {
    #[must_use]
    pub fn kind(&self) -> &CreatorKind {
        &self.kind
    }

    /// Operand creators, in operand order.
    #[must_use]
    pub fn operands(&self) -> &[CreatorId] {
        &self.operands
    }

    /// Operation identity reused by every regeneration.
    #[must_use]
    pub fn operation(&self) -> OperationId {
        self.operation
    }

    #[must_use]
    pub fn rule(&self) -> &NamingRule {
        &self.rule
    }

    #[must_use]
    pub fn version(&self) -> u32 {
        self.version
    }
}

#[derive(Debug, Clone)]
struct CreatorNode {
    creator: Creator,
    /// Number of operand slots in other creators naming this one.
    refcount: usize,
}

/// Arena of creators forming a directed acyclic graph.
#[derive(Debug, Default)]
pub struct History {
    nodes: SlotMap<CreatorId, CreatorNode>,
}

impl History {
    /// Creates an empty history.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[must_use]
    pub fn contains(&self, id: CreatorId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Records a step named by the default rule for its kind. The
    /// operation identity is allocated from `ctx` once and kept for good.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError::UnknownCreator`] for a dangling operand and
    /// [`HistoryError::InvalidOperands`] when the operand count does not
    /// suit the kind.
    pub fn add(&mut self, kind: CreatorKind, operands: Vec<CreatorId>, ctx: &NamingContext) -> Result<CreatorId> {
        let rule = NamingRule::new(kind.tag());
        self.add_with_rule(kind, operands, rule, ctx)
    }

    /// Records a step whose new elements are named by `rule`.
    ///
    /// # Errors
    ///
    /// Same as [`History::add`].
    pub fn add_with_rule(
        &mut self,
        kind: CreatorKind,
        operands: Vec<CreatorId>,
        rule: NamingRule,
        ctx: &NamingContext,
    ) -> Result<CreatorId> {
        if operands.iter().any(|o| !self.nodes.contains_key(*o)) {
            return Err(HistoryError::UnknownCreator.into());
        }
        kind.check_arity(&operands)?;
        for &o in &operands {
            if let Some(node) = self.nodes.get_mut(o) {
                node.refcount += 1;
            }
        }
        let creator = Creator {
            kind,
            operands,
            operation: ctx.allocate(),
            rule,
            version: 0,
        };
        debug!(tag = %creator.kind.tag(), operation = %creator.operation, "creator recorded");
        Ok(self.nodes.insert(CreatorNode { creator, refcount: 0 }))
    }

    /// Returns the creator behind a handle.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError::UnknownCreator`] if the handle is stale.
    pub fn creator(&self, id: CreatorId) -> Result<&Creator> {
        self.nodes
            .get(id)
            .map(|n| &n.creator)
            .ok_or_else(|| HistoryError::UnknownCreator.into())
    }

    /// Number of operand slots referencing `id`.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError::UnknownCreator`] if the handle is stale.
    pub fn ref_count(&self, id: CreatorId) -> Result<usize> {
        self.nodes
            .get(id)
            .map(|n| n.refcount)
            .ok_or_else(|| HistoryError::UnknownCreator.into())
    }

    /// Marks a creator as edited.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError::UnknownCreator`] if the handle is stale.
    pub fn bump_version(&mut self, id: CreatorId) -> Result<u32> {
        let node = self.nodes.get_mut(id).ok_or(HistoryError::UnknownCreator)?;
        node.creator.version += 1;
        Ok(node.creator.version)
    }

    /// Deletes an unreferenced creator and drops its references to its
    /// operands.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError::StillReferenced`] while another creator
    /// uses it.
    pub fn release(&mut self, id: CreatorId) -> Result<Creator> {
        let refcount = self.ref_count(id)?;
        if refcount > 0 {
            return Err(HistoryError::StillReferenced { count: refcount }.into());
        }
        let node = self.nodes.remove(id).ok_or(HistoryError::UnknownCreator)?;
        self.unreference(&node.creator.operands);
        Ok(node.creator)
    }

    /// Deletes every creator not reachable from `roots`. Returns how many
    /// were removed.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError::UnknownCreator`] if a root is stale.
    pub fn compact(&mut self, roots: &[CreatorId]) -> Result<usize> {
        let groups = self.operand_groups(roots)?;
        let keep: HashSet<CreatorId> = groups.flat.into_iter().collect();
        let dead: Vec<CreatorId> = self.nodes.keys().filter(|id| !keep.contains(id)).collect();
        for &id in &dead {
            if let Some(node) = self.nodes.remove(id) {
                self.unreference(&node.creator.operands);
            }
        }
        debug!(removed = dead.len(), kept = keep.len(), "history compacted");
        Ok(dead.len())
    }

    fn unreference(&mut self, operands: &[CreatorId]) {
        for &o in operands {
            if let Some(node) = self.nodes.get_mut(o) {
                node.refcount = node.refcount.saturating_sub(1);
            }
        }
    }
}
