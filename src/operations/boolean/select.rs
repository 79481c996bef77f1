use super::classify::Classification;
use super::BooleanOp;
use crate::operations::Operand;

/// What happens to a classified fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Keep {
    Yes,
    /// Keep with the orientation turned around.
    Reversed,
    No,
    /// The fragment cannot be placed in the result.
    Conflict,
}

/// Decides the fate of a fragment from its operand, its position relative
/// to the other operand, and the operation.
///
/// | Fragment | Position            | Union | Intersection | Difference |
/// |----------|---------------------|-------|--------------|------------|
/// | from A   | outside B           | keep  | drop         | keep       |
/// | from A   | inside B            | drop  | keep         | drop       |
/// | from A   | on B, same side     | keep  | keep         | drop       |
/// | from A   | on B, opposite side | drop  | conflict     | keep       |
/// | from B   | outside A           | keep  | drop         | drop       |
/// | from B   | inside A            | drop  | keep         | reversed   |
/// | from B   | on A, any side      | drop  | drop         | drop       |
///
/// Unclassified fragments are always a conflict.
#[allow(clippy::match_same_arms)]
pub(crate) fn decide(op: BooleanOp, operand: Operand, class: Classification) -> Keep {
    use Classification::{Ambiguous, Inside, OnBoundary, Outside};
    match (operand, class, op) {
        (_, Ambiguous, _) => Keep::Conflict,

        (Operand::A, Outside, BooleanOp::Union | BooleanOp::Difference) => Keep::Yes,
        (Operand::A, Outside, BooleanOp::Intersection) => Keep::No,
        (Operand::A, Inside, BooleanOp::Intersection) => Keep::Yes,
        (Operand::A, Inside, BooleanOp::Union | BooleanOp::Difference) => Keep::No,

        (Operand::A, OnBoundary { same_orientation: true }, BooleanOp::Difference) => Keep::No,
        (Operand::A, OnBoundary { same_orientation: true }, _) => Keep::Yes,
        (Operand::A, OnBoundary { same_orientation: false }, BooleanOp::Union) => Keep::No,
        (Operand::A, OnBoundary { same_orientation: false }, BooleanOp::Intersection) => Keep::Conflict,
        (Operand::A, OnBoundary { same_orientation: false }, BooleanOp::Difference) => Keep::Yes,

        (Operand::B, Outside, BooleanOp::Union) => Keep::Yes,
        (Operand::B, Outside, _) => Keep::No,
        (Operand::B, Inside, BooleanOp::Union) => Keep::No,
        (Operand::B, Inside, BooleanOp::Intersection) => Keep::Yes,
        (Operand::B, Inside, BooleanOp::Difference) => Keep::Reversed,
        (Operand::B, OnBoundary { .. }, _) => Keep::No,
    }
}
