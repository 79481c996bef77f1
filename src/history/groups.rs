use std::collections::{HashMap, HashSet};
use std::ops::Range;

use super::{CreatorId, History};
use crate::error::Result;

/// Flattened sub-histories of a list of operand creators.
///
/// `flat` lists every creator reachable from `roots` exactly once, in
/// post-order (operands before their users). `ranges[i]` is the slice of
/// `flat` first reached from `roots[i]`; a sub-history already reached
/// from an earlier root is not repeated in a later range. `shared` holds
/// the creators reachable from more than one root, in `flat` order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OperandGroups {
    pub flat: Vec<CreatorId>,
    pub ranges: Vec<Range<usize>>,
    pub roots: Vec<CreatorId>,
    pub shared: Vec<CreatorId>,
}

impl OperandGroups {
    /// Creators first reached from root `i`.
    #[must_use]
    pub fn group(&self, i: usize) -> &[CreatorId] {
        self.ranges.get(i).map_or(&[], |r| &self.flat[r.clone()])
    }
}

impl History {
    /// Flattens the sub-histories of `roots`.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError::UnknownCreator`](crate::error::HistoryError::UnknownCreator)
    /// if a handle is stale.
    pub fn operand_groups(&self, roots: &[CreatorId]) -> Result<OperandGroups> {
        let mut seen = HashSet::new();
        let mut flat = Vec::new();
        let mut ranges = Vec::with_capacity(roots.len());
        let mut reach: HashMap<CreatorId, usize> = HashMap::new();
        for &root in roots {
            let start = flat.len();
            self.post_order(root, &mut seen, &mut flat)?;
            ranges.push(start..flat.len());

            let mut local = HashSet::new();
            let mut scratch = Vec::new();
            self.post_order(root, &mut local, &mut scratch)?;
            for id in scratch {
                *reach.entry(id).or_default() += 1;
            }
        }
        let shared = flat
            .iter()
            .copied()
            .filter(|id| reach.get(id).copied().unwrap_or(0) > 1)
            .collect();
        Ok(OperandGroups {
            flat,
            ranges,
            roots: roots.to_vec(),
            shared,
        })
    }

    /// Appends the not yet `seen` part of `root`'s sub-history to `out`,
    /// operands first.
    fn post_order(&self, root: CreatorId, seen: &mut HashSet<CreatorId>, out: &mut Vec<CreatorId>) -> Result<()> {
        self.creator(root)?;
        if !seen.insert(root) {
            return Ok(());
        }
        let mut stack: Vec<(CreatorId, usize)> = vec![(root, 0)];
        while let Some(top) = stack.last_mut() {
            let (id, next) = *top;
            let operands = self.creator(id)?.operands();
            if let Some(&child) = operands.get(next) {
                top.1 += 1;
                if seen.insert(child) {
                    stack.push((child, 0));
                }
            } else {
                stack.pop();
                out.push(id);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::history::{CreatorKind, Primitive};
    use crate::math::Point3;
    use crate::naming::NamingContext;
    use crate::operations::{BooleanFlags, BooleanOp};

    fn leaf(h: &mut History, ctx: &NamingContext, x: f64) -> CreatorId {
        let kind = CreatorKind::Simple(Primitive::Box {
            min: Point3::new(x, 0.0, 0.0),
            max: Point3::new(x + 1.0, 1.0, 1.0),
        });
        h.add(kind, vec![], ctx).unwrap()
    }

    fn union() -> CreatorKind {
        CreatorKind::Boolean {
            op: BooleanOp::Union,
            flags: BooleanFlags::default(),
            tolerance: 1e-7,
        }
    }

    #[test]
    fn shared_sub_history_is_listed_once() {
        let ctx = NamingContext::new();
        let mut h = History::new();
        let a = leaf(&mut h, &ctx, 0.0);
        let b = leaf(&mut h, &ctx, 0.5);
        let c = leaf(&mut h, &ctx, 1.0);
        let ab = h.add(union(), vec![a, b], &ctx).unwrap();
        let ac = h.add(union(), vec![a, c], &ctx).unwrap();

        let groups = h.operand_groups(&[ab, ac]).unwrap();
        assert_eq!(groups.flat, vec![a, b, ab, c, ac]);
        assert_eq!(groups.ranges, vec![0..3, 3..5]);
        assert_eq!(groups.group(1), &[c, ac]);
        assert_eq!(groups.shared, vec![a]);
        assert_eq!(groups.roots, vec![ab, ac]);
    }

    #[test]
    fn repeated_operand_is_visited_once() {
        let ctx = NamingContext::new();
        let mut h = History::new();
        let a = leaf(&mut h, &ctx, 0.0);
        let aa = h.add(union(), vec![a, a], &ctx).unwrap();
        let groups = h.operand_groups(&[aa]).unwrap();
        assert_eq!(groups.flat, vec![a, aa]);
        assert!(groups.shared.is_empty());
        assert!(groups.group(5).is_empty());
    }

    #[test]
    fn stale_root_is_an_error() {
        let ctx = NamingContext::new();
        let mut h = History::new();
        let a = leaf(&mut h, &ctx, 0.0);
        h.release(a).unwrap();
        assert!(h.operand_groups(&[a]).is_err());
    }
}
