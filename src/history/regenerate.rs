use std::collections::HashMap;

use tracing::{debug, info, instrument, warn};

use super::{Creator, CreatorId, CreatorKind, History, Primitive};
use crate::error::{HistoryError, Result};
use crate::naming::NamingContext;
use crate::operations::{
    Boolean, BooleanFlags, BooleanOp, MakeBox, MakePolyhedron, MakePrism, Outcome, Reverse, Stitch,
};
use crate::topology::transfer::remove_shell;
use crate::topology::{ShellId, TopologyStore};

impl History {
    /// Rebuilds the shell recorded by `root` into `store`.
    ///
    /// Each creator of the sub-history is built once, in post-order, even
    /// when several users share it. Intermediate shells are removed from
    /// the store as soon as their last user is built, so on return the
    /// store holds only the result. A step that does not succeed ends the
    /// walk; its outcome is returned with every intermediate discarded.
    ///
    /// # Errors
    ///
    /// Returns an error for stale handles and for errors raised by the
    /// operations themselves.
    #[instrument(skip_all, fields(root = ?root))]
    pub fn regenerate(&self, root: CreatorId, store: &mut TopologyStore, ctx: &NamingContext) -> Result<Outcome> {
        let groups = self.operand_groups(&[root])?;
        let mut users: HashMap<CreatorId, usize> = HashMap::new();
        for &id in &groups.flat {
            for &o in self.creator(id)?.operands() {
                *users.entry(o).or_default() += 1;
            }
        }

        let mut built: HashMap<CreatorId, ShellId> = HashMap::new();
        for &id in &groups.flat {
            let creator = self.creator(id)?;
            let inputs: Option<Vec<ShellId>> = creator.operands().iter().map(|o| built.get(o).copied()).collect();
            let Some(inputs) = inputs else {
                discard(store, built.into_values());
                return Err(HistoryError::UnknownCreator.into());
            };
            let outcome = match build(creator, &inputs, store, ctx) {
                Ok(outcome) => outcome,
                Err(err) => {
                    discard(store, built.into_values());
                    return Err(err);
                }
            };
            debug!(tag = %creator.kind().tag(), code = %outcome.code, "creator rebuilt");

            if id == root {
                discard(store, built.into_values());
                info!(code = %outcome.code, steps = groups.flat.len(), "history regenerated");
                return Ok(outcome);
            }
            let shell = match outcome.shell {
                Some(shell) if outcome.is_success() => shell,
                partial => {
                    warn!(code = %outcome.code, "intermediate step failed");
                    discard(store, built.into_values().chain(partial));
                    return Ok(Outcome { shell: None, ..outcome });
                }
            };
            built.insert(id, shell);
            for o in creator.operands() {
                let Some(left) = users.get_mut(o) else { continue };
                *left -= 1;
                if *left == 0 {
                    if let Some(s) = built.remove(o) {
                        remove_shell(store, s)?;
                    }
                }
            }
        }
        // The root is the last creator of its own post-order.
        Err(HistoryError::UnknownCreator.into())
    }
}

/// Runs one creator on already built operand shells.
fn build(creator: &Creator, inputs: &[ShellId], store: &mut TopologyStore, ctx: &NamingContext) -> Result<Outcome> {
    let operation = creator.operation();
    match (creator.kind(), inputs) {
        (CreatorKind::Simple(primitive), []) => {
            let shell = match primitive {
                Primitive::Box { min, max } => MakeBox::new(*min, *max).with_operation(operation).execute(store, ctx)?,
                Primitive::Prism { profile, direction } => MakePrism::new(profile.clone(), *direction)
                    .with_operation(operation)
                    .execute(store, ctx)?,
                Primitive::Polyhedron { points, faces } => MakePolyhedron::new(points.clone(), faces.clone())
                    .with_operation(operation)
                    .execute(store, ctx)?,
            };
            Ok(Outcome::success(shell))
        }
        (CreatorKind::Boolean { op, flags, tolerance }, &[a, b]) => Boolean::new(a, b, *op)
            .with_flags(*flags)
            .with_tolerance(*tolerance)
            .with_operation(operation)
            .with_rule(creator.rule().clone())
            .execute(store, ctx),
        (CreatorKind::Union { flags, tolerance }, [first, rest @ ..]) if !rest.is_empty() => {
            union_fold(creator, *first, rest, *flags, *tolerance, store, ctx)
        }
        (CreatorKind::Stitch { flags }, shells) if !shells.is_empty() => Stitch::new(shells.to_vec())
            .with_flags(*flags)
            .with_operation(operation)
            .with_rule(creator.rule().clone())
            .execute(store, ctx),
        (CreatorKind::Reverse, &[shell]) => {
            let shell = Reverse::new(shell).with_operation(operation).execute(store, ctx)?;
            Ok(Outcome::success(shell))
        }
        (kind, _) => {
            let msg = format!("{} cannot take {} operand(s)", kind.tag(), inputs.len());
            Err(HistoryError::InvalidOperands(msg).into())
        }
    }
}

/// Pairwise unions in operand order. Every step shares the creator's
/// operation identity and mints names from its own slice of the index
/// range, so no two steps can hand out the same name.
fn union_fold(
    creator: &Creator,
    first: ShellId,
    rest: &[ShellId],
    flags: BooleanFlags,
    tolerance: f64,
    store: &mut TopologyStore,
    ctx: &NamingContext,
) -> Result<Outcome> {
    let rules = creator.rule().partition(rest.len())?;
    let mut acc = first;
    let mut owned = false;
    for (&next, rule) in rest.iter().zip(rules) {
        let step = Boolean::new(acc, next, BooleanOp::Union)
            .with_flags(flags)
            .with_tolerance(tolerance)
            .with_operation(creator.operation())
            .with_rule(rule)
            .execute(store, ctx);
        if owned {
            discard(store, [acc]);
        }
        let outcome = step?;
        match outcome.shell {
            Some(shell) if outcome.is_success() => {
                acc = shell;
                owned = true;
            }
            _ => return Ok(outcome),
        }
    }
    Ok(Outcome::success(acc))
}

fn discard(store: &mut TopologyStore, shells: impl IntoIterator<Item = ShellId>) {
    for s in shells {
        if let Err(err) = remove_shell(store, s) {
            warn!(%err, "intermediate shell already gone");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::{Point3, Vector3};
    use crate::operations::{ResultCode, StitchFlags, Volume};
    use crate::topology::{check_shell, TopologyStore};

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    fn cube(h: &mut History, ctx: &NamingContext, lo: f64, hi: f64) -> CreatorId {
        let kind = CreatorKind::Simple(Primitive::Box {
            min: p(lo, lo, lo),
            max: p(hi, hi, hi),
        });
        h.add(kind, vec![], ctx).unwrap()
    }

    fn boolean(op: BooleanOp) -> CreatorKind {
        CreatorKind::Boolean {
            op,
            flags: BooleanFlags::default(),
            tolerance: 1e-7,
        }
    }

    fn face_names(store: &TopologyStore, shell: ShellId) -> Vec<String> {
        let mut names: Vec<String> = store
            .shell(shell)
            .unwrap()
            .faces
            .iter()
            .map(|f| store.face(*f).unwrap().name.as_ref().map(ToString::to_string).unwrap_or_default())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn regeneration_reproduces_names() {
        let ctx = NamingContext::new();
        let mut h = History::new();
        let a = cube(&mut h, &ctx, 0.0, 2.0);
        let b = cube(&mut h, &ctx, 1.0, 3.0);
        let d = h.add(boolean(BooleanOp::Difference), vec![a, b], &ctx).unwrap();

        let mut first = TopologyStore::new();
        let s1 = h.regenerate(d, &mut first, &ctx).unwrap().shell.unwrap();
        let mut second = TopologyStore::new();
        let s2 = h.regenerate(d, &mut second, &ctx).unwrap().shell.unwrap();

        assert_eq!(face_names(&first, s1), face_names(&second, s2));
        assert!(face_names(&first, s1).iter().all(|n| !n.is_empty()));
        // Operand shells are gone; only the result remains.
        assert_eq!(first.shell_count(), 1);
        assert!((Volume::new(s1).execute(&first).unwrap() - 7.0).abs() < 1e-9);
    }

    #[test]
    fn shared_ancestor_is_built_once() {
        let ctx = NamingContext::new();
        let mut h = History::new();
        let block = cube(&mut h, &ctx, 0.0, 4.0);
        let pocket = cube(&mut h, &ctx, 1.0, 2.0);
        let core = cube(&mut h, &ctx, 2.5, 3.5);
        let hollowed = h.add(boolean(BooleanOp::Difference), vec![block, pocket], &ctx).unwrap();
        let kept = h.add(boolean(BooleanOp::Intersection), vec![block, core], &ctx).unwrap();
        let root = h.add(boolean(BooleanOp::Difference), vec![hollowed, kept], &ctx).unwrap();
        assert_eq!(h.ref_count(block).unwrap(), 2);
        assert_eq!(h.operand_groups(&[root]).unwrap().flat.len(), 6);

        let mut store = TopologyStore::new();
        let out = h.regenerate(root, &mut store, &ctx).unwrap();
        assert_eq!(out.code, ResultCode::Success);
        assert_eq!(store.shell_count(), 1);
        let vol = Volume::new(out.shell.unwrap()).execute(&store).unwrap();
        assert!((vol - 62.0).abs() < 1e-9);
    }

    #[test]
    fn nary_union_folds_left() {
        let ctx = NamingContext::new();
        let mut h = History::new();
        let cubes: Vec<_> = [0.0, 0.5, 1.0].iter().map(|&x| {
            let kind = CreatorKind::Simple(Primitive::Box {
                min: p(x, 0.0, 0.0),
                max: p(x + 1.0, 1.0, 1.0),
            });
            h.add(kind, vec![], &ctx).unwrap()
        }).collect();
        let u = h
            .add(
                CreatorKind::Union {
                    flags: BooleanFlags::default(),
                    tolerance: 1e-7,
                },
                cubes,
                &ctx,
            )
            .unwrap();

        let mut store = TopologyStore::new();
        let shell = h.regenerate(u, &mut store, &ctx).unwrap().shell.unwrap();
        assert_eq!(store.shell_count(), 1);
        assert!(check_shell(&store, shell).unwrap().is_manifold_closed());
        assert!((Volume::new(shell).execute(&store).unwrap() - 2.0).abs() < 1e-9);

        let mut again = TopologyStore::new();
        let shell2 = h.regenerate(u, &mut again, &ctx).unwrap().shell.unwrap();
        assert_eq!(face_names(&store, shell), face_names(&again, shell2));
    }

    #[test]
    fn failed_step_leaves_store_clean() {
        let ctx = NamingContext::new();
        let mut h = History::new();
        let a = cube(&mut h, &ctx, 0.0, 1.0);
        let b = cube(&mut h, &ctx, 5.0, 6.0);
        let inter = h.add(boolean(BooleanOp::Intersection), vec![a, b], &ctx).unwrap();
        let rev = h.add(CreatorKind::Reverse, vec![inter], &ctx).unwrap();

        let mut store = TopologyStore::new();
        let out = h.regenerate(rev, &mut store, &ctx).unwrap();
        assert_eq!(out.code, ResultCode::NoIntersection);
        assert!(out.shell.is_none());
        assert_eq!(store.shell_count(), 0);
    }

    #[test]
    fn stitch_and_reverse_regenerate() {
        let ctx = NamingContext::new();
        let mut h = History::new();
        let prism = h
            .add(
                CreatorKind::Simple(Primitive::Prism {
                    profile: vec![p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0), p(0.0, 1.0, 0.0)],
                    direction: Vector3::new(0.0, 0.0, 1.0),
                }),
                vec![],
                &ctx,
            )
            .unwrap();
        let stitched = h
            .add(CreatorKind::Stitch { flags: StitchFlags::default() }, vec![prism], &ctx)
            .unwrap();
        let rev = h.add(CreatorKind::Reverse, vec![stitched], &ctx).unwrap();

        let mut store = TopologyStore::new();
        let out = h.regenerate(rev, &mut store, &ctx).unwrap();
        let shell = out.shell.unwrap();
        assert_eq!(store.shell_count(), 1);
        assert!((Volume::new(shell).execute(&store).unwrap() + 0.5).abs() < 1e-9);
    }
}
