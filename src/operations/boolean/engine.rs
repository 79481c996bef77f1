use tracing::{debug, info, instrument, warn};

use super::assemble::assemble;
use super::classifier::classify_operands;
use super::merge::{merge_collinear_edges, merge_coplanar_faces};
use super::select::{decide, Keep};
use super::split::Fragment;
use super::{BooleanFlags, BooleanOp};
use crate::error::{OperationError, Result, TopologyError};
use crate::geometry::{PlanarIntersector, SurfaceIntersector};
use crate::math::{Point3, LINEAR_TOLERANCE};
use crate::naming::{assign_names, NamingContext, NamingRule, OperationId, SourceIndex};
use crate::operations::outcome::check_cancel;
use crate::operations::query::signed_volume;
use crate::operations::{AmbiguousFragment, CancelToken, CopyMode, Diagnostics, Outcome, ResultCode};
use crate::topology::mutate::reverse_face;
use crate::topology::transfer::{import_shell, import_shell_mapped, remove_shell};
use crate::topology::{check_shell, ShellId, TopologyStore};

/// Combines two shells by union, intersection or difference.
///
/// The operands are copied into a scratch store and never modified. On
/// success the result shell is added to the caller's store; with
/// [`CopyMode::UseOriginal`] the operands are removed afterwards.
///
/// # Example
///
/// ```
/// use brepweld::math::Point3;
/// use brepweld::naming::NamingContext;
/// use brepweld::operations::{Boolean, BooleanOp, MakeBox};
/// use brepweld::topology::TopologyStore;
///
/// let mut store = TopologyStore::new();
/// let ctx = NamingContext::new();
/// let a = MakeBox::new(Point3::new(0.0, 0.0, 0.0), Point3::new(2.0, 1.0, 1.0)).execute(&mut store, &ctx)?;
/// let b = MakeBox::new(Point3::new(1.0, 0.0, 0.0), Point3::new(3.0, 1.0, 1.0)).execute(&mut store, &ctx)?;
/// let outcome = Boolean::new(a, b, BooleanOp::Union).execute(&mut store, &ctx)?;
/// assert!(outcome.is_success());
/// # Ok::<(), brepweld::BrepError>(())
/// ```
pub struct Boolean<'a> {
    a: ShellId,
    b: ShellId,
    op: BooleanOp,
    flags: BooleanFlags,
    tolerance: f64,
    copy_mode: CopyMode,
    cancel: Option<CancelToken>,
    intersector: &'a dyn SurfaceIntersector,
    operation: Option<OperationId>,
    rule: Option<NamingRule>,
}

impl Boolean<'static> {
    /// Creates a new `Boolean` operation combining `a` with `b`.
    #[must_use]
    pub fn new(a: ShellId, b: ShellId, op: BooleanOp) -> Self {
        Self {
            a,
            b,
            op,
            flags: BooleanFlags::default(),
            tolerance: LINEAR_TOLERANCE,
            copy_mode: CopyMode::Copy,
            cancel: None,
            intersector: &PlanarIntersector,
            operation: None,
            rule: None,
        }
    }
}

impl<'a> Boolean<'a> {
    /// Sets the operation flags.
    #[must_use]
    pub fn with_flags(mut self, flags: BooleanFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Sets the linear tolerance.
    #[must_use]
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Sets whether the operands are consumed on success.
    #[must_use]
    pub fn with_copy_mode(mut self, copy_mode: CopyMode) -> Self {
        self.copy_mode = copy_mode;
        self
    }

    /// Sets a cancellation token checked between phases.
    #[must_use]
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Sets the surface intersector used for face pairs.
    #[must_use]
    pub fn with_intersector<'b>(self, intersector: &'b dyn SurfaceIntersector) -> Boolean<'b> {
        Boolean {
            a: self.a,
            b: self.b,
            op: self.op,
            flags: self.flags,
            tolerance: self.tolerance,
            copy_mode: self.copy_mode,
            cancel: self.cancel,
            intersector,
            operation: self.operation,
            rule: self.rule,
        }
    }

    /// Uses a fixed operation id instead of allocating one, so that a
    /// replay reproduces the same names.
    #[must_use]
    pub fn with_operation(mut self, operation: OperationId) -> Self {
        self.operation = Some(operation);
        self
    }

    /// Sets the naming rule for new elements.
    #[must_use]
    pub fn with_rule(mut self, rule: NamingRule) -> Self {
        self.rule = Some(rule);
        self
    }

    /// Copies both operands into a scratch store and checks them.
    fn prepare(&self, store: &TopologyStore) -> Result<(TopologyStore, ShellId, ShellId)> {
        let tol = self.tolerance;
        if !tol.is_finite() || tol <= 0.0 {
            return Err(OperationError::InvalidInput(format!("tolerance {tol}")).into());
        }
        let mut scratch = TopologyStore::new();
        let a = import_shell(&mut scratch, store, self.a)?;
        let b = import_shell(&mut scratch, store, self.b)?;

        for shell in [a, b] {
            let report = check_shell(&scratch, shell)?;
            if !report.non_manifold_edges.is_empty()
                || !report.open_loops.is_empty()
                || !report.inconsistent_edges.is_empty()
            {
                return Err(OperationError::InvalidInput("malformed operand shell".into()).into());
            }
            let closed = report.is_manifold_closed();
            if self.flags.closed && !closed {
                return Err(OperationError::InvalidInput("operand is not closed".into()).into());
            }
            if self.flags.check_sense && closed && signed_volume(&scratch, shell)? < 0.0 {
                debug!(?shell, "turning inside-out operand around");
                for f in scratch.shell(shell)?.faces.clone() {
                    reverse_face(&mut scratch, f)?;
                }
            }
        }
        Ok((scratch, a, b))
    }

    /// Runs the operation.
    ///
    /// An empty result, operands that do not meet (when not allowed) and
    /// unresolvable fragments are reported through the outcome's code with
    /// no shell.
    ///
    /// # Errors
    ///
    /// Returns [`OperationError::InvalidInput`] for missing, malformed or
    /// (with `closed`) open operands and bad tolerances,
    /// [`OperationError::Cancelled`] when cancelled, and a topology error
    /// when a closed result was required but could not be built.
    #[instrument(skip_all, fields(op = %self.op, tolerance = self.tolerance))]
    pub fn execute(&self, store: &mut TopologyStore, ctx: &NamingContext) -> Result<Outcome> {
        check_cancel(self.cancel.as_ref())?;
        let tol = self.tolerance;
        let (scratch, a, b) = self.prepare(store)?;
        let sources = SourceIndex::from_shells(&scratch, &[a, b])?;

        let classified = classify_operands(&scratch, a, b, self.intersector, tol, self.cancel.as_ref())?;
        if !classified.failed.is_empty() {
            let ambiguous = classified
                .fragments
                .iter()
                .filter(|f| classified.failed.contains(&f.face))
                .map(|f| ambiguous_fragment(&scratch, f))
                .collect::<Result<Vec<_>>>()?;
            warn!(faces = classified.failed.len(), "face intersections failed");
            return Ok(Outcome::failure(
                ResultCode::ClassificationAmbiguous,
                Diagnostics {
                    ambiguous_fragments: ambiguous,
                    ..Diagnostics::default()
                },
            ));
        }
        if !classified.touched && !self.flags.allow_non_intersecting {
            info!("operands do not meet");
            return Ok(Outcome::failure(ResultCode::NoIntersection, Diagnostics::default()));
        }

        let mut kept = Vec::new();
        let mut ambiguous = Vec::new();
        for frag in &classified.fragments {
            match decide(self.op, frag.operand, frag.classification) {
                Keep::Yes => kept.push((frag, false)),
                Keep::Reversed => kept.push((frag, true)),
                Keep::No => {}
                Keep::Conflict => ambiguous.push(ambiguous_fragment(&scratch, frag)?),
            }
        }
        if !ambiguous.is_empty() {
            warn!(fragments = ambiguous.len(), "fragments could not be classified");
            return Ok(Outcome::failure(
                ResultCode::ClassificationAmbiguous,
                Diagnostics {
                    ambiguous_fragments: ambiguous,
                    ..Diagnostics::default()
                },
            ));
        }
        if kept.is_empty() {
            info!("result is empty");
            return Ok(Outcome::failure(ResultCode::NoIntersection, Diagnostics::default()));
        }

        check_cancel(self.cancel.as_ref())?;
        let (mut cand, shell) = assemble(&scratch, &kept, self.intersector, tol)?;
        if self.flags.merge_faces {
            let merged = merge_coplanar_faces(&mut cand, shell)?;
            debug!(merged, "faces merged");
        }
        if self.flags.merge_edges {
            let joined = merge_collinear_edges(&mut cand, shell, self.flags.build_sag)?;
            debug!(joined, "edges merged");
        }
        if self.flags.closed && !check_shell(&cand, shell)?.is_manifold_closed() {
            return Err(TopologyError::InconsistentAdjacency("result shell is not closed".into()).into());
        }

        let operation = self.operation.unwrap_or_else(|| ctx.allocate());
        let rule = self.rule.clone().unwrap_or_else(|| NamingRule::new(self.op.tag()));
        assign_names(&mut cand, shell, operation, &rule, &sources)?;
        let (result, _) = import_shell_mapped(store, &cand, shell)?;

        if self.copy_mode == CopyMode::UseOriginal {
            remove_shell(store, self.a)?;
            if self.b != self.a {
                remove_shell(store, self.b)?;
            }
        }
        info!(faces = store.shell(result)?.faces.len(), "boolean finished");
        Ok(Outcome::success(result))
    }
}

fn ambiguous_fragment(scratch: &TopologyStore, frag: &Fragment) -> Result<AmbiguousFragment> {
    Ok(AmbiguousFragment {
        operand: frag.operand,
        source_face: scratch.face(frag.face)?.name.clone(),
        sample: frag
            .sample
            .or_else(|| frag.outer.vertices.first().map(|v| v.point))
            .unwrap_or_else(Point3::origin),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::geometry::{IntersectionFailure, Plane, Segment, SpaceCurve};
    use crate::operations::query::{TopologyCounts, Volume};
    use crate::operations::{MakeBox, Operand, Reverse};

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    fn make(store: &mut TopologyStore, ctx: &NamingContext, lo: Point3, hi: Point3) -> ShellId {
        MakeBox::new(lo, hi).execute(store, ctx).unwrap()
    }

    fn volume(store: &TopologyStore, shell: ShellId) -> f64 {
        Volume::new(shell).execute(store).unwrap()
    }

    #[test]
    fn overlapping_boxes_union_to_ten_faces() {
        let mut store = TopologyStore::new();
        let ctx = NamingContext::new();
        let a = make(&mut store, &ctx, p(0.0, 0.0, 0.0), p(2.0, 1.0, 1.0));
        let b = make(&mut store, &ctx, p(1.0, 0.0, 0.0), p(3.0, 1.0, 1.0));
        let out = Boolean::new(a, b, BooleanOp::Union).execute(&mut store, &ctx).unwrap();
        assert_eq!(out.code, ResultCode::Success);
        let shell = out.shell.unwrap();
        let counts = TopologyCounts::new(shell).execute(&store).unwrap();
        assert!(counts.closed);
        assert_eq!((counts.vertices, counts.edges, counts.faces), (12, 20, 10));
        assert!((volume(&store, shell) - 3.0).abs() < 1e-9);
    }

    #[test]
    fn merging_flags_control_face_and_edge_counts() {
        let mut store = TopologyStore::new();
        let ctx = NamingContext::new();
        let a = make(&mut store, &ctx, p(0.0, 0.0, 0.0), p(1.0, 1.0, 1.0));
        let b = make(&mut store, &ctx, p(0.5, 0.0, 0.0), p(1.5, 1.0, 1.0));
        let run = |store: &mut TopologyStore, flags: BooleanFlags| {
            let out = Boolean::new(a, b, BooleanOp::Union).with_flags(flags).execute(store, &ctx).unwrap();
            assert_eq!(out.code, ResultCode::Success);
            let shell = out.shell.unwrap();
            let counts = TopologyCounts::new(shell).execute(store).unwrap();
            assert!(counts.closed);
            assert_eq!(counts.euler_characteristic(), 2);
            assert!((volume(store, shell) - 1.5).abs() < 1e-9);
            (counts.vertices, counts.edges, counts.faces)
        };
        let flags = BooleanFlags::default();

        // Each side plane keeps the three pieces the operands were cut into.
        assert_eq!(run(&mut store, flags.with_merge_faces(false).with_merge_edges(false)), (16, 28, 14));
        assert_eq!(run(&mut store, flags.with_merge_faces(false)), (16, 28, 14));
        // Merged faces leave the cut points on their straight boundaries.
        assert_eq!(run(&mut store, flags.with_merge_edges(false)), (16, 24, 10));
        assert_eq!(run(&mut store, flags.with_build_sag(1e-9)), (12, 20, 10));
    }

    #[test]
    fn crossing_boxes_difference_and_intersection_volumes() {
        let mut store = TopologyStore::new();
        let ctx = NamingContext::new();
        let a = make(&mut store, &ctx, p(0.0, 0.0, 0.0), p(2.0, 2.0, 2.0));
        let b = make(&mut store, &ctx, p(1.0, 1.0, 1.0), p(3.0, 3.0, 3.0));

        let diff = Boolean::new(a, b, BooleanOp::Difference).execute(&mut store, &ctx).unwrap();
        assert!(diff.is_success());
        assert!((volume(&store, diff.shell.unwrap()) - 7.0).abs() < 1e-9);

        let inter = Boolean::new(a, b, BooleanOp::Intersection).execute(&mut store, &ctx).unwrap();
        assert!(inter.is_success());
        let shell = inter.shell.unwrap();
        assert!((volume(&store, shell) - 1.0).abs() < 1e-9);
        assert_eq!(store.shell(shell).unwrap().faces.len(), 6);

        let union = Boolean::new(a, b, BooleanOp::Union).execute(&mut store, &ctx).unwrap();
        assert!((volume(&store, union.shell.unwrap()) - 15.0).abs() < 1e-9);
    }

    #[test]
    fn disjoint_union_keeps_both_boxes() {
        let mut store = TopologyStore::new();
        let ctx = NamingContext::new();
        let a = make(&mut store, &ctx, p(0.0, 0.0, 0.0), p(1.0, 1.0, 1.0));
        let b = make(&mut store, &ctx, p(5.0, 0.0, 0.0), p(6.0, 1.0, 1.0));
        let out = Boolean::new(a, b, BooleanOp::Union).execute(&mut store, &ctx).unwrap();
        let shell = out.shell.unwrap();
        assert_eq!(store.shell(shell).unwrap().faces.len(), 12);
        assert!((volume(&store, shell) - 2.0).abs() < 1e-9);
    }

    #[test]
    fn disjoint_operands_can_be_refused() {
        let mut store = TopologyStore::new();
        let ctx = NamingContext::new();
        let a = make(&mut store, &ctx, p(0.0, 0.0, 0.0), p(1.0, 1.0, 1.0));
        let b = make(&mut store, &ctx, p(5.0, 0.0, 0.0), p(6.0, 1.0, 1.0));
        let out = Boolean::new(a, b, BooleanOp::Union)
            .with_flags(BooleanFlags::default().with_allow_non_intersecting(false))
            .execute(&mut store, &ctx)
            .unwrap();
        assert_eq!(out.code, ResultCode::NoIntersection);
        assert!(out.shell.is_none());

        let inter = Boolean::new(a, b, BooleanOp::Intersection).execute(&mut store, &ctx).unwrap();
        assert_eq!(inter.code, ResultCode::NoIntersection);
    }

    #[test]
    fn contained_difference_leaves_a_void() {
        let mut store = TopologyStore::new();
        let ctx = NamingContext::new();
        let a = make(&mut store, &ctx, p(0.0, 0.0, 0.0), p(4.0, 4.0, 4.0));
        let b = make(&mut store, &ctx, p(1.0, 1.0, 1.0), p(2.0, 2.0, 2.0));
        let out = Boolean::new(a, b, BooleanOp::Difference).execute(&mut store, &ctx).unwrap();
        let shell = out.shell.unwrap();
        assert_eq!(store.shell(shell).unwrap().faces.len(), 12);
        assert!((volume(&store, shell) - 63.0).abs() < 1e-9);

        let inter = Boolean::new(a, b, BooleanOp::Intersection).execute(&mut store, &ctx).unwrap();
        assert!((volume(&store, inter.shell.unwrap()) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn union_with_itself_keeps_names() {
        let mut store = TopologyStore::new();
        let ctx = NamingContext::new();
        let a = make(&mut store, &ctx, p(0.0, 0.0, 0.0), p(1.0, 1.0, 1.0));
        let out = Boolean::new(a, a, BooleanOp::Union).execute(&mut store, &ctx).unwrap();
        let shell = out.shell.unwrap();
        let names = |s: ShellId| -> Vec<_> {
            store
                .shell(s)
                .unwrap()
                .faces
                .iter()
                .map(|f| store.face(*f).unwrap().name.clone().unwrap())
                .collect()
        };
        assert_eq!(names(a), names(shell));
        assert!((volume(&store, shell) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn opposite_coplanar_contact_is_ambiguous_for_intersection() {
        let mut store = TopologyStore::new();
        let ctx = NamingContext::new();
        let a = make(&mut store, &ctx, p(0.0, 0.0, 0.0), p(1.0, 1.0, 1.0));
        let b = make(&mut store, &ctx, p(0.0, 0.0, 1.0), p(1.0, 1.0, 2.0));
        let out = Boolean::new(a, b, BooleanOp::Intersection).execute(&mut store, &ctx).unwrap();
        assert_eq!(out.code, ResultCode::ClassificationAmbiguous);
        assert!(out.shell.is_none());
        let frag = &out.diagnostics.ambiguous_fragments[0];
        assert_eq!(frag.operand, Operand::A);
        assert!((frag.sample.z - 1.0).abs() < 1e-9);

        // The same contact glues the boxes under union.
        let union = Boolean::new(a, b, BooleanOp::Union).execute(&mut store, &ctx).unwrap();
        let shell = union.shell.unwrap();
        assert!((volume(&store, shell) - 2.0).abs() < 1e-9);
        assert!(check_shell(&store, shell).unwrap().is_manifold_closed());
    }

    #[test]
    fn boxes_sharing_one_edge_union_to_two_closed_lumps() {
        let mut store = TopologyStore::new();
        let ctx = NamingContext::new();
        let a = make(&mut store, &ctx, p(0.0, 0.0, 0.0), p(1.0, 1.0, 1.0));
        let b = make(&mut store, &ctx, p(1.0, 1.0, 0.0), p(2.0, 2.0, 1.0));
        let out = Boolean::new(a, b, BooleanOp::Union).execute(&mut store, &ctx).unwrap();
        assert_eq!(out.code, ResultCode::Success);
        let shell = out.shell.unwrap();
        let counts = TopologyCounts::new(shell).execute(&store).unwrap();
        assert!(counts.closed);
        assert_eq!((counts.vertices, counts.edges, counts.faces), (14, 24, 12));
        assert!((volume(&store, shell) - 2.0).abs() < 1e-9);

        let diff = Boolean::new(a, b, BooleanOp::Difference).execute(&mut store, &ctx).unwrap();
        assert!((volume(&store, diff.shell.unwrap()) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn inside_out_operand_is_turned_around() {
        let mut store = TopologyStore::new();
        let ctx = NamingContext::new();
        let a = make(&mut store, &ctx, p(0.0, 0.0, 0.0), p(2.0, 1.0, 1.0));
        let b = make(&mut store, &ctx, p(1.0, 0.0, 0.0), p(3.0, 1.0, 1.0));
        let b = Reverse::new(b).execute(&mut store, &ctx).unwrap();
        let out = Boolean::new(a, b, BooleanOp::Union).execute(&mut store, &ctx).unwrap();
        assert!((volume(&store, out.shell.unwrap()) - 3.0).abs() < 1e-9);
    }

    #[test]
    fn use_original_consumes_operands_on_success_only() {
        let mut store = TopologyStore::new();
        let ctx = NamingContext::new();
        let a = make(&mut store, &ctx, p(0.0, 0.0, 0.0), p(1.0, 1.0, 1.0));
        let b = make(&mut store, &ctx, p(5.0, 0.0, 0.0), p(6.0, 1.0, 1.0));
        let failed = Boolean::new(a, b, BooleanOp::Intersection)
            .with_copy_mode(CopyMode::UseOriginal)
            .execute(&mut store, &ctx)
            .unwrap();
        assert!(!failed.is_success());
        assert!(store.contains_shell(a) && store.contains_shell(b));

        let out = Boolean::new(a, b, BooleanOp::Union)
            .with_copy_mode(CopyMode::UseOriginal)
            .execute(&mut store, &ctx)
            .unwrap();
        assert!(!store.contains_shell(a) && !store.contains_shell(b));
        assert_eq!(store.shell_count(), 1);
        assert!(store.contains_shell(out.shell.unwrap()));
    }

    #[test]
    fn fixed_operation_reproduces_names() {
        let run = || {
            let mut store = TopologyStore::new();
            let ctx = NamingContext::new();
            let a = make(&mut store, &ctx, p(0.0, 0.0, 0.0), p(2.0, 2.0, 2.0));
            let b = make(&mut store, &ctx, p(1.0, 1.0, 1.0), p(3.0, 3.0, 3.0));
            let shell = Boolean::new(a, b, BooleanOp::Union)
                .with_operation(OperationId(42))
                .execute(&mut store, &ctx)
                .unwrap()
                .shell
                .unwrap();
            store
                .shell(shell)
                .unwrap()
                .faces
                .iter()
                .map(|f| store.face(*f).unwrap().name.clone().unwrap().to_string())
                .collect::<Vec<_>>()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn cancelled_boolean_returns_error() {
        let mut store = TopologyStore::new();
        let ctx = NamingContext::new();
        let a = make(&mut store, &ctx, p(0.0, 0.0, 0.0), p(1.0, 1.0, 1.0));
        let token = CancelToken::new();
        token.cancel();
        let err = Boolean::new(a, a, BooleanOp::Union)
            .with_cancel(token)
            .execute(&mut store, &ctx)
            .unwrap_err();
        assert_eq!(err.code(), ResultCode::Cancelled);
        assert_eq!(store.shell_count(), 1);
    }

    /// Fails every surface pair.
    struct Broken;

    impl SurfaceIntersector for Broken {
        fn intersect_surfaces(&self, _: &Plane, _: &Plane, _: f64) -> std::result::Result<Vec<SpaceCurve>, IntersectionFailure> {
            Err(IntersectionFailure { reason: "broken".into() })
        }

        fn intersect_edges(&self, a: &Segment, b: &Segment, tol: f64) -> Vec<Point3> {
            PlanarIntersector.intersect_edges(a, b, tol)
        }
    }

    #[test]
    fn failed_intersections_are_ambiguous_for_every_op() {
        let mut store = TopologyStore::new();
        let ctx = NamingContext::new();
        let a = make(&mut store, &ctx, p(0.0, 0.0, 0.0), p(2.0, 2.0, 2.0));
        let b = make(&mut store, &ctx, p(1.0, 0.5, 0.5), p(3.0, 1.5, 1.5));
        for op in [BooleanOp::Union, BooleanOp::Intersection, BooleanOp::Difference] {
            let out = Boolean::new(a, b, op)
                .with_intersector(&Broken)
                .execute(&mut store, &ctx)
                .unwrap();
            assert_eq!(out.code, ResultCode::ClassificationAmbiguous, "{op}");
            assert!(out.shell.is_none());
            let frags = &out.diagnostics.ambiguous_fragments;
            assert!(frags.iter().any(|f| f.operand == Operand::A));
            assert!(frags.iter().any(|f| f.operand == Operand::B));
            assert!(frags.iter().all(|f| f.source_face.is_some()));
        }
        assert_eq!(store.shell_count(), 2);
    }

    #[test]
    fn open_operand_is_rejected_when_closed_is_required() {
        let mut store = TopologyStore::new();
        let ctx = NamingContext::new();
        let a = make(&mut store, &ctx, p(0.0, 0.0, 0.0), p(1.0, 1.0, 1.0));
        let sheet = crate::operations::MakePolyhedron::new(
            vec![p(0.0, 0.0, 0.5), p(2.0, 0.0, 0.5), p(2.0, 2.0, 0.5)],
            vec![vec![0, 1, 2]],
        )
        .execute(&mut store, &ctx)
        .unwrap();
        let err = Boolean::new(a, sheet, BooleanOp::Union).execute(&mut store, &ctx).unwrap_err();
        assert_eq!(err.code(), ResultCode::InvalidInput);
    }
}
