use std::collections::{HashMap, HashSet};

use tracing::{info, instrument, warn};

use super::bubble::bubbles;
use super::orient::orient_components;
use super::weld::weld_shell;
use super::StitchFlags;
use crate::error::{OperationError, Result};
use crate::geometry::{PlanarIntersector, SurfaceIntersector};
use crate::naming::{assign_names, demote_names, NamingContext, NamingRule, OperationId, OperationTag, SourceIndex};
use crate::operations::outcome::check_cancel;
use crate::operations::{CancelToken, CopyMode, Diagnostics, Outcome, ResultCode};
use crate::topology::transfer::{import_shell_mapped, remove_shell};
use crate::topology::{check_shell, FaceId, ShellData, ShellId, TopologyStore, VertexId};

/// Welds several shells with approximately coincident boundaries into one.
///
/// Work happens on a candidate copy of the inputs; the caller's store only
/// receives the result. Ambiguous and incomplete stitches still deliver
/// their best-effort shell together with diagnostics.
pub struct Stitch<'a> {
    shells: Vec<ShellId>,
    flags: StitchFlags,
    copy_mode: CopyMode,
    cancel: Option<CancelToken>,
    intersector: &'a dyn SurfaceIntersector,
    operation: Option<OperationId>,
    rule: Option<NamingRule>,
}

impl Stitch<'static> {
    /// Creates a new `Stitch` operation over `shells`.
    #[must_use]
    pub fn new(shells: Vec<ShellId>) -> Self {
        Self {
            shells,
            flags: StitchFlags::default(),
            copy_mode: CopyMode::Copy,
            cancel: None,
            intersector: &PlanarIntersector,
            operation: None,
            rule: None,
        }
    }
}

impl<'a> Stitch<'a> {
    /// Sets the stitch flags.
    #[must_use]
    pub fn with_flags(mut self, flags: StitchFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Sets whether the inputs are consumed on success.
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

    /// Sets the surface intersector used to refine shared edges.
    #[must_use]
    pub fn with_intersector<'b>(self, intersector: &'b dyn SurfaceIntersector) -> Stitch<'b> {
        Stitch {
            shells: self.shells,
            flags: self.flags,
            copy_mode: self.copy_mode,
            cancel: self.cancel,
            intersector,
            operation: self.operation,
            rule: self.rule,
        }
    }

    /// Uses a fixed operation id instead of allocating one.
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

    fn validate(&self, store: &TopologyStore) -> Result<()> {
        if self.shells.is_empty() {
            return Err(OperationError::InvalidInput("nothing to stitch".into()).into());
        }
        let p = self.flags.stitch_precision;
        if !p.is_finite() || p <= 0.0 {
            return Err(OperationError::InvalidInput(format!("stitch precision {p}")).into());
        }
        let mut seen = HashSet::new();
        for &s in &self.shells {
            if !seen.insert(s) {
                return Err(OperationError::InvalidInput("shell listed twice".into()).into());
            }
            let report = check_shell(store, s)?;
            if !report.non_manifold_edges.is_empty()
                || !report.open_loops.is_empty()
                || !report.inconsistent_edges.is_empty()
            {
                return Err(OperationError::InvalidInput("malformed input shell".into()).into());
            }
        }
        Ok(())
    }

    /// Runs the stitch.
    ///
    /// # Errors
    ///
    /// Returns an error for empty or malformed input, a non-positive
    /// precision, or cancellation. Tolerance problems are reported through
    /// the outcome's code instead.
    #[instrument(skip_all, fields(inputs = self.shells.len(), precision = self.flags.stitch_precision))]
    pub fn execute(&self, store: &mut TopologyStore, ctx: &NamingContext) -> Result<Outcome> {
        self.validate(store)?;
        check_cancel(self.cancel.as_ref())?;
        let precision = self.flags.stitch_precision;
        let sources = SourceIndex::from_shells(store, &self.shells)?;

        let mut cand = TopologyStore::new();
        let mut faces = Vec::new();
        let mut component: HashMap<FaceId, usize> = HashMap::new();
        for (i, &s) in self.shells.iter().enumerate() {
            let (copy, _) = import_shell_mapped(&mut cand, store, s)?;
            for &f in &cand.shell(copy)?.faces {
                component.insert(f, i);
                faces.push(f);
            }
            cand.remove_shell_record(copy);
        }
        let shell = cand.add_shell(ShellData { faces: faces.clone() });
        demote_names(&mut cand, shell)?;

        let mut group_of: HashMap<VertexId, usize> = HashMap::new();
        for &f in &faces {
            let c = component.get(&f).copied().unwrap_or(0);
            for l in cand.face(f)?.loops() {
                for v in cand.loop_vertices(l)? {
                    group_of.entry(v).or_insert(c);
                }
            }
        }
        let vertices = cand.shell_vertices(shell)?;
        let groups: Vec<usize> = vertices.iter().map(|v| group_of.get(v).copied().unwrap_or(0)).collect();
        let edges = cand.shell_edges(shell)?;
        let radii = bubbles(&cand, &vertices, &groups, &edges, precision)?;

        check_cancel(self.cancel.as_ref())?;
        let weld = weld_shell(&mut cand, shell, &vertices, &radii, self.intersector, precision)?;
        check_cancel(self.cancel.as_ref())?;
        orient_components(&mut cand, shell, &component, self.shells.len())?;
        let closed = check_shell(&cand, shell)?.is_manifold_closed();

        let mut glued = vec![false; self.shells.len()];
        for e in cand.shell_edges(shell)? {
            if let [ua, ub] = cand.edge(e)?.uses.as_slice() {
                let (ca, cb) = (component.get(&ua.face), component.get(&ub.face));
                if let (Some(&ca), Some(&cb)) = (ca, cb) {
                    if ca != cb {
                        glued[ca] = true;
                        glued[cb] = true;
                    }
                }
            }
        }

        let operation = self.operation.unwrap_or_else(|| ctx.allocate());
        let rule = self.rule.clone().unwrap_or_else(|| NamingRule::new(OperationTag::Stitch));
        assign_names(&mut cand, shell, operation, &rule, &sources)?;

        let (result, map) = import_shell_mapped(store, &cand, shell)?;
        let remap = |list: &[crate::topology::EdgeId]| -> Vec<_> {
            list.iter().filter_map(|e| map.edges.get(e).copied()).collect()
        };
        let diagnostics = Diagnostics {
            unmatched_edges: remap(&weld.unmatched_edges),
            not_glued_shells: if self.shells.len() > 1 {
                self.shells
                    .iter()
                    .zip(&glued)
                    .filter(|(_, g)| !**g)
                    .map(|(s, _)| *s)
                    .collect()
            } else {
                Vec::new()
            },
            ambiguous_buckets: weld.ambiguous_buckets.iter().map(|b| remap(b)).collect(),
            ambiguous_fragments: Vec::new(),
        };

        let code = if !diagnostics.ambiguous_buckets.is_empty() {
            ResultCode::StitchToleranceExceeded
        } else if self.flags.form_solid_body && !closed {
            ResultCode::StitchIncomplete
        } else {
            ResultCode::Success
        };
        if code == ResultCode::Success {
            if self.copy_mode == CopyMode::UseOriginal {
                for &s in &self.shells {
                    remove_shell(store, s)?;
                }
            }
            info!(closed, "stitch finished");
        } else {
            warn!(
                %code,
                unmatched = diagnostics.unmatched_edges.len(),
                ambiguous = diagnostics.ambiguous_buckets.len(),
                "stitch left a partial shell"
            );
        }
        Ok(Outcome {
            code,
            shell: Some(result),
            diagnostics,
        })
    }
}
