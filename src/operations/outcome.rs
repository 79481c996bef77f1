use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::{OperationError, Result};
use crate::math::Point3;
use crate::naming::Name;
use crate::topology::{EdgeId, ShellId};

/// Status reported by every result-producing operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResultCode {
    Success,
    /// Intersection is empty, or the operands do not meet and that was
    /// not allowed.
    NoIntersection,
    /// Some fragments could not be classified reliably.
    ClassificationAmbiguous,
    /// More than two edges fell into one stitch bucket.
    StitchToleranceExceeded,
    /// Boundary edges remain although a closed shell was requested.
    StitchIncomplete,
    InvalidInput,
    TopologyError,
    Cancelled,
}

impl fmt::Display for ResultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Success => "success",
            Self::NoIntersection => "no intersection",
            Self::ClassificationAmbiguous => "classification ambiguous",
            Self::StitchToleranceExceeded => "stitch tolerance exceeded",
            Self::StitchIncomplete => "stitch incomplete",
            Self::InvalidInput => "invalid input",
            Self::TopologyError => "topology error",
            Self::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

/// Which operand of a binary operation an element came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operand {
    A,
    B,
}

/// A face fragment whose position relative to the other operand could not
/// be decided.
#[derive(Debug, Clone, PartialEq)]
pub struct AmbiguousFragment {
    pub operand: Operand,
    /// Name of the operand face the fragment was cut from.
    pub source_face: Option<Name>,
    /// Interior sample point that failed to classify.
    pub sample: Point3,
}

/// Details attached to a non-successful (or partially successful) outcome.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Diagnostics {
    /// Boundary edges left in a partial stitch result.
    pub unmatched_edges: Vec<EdgeId>,
    /// Input shells that were not glued to any other input.
    pub not_glued_shells: Vec<ShellId>,
    /// Edge groups that matched more than pairwise.
    pub ambiguous_buckets: Vec<Vec<EdgeId>>,
    pub ambiguous_fragments: Vec<AmbiguousFragment>,
}

impl Diagnostics {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.unmatched_edges.is_empty()
            && self.not_glued_shells.is_empty()
            && self.ambiguous_buckets.is_empty()
            && self.ambiguous_fragments.is_empty()
    }
}

/// Result of a Boolean or stitch operation.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub code: ResultCode,
    /// Result shell in the caller's store. Present on success and for
    /// partial stitch results.
    pub shell: Option<ShellId>,
    pub diagnostics: Diagnostics,
}

impl Outcome {
    #[must_use]
    pub fn success(shell: ShellId) -> Self {
        Self {
            code: ResultCode::Success,
            shell: Some(shell),
            diagnostics: Diagnostics::default(),
        }
    }

    #[must_use]
    pub fn failure(code: ResultCode, diagnostics: Diagnostics) -> Self {
        Self {
            code,
            shell: None,
            diagnostics,
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.code == ResultCode::Success
    }
}

/// What happens to the operand shells when an operation succeeds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum CopyMode {
    /// Operands stay untouched.
    #[default]
    Copy,
    /// Operands are consumed and removed from the store.
    UseOriginal,
}

/// Cooperative cancellation flag shared between a caller and a running
/// operation.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Creates a token that is not cancelled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    /// Returns [`OperationError::Cancelled`] once cancellation was requested.
    ///
    /// # Errors
    ///
    /// Returns an error if the token has been cancelled.
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(OperationError::Cancelled.into())
        } else {
            Ok(())
        }
    }
}

/// Checks an optional token.
pub(crate) fn check_cancel(token: Option<&CancelToken>) -> Result<()> {
    token.map_or(Ok(()), CancelToken::check)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancel_is_visible_through_clones() {
        let token = CancelToken::new();
        let worker = token.clone();
        assert!(worker.check().is_ok());
        token.cancel();
        assert!(worker.is_cancelled());
        assert!(matches!(
            check_cancel(Some(&worker)),
            Err(crate::error::BrepError::Operation(OperationError::Cancelled))
        ));
        assert!(check_cancel(None).is_ok());
    }

    #[test]
    fn failure_has_no_shell() {
        let out = Outcome::failure(ResultCode::NoIntersection, Diagnostics::default());
        assert!(!out.is_success());
        assert!(out.shell.is_none());
        assert!(out.diagnostics.is_empty());
    }
}
