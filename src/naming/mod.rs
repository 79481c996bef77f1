//! Persistent naming of topological elements.
//!
//! Every vertex, edge and face produced by an operation receives a
//! [`Name`] that depends only on the operation's identity, its
//! [`NamingRule`] and the names of the elements it was derived from. Names
//! are therefore reproduced exactly when a history is regenerated.

pub mod assign;

pub use assign::{assign_names, demote_names, SourceIndex};

use std::fmt;
use std::ops::Range;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::error::{NamingError, Result};

/// Identity of one modeling operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OperationId(pub u64);

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Kind of operation that minted a name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum OperationTag {
    Box,
    Prism,
    Polyhedron,
    Union,
    Intersection,
    Difference,
    Stitch,
    Reverse,
}

impl fmt::Display for OperationTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Box => "box",
            Self::Prism => "prism",
            Self::Polyhedron => "poly",
            Self::Union => "union",
            Self::Intersection => "inter",
            Self::Difference => "diff",
            Self::Stitch => "stitch",
            Self::Reverse => "rev",
        };
        f.write_str(s)
    }
}

/// Kind of topological element a name refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EntityKind {
    Vertex,
    Edge,
    Face,
}

impl EntityKind {
    fn letter(self) -> char {
        match self {
            Self::Vertex => 'V',
            Self::Edge => 'E',
            Self::Face => 'F',
        }
    }
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
struct NameNode {
    operation: OperationId,
    tag: OperationTag,
    kind: EntityKind,
    index: u32,
    ancestors: Vec<Name>,
}

/// Immutable persistent name of a vertex, edge or face.
///
/// Cloning is cheap; equality, ordering and hashing compare the full
/// derivation (operation, tag, kind, index and ancestors).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Name(Arc<NameNode>);

impl Name {
    #[must_use]
    pub fn new(
        operation: OperationId,
        tag: OperationTag,
        kind: EntityKind,
        index: u32,
        ancestors: Vec<Name>,
    ) -> Self {
        Self(Arc::new(NameNode {
            operation,
            tag,
            kind,
            index,
            ancestors,
        }))
    }

    #[must_use]
    pub fn operation(&self) -> OperationId {
        self.0.operation
    }

    #[must_use]
    pub fn tag(&self) -> OperationTag {
        self.0.tag
    }

    #[must_use]
    pub fn kind(&self) -> EntityKind {
        self.0.kind
    }

    #[must_use]
    pub fn index(&self) -> u32 {
        self.0.index
    }

    /// Names this name was derived from, sorted.
    #[must_use]
    pub fn ancestors(&self) -> &[Name] {
        &self.0.ancestors
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}#{}:{}{}",
            self.0.tag,
            self.0.operation,
            self.0.kind.letter(),
            self.0.index
        )?;
        if !self.0.ancestors.is_empty() {
            f.write_str("(")?;
            for (i, a) in self.0.ancestors.iter().enumerate() {
                if i > 0 {
                    f.write_str(",")?;
                }
                write!(f, "{a}")?;
            }
            f.write_str(")")?;
        }
        Ok(())
    }
}

/// Process-shared allocator of operation identities.
///
/// Safe to share between threads running independent operations.
#[derive(Debug)]
pub struct NamingContext {
    next: AtomicU64,
}

impl Default for NamingContext {
    fn default() -> Self {
        Self::new()
    }
}

impl NamingContext {
    #[must_use]
    pub fn new() -> Self {
        Self {
            next: AtomicU64::new(1),
        }
    }

    /// Returns a fresh operation identity, never handed out before by this
    /// context.
    pub fn allocate(&self) -> OperationId {
        OperationId(self.next.fetch_add(1, Ordering::Relaxed))
    }
}

/// Per-operation naming parameters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NamingRule {
    /// Tag stamped on every minted name.
    pub tag: OperationTag,
    /// Range of indices available for freshly minted names.
    pub indices: Range<u32>,
}

impl NamingRule {
    #[must_use]
    pub fn new(tag: OperationTag) -> Self {
        Self {
            tag,
            indices: 0..u32::MAX,
        }
    }

    /// Restricts the indices available to minted names.
    #[must_use]
    pub fn with_indices(mut self, indices: Range<u32>) -> Self {
        self.indices = indices;
        self
    }

    /// Splits the index range into `parts` equal, disjoint sub-rules.
    ///
    /// # Errors
    ///
    /// Returns [`NamingError::IndexRangeExhausted`] if the range holds
    /// fewer indices than parts.
    pub fn partition(&self, parts: usize) -> Result<Vec<NamingRule>> {
        let Range { start, end } = self.indices;
        let exhausted = || NamingError::IndexRangeExhausted { start, end };
        let parts = u32::try_from(parts).map_err(|_| exhausted())?;
        let chunk = end.saturating_sub(start).checked_div(parts).unwrap_or(0);
        if chunk == 0 {
            return Err(exhausted().into());
        }
        Ok((0..parts)
            .map(|k| self.clone().with_indices(start + k * chunk..start + (k + 1) * chunk))
            .collect())
    }
}
