//! Modeling operations on shells in a [`TopologyStore`](crate::topology::TopologyStore).
//!
//! Every operation is a small builder struct with `new(..)` and
//! `execute(..)`. Result-producing operations work on a private candidate
//! store and only touch the caller's store once they succeed.

pub mod boolean;
pub mod creation;
pub mod outcome;
pub mod query;
pub mod reverse;
pub mod stitch;

pub use boolean::{Boolean, BooleanFlags, BooleanOp};
pub use creation::{MakeBox, MakePolyhedron, MakePrism};
pub use outcome::{AmbiguousFragment, CancelToken, CopyMode, Diagnostics, Operand, Outcome, ResultCode};
pub use query::{BoundingBox, TopologyCounts, Volume};
pub use reverse::Reverse;
pub use stitch::{Stitch, StitchFlags};
