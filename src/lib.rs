//! Boolean and shell-stitching engine for planar B-rep shells, with
//! persistent naming and a regenerable operation history.

pub mod error;
pub mod geometry;
pub mod history;
pub mod math;
pub mod naming;
pub mod operations;
pub mod topology;

pub use error::{BrepError, Result};
pub use history::{Creator, CreatorId, CreatorKind, History, Primitive};
pub use naming::{Name, NamingContext, NamingRule, OperationId};
pub use operations::{Boolean, BooleanFlags, BooleanOp, CopyMode, Outcome, ResultCode, Stitch, StitchFlags};
pub use topology::{ShellId, TopologyStore};
