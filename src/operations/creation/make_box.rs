use crate::error::{OperationError, Result};
use crate::math::{Point3, TOLERANCE};
use crate::naming::{NamingContext, OperationId, OperationTag};
use crate::topology::{ShellId, TopologyStore};

use super::MakePolyhedron;

/// Creates an axis-aligned box shell from two corner points.
#[derive(Debug, Clone)]
pub struct MakeBox {
    min_corner: Point3,
    max_corner: Point3,
    operation: Option<OperationId>,
}

impl MakeBox {
    /// Creates a new `MakeBox` operation.
    #[must_use]
    pub fn new(min_corner: Point3, max_corner: Point3) -> Self {
        Self {
            min_corner,
            max_corner,
            operation: None,
        }
    }

    /// Uses a fixed operation id instead of allocating one.
    #[must_use]
    pub fn with_operation(mut self, operation: OperationId) -> Self {
        self.operation = Some(operation);
        self
    }

    /// Executes the operation, creating the box in the topology store.
    ///
    /// Faces come out in the order bottom, top, front (-y), right (+x),
    /// back (+y), left (-x).
    ///
    /// # Errors
    ///
    /// Returns [`OperationError::InvalidInput`] if the box has no volume.
    pub fn execute(&self, store: &mut TopologyStore, ctx: &NamingContext) -> Result<ShellId> {
        let (lo, hi) = (self.min_corner, self.max_corner);
        if (0..3).any(|i| hi[i] - lo[i] <= TOLERANCE) {
            return Err(OperationError::InvalidInput("box corners must span every axis".into()).into());
        }
        let points = vec![
            Point3::new(lo.x, lo.y, lo.z),
            Point3::new(hi.x, lo.y, lo.z),
            Point3::new(hi.x, hi.y, lo.z),
            Point3::new(lo.x, hi.y, lo.z),
            Point3::new(lo.x, lo.y, hi.z),
            Point3::new(hi.x, lo.y, hi.z),
            Point3::new(hi.x, hi.y, hi.z),
            Point3::new(lo.x, hi.y, hi.z),
        ];
        let faces = vec![
            vec![0, 3, 2, 1],
            vec![4, 5, 6, 7],
            vec![0, 1, 5, 4],
            vec![1, 2, 6, 5],
            vec![2, 3, 7, 6],
            vec![3, 0, 4, 7],
        ];
        let mut op = MakePolyhedron::new(points, faces).with_tag(OperationTag::Box);
        if let Some(id) = self.operation {
            op = op.with_operation(id);
        }
        op.execute(store, ctx)
    }
}
