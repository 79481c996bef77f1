use crate::error::{OperationError, Result};
use crate::math::polygon_3d::newell_normal;
use crate::math::{Point3, Vector3, TOLERANCE};
use crate::naming::{NamingContext, OperationId, OperationTag};
use crate::topology::{ShellId, TopologyStore};

use super::MakePolyhedron;

/// Sweeps a planar polygon along a direction to create a closed prism.
#[derive(Debug, Clone)]
pub struct MakePrism {
    profile: Vec<Point3>,
    direction: Vector3,
    operation: Option<OperationId>,
}

impl MakePrism {
    /// Creates a new `MakePrism` operation sweeping `profile` along `direction`.
    #[must_use]
    pub fn new(profile: Vec<Point3>, direction: Vector3) -> Self {
        Self {
            profile,
            direction,
            operation: None,
        }
    }

    /// Uses a fixed operation id instead of allocating one.
    #[must_use]
    pub fn with_operation(mut self, operation: OperationId) -> Self {
        self.operation = Some(operation);
        self
    }

    /// Executes the sweep.
    ///
    /// Faces come out as bottom, top, then one side per profile edge.
    ///
    /// # Errors
    ///
    /// Returns [`OperationError::InvalidInput`] if the direction is zero,
    /// the profile is degenerate, or the direction lies in the profile plane.
    pub fn execute(&self, store: &mut TopologyStore, ctx: &NamingContext) -> Result<ShellId> {
        if self.direction.norm() < TOLERANCE {
            return Err(OperationError::InvalidInput("prism direction must be non-zero".into()).into());
        }
        if self.profile.len() < 3 {
            return Err(OperationError::InvalidInput("prism profile needs three points".into()).into());
        }
        let normal = newell_normal(&self.profile)
            .ok_or_else(|| OperationError::InvalidInput("prism profile has no area".into()))?;
        if normal.dot(&self.direction).abs() < TOLERANCE * self.direction.norm() {
            return Err(OperationError::InvalidInput("direction lies in the profile plane".into()).into());
        }

        // Base winds counter-clockwise about the sweep direction, so the
        // bottom cycle is the base reversed.
        let base: Vec<Point3> = if normal.dot(&self.direction) > 0.0 {
            self.profile.clone()
        } else {
            self.profile.iter().rev().copied().collect()
        };
        let n = base.len();
        let mut points = base.clone();
        points.extend(base.iter().map(|p| p + self.direction));

        let mut faces = Vec::with_capacity(n + 2);
        faces.push((0..n).rev().collect());
        faces.push((n..2 * n).collect());
        for i in 0..n {
            let j = (i + 1) % n;
            faces.push(vec![i, j, n + j, n + i]);
        }

        let mut op = MakePolyhedron::new(points, faces).with_tag(OperationTag::Prism);
        if let Some(id) = self.operation {
            op = op.with_operation(id);
        }
        op.execute(store, ctx)
    }
}
