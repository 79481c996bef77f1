use crate::error::{OperationError, Result};
use crate::math::Aabb;
use crate::topology::{ShellId, TopologyStore};

/// Computes the axis-aligned bounding box of a shell.
pub struct BoundingBox {
    shell: ShellId,
}

impl BoundingBox {
    /// Creates a new `BoundingBox` query.
    #[must_use]
    pub fn new(shell: ShellId) -> Self {
        Self { shell }
    }

    /// Executes the query, returning the box around every shell vertex.
    ///
    /// # Errors
    ///
    /// Returns an error if the shell is missing or has no vertices.
    pub fn execute(&self, store: &TopologyStore) -> Result<Aabb> {
        let mut aabb = Aabb::empty();
        for v in store.shell_vertices(self.shell)? {
            aabb.include(&store.vertex(v)?.point);
        }
        if aabb.is_empty() {
            return Err(OperationError::InvalidInput("shell has no vertices".into()).into());
        }
        Ok(aabb)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::Point3;
    use crate::naming::NamingContext;
    use crate::operations::MakeBox;

    #[test]
    fn box_bounds_match_corners() {
        let mut store = TopologyStore::new();
        let shell = MakeBox::new(Point3::new(-1.0, 0.0, 2.0), Point3::new(1.0, 3.0, 4.0))
            .execute(&mut store, &NamingContext::new())
            .unwrap();
        let aabb = BoundingBox::new(shell).execute(&store).unwrap();
        assert_eq!(aabb.min, Point3::new(-1.0, 0.0, 2.0));
        assert_eq!(aabb.max, Point3::new(1.0, 3.0, 4.0));
    }
}
