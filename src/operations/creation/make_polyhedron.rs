use std::collections::HashMap;

use tracing::{debug, instrument};

use crate::error::{OperationError, Result};
use crate::geometry::Plane;
use crate::math::{Aabb, Point3, LINEAR_TOLERANCE, TOLERANCE};
use crate::naming::{assign_names, NamingContext, NamingRule, OperationId, OperationTag, SourceIndex};
use crate::topology::mutate::make_face;
use crate::topology::transfer::import_shell;
use crate::topology::{
    EdgeId, OrientedEdge, ShellData, ShellId, SurfaceData, TopologyStore, VertexData, VertexId,
};

/// Creates a shell from planar polygonal faces given as vertex index
/// cycles.
///
/// Each cycle must wind counter-clockwise when seen from the side its
/// face should point to. Sides shared by two cycles become one edge, so a
/// consistently wound closed polyhedron yields a closed shell. Open face
/// sets are allowed and produce open shells.
#[derive(Debug, Clone)]
pub struct MakePolyhedron {
    points: Vec<Point3>,
    faces: Vec<Vec<usize>>,
    tag: OperationTag,
    operation: Option<OperationId>,
}

impl MakePolyhedron {
    /// Creates a new `MakePolyhedron` operation from points and index cycles.
    #[must_use]
    pub fn new(points: Vec<Point3>, faces: Vec<Vec<usize>>) -> Self {
        Self {
            points,
            faces,
            tag: OperationTag::Polyhedron,
            operation: None,
        }
    }

    /// Uses a fixed operation identity instead of allocating one, so that
    /// names are reproduced on regeneration.
    #[must_use]
    pub fn with_operation(mut self, operation: OperationId) -> Self {
        self.operation = Some(operation);
        self
    }

    pub(crate) fn with_tag(mut self, tag: OperationTag) -> Self {
        self.tag = tag;
        self
    }

    fn validate(&self) -> Result<Vec<Plane>> {
        let invalid = |msg: String| -> crate::error::BrepError { OperationError::InvalidInput(msg).into() };
        if self.faces.is_empty() {
            return Err(invalid("no faces".into()));
        }
        if self.points.iter().any(|p| p.iter().any(|c| !c.is_finite())) {
            return Err(invalid("non-finite point".into()));
        }
        let scale = Aabb::from_points(&self.points).diagonal().max(1.0);
        let planarity = LINEAR_TOLERANCE * scale;

        let mut side_uses: HashMap<(usize, usize), usize> = HashMap::new();
        let mut planes = Vec::with_capacity(self.faces.len());
        for (fi, cycle) in self.faces.iter().enumerate() {
            if cycle.len() < 3 {
                return Err(invalid(format!("face {fi} has {} vertices", cycle.len())));
            }
            let mut pts = Vec::with_capacity(cycle.len());
            for (i, &idx) in cycle.iter().enumerate() {
                let next = cycle[(i + 1) % cycle.len()];
                let (Some(a), Some(b)) = (self.points.get(idx), self.points.get(next)) else {
                    return Err(invalid(format!("face {fi} references a missing point")));
                };
                if idx == next || (a - b).norm() < TOLERANCE {
                    return Err(invalid(format!("face {fi} has a zero-length side")));
                }
                *side_uses.entry((idx.min(next), idx.max(next))).or_default() += 1;
                pts.push(*a);
            }
            let plane = Plane::from_polygon(&pts)?;
            if pts.iter().any(|p| plane.signed_distance(p).abs() > planarity) {
                return Err(invalid(format!("face {fi} is not planar")));
            }
            planes.push(plane);
        }
        if let Some(((a, b), n)) = side_uses.iter().find(|(_, &n)| n > 2) {
            return Err(invalid(format!("side {a}-{b} is shared by {n} faces")));
        }
        Ok(planes)
    }

    /// Builds the shell and names its elements.
    ///
    /// # Errors
    ///
    /// Returns [`OperationError::InvalidInput`] for out-of-range indices,
    /// short or non-planar cycles and sides shared by more than two faces.
    #[instrument(skip_all, fields(faces = self.faces.len(), tag = %self.tag))]
    pub fn execute(&self, store: &mut TopologyStore, ctx: &NamingContext) -> Result<ShellId> {
        let planes = self.validate()?;

        let mut scratch = TopologyStore::new();
        let vertices: Vec<VertexId> = self
            .points
            .iter()
            .map(|p| scratch.add_vertex(VertexData::new(*p)))
            .collect();

        let mut edges: HashMap<(usize, usize), EdgeId> = HashMap::new();
        let mut faces = Vec::with_capacity(self.faces.len());
        for (cycle, plane) in self.faces.iter().zip(planes) {
            let surface = scratch.add_surface(SurfaceData::new(plane));
            let mut l = Vec::with_capacity(cycle.len());
            for (i, &a) in cycle.iter().enumerate() {
                let b = cycle[(i + 1) % cycle.len()];
                let key = (a.min(b), a.max(b));
                let e = match edges.get(&key) {
                    Some(&e) => e,
                    None => {
                        let e = scratch.add_line_edge(vertices[key.0], vertices[key.1])?;
                        edges.insert(key, e);
                        e
                    }
                };
                l.push(OrientedEdge::new(e, a == key.0));
            }
            faces.push(make_face(&mut scratch, surface, true, vec![l])?);
        }
        let shell = scratch.add_shell(ShellData { faces });

        let operation = self.operation.unwrap_or_else(|| ctx.allocate());
        assign_names(
            &mut scratch,
            shell,
            operation,
            &NamingRule::new(self.tag),
            &SourceIndex::new(),
        )?;
        let id = import_shell(store, &scratch, shell)?;
        debug!(edges = edges.len(), "polyhedron built");
        Ok(id)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::topology::check_shell;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    fn tetra() -> MakePolyhedron {
        MakePolyhedron::new(
            vec![p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0), p(0.0, 1.0, 0.0), p(0.0, 0.0, 1.0)],
            vec![vec![0, 2, 1], vec![0, 1, 3], vec![1, 2, 3], vec![0, 3, 2]],
        )
    }

    #[test]
    fn tetrahedron_is_closed() {
        let mut store = TopologyStore::new();
        let shell = tetra().execute(&mut store, &NamingContext::new()).unwrap();
        let report = check_shell(&store, shell).unwrap();
        assert!(report.is_manifold_closed());
        assert_eq!((report.vertex_count, report.edge_count, report.face_count), (4, 6, 4));
    }

    #[test]
    fn single_face_makes_open_shell() {
        let mut store = TopologyStore::new();
        let shell = MakePolyhedron::new(
            vec![p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0), p(1.0, 1.0, 0.0)],
            vec![vec![0, 1, 2]],
        )
        .execute(&mut store, &NamingContext::new())
        .unwrap();
        assert_eq!(check_shell(&store, shell).unwrap().boundary_edges.len(), 3);
    }

    #[test]
    fn non_planar_face_is_rejected() {
        let mut store = TopologyStore::new();
        let result = MakePolyhedron::new(
            vec![p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0), p(1.0, 1.0, 0.5), p(0.0, 1.0, 0.0)],
            vec![vec![0, 1, 2, 3]],
        )
        .execute(&mut store, &NamingContext::new());
        assert!(result.is_err());
        assert_eq!(store.shell_count(), 0);
    }

    #[test]
    fn bad_index_is_rejected() {
        let mut store = TopologyStore::new();
        let result = MakePolyhedron::new(vec![p(0.0, 0.0, 0.0)], vec![vec![0, 1, 2]])
            .execute(&mut store, &NamingContext::new());
        assert!(result.is_err());
    }

    #[test]
    fn fixed_operation_reproduces_names() {
        let ctx = NamingContext::new();
        let op = ctx.allocate();
        let mut s1 = TopologyStore::new();
        let mut s2 = TopologyStore::new();
        let a = tetra().with_operation(op).execute(&mut s1, &ctx).unwrap();
        let b = tetra().with_operation(op).execute(&mut s2, &ctx).unwrap();
        let names = |s: &TopologyStore, id| -> Vec<_> {
            s.shell(id)
                .unwrap()
                .faces
                .iter()
                .map(|f| s.face(*f).unwrap().name.clone())
                .collect()
        };
        assert_eq!(names(&s1, a), names(&s2, b));
    }
}
