pub mod edge;
pub mod face;
pub mod loops;
pub mod mutate;
pub mod shell;
pub mod surface;
pub mod transfer;
pub mod validate;
pub mod vertex;

pub use edge::{EdgeData, EdgeId, EdgeUse};
pub use face::{FaceData, FaceId};
pub use loops::{LoopData, LoopId, OrientedEdge};
pub use shell::{ShellData, ShellId};
pub use surface::{SurfaceData, SurfaceId};
pub use validate::{check_shell, is_manifold_closed, ShellReport};
pub use vertex::{VertexData, VertexId};

use crate::error::TopologyError;
use crate::geometry::{Line, Plane, Segment};
use crate::math::{Point3, Vector3};
use slotmap::SlotMap;

/// Central arena that owns all topological entities.
///
/// Entities reference each other via typed IDs (generational indices),
/// avoiding self-referential structures and enabling safe mutation.
#[derive(Debug, Default, Clone)]
pub struct TopologyStore {
    surfaces: SlotMap<SurfaceId, SurfaceData>,
    vertices: SlotMap<VertexId, VertexData>,
    edges: SlotMap<EdgeId, EdgeData>,
    loops: SlotMap<LoopId, LoopData>,
    faces: SlotMap<FaceId, FaceData>,
    shells: SlotMap<ShellId, ShellData>,
}

impl TopologyStore {
    /// Creates a new, empty topology store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // --- Surface operations ---

    /// Inserts a carrier surface and returns its ID.
    pub fn add_surface(&mut self, data: SurfaceData) -> SurfaceId {
        self.surfaces.insert(data)
    }

    /// Returns a reference to the surface data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the store.
    pub fn surface(&self, id: SurfaceId) -> Result<&SurfaceData, TopologyError> {
        self.surfaces
            .get(id)
            .ok_or_else(|| TopologyError::EntityNotFound("surface".into()))
    }

    /// Iterates over all surfaces.
    pub fn surfaces(&self) -> impl Iterator<Item = (SurfaceId, &SurfaceData)> {
        self.surfaces.iter()
    }

    pub(crate) fn remove_surface(&mut self, id: SurfaceId) -> Option<SurfaceData> {
        self.surfaces.remove(id)
    }

    // --- Vertex operations ---

    /// Inserts a vertex and returns its ID.
    pub fn add_vertex(&mut self, data: VertexData) -> VertexId {
        self.vertices.insert(data)
    }

    /// Returns a reference to the vertex data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the store.
    pub fn vertex(&self, id: VertexId) -> Result<&VertexData, TopologyError> {
        self.vertices
            .get(id)
            .ok_or_else(|| TopologyError::EntityNotFound("vertex".into()))
    }

    /// Returns a mutable reference to the vertex data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the store.
    pub fn vertex_mut(&mut self, id: VertexId) -> Result<&mut VertexData, TopologyError> {
        self.vertices
            .get_mut(id)
            .ok_or_else(|| TopologyError::EntityNotFound("vertex".into()))
    }

    pub(crate) fn remove_vertex(&mut self, id: VertexId) -> Option<VertexData> {
        self.vertices.remove(id)
    }

    // --- Edge operations ---

    /// Inserts an edge and returns its ID.
    pub fn add_edge(&mut self, data: EdgeData) -> EdgeId {
        self.edges.insert(data)
    }

    /// Creates an unused straight edge between two existing vertices.
    ///
    /// # Errors
    ///
    /// Returns an error if a vertex is missing or both vertices coincide.
    pub fn add_line_edge(&mut self, start: VertexId, end: VertexId) -> crate::error::Result<EdgeId> {
        let a = self.vertex(start)?.point;
        let b = self.vertex(end)?.point;
        if start == end {
            return Err(TopologyError::DegenerateLoop("edge from a vertex to itself".into()).into());
        }
        let curve = Line::through(&a, &b)?;
        let t_end = (b - a).norm();
        Ok(self.edges.insert(EdgeData {
            start,
            end,
            curve,
            t_start: 0.0,
            t_end,
            uses: Vec::new(),
            name: None,
            lineage: Vec::new(),
        }))
    }

    /// Returns a reference to the edge data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the store.
    pub fn edge(&self, id: EdgeId) -> Result<&EdgeData, TopologyError> {
        self.edges
            .get(id)
            .ok_or_else(|| TopologyError::EntityNotFound("edge".into()))
    }

    /// Returns a mutable reference to the edge data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the store.
    pub fn edge_mut(&mut self, id: EdgeId) -> Result<&mut EdgeData, TopologyError> {
        self.edges
            .get_mut(id)
            .ok_or_else(|| TopologyError::EntityNotFound("edge".into()))
    }

    pub(crate) fn remove_edge(&mut self, id: EdgeId) -> Option<EdgeData> {
        self.edges.remove(id)
    }

    /// Iterates over all edges.
    pub fn edges(&self) -> impl Iterator<Item = (EdgeId, &EdgeData)> {
        self.edges.iter()
    }

    /// Straight segment spanned by the edge's vertices.
    ///
    /// # Errors
    ///
    /// Returns an error if the edge or one of its vertices is missing.
    pub fn edge_segment(&self, id: EdgeId) -> Result<Segment, TopologyError> {
        let e = self.edge(id)?;
        Ok(Segment::new(self.vertex(e.start)?.point, self.vertex(e.end)?.point))
    }

    /// Rebuilds an edge's carrier line from its current vertex positions.
    ///
    /// # Errors
    ///
    /// Returns an error if the edge is missing or has collapsed to a point.
    pub fn refresh_edge_curve(&mut self, id: EdgeId) -> crate::error::Result<()> {
        let seg = self.edge_segment(id)?;
        let curve = Line::through(&seg.start, &seg.end)?;
        let e = self.edge_mut(id)?;
        e.curve = curve;
        e.t_start = 0.0;
        e.t_end = seg.length();
        Ok(())
    }

    /// Edges that have `v` as an endpoint, in arena order.
    #[must_use]
    pub fn edges_at_vertex(&self, v: VertexId) -> Vec<EdgeId> {
        self.edges
            .iter()
            .filter(|(_, e)| e.start == v || e.end == v)
            .map(|(id, _)| id)
            .collect()
    }

    /// Start and end vertex of an oriented edge, in traversal order.
    ///
    /// # Errors
    ///
    /// Returns an error if the edge is not found.
    pub fn oriented_vertices(&self, oe: OrientedEdge) -> Result<(VertexId, VertexId), TopologyError> {
        let e = self.edge(oe.edge)?;
        Ok(if oe.forward {
            (e.start, e.end)
        } else {
            (e.end, e.start)
        })
    }

    // --- Loop operations ---

    /// Inserts a loop and returns its ID.
    pub fn add_loop(&mut self, data: LoopData) -> LoopId {
        self.loops.insert(data)
    }

    /// Returns a reference to the loop data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the store.
    pub fn loop_(&self, id: LoopId) -> Result<&LoopData, TopologyError> {
        self.loops
            .get(id)
            .ok_or_else(|| TopologyError::EntityNotFound("loop".into()))
    }

    /// Returns a mutable reference to the loop data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the store.
    pub fn loop_mut(&mut self, id: LoopId) -> Result<&mut LoopData, TopologyError> {
        self.loops
            .get_mut(id)
            .ok_or_else(|| TopologyError::EntityNotFound("loop".into()))
    }

    pub(crate) fn remove_loop(&mut self, id: LoopId) -> Option<LoopData> {
        self.loops.remove(id)
    }

    /// Start vertex of every oriented edge of a loop, in loop order.
    ///
    /// # Errors
    ///
    /// Returns an error if the loop or one of its edges is missing.
    pub fn loop_vertices(&self, id: LoopId) -> Result<Vec<VertexId>, TopologyError> {
        self.loop_(id)?
            .edges
            .iter()
            .map(|oe| self.oriented_vertices(*oe).map(|(s, _)| s))
            .collect()
    }

    /// Positions of [`loop_vertices`](Self::loop_vertices).
    ///
    /// # Errors
    ///
    /// Returns an error if the loop or one of its entities is missing.
    pub fn loop_points(&self, id: LoopId) -> Result<Vec<Point3>, TopologyError> {
        self.loop_vertices(id)?
            .into_iter()
            .map(|v| self.vertex(v).map(|d| d.point))
            .collect()
    }

    // --- Face operations ---

    /// Inserts a face and returns its ID.
    pub fn add_face(&mut self, data: FaceData) -> FaceId {
        self.faces.insert(data)
    }

    /// Returns a reference to the face data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the store.
    pub fn face(&self, id: FaceId) -> Result<&FaceData, TopologyError> {
        self.faces
            .get(id)
            .ok_or_else(|| TopologyError::EntityNotFound("face".into()))
    }

    /// Returns a mutable reference to the face data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the store.
    pub fn face_mut(&mut self, id: FaceId) -> Result<&mut FaceData, TopologyError> {
        self.faces
            .get_mut(id)
            .ok_or_else(|| TopologyError::EntityNotFound("face".into()))
    }

    pub(crate) fn remove_face(&mut self, id: FaceId) -> Option<FaceData> {
        self.faces.remove(id)
    }

    /// Carrier plane of a face.
    ///
    /// # Errors
    ///
    /// Returns an error if the face or its surface is missing.
    pub fn face_plane(&self, id: FaceId) -> Result<&Plane, TopologyError> {
        let surface = self.face(id)?.surface;
        Ok(self.surface(surface)?.plane.as_ref())
    }

    /// Outward normal of a face (surface normal flipped when the face runs
    /// against its surface).
    ///
    /// # Errors
    ///
    /// Returns an error if the face or its surface is missing.
    pub fn face_normal(&self, id: FaceId) -> Result<Vector3, TopologyError> {
        let n = *self.face_plane(id)?.plane_normal();
        Ok(if self.face(id)?.same_sense { n } else { -n })
    }

    // --- Shell operations ---

    /// Inserts a shell and returns its ID.
    pub fn add_shell(&mut self, data: ShellData) -> ShellId {
        self.shells.insert(data)
    }

    /// Returns a reference to the shell data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the store.
    pub fn shell(&self, id: ShellId) -> Result<&ShellData, TopologyError> {
        self.shells
            .get(id)
            .ok_or_else(|| TopologyError::EntityNotFound("shell".into()))
    }

    /// Returns a mutable reference to the shell data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the store.
    pub fn shell_mut(&mut self, id: ShellId) -> Result<&mut ShellData, TopologyError> {
        self.shells
            .get_mut(id)
            .ok_or_else(|| TopologyError::EntityNotFound("shell".into()))
    }

    pub(crate) fn remove_shell_record(&mut self, id: ShellId) -> Option<ShellData> {
        self.shells.remove(id)
    }

    /// Returns `true` if the shell handle is live in this store.
    #[must_use]
    pub fn contains_shell(&self, id: ShellId) -> bool {
        self.shells.contains_key(id)
    }

    /// Number of live shells.
    #[must_use]
    pub fn shell_count(&self) -> usize {
        self.shells.len()
    }

    /// Iterates over all shells.
    pub fn shells(&self) -> impl Iterator<Item = (ShellId, &ShellData)> {
        self.shells.iter()
    }

    /// Iterates over all faces.
    pub fn faces(&self) -> impl Iterator<Item = (FaceId, &FaceData)> {
        self.faces.iter()
    }

    /// Edges of a shell in first-encounter order (faces in shell order,
    /// loops outer first, edges in loop order).
    ///
    /// # Errors
    ///
    /// Returns an error if any referenced entity is missing.
    pub fn shell_edges(&self, id: ShellId) -> Result<Vec<EdgeId>, TopologyError> {
        let mut seen = std::collections::HashSet::new();
        let mut out = Vec::new();
        for &f in &self.shell(id)?.faces {
            for l in self.face(f)?.loops() {
                for oe in &self.loop_(l)?.edges {
                    if seen.insert(oe.edge) {
                        out.push(oe.edge);
                    }
                }
            }
        }
        Ok(out)
    }

    /// Vertices of a shell in first-encounter order.
    ///
    /// # Errors
    ///
    /// Returns an error if any referenced entity is missing.
    pub fn shell_vertices(&self, id: ShellId) -> Result<Vec<VertexId>, TopologyError> {
        let mut seen = std::collections::HashSet::new();
        let mut out = Vec::new();
        for &f in &self.shell(id)?.faces {
            for l in self.face(f)?.loops() {
                for v in self.loop_vertices(l)? {
                    if seen.insert(v) {
                        out.push(v);
                    }
                }
            }
        }
        Ok(out)
    }

    /// Axis-aligned bounds of a face's outer loop.
    ///
    /// # Errors
    ///
    /// Returns an error if the face or its loop is missing.
    pub fn face_bounds(&self, id: FaceId) -> Result<crate::math::Aabb, TopologyError> {
        let pts = self.loop_points(self.face(id)?.outer_loop)?;
        Ok(crate::math::Aabb::from_points(&pts))
    }
}
