use std::collections::{HashMap, HashSet};

use tracing::{debug, instrument};

use super::{EntityKind, Name, NamingRule, OperationId};
use crate::error::{NamingError, Result};
use crate::math::polygon_3d::{polygon_area_3d, polygon_centroid_3d};
use crate::math::{Point3, LINEAR_TOLERANCE};
use crate::topology::{EdgeId, FaceId, ShellId, TopologyStore, VertexId};

/// Geometric fingerprint used to decide whether an element is unchanged
/// from its ancestor.
#[derive(Debug, Clone, PartialEq)]
pub enum Signature {
    Vertex(Point3),
    Edge(Point3, Point3),
    Face { area: f64, centroid: Point3 },
}

impl Signature {
    fn matches(&self, other: &Signature) -> bool {
        let close = |a: &Point3, b: &Point3| (a - b).norm() <= 10.0 * LINEAR_TOLERANCE;
        match (self, other) {
            (Self::Vertex(a), Self::Vertex(b)) => close(a, b),
            (Self::Edge(a0, a1), Self::Edge(b0, b1)) => {
                (close(a0, b0) && close(a1, b1)) || (close(a0, b1) && close(a1, b0))
            }
            (
                Self::Face { area: a, centroid: ca },
                Self::Face { area: b, centroid: cb },
            ) => (a - b).abs() <= 1e-6 * a.abs().max(1.0) && close(ca, cb),
            _ => false,
        }
    }
}

/// Signature of a vertex.
///
/// # Errors
///
/// Returns an error if the vertex is missing.
pub fn vertex_signature(store: &TopologyStore, v: VertexId) -> Result<Signature> {
    Ok(Signature::Vertex(store.vertex(v)?.point))
}

/// Signature of an edge.
///
/// # Errors
///
/// Returns an error if the edge or one of its vertices is missing.
pub fn edge_signature(store: &TopologyStore, e: EdgeId) -> Result<Signature> {
    let seg = store.edge_segment(e)?;
    Ok(Signature::Edge(seg.start, seg.end))
}

/// Signature of a face: net area (holes subtracted) and outer-loop centroid.
///
/// # Errors
///
/// Returns an error if the face or one of its loops is missing.
pub fn face_signature(store: &TopologyStore, f: FaceId) -> Result<Signature> {
    let normal = store.face_normal(f)?;
    let face = store.face(f)?;
    let mut area = 0.0;
    for l in face.loops() {
        area += polygon_area_3d(&store.loop_points(l)?, &normal);
    }
    let outer = store.loop_points(face.outer_loop)?;
    let centroid = polygon_centroid_3d(&outer).unwrap_or_else(Point3::origin);
    Ok(Signature::Face { area, centroid })
}

/// Signatures of the named elements of operand shells, captured before an
/// operation consumes them.
#[derive(Debug, Clone, Default)]
pub struct SourceIndex {
    signatures: HashMap<Name, Signature>,
}

impl SourceIndex {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Indexes every named element of the given shells.
    ///
    /// # Errors
    ///
    /// Returns an error if a shell references missing entities.
    pub fn from_shells(store: &TopologyStore, shells: &[ShellId]) -> Result<Self> {
        let mut index = Self::new();
        for &s in shells {
            index.collect(store, s)?;
        }
        Ok(index)
    }

    /// Adds the named elements of one shell.
    ///
    /// # Errors
    ///
    /// Returns an error if the shell references missing entities.
    pub fn collect(&mut self, store: &TopologyStore, shell: ShellId) -> Result<()> {
        for &f in &store.shell(shell)?.faces {
            if let Some(n) = &store.face(f)?.name {
                self.signatures.insert(n.clone(), face_signature(store, f)?);
            }
        }
        for e in store.shell_edges(shell)? {
            if let Some(n) = &store.edge(e)?.name {
                self.signatures.insert(n.clone(), edge_signature(store, e)?);
            }
        }
        for v in store.shell_vertices(shell)? {
            if let Some(n) = &store.vertex(v)?.name {
                self.signatures.insert(n.clone(), vertex_signature(store, v)?);
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn get(&self, name: &Name) -> Option<&Signature> {
        self.signatures.get(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.signatures.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.signatures.is_empty()
    }
}

struct Minter<'a> {
    operation: OperationId,
    rule: &'a NamingRule,
    next: u32,
    used: HashSet<Name>,
    inherited: usize,
}

impl Minter<'_> {
    fn name_for(
        &mut self,
        kind: EntityKind,
        lineage: &mut Vec<Name>,
        signature: &Signature,
        sources: &SourceIndex,
    ) -> Result<Name> {
        lineage.sort();
        lineage.dedup();

        if let [single] = lineage.as_slice() {
            if !self.used.contains(single)
                && sources.get(single).is_some_and(|s| s.matches(signature))
            {
                self.used.insert(single.clone());
                self.inherited += 1;
                return Ok(single.clone());
            }
        }

        if self.next >= self.rule.indices.end {
            return Err(NamingError::IndexRangeExhausted {
                start: self.rule.indices.start,
                end: self.rule.indices.end,
            }
            .into());
        }
        let name = Name::new(self.operation, self.rule.tag, kind, self.next, lineage.clone());
        self.next += 1;
        self.used.insert(name.clone());
        Ok(name)
    }
}

/// Names every face, edge and vertex of `shell`.
///
/// Elements are visited deterministically: faces in shell order, then
/// edges and vertices in first-encounter order. An element whose lineage
/// is a single ancestor with an unchanged signature keeps that ancestor's
/// name (once per result); every other element gets a fresh name minted
/// from `rule` with its sorted lineage as ancestors.
///
/// # Errors
///
/// Returns an error if the shell references missing entities or the rule's
/// index range runs out.
#[instrument(skip_all, fields(op = %operation, tag = %rule.tag))]
pub fn assign_names(
    store: &mut TopologyStore,
    shell: ShellId,
    operation: OperationId,
    rule: &NamingRule,
    sources: &SourceIndex,
) -> Result<()> {
    let mut minter = Minter {
        operation,
        rule,
        next: rule.indices.start,
        used: HashSet::new(),
        inherited: 0,
    };

    let faces = store.shell(shell)?.faces.clone();
    for f in faces {
        let sig = face_signature(store, f)?;
        let mut lineage = std::mem::take(&mut store.face_mut(f)?.lineage);
        let name = minter.name_for(EntityKind::Face, &mut lineage, &sig, sources)?;
        let face = store.face_mut(f)?;
        face.lineage = lineage;
        face.name = Some(name);
    }

    for e in store.shell_edges(shell)? {
        let sig = edge_signature(store, e)?;
        let mut lineage = std::mem::take(&mut store.edge_mut(e)?.lineage);
        let name = minter.name_for(EntityKind::Edge, &mut lineage, &sig, sources)?;
        let edge = store.edge_mut(e)?;
        edge.lineage = lineage;
        edge.name = Some(name);
    }

    for v in store.shell_vertices(shell)? {
        let sig = vertex_signature(store, v)?;
        let mut lineage = std::mem::take(&mut store.vertex_mut(v)?.lineage);
        let name = minter.name_for(EntityKind::Vertex, &mut lineage, &sig, sources)?;
        let vertex = store.vertex_mut(v)?;
        vertex.lineage = lineage;
        vertex.name = Some(name);
    }

    debug!(
        inherited = minter.inherited,
        minted = minter.next - rule.indices.start,
        "names assigned"
    );
    Ok(())
}

/// Moves every element name of `shell` into its lineage, so that a
/// following [`assign_names`] treats the current names as ancestors.
///
/// # Errors
///
/// Returns an error if the shell references missing entities.
pub fn demote_names(store: &mut TopologyStore, shell: ShellId) -> Result<()> {
    fn demote(name: &mut Option<Name>, lineage: &mut Vec<Name>) {
        if let Some(n) = name.take() {
            *lineage = vec![n];
        }
    }
    for f in store.shell(shell)?.faces.clone() {
        let face = store.face_mut(f)?;
        demote(&mut face.name, &mut face.lineage);
    }
    for e in store.shell_edges(shell)? {
        let edge = store.edge_mut(e)?;
        demote(&mut edge.name, &mut edge.lineage);
    }
    for v in store.shell_vertices(shell)? {
        let vertex = store.vertex_mut(v)?;
        demote(&mut vertex.name, &mut vertex.lineage);
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::naming::{NamingContext, OperationTag};
    use crate::operations::creation::MakeBox;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    #[test]
    fn fresh_shell_gets_minted_names() {
        let mut store = TopologyStore::new();
        let ctx = NamingContext::new();
        let shell = MakeBox::new(p(0.0, 0.0, 0.0), p(1.0, 1.0, 1.0)).execute(&mut store, &ctx).unwrap();

        let faces = &store.shell(shell).unwrap().faces;
        assert_eq!(faces.len(), 6);
        let names: HashSet<Name> = faces
            .iter()
            .map(|f| store.face(*f).unwrap().name.clone().unwrap())
            .collect();
        assert_eq!(names.len(), 6);
        assert!(names.iter().all(|n| n.tag() == OperationTag::Box));
    }

    #[test]
    fn unchanged_element_inherits_ancestor_name() {
        let mut store = TopologyStore::new();
        let ctx = NamingContext::new();
        let shell = MakeBox::new(p(0.0, 0.0, 0.0), p(1.0, 1.0, 1.0)).execute(&mut store, &ctx).unwrap();
        let sources = SourceIndex::from_shells(&store, &[shell]).unwrap();

        // Move each name into the lineage, as an operation copying the shell would.
        let faces = store.shell(shell).unwrap().faces.clone();
        let before: Vec<Name> = faces
            .iter()
            .map(|f| store.face(*f).unwrap().name.clone().unwrap())
            .collect();
        for f in &faces {
            let face = store.face_mut(*f).unwrap();
            face.lineage = face.name.take().into_iter().collect();
        }

        let op = ctx.allocate();
        let rule = NamingRule::new(OperationTag::Union);
        assign_names(&mut store, shell, op, &rule, &sources).unwrap();

        let after: Vec<Name> = faces
            .iter()
            .map(|f| store.face(*f).unwrap().name.clone().unwrap())
            .collect();
        assert_eq!(before, after);
    }

    #[test]
    fn moved_vertex_gets_derived_name() {
        let mut store = TopologyStore::new();
        let ctx = NamingContext::new();
        let shell = MakeBox::new(p(0.0, 0.0, 0.0), p(1.0, 1.0, 1.0)).execute(&mut store, &ctx).unwrap();
        let sources = SourceIndex::from_shells(&store, &[shell]).unwrap();

        let v = store.shell_vertices(shell).unwrap()[0];
        let old = store.vertex(v).unwrap().name.clone().unwrap();
        {
            let vd = store.vertex_mut(v).unwrap();
            vd.lineage = vec![old.clone()];
            vd.name = None;
            vd.point.x += 0.25;
        }

        let op = ctx.allocate();
        assign_names(&mut store, shell, op, &NamingRule::new(OperationTag::Stitch), &sources).unwrap();
        let new = store.vertex(v).unwrap().name.clone().unwrap();
        assert_ne!(new, old);
        assert_eq!(new.ancestors(), &[old]);
        assert_eq!(new.operation(), op);
    }

    #[test]
    fn exhausted_range_is_reported() {
        let mut store = TopologyStore::new();
        let ctx = NamingContext::new();
        let shell = MakeBox::new(p(0.0, 0.0, 0.0), p(1.0, 1.0, 1.0)).execute(&mut store, &ctx).unwrap();
        let rule = NamingRule::new(OperationTag::Union).with_indices(0..3);
        let err = assign_names(&mut store, shell, ctx.allocate(), &rule, &SourceIndex::new());
        assert!(matches!(
            err,
            Err(crate::error::BrepError::Naming(NamingError::IndexRangeExhausted { start: 0, end: 3 }))
        ));
    }
}
