use std::collections::{HashMap, HashSet};

use crate::error::Result;
use crate::math::{Point3, TOLERANCE};
use crate::topology::{EdgeId, TopologyStore, VertexId};

/// Uniform grid over point indices for neighbourhood queries.
#[derive(Debug)]
pub(crate) struct PointGrid {
    cell: f64,
    cells: HashMap<(i64, i64, i64), Vec<usize>>,
}

impl PointGrid {
    pub(crate) fn new(cell: f64) -> Self {
        Self {
            cell: cell.max(TOLERANCE),
            cells: HashMap::new(),
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    fn key(&self, p: &Point3) -> (i64, i64, i64) {
        let inv = 1.0 / self.cell;
        (
            (p.x * inv).floor() as i64,
            (p.y * inv).floor() as i64,
            (p.z * inv).floor() as i64,
        )
    }

    pub(crate) fn insert(&mut self, index: usize, p: &Point3) {
        let key = self.key(p);
        self.cells.entry(key).or_default().push(index);
    }

    /// Indices stored in the 3x3x3 block of cells around `p`. Every point
    /// closer than one cell size to `p` is included.
    pub(crate) fn near(&self, p: &Point3) -> Vec<usize> {
        let key = self.key(p);
        let mut out = Vec::new();
        for dx in -1..=1 {
            for dy in -1..=1 {
                for dz in -1..=1 {
                    if let Some(bucket) = self.cells.get(&(key.0 + dx, key.1 + dy, key.2 + dz)) {
                        out.extend_from_slice(bucket);
                    }
                }
            }
        }
        out
    }
}

/// Incident edges per vertex, built in one pass over `edges`.
pub(crate) fn incidence(
    store: &TopologyStore,
    edges: &[EdgeId],
) -> Result<HashMap<VertexId, Vec<EdgeId>>> {
    let mut map: HashMap<VertexId, Vec<EdgeId>> = HashMap::new();
    for &e in edges {
        let ed = store.edge(e)?;
        map.entry(ed.start).or_default().push(e);
        if ed.end != ed.start {
            map.entry(ed.end).or_default().push(e);
        }
    }
    Ok(map)
}

/// Matching radius of every vertex.
///
/// A bubble is capped by `precision`, by half the vertex's shortest
/// incident edge, and by half the distance to the nearest vertex of the
/// same input shell it has no edge to. Bubbles of one input therefore
/// never swallow that input's own features.
///
/// `group[i]` is the input shell `vertices[i]` came from.
pub(crate) fn bubbles(
    store: &TopologyStore,
    vertices: &[VertexId],
    group: &[usize],
    edges: &[EdgeId],
    precision: f64,
) -> Result<Vec<f64>> {
    let incident = incidence(store, edges)?;
    let points: Vec<Point3> = vertices
        .iter()
        .map(|v| store.vertex(*v).map(|d| d.point))
        .collect::<std::result::Result<_, _>>()?;

    let mut grid = PointGrid::new(2.0 * precision);
    for (i, p) in points.iter().enumerate() {
        grid.insert(i, p);
    }

    let mut radii = Vec::with_capacity(vertices.len());
    for (i, &v) in vertices.iter().enumerate() {
        let mut r = precision;
        let mut adjacent: HashSet<VertexId> = HashSet::new();
        for &e in incident.get(&v).map_or(&[][..], Vec::as_slice) {
            let ed = store.edge(e)?;
            adjacent.insert(ed.other_vertex(v));
            r = r.min(0.5 * store.edge_segment(e)?.length());
        }
        for j in grid.near(&points[i]) {
            if j == i || group[j] != group[i] || adjacent.contains(&vertices[j]) {
                continue;
            }
            r = r.min(0.5 * (points[i] - points[j]).norm());
        }
        radii.push(r);
    }
    Ok(radii)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::topology::VertexData;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    #[test]
    fn grid_finds_neighbours_across_cells() {
        let mut grid = PointGrid::new(1.0);
        grid.insert(0, &p(0.95, 0.0, 0.0));
        grid.insert(1, &p(1.05, 0.0, 0.0));
        grid.insert(2, &p(5.0, 0.0, 0.0));
        let near = grid.near(&p(0.95, 0.0, 0.0));
        assert!(near.contains(&1));
        assert!(!near.contains(&2));
    }

    #[test]
    fn short_edge_shrinks_bubble() {
        let mut store = TopologyStore::new();
        let a = store.add_vertex(VertexData::new(p(0.0, 0.0, 0.0)));
        let b = store.add_vertex(VertexData::new(p(0.01, 0.0, 0.0)));
        let c = store.add_vertex(VertexData::new(p(5.0, 0.0, 0.0)));
        let e = store.add_line_edge(a, b).unwrap();
        let radii = bubbles(&store, &[a, b, c], &[0, 0, 0], &[e], 0.1).unwrap();
        assert!((radii[0] - 0.005).abs() < 1e-12);
        assert!((radii[2] - 0.1).abs() < 1e-12);
    }

    #[test]
    fn nearby_vertex_of_same_input_shrinks_bubble() {
        let mut store = TopologyStore::new();
        let a = store.add_vertex(VertexData::new(p(0.0, 0.0, 0.0)));
        let b = store.add_vertex(VertexData::new(p(0.04, 0.0, 0.0)));
        let same = bubbles(&store, &[a, b], &[0, 0], &[], 0.1).unwrap();
        assert!((same[0] - 0.02).abs() < 1e-12);
        let other = bubbles(&store, &[a, b], &[0, 1], &[], 0.1).unwrap();
        assert!((other[0] - 0.1).abs() < 1e-12);
    }
}
