use super::{Point3, Vector3, TOLERANCE};

/// Newell's method: the area-weighted normal of a closed 3D polygon.
///
/// Returns the unit normal, oriented so the polygon winds
/// counter-clockwise seen from its tip, or `None` when the polygon has
/// no area.
#[must_use]
pub fn newell_normal(points: &[Point3]) -> Option<Vector3> {
    let n = area_vector(points);
    let len = n.norm();
    (len > TOLERANCE).then(|| n / len)
}

/// Twice the vector area of a closed polygon.
#[must_use]
pub fn area_vector(points: &[Point3]) -> Vector3 {
    let n = points.len();
    let mut sum = Vector3::zeros();
    if n < 3 {
        return sum;
    }
    for i in 0..n {
        let a = points[i];
        let b = points[(i + 1) % n];
        sum.x += (a.y - b.y) * (a.z + b.z);
        sum.y += (a.z - b.z) * (a.x + b.x);
        sum.z += (a.x - b.x) * (a.y + b.y);
    }
    sum
}

/// Signed area of a planar 3D polygon measured along `normal`.
///
/// Positive when the polygon winds counter-clockwise around `normal`.
#[must_use]
pub fn polygon_area_3d(points: &[Point3], normal: &Vector3) -> f64 {
    0.5 * area_vector(points).dot(normal)
}

/// Area-weighted centroid of a planar 3D polygon.
///
/// Falls back to the vertex average for polygons without area.
#[must_use]
pub fn polygon_centroid_3d(points: &[Point3]) -> Option<Point3> {
    let first = points.first()?;
    let normal = newell_normal(points);
    let mut weighted = Vector3::zeros();
    let mut total = 0.0;
    if let Some(normal) = normal {
        for i in 1..points.len().saturating_sub(1) {
            let a = points[i] - first;
            let b = points[i + 1] - first;
            let w = 0.5 * a.cross(&b).dot(&normal);
            weighted += (a + b) / 3.0 * w;
            total += w;
        }
    }
    if total.abs() > TOLERANCE {
        return Some(first + weighted / total);
    }
    let sum = points.iter().fold(Vector3::zeros(), |acc, p| acc + p.coords);
    #[allow(clippy::cast_precision_loss)]
    Some(Point3::from(sum / points.len() as f64))
}
