use super::{Point2, TOLERANCE};

/// Computes the signed area of a closed polygon (shoelace formula).
///
/// Positive for counter-clockwise, negative for clockwise.
#[must_use]
pub fn signed_area(points: &[Point2]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..n {
        let j = (i + 1) % n;
        sum += points[i].x * points[j].y - points[j].x * points[i].y;
    }
    sum * 0.5
}

/// Distance from `p` to the segment `a..b`.
#[must_use]
pub fn point_segment_distance(p: &Point2, a: &Point2, b: &Point2) -> f64 {
    let d = b - a;
    let len_sq = d.norm_squared();
    if len_sq < TOLERANCE * TOLERANCE {
        return (p - a).norm();
    }
    let t = ((p - a).dot(&d) / len_sq).clamp(0.0, 1.0);
    (p - (a + d * t)).norm()
}

/// Location of a point with respect to a planar region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointLocation {
    Inside,
    Outside,
    OnBoundary,
}

/// Winding number of `p` with respect to the closed polygon `ring`.
///
/// Non-zero means inside.
#[must_use]
pub fn winding_number(p: &Point2, ring: &[Point2]) -> i32 {
    let n = ring.len();
    let mut winding = 0i32;
    for i in 0..n {
        let a = ring[i];
        let b = ring[(i + 1) % n];
        let side = (b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x);
        if a.y <= p.y {
            if b.y > p.y && side > 0.0 {
                winding += 1;
            }
        } else if b.y <= p.y && side < 0.0 {
            winding -= 1;
        }
    }
    winding
}

fn on_ring(p: &Point2, ring: &[Point2], tol: f64) -> bool {
    let n = ring.len();
    (0..n).any(|i| point_segment_distance(p, &ring[i], &ring[(i + 1) % n]) <= tol)
}

/// Locates `p` within the region bounded by `outer` minus `holes`.
///
/// Points within `tol` of any ring are [`PointLocation::OnBoundary`].
#[must_use]
pub fn locate_point(p: &Point2, outer: &[Point2], holes: &[Vec<Point2>], tol: f64) -> PointLocation {
    if on_ring(p, outer, tol) || holes.iter().any(|h| on_ring(p, h, tol)) {
        return PointLocation::OnBoundary;
    }
    if winding_number(p, outer) == 0 {
        return PointLocation::Outside;
    }
    if holes.iter().any(|h| winding_number(p, h) != 0) {
        return PointLocation::Outside;
    }
    PointLocation::Inside
}

/// Finds a point strictly inside the region `outer` minus `holes`.
///
/// Casts horizontal scanlines through the region and returns the middle
/// of the widest interior interval found. Returns `None` for regions
/// without interior.
#[must_use]
pub fn interior_point(outer: &[Point2], holes: &[Vec<Point2>]) -> Option<Point2> {
    if outer.len() < 3 {
        return None;
    }
    let (min_y, max_y) = outer
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
            (lo.min(p.y), hi.max(p.y))
        });
    if max_y - min_y < TOLERANCE {
        return None;
    }

    let rings: Vec<&[Point2]> = std::iter::once(outer)
        .chain(holes.iter().map(Vec::as_slice))
        .collect();

    // Scanlines at irrational-ish fractions avoid passing through vertices
    // of axis-aligned input.
    const FRACTIONS: [f64; 5] = [0.5, 0.381_966, 0.618_034, 0.236_068, 0.763_932];
    let mut best: Option<(f64, Point2)> = None;
    for f in FRACTIONS {
        let y = min_y + (max_y - min_y) * f;
        let mut xs = Vec::new();
        for ring in &rings {
            let n = ring.len();
            for i in 0..n {
                let a = ring[i];
                let b = ring[(i + 1) % n];
                if (a.y <= y) != (b.y <= y) {
                    xs.push(a.x + (y - a.y) * (b.x - a.x) / (b.y - a.y));
                }
            }
        }
        xs.sort_by(f64::total_cmp);
        for pair in xs.chunks_exact(2) {
            let width = pair[1] - pair[0];
            if best.as_ref().is_none_or(|(w, _)| width > *w) {
                best = Some((width, Point2::new((pair[0] + pair[1]) * 0.5, y)));
            }
        }
    }
    best.filter(|(w, _)| *w > TOLERANCE).map(|(_, p)| p)
}

/// Clips the segment `a..b` against the region `outer` minus `holes`.
///
/// Returns `(t_start, t_end)` intervals of the segment parameter that lie
/// inside the region or on its boundary. Contiguous intervals are merged.
#[must_use]
pub fn clip_segment_to_region(
    a: &Point2,
    b: &Point2,
    outer: &[Point2],
    holes: &[Vec<Point2>],
    tol: f64,
) -> Vec<(f64, f64)> {
    use super::intersect_2d::{segment_segment_intersect_2d, SegmentIntersection2d};

    let mut ts = vec![0.0, 1.0];
    let rings = std::iter::once(outer).chain(holes.iter().map(Vec::as_slice));
    for ring in rings {
        let n = ring.len();
        for i in 0..n {
            match segment_segment_intersect_2d(a, b, &ring[i], &ring[(i + 1) % n], tol) {
                SegmentIntersection2d::None => {}
                SegmentIntersection2d::Point { t, .. } => ts.push(t),
                SegmentIntersection2d::Overlap { start, end } => {
                    ts.push(start.0);
                    ts.push(end.0);
                }
            }
        }
    }
    ts.sort_by(f64::total_cmp);
    ts.dedup_by(|x, y| (*x - *y).abs() < TOLERANCE);

    let mut result: Vec<(f64, f64)> = Vec::new();
    for w in ts.windows(2) {
        let (t0, t1) = (w[0], w[1]);
        let mid = a + (b - a) * ((t0 + t1) * 0.5);
        if locate_point(&mid, outer, holes, tol) == PointLocation::Outside {
            continue;
        }
        match result.last_mut() {
            Some(last) if (last.1 - t0).abs() < TOLERANCE => last.1 = t1,
            _ => result.push((t0, t1)),
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: f64, y: f64) -> Point2 {
        Point2::new(x, y)
    }

    fn square(lo: f64, hi: f64) -> Vec<Point2> {
        vec![p(lo, lo), p(hi, lo), p(hi, hi), p(lo, hi)]
    }

    #[test]
    fn area_sign_follows_winding() {
        let ccw = square(0.0, 2.0);
        assert!((signed_area(&ccw) - 4.0).abs() < 1e-12);
        let cw: Vec<Point2> = ccw.into_iter().rev().collect();
        assert!((signed_area(&cw) + 4.0).abs() < 1e-12);
    }

    #[test]
    fn hole_excludes_points() {
        let outer = square(0.0, 4.0);
        let hole: Vec<Point2> = square(1.0, 3.0).into_iter().rev().collect();
        let holes = vec![hole];
        assert_eq!(locate_point(&p(2.0, 2.0), &outer, &holes, 1e-9), PointLocation::Outside);
        assert_eq!(locate_point(&p(0.5, 2.0), &outer, &holes, 1e-9), PointLocation::Inside);
        assert_eq!(locate_point(&p(1.0, 2.0), &outer, &holes, 1e-9), PointLocation::OnBoundary);
    }

    #[test]
    fn interior_point_avoids_hole() {
        let outer = square(0.0, 4.0);
        let hole: Vec<Point2> = square(0.5, 3.5).into_iter().rev().collect();
        let holes = vec![hole];
        let q = interior_point(&outer, &holes).unwrap_or_else(|| panic!("region has interior"));
        assert_eq!(locate_point(&q, &outer, &holes, 1e-9), PointLocation::Inside);
    }

    #[test]
    fn interior_point_of_l_shape() {
        let l = vec![p(0.0, 0.0), p(3.0, 0.0), p(3.0, 1.0), p(1.0, 1.0), p(1.0, 3.0), p(0.0, 3.0)];
        let q = interior_point(&l, &[]).unwrap_or_else(|| panic!("region has interior"));
        assert_eq!(locate_point(&q, &l, &[], 1e-9), PointLocation::Inside);
    }

    #[test]
    fn segment_is_clipped_to_square() {
        let sq = square(0.0, 1.0);
        let spans = clip_segment_to_region(&p(-1.0, 0.5), &p(2.0, 0.5), &sq, &[], 1e-9);
        assert_eq!(spans.len(), 1);
        assert!((spans[0].0 - 1.0 / 3.0).abs() < 1e-9);
        assert!((spans[0].1 - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn boundary_segment_is_kept() {
        let sq = square(0.0, 1.0);
        let spans = clip_segment_to_region(&p(0.5, 0.0), &p(2.0, 0.0), &sq, &[], 1e-9);
        assert_eq!(spans.len(), 1);
        assert!((spans[0].1 - 1.0 / 3.0).abs() < 1e-9);
    }
}
