use super::{Point2, Vector2, TOLERANCE};

/// 2D cross product `a.x * b.y - a.y * b.x`.
#[inline]
#[must_use]
pub fn cross_2d(a: &Vector2, b: &Vector2) -> f64 {
    a.x * b.y - a.y * b.x
}

/// Parametric 2D line-line intersection.
///
/// Given lines `p1 + t * d1` and `p2 + u * d2`, returns `(t, u)` if not parallel.
#[must_use]
pub fn line_line_intersect_2d(
    p1: &Point2,
    d1: &Vector2,
    p2: &Point2,
    d2: &Vector2,
) -> Option<(f64, f64)> {
    let cross = cross_2d(d1, d2);
    if cross.abs() < TOLERANCE {
        return None;
    }
    let diff = p2 - p1;
    Some((cross_2d(&diff, d2) / cross, cross_2d(&diff, d1) / cross))
}

/// Result of intersecting two bounded 2D segments.
#[derive(Debug, Clone, PartialEq)]
pub enum SegmentIntersection2d {
    /// The segments do not touch.
    None,
    /// Single contact point with parameters `t` on the first and `u` on
    /// the second segment, both in `[0, 1]`.
    Point { point: Point2, t: f64, u: f64 },
    /// Collinear overlap. Each pair is `(t, u)` at an end of the shared
    /// stretch.
    Overlap { start: (f64, f64), end: (f64, f64) },
}

/// Bounded segment-segment intersection in 2D.
///
/// `tol` is a distance: endpoints closer than `tol` to the other segment
/// count as touching, and nearly collinear segments within `tol` of each
/// other report their overlap.
#[must_use]
pub fn segment_segment_intersect_2d(
    a0: &Point2,
    a1: &Point2,
    b0: &Point2,
    b1: &Point2,
    tol: f64,
) -> SegmentIntersection2d {
    let da = a1 - a0;
    let db = b1 - b0;
    let len_a = da.norm();
    let len_b = db.norm();
    if len_a < TOLERANCE || len_b < TOLERANCE {
        return SegmentIntersection2d::None;
    }

    let sin = cross_2d(&da, &db) / (len_a * len_b);
    let dist_b0 = cross_2d(&da, &(b0 - a0)).abs() / len_a;
    let dist_b1 = cross_2d(&da, &(b1 - a0)).abs() / len_a;

    if sin.abs() * len_b.min(len_a) < tol && dist_b0 < tol && dist_b1 < tol {
        return collinear_overlap(a0, &da, b0, &db, tol);
    }

    let Some((t, u)) = line_line_intersect_2d(a0, &da, b0, &db) else {
        return SegmentIntersection2d::None;
    };
    let eps_a = tol / len_a;
    let eps_b = tol / len_b;
    if t < -eps_a || t > 1.0 + eps_a || u < -eps_b || u > 1.0 + eps_b {
        return SegmentIntersection2d::None;
    }
    let t = t.clamp(0.0, 1.0);
    SegmentIntersection2d::Point {
        point: a0 + da * t,
        t,
        u: u.clamp(0.0, 1.0),
    }
}

fn collinear_overlap(
    a0: &Point2,
    da: &Vector2,
    b0: &Point2,
    db: &Vector2,
    tol: f64,
) -> SegmentIntersection2d {
    let len_sq_a = da.norm_squared();
    let len_sq_b = db.norm_squared();
    let to_a = |p: &Point2| (p - a0).dot(da) / len_sq_a;
    let to_b = |p: &Point2| (p - b0).dot(db) / len_sq_b;

    let tb0 = to_a(b0);
    let tb1 = to_a(&(b0 + db));
    let lo = tb0.min(tb1).max(0.0);
    let hi = tb0.max(tb1).min(1.0);
    let eps = tol / len_sq_a.sqrt();
    if hi < lo - eps {
        return SegmentIntersection2d::None;
    }
    let at = |t: f64| {
        let t = t.clamp(0.0, 1.0);
        (t, to_b(&(a0 + da * t)).clamp(0.0, 1.0))
    };
    if hi - lo <= eps {
        let (t, u) = at((lo + hi) * 0.5);
        return SegmentIntersection2d::Point {
            point: a0 + da * t,
            t,
            u,
        };
    }
    SegmentIntersection2d::Overlap {
        start: at(lo),
        end: at(hi),
    }
}
