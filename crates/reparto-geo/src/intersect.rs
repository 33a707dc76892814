//! Overlap detection between zone polygons.
//!
//! This is not a full polygon-intersection algorithm. It answers "do these
//! two drawings obviously conflict?" for the zone editor:
//!
//! 1. any edge of A crosses or touches any edge of B, else
//! 2. A's first vertex is inside B, or B's first vertex is inside A.
//!
//! The order matters: edge touching is decided by step 1 with [`EPSILON`]
//! tolerance before ray casting gets a say.
//!
//! Every edge pair is scanned. The collinearity tolerance is absolute on the
//! cross product, so nearly collinear edges can "touch" even when their
//! bounding boxes are apart; a box pre-check would change those answers.

use crate::geometry::{EPSILON, GeoPoint, open_ring};

// ============================================================================
// POINT IN POLYGON (Ray Casting Algorithm)
// ============================================================================

/// Test if a point lies inside a ring using ray casting.
///
/// Casts a ray towards +longitude and counts edge crossings.
/// Odd crossings = inside, even = outside. Works on open or closed rings
/// (the closing edge of a closed ring is zero-length and never crosses).
#[inline]
pub fn point_in_ring(point: GeoPoint, ring: &[GeoPoint]) -> bool {
    let n = ring.len();
    if n < 3 {
        return false;
    }

    let (px, py) = (point.x(), point.y());
    let mut inside = false;
    let mut j = n - 1;

    for i in 0..n {
        let (xi, yi) = (ring[i].x(), ring[i].y());
        let (xj, yj) = (ring[j].x(), ring[j].y());

        if (yi > py) != (yj > py) {
            let dy = yj - yi;
            let dy = if dy.abs() < EPSILON { EPSILON } else { dy };
            if px < (xj - xi) * (py - yi) / dy + xi {
                inside = !inside;
            }
        }

        j = i;
    }

    inside
}

// ============================================================================
// SEGMENT INTERSECTION (orientation test)
// ============================================================================

/// Turn direction of the triple `(p, q, r)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Orientation {
    Collinear,
    Clockwise,
    CounterClockwise,
}

fn orientation(p: GeoPoint, q: GeoPoint, r: GeoPoint) -> Orientation {
    let val = (q.y() - p.y()) * (r.x() - q.x()) - (q.x() - p.x()) * (r.y() - q.y());
    if val.abs() < EPSILON {
        Orientation::Collinear
    } else if val > 0.0 {
        Orientation::Clockwise
    } else {
        Orientation::CounterClockwise
    }
}

/// Given collinear `p`, `q`, `r`: does `q` lie on segment `pr`?
fn on_segment(p: GeoPoint, q: GeoPoint, r: GeoPoint) -> bool {
    q.x() <= p.x().max(r.x()) + EPSILON
        && q.x() + EPSILON >= p.x().min(r.x())
        && q.y() <= p.y().max(r.y()) + EPSILON
        && q.y() + EPSILON >= p.y().min(r.y())
}

/// Whether segment `p1-p2` and segment `q1-q2` intersect or touch.
pub fn segments_intersect(p1: GeoPoint, p2: GeoPoint, q1: GeoPoint, q2: GeoPoint) -> bool {
    let o1 = orientation(p1, p2, q1);
    let o2 = orientation(p1, p2, q2);
    let o3 = orientation(q1, q2, p1);
    let o4 = orientation(q1, q2, p2);

    // General case: each segment straddles the other's line.
    if o1 != o2 && o3 != o4 {
        return true;
    }

    // Collinear / touching cases.
    (o1 == Orientation::Collinear && on_segment(p1, q1, p2))
        || (o2 == Orientation::Collinear && on_segment(p1, q2, p2))
        || (o3 == Orientation::Collinear && on_segment(q1, p1, q2))
        || (o4 == Orientation::Collinear && on_segment(q1, p2, q2))
}

/// Iterate the edges of an open ring, including the closing edge.
fn edges(ring: &[GeoPoint]) -> impl Iterator<Item = (GeoPoint, GeoPoint)> + '_ {
    let n = ring.len();
    (0..n).map(move |i| (ring[i], ring[(i + 1) % n]))
}

// ============================================================================
// POLYGON OVERLAP
// ============================================================================

/// Whether two zone rings overlap (see the module docs for the exact rule).
///
/// Rings may be open or closed. Fewer than 3 points on either side is never
/// an overlap.
///
/// Containment is only checked through each ring's first vertex. Once no
/// edges touch, that single vertex decides whether one ring is nested in
/// the other.
pub fn polygons_overlap(a: &[GeoPoint], b: &[GeoPoint]) -> bool {
    let a = open_ring(a);
    let b = open_ring(b);
    if a.len() < 3 || b.len() < 3 {
        return false;
    }

    // ## Rust Lesson #3: Nested iterator adaptors
    //
    // `any` short-circuits, so the nested scan stops at the first crossing
    // without any manual `break` bookkeeping.
    let edges_cross = edges(&a).any(|(a1, a2)| {
        edges(&b).any(|(b1, b2)| segments_intersect(a1, a2, b1, b2))
    });
    if edges_cross {
        return true;
    }

    point_in_ring(a[0], &b) || point_in_ring(b[0], &a)
}

/// Every overlapping pair `(i, j)` with `i < j`.
pub fn find_overlaps<R: AsRef<[GeoPoint]>>(zones: &[R]) -> Vec<(usize, usize)> {
    let mut pairs = Vec::new();
    for i in 0..zones.len() {
        for j in (i + 1)..zones.len() {
            if polygons_overlap(zones[i].as_ref(), zones[j].as_ref()) {
                pairs.push((i, j));
            }
        }
    }
    pairs
}

/// Index of the first zone whose ring contains `point`.
pub fn zone_containing<R: AsRef<[GeoPoint]>>(point: GeoPoint, zones: &[R]) -> Option<usize> {
    zones
        .iter()
        .position(|zone| point_in_ring(point, &open_ring(zone.as_ref())))
}

// ============================================================================
// TESTS
// ============================================================================
