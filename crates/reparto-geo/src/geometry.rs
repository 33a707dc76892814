//! Core geometry types: geographic points and polygon rings.
//!
//! ## Rust Lesson #2: Copy types
//!
//! `GeoPoint` is two `f64`s, so it derives `Copy`. Passing one around never
//! moves ownership; it is duplicated like a number would be. Rings are
//! `Vec<GeoPoint>` and are NOT `Copy`, so functions borrow them as
//! `&[GeoPoint]` and return a fresh `Vec` when they need to change shape.

use serde::{Deserialize, Serialize};

/// Tolerance for every coordinate comparison in this crate.
///
/// Changing it changes which edge-touching zone drawings count as overlapping.
pub const EPSILON: f64 = 1e-10;

/// A geographic point in degrees.
///
/// Serialized as `{"latitude": .., "longitude": ..}`, the shape the map
/// components exchange with the zone editor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

/// An ordered polygon boundary. May or may not repeat its first point at the end.
pub type Ring = Vec<GeoPoint>;

impl GeoPoint {
    #[inline]
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Build from a GeoJSON position, which is `[longitude, latitude]`.
    #[inline]
    pub fn from_lng_lat(longitude: f64, latitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// GeoJSON position order: `[longitude, latitude]`.
    #[inline]
    pub fn to_lng_lat(self) -> [f64; 2] {
        [self.longitude, self.latitude]
    }

    /// Equal within [`EPSILON`] on both axes.
    #[inline]
    pub fn approx_eq(&self, other: &GeoPoint) -> bool {
        (self.latitude - other.latitude).abs() < EPSILON
            && (self.longitude - other.longitude).abs() < EPSILON
    }

    // Planar accessors: longitude is x, latitude is y.
    #[inline]
    pub(crate) fn x(&self) -> f64 {
        self.longitude
    }

    #[inline]
    pub(crate) fn y(&self) -> f64 {
        self.latitude
    }
}

// ============================================================================
// RING NORMALIZATION
// ============================================================================

/// Whether the ring repeats its first point at the end.
#[inline]
pub fn is_closed(points: &[GeoPoint]) -> bool {
    match (points.first(), points.last()) {
        (Some(first), Some(last)) if points.len() > 1 => first.approx_eq(last),
        _ => false,
    }
}

/// Return a closed copy of the ring.
///
/// An already-closed ring comes back as-is (no second duplicate), an open one
/// gets its first point appended. Empty input stays empty.
pub fn ensure_closed_ring(points: &[GeoPoint]) -> Ring {
    let Some(first) = points.first() else {
        return Vec::new();
    };

    let mut ring = points.to_vec();
    // A single point is never "closed" and gets its twin appended.
    if !is_closed(points) {
        ring.push(*first);
    }
    ring
}

/// Return an open copy of the ring (closing duplicate removed).
pub fn open_ring(points: &[GeoPoint]) -> Ring {
    if is_closed(points) {
        points[..points.len() - 1].to_vec()
    } else {
        points.to_vec()
    }
}

// ============================================================================
// MEASUREMENTS
// ============================================================================

/// Bounding box as `(min_lng, min_lat, max_lng, max_lat)`.
pub fn bounding_box(points: &[GeoPoint]) -> Option<(f64, f64, f64, f64)> {
    if points.is_empty() {
        return None;
    }

    let min_x = points.iter().map(|p| p.x()).fold(f64::INFINITY, f64::min);
    let min_y = points.iter().map(|p| p.y()).fold(f64::INFINITY, f64::min);
    let max_x = points.iter().map(|p| p.x()).fold(f64::NEG_INFINITY, f64::max);
    let max_y = points.iter().map(|p| p.y()).fold(f64::NEG_INFINITY, f64::max);

    Some((min_x, min_y, max_x, max_y))
}

/// Absolute area in squared degrees (shoelace formula over the open ring).
pub fn ring_area(points: &[GeoPoint]) -> f64 {
    let ring = open_ring(points);
    let n = ring.len();
    if n < 3 {
        return 0.0;
    }

    let mut area = 0.0;
    for i in 0..n {
        let j = (i + 1) % n;
        area += ring[i].x() * ring[j].y();
        area -= ring[j].x() * ring[i].y();
    }
    (area / 2.0).abs()
}

/// Average of the open ring's vertices.
pub fn ring_centroid(points: &[GeoPoint]) -> Option<GeoPoint> {
    let ring = open_ring(points);
    if ring.is_empty() {
        return None;
    }

    let n = ring.len() as f64;
    let lat: f64 = ring.iter().map(|p| p.latitude).sum();
    let lng: f64 = ring.iter().map(|p| p.longitude).sum();
    Some(GeoPoint::new(lat / n, lng / n))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Ring {
        vec![
            GeoPoint::new(0.0, 0.0),
            GeoPoint::new(0.0, 10.0),
            GeoPoint::new(10.0, 10.0),
            GeoPoint::new(10.0, 0.0),
        ]
    }

    #[test]
    fn closes_open_ring() {
        let closed = ensure_closed_ring(&square());
        assert_eq!(closed.len(), 5);
        assert_eq!(closed.first(), closed.last());
    }

    #[test]
    fn closed_ring_is_left_alone() {
        let once = ensure_closed_ring(&square());
        let twice = ensure_closed_ring(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn near_duplicate_counts_as_closed() {
        let mut ring = square();
        ring.push(GeoPoint::new(1e-12, -1e-12));
        assert!(is_closed(&ring));
        assert_eq!(ensure_closed_ring(&ring).len(), 5);
    }

    #[test]
    fn empty_and_single_point() {
        assert!(ensure_closed_ring(&[]).is_empty());

        let single = ensure_closed_ring(&[GeoPoint::new(4.0, 2.0)]);
        assert_eq!(single.len(), 2);
        assert_eq!(single[0], single[1]);
    }

    #[test]
    fn closing_holds_for_arbitrary_lengths() {
        for n in 1..8 {
            let ring: Ring = (0..n)
                .map(|i| GeoPoint::new(i as f64 * 0.5, (i * i) as f64))
                .collect();
            let closed = ensure_closed_ring(&ring);
            assert!(closed[0].approx_eq(closed.last().unwrap()), "n = {}", n);
            assert_eq!(ensure_closed_ring(&closed), closed, "n = {}", n);
        }
    }

    #[test]
    fn open_ring_drops_duplicate() {
        let closed = ensure_closed_ring(&square());
        assert_eq!(open_ring(&closed), square());
        assert_eq!(open_ring(&square()), square());
    }

    #[test]
    fn bbox_and_area() {
        assert_eq!(bounding_box(&square()), Some((0.0, 0.0, 10.0, 10.0)));
        assert_eq!(bounding_box(&[]), None);
        assert!((ring_area(&square()) - 100.0).abs() < 1e-10);
        // Closing point must not change the area.
        assert!((ring_area(&ensure_closed_ring(&square())) - 100.0).abs() < 1e-10);
    }

    #[test]
    fn centroid_of_square() {
        let c = ring_centroid(&ensure_closed_ring(&square())).unwrap();
        assert!((c.latitude - 5.0).abs() < 1e-10);
        assert!((c.longitude - 5.0).abs() < 1e-10);
        assert_eq!(ring_centroid(&[]), None);
    }
}
