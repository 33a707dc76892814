//! GeoJSON conversion at the zones service boundary.
//!
//! The backend speaks GeoJSON (`Polygon`, `MultiPolygon`, optionally wrapped
//! in a `Feature`) with positions in `[longitude, latitude]` order. The map
//! and editor work with open rings of [`GeoPoint`].
//!
//! Input is read from a loose `serde_json::Value` rather than a typed model so
//! that one malformed polygon does not throw away its well-formed siblings.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::geometry::{GeoPoint, Ring, ensure_closed_ring, open_ring};

/// Typed GeoJSON geometry produced by this crate.
///
/// ## Rust Lesson #4: Internally tagged enums
///
/// `#[serde(tag = "type")]` writes the variant name into a `"type"` field
/// next to the variant's own fields, which is exactly GeoJSON's layout:
/// `{"type": "MultiPolygon", "coordinates": [...]}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    Polygon { coordinates: Vec<Vec<[f64; 2]>> },
    MultiPolygon { coordinates: Vec<Vec<Vec<[f64; 2]>>> },
}

impl Geometry {
    /// Loose JSON form, as sent in request bodies.
    pub fn to_value(&self) -> Value {
        // Serializing plain numbers and strings cannot fail.
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Build a single-ring `MultiPolygon` from an editor ring.
///
/// Returns `None` for fewer than 3 points. The ring is closed and positions
/// are flipped to `[longitude, latitude]`.
pub fn to_multi_polygon(points: &[GeoPoint]) -> Option<Geometry> {
    if points.len() < 3 {
        return None;
    }

    let ring: Vec<[f64; 2]> = ensure_closed_ring(points)
        .into_iter()
        .map(GeoPoint::to_lng_lat)
        .collect();

    Some(Geometry::MultiPolygon {
        coordinates: vec![vec![ring]],
    })
}

/// Extract the outer ring of every polygon in a GeoJSON geometry.
///
/// - `Feature` is unwrapped to its `geometry` (recursively)
/// - `Polygon` yields its first ring
/// - `MultiPolygon` yields the first ring of each member, skipping malformed ones
/// - anything else yields nothing
///
/// Rings come back open, points in input order.
pub fn extract_polygons(geometry: &Value) -> Vec<Ring> {
    let Some(object) = geometry.as_object() else {
        return Vec::new();
    };

    match object.get("type").and_then(Value::as_str) {
        Some("Feature") => object
            .get("geometry")
            .map(extract_polygons)
            .unwrap_or_default(),
        Some("Polygon") => object
            .get("coordinates")
            .and_then(outer_ring)
            .into_iter()
            .collect(),
        Some("MultiPolygon") => object
            .get("coordinates")
            .and_then(Value::as_array)
            .map(|polygons| polygons.iter().filter_map(outer_ring).collect())
            .unwrap_or_default(),
        _ => Vec::new(),
    }
}

/// First ring of a polygon's coordinate array: `[[[lng, lat], ...], ...]`.
fn outer_ring(polygon: &Value) -> Option<Ring> {
    let ring = polygon.as_array()?.first()?.as_array()?;

    // ## Rust Lesson #5: Collecting into Option
    //
    // `collect::<Option<Vec<_>>>()` stops at the first `None`, so one bad
    // position rejects the whole ring instead of silently shifting it.
    let points = ring.iter().map(position).collect::<Option<Vec<_>>>()?;
    Some(open_ring(&points))
}

/// A GeoJSON position: at least two numbers, longitude first.
fn position(value: &Value) -> Option<GeoPoint> {
    let coords = value.as_array()?;
    let lng = coords.first()?.as_f64()?;
    let lat = coords.get(1)?.as_f64()?;
    Some(GeoPoint::from_lng_lat(lng, lat))
}
