//! # reparto-geo
//!
//! Zone geometry and visit routing for the reparto clients.
//!
//! Everything here is pure: no I/O, no errors. Malformed input degrades to
//! an empty list, `false` or `None` so the zone editor can use these as hints
//! while the user is still drawing.
//!
//! ## Rust Lesson #1: Crate roots
//!
//! `lib.rs` is the crate root. `pub mod` makes a module visible to other
//! crates, and `pub use` lifts the common names up so callers can write
//! `reparto_geo::polygons_overlap` instead of the full path.

pub mod geojson;
pub mod geometry;
pub mod intersect;
pub mod route;

// Re-export common types at crate root for convenience.
pub use geojson::{Geometry, extract_polygons, to_multi_polygon};
pub use geometry::{EPSILON, GeoPoint, Ring, bounding_box, ensure_closed_ring, open_ring, ring_area, ring_centroid};
pub use intersect::{find_overlaps, point_in_ring, polygons_overlap, segments_intersect, zone_containing};
pub use route::{RouteStrategy, Stop, haversine_km, order_nearest_neighbor, plan_route, route_distance_km};
