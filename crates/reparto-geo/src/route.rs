//! Visit ordering for delivery and sales routes.
//!
//! A driver or vendor starts from a depot (or wherever they are now) and has
//! a set of client stops for the day. The order in which they are visited
//! affects total distance travelled. This module provides the ordering the
//! route planner screen offers.
//!
//! ## Algorithms
//!
//! - **As given**: the order the backend returned
//! - **Nearest Neighbor**: greedy, O(n²), usually good enough for a day's stops

use serde::{Deserialize, Serialize};

use crate::geometry::GeoPoint;

/// Mean Earth radius in kilometres.
const EARTH_RADIUS_KM: f64 = 6371.0088;

/// A client location to visit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stop {
    pub id: String,
    pub location: GeoPoint,
}

/// Great-circle distance between two points.
pub fn haversine_km(a: GeoPoint, b: GeoPoint) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let dlat = lat2 - lat1;
    let dlng = (b.longitude - a.longitude).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().min(1.0).asin()
}

/// Order stops using the nearest-neighbor heuristic.
///
/// Starting from `start`, greedily pick the closest unvisited stop. Ties go to
/// the lower index so the result is deterministic.
///
/// Returns indices into `stops`, each exactly once.
pub fn order_nearest_neighbor(start: GeoPoint, stops: &[Stop]) -> Vec<usize> {
    let n = stops.len();
    let mut order = Vec::with_capacity(n);
    let mut visited = vec![false; n];
    let mut current = start;

    while order.len() < n {
        let mut best: Option<(usize, f64)> = None;
        for (i, stop) in stops.iter().enumerate() {
            if visited[i] {
                continue;
            }
            let d = haversine_km(current, stop.location);
            if best.is_none_or(|(_, best_d)| d < best_d) {
                best = Some((i, d));
            }
        }

        // `best` is always set while unvisited stops remain.
        let Some((next, _)) = best else { break };
        visited[next] = true;
        order.push(next);
        current = stops[next].location;
    }

    order
}

/// Total distance travelled from `start` through the stops in `order`.
pub fn route_distance_km(start: GeoPoint, stops: &[Stop], order: &[usize]) -> f64 {
    let mut total = 0.0;
    let mut current = start;
    for &i in order {
        let Some(stop) = stops.get(i) else { continue };
        total += haversine_km(current, stop.location);
        current = stop.location;
    }
    total
}

/// Ordering strategy for a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RouteStrategy {
    /// Keep the backend's order
    AsGiven,
    /// Nearest neighbor greedy optimization
    #[default]
    NearestNeighbor,
}

impl RouteStrategy {
    /// Get strategy name as string.
    pub fn name(&self) -> &'static str {
        match self {
            RouteStrategy::AsGiven => "as-given",
            RouteStrategy::NearestNeighbor => "nearest",
        }
    }

    /// Parse strategy from string.
    pub fn from_name(name: &str) -> Option<RouteStrategy> {
        match name.to_lowercase().as_str() {
            "as-given" | "given" | "original" => Some(RouteStrategy::AsGiven),
            "nearest" | "nn" | "nearest-neighbor" => Some(RouteStrategy::NearestNeighbor),
            _ => None,
        }
    }

    /// All available strategies.
    pub fn all() -> &'static [RouteStrategy] {
        &[RouteStrategy::AsGiven, RouteStrategy::NearestNeighbor]
    }
}

/// Apply a strategy to get stop indices.
pub fn plan_route(start: GeoPoint, stops: &[Stop], strategy: RouteStrategy) -> Vec<usize> {
    match strategy {
        RouteStrategy::AsGiven => (0..stops.len()).collect(),
        RouteStrategy::NearestNeighbor => order_nearest_neighbor(start, stops),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stop(id: &str, lat: f64, lng: f64) -> Stop {
        Stop {
            id: id.to_string(),
            location: GeoPoint::new(lat, lng),
        }
    }

    #[test]
    fn haversine_known_distance() {
        // Santiago to Valparaíso, roughly 98 km.
        let santiago = GeoPoint::new(-33.4489, -70.6693);
        let valparaiso = GeoPoint::new(-33.0472, -71.6127);
        let d = haversine_km(santiago, valparaiso);
        assert!((d - 98.0).abs() < 3.0, "got {}", d);
        assert_eq!(haversine_km(santiago, santiago), 0.0);
    }

    #[test]
    fn nearest_neighbor_reduces_travel() {
        // Stops in a zigzag along the equator.
        let stops = vec![
            stop("a", 0.0, 0.0),
            stop("b", 0.0, 1.0),
            stop("c", 0.0, 0.1),
            stop("d", 0.0, 0.9),
        ];
        let start = GeoPoint::new(0.0, 0.0);

        let given = plan_route(start, &stops, RouteStrategy::AsGiven);
        let nn = plan_route(start, &stops, RouteStrategy::NearestNeighbor);
        assert_eq!(nn, vec![0, 2, 3, 1]);

        let given_km = route_distance_km(start, &stops, &given);
        let nn_km = route_distance_km(start, &stops, &nn);
        assert!(nn_km <= given_km, "NN {} should be <= given {}", nn_km, given_km);
    }

    #[test]
    fn order_preserves_all_stops() {
        let stops: Vec<Stop> = (0..10)
            .map(|i| stop(&format!("s{}", i), (i % 3) as f64 * 0.01, i as f64 * 0.02))
            .collect();

        let mut order = order_nearest_neighbor(GeoPoint::new(0.0, 0.0), &stops);
        assert_eq!(order.len(), stops.len());

        order.sort();
        assert_eq!(order, (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn ties_resolve_to_lower_index() {
        let stops = vec![stop("east", 0.0, 1.0), stop("west", 0.0, -1.0)];
        assert_eq!(order_nearest_neighbor(GeoPoint::new(0.0, 0.0), &stops), vec![0, 1]);
    }

    #[test]
    fn empty_and_single_stop() {
        let start = GeoPoint::new(0.0, 0.0);
        assert_eq!(order_nearest_neighbor(start, &[]), Vec::<usize>::new());
        assert_eq!(order_nearest_neighbor(start, &[stop("only", 1.0, 1.0)]), vec![0]);
        assert_eq!(route_distance_km(start, &[], &[]), 0.0);
    }

    #[test]
    fn strategy_parsing() {
        assert_eq!(RouteStrategy::from_name("nearest"), Some(RouteStrategy::NearestNeighbor));
        assert_eq!(RouteStrategy::from_name("As-Given"), Some(RouteStrategy::AsGiven));
        assert_eq!(RouteStrategy::from_name("invalid"), None);
        for s in RouteStrategy::all() {
            assert_eq!(RouteStrategy::from_name(s.name()), Some(*s));
        }
    }
}
