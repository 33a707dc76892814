//! Routes service: the day's visits for drivers and vendors.

use chrono::NaiveDate;
use reparto_geo::{GeoPoint, RouteStrategy, Stop, plan_route, route_distance_km};
use serde::{Deserialize, Serialize};

use super::client::{ApiClient, Service};
use super::segment;
use crate::error::ApiError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Route {
    pub id: String,
    #[serde(default)]
    pub driver_id: Option<String>,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub stops: Vec<Stop>,
}

impl Route {
    /// Stops in visiting order from `start`, with the total distance in km.
    pub fn planned(&self, start: GeoPoint, strategy: RouteStrategy) -> (Vec<&Stop>, f64) {
        let order = plan_route(start, &self.stops, strategy);
        let distance = route_distance_km(start, &self.stops, &order);
        let stops = order.iter().map(|&i| &self.stops[i]).collect();
        (stops, distance)
    }
}

#[derive(Debug, Clone)]
pub struct RouteService {
    client: ApiClient,
}

impl RouteService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn list_routes(&self) -> Result<Vec<Route>, ApiError> {
        self.client.get(Service::Routes, "/routes").await
    }

    pub async fn get_route(&self, id: &str) -> Result<Route, ApiError> {
        self.client
            .get(Service::Routes, &format!("/routes/{}", segment(id)))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn planned_route_orders_stops() {
        let route: Route = serde_json::from_value(json!({
            "id": "r1",
            "date": "2026-05-11",
            "stops": [
                { "id": "far", "location": { "latitude": 0.0, "longitude": 2.0 } },
                { "id": "near", "location": { "latitude": 0.0, "longitude": 1.0 } }
            ]
        }))
        .unwrap();

        let (stops, km) = route.planned(GeoPoint::new(0.0, 0.0), RouteStrategy::NearestNeighbor);
        let ids: Vec<&str> = stops.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, ["near", "far"]);
        assert!((km - 222.4).abs() < 1.0, "got {}", km);
    }
}
