//! Zones service: delivery/sales zones drawn on the map.
//!
//! Geometry travels as raw GeoJSON. Reading goes through
//! [`extract_polygons`] so a partly broken zone still renders what it can;
//! writing goes through [`to_multi_polygon`].

use reparto_geo::{GeoPoint, Geometry, Ring, extract_polygons, polygons_overlap, to_multi_polygon};
use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::client::{ApiClient, Service};
use super::segment;
use crate::error::ApiError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Zone {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub geometry: Value,
    #[serde(default)]
    pub vendor_id: Option<String>,
}

impl Zone {
    /// Open rings ready for the map.
    pub fn polygons(&self) -> Vec<Ring> {
        extract_polygons(&self.geometry)
    }

    /// Whether any of this zone's polygons overlaps `ring`.
    pub fn overlaps(&self, ring: &[GeoPoint]) -> bool {
        self.polygons().iter().any(|polygon| polygons_overlap(polygon, ring))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewZone {
    pub name: String,
    pub geometry: Geometry,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vendor_id: Option<String>,
}

impl NewZone {
    /// `None` when the drawing has fewer than 3 points.
    pub fn from_ring(name: impl Into<String>, points: &[GeoPoint]) -> Option<Self> {
        Some(Self {
            name: name.into(),
            geometry: to_multi_polygon(points)?,
            vendor_id: None,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geometry: Option<Geometry>,
}

#[derive(Debug, Clone)]
pub struct ZoneService {
    client: ApiClient,
}

impl ZoneService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn list_zones(&self) -> Result<Vec<Zone>, ApiError> {
        self.client.get(Service::Zones, "/zones").await
    }

    pub async fn get_zone(&self, id: &str) -> Result<Zone, ApiError> {
        self.client
            .get(Service::Zones, &format!("/zones/{}", segment(id)))
            .await
    }

    pub async fn create_zone(&self, zone: &NewZone) -> Result<Zone, ApiError> {
        self.client.post(Service::Zones, "/zones", zone).await
    }

    pub async fn update_zone(&self, id: &str, update: &ZoneUpdate) -> Result<Zone, ApiError> {
        self.client
            .put(Service::Zones, &format!("/zones/{}", segment(id)), update)
            .await
    }

    /// Some backends echo the deleted zone, others answer 204; both are success.
    pub async fn delete_zone(&self, id: &str) -> Result<(), ApiError> {
        let _: IgnoredAny = self
            .client
            .delete(Service::Zones, &format!("/zones/{}", segment(id)))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn drawing() -> Vec<GeoPoint> {
        vec![
            GeoPoint::new(-33.0, -70.0),
            GeoPoint::new(-33.0, -69.0),
            GeoPoint::new(-32.0, -69.0),
        ]
    }

    #[test]
    fn new_zone_body_is_geojson() {
        let zone = NewZone::from_ring("Norte", &drawing()).unwrap();
        let body = serde_json::to_value(&zone).unwrap();
        assert_eq!(body["geometry"]["type"], "MultiPolygon");
        assert_eq!(body["geometry"]["coordinates"][0][0][0], json!([-70.0, -33.0]));
        assert!(NewZone::from_ring("Nada", &drawing()[..2]).is_none());
    }

    #[test]
    fn zone_from_backend_renders_polygons() {
        let zone: Zone = serde_json::from_value(json!({
            "id": "z1",
            "name": "Norte",
            "geometry": {
                "type": "Feature",
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[[-70.0, -33.0], [-69.0, -33.0], [-69.0, -32.0], [-70.0, -33.0]]]
                }
            }
        }))
        .unwrap();
        assert_eq!(zone.polygons(), vec![drawing()]);
        assert!(zone.overlaps(&drawing()));
    }

    #[test]
    fn zone_without_geometry_is_empty() {
        let zone: Zone = serde_json::from_value(json!({ "id": "z2", "name": "Sur" })).unwrap();
        assert!(zone.polygons().is_empty());
        assert!(!zone.overlaps(&drawing()));
    }
}
