//! Orders service.
//!
//! Pricing, credit checks and state transitions happen on the backend; these
//! are just the request and response shapes.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::client::{ApiClient, Service};
use super::segment;
use crate::cart::CartItem;
use crate::error::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Approved,
    Preparing,
    Dispatched,
    Delivered,
    Cancelled,
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub product_id: String,
    pub quantity: u32,
    #[serde(default)]
    pub unit_price: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    pub status: OrderStatus,
    pub items: Vec<OrderLine>,
    pub total: f64,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub delivery_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrder {
    pub items: Vec<OrderLine>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl NewOrder {
    /// Order for everything currently in the cart. Prices are left to the backend.
    pub fn from_cart(items: &[CartItem]) -> Self {
        Self {
            items: items
                .iter()
                .map(|item| OrderLine {
                    product_id: item.id.clone(),
                    quantity: item.quantity,
                    unit_price: None,
                })
                .collect(),
            delivery_date: None,
            notes: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct OrderService {
    client: ApiClient,
}

impl OrderService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn create_order(&self, order: &NewOrder) -> Result<Order, ApiError> {
        self.client.post(Service::Orders, "/orders", order).await
    }

    pub async fn list_orders(&self) -> Result<Vec<Order>, ApiError> {
        self.client.get(Service::Orders, "/orders").await
    }

    pub async fn get_order(&self, id: &str) -> Result<Order, ApiError> {
        self.client
            .get(Service::Orders, &format!("/orders/{}", segment(id)))
            .await
    }

    pub async fn cancel_order(&self, id: &str) -> Result<Order, ApiError> {
        self.client
            .post(Service::Orders, &format!("/orders/{}/cancel", segment(id)), &serde_json::json!({}))
            .await
    }
}
