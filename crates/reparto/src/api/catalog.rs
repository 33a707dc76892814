//! Catalog service: products and SKU prices.

use serde::{Deserialize, Serialize};

use super::client::{ApiClient, RequestOptions, Service};
use super::segment;
use crate::error::ApiError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub sku: Option<String>,
    pub price: f64,
    #[serde(default)]
    pub stock: Option<u32>,
    #[serde(default)]
    pub category: Option<String>,
}

/// Price of a SKU for the signed-in client (prices vary by client list).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkuPrice {
    pub sku: String,
    pub price: f64,
    #[serde(default)]
    pub currency: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CatalogService {
    client: ApiClient,
}

impl CatalogService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Browse the public catalog. No auth header is sent.
    pub async fn list_products(&self, search: Option<&str>) -> Result<Vec<Product>, ApiError> {
        let path = match search {
            Some(query) if !query.trim().is_empty() => format!("/products?search={}", segment(query.trim())),
            _ => "/products".to_string(),
        };
        self.client
            .request::<(), _>(reqwest::Method::GET, Service::Catalog, &path, None, RequestOptions::anonymous())
            .await
    }

    pub async fn get_product(&self, id: &str) -> Result<Product, ApiError> {
        self.client
            .get(Service::Catalog, &format!("/products/{}", segment(id)))
            .await
    }

    pub async fn sku_price(&self, sku: &str) -> Result<SkuPrice, ApiError> {
        self.client
            .get(Service::Catalog, &format!("/skus/{}/precio", segment(sku)))
            .await
    }
}
