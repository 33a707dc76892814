//! Remote cart endpoints.

use serde::Serialize;
use serde::de::IgnoredAny;

use super::client::{ApiClient, Service};
use super::segment;
use crate::cart::{CartRemote, CartSnapshot};
use crate::error::ApiError;

#[derive(Serialize)]
struct QuantityBody {
    quantity: u32,
}

#[derive(Debug, Clone)]
pub struct CartService {
    client: ApiClient,
}

impl CartService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn fetch(&self) -> Result<CartSnapshot, ApiError> {
        // A brand new customer's cart may come back as an empty body.
        let snapshot: Option<CartSnapshot> = self.client.get(Service::Cart, "/cart").await?;
        Ok(snapshot.unwrap_or_default())
    }

    pub async fn upsert(&self, product_id: &str, quantity: u32) -> Result<(), ApiError> {
        let path = format!("/cart/items/{}", segment(product_id));
        let _: IgnoredAny = self
            .client
            .put(Service::Cart, &path, &QuantityBody { quantity })
            .await?;
        Ok(())
    }

    pub async fn remove(&self, product_id: &str) -> Result<(), ApiError> {
        let path = format!("/cart/items/{}", segment(product_id));
        let _: IgnoredAny = self.client.delete(Service::Cart, &path).await?;
        Ok(())
    }

    pub async fn clear(&self) -> Result<(), ApiError> {
        let _: IgnoredAny = self.client.delete(Service::Cart, "/cart").await?;
        Ok(())
    }
}

impl CartRemote for CartService {
    fn is_authenticated(&self) -> bool {
        self.client.session().is_authenticated()
    }

    async fn fetch(&self) -> Result<CartSnapshot, ApiError> {
        CartService::fetch(self).await
    }

    async fn upsert(&self, product_id: &str, quantity: u32) -> Result<(), ApiError> {
        CartService::upsert(self, product_id, quantity).await
    }

    async fn remove(&self, product_id: &str) -> Result<(), ApiError> {
        CartService::remove(self, product_id).await
    }

    async fn clear(&self) -> Result<(), ApiError> {
        CartService::clear(self).await
    }
}
