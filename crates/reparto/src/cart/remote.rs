//! The remote side of the cart, as the store sees it.

use std::future::Future;

use super::model::CartSnapshot;
use crate::error::ApiError;

/// Remote cart operations.
///
/// Implemented by [`crate::api::CartService`] against the backend and by test
/// doubles. Futures must be `Send` because sync workers run on the tokio
/// runtime.
pub trait CartRemote: Send + Sync + 'static {
    /// No remote calls are scheduled while this is false.
    fn is_authenticated(&self) -> bool;

    fn fetch(&self) -> impl Future<Output = Result<CartSnapshot, ApiError>> + Send;

    /// Set the line for `product_id` to `quantity` (create if missing).
    fn upsert(&self, product_id: &str, quantity: u32) -> impl Future<Output = Result<(), ApiError>> + Send;

    fn remove(&self, product_id: &str) -> impl Future<Output = Result<(), ApiError>> + Send;

    fn clear(&self) -> impl Future<Output = Result<(), ApiError>> + Send;
}
