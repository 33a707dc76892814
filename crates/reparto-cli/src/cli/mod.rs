//! CLI command implementations.
//!
//! - `zones` - close, extract, convert and compare zone polygons
//! - `route` - order a visit round from a start position
//! - `cart` - drive the persisted cart and its remote sync

pub mod cart;
pub mod common;
pub mod route;
pub mod zones;
