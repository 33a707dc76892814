//! # reparto
//!
//! The non-UI half of the reparto mobile and web clients:
//!
//! - [`api`]: authenticated REST client and one typed service per backend
//! - [`cart`]: optimistic cart state with debounced per-product remote sync
//! - [`config`]: service URLs and cart settings from YAML + environment
//! - [`error`]: the error taxonomy and its user-facing (Spanish) messages
//!
//! Geometry lives in `reparto-geo` and is re-exported here as [`geo`].

pub mod api;
pub mod cart;
pub mod config;
pub mod error;

pub use reparto_geo as geo;

// Re-export common types at crate root for convenience.
pub use api::{ApiClient, RequestOptions, Service, Session, SessionListener};
pub use cart::{CartAction, CartItem, CartRemote, CartSnapshot, CartState, CartStorage, CartStore};
pub use config::{AppConfig, ConfigError};
pub use error::ApiError;
