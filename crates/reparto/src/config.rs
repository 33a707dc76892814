//! Client configuration.
//!
//! A YAML file provides the base URL of every backend service plus cart
//! settings; environment variables override individual fields so a build can
//! be pointed at staging without editing files.
//!
//! ```yaml
//! services:
//!   catalog: https://catalog.example.cl
//!   orders: https://orders.example.cl
//! cart:
//!   debounce_ms: 500
//!   storage_file: cart.json
//! data_dir: ~/.local/share/reparto
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path:?}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("invalid value {value:?} for {var}")]
    InvalidEnv { var: &'static str, value: String },
}

/// Complete client configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub services: ServiceUrls,
    pub cart: CartConfig,
    /// Where local state (the cart file) is kept.
    pub data_dir: PathBuf,
    /// Bearer token to start with, if already signed in.
    pub token: Option<String>,
}

/// Base URL per backend service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceUrls {
    pub catalog: String,
    pub orders: String,
    pub users: String,
    pub zones: String,
    pub routes: String,
    pub notifications: String,
    pub cart: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CartConfig {
    /// Quiet period before a quantity change is pushed to the remote cart.
    pub debounce_ms: u64,
    /// File name (inside `data_dir`) holding the persisted cart.
    pub storage_file: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            services: ServiceUrls::default(),
            cart: CartConfig::default(),
            data_dir: PathBuf::from("."),
            token: None,
        }
    }
}

impl Default for ServiceUrls {
    fn default() -> Self {
        Self {
            catalog: "http://localhost:3001".to_string(),
            orders: "http://localhost:3002".to_string(),
            users: "http://localhost:3003".to_string(),
            zones: "http://localhost:3004".to_string(),
            routes: "http://localhost:3005".to_string(),
            notifications: "http://localhost:3006".to_string(),
            cart: "http://localhost:3002".to_string(),
        }
    }
}

impl Default for CartConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 500,
            storage_file: "cart.json".to_string(),
        }
    }
}

impl ServiceUrls {
    /// Same base URL for every service (single gateway deployments, tests).
    pub fn all(base: &str) -> Self {
        let base = base.trim_end_matches('/').to_string();
        Self {
            catalog: base.clone(),
            orders: base.clone(),
            users: base.clone(),
            zones: base.clone(),
            routes: base.clone(),
            notifications: base.clone(),
            cart: base,
        }
    }
}

impl AppConfig {
    /// Load from an optional YAML file, then apply `REPARTO_*` overrides.
    ///
    /// No path means defaults; an explicit path that cannot be read is an error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::load_from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|var| std::env::var(var).ok())?;
        Ok(config)
    }

    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        // An empty document is a valid "all defaults" config.
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    /// Apply overrides from `lookup` (normally the process environment).
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let urls = [
            ("REPARTO_CATALOG_URL", &mut self.services.catalog),
            ("REPARTO_ORDERS_URL", &mut self.services.orders),
            ("REPARTO_USERS_URL", &mut self.services.users),
            ("REPARTO_ZONES_URL", &mut self.services.zones),
            ("REPARTO_ROUTES_URL", &mut self.services.routes),
            ("REPARTO_NOTIFICATIONS_URL", &mut self.services.notifications),
            ("REPARTO_CART_URL", &mut self.services.cart),
        ];
        for (var, field) in urls {
            if let Some(value) = lookup(var) {
                *field = value.trim_end_matches('/').to_string();
            }
        }

        if let Some(token) = lookup("REPARTO_TOKEN") {
            self.token = Some(token).filter(|t| !t.is_empty());
        }
        if let Some(dir) = lookup("REPARTO_DATA_DIR") {
            self.data_dir = PathBuf::from(dir);
        }
        if let Some(value) = lookup("REPARTO_CART_DEBOUNCE_MS") {
            self.cart.debounce_ms = value.parse().map_err(|_| ConfigError::InvalidEnv {
                var: "REPARTO_CART_DEBOUNCE_MS",
                value,
            })?;
        }
        Ok(())
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.cart.debounce_ms)
    }

    /// Full path of the persisted cart.
    pub fn cart_storage_path(&self) -> PathBuf {
        self.data_dir.join(&self.cart.storage_file)
    }
}
