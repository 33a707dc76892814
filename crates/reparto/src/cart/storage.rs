//! Local persistence of cart lines.
//!
//! The cart is a single key: one JSON array of `{id, name, unitPrice,
//! quantity}`. It is read once when the store starts and rewritten after
//! every mutation.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use super::model::CartItem;

pub trait CartStorage: Send + Sync {
    /// Persisted lines; empty when nothing was saved yet.
    fn load(&self) -> io::Result<Vec<CartItem>>;

    fn save(&self, items: &[CartItem]) -> io::Result<()>;
}

/// Cart stored as a JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CartStorage for JsonFileStorage {
    fn load(&self) -> io::Result<Vec<CartItem>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err),
        };
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&content).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    fn save(&self, items: &[CartItem]) -> io::Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(items).map_err(io::Error::other)?;

        // Write-then-rename so a crash mid-write never leaves half a cart.
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)
    }
}

/// In-process storage (tests, previews before sign-in).
#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: Mutex<Vec<CartItem>>,
}

impl MemoryStorage {
    pub fn new(items: Vec<CartItem>) -> Self {
        Self {
            items: Mutex::new(items),
        }
    }

    pub fn snapshot(&self) -> Vec<CartItem> {
        self.items.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl CartStorage for MemoryStorage {
    fn load(&self) -> io::Result<Vec<CartItem>> {
        Ok(self.snapshot())
    }

    fn save(&self, items: &[CartItem]) -> io::Result<()> {
        *self.items.lock().unwrap_or_else(PoisonError::into_inner) = items.to_vec();
        Ok(())
    }
}

// Shared handles: the caller keeps an `Arc` to inspect what was persisted.
impl<S: CartStorage + ?Sized> CartStorage for std::sync::Arc<S> {
    fn load(&self) -> io::Result<Vec<CartItem>> {
        (**self).load()
    }

    fn save(&self, items: &[CartItem]) -> io::Result<()> {
        (**self).save(items)
    }
}
