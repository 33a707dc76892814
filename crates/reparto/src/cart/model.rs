//! Cart data model and its wire/storage shape.

use serde::{Deserialize, Serialize};

/// One cart line. Unique by `id` within a cart.
///
/// Stored and sent as `{"id", "name", "unitPrice", "quantity"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    /// Product identifier.
    pub id: String,
    pub name: String,
    pub unit_price: f64,
    pub quantity: u32,
}

impl CartItem {
    pub fn new(id: impl Into<String>, name: impl Into<String>, unit_price: f64, quantity: u32) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            unit_price,
            quantity,
        }
    }

    pub fn subtotal(&self) -> f64 {
        self.unit_price * self.quantity as f64
    }
}

/// A line the server dropped from the cart (discontinued, out of zone...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemovedLine {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub reason: Option<String>,
}

/// Authoritative cart as returned by the remote cart service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CartSnapshot {
    pub items: Vec<CartItem>,
    pub warnings: Vec<String>,
    pub removed_items: Vec<RemovedLine>,
}

/// What just happened to the cart. Drives the "added to cart" toast.
#[derive(Debug, Clone, PartialEq)]
pub enum CartAction {
    Added { id: String, quantity: u32 },
    Updated { id: String, quantity: u32 },
    Removed { id: String },
    Cleared,
}

/// Everything a cart screen renders.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CartState {
    pub items: Vec<CartItem>,
    pub warnings: Vec<String>,
    pub removed_items: Vec<RemovedLine>,
    pub last_action: Option<CartAction>,
}

impl CartState {
    pub fn item(&self, id: &str) -> Option<&CartItem> {
        self.items.iter().find(|item| item.id == id)
    }

    /// Sum of `unit_price * quantity` over every line.
    pub fn total(&self) -> f64 {
        self.items.iter().map(CartItem::subtotal).sum()
    }

    /// Number of units (not lines) in the cart.
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_shape_is_camel_case() {
        let item = CartItem::new("p1", "Arroz 1kg", 1290.0, 2);
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["unitPrice"], 1290.0);
        assert_eq!(json["quantity"], 2);
        assert!(json.get("unit_price").is_none());
    }

    #[test]
    fn snapshot_tolerates_missing_fields() {
        let snapshot: CartSnapshot = serde_json::from_str(r#"{"items": []}"#).unwrap();
        assert_eq!(snapshot, CartSnapshot::default());

        let snapshot: CartSnapshot = serde_json::from_str(
            r#"{"items":[{"id":"p1","name":"Arroz","unitPrice":1290,"quantity":1}],
                "removedItems":[{"id":"p9","reason":"discontinued"}]}"#,
        )
        .unwrap();
        assert_eq!(snapshot.items.len(), 1);
        assert_eq!(snapshot.removed_items[0].reason.as_deref(), Some("discontinued"));
    }

    #[test]
    fn totals() {
        let state = CartState {
            items: vec![
                CartItem::new("p1", "Arroz", 1000.0, 2),
                CartItem::new("p2", "Aceite", 2500.0, 1),
            ],
            ..CartState::default()
        };
        assert_eq!(state.total(), 4500.0);
        assert_eq!(state.item_count(), 3);
        assert_eq!(state.item("p2").map(|i| i.quantity), Some(1));
        assert!(state.item("p3").is_none());
    }
}
