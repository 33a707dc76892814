//! Client-side shopping cart.
//!
//! The cart is optimistic: every user action changes local state, persists
//! it and returns at once. The remote cart catches up in the background and
//! is only eventually consistent with what the user sees.
//!
//! ```text
//!   add_item / update_quantity / remove_item / clear_cart
//!        │
//!        ├─► CartState (in memory) ──► CartStorage (JSON file)
//!        ├─► broadcast CartAction (toasts)
//!        └─► SyncQueue ──► one worker per product id ──► CartRemote
//! ```

pub mod model;
pub mod remote;
pub mod storage;
pub mod store;
mod sync;

pub use model::{CartAction, CartItem, CartSnapshot, CartState, RemovedLine};
pub use remote::CartRemote;
pub use storage::{CartStorage, JsonFileStorage, MemoryStorage};
pub use store::{CartStore, DEFAULT_DEBOUNCE};
