//! The cart store: explicit owner of cart state.
//!
//! Screens share one `Arc<CartStore<..>>` instead of reaching for a global.
//! Mutations are synchronous and never wait for the network; the remote cart
//! is updated by [`SyncQueue`] workers in the background.
//!
//! Sync commands are queued while the state lock is still held, so the
//! remote sees changes in the same order the local cart made them even when
//! several threads share the store. Lock order is always state, then the
//! worker map.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::broadcast;

use super::model::{CartAction, CartItem, CartSnapshot, CartState};
use super::remote::CartRemote;
use super::storage::CartStorage;
use super::sync::{SyncCommand, SyncQueue};

/// Quiet period before a quantity change is pushed to the remote cart.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

const EVENT_CAPACITY: usize = 32;

pub struct CartStore<R: CartRemote, S: CartStorage> {
    state: Mutex<CartState>,
    storage: S,
    remote: Arc<R>,
    sync: SyncQueue<R>,
    events: broadcast::Sender<CartAction>,
}

impl<R: CartRemote, S: CartStorage> CartStore<R, S> {
    /// Create a store, loading persisted lines from `storage` once.
    pub fn new(remote: Arc<R>, storage: S, debounce: Duration) -> Self {
        let items = storage.load().unwrap_or_else(|err| {
            tracing::warn!(error = %err, "could not load saved cart, starting empty");
            Vec::new()
        });
        tracing::debug!(lines = items.len(), "cart loaded from storage");

        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            state: Mutex::new(CartState {
                items,
                ..CartState::default()
            }),
            storage,
            sync: SyncQueue::new(Arc::clone(&remote), debounce),
            remote,
            events,
        }
    }

    fn lock(&self) -> MutexGuard<'_, CartState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current state (cloned).
    pub fn state(&self) -> CartState {
        self.lock().clone()
    }

    pub fn items(&self) -> Vec<CartItem> {
        self.lock().items.clone()
    }

    /// Subscribe to cart actions (toast triggers).
    pub fn subscribe(&self) -> broadcast::Receiver<CartAction> {
        self.events.subscribe()
    }

    // ========================================================================
    // MUTATIONS
    // ========================================================================

    /// Add `item`, summing quantities if the product is already in the cart.
    ///
    /// When signed in this schedules a remote sync and must be called from
    /// within a tokio runtime. The same holds for every other mutation.
    pub fn add_item(&self, item: CartItem) {
        if item.quantity == 0 {
            tracing::debug!(product_id = %item.id, "ignoring add with zero quantity");
            return;
        }

        let mut state = self.lock();
        let quantity = match state.items.iter_mut().find(|line| line.id == item.id) {
            Some(line) => {
                line.quantity = line.quantity.saturating_add(item.quantity);
                line.name = item.name.clone();
                line.unit_price = item.unit_price;
                line.quantity
            }
            None => {
                state.items.push(item.clone());
                item.quantity
            }
        };
        self.commit(
            &mut state,
            CartAction::Added {
                id: item.id.clone(),
                quantity: item.quantity,
            },
        );
        self.schedule(&item.id, SyncCommand::Upsert(quantity));
    }

    /// Set a line's quantity. Zero or less removes the line.
    pub fn update_quantity(&self, id: &str, quantity: i64) {
        if quantity <= 0 {
            self.remove_item(id);
            return;
        }
        let quantity = u32::try_from(quantity).unwrap_or(u32::MAX);

        let mut state = self.lock();
        let Some(line) = state.items.iter_mut().find(|line| line.id == id) else {
            tracing::debug!(product_id = id, "update for product not in cart");
            return;
        };
        line.quantity = quantity;
        self.commit(
            &mut state,
            CartAction::Updated {
                id: id.to_string(),
                quantity,
            },
        );
        self.schedule(id, SyncCommand::Upsert(quantity));
    }

    /// Remove a line locally, then remotely.
    ///
    /// If an upsert for the same product is already in flight, the remote
    /// delete is sent after it settles.
    pub fn remove_item(&self, id: &str) {
        let mut state = self.lock();
        let before = state.items.len();
        state.items.retain(|line| line.id != id);
        if state.items.len() == before {
            tracing::debug!(product_id = id, "remove for product not in cart");
        }
        self.commit(&mut state, CartAction::Removed { id: id.to_string() });
        self.schedule(id, SyncCommand::Delete);
    }

    /// Empty the cart and its warnings now; clear the remote cart in the background.
    ///
    /// Pending upserts are dropped and the remote clear waits for upserts
    /// already in flight, so none of them can resurrect a line afterwards.
    pub fn clear_cart(&self) {
        let mut state = self.lock();
        state.items.clear();
        state.warnings.clear();
        self.commit(&mut state, CartAction::Cleared);

        if !self.remote.is_authenticated() {
            return;
        }
        self.sync.after_settled(|remote| async move {
            match remote.clear().await {
                Ok(()) => tracing::debug!("remote cart cleared"),
                Err(err) => tracing::warn!(error = %err, "remote cart clear failed"),
            }
        });
    }

    // ========================================================================
    // RECONCILIATION
    // ========================================================================

    /// Pull the remote cart and reconcile it with local state.
    ///
    /// An empty remote cart never wipes a non-empty local one: right after
    /// local additions an empty snapshot is far more likely to be a stale or
    /// partial response than a real emptying. Errors are logged and dropped.
    pub async fn refresh_cart(&self) {
        if !self.remote.is_authenticated() {
            return;
        }
        match self.remote.fetch().await {
            Ok(snapshot) => self.reconcile(snapshot),
            Err(err) => tracing::warn!(error = %err, "cart refresh failed, keeping local cart"),
        }
    }

    fn reconcile(&self, snapshot: CartSnapshot) {
        let mut state = self.lock();

        if snapshot.items.is_empty() && !state.items.is_empty() {
            tracing::debug!(local = state.items.len(), "remote cart empty, keeping local lines");
            state.warnings = snapshot.warnings;
            state.removed_items = snapshot.removed_items;
            return;
        }

        tracing::debug!(lines = snapshot.items.len(), "cart replaced by remote snapshot");
        state.items = snapshot.items;
        state.warnings = snapshot.warnings;
        state.removed_items = snapshot.removed_items;
        self.persist(&state);
    }

    /// Push pending upserts now and wait for all remote calls to settle.
    pub async fn shutdown(&self) {
        self.sync.shutdown().await;
    }

    // ========================================================================
    // HELPERS
    // ========================================================================

    fn commit(&self, state: &mut CartState, action: CartAction) {
        self.persist(state);
        state.last_action = Some(action.clone());
        // No subscribers is fine.
        let _ = self.events.send(action);
    }

    fn persist(&self, state: &CartState) {
        if let Err(err) = self.storage.save(&state.items) {
            tracing::warn!(error = %err, "could not persist cart");
        }
    }

    fn schedule(&self, product_id: &str, command: SyncCommand) {
        if self.remote.is_authenticated() {
            self.sync.send(product_id, command);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::MemoryStorage;
    use crate::error::ApiError;
    use crate::cart::sync::WORKER_IDLE;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tokio::sync::Semaphore;
    use tokio::time::sleep;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Fetch,
        Upsert(String, u32),
        UpsertDone(String, u32),
        Remove(String),
        Clear,
    }

    /// Records every remote call. Upserts can be held "in flight" with a gate.
    struct FakeRemote {
        calls: Mutex<Vec<Call>>,
        authenticated: AtomicBool,
        snapshot: Mutex<Option<CartSnapshot>>,
        upsert_gate: Option<Semaphore>,
    }

    impl FakeRemote {
        fn new() -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                authenticated: AtomicBool::new(true),
                snapshot: Mutex::new(None),
                upsert_gate: None,
            }
        }

        fn gated() -> Self {
            Self {
                upsert_gate: Some(Semaphore::new(0)),
                ..Self::new()
            }
        }

        fn with_snapshot(snapshot: CartSnapshot) -> Self {
            let remote = Self::new();
            *remote.snapshot.lock().unwrap() = Some(snapshot);
            remote
        }

        fn record(&self, call: Call) {
            self.calls.lock().unwrap().push(call);
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        fn release_upsert(&self) {
            if let Some(gate) = &self.upsert_gate {
                gate.add_permits(1);
            }
        }
    }

    impl CartRemote for FakeRemote {
        fn is_authenticated(&self) -> bool {
            self.authenticated.load(Ordering::SeqCst)
        }

        async fn fetch(&self) -> Result<CartSnapshot, ApiError> {
            self.record(Call::Fetch);
            let snapshot = self.snapshot.lock().unwrap().clone();
            snapshot.ok_or(ApiError::Status {
                status: 503,
                message: "down".to_string(),
            })
        }

        async fn upsert(&self, product_id: &str, quantity: u32) -> Result<(), ApiError> {
            self.record(Call::Upsert(product_id.to_string(), quantity));
            if let Some(gate) = &self.upsert_gate {
                let permit = gate.acquire().await;
                drop(permit);
            }
            self.record(Call::UpsertDone(product_id.to_string(), quantity));
            Ok(())
        }

        async fn remove(&self, product_id: &str) -> Result<(), ApiError> {
            self.record(Call::Remove(product_id.to_string()));
            Ok(())
        }

        async fn clear(&self) -> Result<(), ApiError> {
            self.record(Call::Clear);
            Ok(())
        }
    }

    type TestStore = CartStore<FakeRemote, Arc<MemoryStorage>>;

    fn store_with(remote: FakeRemote) -> (Arc<FakeRemote>, Arc<MemoryStorage>, TestStore) {
        let remote = Arc::new(remote);
        let storage = Arc::new(MemoryStorage::default());
        let store = CartStore::new(Arc::clone(&remote), Arc::clone(&storage), DEFAULT_DEBOUNCE);
        (remote, storage, store)
    }

    fn rice(quantity: u32) -> CartItem {
        CartItem::new("p1", "Arroz 1kg", 1290.0, quantity)
    }

    /// Long enough for any debounce window to elapse.
    async fn settle() {
        sleep(Duration::from_secs(2)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn adding_same_product_sums_quantity() {
        let (_, storage, store) = store_with(FakeRemote::new());
        store.add_item(rice(2));
        store.add_item(rice(3));

        let items = store.items();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].quantity, 5);
        assert_eq!(storage.snapshot(), items);
    }

    #[tokio::test(start_paused = true)]
    async fn rapid_adds_collapse_into_one_upsert() {
        let (remote, _, store) = store_with(FakeRemote::new());

        store.add_item(rice(2));
        sleep(Duration::from_millis(100)).await;
        store.add_item(rice(3));
        sleep(Duration::from_millis(400)).await;
        store.add_item(rice(1));

        // Still inside the window restarted by the last add.
        sleep(Duration::from_millis(499)).await;
        assert!(remote.calls().is_empty());

        settle().await;
        assert_eq!(
            remote.calls(),
            vec![Call::Upsert("p1".into(), 6), Call::UpsertDone("p1".into(), 6)]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn products_sync_independently() {
        let (remote, _, store) = store_with(FakeRemote::new());
        store.add_item(rice(1));
        store.add_item(CartItem::new("p2", "Aceite", 2490.0, 2));
        settle().await;

        let calls = remote.calls();
        assert!(calls.contains(&Call::UpsertDone("p1".into(), 1)));
        assert!(calls.contains(&Call::UpsertDone("p2".into(), 2)));
    }

    #[tokio::test(start_paused = true)]
    async fn update_to_zero_removes_line() {
        let (remote, _, store) = store_with(FakeRemote::new());
        store.add_item(rice(2));
        store.update_quantity("p1", 0);

        assert!(store.items().is_empty());
        assert_eq!(store.state().last_action, Some(CartAction::Removed { id: "p1".into() }));

        settle().await;
        // The pending upsert was dropped in favour of the delete.
        assert_eq!(remote.calls(), vec![Call::Remove("p1".into())]);
    }

    #[tokio::test(start_paused = true)]
    async fn update_sets_quantity_and_debounces() {
        let (remote, _, store) = store_with(FakeRemote::new());
        store.add_item(rice(2));
        store.update_quantity("p1", 7);
        store.update_quantity("missing", 3);

        assert_eq!(store.items()[0].quantity, 7);
        settle().await;
        assert_eq!(
            remote.calls(),
            vec![Call::Upsert("p1".into(), 7), Call::UpsertDone("p1".into(), 7)]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn delete_waits_for_in_flight_upsert() {
        let (remote, _, store) = store_with(FakeRemote::gated());
        store.add_item(rice(4));

        // Debounce elapses; the upsert is now on the wire and held there.
        sleep(Duration::from_millis(600)).await;
        assert_eq!(remote.calls(), vec![Call::Upsert("p1".into(), 4)]);

        store.remove_item("p1");
        assert!(store.items().is_empty());
        settle().await;
        assert_eq!(remote.calls(), vec![Call::Upsert("p1".into(), 4)]);

        remote.release_upsert();
        settle().await;
        assert_eq!(
            remote.calls(),
            vec![
                Call::Upsert("p1".into(), 4),
                Call::UpsertDone("p1".into(), 4),
                Call::Remove("p1".into()),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn clear_cancels_pending_upserts() {
        let (remote, storage, store) = store_with(FakeRemote::new());
        store.add_item(rice(1));
        store.clear_cart();

        assert!(store.items().is_empty());
        assert!(storage.snapshot().is_empty());
        assert_eq!(store.state().last_action, Some(CartAction::Cleared));

        settle().await;
        assert_eq!(remote.calls(), vec![Call::Clear]);
    }

    #[tokio::test(start_paused = true)]
    async fn clear_waits_for_in_flight_upsert() {
        let (remote, _, store) = store_with(FakeRemote::gated());
        store.add_item(rice(4));
        sleep(Duration::from_millis(600)).await;
        assert_eq!(remote.calls(), vec![Call::Upsert("p1".into(), 4)]);

        store.clear_cart();
        // Added after the clear: must reach the server after it.
        store.add_item(rice(2));
        settle().await;
        assert_eq!(remote.calls(), vec![Call::Upsert("p1".into(), 4)]);

        remote.release_upsert();
        remote.release_upsert();
        settle().await;
        assert_eq!(
            remote.calls(),
            vec![
                Call::Upsert("p1".into(), 4),
                Call::UpsertDone("p1".into(), 4),
                Call::Clear,
                Call::Upsert("p1".into(), 2),
                Call::UpsertDone("p1".into(), 2),
            ]
        );
        assert_eq!(store.items(), vec![rice(2)]);
    }

    #[tokio::test(start_paused = true)]
    async fn idle_workers_retire_and_restart() {
        let (remote, _, store) = store_with(FakeRemote::new());
        store.add_item(rice(1));
        settle().await;
        assert_eq!(store.sync.worker_count(), 1);

        sleep(WORKER_IDLE + Duration::from_secs(1)).await;
        assert_eq!(store.sync.worker_count(), 0);

        store.add_item(rice(1));
        settle().await;
        assert_eq!(store.sync.worker_count(), 1);
        assert_eq!(remote.calls().last(), Some(&Call::UpsertDone("p1".into(), 2)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn shared_store_syncs_in_local_order() {
        let remote = Arc::new(FakeRemote::new());
        let store = Arc::new(CartStore::new(
            Arc::clone(&remote),
            MemoryStorage::default(),
            Duration::ZERO,
        ));

        let mut tasks = Vec::new();
        for t in 0..4u32 {
            let store = Arc::clone(&store);
            tasks.push(tokio::spawn(async move {
                for i in 0..50u32 {
                    if (i + t) % 3 == 0 {
                        store.remove_item("p1");
                    } else {
                        store.add_item(rice(1));
                    }
                    tokio::task::yield_now().await;
                }
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }
        store.shutdown().await;

        // The last call the server saw must describe the final local line.
        let last_remote = remote.calls().into_iter().rev().find_map(|call| match call {
            Call::UpsertDone(_, quantity) => Some(Some(quantity)),
            Call::Remove(_) => Some(None),
            _ => None,
        });
        let local = store.items().first().map(|line| line.quantity);
        assert_eq!(last_remote.flatten(), local);
    }

    #[test]
    fn signed_out_store_needs_no_runtime() {
        let remote = FakeRemote::new();
        remote.authenticated.store(false, Ordering::SeqCst);
        let (_, storage, store) = store_with(remote);

        store.add_item(rice(2));
        store.update_quantity("p1", 5);
        store.clear_cart();
        store.add_item(rice(1));
        store.remove_item("p1");

        assert!(store.items().is_empty());
        assert!(storage.snapshot().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn unauthenticated_cart_stays_local() {
        let remote = FakeRemote::new();
        remote.authenticated.store(false, Ordering::SeqCst);
        let (remote, _, store) = store_with(remote);

        store.add_item(rice(1));
        store.remove_item("p1");
        store.clear_cart();
        store.refresh_cart().await;
        settle().await;

        assert!(remote.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn empty_snapshot_keeps_local_items() {
        let snapshot = CartSnapshot {
            warnings: vec!["Precios actualizados".into()],
            ..CartSnapshot::default()
        };
        let (_, _, store) = store_with(FakeRemote::with_snapshot(snapshot));
        store.add_item(rice(2));

        store.refresh_cart().await;
        let state = store.state();
        assert_eq!(state.items, vec![rice(2)]);
        assert_eq!(state.warnings, vec!["Precios actualizados".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn non_empty_snapshot_wins() {
        let snapshot = CartSnapshot {
            items: vec![CartItem::new("p9", "Azúcar", 1100.0, 1)],
            ..CartSnapshot::default()
        };
        let (_, storage, store) = store_with(FakeRemote::with_snapshot(snapshot.clone()));
        store.add_item(rice(2));

        store.refresh_cart().await;
        assert_eq!(store.items(), snapshot.items);
        assert_eq!(storage.snapshot(), snapshot.items);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_refresh_is_swallowed() {
        let (remote, _, store) = store_with(FakeRemote::new());
        store.add_item(rice(3));
        store.refresh_cart().await;

        assert_eq!(store.items(), vec![rice(3)]);
        assert_eq!(remote.calls().first(), Some(&Call::Fetch));
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_flushes_pending_upserts() {
        let (remote, _, store) = store_with(FakeRemote::new());
        store.add_item(rice(2));
        store.shutdown().await;

        assert_eq!(
            remote.calls(),
            vec![Call::Upsert("p1".into(), 2), Call::UpsertDone("p1".into(), 2)]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn subscribers_see_actions() {
        let (_, _, store) = store_with(FakeRemote::new());
        let mut events = store.subscribe();

        store.add_item(rice(2));
        store.remove_item("p1");

        assert_eq!(events.recv().await.unwrap(), CartAction::Added { id: "p1".into(), quantity: 2 });
        assert_eq!(events.recv().await.unwrap(), CartAction::Removed { id: "p1".into() });
    }

    #[tokio::test(start_paused = true)]
    async fn saved_cart_is_loaded_once() {
        let storage = Arc::new(MemoryStorage::new(vec![rice(3)]));
        let store = CartStore::new(Arc::new(FakeRemote::new()), Arc::clone(&storage), DEFAULT_DEBOUNCE);
        assert_eq!(store.items(), vec![rice(3)]);
        assert_eq!(store.state().item_count(), 3);
    }
}
