//! The shopping cart: owns the line list, coordinates every mutation with
//! the inventory store's optimistic counters, and persists its own snapshot.
//!
//! Every unit in the cart is backed by a matching local stock decrement, so
//! for any product: inventory stock + quantity reserved in the cart is
//! constant across cart mutations. Mutations take the line-list write lock
//! for their whole duration, which serializes rapid successive actions the
//! same way a single-threaded event loop would.

use std::sync::{Arc, RwLock};

use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::errors::StorefrontError;
use crate::events::{EventBus, StoreEvent};
use crate::models::CartLine;
use crate::storage::{keys, SnapshotStorage, SnapshotStorageExt};
use crate::stores::inventory::InventoryStore;

/// Outcome of re-checking a restored cart against a fresh catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Lines still in the cart afterwards.
    pub kept: usize,
    /// Lines removed because the product vanished or has no stock left.
    pub dropped: usize,
    /// Lines whose quantity was clamped down to the available stock.
    pub clamped: usize,
}

pub struct CartStore {
    inventory: Arc<InventoryStore>,
    storage: Arc<dyn SnapshotStorage>,
    events: EventBus,
    lines: RwLock<Vec<CartLine>>,
}

impl CartStore {
    /// Creates the store, restoring a previously persisted snapshot when one
    /// exists. A missing or unparseable snapshot yields an empty cart. The
    /// restored lines are desired quantities only; no reservations are
    /// applied until [`CartStore::reconcile`] runs against a fresh catalog.
    pub fn restore(
        inventory: Arc<InventoryStore>,
        storage: Arc<dyn SnapshotStorage>,
        events: EventBus,
    ) -> Self {
        let lines = match storage.get_json::<Vec<CartLine>>(keys::CART) {
            Ok(Some(lines)) => lines,
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(error = %e, "cart snapshot unreadable; starting empty");
                Vec::new()
            }
        };

        Self {
            inventory,
            storage,
            events,
            lines: RwLock::new(lines),
        }
    }

    /// Re-validates a restored cart against the current catalog: quantities
    /// are clamped to available stock (lines clamping to zero are dropped)
    /// and the surviving reservations are applied to the inventory store.
    ///
    /// Call once after the first successful catalog fetch of a session.
    #[instrument(skip(self))]
    pub fn reconcile(&self) -> ReconcileReport {
        let mut lines = self.lines.write().expect("cart lock poisoned");
        let before = lines.len();
        let mut clamped = 0usize;
        let mut kept = Vec::with_capacity(before);

        for mut line in lines.drain(..) {
            let Some(product) = self.inventory.get(line.product_id) else {
                continue;
            };
            let take = line.quantity.min(product.stock);
            if take == 0 {
                continue;
            }
            if take < line.quantity {
                clamped += 1;
            }
            line.quantity = take;
            self.inventory.reduce_stock(line.product_id, take);
            kept.push(line);
        }

        *lines = kept;
        self.persist(&lines);

        let report = ReconcileReport {
            kept: lines.len(),
            dropped: before - lines.len(),
            clamped,
        };
        if report.dropped > 0 || report.clamped > 0 {
            info!(?report, "restored cart adjusted to fresh stock");
        }
        self.events.send_or_log(StoreEvent::CartReconciled {
            kept: report.kept,
            dropped: report.dropped,
        });
        report
    }

    /// Adds one unit of the product to the cart, reserving it from local
    /// stock. Fails without mutating anything when the product is unknown,
    /// out of stock, or has no unit left for an existing line.
    #[instrument(skip(self))]
    pub fn add_to_cart(&self, product_id: Uuid) -> Result<(), StorefrontError> {
        let mut lines = self.lines.write().expect("cart lock poisoned");

        let product = self
            .inventory
            .get(product_id)
            .ok_or_else(|| StorefrontError::NotFound("Product not found".to_string()))?;

        if !self.inventory.is_in_stock(product_id) {
            return Err(StorefrontError::OutOfStock(
                "This item is out of stock!".to_string(),
            ));
        }

        let quantity = match lines.iter().position(|l| l.product_id == product_id) {
            Some(position) => {
                if product.stock < 1 {
                    return Err(StorefrontError::InsufficientStock(format!(
                        "Only {} items available in stock!",
                        product.stock
                    )));
                }
                lines[position].quantity += 1;
                lines[position].quantity
            }
            None => {
                lines.push(CartLine::for_product(&product));
                1
            }
        };

        self.inventory.reduce_stock(product_id, 1);
        self.persist(&lines);
        self.events
            .send_or_log(StoreEvent::CartLineAdded { product_id, quantity });
        Ok(())
    }

    /// Sets a line to an absolute quantity. Zero removes the line; an
    /// increase requires the delta to be available in local stock.
    #[instrument(skip(self))]
    pub fn update_quantity(
        &self,
        product_id: Uuid,
        new_quantity: u32,
    ) -> Result<(), StorefrontError> {
        if new_quantity == 0 {
            return self.remove_from_cart(product_id);
        }

        let mut lines = self.lines.write().expect("cart lock poisoned");

        let product = self
            .inventory
            .get(product_id)
            .ok_or_else(|| StorefrontError::NotFound("Product not found".to_string()))?;

        let position = lines
            .iter()
            .position(|l| l.product_id == product_id)
            .ok_or_else(|| StorefrontError::NotFound("No such item in the cart".to_string()))?;

        let current = lines[position].quantity;
        let delta = i64::from(new_quantity) - i64::from(current);

        if delta > 0 && i64::from(product.stock) < delta {
            return Err(StorefrontError::InsufficientStock(format!(
                "Only {} more items available!",
                product.stock
            )));
        }

        lines[position].quantity = new_quantity;
        // Quantities are unsigned and zero was handled above, but never let
        // an empty line linger.
        lines.retain(|l| l.quantity > 0);

        if delta > 0 {
            self.inventory.reduce_stock(product_id, delta as u32);
        } else if delta < 0 {
            self.inventory.increase_stock(product_id, (-delta) as u32);
        }

        self.persist(&lines);
        self.events.send_or_log(StoreEvent::CartLineUpdated {
            product_id,
            quantity: new_quantity,
        });
        Ok(())
    }

    /// Removes a line, refunding its full reservation. Removing a product
    /// that is not in the cart is a no-op.
    #[instrument(skip(self))]
    pub fn remove_from_cart(&self, product_id: Uuid) -> Result<(), StorefrontError> {
        let mut lines = self.lines.write().expect("cart lock poisoned");

        if let Some(position) = lines.iter().position(|l| l.product_id == product_id) {
            let line = lines.remove(position);
            self.inventory.increase_stock(product_id, line.quantity);
            self.persist(&lines);
            self.events
                .send_or_log(StoreEvent::CartLineRemoved { product_id });
        }
        Ok(())
    }

    /// Empties the cart, refunding every reservation and discarding the
    /// persisted snapshot.
    #[instrument(skip(self))]
    pub fn clear_cart(&self) {
        let mut lines = self.lines.write().expect("cart lock poisoned");

        for line in lines.iter() {
            self.inventory.increase_stock(line.product_id, line.quantity);
        }
        lines.clear();

        if let Err(e) = self.storage.remove(keys::CART) {
            warn!(error = %e, "failed to discard cart snapshot");
        }
        self.events.send_or_log(StoreEvent::CartCleared);
    }

    pub fn lines(&self) -> Vec<CartLine> {
        self.lines.read().expect("cart lock poisoned").clone()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.read().expect("cart lock poisoned").is_empty()
    }

    /// Sum of price × quantity over all lines.
    pub fn subtotal(&self) -> rust_decimal::Decimal {
        self.lines
            .read()
            .expect("cart lock poisoned")
            .iter()
            .map(CartLine::line_total)
            .sum()
    }

    pub fn total_items(&self) -> u32 {
        self.lines
            .read()
            .expect("cart lock poisoned")
            .iter()
            .map(|l| l.quantity)
            .sum()
    }

    /// Units of a product currently reserved by the cart.
    pub fn reserved_quantity(&self, product_id: Uuid) -> u32 {
        self.lines
            .read()
            .expect("cart lock poisoned")
            .iter()
            .filter(|l| l.product_id == product_id)
            .map(|l| l.quantity)
            .sum()
    }

    /// Snapshot writes are best-effort: a failure leaves the in-memory cart
    /// correct for the session, it just may not survive a reload.
    fn persist(&self, lines: &[CartLine]) {
        if let Err(e) = self.storage.set_json(keys::CART, &lines) {
            warn!(error = %e, "cart snapshot write failed; cart will not survive reload");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiClient;
    use crate::models::Product;
    use crate::storage::MemoryStorage;
    use rust_decimal_macros::dec;

    fn harness() -> (Arc<InventoryStore>, Arc<MemoryStorage>, CartStore) {
        let api = Arc::new(ApiClient::new("http://localhost:5000", None).unwrap());
        let inventory = Arc::new(InventoryStore::new(api, EventBus::default()));
        let storage = Arc::new(MemoryStorage::new());
        let cart = CartStore::restore(
            inventory.clone(),
            storage.clone() as Arc<dyn SnapshotStorage>,
            EventBus::default(),
        );
        (inventory, storage, cart)
    }

    fn product(name: &str, stock: u32) -> Product {
        Product {
            id: Uuid::new_v4(),
            name: name.to_string(),
            description: String::new(),
            image: "📦".to_string(),
            category: "Pantry".to_string(),
            price: dec!(2.50),
            stock,
            low_stock_threshold: 10,
        }
    }

    #[test]
    fn corrupt_snapshot_starts_empty() {
        let api = Arc::new(ApiClient::new("http://localhost:5000", None).unwrap());
        let inventory = Arc::new(InventoryStore::new(api, EventBus::default()));
        let storage = Arc::new(MemoryStorage::new());
        storage.set(keys::CART, "{definitely not json").unwrap();

        let cart = CartStore::restore(
            inventory,
            storage as Arc<dyn SnapshotStorage>,
            EventBus::default(),
        );
        assert!(cart.is_empty());
    }

    #[test]
    fn add_unknown_product_fails_clean() {
        let (_, _, cart) = harness();
        let err = cart.add_to_cart(Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, StorefrontError::NotFound(_)));
        assert!(cart.is_empty());
    }

    #[test]
    fn successful_mutations_persist_a_snapshot() {
        let (inventory, storage, cart) = harness();
        let p = product("Beans", 5);
        let id = p.id;
        inventory.replace_catalog(vec![p]);

        cart.add_to_cart(id).unwrap();
        let raw = storage.get(keys::CART).unwrap().expect("snapshot written");
        assert!(raw.contains(&id.to_string()));

        cart.clear_cart();
        assert_eq!(storage.get(keys::CART).unwrap(), None);
    }

    /// A storage that always fails writes, to prove mutations still land.
    struct BrokenStorage;

    impl SnapshotStorage for BrokenStorage {
        fn get(&self, _key: &str) -> Result<Option<String>, StorefrontError> {
            Ok(None)
        }
        fn set(&self, _key: &str, _value: &str) -> Result<(), StorefrontError> {
            Err(StorefrontError::StorageError("quota exceeded".to_string()))
        }
        fn remove(&self, _key: &str) -> Result<(), StorefrontError> {
            Err(StorefrontError::StorageError("quota exceeded".to_string()))
        }
    }

    #[test]
    fn snapshot_write_failure_is_swallowed() {
        let api = Arc::new(ApiClient::new("http://localhost:5000", None).unwrap());
        let inventory = Arc::new(InventoryStore::new(api, EventBus::default()));
        let p = product("Beans", 2);
        let id = p.id;
        inventory.replace_catalog(vec![p]);

        let cart = CartStore::restore(
            inventory.clone(),
            Arc::new(BrokenStorage) as Arc<dyn SnapshotStorage>,
            EventBus::default(),
        );

        cart.add_to_cart(id).unwrap();
        assert_eq!(cart.total_items(), 1);
        assert_eq!(inventory.get(id).unwrap().stock, 1);

        cart.clear_cart();
        assert!(cart.is_empty());
        assert_eq!(inventory.get(id).unwrap().stock, 2);
    }
}
