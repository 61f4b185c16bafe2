//! Shared harness for integration tests: a full store graph over in-memory
//! storage, seeded with a catalog directly (no network) unless a test
//! points it at a mock server.

#![allow(dead_code)]

use std::sync::Arc;

use rust_decimal::Decimal;
use uuid::Uuid;

use localstore_client::config::AppConfig;
use localstore_client::models::Product;
use localstore_client::storage::{MemoryStorage, SnapshotStorage};
use localstore_client::StorefrontState;

pub struct TestApp {
    pub state: StorefrontState,
    pub storage: Arc<MemoryStorage>,
}

impl TestApp {
    /// Offline app: the API client points at a closed port, so any test
    /// that accidentally touches the network fails loudly.
    pub fn new() -> Self {
        Self::with_base_url("http://127.0.0.1:9")
    }

    pub fn with_base_url(base_url: &str) -> Self {
        let config = AppConfig {
            api_base_url: base_url.to_string(),
            ..AppConfig::default()
        };
        let storage = Arc::new(MemoryStorage::new());
        let state =
            StorefrontState::with_storage(config, storage.clone() as Arc<dyn SnapshotStorage>)
                .expect("failed to build store graph");
        Self { state, storage }
    }

    /// Rebuilds the store graph over the same storage, simulating a page
    /// reload: the cart snapshot survives, the inventory does not.
    pub fn reload(self) -> Self {
        let config = self.state.config.clone();
        let storage = self.storage;
        let state =
            StorefrontState::with_storage(config, storage.clone() as Arc<dyn SnapshotStorage>)
                .expect("failed to rebuild store graph");
        Self { state, storage }
    }

    pub fn seed_catalog(&self, products: Vec<Product>) {
        self.state.inventory.replace_catalog(products);
    }

    pub fn stock_of(&self, id: Uuid) -> u32 {
        self.state.inventory.get(id).expect("product exists").stock
    }

    pub fn reserved(&self, id: Uuid) -> u32 {
        self.state.cart.reserved_quantity(id)
    }
}

pub fn product(name: &str, price: Decimal, stock: u32) -> Product {
    Product {
        id: Uuid::new_v4(),
        name: name.to_string(),
        description: format!("{name} from the market"),
        image: "📦".to_string(),
        category: "Groceries".to_string(),
        price,
        stock,
        low_stock_threshold: 10,
    }
}
