//! Catalog cache with optimistic local stock bookkeeping.
//!
//! Holds the product set as last fetched from the server and lets the cart
//! reserve/release units locally for instant UI feedback. Local stock is a
//! derived, possibly stale view; the server remains authoritative and the
//! cache is rebuilt wholesale on every fetch.

use std::sync::{Arc, RwLock};

use dashmap::DashMap;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::api::{ApiClient, CreateProductInput, UpdateProductInput};
use crate::errors::StorefrontError;
use crate::events::{EventBus, StoreEvent};
use crate::models::Product;

pub struct InventoryStore {
    api: Arc<ApiClient>,
    events: EventBus,
    products: DashMap<Uuid, Product>,
    last_error: RwLock<Option<String>>,
}

impl InventoryStore {
    pub fn new(api: Arc<ApiClient>, events: EventBus) -> Self {
        Self {
            api,
            events,
            products: DashMap::new(),
            last_error: RwLock::new(None),
        }
    }

    /// Replaces the entire local product set with a fresh server snapshot.
    ///
    /// Any in-flight optimistic adjustments are discarded (no merge). On
    /// failure the previous state is kept and the error flag is raised so
    /// the caller may retry.
    #[instrument(skip(self))]
    pub async fn fetch_catalog(&self) -> Result<usize, StorefrontError> {
        match self.api.list_products().await {
            Ok(products) => {
                let count = products.len();
                self.replace_catalog(products);
                info!(count, "catalog refreshed");
                Ok(count)
            }
            Err(e) => {
                warn!(error = %e, "catalog fetch failed; keeping previous state");
                *self.last_error.write().expect("error flag poisoned") = Some(e.to_string());
                self.events.send_or_log(StoreEvent::CatalogRefreshFailed {
                    message: e.user_message(),
                });
                Err(e)
            }
        }
    }

    /// Installs a catalog snapshot, clearing the error flag. This is the
    /// single entry point for authoritative data, shared by `fetch_catalog`
    /// and tests that seed the store directly.
    pub fn replace_catalog(&self, products: Vec<Product>) {
        self.products.clear();
        let count = products.len();
        for product in products {
            self.products.insert(product.id, product);
        }
        *self.last_error.write().expect("error flag poisoned") = None;
        self.events
            .send_or_log(StoreEvent::CatalogRefreshed { count });
    }

    /// Error from the most recent failed fetch, cleared by the next
    /// successful one.
    pub fn last_error(&self) -> Option<String> {
        self.last_error.read().expect("error flag poisoned").clone()
    }

    pub fn get(&self, id: Uuid) -> Option<Product> {
        self.products.get(&id).map(|entry| entry.value().clone())
    }

    /// Snapshot of the catalog, name-sorted for stable listings.
    pub fn all(&self) -> Vec<Product> {
        let mut products: Vec<Product> =
            self.products.iter().map(|entry| entry.value().clone()).collect();
        products.sort_by(|a, b| a.name.cmp(&b.name));
        products
    }

    pub fn by_category(&self, category: &str) -> Vec<Product> {
        let mut products: Vec<Product> = self
            .products
            .iter()
            .filter(|entry| entry.value().category == category)
            .map(|entry| entry.value().clone())
            .collect();
        products.sort_by(|a, b| a.name.cmp(&b.name));
        products
    }

    pub fn is_in_stock(&self, id: Uuid) -> bool {
        self.products
            .get(&id)
            .map(|entry| entry.stock > 0)
            .unwrap_or(false)
    }

    /// Optimistically reserves `n` units: decrements local stock, floored
    /// at zero. Pure local mutation, no server call.
    pub fn reduce_stock(&self, id: Uuid, n: u32) {
        if let Some(mut entry) = self.products.get_mut(&id) {
            entry.stock = entry.stock.saturating_sub(n);
            let stock = entry.stock;
            drop(entry);
            self.events
                .send_or_log(StoreEvent::StockChanged { product_id: id, stock });
        }
    }

    /// Releases `n` previously reserved units back into local stock.
    pub fn increase_stock(&self, id: Uuid, n: u32) {
        if let Some(mut entry) = self.products.get_mut(&id) {
            entry.stock += n;
            let stock = entry.stock;
            drop(entry);
            self.events
                .send_or_log(StoreEvent::StockChanged { product_id: id, stock });
        }
    }

    /// Manager-privileged authoritative stock write. On success the local
    /// entry is replaced with the server's canonical record; on failure any
    /// optimistic drift is discarded by a full re-fetch and the error is
    /// returned.
    #[instrument(skip(self))]
    pub async fn update_stock(&self, id: Uuid, stock: u32) -> Result<Product, StorefrontError> {
        self.require_auth()?;
        match self.api.patch_stock(id, stock).await {
            Ok(canonical) => {
                let stock = canonical.stock;
                self.products.insert(canonical.id, canonical.clone());
                self.events
                    .send_or_log(StoreEvent::StockChanged { product_id: id, stock });
                Ok(canonical)
            }
            Err(e) => {
                warn!(error = %e, %id, "stock update failed; reverting to server state");
                self.revert_by_refetch().await;
                Err(e)
            }
        }
    }

    /// Manager-privileged product creation.
    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn add_product(
        &self,
        input: &CreateProductInput,
    ) -> Result<Product, StorefrontError> {
        self.require_auth()?;
        match self.api.create_product(input).await {
            Ok(canonical) => {
                self.products.insert(canonical.id, canonical.clone());
                self.events
                    .send_or_log(StoreEvent::ProductCreated(canonical.id));
                Ok(canonical)
            }
            Err(e) => {
                warn!(error = %e, "product creation failed; reverting to server state");
                self.revert_by_refetch().await;
                Err(e)
            }
        }
    }

    /// Manager-privileged product update.
    #[instrument(skip(self, updates))]
    pub async fn update_product(
        &self,
        id: Uuid,
        updates: &UpdateProductInput,
    ) -> Result<Product, StorefrontError> {
        self.require_auth()?;
        match self.api.update_product(id, updates).await {
            Ok(canonical) => {
                self.products.insert(canonical.id, canonical.clone());
                self.events.send_or_log(StoreEvent::ProductUpdated(id));
                Ok(canonical)
            }
            Err(e) => {
                warn!(error = %e, %id, "product update failed; reverting to server state");
                self.revert_by_refetch().await;
                Err(e)
            }
        }
    }

    /// Manager-privileged product removal.
    #[instrument(skip(self))]
    pub async fn delete_product(&self, id: Uuid) -> Result<(), StorefrontError> {
        self.require_auth()?;
        match self.api.delete_product(id).await {
            Ok(()) => {
                self.products.remove(&id);
                self.events.send_or_log(StoreEvent::ProductDeleted(id));
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, %id, "product deletion failed; reverting to server state");
                self.revert_by_refetch().await;
                Err(e)
            }
        }
    }

    fn require_auth(&self) -> Result<(), StorefrontError> {
        if self.api.has_token() {
            Ok(())
        } else {
            Err(StorefrontError::AuthError("Not authenticated".to_string()))
        }
    }

    async fn revert_by_refetch(&self) {
        if let Err(e) = self.fetch_catalog().await {
            warn!(error = %e, "revert re-fetch failed; local state may be stale");
        }
    }
}
