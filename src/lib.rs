//! LocalStore Client Library
//!
//! Client-side storefront engine for the LocalStore delivery platform:
//! catalog caching with optimistic stock reservation, cart state, postcode-
//! gated checkout, and role-scoped order tracking over the LocalStore REST
//! API. All persistence, authentication, and order-state transitions belong
//! to the server; this crate is the stateful glue in front of it.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod api;
pub mod checkout;
pub mod config;
pub mod errors;
pub mod events;
pub mod models;
pub mod polling;
pub mod postcode;
pub mod storage;
pub mod stores;

use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

use crate::api::ApiClient;
use crate::checkout::CheckoutService;
use crate::errors::StorefrontError;
use crate::events::EventBus;
use crate::polling::{poll_period, OrderPoller};
use crate::storage::{FileStorage, SnapshotStorage};
use crate::stores::{CartStore, InventoryStore, OrderStore, ReconcileReport, SessionStore};

/// Composition root: owns one instance of every store, wired together over
/// a shared API client, snapshot storage, and event bus. There are no
/// ambient singletons; everything a view needs arrives through this struct.
pub struct StorefrontState {
    pub config: config::AppConfig,
    pub api: Arc<ApiClient>,
    pub storage: Arc<dyn SnapshotStorage>,
    pub events: EventBus,
    pub inventory: Arc<InventoryStore>,
    pub cart: Arc<CartStore>,
    pub session: Arc<SessionStore>,
    pub orders: Arc<OrderStore>,
    pub checkout: Arc<CheckoutService>,
}

impl StorefrontState {
    /// Builds the full store graph with file-backed snapshot storage under
    /// the configured directory.
    pub fn new(config: config::AppConfig) -> Result<Self, StorefrontError> {
        let storage: Arc<dyn SnapshotStorage> = Arc::new(FileStorage::new(&config.storage_dir)?);
        Self::with_storage(config, storage)
    }

    /// Builds the store graph over caller-supplied storage (tests, embedded
    /// use).
    pub fn with_storage(
        config: config::AppConfig,
        storage: Arc<dyn SnapshotStorage>,
    ) -> Result<Self, StorefrontError> {
        let api = Arc::new(ApiClient::new(
            &config.api_base_url,
            config.request_timeout_secs.map(Duration::from_secs),
        )?);
        let events = EventBus::default();

        let inventory = Arc::new(InventoryStore::new(api.clone(), events.clone()));
        let cart = Arc::new(CartStore::restore(
            inventory.clone(),
            storage.clone(),
            events.clone(),
        ));
        let session = Arc::new(SessionStore::new(
            api.clone(),
            storage.clone(),
            events.clone(),
        ));
        let orders = Arc::new(OrderStore::new(
            api.clone(),
            storage.clone(),
            events.clone(),
        ));
        let checkout = Arc::new(CheckoutService::new(
            api.clone(),
            cart.clone(),
            orders.clone(),
            storage.clone(),
            events.clone(),
            &config,
        ));

        Ok(Self {
            config,
            api,
            storage,
            events,
            inventory,
            cart,
            session,
            orders,
            checkout,
        })
    }

    /// Session start-up: restores persisted session and tracked order,
    /// fetches the catalog, and re-validates the restored cart against the
    /// fresh stock. A failed fetch leaves the cart unreconciled (no
    /// reservations applied) and surfaces the error; the caller may retry
    /// by calling this again.
    pub async fn bootstrap(&self) -> Result<ReconcileReport, StorefrontError> {
        self.session.restore();
        self.orders.restore();
        self.inventory.fetch_catalog().await?;
        Ok(self.cart.reconcile())
    }

    /// Starts the order-feed poller appropriate to the signed-in role, or
    /// none when signed out.
    pub fn start_order_polling(&self) -> Option<OrderPoller> {
        let role = match self.session.role() {
            Some(role) => role,
            None => {
                warn!("no session role; not starting order polling");
                return None;
            }
        };
        Some(OrderPoller::start(
            self.orders.clone(),
            role,
            poll_period(&self.config, role),
        ))
    }
}
