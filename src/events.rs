use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::debug;
use uuid::Uuid;

use crate::models::Role;

/// Events broadcast by the stores so any consumer (UI layer, CLI, tests)
/// can re-render from fresh snapshots after a mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StoreEvent {
    // Catalog events
    CatalogRefreshed { count: usize },
    CatalogRefreshFailed { message: String },
    ProductCreated(Uuid),
    ProductUpdated(Uuid),
    ProductDeleted(Uuid),
    StockChanged { product_id: Uuid, stock: u32 },

    // Cart events
    CartLineAdded { product_id: Uuid, quantity: u32 },
    CartLineUpdated { product_id: Uuid, quantity: u32 },
    CartLineRemoved { product_id: Uuid },
    CartCleared,
    CartReconciled { kept: usize, dropped: usize },

    // Checkout / order events
    OrderPlaced(Uuid),
    OrdersRefreshed { role: Role, count: usize },
    OrderStatusChanged { order_id: Uuid, status: String },

    // Session events
    SessionStarted { role: Role },
    SessionEnded,
}

/// Subscribe/notify fan-out for [`StoreEvent`]s.
///
/// Thin wrapper over a tokio broadcast channel: stores call
/// [`EventBus::send_or_log`] after every observable mutation and consumers
/// hold a receiver from [`EventBus::subscribe`]. A send with no live
/// subscribers is normal (headless use, tests) and is only logged at debug.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<StoreEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.sender.subscribe()
    }

    /// Broadcasts an event, logging instead of failing when nobody listens.
    pub fn send_or_log(&self, event: StoreEvent) {
        if self.sender.send(event.clone()).is_err() {
            debug!(?event, "no event subscribers");
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
