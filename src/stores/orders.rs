//! Role-scoped order feeds and the tracked "current order" snapshot.
//!
//! Feeds are replaced wholesale on refresh. Because refreshes overlap when a
//! poll fires while a manual refresh is in flight, every refresh draws a
//! ticket from a shared counter and a feed only accepts the response holding
//! the highest ticket seen so far; stale responses are discarded instead of
//! clobbering newer data.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::api::ApiClient;
use crate::errors::StorefrontError;
use crate::events::{EventBus, StoreEvent};
use crate::models::{ManagerAction, Order, OrderStatus, Role, TrackedOrder};
use crate::storage::{keys, SnapshotStorage, SnapshotStorageExt};

struct Feed {
    orders: RwLock<Vec<Order>>,
    applied_ticket: AtomicU64,
}

impl Feed {
    fn new() -> Self {
        Self {
            orders: RwLock::new(Vec::new()),
            applied_ticket: AtomicU64::new(0),
        }
    }

    /// Installs `orders` unless a response with a newer ticket already did.
    /// Returns whether the response was applied.
    fn apply(&self, ticket: u64, orders: Vec<Order>) -> bool {
        let mut guard = self.orders.write().expect("feed lock poisoned");
        if self.applied_ticket.fetch_max(ticket, Ordering::SeqCst) >= ticket {
            debug!(ticket, "discarding stale order feed response");
            return false;
        }
        *guard = orders;
        true
    }

    fn snapshot(&self) -> Vec<Order> {
        self.orders.read().expect("feed lock poisoned").clone()
    }
}

pub struct OrderStore {
    api: Arc<ApiClient>,
    storage: Arc<dyn SnapshotStorage>,
    events: EventBus,
    manager_feed: Feed,
    delivery_feed: Feed,
    customer_feed: Feed,
    current: RwLock<Option<TrackedOrder>>,
    ticket_counter: AtomicU64,
}

impl OrderStore {
    pub fn new(api: Arc<ApiClient>, storage: Arc<dyn SnapshotStorage>, events: EventBus) -> Self {
        Self {
            api,
            storage,
            events,
            manager_feed: Feed::new(),
            delivery_feed: Feed::new(),
            customer_feed: Feed::new(),
            current: RwLock::new(None),
            ticket_counter: AtomicU64::new(0),
        }
    }

    /// Reloads the persisted current-order snapshot, if any.
    pub fn restore(&self) {
        match self.storage.get_json::<TrackedOrder>(keys::CURRENT_ORDER) {
            Ok(Some(order)) => {
                *self.current.write().expect("current order lock poisoned") = Some(order);
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, "current order snapshot unreadable"),
        }
    }

    /// Refreshes the feed for `role`, returning the number of orders now
    /// held. A response that lost the race to a newer refresh reports the
    /// newer feed's size.
    #[instrument(skip(self))]
    pub async fn refresh(&self, role: Role) -> Result<usize, StorefrontError> {
        let ticket = self.ticket_counter.fetch_add(1, Ordering::SeqCst) + 1;
        let (feed, fetched) = match role {
            Role::Manager => (&self.manager_feed, self.api.manager_orders().await?),
            Role::Delivery => (&self.delivery_feed, self.api.delivery_orders().await?),
            Role::Customer => (&self.customer_feed, self.api.my_orders().await?),
        };

        let count = fetched.len();
        if feed.apply(ticket, fetched) {
            self.events
                .send_or_log(StoreEvent::OrdersRefreshed { role, count });
            Ok(count)
        } else {
            Ok(feed.snapshot().len())
        }
    }

    pub fn manager_orders(&self) -> Vec<Order> {
        self.manager_feed.snapshot()
    }

    pub fn delivery_orders(&self) -> Vec<Order> {
        self.delivery_feed.snapshot()
    }

    pub fn customer_orders(&self) -> Vec<Order> {
        self.customer_feed.snapshot()
    }

    /// Orders the delivery dashboard still shows as actionable.
    pub fn active_delivery_orders(&self) -> Vec<Order> {
        self.delivery_feed
            .snapshot()
            .into_iter()
            .filter(|o| o.status.is_active_for_delivery())
            .collect()
    }

    /// Applies a manager triage action, then refreshes the affected feeds.
    /// Feed refresh failures after a successful status write are logged, not
    /// surfaced; the next poll will catch up.
    #[instrument(skip(self))]
    pub async fn apply_manager_action(
        &self,
        order_id: Uuid,
        action: ManagerAction,
    ) -> Result<OrderStatus, StorefrontError> {
        let status = action.target_status();
        self.api.set_manager_order_status(order_id, status).await?;
        info!(%order_id, %status, "manager status update accepted");

        if let Err(e) = self.refresh(Role::Manager).await {
            warn!(error = %e, "manager feed refresh after status update failed");
        }
        if status == OrderStatus::OutForDelivery {
            if let Err(e) = self.refresh(Role::Delivery).await {
                warn!(error = %e, "delivery feed refresh after handoff failed");
            }
        }

        self.update_tracking(order_id, status);
        self.events.send_or_log(StoreEvent::OrderStatusChanged {
            order_id,
            status: status.to_string(),
        });
        Ok(status)
    }

    /// Delivery-partner status update (accepted, out for delivery,
    /// delivered).
    #[instrument(skip(self))]
    pub async fn set_delivery_status(
        &self,
        order_id: Uuid,
        status: OrderStatus,
    ) -> Result<(), StorefrontError> {
        self.api.set_delivery_order_status(order_id, status).await?;
        info!(%order_id, %status, "delivery status update accepted");

        for role in [Role::Delivery, Role::Manager] {
            if let Err(e) = self.refresh(role).await {
                warn!(error = %e, ?role, "feed refresh after status update failed");
            }
        }

        self.update_tracking(order_id, status);
        self.events.send_or_log(StoreEvent::OrderStatusChanged {
            order_id,
            status: status.to_string(),
        });
        Ok(())
    }

    /// Installs the tracked order shown on the tracking page and persists it
    /// so a reload can still render it.
    pub fn set_current_order(&self, order: TrackedOrder) {
        if let Err(e) = self.storage.set_json(keys::CURRENT_ORDER, &order) {
            warn!(error = %e, "failed to persist current order");
        }
        *self.current.write().expect("current order lock poisoned") = Some(order);
    }

    pub fn current_order(&self) -> Option<TrackedOrder> {
        self.current
            .read()
            .expect("current order lock poisoned")
            .clone()
    }

    pub fn clear_current_order(&self) {
        if let Err(e) = self.storage.remove(keys::CURRENT_ORDER) {
            warn!(error = %e, "failed to remove current order snapshot");
        }
        *self.current.write().expect("current order lock poisoned") = None;
    }

    /// Patches the tracked order's status when a status change touches it.
    fn update_tracking(&self, order_id: Uuid, status: OrderStatus) {
        let mut current = self.current.write().expect("current order lock poisoned");
        if let Some(tracked) = current.as_mut() {
            if tracked.order.id == order_id {
                tracked.order.status = status;
                if let Err(e) = self.storage.set_json(keys::CURRENT_ORDER, &*tracked) {
                    warn!(error = %e, "failed to persist tracked order status");
                }
            }
        }
    }
}
