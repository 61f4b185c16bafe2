//! Background polling for near-real-time order feeds.
//!
//! Each dashboard keeps its feed fresh with a fixed-interval poll. The
//! poller is a plain tokio task bound to its handle: dropping the handle
//! aborts the task, so a poller never outlives the view that started it.
//! Refreshes are awaited in-loop, so a single poller never has two requests
//! in flight; responses racing manual refreshes are ordered by the order
//! store's ticket guard.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use crate::config::AppConfig;
use crate::models::Role;
use crate::stores::OrderStore;

/// Poll interval for a role, from configuration.
pub fn poll_period(config: &AppConfig, role: Role) -> Duration {
    let secs = match role {
        Role::Manager => config.manager_poll_secs,
        Role::Delivery => config.delivery_poll_secs,
        Role::Customer => config.customer_poll_secs,
    };
    Duration::from_secs(secs)
}

pub struct OrderPoller {
    handle: JoinHandle<()>,
    role: Role,
}

impl OrderPoller {
    /// Starts polling immediately, then on every interval tick. Failures are
    /// logged and the poller keeps going; the user re-triggers nothing.
    pub fn start(orders: Arc<OrderStore>, role: Role, period: Duration) -> Self {
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                match orders.refresh(role).await {
                    Ok(count) => debug!(?role, count, "order feed polled"),
                    Err(e) => warn!(?role, error = %e, "order feed poll failed"),
                }
            }
        });
        Self { handle, role }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// Stops the poller now instead of at drop time.
    pub fn stop(self) {
        self.handle.abort();
    }
}

impl Drop for OrderPoller {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiClient;
    use crate::events::EventBus;
    use crate::storage::{MemoryStorage, SnapshotStorage};

    #[test]
    fn poll_periods_follow_config() {
        let cfg = AppConfig::default();
        assert_eq!(poll_period(&cfg, Role::Manager), Duration::from_secs(3));
        assert_eq!(poll_period(&cfg, Role::Delivery), Duration::from_secs(5));
        assert_eq!(poll_period(&cfg, Role::Customer), Duration::from_secs(4));
    }

    #[tokio::test]
    async fn poller_survives_failures_and_aborts_on_drop() {
        // Nothing listens on this port; every poll fails and is logged.
        let api = Arc::new(ApiClient::new("http://127.0.0.1:9", None).unwrap());
        let orders = Arc::new(OrderStore::new(
            api,
            Arc::new(MemoryStorage::new()) as Arc<dyn SnapshotStorage>,
            EventBus::default(),
        ));

        let poller = OrderPoller::start(orders, Role::Manager, Duration::from_millis(10));
        assert_eq!(poller.role(), Role::Manager);
        tokio::time::sleep(Duration::from_millis(35)).await;
        drop(poller);
    }
}
