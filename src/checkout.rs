//! Checkout: postcode-gated order submission.
//!
//! The flow is atomic from the shopper's perspective: validation and the
//! availability rule run before anything is sent, and the cart is only
//! cleared after the server has accepted the order. Any failure leaves the
//! cart exactly as it was.

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{info, instrument, warn};

use crate::api::{ApiClient, CreateOrderRequest, OrderItemInput};
use crate::config::AppConfig;
use crate::errors::StorefrontError;
use crate::events::{EventBus, StoreEvent};
use crate::models::TrackedOrder;
use crate::postcode::{parse_postcode, DeliveryAreas, Postcode};
use crate::storage::{keys, SnapshotStorage};
use crate::stores::{CartStore, OrderStore};

/// Price breakdown shown on the cart panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckoutQuote {
    pub subtotal: Decimal,
    pub delivery_fee: Decimal,
    pub total: Decimal,
}

pub struct CheckoutService {
    api: Arc<ApiClient>,
    cart: Arc<CartStore>,
    orders: Arc<OrderStore>,
    storage: Arc<dyn SnapshotStorage>,
    events: EventBus,
    delivery_fee: Decimal,
    delivery_areas: DeliveryAreas,
}

impl CheckoutService {
    pub fn new(
        api: Arc<ApiClient>,
        cart: Arc<CartStore>,
        orders: Arc<OrderStore>,
        storage: Arc<dyn SnapshotStorage>,
        events: EventBus,
        config: &AppConfig,
    ) -> Self {
        Self {
            api,
            cart,
            orders,
            storage,
            events,
            delivery_fee: config.delivery_fee,
            delivery_areas: DeliveryAreas::new(config.delivery_areas.iter().cloned()),
        }
    }

    /// Current totals: subtotal plus the flat delivery fee, rounded to two
    /// decimal places.
    pub fn quote(&self) -> CheckoutQuote {
        let subtotal = self.cart.subtotal();
        let total = (subtotal + self.delivery_fee).round_dp(2);
        CheckoutQuote {
            subtotal,
            delivery_fee: self.delivery_fee,
            total,
        }
    }

    /// Normalizes and validates the postcode, then runs the delivery-area
    /// rule. The accepted postcode is remembered for the next session.
    /// Validation failures abort before the availability check runs.
    #[instrument(skip(self))]
    pub fn check_delivery(&self, raw_postcode: &str) -> Result<Postcode, StorefrontError> {
        let postcode = parse_postcode(raw_postcode)?;
        self.delivery_areas.check(&postcode)?;

        if let Err(e) = self.storage.set(keys::DELIVERY_POSTCODE, postcode.as_str()) {
            warn!(error = %e, "failed to remember delivery postcode");
        }
        Ok(postcode)
    }

    /// The postcode remembered from a previous availability check, if any.
    pub fn remembered_postcode(&self) -> Option<String> {
        self.storage.get(keys::DELIVERY_POSTCODE).ok().flatten()
    }

    /// Submits the cart as an order delivered to `raw_postcode`.
    ///
    /// On success the server's canonical order record is merged with the
    /// client-only display fields, installed as the tracked current order,
    /// and the cart is cleared (refunding its reservations back into the
    /// optimistic stock, which the next catalog fetch overwrites anyway).
    /// On any failure the cart is left untouched.
    #[instrument(skip(self))]
    pub async fn place_order(&self, raw_postcode: &str) -> Result<TrackedOrder, StorefrontError> {
        let postcode = self.check_delivery(raw_postcode)?;

        let lines = self.cart.lines();
        if lines.is_empty() {
            return Err(StorefrontError::InvalidOperation(
                "Cart is empty".to_string(),
            ));
        }

        let quote = self.quote();
        let request = CreateOrderRequest {
            items: lines.iter().map(OrderItemInput::from).collect(),
            total: quote.total,
            delivery_address: postcode.as_str().to_string(),
        };

        let order = self.api.create_order(&request).await?;
        let order_id = order.id;
        let tracked = TrackedOrder::for_delivery(order);

        self.orders.set_current_order(tracked.clone());
        self.cart.clear_cart();

        info!(%order_id, total = %quote.total, "order placed");
        self.events.send_or_log(StoreEvent::OrderPlaced(order_id));
        Ok(tracked)
    }
}
