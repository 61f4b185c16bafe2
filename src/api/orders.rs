use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::errors::StorefrontError;
use crate::models::{CartLine, Order, OrderStatus};

use super::ApiClient;

/// Line item of the order-creation payload: just id, quantity, and the
/// price the customer saw.
#[derive(Debug, Clone, Serialize)]
pub struct OrderItemInput {
    pub id: Uuid,
    pub quantity: u32,
    pub price: Decimal,
}

impl From<&CartLine> for OrderItemInput {
    fn from(line: &CartLine) -> Self {
        Self {
            id: line.product_id,
            quantity: line.quantity,
            price: line.price,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub items: Vec<OrderItemInput>,
    pub total: Decimal,
    pub delivery_address: String,
}

#[derive(Debug, Serialize)]
struct StatusPatch {
    status: OrderStatus,
}

impl ApiClient {
    pub async fn create_order(
        &self,
        request: &CreateOrderRequest,
    ) -> Result<Order, StorefrontError> {
        self.post_enveloped("/api/orders", request).await
    }

    pub async fn my_orders(&self) -> Result<Vec<Order>, StorefrontError> {
        self.get_enveloped("/api/orders/my-orders").await
    }

    pub async fn manager_orders(&self) -> Result<Vec<Order>, StorefrontError> {
        self.get_enveloped("/api/orders/manager/all").await
    }

    pub async fn delivery_orders(&self) -> Result<Vec<Order>, StorefrontError> {
        self.get_enveloped("/api/orders/delivery/all").await
    }

    pub async fn set_manager_order_status(
        &self,
        id: Uuid,
        status: OrderStatus,
    ) -> Result<(), StorefrontError> {
        self.patch_ack(
            &format!("/api/orders/manager/{id}/status"),
            &StatusPatch { status },
        )
        .await
    }

    pub async fn set_delivery_order_status(
        &self,
        id: Uuid,
        status: OrderStatus,
    ) -> Result<(), StorefrontError> {
        self.patch_ack(
            &format!("/api/orders/delivery/{id}/status"),
            &StatusPatch { status },
        )
        .await
    }
}
