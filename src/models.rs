use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Roles the platform distinguishes. The role travels with login and decides
/// which order feed a session polls.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    Customer,
    Manager,
    Delivery,
}

/// Server-defined order status vocabulary.
///
/// The server owns all transitions; the client only maps statuses to display
/// labels and coarse predicates. Anything the server adds later lands in
/// `Unknown` instead of breaking deserialization.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", from = "String")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,
    New,
    Confirmed,
    Preparing,
    Ready,
    Assigned,
    OutForDelivery,
    Delivered,
    Rejected,
    Accepted,
    Unknown,
}

impl From<String> for OrderStatus {
    fn from(raw: String) -> Self {
        // Status casing is not guaranteed on the wire; match uppercased.
        match raw.trim().to_uppercase().as_str() {
            "PENDING" => Self::Pending,
            "NEW" => Self::New,
            "CONFIRMED" => Self::Confirmed,
            "PREPARING" => Self::Preparing,
            "READY" => Self::Ready,
            "ASSIGNED" => Self::Assigned,
            "OUT_FOR_DELIVERY" => Self::OutForDelivery,
            "DELIVERED" => Self::Delivered,
            "REJECTED" => Self::Rejected,
            "ACCEPTED" => Self::Accepted,
            _ => Self::Unknown,
        }
    }
}

impl OrderStatus {
    /// Human label shown on dashboards and the tracking page.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Pending | Self::New => "Order received",
            Self::Confirmed => "Confirmed",
            Self::Preparing => "Being prepared",
            Self::Ready => "Ready",
            Self::Assigned => "Assigned to driver",
            Self::OutForDelivery => "Out for delivery",
            Self::Delivered => "Delivered",
            Self::Rejected => "Rejected",
            Self::Accepted => "Accepted",
            Self::Unknown => "Unknown",
        }
    }

    /// Orders a delivery partner still has work to do on.
    pub fn is_active_for_delivery(&self) -> bool {
        matches!(
            self,
            Self::Assigned | Self::Accepted | Self::OutForDelivery | Self::Ready
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Delivered | Self::Rejected)
    }
}

/// Triage actions available on the manager dashboard, each mapping onto the
/// status the server expects for that transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ManagerAction {
    Accept,
    Reject,
    MarkReady,
    AssignDelivery,
}

impl ManagerAction {
    pub fn target_status(&self) -> OrderStatus {
        match self {
            Self::Accept => OrderStatus::Preparing,
            Self::Reject => OrderStatus::Rejected,
            Self::MarkReady => OrderStatus::Ready,
            Self::AssignDelivery => OrderStatus::OutForDelivery,
        }
    }
}

/// Catalog entry as last synced from the server.
///
/// `stock` is the authoritative count at fetch time and is mutated locally
/// (optimistically) by cart operations until the next full fetch.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_image")]
    pub image: String,
    pub category: String,
    pub price: Decimal,
    pub stock: u32,
    #[serde(default = "default_low_stock_threshold")]
    pub low_stock_threshold: u32,
}

fn default_image() -> String {
    "📦".to_string()
}

fn default_low_stock_threshold() -> u32 {
    10
}

impl Product {
    /// Advisory only, drives the dashboard low-stock badge.
    pub fn is_low_stock(&self) -> bool {
        self.stock <= self.low_stock_threshold
    }
}

/// One cart line. Name, price, and image are denormalized copies taken at
/// add time; they may drift from the catalog if the product is edited later,
/// which is accepted behaviour. Quantity is always >= 1; a line that would
/// reach zero is removed instead.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub product_id: Uuid,
    pub name: String,
    pub price: Decimal,
    pub image: String,
    pub quantity: u32,
}

impl CartLine {
    pub fn for_product(product: &Product) -> Self {
        Self {
            product_id: product.id,
            name: product.name.clone(),
            price: product.price,
            image: product.image.clone(),
            quantity: 1,
        }
    }

    pub fn line_total(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

/// Item of a placed order, as echoed back by the server.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: Uuid,
    #[serde(default)]
    pub name: String,
    pub quantity: u32,
    pub price: Decimal,
    #[serde(default)]
    pub image: Option<String>,
}

/// Canonical order record as returned by the server.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: Uuid,
    #[serde(default)]
    pub order_number: Option<String>,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub items: Vec<OrderItem>,
    pub total: Decimal,
    pub status: OrderStatus,
    #[serde(default)]
    pub delivery_address: String,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryType {
    Delivery,
    Collection,
}

/// The server's order record merged with client-only display fields, kept
/// for the tracking page and persisted under the `currentOrder` key.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackedOrder {
    #[serde(flatten)]
    pub order: Order,
    pub estimated_delivery_time: String,
    pub order_time: DateTime<Utc>,
    pub delivery_type: DeliveryType,
}

impl TrackedOrder {
    /// Estimated window shown immediately after checkout.
    pub const DEFAULT_ESTIMATE: &'static str = "30-45";

    pub fn for_delivery(order: Order) -> Self {
        Self {
            order,
            estimated_delivery_time: Self::DEFAULT_ESTIMATE.to_string(),
            order_time: Utc::now(),
            delivery_type: DeliveryType::Delivery,
        }
    }
}

/// Account record as stored alongside the session token.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(default)]
    pub id: Option<Uuid>,
    pub name: String,
    pub email: String,
    pub role: Role,
    #[serde(default)]
    pub address: Option<String>,
}
