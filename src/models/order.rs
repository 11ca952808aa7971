use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use super::ServiceType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "order_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    MeasurementsFinalized,
    FabricCutting,
    Stitching,
    Finishing,
    QualityCheck,
    Shipped,
    Delivered,
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Order {
    pub id: Uuid,
    pub order_number: String,
    pub user_id: Uuid,
    pub status: OrderStatus,
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub shipping: Decimal,
    pub total: Decimal,
    pub shipping_address_id: Uuid,
    pub billing_address_id: Option<Uuid>,
    pub tracking_number: Option<String>,
    pub notes: Option<String>,
    pub shipped_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub fabric_id: Option<Uuid>,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub line_total: Decimal,
    pub service_type: ServiceType,
    pub measurements: Option<sqlx::types::Json<serde_json::Value>>,
    pub consultation_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

// Insert-only; there is no update or delete path for these rows.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct OrderStatusHistory {
    pub id: Uuid,
    pub order_id: Uuid,
    pub status: OrderStatus,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl OrderStatusHistory {
    /// Note on the row written with every new order.
    pub const OPENING_NOTE: &'static str = "Order placed";
}

/// Order line priced at checkout, before it has been written.
#[derive(Debug, Clone)]
pub struct NewOrderItem {
    pub product_id: Uuid,
    pub fabric_id: Option<Uuid>,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub line_total: Decimal,
    pub service_type: ServiceType,
    pub measurements: Option<serde_json::Value>,
    pub consultation_id: Option<Uuid>,
}

#[derive(Debug, Clone)]
pub struct NewOrder {
    pub order_number: String,
    pub user_id: Uuid,
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub shipping: Decimal,
    pub total: Decimal,
    pub shipping_address_id: Uuid,
    pub billing_address_id: Option<Uuid>,
    pub notes: Option<String>,
    pub items: Vec<NewOrderItem>,
}

#[derive(Debug, Serialize)]
pub struct OrderSummary {
    pub id: Uuid,
    pub order_number: String,
    pub status: OrderStatus,
    pub status_label: &'static str,
    pub progress: u8,
    pub total: Decimal,
    pub total_display: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub status_label: &'static str,
    pub progress: u8,
    pub total_display: String,
    pub estimated_delivery: DateTime<Utc>,
    pub items: Vec<OrderItem>,
    pub history: Vec<OrderStatusHistory>,
}

/// Everything written when an order changes status.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderTransition {
    pub status: OrderStatus,
    pub note: Option<String>,
    pub tracking_number: Option<String>,
    pub shipped_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
}

impl OrderTransition {
    /// The order as it reads after this transition. Tracking number and
    /// timestamps are only ever filled in, never cleared.
    pub fn apply_to(&self, order: &Order, now: DateTime<Utc>) -> Order {
        Order {
            status: self.status,
            tracking_number: self.tracking_number.clone().or_else(|| order.tracking_number.clone()),
            shipped_at: self.shipped_at.or(order.shipped_at),
            delivered_at: self.delivered_at.or(order.delivered_at),
            updated_at: now,
            ..order.clone()
        }
    }
}
