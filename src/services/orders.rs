use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::{
    config::Config,
    database::Database,
    delivery,
    error::{AppError, AppResult, FieldError},
    middleware::CurrentUser,
    models::{
        Fabric, NewOrder, NewOrderItem, Order, OrderDetail, OrderStatus, OrderStatusHistory, OrderSummary,
        OrderTransition, Product,
    },
    notifications::Recipient,
    pricing,
    repository::{addresses, catalog, consultations, orders, users},
    state::AppState,
    validation::{OrderInput, OrderItemInput},
};

#[derive(Debug, Clone, PartialEq)]
pub struct PricingPolicy {
    pub tax_rate_percent: Decimal,
    pub shipping_flat: Decimal,
    pub free_shipping_threshold: Option<Decimal>,
}

impl From<&Config> for PricingPolicy {
    fn from(config: &Config) -> Self {
        Self {
            tax_rate_percent: config.tax_rate_percent,
            shipping_flat: config.shipping_flat,
            free_shipping_threshold: config.free_shipping_threshold,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderTotals {
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub shipping: Decimal,
    pub total: Decimal,
}

pub fn compute_totals(subtotal: Decimal, policy: &PricingPolicy) -> OrderTotals {
    let tax = (subtotal * policy.tax_rate_percent / Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);

    let shipping = match policy.free_shipping_threshold {
        Some(threshold) if subtotal >= threshold => Decimal::ZERO,
        _ => policy.shipping_flat,
    };

    OrderTotals {
        subtotal,
        tax,
        shipping,
        total: subtotal + tax + shipping,
    }
}

/// Locks the price of one line. The unit price is the product price plus
/// the fabric cost; the service surcharge is applied in the line total.
pub fn price_line(product: &Product, fabric: Option<&Fabric>, item: &OrderItemInput) -> NewOrderItem {
    let unit_price = product.base_price + fabric.map(Fabric::cost).unwrap_or_default();
    let quantity = u32::try_from(item.quantity.max(1)).unwrap_or(1);

    NewOrderItem {
        product_id: product.id,
        fabric_id: fabric.map(|fabric| fabric.id),
        quantity: item.quantity,
        unit_price,
        line_total: pricing::line_total(unit_price, item.service_type, quantity),
        service_type: item.service_type,
        measurements: item
            .measurements
            .as_ref()
            .and_then(|values| serde_json::to_value(values).ok()),
        consultation_id: item.consultation_id,
    }
}

pub fn generate_order_number(now: DateTime<Utc>) -> String {
    let suffix: String = Uuid::new_v4().simple().to_string().chars().take(6).collect();
    format!("ORD-{}-{}", now.format("%Y%m%d"), suffix.to_uppercase())
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    #[error("order is already {0}")]
    Unchanged(OrderStatus),

    #[error("order is {0} and can no longer change")]
    Terminal(OrderStatus),
}

impl From<TransitionError> for AppError {
    fn from(err: TransitionError) -> Self {
        AppError::Conflict(err.to_string())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatusChange {
    pub status: OrderStatus,
    pub note: Option<String>,
    pub tracking_number: Option<String>,
}

/// Checks a requested status change against the current status and works
/// out the timestamps it stamps.
pub fn plan_transition(
    current: OrderStatus,
    change: &StatusChange,
    now: DateTime<Utc>,
) -> Result<OrderTransition, TransitionError> {
    if current.is_terminal() {
        return Err(TransitionError::Terminal(current));
    }
    if current == change.status {
        return Err(TransitionError::Unchanged(current));
    }

    let note = change
        .note
        .as_deref()
        .map(str::trim)
        .filter(|note| !note.is_empty())
        .map(str::to_string);
    let tracking_number = change
        .tracking_number
        .as_deref()
        .map(str::trim)
        .filter(|tracking| !tracking.is_empty())
        .map(str::to_string);

    Ok(OrderTransition {
        status: change.status,
        note,
        tracking_number,
        shipped_at: (change.status == OrderStatus::Shipped).then_some(now),
        delivered_at: (change.status == OrderStatus::Delivered).then_some(now),
    })
}

/// Where orders and their status history are written.
#[async_trait]
pub trait OrderLedger: Send + Sync {
    /// Stores a new order together with its opening PENDING history row.
    async fn open(&self, order: &NewOrder) -> Result<Order, sqlx::Error>;

    async fn find(&self, order_id: Uuid) -> Result<Option<Order>, sqlx::Error>;

    /// Stores `updated` and appends exactly one history row for its status.
    async fn record(&self, updated: &Order, note: Option<&str>) -> Result<Order, sqlx::Error>;

    async fn history(&self, order_id: Uuid) -> Result<Vec<OrderStatusHistory>, sqlx::Error>;
}

#[async_trait]
impl OrderLedger for Database {
    async fn open(&self, order: &NewOrder) -> Result<Order, sqlx::Error> {
        orders::create(self, order).await
    }

    async fn find(&self, order_id: Uuid) -> Result<Option<Order>, sqlx::Error> {
        orders::find_by_id(self, order_id).await
    }

    async fn record(&self, updated: &Order, note: Option<&str>) -> Result<Order, sqlx::Error> {
        orders::apply_transition(self, updated, note).await
    }

    async fn history(&self, order_id: Uuid) -> Result<Vec<OrderStatusHistory>, sqlx::Error> {
        orders::history_for(self, order_id).await
    }
}

#[derive(Debug, Clone)]
pub struct RecordedTransition {
    pub previous: OrderStatus,
    pub order: Order,
    pub transition: OrderTransition,
}

/// Checks the change against the stored order, stamps it and writes it
/// with its history row.
pub async fn record_transition<L>(
    ledger: &L,
    order_id: Uuid,
    change: &StatusChange,
    now: DateTime<Utc>,
) -> AppResult<RecordedTransition>
where
    L: OrderLedger + ?Sized,
{
    let order = ledger.find(order_id).await?.ok_or(AppError::NotFound("order"))?;

    let transition = plan_transition(order.status, change, now)?;
    let updated = ledger
        .record(&transition.apply_to(&order, now), transition.note.as_deref())
        .await?;

    Ok(RecordedTransition {
        previous: order.status,
        order: updated,
        transition,
    })
}

pub fn summarize(order: &Order) -> OrderSummary {
    OrderSummary {
        id: order.id,
        order_number: order.order_number.clone(),
        status: order.status,
        status_label: order.status.label(),
        progress: order.status.progress(),
        total: order.total,
        total_display: pricing::format_currency(order.total),
        created_at: order.created_at,
    }
}

pub async fn order_detail(state: &AppState, order: Order) -> AppResult<OrderDetail> {
    let items = orders::items_for(&state.db, order.id).await?;
    let history = OrderLedger::history(&state.db, order.id).await?;
    let estimated_delivery =
        delivery::estimate_order_delivery(items.iter().map(|item| item.service_type), order.created_at);

    Ok(OrderDetail {
        status_label: order.status.label(),
        progress: order.status.progress(),
        total_display: pricing::format_currency(order.total),
        estimated_delivery,
        items,
        history,
        order,
    })
}

async fn price_items(state: &AppState, user: &CurrentUser, input: &OrderInput) -> AppResult<Vec<NewOrderItem>> {
    let mut priced = Vec::with_capacity(input.items.len());
    let mut errors = Vec::new();

    for (index, item) in input.items.iter().enumerate() {
        let field = |name: &str| format!("items[{}].{}", index, name);

        let product = match item.product_id {
            Some(product_id) => catalog::find_product(&state.db, product_id)
                .await?
                .filter(|product| product.is_active),
            None => None,
        };
        let Some(product) = product else {
            errors.push(FieldError::new(field("product_id"), "Product is not available"));
            continue;
        };

        let fabric = match item.fabric_id {
            Some(fabric_id) => match catalog::find_fabric(&state.db, fabric_id).await? {
                Some(fabric) if fabric.in_stock => Some(fabric),
                _ => {
                    errors.push(FieldError::new(field("fabric_id"), "Fabric is not available"));
                    continue;
                }
            },
            None => None,
        };

        if let Some(consultation_id) = item.consultation_id {
            let owned = consultations::find_by_id(&state.db, consultation_id)
                .await?
                .is_some_and(|consultation| consultation.user_id == user.id);
            if !owned {
                errors.push(FieldError::new(field("consultation_id"), "Consultation not found"));
                continue;
            }
        }

        priced.push(price_line(&product, fabric.as_ref(), item));
    }

    if errors.is_empty() {
        Ok(priced)
    } else {
        Err(AppError::Validation(errors))
    }
}

pub async fn place_order(state: &AppState, user: &CurrentUser, input: OrderInput) -> AppResult<Order> {
    input.validate()?;

    let shipping_address_id = input
        .shipping_address_id
        .ok_or_else(|| AppError::invalid("shipping_address_id", "Shipping address is required"))?;
    if addresses::find_for_user(&state.db, shipping_address_id, user.id).await?.is_none() {
        return Err(AppError::invalid("shipping_address_id", "Address not found"));
    }
    if let Some(billing_address_id) = input.billing_address_id {
        if addresses::find_for_user(&state.db, billing_address_id, user.id).await?.is_none() {
            return Err(AppError::invalid("billing_address_id", "Address not found"));
        }
    }

    let items = price_items(state, user, &input).await?;
    let subtotal: Decimal = items.iter().map(|item| item.line_total).sum();
    let totals = compute_totals(subtotal, &PricingPolicy::from(state.config.as_ref()));

    let new_order = NewOrder {
        order_number: generate_order_number(Utc::now()),
        user_id: user.id,
        subtotal: totals.subtotal,
        tax: totals.tax,
        shipping: totals.shipping,
        total: totals.total,
        shipping_address_id,
        billing_address_id: input.billing_address_id,
        notes: input.notes.clone(),
        items,
    };

    let order = OrderLedger::open(&state.db, &new_order).await?;
    log::info!("Order {} placed by {} for {}", order.order_number, user.email, order.total);

    state
        .notifier
        .order_status_changed(&user.recipient(), &order, order.status, None);

    Ok(order)
}

/// Applies an admin status change and notifies the customer. The
/// notification is best-effort; the change is already committed.
pub async fn change_status(state: &AppState, order_id: Uuid, change: StatusChange) -> AppResult<Order> {
    let RecordedTransition {
        previous,
        order: updated,
        transition,
    } = record_transition(&state.db, order_id, &change, Utc::now()).await?;
    log::info!("Order {} moved from {} to {}", updated.order_number, previous, updated.status);

    match users::find_by_id(&state.db, updated.user_id).await {
        Ok(Some(customer)) => state.notifier.order_status_changed(
            &Recipient::from(&customer),
            &updated,
            updated.status,
            transition.note.as_deref(),
        ),
        Ok(None) => log::warn!("Order {} has no customer to notify", updated.order_number),
        Err(e) => log::error!("Failed to load customer for order {}: {}", updated.order_number, e),
    }

    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ServiceType;
    use chrono::TimeZone;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Keeps orders and history rows in memory, writing them the way the
    /// Postgres ledger does.
    #[derive(Default)]
    struct MemoryLedger {
        orders: Mutex<HashMap<Uuid, Order>>,
        history: Mutex<Vec<OrderStatusHistory>>,
    }

    impl MemoryLedger {
        fn append(&self, order_id: Uuid, status: OrderStatus, note: Option<&str>) {
            self.history.lock().unwrap().push(OrderStatusHistory {
                id: Uuid::new_v4(),
                order_id,
                status,
                note: note.map(str::to_string),
                created_at: Utc::now(),
            });
        }
    }

    #[async_trait]
    impl OrderLedger for MemoryLedger {
        async fn open(&self, order: &NewOrder) -> Result<Order, sqlx::Error> {
            let now = Utc::now();
            let created = Order {
                id: Uuid::new_v4(),
                order_number: order.order_number.clone(),
                user_id: order.user_id,
                status: OrderStatus::Pending,
                subtotal: order.subtotal,
                tax: order.tax,
                shipping: order.shipping,
                total: order.total,
                shipping_address_id: order.shipping_address_id,
                billing_address_id: order.billing_address_id,
                tracking_number: None,
                notes: order.notes.clone(),
                shipped_at: None,
                delivered_at: None,
                created_at: now,
                updated_at: now,
            };
            self.orders.lock().unwrap().insert(created.id, created.clone());
            self.append(created.id, OrderStatus::Pending, Some(OrderStatusHistory::OPENING_NOTE));
            Ok(created)
        }

        async fn find(&self, order_id: Uuid) -> Result<Option<Order>, sqlx::Error> {
            Ok(self.orders.lock().unwrap().get(&order_id).cloned())
        }

        async fn record(&self, updated: &Order, note: Option<&str>) -> Result<Order, sqlx::Error> {
            let mut orders = self.orders.lock().unwrap();
            if !orders.contains_key(&updated.id) {
                return Err(sqlx::Error::RowNotFound);
            }
            orders.insert(updated.id, updated.clone());
            drop(orders);
            self.append(updated.id, updated.status, note);
            Ok(updated.clone())
        }

        async fn history(&self, order_id: Uuid) -> Result<Vec<OrderStatusHistory>, sqlx::Error> {
            Ok(self
                .history
                .lock()
                .unwrap()
                .iter()
                .filter(|row| row.order_id == order_id)
                .cloned()
                .collect())
        }
    }

    fn new_order() -> NewOrder {
        let totals = compute_totals(
            Decimal::from(50_000),
            &PricingPolicy {
                tax_rate_percent: Decimal::ZERO,
                shipping_flat: Decimal::ZERO,
                free_shipping_threshold: None,
            },
        );
        NewOrder {
            order_number: generate_order_number(Utc::now()),
            user_id: Uuid::new_v4(),
            subtotal: totals.subtotal,
            tax: totals.tax,
            shipping: totals.shipping,
            total: totals.total,
            shipping_address_id: Uuid::new_v4(),
            billing_address_id: None,
            notes: None,
            items: Vec::new(),
        }
    }

    fn product(price: i64) -> Product {
        Product {
            id: Uuid::new_v4(),
            collection_id: None,
            name: "Bandhgala".to_string(),
            slug: "bandhgala".to_string(),
            description: None,
            base_price: Decimal::from(price),
            images: sqlx::types::Json(Vec::new()),
            is_customizable: true,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn item(quantity: i32, service_type: ServiceType) -> OrderItemInput {
        OrderItemInput {
            product_id: Some(Uuid::new_v4()),
            quantity,
            service_type,
            fabric_id: None,
            measurements: None,
            consultation_id: None,
        }
    }

    fn change(status: OrderStatus) -> StatusChange {
        StatusChange {
            status,
            note: None,
            tracking_number: None,
        }
    }

    #[test]
    fn totals_add_tax_and_shipping() {
        let policy = PricingPolicy {
            tax_rate_percent: Decimal::from(12),
            shipping_flat: Decimal::from(200),
            free_shipping_threshold: None,
        };
        let totals = compute_totals(Decimal::from(25_000), &policy);

        assert_eq!(totals.tax, Decimal::from(3_000));
        assert_eq!(totals.shipping, Decimal::from(200));
        assert_eq!(totals.total, totals.subtotal + totals.tax + totals.shipping);
    }

    #[test]
    fn shipping_is_waived_at_threshold() {
        let policy = PricingPolicy {
            tax_rate_percent: Decimal::ZERO,
            shipping_flat: Decimal::from(200),
            free_shipping_threshold: Some(Decimal::from(10_000)),
        };

        assert_eq!(compute_totals(Decimal::from(10_000), &policy).shipping, Decimal::ZERO);
        assert_eq!(compute_totals(Decimal::from(9_999), &policy).shipping, Decimal::from(200));
    }

    #[test]
    fn tax_rounds_to_paise() {
        let policy = PricingPolicy {
            tax_rate_percent: Decimal::new(125, 1),
            shipping_flat: Decimal::ZERO,
            free_shipping_threshold: None,
        };
        let totals = compute_totals(Decimal::new(9999, 2), &policy);
        assert_eq!(totals.tax, Decimal::new(1250, 2));
    }

    #[test]
    fn line_price_includes_fabric_and_surcharge() {
        let product = product(25_000);
        let fabric = Fabric {
            id: Uuid::new_v4(),
            name: "Linen".to_string(),
            material: "linen".to_string(),
            color: None,
            price_per_meter: Decimal::from(800),
            meters_required: Decimal::new(25, 1),
            in_stock: true,
            image: None,
        };

        let line = price_line(&product, Some(&fabric), &item(2, ServiceType::HomeVisit));

        assert_eq!(line.unit_price, Decimal::from(27_000));
        assert_eq!(line.line_total, Decimal::from(56_000));
        assert_eq!(line.fabric_id, Some(fabric.id));
    }

    #[test]
    fn fractional_fabric_cost_keeps_line_consistent() {
        let fabric = Fabric {
            id: Uuid::new_v4(),
            name: "Silk blend".to_string(),
            material: "silk".to_string(),
            color: None,
            price_per_meter: Decimal::new(79_999, 2),
            meters_required: Decimal::new(275, 2),
            in_stock: true,
            image: None,
        };

        let line = price_line(&product(25_000), Some(&fabric), &item(3, ServiceType::DirectBuy));

        assert_eq!(fabric.cost(), Decimal::new(219_997, 2));
        assert_eq!(line.unit_price, Decimal::new(2_719_997, 2));
        assert_eq!(line.unit_price.round_dp(2), line.unit_price);
        assert_eq!(line.line_total, line.unit_price * Decimal::from(3));
        assert_eq!(line.line_total, Decimal::new(8_159_991, 2));
    }

    #[test]
    fn direct_buy_line_is_base_times_quantity() {
        let line = price_line(&product(25_000), None, &item(2, ServiceType::DirectBuy));
        assert_eq!(line.line_total, Decimal::from(50_000));
    }

    #[test]
    fn order_numbers_carry_the_date() {
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 10, 0, 0).unwrap();
        let number = generate_order_number(now);

        assert!(number.starts_with("ORD-20250101-"));
        assert_eq!(number.len(), "ORD-20250101-".len() + 6);
        assert_ne!(number, generate_order_number(now));
    }

    #[test]
    fn shipping_stamps_shipped_at() {
        let now = Utc.with_ymd_and_hms(2025, 2, 1, 9, 0, 0).unwrap();
        let mut request = change(OrderStatus::Shipped);
        request.tracking_number = Some(" DLV123 ".to_string());

        let transition = plan_transition(OrderStatus::QualityCheck, &request, now).unwrap();

        assert_eq!(transition.shipped_at, Some(now));
        assert_eq!(transition.delivered_at, None);
        assert_eq!(transition.tracking_number.as_deref(), Some("DLV123"));
    }

    #[test]
    fn delivery_stamps_delivered_at() {
        let now = Utc::now();
        let transition = plan_transition(OrderStatus::Shipped, &change(OrderStatus::Delivered), now).unwrap();
        assert_eq!(transition.delivered_at, Some(now));
    }

    #[test]
    fn terminal_orders_cannot_move() {
        let err = plan_transition(OrderStatus::Cancelled, &change(OrderStatus::Confirmed), Utc::now()).unwrap_err();
        assert_eq!(err, TransitionError::Terminal(OrderStatus::Cancelled));

        let err = plan_transition(OrderStatus::Completed, &change(OrderStatus::Shipped), Utc::now()).unwrap_err();
        assert_eq!(err, TransitionError::Terminal(OrderStatus::Completed));
    }

    #[test]
    fn same_status_is_rejected() {
        let err = plan_transition(OrderStatus::Stitching, &change(OrderStatus::Stitching), Utc::now()).unwrap_err();
        assert_eq!(err, TransitionError::Unchanged(OrderStatus::Stitching));
    }

    #[test]
    fn blank_notes_are_dropped() {
        let mut request = change(OrderStatus::Confirmed);
        request.note = Some("   ".to_string());
        let transition = plan_transition(OrderStatus::Pending, &request, Utc::now()).unwrap();
        assert_eq!(transition.note, None);
    }

    #[tokio::test]
    async fn new_orders_open_with_one_pending_row() {
        let ledger = MemoryLedger::default();
        let order = ledger.open(&new_order()).await.unwrap();

        let history = ledger.history(order.id).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].status, OrderStatus::Pending);
        assert_eq!(history[0].note.as_deref(), Some(OrderStatusHistory::OPENING_NOTE));
    }

    #[tokio::test]
    async fn each_transition_appends_one_row_and_keeps_stamps() {
        let ledger = MemoryLedger::default();
        let order = ledger.open(&new_order()).await.unwrap();
        let shipped_on = Utc.with_ymd_and_hms(2025, 2, 1, 9, 0, 0).unwrap();
        let delivered_on = Utc.with_ymd_and_hms(2025, 2, 4, 15, 30, 0).unwrap();

        let mut shipping = change(OrderStatus::Shipped);
        shipping.tracking_number = Some("DLV123".to_string());
        let shipped = record_transition(&ledger, order.id, &shipping, shipped_on).await.unwrap();

        assert_eq!(shipped.previous, OrderStatus::Pending);
        assert_eq!(shipped.order.shipped_at, Some(shipped_on));
        assert_eq!(ledger.history(order.id).await.unwrap().len(), 2);

        let delivered = record_transition(&ledger, order.id, &change(OrderStatus::Delivered), delivered_on)
            .await
            .unwrap();
        let stored = ledger.find(order.id).await.unwrap().unwrap();

        assert_eq!(delivered.order.status, OrderStatus::Delivered);
        assert_eq!(stored.shipped_at, Some(shipped_on));
        assert_eq!(stored.delivered_at, Some(delivered_on));
        assert_eq!(stored.tracking_number.as_deref(), Some("DLV123"));
        assert_eq!(stored.updated_at, delivered_on);

        let statuses: Vec<_> = ledger
            .history(order.id)
            .await
            .unwrap()
            .into_iter()
            .map(|row| row.status)
            .collect();
        assert_eq!(statuses, vec![OrderStatus::Pending, OrderStatus::Shipped, OrderStatus::Delivered]);
    }

    #[tokio::test]
    async fn rejected_transitions_write_nothing() {
        let ledger = MemoryLedger::default();
        let order = ledger.open(&new_order()).await.unwrap();
        record_transition(&ledger, order.id, &change(OrderStatus::Cancelled), Utc::now())
            .await
            .unwrap();

        let err = record_transition(&ledger, order.id, &change(OrderStatus::Confirmed), Utc::now())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(ledger.history(order.id).await.unwrap().len(), 2);
        assert_eq!(ledger.find(order.id).await.unwrap().unwrap().status, OrderStatus::Cancelled);
    }

    #[tokio::test]
    async fn unknown_order_is_not_found() {
        let ledger = MemoryLedger::default();
        let err = record_transition(&ledger, Uuid::new_v4(), &change(OrderStatus::Confirmed), Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound("order")));
    }
}
