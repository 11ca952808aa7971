use sqlx::PgConnection;
use uuid::Uuid;

use crate::{
    database::Database,
    models::{NewOrder, Order, OrderItem, OrderStatus, OrderStatusHistory},
};

/// Writes the order, its lines and the opening history row atomically.
pub async fn create(db: &Database, order: &NewOrder) -> Result<Order, sqlx::Error> {
    let mut tx = db.begin().await?;

    let created = sqlx::query_as::<_, Order>(
        r#"
        INSERT INTO orders (
            order_number, user_id, status, subtotal, tax, shipping, total,
            shipping_address_id, billing_address_id, notes
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        RETURNING *
        "#,
    )
    .bind(&order.order_number)
    .bind(order.user_id)
    .bind(OrderStatus::Pending)
    .bind(order.subtotal)
    .bind(order.tax)
    .bind(order.shipping)
    .bind(order.total)
    .bind(order.shipping_address_id)
    .bind(order.billing_address_id)
    .bind(&order.notes)
    .fetch_one(&mut *tx)
    .await?;

    for item in &order.items {
        sqlx::query(
            r#"
            INSERT INTO order_items (
                order_id, product_id, fabric_id, quantity, unit_price, line_total,
                service_type, measurements, consultation_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(created.id)
        .bind(item.product_id)
        .bind(item.fabric_id)
        .bind(item.quantity)
        .bind(item.unit_price)
        .bind(item.line_total)
        .bind(item.service_type)
        .bind(item.measurements.clone().map(sqlx::types::Json))
        .bind(item.consultation_id)
        .execute(&mut *tx)
        .await?;
    }

    insert_history(&mut tx, created.id, OrderStatus::Pending, Some(OrderStatusHistory::OPENING_NOTE)).await?;

    tx.commit().await?;
    Ok(created)
}

async fn insert_history(
    conn: &mut PgConnection,
    order_id: Uuid,
    status: OrderStatus,
    note: Option<&str>,
) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO order_status_history (order_id, status, note) VALUES ($1, $2, $3)")
        .bind(order_id)
        .bind(status)
        .bind(note)
        .execute(conn)
        .await?;
    Ok(())
}

/// Writes `updated` (the order after the transition) and appends the
/// history row in one transaction.
pub async fn apply_transition(
    db: &Database,
    updated: &Order,
    note: Option<&str>,
) -> Result<Order, sqlx::Error> {
    let mut tx = db.begin().await?;

    let saved = sqlx::query_as::<_, Order>(
        r#"
        UPDATE orders SET
            status = $1,
            tracking_number = $2,
            shipped_at = $3,
            delivered_at = $4,
            updated_at = $5
        WHERE id = $6
        RETURNING *
        "#,
    )
    .bind(updated.status)
    .bind(&updated.tracking_number)
    .bind(updated.shipped_at)
    .bind(updated.delivered_at)
    .bind(updated.updated_at)
    .bind(updated.id)
    .fetch_one(&mut *tx)
    .await?;

    insert_history(&mut tx, saved.id, saved.status, note).await?;

    tx.commit().await?;
    Ok(saved)
}

pub async fn find_by_id(db: &Database, order_id: Uuid) -> Result<Option<Order>, sqlx::Error> {
    sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = $1")
        .bind(order_id)
        .fetch_optional(db)
        .await
}

pub async fn list_for_user(db: &Database, user_id: Uuid) -> Result<Vec<Order>, sqlx::Error> {
    sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE user_id = $1 ORDER BY created_at DESC")
        .bind(user_id)
        .fetch_all(db)
        .await
}

pub async fn list_all(db: &Database, status: Option<OrderStatus>) -> Result<Vec<Order>, sqlx::Error> {
    let mut query_builder = sqlx::QueryBuilder::new("SELECT * FROM orders");
    if let Some(status) = status {
        query_builder.push(" WHERE status = ").push_bind(status);
    }
    query_builder.push(" ORDER BY created_at DESC");

    query_builder.build_query_as::<Order>().fetch_all(db).await
}

pub async fn items_for(db: &Database, order_id: Uuid) -> Result<Vec<OrderItem>, sqlx::Error> {
    sqlx::query_as::<_, OrderItem>("SELECT * FROM order_items WHERE order_id = $1 ORDER BY created_at, id")
        .bind(order_id)
        .fetch_all(db)
        .await
}

pub async fn history_for(db: &Database, order_id: Uuid) -> Result<Vec<OrderStatusHistory>, sqlx::Error> {
    sqlx::query_as::<_, OrderStatusHistory>(
        "SELECT * FROM order_status_history WHERE order_id = $1 ORDER BY created_at, id",
    )
    .bind(order_id)
    .fetch_all(db)
    .await
}
