use sqlx::PgConnection;
use uuid::Uuid;

use crate::{database::Database, models::Address, validation::AddressInput};

pub async fn list_for_user(db: &Database, user_id: Uuid) -> Result<Vec<Address>, sqlx::Error> {
    sqlx::query_as::<_, Address>(
        "SELECT * FROM addresses WHERE user_id = $1 ORDER BY is_default DESC, created_at DESC",
    )
    .bind(user_id)
    .fetch_all(db)
    .await
}

pub async fn find_by_id(db: &Database, address_id: Uuid) -> Result<Option<Address>, sqlx::Error> {
    sqlx::query_as::<_, Address>("SELECT * FROM addresses WHERE id = $1")
        .bind(address_id)
        .fetch_optional(db)
        .await
}

pub async fn find_for_user(
    db: &Database,
    address_id: Uuid,
    user_id: Uuid,
) -> Result<Option<Address>, sqlx::Error> {
    sqlx::query_as::<_, Address>("SELECT * FROM addresses WHERE id = $1 AND user_id = $2")
        .bind(address_id)
        .bind(user_id)
        .fetch_optional(db)
        .await
}

pub async fn create(db: &Database, user_id: Uuid, input: &AddressInput) -> Result<Address, sqlx::Error> {
    let mut tx = db.begin().await?;
    let address = insert(&mut tx, user_id, input).await?;
    tx.commit().await?;
    Ok(address)
}

/// Inserts on an open connection so callers can pair it with other writes.
pub async fn insert(conn: &mut PgConnection, user_id: Uuid, input: &AddressInput) -> Result<Address, sqlx::Error> {
    if input.is_default {
        sqlx::query("UPDATE addresses SET is_default = false WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *conn)
            .await?;
    }

    sqlx::query_as::<_, Address>(
        r#"
        INSERT INTO addresses (user_id, name, phone, line1, line2, landmark, city, state, pincode, is_default)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        RETURNING *
        "#,
    )
    .bind(user_id)
    .bind(&input.name)
    .bind(&input.phone)
    .bind(&input.line1)
    .bind(&input.line2)
    .bind(&input.landmark)
    .bind(&input.city)
    .bind(&input.state)
    .bind(&input.pincode)
    .bind(input.is_default)
    .fetch_one(&mut *conn)
    .await
}
