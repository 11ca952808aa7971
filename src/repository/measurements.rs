use uuid::Uuid;

use crate::{database::Database, models::Measurement, validation::MeasurementInput};

pub async fn list_for_user(db: &Database, user_id: Uuid) -> Result<Vec<Measurement>, sqlx::Error> {
    sqlx::query_as::<_, Measurement>(
        "SELECT * FROM measurements WHERE user_id = $1 ORDER BY is_default DESC, updated_at DESC",
    )
    .bind(user_id)
    .fetch_all(db)
    .await
}

pub async fn create(
    db: &Database,
    user_id: Uuid,
    input: &MeasurementInput,
) -> Result<Measurement, sqlx::Error> {
    let mut tx = db.begin().await?;

    if input.is_default {
        sqlx::query("UPDATE measurements SET is_default = false WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
    }

    let measurement = sqlx::query_as::<_, Measurement>(
        r#"
        INSERT INTO measurements (user_id, name, dimensions, notes, is_default)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(user_id)
    .bind(&input.name)
    .bind(sqlx::types::Json(&input.values))
    .bind(&input.notes)
    .bind(input.is_default)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(measurement)
}
