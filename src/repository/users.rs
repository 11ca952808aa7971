use uuid::Uuid;

use crate::{
    database::Database,
    models::{CreateUser, User},
};

pub async fn find_by_id(db: &Database, user_id: Uuid) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1 AND is_active = true")
        .bind(user_id)
        .fetch_optional(db)
        .await
}

pub async fn find_by_email(db: &Database, email: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE lower(email) = lower($1) AND is_active = true")
        .bind(email)
        .fetch_optional(db)
        .await
}

pub async fn create(db: &Database, user: &CreateUser) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (name, email, phone, password_hash)
        VALUES ($1, lower($2), $3, $4)
        RETURNING *
        "#,
    )
    .bind(&user.name)
    .bind(&user.email)
    .bind(&user.phone)
    .bind(&user.password_hash)
    .fetch_one(db)
    .await
}

pub async fn touch_last_login(db: &Database, user_id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE users SET last_login = NOW() WHERE id = $1")
        .bind(user_id)
        .execute(db)
        .await?;
    Ok(())
}
