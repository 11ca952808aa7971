use uuid::Uuid;

use crate::{
    database::Database,
    models::{Collection, Fabric, Product, Review},
    validation::ReviewInput,
};

#[derive(Debug, Default, sqlx::FromRow)]
pub struct RatingStats {
    pub average_rating: Option<f64>,
    pub review_count: i64,
}

pub async fn list_collections(db: &Database) -> Result<Vec<Collection>, sqlx::Error> {
    sqlx::query_as::<_, Collection>("SELECT * FROM collections WHERE is_active = true ORDER BY name")
        .fetch_all(db)
        .await
}

pub async fn find_collection_by_slug(db: &Database, slug: &str) -> Result<Option<Collection>, sqlx::Error> {
    sqlx::query_as::<_, Collection>("SELECT * FROM collections WHERE slug = $1 AND is_active = true")
        .bind(slug)
        .fetch_optional(db)
        .await
}

pub async fn list_products(
    db: &Database,
    collection_id: Option<Uuid>,
    search: Option<&str>,
) -> Result<Vec<Product>, sqlx::Error> {
    let mut query_builder = sqlx::QueryBuilder::new("SELECT * FROM products WHERE is_active = true");

    if let Some(id) = collection_id {
        query_builder.push(" AND collection_id = ").push_bind(id);
    }
    if let Some(term) = search.map(str::trim).filter(|s| !s.is_empty()) {
        query_builder
            .push(" AND name ILIKE ")
            .push_bind(format!("%{}%", term));
    }
    query_builder.push(" ORDER BY created_at DESC");

    query_builder.build_query_as::<Product>().fetch_all(db).await
}

pub async fn find_product(db: &Database, product_id: Uuid) -> Result<Option<Product>, sqlx::Error> {
    sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1 AND is_active = true")
        .bind(product_id)
        .fetch_optional(db)
        .await
}

pub async fn find_product_by_slug(db: &Database, slug: &str) -> Result<Option<Product>, sqlx::Error> {
    sqlx::query_as::<_, Product>("SELECT * FROM products WHERE slug = $1 AND is_active = true")
        .bind(slug)
        .fetch_optional(db)
        .await
}

pub async fn list_fabrics(db: &Database) -> Result<Vec<Fabric>, sqlx::Error> {
    sqlx::query_as::<_, Fabric>("SELECT * FROM fabrics WHERE in_stock = true ORDER BY name")
        .fetch_all(db)
        .await
}

pub async fn find_fabric(db: &Database, fabric_id: Uuid) -> Result<Option<Fabric>, sqlx::Error> {
    sqlx::query_as::<_, Fabric>("SELECT * FROM fabrics WHERE id = $1")
        .bind(fabric_id)
        .fetch_optional(db)
        .await
}

pub async fn rating_stats(db: &Database, product_id: Uuid) -> Result<RatingStats, sqlx::Error> {
    sqlx::query_as::<_, RatingStats>(
        "SELECT AVG(rating)::float8 AS average_rating, COUNT(*) AS review_count FROM reviews WHERE product_id = $1",
    )
    .bind(product_id)
    .fetch_one(db)
    .await
}

pub async fn list_reviews(db: &Database, product_id: Uuid) -> Result<Vec<Review>, sqlx::Error> {
    sqlx::query_as::<_, Review>("SELECT * FROM reviews WHERE product_id = $1 ORDER BY created_at DESC")
        .bind(product_id)
        .fetch_all(db)
        .await
}

/// One review per customer per product; a second submission replaces the first.
pub async fn upsert_review(
    db: &Database,
    product_id: Uuid,
    user_id: Uuid,
    input: &ReviewInput,
) -> Result<Review, sqlx::Error> {
    sqlx::query_as::<_, Review>(
        r#"
        INSERT INTO reviews (product_id, user_id, rating, title, comment)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (product_id, user_id)
        DO UPDATE SET rating = EXCLUDED.rating, title = EXCLUDED.title, comment = EXCLUDED.comment, created_at = NOW()
        RETURNING *
        "#,
    )
    .bind(product_id)
    .bind(user_id)
    .bind(input.rating)
    .bind(&input.title)
    .bind(&input.comment)
    .fetch_one(db)
    .await
}
