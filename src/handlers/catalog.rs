use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use serde::{Deserialize, Serialize};
use tower_cookies::Cookies;
use uuid::Uuid;
use validator::Validate;

use super::{created, ok, ApiResponse};
use crate::{
    database::Database,
    error::{AppError, AppResult},
    middleware::require_user,
    models::{Collection, Fabric, Product, ProductDisplay, Review},
    pricing::format_currency,
    repository::catalog,
    state::AppState,
    validation::ReviewInput,
};

#[derive(Debug, Deserialize)]
pub struct ProductQuery {
    pub collection: Option<String>,
    pub search: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CollectionDetail {
    #[serde(flatten)]
    pub collection: Collection,
    pub products: Vec<ProductDisplay>,
}

async fn display(db: &Database, product: Product) -> AppResult<ProductDisplay> {
    let stats = catalog::rating_stats(db, product.id).await?;
    Ok(ProductDisplay {
        price_display: format_currency(product.base_price),
        average_rating: stats.average_rating,
        review_count: stats.review_count,
        product,
    })
}

async fn display_all(db: &Database, products: Vec<Product>) -> AppResult<Vec<ProductDisplay>> {
    let mut out = Vec::with_capacity(products.len());
    for product in products {
        out.push(display(db, product).await?);
    }
    Ok(out)
}

pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ProductQuery>,
) -> AppResult<Json<ApiResponse<Vec<ProductDisplay>>>> {
    let collection_id = match query.collection.as_deref().filter(|slug| !slug.is_empty()) {
        Some(slug) => Some(
            catalog::find_collection_by_slug(&state.db, slug)
                .await?
                .ok_or(AppError::NotFound("collection"))?
                .id,
        ),
        None => None,
    };

    let products = catalog::list_products(&state.db, collection_id, query.search.as_deref()).await?;
    Ok(ok(display_all(&state.db, products).await?))
}

/// How `/api/products/:product` names a product: by id or by slug.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProductKey {
    Id(Uuid),
    Slug(String),
}

impl ProductKey {
    pub fn parse(raw: &str) -> Self {
        match Uuid::parse_str(raw) {
            Ok(id) => ProductKey::Id(id),
            Err(_) => ProductKey::Slug(raw.to_string()),
        }
    }
}

pub async fn get_product(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> AppResult<Json<ApiResponse<ProductDisplay>>> {
    let product = match ProductKey::parse(&key) {
        ProductKey::Id(product_id) => catalog::find_product(&state.db, product_id).await?,
        ProductKey::Slug(slug) => catalog::find_product_by_slug(&state.db, &slug).await?,
    }
    .ok_or(AppError::NotFound("product"))?;
    Ok(ok(display(&state.db, product).await?))
}

pub async fn list_collections(State(state): State<AppState>) -> AppResult<Json<ApiResponse<Vec<Collection>>>> {
    Ok(ok(catalog::list_collections(&state.db).await?))
}

pub async fn get_collection(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> AppResult<Json<ApiResponse<CollectionDetail>>> {
    let collection = catalog::find_collection_by_slug(&state.db, &slug)
        .await?
        .ok_or(AppError::NotFound("collection"))?;
    let products = catalog::list_products(&state.db, Some(collection.id), None).await?;

    Ok(ok(CollectionDetail {
        products: display_all(&state.db, products).await?,
        collection,
    }))
}

pub async fn list_fabrics(State(state): State<AppState>) -> AppResult<Json<ApiResponse<Vec<Fabric>>>> {
    Ok(ok(catalog::list_fabrics(&state.db).await?))
}

pub async fn list_reviews(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Vec<Review>>>> {
    Ok(ok(catalog::list_reviews(&state.db, product_id).await?))
}

pub async fn create_review(
    State(state): State<AppState>,
    cookies: Cookies,
    Path(product_id): Path<Uuid>,
    Json(input): Json<ReviewInput>,
) -> AppResult<(StatusCode, Json<ApiResponse<Review>>)> {
    let user = require_user(&cookies, &state).await?;
    input.validate()?;

    catalog::find_product(&state.db, product_id)
        .await?
        .ok_or(AppError::NotFound("product"))?;

    let review = catalog::upsert_review(&state.db, product_id, user.id, &input).await?;
    Ok(created(review))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn product_key_accepts_ids_and_slugs() {
        let id = Uuid::new_v4();
        assert_eq!(ProductKey::parse(&id.to_string()), ProductKey::Id(id));
        assert_eq!(
            ProductKey::parse("linen-bandhgala"),
            ProductKey::Slug("linen-bandhgala".to_string())
        );
    }
}
