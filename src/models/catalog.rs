use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Collection {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub image: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Product {
    pub id: Uuid,
    pub collection_id: Option<Uuid>,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub base_price: Decimal,
    pub images: sqlx::types::Json<Vec<String>>,
    pub is_customizable: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Fabric {
    pub id: Uuid,
    pub name: String,
    pub material: String,
    pub color: Option<String>,
    pub price_per_meter: Decimal,
    pub meters_required: Decimal,
    pub in_stock: bool,
    pub image: Option<String>,
}

impl Fabric {
    /// Price of the fabric for one garment, rounded to paise so a unit
    /// price built from it stores exactly.
    pub fn cost(&self) -> Decimal {
        (self.price_per_meter * self.meters_required)
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Review {
    pub id: Uuid,
    pub product_id: Uuid,
    pub user_id: Uuid,
    pub rating: i32,
    pub title: Option<String>,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ProductDisplay {
    #[serde(flatten)]
    pub product: Product,
    pub price_display: String,
    pub average_rating: Option<f64>,
    pub review_count: i64,
}
