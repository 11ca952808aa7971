use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use chrono::{DateTime, Utc};
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeasurementUnit {
    #[default]
    Inch,
    Cm,
}

/// Body measurements taken for a garment. Every known dimension is optional
/// and must be positive when given; anything else goes in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct MeasurementValues {
    #[serde(default)]
    pub unit: MeasurementUnit,
    #[validate(range(exclusive_min = 0.0))]
    pub chest: Option<f64>,
    #[validate(range(exclusive_min = 0.0))]
    pub waist: Option<f64>,
    #[validate(range(exclusive_min = 0.0))]
    pub hip: Option<f64>,
    #[validate(range(exclusive_min = 0.0))]
    pub shoulder: Option<f64>,
    #[validate(range(exclusive_min = 0.0))]
    pub sleeve_length: Option<f64>,
    #[validate(range(exclusive_min = 0.0))]
    pub shirt_length: Option<f64>,
    #[validate(range(exclusive_min = 0.0))]
    pub trouser_length: Option<f64>,
    #[validate(range(exclusive_min = 0.0))]
    pub inseam: Option<f64>,
    #[validate(range(exclusive_min = 0.0))]
    pub neck: Option<f64>,
    #[validate(range(exclusive_min = 0.0))]
    pub thigh: Option<f64>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Measurement {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub dimensions: sqlx::types::Json<MeasurementValues>,
    pub notes: Option<String>,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
