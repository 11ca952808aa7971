pub mod account;
pub mod admin;
pub mod auth;
pub mod cart;
pub mod catalog;
pub mod consultations;
pub mod inquiries;
pub mod orders;
pub mod tools;
pub mod wishlist;

use axum::{http::StatusCode, response::Json};
use serde::Serialize;

use crate::error::{AppError, AppResult};

/// Success envelope. Errors use the same `success` flag, see `AppError`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

pub fn ok<T: Serialize>(data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse { success: true, data })
}

pub fn created<T: Serialize>(data: T) -> (StatusCode, Json<ApiResponse<T>>) {
    (StatusCode::CREATED, ok(data))
}

/// Runs work that touches the visitor's state files on the blocking pool.
pub async fn blocking<T, F>(work: F) -> AppResult<T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| AppError::Internal(format!("blocking task failed: {}", e)))
}
