use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use tower_cookies::Cookies;
use uuid::Uuid;

use super::{
    cart::{cart_storage, edit_cart},
    created, ok, ApiResponse,
};
use crate::{
    error::{AppError, AppResult},
    middleware::require_user,
    models::{OrderDetail, OrderSummary},
    repository::orders,
    services::orders as order_service,
    state::AppState,
    validation::OrderInput,
};

pub async fn list_orders(
    State(state): State<AppState>,
    cookies: Cookies,
) -> AppResult<Json<ApiResponse<Vec<OrderSummary>>>> {
    let user = require_user(&cookies, &state).await?;
    let orders = orders::list_for_user(&state.db, user.id).await?;
    Ok(ok(orders.iter().map(order_service::summarize).collect()))
}

pub async fn place_order(
    State(state): State<AppState>,
    cookies: Cookies,
    Json(input): Json<OrderInput>,
) -> AppResult<(StatusCode, Json<ApiResponse<OrderDetail>>)> {
    let user = require_user(&cookies, &state).await?;
    let from_cart = input.from_cart;

    let order = order_service::place_order(&state, &user, input).await?;

    if from_cart {
        if let Err(e) = edit_cart(cart_storage(&cookies, &state), |store| store.clear_cart()).await {
            log::warn!("Order {} placed but the cart was not cleared: {}", order.order_number, e);
        }
    }

    Ok(created(order_service::order_detail(&state, order).await?))
}

/// Customers see their own orders; admins see any.
pub async fn get_order(
    State(state): State<AppState>,
    cookies: Cookies,
    Path(order_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<OrderDetail>>> {
    let user = require_user(&cookies, &state).await?;
    let order = orders::find_by_id(&state.db, order_id)
        .await?
        .filter(|order| order.user_id == user.id || user.is_admin())
        .ok_or(AppError::NotFound("order"))?;

    Ok(ok(order_service::order_detail(&state, order).await?))
}
