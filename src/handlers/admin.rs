use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tower_cookies::Cookies;
use uuid::Uuid;

use super::{ok, ApiResponse};
use crate::{
    error::AppResult,
    middleware::require_admin,
    models::{Consultation, ConsultationStatus, OrderDetail, OrderStatus, OrderSummary},
    repository::{consultations, orders},
    services::{
        consultations::{self as consultation_service, ConsultationStatusChange},
        orders::{self as order_service, StatusChange},
    },
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
}

#[derive(Debug, Deserialize)]
pub struct ConsultationFilter {
    pub status: Option<ConsultationStatus>,
}

#[derive(Debug, Serialize)]
pub struct ReminderRun {
    pub sent: usize,
}

pub async fn list_orders(
    State(state): State<AppState>,
    cookies: Cookies,
    Query(filter): Query<OrderFilter>,
) -> AppResult<Json<ApiResponse<Vec<OrderSummary>>>> {
    require_admin(&cookies, &state).await?;
    let orders = orders::list_all(&state.db, filter.status).await?;
    Ok(ok(orders.iter().map(order_service::summarize).collect()))
}

pub async fn update_order_status(
    State(state): State<AppState>,
    cookies: Cookies,
    Path(order_id): Path<Uuid>,
    Json(change): Json<StatusChange>,
) -> AppResult<Json<ApiResponse<OrderDetail>>> {
    let admin = require_admin(&cookies, &state).await?;
    log::debug!("{} requested {} for order {}", admin.email, change.status, order_id);

    let order = order_service::change_status(&state, order_id, change).await?;
    Ok(ok(order_service::order_detail(&state, order).await?))
}

pub async fn list_consultations(
    State(state): State<AppState>,
    cookies: Cookies,
    Query(filter): Query<ConsultationFilter>,
) -> AppResult<Json<ApiResponse<Vec<Consultation>>>> {
    require_admin(&cookies, &state).await?;
    Ok(ok(consultations::list_all(&state.db, filter.status).await?))
}

pub async fn update_consultation_status(
    State(state): State<AppState>,
    cookies: Cookies,
    Path(consultation_id): Path<Uuid>,
    Json(change): Json<ConsultationStatusChange>,
) -> AppResult<Json<ApiResponse<Consultation>>> {
    require_admin(&cookies, &state).await?;
    Ok(ok(consultation_service::change_status(&state, consultation_id, change).await?))
}

pub async fn send_reminders(
    State(state): State<AppState>,
    cookies: Cookies,
) -> AppResult<Json<ApiResponse<ReminderRun>>> {
    require_admin(&cookies, &state).await?;
    let sent = consultation_service::send_due_reminders(&state, Utc::now()).await?;
    Ok(ok(ReminderRun { sent }))
}
