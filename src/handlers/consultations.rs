use axum::{extract::State, http::StatusCode, response::Json};
use tower_cookies::Cookies;

use super::{created, ok, ApiResponse};
use crate::{
    error::AppResult,
    middleware::require_user,
    models::Consultation,
    repository::consultations,
    services::consultations as consultation_service,
    state::AppState,
    validation::ConsultationBookingInput,
};

pub async fn list_consultations(
    State(state): State<AppState>,
    cookies: Cookies,
) -> AppResult<Json<ApiResponse<Vec<Consultation>>>> {
    let user = require_user(&cookies, &state).await?;
    Ok(ok(consultations::list_for_user(&state.db, user.id).await?))
}

pub async fn book_consultation(
    State(state): State<AppState>,
    cookies: Cookies,
    Json(input): Json<ConsultationBookingInput>,
) -> AppResult<(StatusCode, Json<ApiResponse<Consultation>>)> {
    let user = require_user(&cookies, &state).await?;
    let consultation = consultation_service::book(&state, &user, input).await?;
    Ok(created(consultation))
}
