use axum::{extract::State, http::StatusCode, response::Json};
use tower_cookies::Cookies;
use validator::Validate;

use super::{created, ok, ApiResponse};
use crate::{
    error::AppResult,
    middleware::require_user,
    models::{Address, Measurement},
    repository::{addresses, measurements},
    state::AppState,
    validation::{AddressInput, MeasurementInput},
};

pub async fn list_measurements(
    State(state): State<AppState>,
    cookies: Cookies,
) -> AppResult<Json<ApiResponse<Vec<Measurement>>>> {
    let user = require_user(&cookies, &state).await?;
    Ok(ok(measurements::list_for_user(&state.db, user.id).await?))
}

pub async fn create_measurement(
    State(state): State<AppState>,
    cookies: Cookies,
    Json(input): Json<MeasurementInput>,
) -> AppResult<(StatusCode, Json<ApiResponse<Measurement>>)> {
    let user = require_user(&cookies, &state).await?;
    input.validate()?;
    Ok(created(measurements::create(&state.db, user.id, &input).await?))
}

pub async fn list_addresses(
    State(state): State<AppState>,
    cookies: Cookies,
) -> AppResult<Json<ApiResponse<Vec<Address>>>> {
    let user = require_user(&cookies, &state).await?;
    Ok(ok(addresses::list_for_user(&state.db, user.id).await?))
}

pub async fn create_address(
    State(state): State<AppState>,
    cookies: Cookies,
    Json(input): Json<AddressInput>,
) -> AppResult<(StatusCode, Json<ApiResponse<Address>>)> {
    let user = require_user(&cookies, &state).await?;
    input.validate()?;
    Ok(created(addresses::create(&state.db, user.id, &input).await?))
}
