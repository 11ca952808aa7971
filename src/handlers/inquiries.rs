use axum::{extract::State, http::StatusCode, response::Json};
use validator::Validate;

use super::{created, ApiResponse};
use crate::{
    error::AppResult,
    models::{ContactMessage, NewsletterSubscriber},
    repository::inquiries,
    state::AppState,
    validation::{ContactInput, NewsletterInput},
};

pub async fn submit_contact(
    State(state): State<AppState>,
    Json(input): Json<ContactInput>,
) -> AppResult<(StatusCode, Json<ApiResponse<ContactMessage>>)> {
    input.validate()?;
    let message = inquiries::create_contact(&state.db, &input).await?;
    log::info!("Contact message {} from {}", message.id, message.email);
    Ok(created(message))
}

pub async fn subscribe(
    State(state): State<AppState>,
    Json(input): Json<NewsletterInput>,
) -> AppResult<(StatusCode, Json<ApiResponse<NewsletterSubscriber>>)> {
    input.validate()?;
    Ok(created(inquiries::subscribe(&state.db, &input).await?))
}
