use axum::{extract::State, http::StatusCode, response::Json};
use tower_cookies::{Cookie, Cookies};
use validator::Validate;

use super::{created, ok, ApiResponse};
use crate::{
    error::{AppError, AppResult},
    middleware::{require_user, CurrentUser, AUTH_COOKIE},
    models::{CreateUser, User, UserResponse},
    repository::users,
    state::AppState,
    utils::{auth::TOKEN_TTL_HOURS, create_token, hash_password, verify_password},
    validation::{LoginInput, RegisterInput},
};

fn issue_session(state: &AppState, cookies: &Cookies, user: &User) -> AppResult<()> {
    let token = create_token(&state.config.jwt_secret, user.id, user.email.clone(), user.role)
        .map_err(|e| AppError::Internal(format!("failed to sign token: {}", e)))?;

    // Set secure HTTP-only cookie with JWT token
    let cookie = Cookie::build((AUTH_COOKIE, token))
        .path("/")
        .http_only(true)
        .secure(state.config.cookie_secure)
        .max_age(time::Duration::hours(TOKEN_TTL_HOURS))
        .build();
    cookies.add(cookie);
    Ok(())
}

pub async fn register(
    State(state): State<AppState>,
    cookies: Cookies,
    Json(input): Json<RegisterInput>,
) -> AppResult<(StatusCode, Json<ApiResponse<UserResponse>>)> {
    input.validate()?;

    if users::find_by_email(&state.db, &input.email).await?.is_some() {
        return Err(AppError::Conflict("An account with this email already exists".to_string()));
    }

    let password_hash = hash_password(&input.password)
        .map_err(|e| AppError::Internal(format!("failed to hash password: {}", e)))?;

    let user = users::create(
        &state.db,
        &CreateUser {
            name: input.name.trim().to_string(),
            email: input.email.trim().to_string(),
            phone: input.phone.trim().to_string(),
            password_hash,
        },
    )
    .await
    .map_err(|e| match &e {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            AppError::Conflict("An account with this email already exists".to_string())
        }
        _ => AppError::Database(e),
    })?;

    log::info!("Registered {}", user.email);
    issue_session(&state, &cookies, &user)?;
    Ok(created(UserResponse::from(user)))
}

pub async fn login(
    State(state): State<AppState>,
    cookies: Cookies,
    Json(input): Json<LoginInput>,
) -> AppResult<Json<ApiResponse<UserResponse>>> {
    input.validate()?;

    let user = users::find_by_email(&state.db, &input.email)
        .await?
        .ok_or(AppError::Unauthorized)?;

    let valid = verify_password(&input.password, &user.password_hash)
        .map_err(|e| AppError::Internal(format!("failed to verify password: {}", e)))?;
    if !valid {
        log::debug!("Failed login for {}", user.email);
        return Err(AppError::Unauthorized);
    }

    issue_session(&state, &cookies, &user)?;

    if let Err(e) = users::touch_last_login(&state.db, user.id).await {
        log::warn!("Failed to record login for {}: {}", user.email, e);
    }

    Ok(ok(UserResponse::from(user)))
}

pub async fn logout(cookies: Cookies) -> Json<ApiResponse<()>> {
    cookies.remove(Cookie::build((AUTH_COOKIE, "")).path("/").build());
    ok(())
}

pub async fn me(State(state): State<AppState>, cookies: Cookies) -> AppResult<Json<ApiResponse<CurrentUser>>> {
    let user = require_user(&cookies, &state).await?;
    Ok(ok(user))
}
