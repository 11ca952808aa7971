use serde::{Deserialize, Serialize};
use tower_cookies::Cookies;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{User, UserRole},
    notifications::Recipient,
    repository::users,
    state::AppState,
    utils::verify_token,
};

pub const AUTH_COOKIE: &str = "auth_token";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub role: UserRole,
}

impl CurrentUser {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    pub fn recipient(&self) -> Recipient {
        Recipient {
            name: self.name.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
        }
    }
}

impl From<User> for CurrentUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            phone: user.phone,
            role: user.role,
        }
    }
}

pub async fn get_current_user(cookies: &Cookies, state: &AppState) -> Option<CurrentUser> {
    // Try to get JWT token from auth_token cookie
    let token = cookies.get(AUTH_COOKIE)?.value().to_string();

    let claims = match verify_token(&state.config.jwt_secret, &token) {
        Ok(claims) => claims,
        Err(e) => {
            log::debug!("Rejecting auth cookie: {}", e);
            return None;
        }
    };

    let user_id = Uuid::parse_str(&claims.sub).ok()?;

    // The role is re-read from the database so a demoted admin loses access
    // before the token expires.
    match users::find_by_id(&state.db, user_id).await {
        Ok(user) => user.map(CurrentUser::from),
        Err(e) => {
            log::error!("Failed to load user {}: {}", user_id, e);
            None
        }
    }
}

pub async fn require_user(cookies: &Cookies, state: &AppState) -> AppResult<CurrentUser> {
    get_current_user(cookies, state).await.ok_or(AppError::Unauthorized)
}

pub async fn require_admin(cookies: &Cookies, state: &AppState) -> AppResult<CurrentUser> {
    let user = require_user(cookies, state).await?;
    if !user.is_admin() {
        return Err(AppError::Forbidden);
    }
    Ok(user)
}
