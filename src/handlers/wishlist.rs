use axum::{
    extract::{Path, State},
    response::Json,
};
use serde::Serialize;
use tower_cookies::Cookies;
use uuid::Uuid;

use super::{blocking, ok, ApiResponse};
use crate::{
    error::{AppError, AppResult},
    middleware::visitor_storage,
    repository::catalog,
    state::AppState,
    storage::FileStateStorage,
    wishlist::WishlistStore,
};

#[derive(Debug, Serialize)]
pub struct WishlistView {
    pub items: Vec<Uuid>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct WishlistMembership {
    pub product_id: Uuid,
    pub in_wishlist: bool,
}

fn wishlist_storage(cookies: &Cookies, state: &AppState) -> FileStateStorage {
    visitor_storage(cookies, &state.config.state_storage_dir, state.config.cookie_secure)
}

/// Loads the wishlist from `storage` and runs `edit` against it off the
/// async runtime.
async fn edit_wishlist<T, F>(storage: FileStateStorage, edit: F) -> AppResult<T>
where
    F: FnOnce(&mut WishlistStore<FileStateStorage>) -> T + Send + 'static,
    T: Send + 'static,
{
    blocking(move || edit(&mut WishlistStore::load(storage))).await
}

fn view(store: &WishlistStore<FileStateStorage>) -> WishlistView {
    let items = store.wishlist().items().to_vec();
    WishlistView {
        count: items.len(),
        items,
    }
}

pub async fn get_wishlist(
    State(state): State<AppState>,
    cookies: Cookies,
) -> AppResult<Json<ApiResponse<WishlistView>>> {
    let wishlist = edit_wishlist(wishlist_storage(&cookies, &state), |store| view(store)).await?;
    Ok(ok(wishlist))
}

pub async fn add_item(
    State(state): State<AppState>,
    cookies: Cookies,
    Path(product_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<WishlistView>>> {
    catalog::find_product(&state.db, product_id)
        .await?
        .ok_or(AppError::NotFound("product"))?;

    let wishlist = edit_wishlist(wishlist_storage(&cookies, &state), move |store| {
        store.add_item(product_id);
        view(store)
    })
    .await?;
    Ok(ok(wishlist))
}

pub async fn remove_item(
    State(state): State<AppState>,
    cookies: Cookies,
    Path(product_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<WishlistView>>> {
    let wishlist = edit_wishlist(wishlist_storage(&cookies, &state), move |store| {
        store.remove_item(product_id);
        view(store)
    })
    .await?;
    Ok(ok(wishlist))
}

pub async fn is_in_wishlist(
    State(state): State<AppState>,
    cookies: Cookies,
    Path(product_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<WishlistMembership>>> {
    let in_wishlist = edit_wishlist(wishlist_storage(&cookies, &state), move |store| {
        store.is_in_wishlist(product_id)
    })
    .await?;
    Ok(ok(WishlistMembership {
        product_id,
        in_wishlist,
    }))
}

pub async fn clear_wishlist(
    State(state): State<AppState>,
    cookies: Cookies,
) -> AppResult<Json<ApiResponse<WishlistView>>> {
    let wishlist = edit_wishlist(wishlist_storage(&cookies, &state), |store| {
        store.clear();
        view(store)
    })
    .await?;
    Ok(ok(wishlist))
}
