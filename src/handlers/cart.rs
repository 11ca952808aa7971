use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tower_cookies::Cookies;
use uuid::Uuid;
use validator::Validate;

use super::{blocking, created, ok, ApiResponse};
use crate::{
    cart::{Cart, CartItem, CartStore, NewCartItem},
    error::{AppError, AppResult},
    middleware::visitor_storage,
    models::{Fabric, MeasurementValues, ServiceType},
    pricing::format_currency,
    repository::catalog,
    state::AppState,
    storage::FileStateStorage,
};

#[derive(Debug, Deserialize, Validate)]
pub struct AddCartItemInput {
    pub product_id: Uuid,
    #[validate(range(min = 1, max = 99, message = "Quantity must be between 1 and 99"))]
    pub quantity: u32,
    #[serde(default)]
    pub service_type: ServiceType,
    pub fabric_id: Option<Uuid>,
    #[validate(nested)]
    pub measurements: Option<MeasurementValues>,
    #[validate(length(max = 500, message = "Notes are limited to 500 characters"))]
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct QuantityInput {
    pub quantity: i64,
}

#[derive(Debug, Deserialize)]
pub struct ServiceTypeInput {
    pub service_type: ServiceType,
}

#[derive(Debug, Serialize)]
pub struct CartLine {
    #[serde(flatten)]
    pub item: CartItem,
    pub unit_price: Decimal,
    pub line_total: Decimal,
    pub line_total_display: String,
}

#[derive(Debug, Serialize)]
pub struct CartView {
    pub items: Vec<CartLine>,
    pub is_open: bool,
    pub total_items: u64,
    pub total_price: Decimal,
    pub total_display: String,
}

impl From<Cart> for CartView {
    fn from(cart: Cart) -> Self {
        let total_items = cart.total_items();
        let total_price = cart.total_price();
        let items = cart
            .items
            .into_iter()
            .map(|item| CartLine {
                unit_price: item.charged_unit_price(),
                line_total: item.line_total(),
                line_total_display: format_currency(item.line_total()),
                item,
            })
            .collect();

        Self {
            items,
            is_open: cart.is_open,
            total_items,
            total_price,
            total_display: format_currency(total_price),
        }
    }
}

pub fn cart_storage(cookies: &Cookies, state: &AppState) -> FileStateStorage {
    visitor_storage(cookies, &state.config.state_storage_dir, state.config.cookie_secure)
}

/// Loads the cart from `storage`, applies `edit` and returns the result.
/// Every change is written through before this returns.
pub async fn edit_cart<F>(storage: FileStateStorage, edit: F) -> AppResult<Cart>
where
    F: FnOnce(&mut CartStore<FileStateStorage>) + Send + 'static,
{
    blocking(move || {
        let mut store = CartStore::load(storage);
        edit(&mut store);
        store.into_cart()
    })
    .await
}

pub async fn get_cart(State(state): State<AppState>, cookies: Cookies) -> AppResult<Json<ApiResponse<CartView>>> {
    let cart = edit_cart(cart_storage(&cookies, &state), |_| {}).await?;
    Ok(ok(CartView::from(cart)))
}

/// Prices the line from the catalogue; clients never supply the price.
pub async fn add_item(
    State(state): State<AppState>,
    cookies: Cookies,
    Json(input): Json<AddCartItemInput>,
) -> AppResult<(StatusCode, Json<ApiResponse<CartView>>)> {
    input.validate()?;

    let product = catalog::find_product(&state.db, input.product_id)
        .await?
        .ok_or_else(|| AppError::invalid("product_id", "Product is not available"))?;

    let fabric = match input.fabric_id {
        Some(fabric_id) => Some(
            catalog::find_fabric(&state.db, fabric_id)
                .await?
                .filter(|fabric| fabric.in_stock)
                .ok_or_else(|| AppError::invalid("fabric_id", "Fabric is not available"))?,
        ),
        None => None,
    };

    let item = NewCartItem {
        product_id: product.id,
        price: product.base_price + fabric.as_ref().map(Fabric::cost).unwrap_or_default(),
        image: product.images.0.first().cloned(),
        name: product.name,
        quantity: input.quantity,
        service_type: input.service_type,
        fabric_id: fabric.map(|fabric| fabric.id),
        measurements: input.measurements,
        notes: input.notes,
    };
    let cart = edit_cart(cart_storage(&cookies, &state), move |store| {
        store.add_item(item);
    })
    .await?;

    Ok(created(CartView::from(cart)))
}

pub async fn remove_item(
    State(state): State<AppState>,
    cookies: Cookies,
    Path(item_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<CartView>>> {
    let cart = edit_cart(cart_storage(&cookies, &state), move |store| store.remove_item(item_id)).await?;
    Ok(ok(CartView::from(cart)))
}

pub async fn update_quantity(
    State(state): State<AppState>,
    cookies: Cookies,
    Path(item_id): Path<Uuid>,
    Json(input): Json<QuantityInput>,
) -> AppResult<Json<ApiResponse<CartView>>> {
    let cart = edit_cart(cart_storage(&cookies, &state), move |store| {
        store.update_quantity(item_id, input.quantity)
    })
    .await?;
    Ok(ok(CartView::from(cart)))
}

pub async fn update_service_type(
    State(state): State<AppState>,
    cookies: Cookies,
    Path(item_id): Path<Uuid>,
    Json(input): Json<ServiceTypeInput>,
) -> AppResult<Json<ApiResponse<CartView>>> {
    let cart = edit_cart(cart_storage(&cookies, &state), move |store| {
        store.update_service_type(item_id, input.service_type)
    })
    .await?;
    Ok(ok(CartView::from(cart)))
}

pub async fn clear_cart(State(state): State<AppState>, cookies: Cookies) -> AppResult<Json<ApiResponse<CartView>>> {
    let cart = edit_cart(cart_storage(&cookies, &state), |store| store.clear_cart()).await?;
    Ok(ok(CartView::from(cart)))
}

pub async fn toggle_cart(State(state): State<AppState>, cookies: Cookies) -> AppResult<Json<ApiResponse<CartView>>> {
    let cart = edit_cart(cart_storage(&cookies, &state), |store| store.toggle_cart()).await?;
    Ok(ok(CartView::from(cart)))
}
