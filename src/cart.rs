//! Shopping cart state and its persisted container.
//!
//! Unit prices are stored as the product price; the service surcharge is
//! applied only when totals are read, so changing a line's service type
//! never rewrites its stored price.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    models::{MeasurementValues, ServiceType},
    pricing,
    storage::{load_state, save_state, StateStorage, CART_STORAGE_KEY},
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: Uuid,
    pub product_id: Uuid,
    pub name: String,
    pub price: Decimal,
    pub image: Option<String>,
    pub quantity: u32,
    pub service_type: ServiceType,
    pub fabric_id: Option<Uuid>,
    pub measurements: Option<MeasurementValues>,
    pub notes: Option<String>,
}

/// A cart line as submitted, before it has an identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCartItem {
    pub product_id: Uuid,
    pub name: String,
    pub price: Decimal,
    pub image: Option<String>,
    pub quantity: u32,
    #[serde(default)]
    pub service_type: ServiceType,
    pub fabric_id: Option<Uuid>,
    pub measurements: Option<MeasurementValues>,
    pub notes: Option<String>,
}

impl CartItem {
    pub fn charged_unit_price(&self) -> Decimal {
        pricing::calculate_price(self.price, self.service_type)
    }

    pub fn line_total(&self) -> Decimal {
        pricing::line_total(self.price, self.service_type, self.quantity)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    #[serde(default)]
    pub items: Vec<CartItem>,
    #[serde(default)]
    pub is_open: bool,
}

impl Cart {
    /// Appends a new line with a fresh id. Identical payloads are never
    /// merged. A zero quantity is refused.
    pub fn add_item(&mut self, item: NewCartItem) -> Option<Uuid> {
        if item.quantity == 0 {
            return None;
        }

        let id = Uuid::new_v4();
        self.items.push(CartItem {
            id,
            product_id: item.product_id,
            name: item.name,
            price: item.price,
            image: item.image,
            quantity: item.quantity,
            service_type: item.service_type,
            fabric_id: item.fabric_id,
            measurements: item.measurements,
            notes: item.notes,
        });
        Some(id)
    }

    pub fn remove_item(&mut self, id: Uuid) {
        self.items.retain(|item| item.id != id);
    }

    pub fn update_quantity(&mut self, id: Uuid, quantity: i64) {
        if quantity <= 0 {
            self.remove_item(id);
            return;
        }

        let quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
        if let Some(item) = self.items.iter_mut().find(|item| item.id == id) {
            item.quantity = quantity;
        }
    }

    pub fn update_service_type(&mut self, id: Uuid, service_type: ServiceType) {
        if let Some(item) = self.items.iter_mut().find(|item| item.id == id) {
            item.service_type = service_type;
        }
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn toggle(&mut self) {
        self.is_open = !self.is_open;
    }

    pub fn get(&self, id: Uuid) -> Option<&CartItem> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn total_items(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.quantity)).sum()
    }

    pub fn total_price(&self) -> Decimal {
        self.items.iter().map(CartItem::line_total).sum()
    }
}

/// Cart bound to a storage adapter. Every mutation is written through;
/// a failed write is logged and the in-memory cart stays authoritative.
#[derive(Debug)]
pub struct CartStore<S: StateStorage> {
    storage: S,
    cart: Cart,
}

impl<S: StateStorage> CartStore<S> {
    pub fn load(storage: S) -> Self {
        let cart = load_state(&storage, CART_STORAGE_KEY);
        Self { storage, cart }
    }

    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    pub fn into_cart(self) -> Cart {
        self.cart
    }

    pub fn add_item(&mut self, item: NewCartItem) -> Option<Uuid> {
        let id = self.cart.add_item(item);
        self.persist();
        id
    }

    pub fn remove_item(&mut self, id: Uuid) {
        self.cart.remove_item(id);
        self.persist();
    }

    pub fn update_quantity(&mut self, id: Uuid, quantity: i64) {
        self.cart.update_quantity(id, quantity);
        self.persist();
    }

    pub fn update_service_type(&mut self, id: Uuid, service_type: ServiceType) {
        self.cart.update_service_type(id, service_type);
        self.persist();
    }

    pub fn clear_cart(&mut self) {
        self.cart.clear();
        self.persist();
    }

    pub fn toggle_cart(&mut self) {
        self.cart.toggle();
        self.persist();
    }

    pub fn total_items(&self) -> u64 {
        self.cart.total_items()
    }

    pub fn total_price(&self) -> Decimal {
        self.cart.total_price()
    }

    fn persist(&self) {
        if let Err(e) = save_state(&self.storage, CART_STORAGE_KEY, &self.cart) {
            log::warn!("Failed to persist cart: {}", e);
        }
    }
}
