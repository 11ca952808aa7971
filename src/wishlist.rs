use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::storage::{load_state, save_state, StateStorage, WISHLIST_STORAGE_KEY};

/// Saved product ids, in the order they were added, without duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wishlist {
    #[serde(default)]
    items: Vec<Uuid>,
}

impl Wishlist {
    pub fn add_item(&mut self, product_id: Uuid) -> bool {
        if self.is_in_wishlist(product_id) {
            return false;
        }
        self.items.push(product_id);
        true
    }

    pub fn remove_item(&mut self, product_id: Uuid) -> bool {
        let before = self.items.len();
        self.items.retain(|id| *id != product_id);
        self.items.len() != before
    }

    pub fn is_in_wishlist(&self, product_id: Uuid) -> bool {
        self.items.contains(&product_id)
    }

    pub fn items(&self) -> &[Uuid] {
        &self.items
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

#[derive(Debug)]
pub struct WishlistStore<S: StateStorage> {
    storage: S,
    wishlist: Wishlist,
}

impl<S: StateStorage> WishlistStore<S> {
    pub fn load(storage: S) -> Self {
        let mut wishlist: Wishlist = load_state(&storage, WISHLIST_STORAGE_KEY);
        // Older or hand-edited state may carry repeats.
        let mut seen = Vec::with_capacity(wishlist.items.len());
        wishlist.items.retain(|id| {
            if seen.contains(id) {
                false
            } else {
                seen.push(*id);
                true
            }
        });
        Self { storage, wishlist }
    }

    pub fn wishlist(&self) -> &Wishlist {
        &self.wishlist
    }

    pub fn add_item(&mut self, product_id: Uuid) {
        if self.wishlist.add_item(product_id) {
            self.persist();
        }
    }

    pub fn remove_item(&mut self, product_id: Uuid) {
        if self.wishlist.remove_item(product_id) {
            self.persist();
        }
    }

    pub fn is_in_wishlist(&self, product_id: Uuid) -> bool {
        self.wishlist.is_in_wishlist(product_id)
    }

    pub fn clear(&mut self) {
        self.wishlist.clear();
        self.persist();
    }

    fn persist(&self) {
        if let Err(e) = save_state(&self.storage, WISHLIST_STORAGE_KEY, &self.wishlist) {
            log::warn!("Failed to persist wishlist: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStateStorage;

    #[test]
    fn adding_twice_keeps_one_entry() {
        let mut wishlist = Wishlist::default();
        let product = Uuid::new_v4();

        assert!(wishlist.add_item(product));
        assert!(!wishlist.add_item(product));

        assert_eq!(wishlist.items(), &[product]);
    }

    #[test]
    fn membership_follows_add_and_remove() {
        let mut wishlist = Wishlist::default();
        let kurta = Uuid::new_v4();
        let bandhgala = Uuid::new_v4();

        wishlist.add_item(kurta);
        wishlist.add_item(bandhgala);
        wishlist.remove_item(kurta);
        assert!(!wishlist.is_in_wishlist(kurta));
        assert!(wishlist.is_in_wishlist(bandhgala));

        wishlist.add_item(kurta);
        assert!(wishlist.is_in_wishlist(kurta));
        assert!(!wishlist.remove_item(Uuid::new_v4()));
        assert_eq!(wishlist.items(), &[bandhgala, kurta]);
    }

    #[test]
    fn store_persists_membership() {
        let storage = MemoryStateStorage::new();
        let product = Uuid::new_v4();

        let mut store = WishlistStore::load(&storage);
        store.add_item(product);
        store.add_item(product);
        drop(store);

        let reloaded = WishlistStore::load(&storage);
        assert!(reloaded.is_in_wishlist(product));
        assert_eq!(reloaded.wishlist().items().len(), 1);
    }

    #[test]
    fn duplicate_persisted_ids_are_collapsed() {
        let storage = MemoryStateStorage::new();
        let product = Uuid::new_v4();
        let raw = format!(r#"{{"state": {{"items": ["{0}", "{0}"]}}, "version": 0}}"#, product);
        storage.set_item(WISHLIST_STORAGE_KEY, &raw).unwrap();

        let store = WishlistStore::load(&storage);
        assert_eq!(store.wishlist().items(), &[product]);
    }

    #[test]
    fn corrupt_persisted_wishlist_loads_empty() {
        let storage = MemoryStateStorage::new();
        storage.set_item(WISHLIST_STORAGE_KEY, "[1, 2").unwrap();

        let store = WishlistStore::load(&storage);
        assert!(store.wishlist().items().is_empty());
    }
}
