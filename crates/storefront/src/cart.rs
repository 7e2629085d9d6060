//! Shopping cart with durable persistence.
//!
//! The cart keeps a product snapshot per line, copied when the product is
//! added and never re-fetched. It is persisted as a JSON array under
//! [`keys::CART`].
//!
//! # Lifecycle
//!
//! A cart is created unhydrated, then [`Cart::hydrate`] reads the stored
//! array and enables writes. Mutations made before hydration only touch
//! memory, so an empty cart can never overwrite a stored one that has not
//! been read yet. After hydration every mutation writes the whole cart back.
//! Storage problems are logged and never surface to the caller.

use azlan_core::ProductId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::catalog::Product;
use crate::storage::{SharedStore, keys};

/// One cart line: the product as it was when added, plus a quantity.
///
/// Serialized flat, so a stored line looks like a product with a
/// `quantity` field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartEntry {
    #[serde(flatten)]
    pub product: Product,
    /// Always at least 1.
    pub quantity: u32,
}

impl CartEntry {
    #[must_use]
    pub const fn id(&self) -> ProductId {
        self.product.id
    }

    /// Effective price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.product.effective_price() * Decimal::from(self.quantity)
    }
}

pub struct Cart {
    entries: Vec<CartEntry>,
    store: SharedStore,
    hydrated: bool,
}

impl std::fmt::Debug for Cart {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cart")
            .field("entries", &self.entries)
            .field("hydrated", &self.hydrated)
            .finish_non_exhaustive()
    }
}

impl Cart {
    /// An empty, unhydrated cart backed by `store`.
    #[must_use]
    pub fn new(store: SharedStore) -> Self {
        Self {
            entries: Vec::new(),
            store,
            hydrated: false,
        }
    }

    /// Create a cart and immediately load it from `store`.
    #[must_use]
    pub fn load(store: SharedStore) -> Self {
        let mut cart = Self::new(store);
        cart.hydrate();
        cart
    }

    /// Read the stored cart and enable persistence.
    ///
    /// A missing, unreadable or malformed stored cart yields an empty cart.
    /// Calling this again after hydration does nothing.
    pub fn hydrate(&mut self) {
        if self.hydrated {
            return;
        }
        self.entries = match self.store.get(keys::CART) {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<CartEntry>>(&raw) {
                Ok(entries) => entries.into_iter().filter(|e| e.quantity > 0).collect(),
                Err(e) => {
                    tracing::error!(error = %e, "stored cart is corrupt, starting empty");
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::error!(error = %e, "failed to read stored cart, starting empty");
                Vec::new()
            }
        };
        self.hydrated = true;
        tracing::debug!(lines = self.entries.len(), "cart hydrated");
    }

    #[must_use]
    pub const fn is_hydrated(&self) -> bool {
        self.hydrated
    }

    fn persist(&self) {
        if !self.hydrated {
            return;
        }
        let result = serde_json::to_string(&self.entries)
            .map_err(|e| e.to_string())
            .and_then(|json| {
                self.store
                    .set(keys::CART, &json)
                    .map_err(|e| e.to_string())
            });
        if let Err(e) = result {
            tracing::error!(error = %e, "failed to persist cart");
        }
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Add `quantity` of `product`, merging with an existing line.
    ///
    /// A quantity of 0 does nothing. An existing line keeps its original
    /// snapshot; only the quantity grows.
    pub fn add(&mut self, product: &Product, quantity: u32) {
        if quantity == 0 {
            return;
        }
        if let Some(entry) = self.entries.iter_mut().find(|e| e.product.id == product.id) {
            entry.quantity = entry.quantity.saturating_add(quantity);
        } else {
            self.entries.push(CartEntry {
                product: product.clone(),
                quantity,
            });
        }
        self.persist();
    }

    /// Drop the line for `id`, if any.
    pub fn remove(&mut self, id: ProductId) {
        let before = self.entries.len();
        self.entries.retain(|e| e.product.id != id);
        if self.entries.len() != before {
            self.persist();
        }
    }

    /// Set the quantity of an existing line. Quantities below 1 are ignored;
    /// use [`Cart::remove`] to drop a line.
    pub fn update_quantity(&mut self, id: ProductId, quantity: u32) {
        if quantity < 1 {
            return;
        }
        if let Some(entry) = self.entries.iter_mut().find(|e| e.product.id == id) {
            entry.quantity = quantity;
            self.persist();
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.persist();
    }

    // =========================================================================
    // Lookups
    // =========================================================================

    #[must_use]
    pub fn contains(&self, id: ProductId) -> bool {
        self.entries.iter().any(|e| e.product.id == id)
    }

    /// Quantity of `id` in the cart, 0 when absent.
    #[must_use]
    pub fn quantity_of(&self, id: ProductId) -> u32 {
        self.entries
            .iter()
            .find(|e| e.product.id == id)
            .map_or(0, |e| e.quantity)
    }

    /// Sum of effective price times quantity.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.entries.iter().map(CartEntry::line_total).sum()
    }

    /// Sum of quantities.
    #[must_use]
    pub fn count(&self) -> u64 {
        self.entries.iter().map(|e| u64::from(e.quantity)).sum()
    }

    #[must_use]
    pub fn entries(&self) -> &[CartEntry] {
        &self.entries
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::Arc;

    use super::*;
    use crate::storage::{KeyValueStore, MemoryStore, StorageError};

    fn product(id: u64, price: i64, sale: Option<i64>) -> Product {
        Product {
            sale_price: sale.map(|s| Decimal::new(s, 0)),
            ..Product::new(ProductId::new(id), format!("Item {id}"), Decimal::new(price, 0))
        }
    }

    fn memory() -> (MemoryStore, SharedStore) {
        let store = MemoryStore::new();
        let shared: SharedStore = Arc::new(store.clone());
        (store, shared)
    }

    fn snapshot(cart: &Cart) -> BTreeMap<u64, u32> {
        cart.entries()
            .iter()
            .map(|e| (e.id().as_u64(), e.quantity))
            .collect()
    }

    #[test]
    fn test_adding_twice_merges_quantities() {
        let (_, store) = memory();
        let mut cart = Cart::load(store);
        let p = product(5, 500, None);

        cart.add(&p, 2);
        cart.add(&p, 1);

        assert_eq!(cart.entries().len(), 1);
        assert_eq!(cart.quantity_of(ProductId::new(5)), 3);
        assert_eq!(cart.total(), Decimal::new(1500, 0));
        assert_eq!(cart.count(), 3);
    }

    #[test]
    fn test_totals_use_effective_price() {
        let (_, store) = memory();
        let mut cart = Cart::load(store);
        cart.add(&product(1, 1000, Some(800)), 2);
        cart.add(&product(2, 2000, None), 1);
        cart.add(&product(3, 300, Some(0)), 3);

        assert_eq!(cart.total(), Decimal::new(1600 + 2000 + 900, 0));
        assert_eq!(cart.count(), 6);
    }

    #[test]
    fn test_update_quantity_ignores_zero() {
        let (_, store) = memory();
        let mut cart = Cart::load(store);
        cart.add(&product(1, 100, None), 4);

        let before = snapshot(&cart);
        cart.update_quantity(ProductId::new(1), 0);
        assert_eq!(snapshot(&cart), before);

        cart.update_quantity(ProductId::new(1), 7);
        assert_eq!(cart.quantity_of(ProductId::new(1)), 7);

        cart.update_quantity(ProductId::new(42), 7);
        assert!(!cart.contains(ProductId::new(42)));
    }

    #[test]
    fn test_lookups_on_absent_product() {
        let (_, store) = memory();
        let cart = Cart::load(store);
        assert!(!cart.contains(ProductId::new(9)));
        assert_eq!(cart.quantity_of(ProductId::new(9)), 0);
        assert!(cart.is_empty());
        assert_eq!(cart.total(), Decimal::ZERO);
    }

    #[test]
    fn test_remove_and_clear() {
        let (_, store) = memory();
        let mut cart = Cart::load(store);
        cart.add(&product(1, 100, None), 1);
        cart.add(&product(2, 100, None), 1);

        cart.remove(ProductId::new(1));
        cart.remove(ProductId::new(1));
        assert_eq!(snapshot(&cart), BTreeMap::from([(2, 1)]));

        cart.clear();
        assert!(cart.is_empty());
    }

    #[test]
    fn test_persist_and_reload_round_trip() {
        let (_, store) = memory();
        let mut cart = Cart::load(store.clone());
        cart.add(&product(1, 1000, Some(800)), 2);
        cart.add(&product(2, 2000, None), 1);

        let reloaded = Cart::load(store);
        assert_eq!(snapshot(&reloaded), snapshot(&cart));
        assert_eq!(reloaded.entries(), cart.entries());
    }

    #[test]
    fn test_stored_lines_are_flat_objects() {
        let (raw, store) = memory();
        let mut cart = Cart::load(store);
        cart.add(&product(5, 500, None), 2);

        let stored: serde_json::Value =
            serde_json::from_str(&raw.get(keys::CART).unwrap().unwrap()).unwrap();
        assert_eq!(stored[0]["id"], 5);
        assert_eq!(stored[0]["quantity"], 2);
        assert_eq!(stored[0]["name"], "Item 5");
    }

    #[test]
    fn test_mutations_before_hydration_do_not_overwrite_storage() {
        let (raw, store) = memory();
        {
            let mut saved = Cart::load(store.clone());
            saved.add(&product(1, 100, None), 3);
        }

        let mut cart = Cart::new(store.clone());
        cart.add(&product(2, 100, None), 1);
        let stored = raw.get(keys::CART).unwrap().unwrap();
        assert!(stored.contains("\"quantity\":3"));

        cart.hydrate();
        assert_eq!(snapshot(&cart), BTreeMap::from([(1, 3)]));
    }

    #[test]
    fn test_corrupt_storage_yields_empty_cart() {
        let (raw, store) = memory();
        raw.set(keys::CART, "{not json").unwrap();

        let mut cart = Cart::load(store);
        assert!(cart.is_empty());
        assert!(cart.is_hydrated());

        cart.add(&product(1, 100, None), 1);
        assert_eq!(cart.count(), 1);
    }

    struct BrokenStore;

    impl KeyValueStore for BrokenStore {
        fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            Err(StorageError::InvalidKey(key.to_string()))
        }

        fn set(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::Poisoned)
        }

        fn remove(&self, _key: &str) -> Result<(), StorageError> {
            Err(StorageError::Poisoned)
        }
    }

    #[test]
    fn test_storage_failures_are_swallowed() {
        let mut cart = Cart::load(Arc::new(BrokenStore));
        cart.add(&product(1, 100, None), 2);
        assert_eq!(cart.quantity_of(ProductId::new(1)), 2);
    }
}
