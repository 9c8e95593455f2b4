use std::sync::Arc;

use tracing::{debug, info};

use crate::{AdvisorError, Product, Result, SelectionStore};

/// The user's chosen products, unique by name and persisted on every change.
pub struct SelectionSet {
    products: Vec<Product>,
    store: Arc<dyn SelectionStore>,
}

impl SelectionSet {
    /// Rehydrates from the store. Missing or malformed state yields an empty set.
    pub fn restore(store: Arc<dyn SelectionStore>) -> Self {
        let mut products: Vec<Product> = Vec::new();
        for p in store.load().unwrap_or_default() {
            if !products.iter().any(|s| s.name == p.name) {
                products.push(p);
            }
        }
        info!(count = products.len(), "Selection restored");
        Self { products, store }
    }

    /// Removes the product if one with the same name is selected, else appends it.
    /// Returns whether the product is selected afterwards.
    pub fn toggle(&mut self, product: &Product) -> Result<bool> {
        let mut next = self.products.clone();
        let selected = match self.position(&product.name) {
            Some(idx) => {
                next.remove(idx);
                false
            }
            None => {
                next.push(product.clone());
                true
            }
        };
        self.commit(next)?;
        debug!(name = %product.name, selected, "Selection toggled");
        Ok(selected)
    }

    pub fn remove_at(&mut self, index: usize) -> Result<Product> {
        if index >= self.products.len() {
            return Err(AdvisorError::SelectionIndex(index));
        }
        let mut next = self.products.clone();
        let removed = next.remove(index);
        self.commit(next)?;
        Ok(removed)
    }

    pub fn clear(&mut self) -> Result<()> {
        self.commit(Vec::new())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn names(&self) -> Vec<&str> {
        self.products.iter().map(|p| p.name.as_str()).collect()
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn iter(&self) -> impl Iterator<Item = &Product> {
        self.products.iter()
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.products.iter().position(|p| p.name == name)
    }

    /// The in-memory set only changes once the store has accepted it.
    fn commit(&mut self, next: Vec<Product>) -> Result<()> {
        self.store.save(&next)?;
        self.products = next;
        Ok(())
    }
}
