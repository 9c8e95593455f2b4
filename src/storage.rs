use std::path::Path;
use std::sync::{Arc, Mutex};

use sled::Db;
use tracing::{debug, warn};

use crate::{Product, Result};

/// Key holding the serialized selection.
pub const SELECTION_KEY: &str = "selectedProducts";

/// Durable home of the selected-products list.
pub trait SelectionStore: Send + Sync {
    /// Returns the persisted list, or `None` when nothing usable is stored.
    fn load(&self) -> Option<Vec<Product>>;
    /// Writes the list before returning.
    fn save(&self, products: &[Product]) -> Result<()>;
}

#[derive(Clone)]
pub struct SledSelectionStore {
    db: Db,
}

impl SledSelectionStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let db = sled::open(path)?;
        Ok(Self { db })
    }
}

impl SelectionStore for SledSelectionStore {
    fn load(&self) -> Option<Vec<Product>> {
        let raw = match self.db.get(SELECTION_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!(error = %e, "Could not read persisted selection");
                return None;
            }
        };
        match serde_json::from_slice(&raw) {
            Ok(products) => Some(products),
            Err(e) => {
                warn!(error = %e, "Persisted selection is malformed, starting empty");
                None
            }
        }
    }

    fn save(&self, products: &[Product]) -> Result<()> {
        let serialized = serde_json::to_vec(products)?;
        self.db.insert(SELECTION_KEY, serialized)?;
        self.db.flush()?;
        debug!(count = products.len(), "Selection persisted");
        Ok(())
    }
}

/// In-process store, shareable between clones.
#[derive(Clone, Default)]
pub struct MemorySelectionStore {
    raw: Arc<Mutex<Option<Vec<u8>>>>,
}

impl MemorySelectionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the store with raw bytes, valid or not.
    pub fn with_raw(raw: impl Into<Vec<u8>>) -> Self {
        Self { raw: Arc::new(Mutex::new(Some(raw.into()))) }
    }

    pub fn raw(&self) -> Option<Vec<u8>> {
        self.raw.lock().ok().and_then(|r| r.clone())
    }
}

impl SelectionStore for MemorySelectionStore {
    fn load(&self) -> Option<Vec<Product>> {
        let raw = self.raw()?;
        serde_json::from_slice(&raw)
            .inspect_err(|e| warn!(error = %e, "Stored selection is malformed, starting empty"))
            .ok()
    }

    fn save(&self, products: &[Product]) -> Result<()> {
        let serialized = serde_json::to_vec(products)?;
        if let Ok(mut raw) = self.raw.lock() {
            *raw = Some(serialized);
        }
        Ok(())
    }
}
