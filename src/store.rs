//! Persistent store adapter: one JSON blob per collection.
//!
//! DESIGN
//! ======
//! Each collection lives under a fixed storage key as a JSON array. A save
//! serializes the whole collection and overwrites the key; there is no
//! partial update. Loading is forgiving: a key that is absent, unreadable or
//! not a parsable array seeds an empty collection instead of failing, and
//! inside an array each record that does not fit the model is dropped on its
//! own so the rest still load.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::backup::typed_records;
use crate::model::{Collection, Collections};
use crate::storage::{Storage, StorageError};

pub const PRODUCTS_KEY: &str = "psh_products";
pub const CUSTOMERS_KEY: &str = "psh_customers";
pub const ORDERS_KEY: &str = "psh_orders";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to encode {collection}: {source}")]
    Encode {
        collection: Collection,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Storage key holding `collection`.
#[must_use]
pub fn storage_key(collection: Collection) -> &'static str {
    match collection {
        Collection::Products => PRODUCTS_KEY,
        Collection::Customers => CUSTOMERS_KEY,
        Collection::Orders => ORDERS_KEY,
    }
}

/// Typed wrapper over a [`Storage`] backend.
#[derive(Debug)]
pub struct Store<S> {
    storage: S,
}

impl<S: Storage> Store<S> {
    #[must_use]
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    #[must_use]
    pub fn storage(&self) -> &S {
        &self.storage
    }

    #[must_use]
    pub fn into_inner(self) -> S {
        self.storage
    }

    /// Seed all collections from storage. Never fails.
    #[must_use]
    pub fn load(&self) -> Collections {
        Collections {
            products: self.load_one(Collection::Products),
            customers: self.load_one(Collection::Customers),
            orders: self.load_one(Collection::Orders),
        }
    }

    fn load_one<T: DeserializeOwned>(&self, collection: Collection) -> Vec<T> {
        let key = storage_key(collection);
        let raw = match self.storage.get_item(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!(error = %e, key, "stored collection unreadable; starting empty");
                return Vec::new();
            }
        };
        let items = match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Array(items)) => items,
            Ok(_) => {
                warn!(key, "stored collection is not an array; starting empty");
                return Vec::new();
            }
            Err(e) => {
                warn!(error = %e, key, "stored collection unparsable; starting empty");
                return Vec::new();
            }
        };
        let (records, skipped) = typed_records::<T>(items, collection);
        if skipped > 0 {
            warn!(key, skipped, kept = records.len(), "stored collection had unreadable records");
        } else {
            debug!(key, count = records.len(), "collection loaded");
        }
        records
    }

    /// Overwrite the stored blob for one collection.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding or the storage write fails.
    pub fn save(&mut self, collection: Collection, collections: &Collections) -> Result<(), StoreError> {
        match collection {
            Collection::Products => self.write(collection, &collections.products),
            Collection::Customers => self.write(collection, &collections.customers),
            Collection::Orders => self.write(collection, &collections.orders),
        }
    }

    /// Overwrite all three blobs, stopping at the first failure.
    ///
    /// # Errors
    ///
    /// Returns the first failing save.
    pub fn save_all(&mut self, collections: &Collections) -> Result<(), StoreError> {
        for collection in Collection::ALL {
            self.save(collection, collections)?;
        }
        Ok(())
    }

    fn write<T: Serialize>(&mut self, collection: Collection, items: &[T]) -> Result<(), StoreError> {
        let json = serde_json::to_string(items).map_err(|source| StoreError::Encode { collection, source })?;
        self.storage.set_item(storage_key(collection), &json)?;
        debug!(key = storage_key(collection), count = items.len(), "collection saved");
        Ok(())
    }
}

#[cfg(test)]
#[path = "store_test.rs"]
mod tests;
