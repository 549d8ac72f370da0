//! View state container.
//!
//! DESIGN
//! ======
//! `AppState` owns the three collections, the action log and the store.
//! Every mutation goes through a setter here, and each setter persists the
//! collection it touched right after the change. Persistence is
//! fire-and-forget from the caller's point of view: a failed write is traced
//! and logged as an ERROR notice while the in-memory change stands.
//!
//! Restore replaces all three collections wholesale, but only after the
//! caller-supplied confirmation returns true.

use std::path::{Path, PathBuf};

use tracing::{error, info};

use crate::activity::{ActionLog, LogEntry, LogKind};
use crate::backup::{self, Backup, BackupError, RestorePlan};
use crate::clock::now_ms;
use crate::model::{Collection, Collections, Customer, Order, Product};
use crate::storage::Storage;
use crate::store::Store;

/// Result of a restore attempt.
#[derive(Debug)]
pub enum RestoreOutcome {
    /// Collections were replaced. `skipped` counts dropped records.
    Restored { skipped: usize },
    /// The user declined; nothing changed.
    Declined,
    /// The text was not a usable backup; nothing changed.
    Rejected(BackupError),
}

pub struct AppState<S> {
    collections: Collections,
    logs: ActionLog,
    store: Store<S>,
}

impl<S: Storage> AppState<S> {
    /// Seed state from storage. Absent or unparsable blobs start empty.
    #[must_use]
    pub fn open(storage: S) -> Self {
        let store = Store::new(storage);
        let collections = store.load();
        info!(
            products = collections.products.len(),
            customers = collections.customers.len(),
            orders = collections.orders.len(),
            "state loaded"
        );
        Self { collections, logs: ActionLog::new(), store }
    }

    // =========================================================================
    // READ
    // =========================================================================

    #[must_use]
    pub fn products(&self) -> &[Product] {
        &self.collections.products
    }

    #[must_use]
    pub fn customers(&self) -> &[Customer] {
        &self.collections.customers
    }

    #[must_use]
    pub fn orders(&self) -> &[Order] {
        &self.collections.orders
    }

    #[must_use]
    pub fn collections(&self) -> &Collections {
        &self.collections
    }

    #[must_use]
    pub fn logs(&self) -> &ActionLog {
        &self.logs
    }

    #[must_use]
    pub fn storage(&self) -> &S {
        self.store.storage()
    }

    // =========================================================================
    // WRITE
    // =========================================================================

    pub fn set_products(&mut self, products: Vec<Product>) {
        self.collections.products = products;
        self.persist(Collection::Products);
    }

    pub fn set_customers(&mut self, customers: Vec<Customer>) {
        self.collections.customers = customers;
        self.persist(Collection::Customers);
    }

    pub fn set_orders(&mut self, orders: Vec<Order>) {
        self.collections.orders = orders;
        self.persist(Collection::Orders);
    }

    /// Mutate products in place, then persist them.
    pub fn update_products<R>(&mut self, f: impl FnOnce(&mut Vec<Product>) -> R) -> R {
        let result = f(&mut self.collections.products);
        self.persist(Collection::Products);
        result
    }

    pub fn update_customers<R>(&mut self, f: impl FnOnce(&mut Vec<Customer>) -> R) -> R {
        let result = f(&mut self.collections.customers);
        self.persist(Collection::Customers);
        result
    }

    pub fn update_orders<R>(&mut self, f: impl FnOnce(&mut Vec<Order>) -> R) -> R {
        let result = f(&mut self.collections.orders);
        self.persist(Collection::Orders);
        result
    }

    /// Append a notice to the action log.
    pub fn log(&mut self, message: impl Into<String>, kind: LogKind) -> &LogEntry {
        self.logs.push(message, kind)
    }

    fn persist(&mut self, collection: Collection) {
        if let Err(e) = self.store.save(collection, &self.collections) {
            error!(error = %e, %collection, "failed to persist collection");
            self.logs.push(format!("Failed to save {collection}: {e}"), LogKind::Error);
        }
    }

    // =========================================================================
    // BACKUP
    // =========================================================================

    /// Snapshot all collections with the current time.
    #[must_use]
    pub fn backup(&self) -> Backup {
        Backup::capture(&self.collections, now_ms())
    }

    /// Write a backup file into `dir` and log the result.
    ///
    /// # Errors
    ///
    /// Returns the write failure, which is also logged as an ERROR notice.
    pub fn export_backup(&mut self, dir: &Path, prefix: &str) -> Result<PathBuf, BackupError> {
        let snapshot = self.backup();
        match backup::write_backup(dir, prefix, &snapshot) {
            Ok(path) => {
                self.logs.push(format!("Backup exported to {}", path.display()), LogKind::Success);
                Ok(path)
            }
            Err(e) => {
                error!(error = %e, "backup export failed");
                self.logs.push(format!("Backup export failed: {e}"), LogKind::Error);
                Err(e)
            }
        }
    }

    /// Restore from backup text. `confirm` sees the parsed plan and decides
    /// whether to overwrite everything.
    pub fn restore_backup(&mut self, text: &str, confirm: impl FnOnce(&RestorePlan) -> bool) -> RestoreOutcome {
        let plan = match backup::parse_backup(text) {
            Ok(plan) => plan,
            Err(e) => {
                error!(error = %e, "backup restore rejected");
                self.logs.push("Backup file format error", LogKind::Error);
                return RestoreOutcome::Rejected(e);
            }
        };

        if !confirm(&plan) {
            info!("backup restore declined");
            return RestoreOutcome::Declined;
        }

        let RestorePlan { collections, skipped, .. } = plan;
        self.collections = collections;
        if let Err(e) = self.store.save_all(&self.collections) {
            error!(error = %e, "failed to persist restored data");
            self.logs.push(format!("Failed to save restored data: {e}"), LogKind::Error);
        }

        info!(skipped, "backup restored");
        let message = if skipped == 0 {
            "Data restored from backup".to_owned()
        } else {
            format!("Data restored from backup ({skipped} unreadable records skipped)")
        };
        self.logs.push(message, LogKind::Success);
        RestoreOutcome::Restored { skipped }
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================

#[cfg(test)]
pub mod test_helpers {
    use super::*;
    use crate::model::{OrderItem, OrderStatus};
    use crate::storage::{MemoryStorage, StorageError};

    /// Fresh state over empty in-memory storage.
    #[must_use]
    pub fn test_app_state() -> AppState<MemoryStorage> {
        AppState::open(MemoryStorage::new())
    }

    #[must_use]
    pub fn dummy_product(id: &str, price: f64) -> Product {
        Product {
            id: id.to_owned(),
            name: format!("product {id}"),
            price,
            unit: "pc".to_owned(),
            stock: None,
            description: String::new(),
            created_at: 1_700_000_000_000,
        }
    }

    #[must_use]
    pub fn dummy_customer(id: &str) -> Customer {
        Customer {
            id: id.to_owned(),
            name: format!("customer {id}"),
            phone: "555-0100".to_owned(),
            address: "1 Main St".to_owned(),
            note: String::new(),
            created_at: 1_700_000_000_000,
        }
    }

    #[must_use]
    pub fn dummy_order(id: &str, customer: &Customer, product: &Product, quantity: u32) -> Order {
        let item = OrderItem {
            product_id: product.id.clone(),
            product_name: product.name.clone(),
            price: product.price,
            quantity,
        };
        Order {
            id: id.to_owned(),
            customer_id: customer.id.clone(),
            customer_name: customer.name.clone(),
            total: item.line_total(),
            items: vec![item],
            status: OrderStatus::Pending,
            note: String::new(),
            created_at: 1_700_000_000_000,
        }
    }

    /// State seeded with one product, one customer and one order.
    #[must_use]
    pub fn seeded_app_state() -> AppState<MemoryStorage> {
        let mut state = test_app_state();
        let product = dummy_product("p1", 12.5);
        let customer = dummy_customer("c1");
        let order = dummy_order("o1", &customer, &product, 2);
        state.set_products(vec![product]);
        state.set_customers(vec![customer]);
        state.set_orders(vec![order]);
        state
    }

    /// Storage whose writes always fail; reads see nothing.
    #[derive(Debug, Default)]
    pub struct ReadOnlyStorage;

    impl Storage for ReadOnlyStorage {
        fn get_item(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Ok(None)
        }

        fn set_item(&mut self, key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::Io {
                key: key.to_owned(),
                source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
            })
        }

        fn remove_item(&mut self, _key: &str) -> Result<(), StorageError> {
            Ok(())
        }

        fn keys(&self) -> Result<Vec<String>, StorageError> {
            Ok(Vec::new())
        }
    }
}

#[cfg(test)]
#[path = "state_test.rs"]
mod tests;
