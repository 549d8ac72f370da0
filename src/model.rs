//! Domain records: products, customers, orders.
//!
//! DESIGN
//! ======
//! Records are plain serde structs. Field names are camelCase so backups and
//! stored blobs stay readable by the browser build of the tool. Identifiers
//! are caller-assigned strings; nothing links collections together beyond
//! the ids copied into orders, which also snapshot names and prices.

use serde::{Deserialize, Serialize};

// =============================================================================
// PRODUCT
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub name: String,
    pub price: f64,
    /// Selling unit shown next to the price ("box", "kg", ...).
    #[serde(default)]
    pub unit: String,
    /// Units on hand; `None` means not tracked.
    #[serde(default)]
    pub stock: Option<u32>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub created_at: i64,
}

// =============================================================================
// CUSTOMER
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub note: String,
    #[serde(default)]
    pub created_at: i64,
}

// =============================================================================
// ORDER
// =============================================================================

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    #[default]
    Pending,
    Paid,
    Shipped,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [Self; 5] = [Self::Pending, Self::Paid, Self::Shipped, Self::Completed, Self::Cancelled];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Paid => "PAID",
            Self::Shipped => "SHIPPED",
            Self::Completed => "COMPLETED",
            Self::Cancelled => "CANCELLED",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown order status: {s}"))
    }
}

/// One order line. Name and price are copied from the product at order time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub product_id: String,
    #[serde(default)]
    pub product_name: String,
    pub price: f64,
    pub quantity: u32,
}

impl OrderItem {
    #[must_use]
    pub fn line_total(&self) -> f64 {
        self.price * f64::from(self.quantity)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    #[serde(default)]
    pub customer_id: String,
    #[serde(default)]
    pub customer_name: String,
    #[serde(default)]
    pub items: Vec<OrderItem>,
    #[serde(default)]
    pub total: f64,
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(default)]
    pub note: String,
    #[serde(default)]
    pub created_at: i64,
}

// =============================================================================
// COLLECTIONS
// =============================================================================

/// The three persisted collections.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Collection {
    Products,
    Customers,
    Orders,
}

impl Collection {
    pub const ALL: [Self; 3] = [Self::Products, Self::Customers, Self::Orders];

    /// Field name used inside backup documents.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Products => "products",
            Self::Customers => "customers",
            Self::Orders => "orders",
        }
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// All persisted state, as plain ordered lists.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Collections {
    pub products: Vec<Product>,
    pub customers: Vec<Customer>,
    pub orders: Vec<Order>,
}

impl Collections {
    #[must_use]
    pub fn len_of(&self, collection: Collection) -> usize {
        match collection {
            Collection::Products => self.products.len(),
            Collection::Customers => self.customers.len(),
            Collection::Orders => self.orders.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.products.is_empty() && self.customers.is_empty() && self.orders.is_empty()
    }
}

#[cfg(test)]
#[path = "model_test.rs"]
mod tests;
