//! Order service: create orders from the catalogue, track status.
//!
//! DESIGN
//! ======
//! An order copies the customer name and each product's name and price at
//! creation time, so later catalogue edits or deletions never rewrite
//! history. The total is the sum of line totals, rounded to cents.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::info;

use crate::activity::LogKind;
use crate::clock::now_ms;
use crate::model::{Order, OrderItem, OrderStatus};
use crate::services::customer::find_customer;
use crate::services::product::find_product;
use crate::services::{new_record_id, round_money};
use crate::state::AppState;
use crate::storage::Storage;

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum OrderError {
    #[error("order not found: {0}")]
    NotFound(String),
    #[error("customer not found: {0}")]
    CustomerNotFound(String),
    #[error("product not found: {0}")]
    ProductNotFound(String),
    #[error("an order needs at least one item")]
    NoItems,
    #[error("quantity for {0} must be at least 1")]
    ZeroQuantity(String),
    #[error("order total is too large to store")]
    TotalOverflow,
}

/// One requested line: product id and quantity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderLine {
    pub product_id: String,
    pub quantity: u32,
}

impl std::str::FromStr for OrderLine {
    type Err = String;

    /// `PRODUCT_ID` or `PRODUCT_ID:QTY`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (product_id, quantity) = match s.split_once(':') {
            Some((id, qty)) => {
                let qty = qty.trim().parse::<u32>().map_err(|e| format!("bad quantity in {s:?}: {e}"))?;
                (id.trim(), qty)
            }
            None => (s.trim(), 1),
        };
        if product_id.is_empty() {
            return Err(format!("missing product id in {s:?}"));
        }
        Ok(Self { product_id: product_id.to_owned(), quantity })
    }
}

/// Order counts per status plus revenue from orders that were not cancelled.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OrderSummary {
    pub total_orders: usize,
    pub by_status: BTreeMap<OrderStatus, usize>,
    pub revenue: f64,
}

// =============================================================================
// OPERATIONS
// =============================================================================

#[must_use]
pub fn find_order<'a, S: Storage>(state: &'a AppState<S>, id: &str) -> Option<&'a Order> {
    state.orders().iter().find(|o| o.id == id)
}

/// Create a pending order. New orders go to the front of the list.
///
/// # Errors
///
/// Returns `NoItems`, `ZeroQuantity`, `CustomerNotFound`, `ProductNotFound`,
/// or `TotalOverflow` when the total cannot be represented.
pub fn create_order<S: Storage>(
    state: &mut AppState<S>,
    customer_id: &str,
    lines: &[OrderLine],
    note: &str,
) -> Result<Order, OrderError> {
    if lines.is_empty() {
        return Err(OrderError::NoItems);
    }
    let customer = find_customer(state, customer_id).ok_or_else(|| OrderError::CustomerNotFound(customer_id.to_owned()))?;

    let mut items = Vec::with_capacity(lines.len());
    for line in lines {
        if line.quantity == 0 {
            return Err(OrderError::ZeroQuantity(line.product_id.clone()));
        }
        let product =
            find_product(state, &line.product_id).ok_or_else(|| OrderError::ProductNotFound(line.product_id.clone()))?;
        let item = OrderItem {
            product_id: product.id.clone(),
            product_name: product.name.clone(),
            price: product.price,
            quantity: line.quantity,
        };
        if !item.line_total().is_finite() {
            return Err(OrderError::TotalOverflow);
        }
        items.push(item);
    }

    // Non-finite numbers serialize as `null` and would not load back.
    let total = round_money(items.iter().map(OrderItem::line_total).sum());
    if !total.is_finite() {
        return Err(OrderError::TotalOverflow);
    }
    let order = Order {
        id: new_record_id(|candidate| find_order(state, candidate).is_some()),
        customer_id: customer.id.clone(),
        customer_name: customer.name.clone(),
        items,
        total,
        status: OrderStatus::Pending,
        note: note.trim().to_owned(),
        created_at: now_ms(),
    };

    let result = order.clone();
    state.update_orders(|orders| orders.insert(0, order));
    info!(id = %result.id, customer = %result.customer_name, total = result.total, "order created");
    state.log(format!("Order {} created for {} ({:.2})", result.id, result.customer_name, result.total), LogKind::Success);
    Ok(result)
}

/// Move an order to `status`.
///
/// # Errors
///
/// Returns `NotFound` for an unknown id.
pub fn set_order_status<S: Storage>(state: &mut AppState<S>, id: &str, status: OrderStatus) -> Result<Order, OrderError> {
    let Some(index) = state.orders().iter().position(|o| o.id == id) else {
        return Err(OrderError::NotFound(id.to_owned()));
    };
    let (previous, updated) = state.update_orders(|orders| {
        let order = &mut orders[index];
        let previous = order.status;
        order.status = status;
        (previous, order.clone())
    });
    info!(id, from = %previous, to = %status, "order status changed");
    state.log(format!("Order {id}: {previous} -> {status}"), LogKind::Success);
    Ok(updated)
}

/// Remove an order.
///
/// # Errors
///
/// Returns `NotFound` for an unknown id.
pub fn delete_order<S: Storage>(state: &mut AppState<S>, id: &str) -> Result<Order, OrderError> {
    let Some(index) = state.orders().iter().position(|o| o.id == id) else {
        return Err(OrderError::NotFound(id.to_owned()));
    };
    let removed = state.update_orders(|orders| orders.remove(index));
    info!(id, "order deleted");
    state.log(format!("Order {id} deleted"), LogKind::Info);
    Ok(removed)
}

#[must_use]
pub fn order_summary<S: Storage>(state: &AppState<S>) -> OrderSummary {
    let mut summary = OrderSummary { total_orders: state.orders().len(), ..OrderSummary::default() };
    let mut revenue = 0.0;
    for order in state.orders() {
        *summary.by_status.entry(order.status).or_insert(0) += 1;
        if order.status != OrderStatus::Cancelled {
            revenue += order.total;
        }
    }
    summary.revenue = round_money(revenue);
    summary
}

#[cfg(test)]
#[path = "order_test.rs"]
mod tests;
