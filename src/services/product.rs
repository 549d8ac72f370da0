//! Product service: catalogue create, update, delete.

use tracing::info;

use crate::activity::LogKind;
use crate::clock::now_ms;
use crate::model::Product;
use crate::services::{new_record_id, non_blank};
use crate::state::AppState;
use crate::storage::Storage;

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ProductError {
    #[error("product not found: {0}")]
    NotFound(String),
    #[error("product name must not be empty")]
    EmptyName,
    #[error("invalid price: {0}")]
    InvalidPrice(f64),
}

#[derive(Debug, Clone, Default)]
pub struct NewProduct {
    pub name: String,
    pub price: f64,
    pub unit: String,
    pub stock: Option<u32>,
    pub description: String,
}

/// Fields left `None` keep their current value.
#[derive(Debug, Clone, Default)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub price: Option<f64>,
    pub unit: Option<String>,
    /// `Some(None)` stops tracking stock.
    pub stock: Option<Option<u32>>,
    pub description: Option<String>,
}

/// Largest unit price accepted. Keeps any `u32` quantity times the price
/// far inside `f64` range.
pub const MAX_PRICE: f64 = 1_000_000_000.0;

fn check_price(price: f64) -> Result<f64, ProductError> {
    if (0.0..=MAX_PRICE).contains(&price) { Ok(price) } else { Err(ProductError::InvalidPrice(price)) }
}

// =============================================================================
// OPERATIONS
// =============================================================================

#[must_use]
pub fn find_product<'a, S: Storage>(state: &'a AppState<S>, id: &str) -> Option<&'a Product> {
    state.products().iter().find(|p| p.id == id)
}

/// Add a product to the end of the catalogue.
///
/// # Errors
///
/// Returns `EmptyName` or `InvalidPrice` when validation fails.
pub fn add_product<S: Storage>(state: &mut AppState<S>, new: NewProduct) -> Result<Product, ProductError> {
    let name = non_blank(&new.name).ok_or(ProductError::EmptyName)?;
    let price = check_price(new.price)?;
    let id = new_record_id(|candidate| find_product(state, candidate).is_some());

    let product = Product {
        id,
        name,
        price,
        unit: new.unit.trim().to_owned(),
        stock: new.stock,
        description: new.description.trim().to_owned(),
        created_at: now_ms(),
    };

    let result = product.clone();
    state.update_products(|products| products.push(product));
    info!(id = %result.id, name = %result.name, "product added");
    state.log(format!("Product added: {}", result.name), LogKind::Success);
    Ok(result)
}

/// Apply a patch to an existing product.
///
/// # Errors
///
/// Returns `NotFound` for an unknown id, or a validation error.
pub fn update_product<S: Storage>(
    state: &mut AppState<S>,
    id: &str,
    patch: ProductPatch,
) -> Result<Product, ProductError> {
    let name = match patch.name.as_deref() {
        Some(raw) => Some(non_blank(raw).ok_or(ProductError::EmptyName)?),
        None => None,
    };
    let price = patch.price.map(check_price).transpose()?;
    let Some(index) = state.products().iter().position(|p| p.id == id) else {
        return Err(ProductError::NotFound(id.to_owned()));
    };

    let updated = state.update_products(|products| {
        let product = &mut products[index];
        if let Some(name) = name {
            product.name = name;
        }
        if let Some(price) = price {
            product.price = price;
        }
        if let Some(unit) = patch.unit {
            product.unit = unit.trim().to_owned();
        }
        if let Some(stock) = patch.stock {
            product.stock = stock;
        }
        if let Some(description) = patch.description {
            product.description = description.trim().to_owned();
        }
        product.clone()
    });

    info!(id = %updated.id, "product updated");
    state.log(format!("Product updated: {}", updated.name), LogKind::Success);
    Ok(updated)
}

/// Remove a product. Existing orders keep their copied name and price.
///
/// # Errors
///
/// Returns `NotFound` for an unknown id.
pub fn delete_product<S: Storage>(state: &mut AppState<S>, id: &str) -> Result<Product, ProductError> {
    let Some(index) = state.products().iter().position(|p| p.id == id) else {
        return Err(ProductError::NotFound(id.to_owned()));
    };
    let removed = state.update_products(|products| products.remove(index));
    info!(id = %removed.id, "product deleted");
    state.log(format!("Product deleted: {}", removed.name), LogKind::Info);
    Ok(removed)
}

#[cfg(test)]
#[path = "product_test.rs"]
mod tests;
