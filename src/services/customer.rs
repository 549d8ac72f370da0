//! Customer service: address book create, update, delete.

use tracing::info;

use crate::activity::LogKind;
use crate::clock::now_ms;
use crate::model::Customer;
use crate::services::{new_record_id, non_blank};
use crate::state::AppState;
use crate::storage::Storage;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CustomerError {
    #[error("customer not found: {0}")]
    NotFound(String),
    #[error("customer name must not be empty")]
    EmptyName,
}

#[derive(Debug, Clone, Default)]
pub struct NewCustomer {
    pub name: String,
    pub phone: String,
    pub address: String,
    pub note: String,
}

/// Fields left `None` keep their current value.
#[derive(Debug, Clone, Default)]
pub struct CustomerPatch {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub note: Option<String>,
}

#[must_use]
pub fn find_customer<'a, S: Storage>(state: &'a AppState<S>, id: &str) -> Option<&'a Customer> {
    state.customers().iter().find(|c| c.id == id)
}

/// Add a customer to the address book.
///
/// # Errors
///
/// Returns `EmptyName` when the name is blank.
pub fn add_customer<S: Storage>(state: &mut AppState<S>, new: NewCustomer) -> Result<Customer, CustomerError> {
    let name = non_blank(&new.name).ok_or(CustomerError::EmptyName)?;
    let id = new_record_id(|candidate| find_customer(state, candidate).is_some());
    let customer = Customer {
        id,
        name,
        phone: new.phone.trim().to_owned(),
        address: new.address.trim().to_owned(),
        note: new.note.trim().to_owned(),
        created_at: now_ms(),
    };

    let result = customer.clone();
    state.update_customers(|customers| customers.push(customer));
    info!(id = %result.id, "customer added");
    state.log(format!("Customer added: {}", result.name), LogKind::Success);
    Ok(result)
}

/// Apply a patch to an existing customer.
///
/// # Errors
///
/// Returns `NotFound` for an unknown id, `EmptyName` for a blank new name.
pub fn update_customer<S: Storage>(
    state: &mut AppState<S>,
    id: &str,
    patch: CustomerPatch,
) -> Result<Customer, CustomerError> {
    let name = match patch.name.as_deref() {
        Some(raw) => Some(non_blank(raw).ok_or(CustomerError::EmptyName)?),
        None => None,
    };
    let Some(index) = state.customers().iter().position(|c| c.id == id) else {
        return Err(CustomerError::NotFound(id.to_owned()));
    };

    let updated = state.update_customers(|customers| {
        let customer = &mut customers[index];
        if let Some(name) = name {
            customer.name = name;
        }
        if let Some(phone) = patch.phone {
            customer.phone = phone.trim().to_owned();
        }
        if let Some(address) = patch.address {
            customer.address = address.trim().to_owned();
        }
        if let Some(note) = patch.note {
            customer.note = note.trim().to_owned();
        }
        customer.clone()
    });

    info!(id = %updated.id, "customer updated");
    state.log(format!("Customer updated: {}", updated.name), LogKind::Success);
    Ok(updated)
}

/// Remove a customer. Orders keep their copied customer name.
///
/// # Errors
///
/// Returns `NotFound` for an unknown id.
pub fn delete_customer<S: Storage>(state: &mut AppState<S>, id: &str) -> Result<Customer, CustomerError> {
    let Some(index) = state.customers().iter().position(|c| c.id == id) else {
        return Err(CustomerError::NotFound(id.to_owned()));
    };
    let removed = state.update_customers(|customers| customers.remove(index));
    info!(id = %removed.id, "customer deleted");
    state.log(format!("Customer deleted: {}", removed.name), LogKind::Info);
    Ok(removed)
}

#[cfg(test)]
#[path = "customer_test.rs"]
mod tests;
