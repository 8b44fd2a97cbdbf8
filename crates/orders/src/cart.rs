use serde::{Deserialize, Serialize};

use larder_core::{DomainError, DomainResult, Sku};

/// A requested SKU and quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub sku: Sku,
    pub quantity: i64,
}

impl CartLine {
    pub fn new(sku: Sku, quantity: i64) -> Self {
        Self { sku, quantity }
    }
}

/// Customer details copied onto the order header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientInfo {
    pub name: String,
    pub document: String,
    pub phone: String,
    pub email: String,
    /// Channel the order came from.
    pub origin: String,
}

impl Default for ClientInfo {
    fn default() -> Self {
        Self {
            name: String::new(),
            document: String::new(),
            phone: String::new(),
            email: String::new(),
            origin: "app".to_string(),
        }
    }
}

/// Validate a cart and sum repeated SKUs, keeping first-seen order.
pub fn consolidate(cart: &[CartLine]) -> DomainResult<Vec<CartLine>> {
    if cart.is_empty() {
        return Err(DomainError::validation("cart is empty"));
    }

    let mut merged: Vec<CartLine> = Vec::with_capacity(cart.len());
    for line in cart {
        if line.quantity <= 0 {
            return Err(DomainError::validation(format!(
                "quantity for {} must be positive, got {}",
                line.sku, line.quantity
            )));
        }
        match merged.iter_mut().find(|m| m.sku == line.sku) {
            Some(existing) => {
                existing.quantity = existing.quantity.checked_add(line.quantity).ok_or_else(|| {
                    DomainError::validation(format!("quantity for {} is too large", line.sku))
                })?;
            }
            None => merged.push(line.clone()),
        }
    }
    Ok(merged)
}
