//! Validation utilities for the warehouse tracking platform

use rust_decimal::Decimal;

use crate::barcode::{CURRENT_PREFIX, LEGACY_PREFIX};
use crate::models::{NewOrder, NewWarehouseItem, StockType};

// ============================================================================
// Stock Validations
// ============================================================================

/// Validate a barcode: `DK` + YYMMDD + initial + 2+ digit sequence, or legacy `WH` + digits
pub fn validate_barcode_format(barcode: &str) -> Result<(), &'static str> {
    let code = barcode.trim().to_uppercase();
    if let Some(rest) = code.strip_prefix(CURRENT_PREFIX) {
        let bytes = rest.as_bytes();
        if bytes.len() < 9 {
            return Err("DK barcode is too short");
        }
        if !bytes[..6].iter().all(u8::is_ascii_digit) {
            return Err("DK barcode must contain a YYMMDD date");
        }
        if !bytes[6].is_ascii_uppercase() {
            return Err("DK barcode must contain a customer initial");
        }
        if !bytes[7..].iter().all(u8::is_ascii_digit) {
            return Err("DK barcode must end with a sequence number");
        }
        return Ok(());
    }
    if let Some(rest) = code.strip_prefix(LEGACY_PREFIX) {
        if rest.is_empty() || !rest.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err("Legacy WH barcode must be alphanumeric");
        }
        return Ok(());
    }
    Err("Barcode must start with DK or WH")
}

/// Validate width/thickness values
pub fn validate_dimension(value: Decimal) -> Result<(), &'static str> {
    if value <= Decimal::ZERO {
        return Err("Dimensions must be positive");
    }
    Ok(())
}

/// Validate a new lot before insertion
pub fn validate_new_item(item: &NewWarehouseItem) -> Result<(), &'static str> {
    if item.material.trim().is_empty() {
        return Err("Material is required");
    }
    validate_dimension(item.cm)?;
    validate_dimension(item.mikron)?;
    if item.original_weight <= Decimal::ZERO {
        return Err("Weight must be positive");
    }
    if item.current_weight < Decimal::ZERO || item.current_weight > item.original_weight {
        return Err("Current weight must be between 0 and the original weight");
    }
    if item.bobin_count < 0 {
        return Err("Coil count cannot be negative");
    }
    if item.location.trim().is_empty() {
        return Err("Location is required");
    }
    if item.stock_type == StockType::Customer
        && item
            .customer_name
            .as_deref()
            .is_none_or(|name| name.trim().is_empty())
    {
        return Err("Customer name is required for customer stock");
    }
    Ok(())
}

// ============================================================================
// Order Validations
// ============================================================================

/// Validate a new order
pub fn validate_new_order(order: &NewOrder) -> Result<(), &'static str> {
    if order.supplier.trim().is_empty() {
        return Err("Supplier is required");
    }
    if order.material.trim().is_empty() {
        return Err("Material is required");
    }
    validate_dimension(order.cm)?;
    validate_dimension(order.mikron)?;
    if order.quantity <= Decimal::ZERO {
        return Err("Quantity must be positive");
    }
    if order.price_per_unit.is_some_and(|p| p < Decimal::ZERO) {
        return Err("Unit price cannot be negative");
    }
    Ok(())
}
