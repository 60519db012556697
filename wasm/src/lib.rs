//! WebAssembly module for the Depo stock tracking client
//!
//! Provides client-side computation for:
//! - Barcode normalization and scan resolution against a cached item list
//! - Return pre-checks before the request is sent
//! - Order quantity suggestions
//! - Barcode format validation

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use wasm_bindgen::prelude::*;

// Re-export shared types for use in JavaScript
pub use shared::models::*;
pub use shared::types::*;
pub use shared::validation::*;

use shared::{
    coverage_percent, derive_original_bobin_count, generate_barcode, normalize,
    resolve_with_strategy, validate_return, MatchStrategy, ReturnRequest,
};

#[derive(Serialize)]
struct ScanMatch<'a> {
    found: bool,
    item: Option<&'a WarehouseItem>,
    strategy: Option<MatchStrategy>,
}

#[derive(Serialize)]
struct ReturnPreview {
    valid: bool,
    original_bobin_count: i32,
    error: Option<String>,
    warning: Option<String>,
}

/// Normalize a scanned code the way the server does before comparing
#[wasm_bindgen]
pub fn normalize_barcode(raw: &str) -> String {
    normalize(raw)
}

/// Resolve a scanned code against a JSON array of warehouse items
#[wasm_bindgen]
pub fn resolve_barcode(query: &str, items_json: &str) -> Result<String, JsValue> {
    resolve_json(query, items_json).map_err(|e| JsValue::from_str(&e))
}

fn resolve_json(query: &str, items_json: &str) -> Result<String, String> {
    let items: Vec<WarehouseItem> =
        serde_json::from_str(items_json).map_err(|e| format!("Invalid items JSON: {}", e))?;

    let hit = resolve_with_strategy(query, &items);
    let result = ScanMatch {
        found: hit.is_some(),
        item: hit.map(|(item, _)| item),
        strategy: hit.map(|(_, strategy)| strategy),
    };
    serde_json::to_string(&result).map_err(|e| e.to_string())
}

/// Original coil count of a lot given as JSON
#[wasm_bindgen]
pub fn original_bobin_count(item_json: &str) -> Result<i32, JsValue> {
    let item: WarehouseItem = serde_json::from_str(item_json)
        .map_err(|e| JsValue::from_str(&format!("Invalid item JSON: {}", e)))?;
    Ok(derive_original_bobin_count(&item))
}

/// Pre-check a return. Blocking problems and the ratio advisory are both reported in the result.
#[wasm_bindgen]
pub fn check_return(item_json: &str, request_json: &str) -> Result<String, JsValue> {
    check_return_json(item_json, request_json).map_err(|e| JsValue::from_str(&e))
}

fn check_return_json(item_json: &str, request_json: &str) -> Result<String, String> {
    let item: WarehouseItem =
        serde_json::from_str(item_json).map_err(|e| format!("Invalid item JSON: {}", e))?;
    let request: ReturnRequest =
        serde_json::from_str(request_json).map_err(|e| format!("Invalid request JSON: {}", e))?;

    let preview = match validate_return(&item, &request) {
        Ok(check) => ReturnPreview {
            valid: true,
            original_bobin_count: check.original_bobin_count,
            error: None,
            warning: check.warning.map(|w| w.to_string()),
        },
        Err(e) => ReturnPreview {
            valid: false,
            original_bobin_count: derive_original_bobin_count(&item),
            error: Some(e.to_string()),
            warning: None,
        },
    };
    serde_json::to_string(&preview).map_err(|e| e.to_string())
}

/// Quantity still to order once `available` kg of stock is used
#[wasm_bindgen]
pub fn optimized_order_quantity(required: f64, available: f64) -> f64 {
    (required - available.max(0.0)).max(0.0)
}

/// Share of `required` covered by `available`, 0-100
#[wasm_bindgen]
pub fn stock_coverage_percent(available: f64, required: f64) -> u32 {
    let available = Decimal::try_from(available).unwrap_or(Decimal::ZERO);
    let required = Decimal::try_from(required).unwrap_or(Decimal::ZERO);
    coverage_percent(available, required)
}

/// Whether a lot weight counts as low stock
#[wasm_bindgen]
pub fn is_low_stock_weight(weight: f64) -> bool {
    Decimal::try_from(weight)
        .map(is_low_stock)
        .unwrap_or(false)
}

/// Validate barcode format, returning the problem or an empty string
#[wasm_bindgen]
pub fn barcode_format_error(barcode: &str) -> String {
    match validate_barcode_format(barcode) {
        Ok(()) => String::new(),
        Err(e) => e.to_string(),
    }
}

/// Preview the barcode issued for a lot entered on the given day.
/// `None` for an invalid date or a sequence past the daily limit.
#[wasm_bindgen]
pub fn preview_barcode(
    year: i32,
    month: u32,
    day: u32,
    customer_name: Option<String>,
    sequence: u32,
) -> Option<String> {
    let date = NaiveDate::from_ymd_opt(year, month, day)?;
    generate_barcode(date, customer_name.as_deref(), sequence)
}
