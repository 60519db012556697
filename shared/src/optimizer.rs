//! Order quantity optimization against existing stock

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ledger::round_half_up;
use crate::models::WarehouseItem;

/// The spec triple stock is matched on
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StockSpec {
    pub material: String,
    pub cm: Decimal,
    pub mikron: Decimal,
}

impl StockSpec {
    pub fn matches(&self, item: &WarehouseItem) -> bool {
        item.material == self.material && item.cm == self.cm && item.mikron == self.mikron
    }
}

/// Existing stock that could cover part of a new order
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StockSuggestion {
    /// Matching lots, oldest receipt first
    pub available_items: Vec<WarehouseItem>,
    pub total_available: Decimal,
    /// Quantity still to order after using all available stock
    pub optimized_quantity: Decimal,
    /// Share of the requirement covered by stock, 0-100
    pub coverage_percent: u32,
}

impl StockSuggestion {
    /// Whether the suggestion is worth presenting: some, but not full, coverage
    pub fn should_suggest(&self, required_quantity: Decimal) -> bool {
        self.total_available > Decimal::ZERO && self.total_available < required_quantity
    }
}

/// Compute the optimized order quantity for `required_quantity` of `spec`.
///
/// `candidates` may be any superset of the matching lots; only in-stock lots of
/// the same spec with weight on hand are counted.
pub fn suggest_optimized_quantity(
    spec: &StockSpec,
    required_quantity: Decimal,
    candidates: &[WarehouseItem],
) -> StockSuggestion {
    let mut available_items: Vec<WarehouseItem> = candidates
        .iter()
        .filter(|item| spec.matches(item) && item.is_available())
        .cloned()
        .collect();
    available_items.sort_by_key(|item| item.entry_date);

    let total_available: Decimal = available_items.iter().map(|i| i.current_weight).sum();
    let optimized_quantity = (required_quantity - total_available).max(Decimal::ZERO);

    StockSuggestion {
        available_items,
        total_available,
        optimized_quantity,
        coverage_percent: coverage_percent(total_available, required_quantity),
    }
}

/// `min(100, round(100 * available / required))`, 0 when nothing is required
pub fn coverage_percent(total_available: Decimal, required_quantity: Decimal) -> u32 {
    if required_quantity <= Decimal::ZERO {
        return 0;
    }
    let percent = round_half_up(Decimal::ONE_HUNDRED * total_available / required_quantity);
    percent.min(Decimal::ONE_HUNDRED).to_u32().unwrap_or(0)
}
