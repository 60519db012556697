//! Stock optimizer tests
//!
//! Tests for order quantity optimization including:
//! - Optimized quantity and coverage
//! - Spec and status filtering of candidate lots
//! - Oldest-first ordering of suggested lots

use chrono::{Duration, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;
use shared::{
    coverage_percent, suggest_optimized_quantity, StockSpec, StockStatus, StockType,
    WarehouseItem,
};
use std::str::FromStr;
use uuid::Uuid;

// Helper to create Decimal from string
fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn spec() -> StockSpec {
    StockSpec {
        material: "LDPE".to_string(),
        cm: dec("100"),
        mikron: dec("50"),
    }
}

// Helper to create an in-stock lot of the default spec received `days_ago`
fn lot(weight: &str, days_ago: i64) -> WarehouseItem {
    let now = Utc::now();
    WarehouseItem {
        id: Uuid::new_v4(),
        barcode: format!("DK250821G{:02}", days_ago),
        material: "LDPE".to_string(),
        cm: dec("100"),
        mikron: dec("50"),
        current_weight: dec(weight),
        original_weight: dec(weight),
        bobin_count: 1,
        original_bobin_count: Some(1),
        status: StockStatus::InStock,
        stock_type: StockType::General,
        customer_name: None,
        location: "Ana Depo".to_string(),
        supplier: None,
        order_id: None,
        notes: None,
        tags: vec![],
        entry_date: now - Duration::days(days_ago),
        version: 1,
        created_at: now,
        updated_at: now,
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_partial_coverage() {
        let newer = lot("25", 1);
        let older = lot("35", 10);
        let suggestion =
            suggest_optimized_quantity(&spec(), dec("100"), &[newer.clone(), older.clone()]);

        assert_eq!(suggestion.total_available, dec("60"));
        assert_eq!(suggestion.optimized_quantity, dec("40"));
        assert_eq!(suggestion.coverage_percent, 60);
        assert_eq!(suggestion.available_items[0].id, older.id);
        assert_eq!(suggestion.available_items[1].id, newer.id);
        assert!(suggestion.should_suggest(dec("100")));
    }

    #[test]
    fn test_full_coverage_is_not_suggested() {
        let suggestion = suggest_optimized_quantity(&spec(), dec("100"), &[lot("150", 3)]);

        assert_eq!(suggestion.optimized_quantity, Decimal::ZERO);
        assert_eq!(suggestion.coverage_percent, 100);
        assert!(!suggestion.should_suggest(dec("100")));
    }

    #[test]
    fn test_no_stock_is_not_suggested() {
        let suggestion = suggest_optimized_quantity(&spec(), dec("100"), &[]);

        assert_eq!(suggestion.total_available, Decimal::ZERO);
        assert_eq!(suggestion.optimized_quantity, dec("100"));
        assert_eq!(suggestion.coverage_percent, 0);
        assert!(!suggestion.should_suggest(dec("100")));
    }

    #[test]
    fn test_only_matching_available_lots_count() {
        let mut other_material = lot("40", 2);
        other_material.material = "HDPE".to_string();
        let mut other_width = lot("40", 2);
        other_width.cm = dec("120");
        let mut reserved = lot("40", 2);
        reserved.status = StockStatus::Reserved;
        let mut empty = lot("0", 2);
        empty.status = StockStatus::InStock;
        let matching = lot("30", 2);

        let suggestion = suggest_optimized_quantity(
            &spec(),
            dec("100"),
            &[other_material, other_width, reserved, empty, matching.clone()],
        );

        assert_eq!(suggestion.available_items.len(), 1);
        assert_eq!(suggestion.available_items[0].id, matching.id);
        assert_eq!(suggestion.total_available, dec("30"));
    }

    #[test]
    fn test_decimal_dimensions_match_numerically() {
        let mut item = lot("10", 1);
        item.mikron = dec("50.00");
        let suggestion = suggest_optimized_quantity(&spec(), dec("100"), &[item]);
        assert_eq!(suggestion.available_items.len(), 1);
    }

    #[test]
    fn test_coverage_rounding() {
        assert_eq!(coverage_percent(dec("1"), dec("3")), 33);
        assert_eq!(coverage_percent(dec("2"), dec("3")), 67);
        assert_eq!(coverage_percent(dec("1"), dec("200")), 1);
        assert_eq!(coverage_percent(dec("10"), Decimal::ZERO), 0);
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    /// Strategy for generating lot weights (0.1 to 500.0)
    fn weight_strategy() -> impl Strategy<Value = Decimal> {
        (1i64..=5000i64).prop_map(|n| Decimal::new(n, 1))
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Stock plus the optimized order always covers the requirement
        #[test]
        fn prop_optimized_quantity_covers_requirement(
            weights in prop::collection::vec(weight_strategy(), 0..8),
            required in weight_strategy()
        ) {
            let lots: Vec<WarehouseItem> = weights
                .iter()
                .enumerate()
                .map(|(i, w)| {
                    let mut item = lot("0", i as i64);
                    item.current_weight = *w;
                    item
                })
                .collect();

            let suggestion = suggest_optimized_quantity(&spec(), required, &lots);
            prop_assert!(suggestion.optimized_quantity >= Decimal::ZERO);
            prop_assert!(suggestion.optimized_quantity <= required);
            prop_assert!(suggestion.optimized_quantity + suggestion.total_available >= required);
            prop_assert!(suggestion.coverage_percent <= 100);
        }

        /// Suggested lots are ordered oldest receipt first
        #[test]
        fn prop_suggested_lots_fifo(days in prop::collection::vec(0i64..365, 1..8)) {
            let lots: Vec<WarehouseItem> = days.iter().map(|d| lot("10", *d)).collect();
            let suggestion = suggest_optimized_quantity(&spec(), dec("1000"), &lots);

            for pair in suggestion.available_items.windows(2) {
                prop_assert!(pair[0].entry_date <= pair[1].entry_date);
            }
        }
    }
}
