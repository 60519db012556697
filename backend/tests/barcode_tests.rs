//! Barcode normalization and resolution tests
//!
//! Tests for scanned-code handling including:
//! - Normalizer idempotence and output alphabet
//! - Resolver strategy order (exact, normalized, substring, fuzzy,
//!   prefix-stripped, date segment)
//! - Barcode generation format

use chrono::{NaiveDate, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;
use shared::{
    barcode_sequence, generate_barcode, levenshtein, normalize, resolve, resolve_with_strategy,
    validate_barcode_format, MatchStrategy, StockStatus, StockType, WarehouseItem,
    MAX_DAILY_SEQUENCE,
};
use uuid::Uuid;

// Helper to create a lot with the given barcode
fn lot(barcode: &str) -> WarehouseItem {
    let now = Utc::now();
    WarehouseItem {
        id: Uuid::new_v4(),
        barcode: barcode.to_string(),
        material: "LDPE".to_string(),
        cm: Decimal::from(100),
        mikron: Decimal::from(50),
        current_weight: Decimal::from(300),
        original_weight: Decimal::from(300),
        bobin_count: 3,
        original_bobin_count: Some(3),
        status: StockStatus::InStock,
        stock_type: StockType::General,
        customer_name: None,
        location: "Ana Depo".to_string(),
        supplier: None,
        order_id: None,
        notes: None,
        tags: vec![],
        entry_date: now,
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
    fn test_normalize_applies_confusables_in_order() {
        assert_eq!(normalize(" dk-250821 b16 "), "0K250821816");
        assert_eq!(normalize("OILSZBGQD"), "011528600");
        assert_eq!(normalize("--__  "), "");
    }

    #[test]
    fn test_exact_match_wins_over_fuzzy_neighbour() {
        let items = vec![lot("DK250821B17"), lot("DK250821B16")];
        let (hit, strategy) = resolve_with_strategy("DK250821B16", &items).unwrap();
        assert_eq!(hit.barcode, "DK250821B16");
        assert_eq!(strategy, MatchStrategy::Exact);
    }

    #[test]
    fn test_coil_suffix_resolves_to_parent() {
        let items = vec![lot("DK250821A01"), lot("DK250821B16")];
        let hit = resolve("DK250821B16-C01", &items).unwrap();
        assert_eq!(hit.barcode, "DK250821B16");

        let hit = resolve("dk250821b16-c12", &items).unwrap();
        assert_eq!(hit.barcode, "DK250821B16");
    }

    #[test]
    fn test_blank_query_resolves_nothing() {
        let items = vec![lot("DK250821B16")];
        assert!(resolve("", &items).is_none());
        assert!(resolve("   \t", &items).is_none());
    }

    #[test]
    fn test_normalized_match_handles_ocr_noise() {
        let items = vec![lot("WH17240001")];
        let (hit, strategy) = resolve_with_strategy("wh-1724-OOO1", &items).unwrap();
        assert_eq!(hit.barcode, "WH17240001");
        assert_eq!(strategy, MatchStrategy::Normalized);
    }

    #[test]
    fn test_substring_match_either_direction() {
        let items = vec![lot("WH17240001")];
        let (_, strategy) = resolve_with_strategy("1724000", &items).unwrap();
        assert_eq!(strategy, MatchStrategy::Substring);

        let (_, strategy) = resolve_with_strategy("XWH17240001X", &items).unwrap();
        assert_eq!(strategy, MatchStrategy::Substring);
    }

    #[test]
    fn test_fuzzy_bound_is_two_edits() {
        let items = vec![lot("WH17240001")];

        let (_, strategy) = resolve_with_strategy("WH17249901", &items).unwrap();
        assert_eq!(strategy, MatchStrategy::Fuzzy);

        assert!(resolve("WH17299901", &items).is_none());
    }

    #[test]
    fn test_fuzzy_returns_first_candidate_in_order() {
        let items = vec![lot("WH17240002"), lot("WH17240003")];
        let hit = resolve("WH17240004", &items).unwrap();
        assert_eq!(hit.barcode, "WH17240002");
    }

    #[test]
    fn test_prefix_stripped_match() {
        let items = vec![lot("WH1724ABC")];
        let (hit, strategy) = resolve_with_strategy("DK724ABC", &items).unwrap();
        assert_eq!(hit.barcode, "WH1724ABC");
        assert_eq!(strategy, MatchStrategy::PrefixStripped);
    }

    #[test]
    fn test_date_segment_match() {
        let items = vec![lot("WH99999999"), lot("DK250821B16")];
        let (hit, strategy) = resolve_with_strategy("DK250821ZZZZ", &items).unwrap();
        assert_eq!(hit.barcode, "DK250821B16");
        assert_eq!(strategy, MatchStrategy::DateSegment);
    }

    #[test]
    fn test_item_without_barcode_resolves_by_id() {
        let unlabelled = lot("");
        let id = unlabelled.id.to_string();
        let items = vec![unlabelled];

        let hit = resolve(&id, &items).unwrap();
        assert_eq!(hit.id.to_string(), id);
    }

    #[test]
    fn test_generated_barcode_is_valid() {
        let date = NaiveDate::from_ymd_opt(2025, 8, 21).unwrap();
        let code = generate_barcode(date, Some("bora ambalaj"), 16).unwrap();
        assert_eq!(code, "DK250821B16");
        assert!(validate_barcode_format(&code).is_ok());

        assert_eq!(generate_barcode(date, None, 1).as_deref(), Some("DK250821G01"));
        assert_eq!(generate_barcode(date, Some("  "), 3).as_deref(), Some("DK250821G03"));
    }

    #[test]
    fn test_daily_sequence_capped_at_two_digits() {
        let date = NaiveDate::from_ymd_opt(2025, 8, 21).unwrap();
        let last = generate_barcode(date, None, MAX_DAILY_SEQUENCE).unwrap();
        assert_eq!(last, "DK250821G99");
        assert_eq!(barcode_sequence(&last, "DK250821G"), Some(99));
        assert!(generate_barcode(date, None, MAX_DAILY_SEQUENCE + 1).is_none());
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    /// Strategy for generating current-format barcodes
    fn barcode_strategy() -> impl Strategy<Value = String> {
        (0u32..=99, 1u32..=12, 1u32..=28, prop::char::range('A', 'Z'), 1u32..=99).prop_map(
            |(y, m, d, initial, seq)| format!("DK{:02}{:02}{:02}{}{:02}", y, m, d, initial, seq),
        )
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// normalize(normalize(s)) == normalize(s)
        #[test]
        fn prop_normalize_idempotent(raw in ".{0,40}") {
            let once = normalize(&raw);
            prop_assert_eq!(normalize(&once), once);
        }

        /// Output is upper-case alphanumeric ASCII without confusable letters
        #[test]
        fn prop_normalize_alphabet(raw in ".{0,40}") {
            let out = normalize(&raw);
            prop_assert!(out.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
            prop_assert!(!out.chars().any(|c| "OILSZBGQD".contains(c)));
        }

        /// A barcode always resolves to itself, whatever its neighbours
        #[test]
        fn prop_exact_barcode_resolves_to_itself(
            codes in prop::collection::vec(barcode_strategy(), 1..20),
            pick in any::<prop::sample::Index>()
        ) {
            let items: Vec<WarehouseItem> = codes.iter().map(|c| lot(c)).collect();
            let target = &items[pick.index(items.len())];
            let hit = resolve(&target.barcode, &items).unwrap();
            prop_assert_eq!(&hit.barcode, &target.barcode);
        }

        /// Coil labels resolve like their lot
        #[test]
        fn prop_coil_label_resolves_like_lot(code in barcode_strategy(), coil in 1u32..=999) {
            let items = vec![lot(&code)];
            let hit = resolve(&format!("{}-C{:02}", code, coil), &items).unwrap();
            prop_assert_eq!(&hit.barcode, &code);
        }

        /// Edit distance is symmetric and bounded by the longer length
        #[test]
        fn prop_levenshtein_bounds(a in "[A-Z0-9]{0,12}", b in "[A-Z0-9]{0,12}") {
            let d = levenshtein(&a, &b);
            prop_assert_eq!(d, levenshtein(&b, &a));
            prop_assert!(d <= a.len().max(b.len()));
            prop_assert_eq!(levenshtein(&a, &a), 0);
        }
    }
}
