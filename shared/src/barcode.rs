//! Barcode normalization, resolution and generation
//!
//! Scanned codes arrive from cameras and OCR with typical noise: lower case,
//! stray separators, `O` read instead of `0`, a coil suffix appended to the lot
//! code. [`resolve`] tries a fixed sequence of strategies against the full
//! item list and returns the first hit.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::models::WarehouseItem;

/// Prefix of barcodes issued by the current generator
pub const CURRENT_PREFIX: &str = "DK";

/// Prefix of barcodes issued before the `DK` format
pub const LEGACY_PREFIX: &str = "WH";

/// Maximum edit distance accepted by the fuzzy strategy
pub const MAX_EDIT_DISTANCE: usize = 2;

/// OCR confusables, applied in order
const CONFUSABLES: [(char, char); 9] = [
    ('O', '0'),
    ('I', '1'),
    ('L', '1'),
    ('S', '5'),
    ('Z', '2'),
    ('B', '8'),
    ('G', '6'),
    ('Q', '0'),
    ('D', '0'),
];

static COIL_SUFFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^([A-Z0-9]+)-C\d+$").expect("coil suffix pattern is valid")
});

/// Canonicalize a raw code: upper-case, keep `[A-Z0-9]`, replace OCR confusables.
pub fn normalize(raw: &str) -> String {
    let mut out: String = raw
        .trim()
        .to_uppercase()
        .chars()
        .filter(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
        .collect();
    for (from, to) in CONFUSABLES {
        out = out.replace(from, &to.to_string());
    }
    out
}

/// Reduce a coil-level code (`<lot>-C<n>`) to its parent lot code.
pub fn strip_coil_suffix(query: &str) -> &str {
    match COIL_SUFFIX.captures(query) {
        Some(caps) => caps.get(1).map_or(query, |m| m.as_str()),
        None => query,
    }
}

/// Which strategy produced a resolver hit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStrategy {
    Exact,
    Normalized,
    Substring,
    Fuzzy,
    PrefixStripped,
    DateSegment,
}

/// Find the item a scanned code refers to.
pub fn resolve<'a>(query: &str, candidates: &'a [WarehouseItem]) -> Option<&'a WarehouseItem> {
    resolve_with_strategy(query, candidates).map(|(item, _)| item)
}

/// Like [`resolve`], also reporting which strategy matched.
pub fn resolve_with_strategy<'a>(
    query: &str,
    candidates: &'a [WarehouseItem],
) -> Option<(&'a WarehouseItem, MatchStrategy)> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        return None;
    }
    let query = strip_coil_suffix(trimmed).to_uppercase();
    let codes: Vec<(&WarehouseItem, String)> =
        candidates.iter().map(|item| (item, item.scan_code())).collect();

    if let Some((item, _)) = codes.iter().find(|(_, code)| *code == query) {
        return Some((item, MatchStrategy::Exact));
    }

    let normalized_query = normalize(&query);
    if let Some((item, _)) = codes
        .iter()
        .find(|(_, code)| normalize(code) == normalized_query)
    {
        return Some((item, MatchStrategy::Normalized));
    }

    if let Some((item, _)) = codes
        .iter()
        .find(|(_, code)| code.contains(&query) || query.contains(code.as_str()))
    {
        return Some((item, MatchStrategy::Substring));
    }

    let query_len = query.chars().count();
    if let Some((item, _)) = codes.iter().find(|(_, code)| {
        code.chars().count().abs_diff(query_len) <= MAX_EDIT_DISTANCE
            && levenshtein(code, &query) <= MAX_EDIT_DISTANCE
    }) {
        return Some((item, MatchStrategy::Fuzzy));
    }

    for prefix in [LEGACY_PREFIX, CURRENT_PREFIX] {
        if let Some(rest) = query.strip_prefix(prefix) {
            if rest.is_empty() {
                continue;
            }
            if let Some((item, _)) = codes
                .iter()
                .find(|(_, code)| code.contains(rest) || code.ends_with(rest))
            {
                return Some((item, MatchStrategy::PrefixStripped));
            }
        }
    }

    if let Some(segment) = date_segment(&query) {
        if let Some((item, _)) = codes.iter().find(|(_, code)| code.contains(segment)) {
            return Some((item, MatchStrategy::DateSegment));
        }
    }

    None
}

/// The all-digit `YYMMDD` run following an optional `DK` prefix.
fn date_segment(query: &str) -> Option<&str> {
    if query.len() < 6 {
        return None;
    }
    let rest = query.strip_prefix(CURRENT_PREFIX).unwrap_or(query);
    let segment = rest.get(..6)?;
    segment
        .chars()
        .all(|c| c.is_ascii_digit())
        .then_some(segment)
}

/// Levenshtein edit distance over chars.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let b_chars: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=b_chars.len()).collect();
    let mut curr = vec![0; b_chars.len() + 1];

    for (i, ca) in a.chars().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b_chars.iter().enumerate() {
            let cost = usize::from(ca != *cb);
            curr[j + 1] = (prev[j] + cost).min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b_chars.len()]
}

/// Initial used in generated barcodes for general (non-customer) stock
pub const GENERAL_STOCK_INITIAL: char = 'G';

/// Barcode prefix for a receipt date and customer: `DK<YYMMDD><Initial>`
pub fn barcode_prefix(date: NaiveDate, customer_name: Option<&str>) -> String {
    let initial = customer_name
        .and_then(|name| name.chars().find(|c| c.is_ascii_alphabetic()))
        .map(|c| c.to_ascii_uppercase())
        .unwrap_or(GENERAL_STOCK_INITIAL);
    format!("{}{}{}", CURRENT_PREFIX, date.format("%y%m%d"), initial)
}

/// Highest daily sequence that fits the two-digit `NN` field
pub const MAX_DAILY_SEQUENCE: u32 = 99;

/// Generate a barcode: `DK<YYMMDD><Initial><NN>`.
///
/// `None` when `sequence` is outside `1..=MAX_DAILY_SEQUENCE`.
pub fn generate_barcode(
    date: NaiveDate,
    customer_name: Option<&str>,
    sequence: u32,
) -> Option<String> {
    if !(1..=MAX_DAILY_SEQUENCE).contains(&sequence) {
        return None;
    }
    Some(format!("{}{:02}", barcode_prefix(date, customer_name), sequence))
}

/// Sequence number of `barcode` under `prefix`, if the rest of the code is all digits
pub fn barcode_sequence(barcode: &str, prefix: &str) -> Option<u32> {
    let digits = barcode.strip_prefix(prefix)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_and_substitutes() {
        assert_eq!(normalize("  dk-25o8 21 "), "0K250821");
        assert_eq!(normalize("wh_12s"), "WH125");
    }

    #[test]
    fn test_normalize_empty() {
        assert_eq!(normalize("   "), "");
        assert_eq!(normalize("--//"), "");
    }

    #[test]
    fn test_strip_coil_suffix() {
        assert_eq!(strip_coil_suffix("DK250821B16-C01"), "DK250821B16");
        assert_eq!(strip_coil_suffix("dk250821b16-c3"), "dk250821b16");
        assert_eq!(strip_coil_suffix("DK250821B16-X01"), "DK250821B16-X01");
    }

    #[test]
    fn test_levenshtein() {
        assert_eq!(levenshtein("", ""), 0);
        assert_eq!(levenshtein("ABC", ""), 3);
        assert_eq!(levenshtein("KITTEN", "SITTING"), 3);
        assert_eq!(levenshtein("DK250821B16", "DK250821B17"), 1);
    }

    #[test]
    fn test_date_segment() {
        assert_eq!(date_segment("DK250821B16"), Some("250821"));
        assert_eq!(date_segment("250821"), Some("250821"));
        assert_eq!(date_segment("DK2508"), None);
        assert_eq!(date_segment("DKAB0821X"), None);
    }

    #[test]
    fn test_generate_barcode() {
        let date = NaiveDate::from_ymd_opt(2025, 8, 21).unwrap();
        assert_eq!(generate_barcode(date, Some("bereket"), 16).as_deref(), Some("DK250821B16"));
        assert_eq!(generate_barcode(date, None, 3).as_deref(), Some("DK250821G03"));
        assert_eq!(generate_barcode(date, Some("  "), 1).as_deref(), Some("DK250821G01"));
    }

    #[test]
    fn test_generate_barcode_stays_two_digits() {
        let date = NaiveDate::from_ymd_opt(2025, 8, 21).unwrap();
        assert_eq!(generate_barcode(date, None, 99).as_deref(), Some("DK250821G99"));
        assert!(generate_barcode(date, None, 100).is_none());
        assert!(generate_barcode(date, None, 0).is_none());
    }

    #[test]
    fn test_barcode_sequence() {
        assert_eq!(barcode_sequence("DK250821G07", "DK250821G"), Some(7));
        assert_eq!(barcode_sequence("DK250821G120", "DK250821G"), Some(120));
        assert_eq!(barcode_sequence("DK250821G", "DK250821G"), None);
        assert_eq!(barcode_sequence("DK250821G0A", "DK250821G"), None);
        assert_eq!(barcode_sequence("DK250821B07", "DK250821G"), None);
    }
}
