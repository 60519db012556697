//! Warehouse stock lot models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Items below this weight (kg) are reported as low stock
pub const LOW_STOCK_THRESHOLD_KG: Decimal = Decimal::from_parts(50, 0, 0, false, 0);

/// A physical stock lot tracked in the warehouse
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WarehouseItem {
    pub id: Uuid,
    /// Scanner-facing code (e.g., "DK250821B16", legacy "WH1724...")
    pub barcode: String,
    pub material: String,
    /// Film width
    pub cm: Decimal,
    /// Film thickness
    pub mikron: Decimal,
    pub current_weight: Decimal,
    pub original_weight: Decimal,
    /// Current coil count
    pub bobin_count: i32,
    /// Coil count at creation; absent on legacy rows
    pub original_bobin_count: Option<i32>,
    pub status: StockStatus,
    pub stock_type: StockType,
    /// Only set when `stock_type` is `Customer`
    pub customer_name: Option<String>,
    pub location: String,
    pub supplier: Option<String>,
    pub order_id: Option<Uuid>,
    pub notes: Option<String>,
    pub tags: Vec<String>,
    /// Receipt date, used for FIFO ordering
    pub entry_date: DateTime<Utc>,
    /// Row version for optimistic concurrency
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WarehouseItem {
    /// Code the resolver compares against. The id doubles as the barcode when none is stored.
    pub fn scan_code(&self) -> String {
        let barcode = self.barcode.trim();
        if barcode.is_empty() {
            self.id.to_string().to_uppercase()
        } else {
            barcode.to_uppercase()
        }
    }

    pub fn is_low_stock(&self) -> bool {
        is_low_stock(self.current_weight)
    }

    /// Whether the lot can be offered as available stock
    pub fn is_available(&self) -> bool {
        self.status == StockStatus::InStock && self.current_weight > Decimal::ZERO
    }
}

pub fn is_low_stock(weight: Decimal) -> bool {
    weight < LOW_STOCK_THRESHOLD_KG
}

/// Fields needed to create a warehouse item; the store assigns id, version and timestamps
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewWarehouseItem {
    pub barcode: String,
    pub material: String,
    pub cm: Decimal,
    pub mikron: Decimal,
    pub current_weight: Decimal,
    pub original_weight: Decimal,
    pub bobin_count: i32,
    pub original_bobin_count: Option<i32>,
    pub status: StockStatus,
    pub stock_type: StockType,
    pub customer_name: Option<String>,
    pub location: String,
    pub supplier: Option<String>,
    pub order_id: Option<Uuid>,
    pub notes: Option<String>,
    pub tags: Vec<String>,
    pub entry_date: DateTime<Utc>,
}

/// Stock status of a lot
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum StockStatus {
    #[serde(rename = "Stokta")]
    InStock,
    #[serde(rename = "Rezerve")]
    Reserved,
    #[serde(rename = "Stok Yok")]
    OutOfStock,
    #[serde(rename = "Hasarlı")]
    Damaged,
}

impl StockStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StockStatus::InStock => "Stokta",
            StockStatus::Reserved => "Rezerve",
            StockStatus::OutOfStock => "Stok Yok",
            StockStatus::Damaged => "Hasarlı",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Stokta" => Some(StockStatus::InStock),
            "Rezerve" => Some(StockStatus::Reserved),
            "Stok Yok" => Some(StockStatus::OutOfStock),
            "Hasarlı" => Some(StockStatus::Damaged),
            _ => None,
        }
    }
}

impl std::fmt::Display for StockStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a lot is general stock or reserved to a customer
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StockType {
    #[default]
    General,
    Customer,
}

impl StockType {
    pub fn as_str(&self) -> &'static str {
        match self {
            StockType::General => "general",
            StockType::Customer => "customer",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "general" => Some(StockType::General),
            "customer" => Some(StockType::Customer),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trips_through_str() {
        for status in [
            StockStatus::InStock,
            StockStatus::Reserved,
            StockStatus::OutOfStock,
            StockStatus::Damaged,
        ] {
            assert_eq!(StockStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(StockStatus::parse("stokta"), None);
    }

    #[test]
    fn test_status_serializes_to_turkish_label() {
        let json = serde_json::to_string(&StockStatus::OutOfStock).unwrap();
        assert_eq!(json, "\"Stok Yok\"");
    }

    #[test]
    fn test_low_stock_threshold() {
        assert!(is_low_stock(Decimal::from(49)));
        assert!(!is_low_stock(Decimal::from(50)));
    }
}
