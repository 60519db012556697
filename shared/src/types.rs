//! Common query types used across the platform

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{Order, OrderStatus, StockStatus, WarehouseItem};

/// Filter for listing warehouse items
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ItemFilter {
    pub material: Option<String>,
    pub cm: Option<Decimal>,
    pub mikron: Option<Decimal>,
    pub status: Option<StockStatus>,
    pub supplier: Option<String>,
    /// Case-insensitive substring over barcode, material, customer and location
    pub search: Option<String>,
    pub min_weight: Option<Decimal>,
    pub max_weight: Option<Decimal>,
    /// Inclusive receipt date range
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
}

impl ItemFilter {
    /// Filter for lots with the given spec triple
    pub fn for_spec(material: &str, cm: Decimal, mikron: Decimal) -> Self {
        Self {
            material: Some(material.to_string()),
            cm: Some(cm),
            mikron: Some(mikron),
            ..Default::default()
        }
    }

    pub fn with_status(mut self, status: StockStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn matches(&self, item: &WarehouseItem) -> bool {
        if let Some(material) = &self.material {
            if &item.material != material {
                return false;
            }
        }
        if self.cm.is_some_and(|cm| item.cm != cm) {
            return false;
        }
        if self.mikron.is_some_and(|mikron| item.mikron != mikron) {
            return false;
        }
        if self.status.is_some_and(|status| item.status != status) {
            return false;
        }
        if let Some(supplier) = &self.supplier {
            if item.supplier.as_deref() != Some(supplier.as_str()) {
                return false;
            }
        }
        if self.min_weight.is_some_and(|min| item.current_weight < min) {
            return false;
        }
        if self.max_weight.is_some_and(|max| item.current_weight > max) {
            return false;
        }
        let entry = item.entry_date.date_naive();
        if self.date_from.is_some_and(|from| entry < from) {
            return false;
        }
        if self.date_to.is_some_and(|to| entry > to) {
            return false;
        }
        if let Some(search) = &self.search {
            let needle = search.trim().to_lowercase();
            if !needle.is_empty() {
                let haystacks = [
                    Some(item.barcode.as_str()),
                    Some(item.material.as_str()),
                    item.customer_name.as_deref(),
                    Some(item.location.as_str()),
                ];
                let hit = haystacks
                    .into_iter()
                    .flatten()
                    .any(|h| h.to_lowercase().contains(&needle));
                if !hit {
                    return false;
                }
            }
        }
        true
    }
}

/// Filter for listing orders
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    pub supplier: Option<String>,
    pub material: Option<String>,
}

impl OrderFilter {
    pub fn matches(&self, order: &Order) -> bool {
        self.status.is_none_or(|status| order.status == status)
            && self
                .supplier
                .as_ref()
                .is_none_or(|supplier| &order.supplier == supplier)
            && self
                .material
                .as_ref()
                .is_none_or(|material| &order.material == material)
    }
}
