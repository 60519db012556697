//! Stock optimizer service

use std::sync::Arc;

use rust_decimal::Decimal;
use shared::{suggest_optimized_quantity, ItemFilter, StockSpec, StockStatus, StockSuggestion};

use crate::error::{AppError, AppResult};
use crate::store::WarehouseStore;

/// Looks up in-stock lots that could cover part of an order
#[derive(Clone)]
pub struct StockOptimizer {
    store: Arc<dyn WarehouseStore>,
}

impl StockOptimizer {
    pub fn new(store: Arc<dyn WarehouseStore>) -> Self {
        Self { store }
    }

    pub async fn suggest(
        &self,
        spec: &StockSpec,
        required_quantity: Decimal,
    ) -> AppResult<StockSuggestion> {
        if required_quantity < Decimal::ZERO {
            return Err(AppError::Validation {
                field: "required_quantity".to_string(),
                message: "Required quantity cannot be negative".to_string(),
                message_tr: "İstenen miktar negatif olamaz".to_string(),
            });
        }

        let filter = ItemFilter::for_spec(&spec.material, spec.cm, spec.mikron)
            .with_status(StockStatus::InStock);
        let candidates = self.store.list_warehouse_items(&filter).await?;

        Ok(suggest_optimized_quantity(spec, required_quantity, &candidates))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, NewLot};
    use chrono::{Duration, Utc};
    use shared::{NewWarehouseItem, StockType};

    fn lot(material: &str, weight: i64, days_ago: i64, status: StockStatus) -> NewWarehouseItem {
        NewWarehouseItem {
            barcode: format!("DK250821G{:02}", days_ago),
            material: material.to_string(),
            cm: Decimal::from(100),
            mikron: Decimal::from(50),
            current_weight: Decimal::from(weight),
            original_weight: Decimal::from(weight.max(1)),
            bobin_count: 1,
            original_bobin_count: Some(1),
            status,
            stock_type: StockType::General,
            customer_name: None,
            location: "Ana Depo".to_string(),
            supplier: None,
            order_id: None,
            notes: None,
            tags: vec![],
            entry_date: Utc::now() - Duration::days(days_ago),
        }
    }

    fn spec() -> StockSpec {
        StockSpec {
            material: "LDPE".to_string(),
            cm: Decimal::from(100),
            mikron: Decimal::from(50),
        }
    }

    #[tokio::test]
    async fn test_partial_coverage_oldest_first() {
        let store = Arc::new(MemoryStore::new());
        store.insert_lot(NewLot::new(lot("LDPE", 25, 1, StockStatus::InStock))).await.unwrap();
        store.insert_lot(NewLot::new(lot("LDPE", 35, 9, StockStatus::InStock))).await.unwrap();
        store.insert_lot(NewLot::new(lot("LDPE", 80, 3, StockStatus::Reserved))).await.unwrap();
        store.insert_lot(NewLot::new(lot("HDPE", 90, 4, StockStatus::InStock))).await.unwrap();
        store.insert_lot(NewLot::new(lot("LDPE", 0, 5, StockStatus::InStock))).await.unwrap();

        let optimizer = StockOptimizer::new(store);
        let suggestion = optimizer.suggest(&spec(), Decimal::from(100)).await.unwrap();

        assert_eq!(suggestion.total_available, Decimal::from(60));
        assert_eq!(suggestion.optimized_quantity, Decimal::from(40));
        assert_eq!(suggestion.coverage_percent, 60);
        assert_eq!(suggestion.available_items.len(), 2);
        assert_eq!(suggestion.available_items[0].current_weight, Decimal::from(35));
        assert!(suggestion.should_suggest(Decimal::from(100)));
    }

    #[tokio::test]
    async fn test_no_stock_is_not_suggested() {
        let optimizer = StockOptimizer::new(Arc::new(MemoryStore::new()));
        let suggestion = optimizer.suggest(&spec(), Decimal::from(100)).await.unwrap();

        assert_eq!(suggestion.total_available, Decimal::ZERO);
        assert_eq!(suggestion.optimized_quantity, Decimal::from(100));
        assert!(!suggestion.should_suggest(Decimal::from(100)));
    }

    #[test]
    fn test_negative_requirement_rejected() {
        let optimizer = StockOptimizer::new(Arc::new(MemoryStore::new()));
        let result = tokio_test::block_on(optimizer.suggest(&spec(), Decimal::from(-5)));

        match result {
            Err(AppError::Validation { field, .. }) => assert_eq!(field, "required_quantity"),
            other => panic!("expected validation error, got {:?}", other.map(|s| s.coverage_percent)),
        }
    }
}
