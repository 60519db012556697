//! Barcode issuing for new lots

use std::sync::Arc;

use chrono::NaiveDate;
use shared::{barcode_prefix, generate_barcode, StockType, MAX_DAILY_SEQUENCE};

use crate::error::{AppError, AppResult};
use crate::store::{NewLot, StoreError, StoredLot, WarehouseStore};

/// Issues `DK<YYMMDD><Initial><NN>` codes, numbering per date and initial
#[derive(Clone)]
pub struct BarcodeGenerator {
    store: Arc<dyn WarehouseStore>,
    max_attempts: u32,
}

impl BarcodeGenerator {
    pub fn new(store: Arc<dyn WarehouseStore>, max_attempts: u32) -> Self {
        Self {
            store,
            max_attempts: max_attempts.max(1),
        }
    }

    /// Sequence following the highest one already issued for the prefix
    async fn next_sequence(&self, prefix: &str) -> AppResult<u32> {
        let highest = self.store.max_barcode_sequence(prefix).await?;
        Ok(highest.unwrap_or(0).saturating_add(1))
    }

    /// Insert `lot` under a freshly issued barcode.
    ///
    /// Two lots received at the same moment can be issued the same code; the
    /// loser of the unique check takes the next number.
    pub async fn insert_with_new_barcode(&self, mut lot: NewLot) -> AppResult<StoredLot> {
        let date = lot.item.entry_date.date_naive();
        let customer = match lot.item.stock_type {
            StockType::Customer => lot.item.customer_name.clone(),
            StockType::General => None,
        };
        let prefix = barcode_prefix(date, customer.as_deref());
        let mut sequence = self.next_sequence(&prefix).await?;

        for attempt in 1..=self.max_attempts {
            lot.item.barcode = issue(date, customer.as_deref(), &prefix, sequence)?;
            match self.store.insert_lot(lot.clone()).await {
                Ok(stored) => return Ok(stored),
                Err(StoreError::DuplicateBarcode(code)) => {
                    tracing::warn!(barcode = %code, attempt, "Barcode taken, issuing another");
                    sequence = sequence.saturating_add(1);
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(AppError::Conflict {
            resource: "barcode".to_string(),
            message: "Could not issue a unique barcode, please retry".to_string(),
            message_tr: "Benzersiz barkod üretilemedi, lütfen tekrar deneyin".to_string(),
        })
    }
}

fn issue(
    date: NaiveDate,
    customer_name: Option<&str>,
    prefix: &str,
    sequence: u32,
) -> AppResult<String> {
    generate_barcode(date, customer_name, sequence).ok_or_else(|| AppError::Conflict {
        resource: "barcode".to_string(),
        message: format!(
            "All {} barcodes for {} are in use",
            MAX_DAILY_SEQUENCE, prefix
        ),
        message_tr: format!("{} için {} barkodun tamamı kullanılmış", prefix, MAX_DAILY_SEQUENCE),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use chrono::{TimeZone, Utc};
    use rust_decimal::Decimal;
    use shared::{NewWarehouseItem, StockStatus};

    fn new_item(customer: Option<&str>) -> NewWarehouseItem {
        NewWarehouseItem {
            barcode: String::new(),
            material: "LDPE".to_string(),
            cm: Decimal::from(100),
            mikron: Decimal::from(50),
            current_weight: Decimal::from(250),
            original_weight: Decimal::from(250),
            bobin_count: 2,
            original_bobin_count: Some(2),
            status: StockStatus::InStock,
            stock_type: if customer.is_some() {
                StockType::Customer
            } else {
                StockType::General
            },
            customer_name: customer.map(str::to_string),
            location: "Ana Depo".to_string(),
            supplier: None,
            order_id: None,
            notes: None,
            tags: vec![],
            entry_date: Utc.with_ymd_and_hms(2025, 8, 21, 9, 0, 0).unwrap(),
        }
    }

    async fn insert(generator: &BarcodeGenerator, customer: Option<&str>) -> StoredLot {
        generator
            .insert_with_new_barcode(NewLot::new(new_item(customer)))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_sequence_counts_per_prefix() {
        let store = Arc::new(MemoryStore::new());
        let generator = BarcodeGenerator::new(store.clone(), 3);

        let first = insert(&generator, Some("Bora Ambalaj")).await;
        let second = insert(&generator, Some("Bora Ambalaj")).await;
        let general = insert(&generator, None).await;

        assert_eq!(first.item.barcode, "DK250821B01");
        assert_eq!(second.item.barcode, "DK250821B02");
        assert_eq!(general.item.barcode, "DK250821G01");
        assert_eq!(first.receipt.warehouse_item_id, first.item.id);
    }

    #[tokio::test]
    async fn test_deleted_lot_does_not_block_new_codes() {
        let store = Arc::new(MemoryStore::new());
        let generator = BarcodeGenerator::new(store.clone(), 3);

        let first = insert(&generator, None).await;
        let second = insert(&generator, None).await;
        assert!(store.delete_warehouse_item(first.item.id).await.unwrap());

        let third = insert(&generator, None).await;
        assert_eq!(second.item.barcode, "DK250821G02");
        assert_eq!(third.item.barcode, "DK250821G03");
    }

    #[tokio::test]
    async fn test_sequence_follows_highest_existing_code() {
        let store = Arc::new(MemoryStore::new());
        let generator = BarcodeGenerator::new(store.clone(), 3);

        let mut manual = new_item(None);
        manual.barcode = "DK250821G05".to_string();
        store.insert_lot(NewLot::new(manual)).await.unwrap();

        let next = insert(&generator, None).await;
        assert_eq!(next.item.barcode, "DK250821G06");
    }

    #[tokio::test]
    async fn test_exhausted_day_is_a_conflict() {
        let store = Arc::new(MemoryStore::new());
        let generator = BarcodeGenerator::new(store.clone(), 3);

        let mut manual = new_item(None);
        manual.barcode = "DK250821G99".to_string();
        store.insert_lot(NewLot::new(manual)).await.unwrap();

        let err = generator
            .insert_with_new_barcode(NewLot::new(new_item(None)))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict { .. }));
        assert_eq!(
            store.list_warehouse_items(&Default::default()).await.unwrap().len(),
            1
        );
    }
}
