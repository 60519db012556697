//! Stock ledger service: scanning, lot creation and every weight/coil mutation
//!
//! Mutations are planned by the pure functions in `shared::ledger` and applied
//! through [`WarehouseStore::apply_stock_change`], which only succeeds when the
//! lot is still at the version the plan was computed from. A conflicting write
//! re-reads the lot and plans again.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use shared::{
    plan_adjustment, plan_exit, plan_return, resolve_with_strategy,
    validate_barcode_format, validate_new_item, validate_return, AdjustmentRequest, ExitRequest,
    ItemFilter, LedgerError, LedgerPlan, MatchStrategy, NewWarehouseItem, RatioWarning,
    ReturnCheck, ReturnRequest, StockMovement, StockStatus, StockType, WarehouseItem,
    WarehouseSummary,
};
use uuid::Uuid;
use validator::Validate;

use crate::config::WarehouseSettings;
use crate::error::{AppError, AppResult};
use crate::services::{ActivityLog, BarcodeGenerator};
use crate::store::{NewLot, StockChange, StoreError, WarehouseStore};

/// Stock ledger service
#[derive(Clone)]
pub struct StockLedgerService {
    store: Arc<dyn WarehouseStore>,
    settings: WarehouseSettings,
    activity: ActivityLog,
    barcodes: BarcodeGenerator,
}

/// Result of resolving a scanned code
#[derive(Debug, Clone, Serialize)]
pub struct ScanResult {
    pub found: bool,
    pub item: Option<WarehouseItem>,
    pub strategy: Option<MatchStrategy>,
}

/// Input for direct stock entry
#[derive(Debug, Deserialize, Validate)]
pub struct CreateItemInput {
    #[validate(length(min = 1, max = 100))]
    pub material: String,
    pub cm: Decimal,
    pub mikron: Decimal,
    pub weight: Decimal,
    #[serde(default)]
    pub bobin_count: i32,
    #[serde(default)]
    pub stock_type: StockType,
    #[validate(length(max = 200))]
    pub customer_name: Option<String>,
    #[validate(length(max = 100))]
    pub location: Option<String>,
    #[validate(length(max = 200))]
    pub supplier: Option<String>,
    pub notes: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Existing label to keep, e.g. a legacy WH code; a new one is issued when absent
    #[validate(length(max = 64))]
    pub barcode: Option<String>,
    pub entry_date: Option<DateTime<Utc>>,
}

/// An applied ledger mutation
#[derive(Debug, Clone, Serialize)]
pub struct StockUpdate {
    pub item: WarehouseItem,
    pub movement: Option<StockMovement>,
    /// Advisory only, never blocks the update
    pub warning: Option<RatioWarning>,
}

/// Response of a return pre-check
#[derive(Debug, Clone, Serialize)]
pub struct ReturnCheckResponse {
    pub original_bobin_count: i32,
    pub warning: Option<RatioWarning>,
    pub warning_message: Option<String>,
}

impl From<ReturnCheck> for ReturnCheckResponse {
    fn from(check: ReturnCheck) -> Self {
        Self {
            original_bobin_count: check.original_bobin_count,
            warning_message: check.warning.as_ref().map(|w| w.to_string()),
            warning: check.warning,
        }
    }
}

impl StockLedgerService {
    pub fn new(store: Arc<dyn WarehouseStore>, settings: WarehouseSettings) -> Self {
        Self {
            activity: ActivityLog::new(store.clone()),
            barcodes: BarcodeGenerator::new(store.clone(), settings.max_update_attempts),
            store,
            settings,
        }
    }

    /// Resolve a scanned or typed code against every lot
    pub async fn scan(&self, query: &str) -> AppResult<ScanResult> {
        let items = self.store.list_warehouse_items(&ItemFilter::default()).await?;
        let hit = resolve_with_strategy(query, &items);

        if let Some((item, strategy)) = hit {
            tracing::debug!(query, barcode = %item.barcode, ?strategy, "Scan resolved");
        }

        Ok(ScanResult {
            found: hit.is_some(),
            item: hit.map(|(item, _)| item.clone()),
            strategy: hit.map(|(_, strategy)| strategy),
        })
    }

    pub async fn list_items(&self, filter: &ItemFilter) -> AppResult<Vec<WarehouseItem>> {
        Ok(self.store.list_warehouse_items(filter).await?)
    }

    pub async fn get_item(&self, id: Uuid) -> AppResult<WarehouseItem> {
        self.store
            .get_warehouse_item(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Warehouse item".to_string()))
    }

    /// Direct stock entry: issues a barcode, then stores the lot and its receipt together
    pub async fn create_item(&self, input: CreateItemInput) -> AppResult<WarehouseItem> {
        input.validate()?;

        let customer_name = match input.stock_type {
            StockType::Customer => input
                .customer_name
                .as_deref()
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(str::to_string),
            StockType::General => None,
        };
        let location = input
            .location
            .as_deref()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .unwrap_or(&self.settings.default_location)
            .to_string();

        let new_item = NewWarehouseItem {
            barcode: input
                .barcode
                .as_deref()
                .map(|b| b.trim().to_uppercase())
                .unwrap_or_default(),
            material: input.material.trim().to_string(),
            cm: input.cm,
            mikron: input.mikron,
            current_weight: input.weight,
            original_weight: input.weight,
            bobin_count: input.bobin_count,
            original_bobin_count: Some(input.bobin_count),
            status: StockStatus::InStock,
            stock_type: input.stock_type,
            customer_name,
            location,
            supplier: input.supplier,
            order_id: None,
            notes: input.notes,
            tags: input.tags,
            entry_date: input.entry_date.unwrap_or_else(Utc::now),
        };
        validate_new_item(&new_item).map_err(|e| AppError::ValidationError(e.to_string()))?;

        let stored = if new_item.barcode.is_empty() {
            self.barcodes.insert_with_new_barcode(NewLot::new(new_item)).await?
        } else {
            validate_barcode_format(&new_item.barcode).map_err(|e| AppError::Validation {
                field: "barcode".to_string(),
                message: e.to_string(),
                message_tr: "Barkod formatı geçersiz".to_string(),
            })?;
            self.store.insert_lot(NewLot::new(new_item)).await?
        };
        let item = stored.item;

        tracing::info!(
            item_id = %item.id,
            barcode = %item.barcode,
            weight = %item.original_weight,
            "Warehouse item created"
        );
        self.activity
            .log(
                "create_item",
                "warehouse_item",
                item.id,
                json!({ "barcode": item.barcode, "weight": item.original_weight }),
            )
            .await;

        Ok(item)
    }

    /// Take weight and/or coils out of a lot
    pub async fn record_exit(&self, id: Uuid, request: ExitRequest) -> AppResult<StockUpdate> {
        let (item, movement, ()) = self
            .mutate(id, |item| Ok((plan_exit(item, &request)?, ())))
            .await?;

        tracing::info!(
            item_id = %id,
            delta = %movement.as_ref().map(|m| m.quantity).unwrap_or_default(),
            operator = request.operator.as_deref().unwrap_or_default(),
            "Stock exit recorded"
        );
        self.activity
            .log(
                "stock_exit",
                "warehouse_item",
                id,
                json!({
                    "weight_exit": request.weight_exit,
                    "bobin_exit": request.bobin_exit,
                    "destination": request.exit_location,
                }),
            )
            .await;

        Ok(StockUpdate {
            item,
            movement,
            warning: None,
        })
    }

    /// Put returned stock back on a lot
    pub async fn record_return(&self, id: Uuid, request: ReturnRequest) -> AppResult<StockUpdate> {
        let default_location = self.settings.default_location.as_str();
        let (item, movement, check) = self
            .mutate(id, |item| plan_return(item, &request, default_location))
            .await?;

        if let Some(warning) = &check.warning {
            tracing::warn!(item_id = %id, "Implausible return ratio: {}", warning);
        }
        tracing::info!(
            item_id = %id,
            delta = %request.return_weight,
            operator = request.operator.as_deref().unwrap_or_default(),
            "Stock return recorded"
        );
        self.activity
            .log(
                "stock_return",
                "warehouse_item",
                id,
                json!({
                    "return_weight": request.return_weight,
                    "return_bobin_count": request.return_bobin_count,
                    "condition": request.condition,
                }),
            )
            .await;

        Ok(StockUpdate {
            item,
            movement,
            warning: check.warning,
        })
    }

    /// Validate a return without applying it
    pub async fn check_return(&self, id: Uuid, request: &ReturnRequest) -> AppResult<ReturnCheck> {
        let item = self.get_item(id).await?;
        Ok(validate_return(&item, request)?)
    }

    /// Overwrite a lot's quantities, location and status
    pub async fn record_adjustment(
        &self,
        id: Uuid,
        request: AdjustmentRequest,
    ) -> AppResult<StockUpdate> {
        let (item, movement, ()) = self
            .mutate(id, |item| Ok((plan_adjustment(item, &request)?, ())))
            .await?;

        tracing::info!(
            item_id = %id,
            delta = %movement.as_ref().map(|m| m.quantity).unwrap_or_default(),
            operator = request.operator.as_deref().unwrap_or_default(),
            "Stock adjusted"
        );
        self.activity
            .log(
                "stock_adjustment",
                "warehouse_item",
                id,
                json!({
                    "new_weight": request.new_weight,
                    "new_bobin_count": request.new_bobin_count,
                    "movement_written": movement.is_some(),
                }),
            )
            .await;

        Ok(StockUpdate {
            item,
            movement,
            warning: None,
        })
    }

    pub async fn delete_item(&self, id: Uuid) -> AppResult<()> {
        if !self.store.delete_warehouse_item(id).await? {
            return Err(AppError::NotFound("Warehouse item".to_string()));
        }
        tracing::info!(item_id = %id, "Warehouse item deleted");
        self.activity
            .log("delete_item", "warehouse_item", id, serde_json::Value::Null)
            .await;
        Ok(())
    }

    /// Movements, newest first; for one lot when `item_id` is given
    pub async fn list_movements(&self, item_id: Option<Uuid>) -> AppResult<Vec<StockMovement>> {
        if let Some(id) = item_id {
            self.get_item(id).await?;
        }
        Ok(self.store.list_movements(item_id).await?)
    }

    pub async fn warehouse_summary(&self) -> AppResult<WarehouseSummary> {
        let items = self.store.list_warehouse_items(&ItemFilter::default()).await?;
        Ok(WarehouseSummary::from_items(&items))
    }

    /// Read, plan and apply a change, re-planning on version conflicts
    async fn mutate<F, T>(
        &self,
        id: Uuid,
        plan: F,
    ) -> AppResult<(WarehouseItem, Option<StockMovement>, T)>
    where
        F: Fn(&WarehouseItem) -> Result<(LedgerPlan, T), LedgerError> + Send + Sync,
        T: Send,
    {
        for attempt in 1..=self.settings.max_update_attempts {
            let current = self.get_item(id).await?;
            let (planned, extra) = plan(&current)?;

            let change = StockChange {
                item: planned.item,
                movement: planned.movement,
            };
            match self.store.apply_stock_change(change).await {
                Ok((item, movement)) => return Ok((item, movement, extra)),
                Err(StoreError::VersionConflict { .. }) => {
                    tracing::warn!(item_id = %id, attempt, "Concurrent update detected, retrying");
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(AppError::ConcurrentModification(format!(
            "warehouse item {}",
            id
        )))
    }
}
