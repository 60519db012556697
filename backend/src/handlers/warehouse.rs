//! HTTP handlers for warehouse stock endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use shared::{
    AdjustmentRequest, ExitRequest, ItemFilter, ReturnRequest, StockMovement, StockSpec,
    StockSuggestion, WarehouseItem, WarehouseSummary,
};
use uuid::Uuid;
use validator::Validate;

use crate::error::AppResult;
use crate::services::ledger::{CreateItemInput, ReturnCheckResponse, ScanResult, StockUpdate};
use crate::services::{StockLedgerService, StockOptimizer};
use crate::AppState;

fn ledger(state: AppState) -> StockLedgerService {
    StockLedgerService::new(state.store, state.config.warehouse.clone())
}

/// Scan request body
#[derive(Debug, Deserialize, Validate)]
pub struct ScanInput {
    #[validate(length(max = 200))]
    pub query: String,
}

/// Movement listing query
#[derive(Debug, Deserialize)]
pub struct MovementQuery {
    pub item_id: Option<Uuid>,
}

/// Stock suggestion query
#[derive(Debug, Deserialize)]
pub struct StockSuggestionQuery {
    pub material: String,
    pub cm: Decimal,
    pub mikron: Decimal,
    pub required_quantity: Decimal,
}

/// Resolve a scanned code
pub async fn scan_barcode(
    State(state): State<AppState>,
    Json(input): Json<ScanInput>,
) -> AppResult<Json<ScanResult>> {
    input.validate()?;
    let result = ledger(state).scan(&input.query).await?;
    Ok(Json(result))
}

/// List warehouse items
pub async fn list_items(
    State(state): State<AppState>,
    Query(filter): Query<ItemFilter>,
) -> AppResult<Json<Vec<WarehouseItem>>> {
    let items = ledger(state).list_items(&filter).await?;
    Ok(Json(items))
}

/// Create a warehouse item by direct entry
pub async fn create_item(
    State(state): State<AppState>,
    Json(input): Json<CreateItemInput>,
) -> AppResult<Json<WarehouseItem>> {
    let item = ledger(state).create_item(input).await?;
    Ok(Json(item))
}

/// Get a warehouse item
pub async fn get_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<WarehouseItem>> {
    let item = ledger(state).get_item(id).await?;
    Ok(Json(item))
}

/// Manually adjust a warehouse item
pub async fn adjust_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<AdjustmentRequest>,
) -> AppResult<Json<StockUpdate>> {
    let update = ledger(state).record_adjustment(id, input).await?;
    Ok(Json(update))
}

/// Delete a warehouse item
pub async fn delete_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<()>> {
    ledger(state).delete_item(id).await?;
    Ok(Json(()))
}

/// Record outgoing stock
pub async fn record_exit(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<ExitRequest>,
) -> AppResult<Json<StockUpdate>> {
    let update = ledger(state).record_exit(id, input).await?;
    Ok(Json(update))
}

/// Record returned stock
pub async fn record_return(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<ReturnRequest>,
) -> AppResult<Json<StockUpdate>> {
    let update = ledger(state).record_return(id, input).await?;
    Ok(Json(update))
}

/// Validate a return before submitting it
pub async fn check_return(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<ReturnRequest>,
) -> AppResult<Json<ReturnCheckResponse>> {
    let check = ledger(state).check_return(id, &input).await?;
    Ok(Json(check.into()))
}

/// Movements of one warehouse item
pub async fn list_item_movements(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Vec<StockMovement>>> {
    let movements = ledger(state).list_movements(Some(id)).await?;
    Ok(Json(movements))
}

/// All movements, optionally for one item
pub async fn list_movements(
    State(state): State<AppState>,
    Query(query): Query<MovementQuery>,
) -> AppResult<Json<Vec<StockMovement>>> {
    let movements = ledger(state).list_movements(query.item_id).await?;
    Ok(Json(movements))
}

/// Warehouse totals
pub async fn get_warehouse_summary(
    State(state): State<AppState>,
) -> AppResult<Json<WarehouseSummary>> {
    let summary = ledger(state).warehouse_summary().await?;
    Ok(Json(summary))
}

/// Existing stock that could reduce an order
pub async fn get_stock_suggestion(
    State(state): State<AppState>,
    Query(query): Query<StockSuggestionQuery>,
) -> AppResult<Json<StockSuggestion>> {
    let service = StockOptimizer::new(state.store);
    let spec = StockSpec {
        material: query.material,
        cm: query.cm,
        mikron: query.mikron,
    };
    let suggestion = service.suggest(&spec, query.required_quantity).await?;
    Ok(Json(suggestion))
}
