//! HTTP handlers for orders and their warehouse linkage

use axum::{
    extract::{Path, Query, State},
    Json,
};
use shared::{
    Order, OrderFilter, OrderWarehouseStatus, ReceiveRequest, ReconciliationSummary,
    WarehouseItem,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::services::orders::{CreateOrderInput, OrderCreated, UpdateOrderStatusInput};
use crate::services::{OrderService, OrderWarehouseService};
use crate::AppState;

fn reconciler(state: AppState) -> OrderWarehouseService {
    OrderWarehouseService::new(state.store, state.config.warehouse.clone())
}

/// List orders
pub async fn list_orders(
    State(state): State<AppState>,
    Query(filter): Query<OrderFilter>,
) -> AppResult<Json<Vec<Order>>> {
    let service = OrderService::new(state.store);
    let orders = service.list(&filter).await?;
    Ok(Json(orders))
}

/// Create an order
pub async fn create_order(
    State(state): State<AppState>,
    Json(input): Json<CreateOrderInput>,
) -> AppResult<Json<OrderCreated>> {
    let service = OrderService::new(state.store);
    let created = service.create(input).await?;
    Ok(Json(created))
}

/// Get an order
pub async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Order>> {
    let service = OrderService::new(state.store);
    let order = service.get(id).await?;
    Ok(Json(order))
}

/// Delete an order
pub async fn delete_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<()>> {
    let service = OrderService::new(state.store);
    service.delete(id).await?;
    Ok(Json(()))
}

/// Change an order's status
pub async fn update_order_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateOrderStatusInput>,
) -> AppResult<Json<Order>> {
    let service = OrderService::new(state.store);
    let order = service.update_status(id, input.status).await?;
    Ok(Json(order))
}

/// Warehouse linkage of an order
pub async fn get_order_warehouse_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<OrderWarehouseStatus>> {
    let status = reconciler(state).get_status(id).await?;
    Ok(Json(status))
}

/// Receive a delivered order into the warehouse
pub async fn receive_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<ReceiveRequest>,
) -> AppResult<Json<WarehouseItem>> {
    let item = reconciler(state).receive(id, input).await?;
    Ok(Json(item))
}

/// Delivered orders waiting to be received
pub async fn list_receivable_orders(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<Order>>> {
    let orders = reconciler(state).list_receivable().await?;
    Ok(Json(orders))
}

/// Orders against warehouse stock
pub async fn get_order_warehouse_summary(
    State(state): State<AppState>,
) -> AppResult<Json<ReconciliationSummary>> {
    let summary = reconciler(state).summary().await?;
    Ok(Json(summary))
}
