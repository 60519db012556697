//! Order-warehouse reconciliation: receiving delivered orders into stock

use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use shared::{
    check_receivable, item_from_order, receipt_patch, receivable_orders,
    summarize, Order, OrderFilter, OrderStatus, OrderWarehouseStatus, ReceiveRequest,
    ReconciliationSummary, WarehouseItem,
};
use uuid::Uuid;

use crate::config::WarehouseSettings;
use crate::error::{AppError, AppResult};
use crate::services::{ActivityLog, BarcodeGenerator};
use crate::store::{NewLot, WarehouseStore};

/// Links orders to the lots received from them
#[derive(Clone)]
pub struct OrderWarehouseService {
    store: Arc<dyn WarehouseStore>,
    settings: WarehouseSettings,
    activity: ActivityLog,
    barcodes: BarcodeGenerator,
}

impl OrderWarehouseService {
    pub fn new(store: Arc<dyn WarehouseStore>, settings: WarehouseSettings) -> Self {
        Self {
            activity: ActivityLog::new(store.clone()),
            barcodes: BarcodeGenerator::new(store.clone(), settings.max_update_attempts),
            store,
            settings,
        }
    }

    async fn order(&self, order_id: Uuid) -> AppResult<Order> {
        self.store
            .get_order(order_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Order".to_string()))
    }

    pub async fn get_status(&self, order_id: Uuid) -> AppResult<OrderWarehouseStatus> {
        let order = self.order(order_id).await?;
        let linked = self.store.find_item_by_order(order_id).await?;
        Ok(OrderWarehouseStatus::new(&order, linked))
    }

    /// Receive a delivered order into the warehouse as a new lot.
    ///
    /// The lot, its receipt movement and the order update are written as one
    /// unit. The store's unique order link makes a concurrent second receive
    /// fail there, leaving the order untouched.
    pub async fn receive(&self, order_id: Uuid, request: ReceiveRequest) -> AppResult<WarehouseItem> {
        let order = self.order(order_id).await?;
        let linked = self.store.find_item_by_order(order_id).await?;
        check_receivable(&order, linked.as_ref(), &request)?;

        let new_item = item_from_order(
            &order,
            &request,
            String::new(),
            &self.settings.default_location,
            Utc::now(),
        );
        let patch = receipt_patch(&order, &request);
        let stored = self
            .barcodes
            .insert_with_new_barcode(NewLot::new(new_item).with_order_update(order_id, patch))
            .await?;
        let item = stored.item;
        let order = stored.order.unwrap_or(order);

        tracing::info!(
            order_id = %order_id,
            item_id = %item.id,
            barcode = %item.barcode,
            actual_weight = %request.actual_weight,
            "Order received into warehouse"
        );
        self.activity
            .log(
                "receive_order",
                "order",
                order_id,
                json!({
                    "warehouse_item_id": item.id,
                    "actual_quantity": order.actual_quantity,
                    "actual_total_price": order.actual_total_price,
                }),
            )
            .await;

        Ok(item)
    }

    /// Delivered orders without a lot, newest delivery first
    pub async fn list_receivable(&self) -> AppResult<Vec<Order>> {
        let delivered = self
            .store
            .list_orders(&OrderFilter {
                status: Some(OrderStatus::Delivered),
                ..Default::default()
            })
            .await?;
        let linked: Vec<Uuid> = self
            .store
            .list_linked_items()
            .await?
            .into_iter()
            .filter_map(|item| item.order_id)
            .collect();
        Ok(receivable_orders(delivered, &linked))
    }

    pub async fn summary(&self) -> AppResult<ReconciliationSummary> {
        let orders = self.store.list_orders(&OrderFilter::default()).await?;
        let linked = self.store.list_linked_items().await?;
        Ok(summarize(&orders, &linked))
    }
}
