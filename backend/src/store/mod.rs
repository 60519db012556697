//! Storage collaborator for warehouse items, movements, orders and activity logs
//!
//! Services depend on [`WarehouseStore`] only. [`PgStore`] backs production;
//! [`MemoryStore`] serves local runs and tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shared::{
    initial_receipt, ItemFilter, NewOrder, NewStockMovement, NewWarehouseItem, Order,
    OrderFilter, OrderPatch, StockMovement, WarehouseItem,
};
use thiserror::Error;
use uuid::Uuid;

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Storage failures
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("{resource} {id} not found")]
    NotFound { resource: &'static str, id: Uuid },

    /// The item changed since it was read
    #[error("Warehouse item {id} was modified concurrently")]
    VersionConflict { id: Uuid },

    #[error("Order {order_id} is already linked to a warehouse item")]
    DuplicateOrderLink { order_id: Uuid },

    #[error("Barcode {0} already exists")]
    DuplicateBarcode(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A stored row could not be mapped onto the domain model
    #[error("Corrupt row: {0}")]
    Corrupt(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// A planned update of one item plus the movement that records it.
///
/// `item.version` must be the version the plan was computed from; the store
/// rejects the change with [`StoreError::VersionConflict`] if it moved on.
#[derive(Debug, Clone)]
pub struct StockChange {
    pub item: WarehouseItem,
    pub movement: Option<NewStockMovement>,
}

/// A new lot together with its receipt movement and, when it came in
/// against an order, the patch that marks the order as received.
#[derive(Debug, Clone)]
pub struct NewLot {
    pub item: NewWarehouseItem,
    pub receipt: NewStockMovement,
    pub order_update: Option<(Uuid, OrderPatch)>,
}

impl NewLot {
    pub fn new(item: NewWarehouseItem) -> Self {
        let receipt = initial_receipt(&item);
        Self {
            item,
            receipt,
            order_update: None,
        }
    }

    pub fn with_order_update(mut self, order_id: Uuid, patch: OrderPatch) -> Self {
        self.order_update = Some((order_id, patch));
        self
    }
}

/// Rows written by [`WarehouseStore::insert_lot`]
#[derive(Debug, Clone)]
pub struct StoredLot {
    pub item: WarehouseItem,
    pub receipt: StockMovement,
    pub order: Option<Order>,
}

/// Activity log entry
#[derive(Debug, Clone, serde::Serialize)]
pub struct ActivityEntry {
    pub action: String,
    pub resource_type: String,
    pub resource_id: String,
    pub details: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

#[async_trait]
pub trait WarehouseStore: Send + Sync {
    // Warehouse items

    /// Items matching `filter`, newest receipt first
    async fn list_warehouse_items(&self, filter: &ItemFilter) -> StoreResult<Vec<WarehouseItem>>;

    async fn get_warehouse_item(&self, id: Uuid) -> StoreResult<Option<WarehouseItem>>;

    async fn find_item_by_order(&self, order_id: Uuid) -> StoreResult<Option<WarehouseItem>>;

    /// Items that reference an order
    async fn list_linked_items(&self) -> StoreResult<Vec<WarehouseItem>>;

    /// Insert the lot, its receipt movement and the order update as one unit.
    /// Nothing is written when any part fails.
    ///
    /// Fails with [`StoreError::DuplicateOrderLink`] when the order already has an item
    async fn insert_lot(&self, lot: NewLot) -> StoreResult<StoredLot>;

    /// Atomically apply the item update and append its movement
    async fn apply_stock_change(
        &self,
        change: StockChange,
    ) -> StoreResult<(WarehouseItem, Option<StockMovement>)>;

    async fn delete_warehouse_item(&self, id: Uuid) -> StoreResult<bool>;

    /// Highest numeric sequence among barcodes starting with `prefix`
    async fn max_barcode_sequence(&self, prefix: &str) -> StoreResult<Option<u32>>;

    // Movements

    /// Movements, newest first, optionally for a single item
    async fn list_movements(&self, item_id: Option<Uuid>) -> StoreResult<Vec<StockMovement>>;

    // Orders

    /// Orders matching `filter`, newest first
    async fn list_orders(&self, filter: &OrderFilter) -> StoreResult<Vec<Order>>;

    async fn get_order(&self, id: Uuid) -> StoreResult<Option<Order>>;

    async fn insert_order(&self, order: NewOrder) -> StoreResult<Order>;

    async fn update_order(&self, id: Uuid, patch: &OrderPatch) -> StoreResult<Order>;

    async fn delete_order(&self, id: Uuid) -> StoreResult<bool>;

    // Activity

    async fn insert_activity(&self, entry: &ActivityEntry) -> StoreResult<()>;

    /// Connectivity check for health endpoints
    async fn ping(&self) -> StoreResult<()>;
}
