//! In-process store with the same guarantees as the Postgres store

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use shared::{
    barcode_sequence, ItemFilter, NewOrder, NewStockMovement, Order, OrderFilter, OrderPatch,
    StockMovement, WarehouseItem,
};
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{
    ActivityEntry, NewLot, StockChange, StoreError, StoreResult, StoredLot, WarehouseStore,
};

#[derive(Default)]
struct State {
    items: Vec<WarehouseItem>,
    movements: Vec<StockMovement>,
    orders: Vec<Order>,
    activities: Vec<ActivityEntry>,
}

/// Store kept entirely in memory. All writes hold one lock, so each call is atomic.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
    fail_activity_writes: AtomicBool,
    fail_receipt_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every activity log write fail
    #[cfg(test)]
    pub fn fail_activity_writes(&self, fail: bool) {
        self.fail_activity_writes.store(fail, Ordering::SeqCst);
    }

    /// Make the receipt movement of every new lot fail
    #[cfg(test)]
    pub fn fail_receipt_writes(&self, fail: bool) {
        self.fail_receipt_writes.store(fail, Ordering::SeqCst);
    }

    #[cfg(test)]
    pub async fn activities(&self) -> Vec<ActivityEntry> {
        self.state.lock().await.activities.clone()
    }
}

fn newest_first(items: &mut [WarehouseItem]) {
    items.sort_by(|a, b| b.entry_date.cmp(&a.entry_date));
}

fn stored_movement(item_id: Uuid, m: NewStockMovement) -> StockMovement {
    StockMovement {
        id: Uuid::new_v4(),
        warehouse_item_id: item_id,
        movement_type: m.movement_type,
        quantity: m.quantity,
        operator: m.operator,
        notes: m.notes,
        context: m.context,
        destination: m.destination,
        order_id: m.order_id,
        movement_date: Utc::now(),
    }
}

#[async_trait]
impl WarehouseStore for MemoryStore {
    async fn list_warehouse_items(&self, filter: &ItemFilter) -> StoreResult<Vec<WarehouseItem>> {
        let state = self.state.lock().await;
        let mut items: Vec<WarehouseItem> = state
            .items
            .iter()
            .filter(|item| filter.matches(item))
            .cloned()
            .collect();
        newest_first(&mut items);
        Ok(items)
    }

    async fn get_warehouse_item(&self, id: Uuid) -> StoreResult<Option<WarehouseItem>> {
        let state = self.state.lock().await;
        Ok(state.items.iter().find(|item| item.id == id).cloned())
    }

    async fn find_item_by_order(&self, order_id: Uuid) -> StoreResult<Option<WarehouseItem>> {
        let state = self.state.lock().await;
        Ok(state
            .items
            .iter()
            .find(|item| item.order_id == Some(order_id))
            .cloned())
    }

    async fn list_linked_items(&self) -> StoreResult<Vec<WarehouseItem>> {
        let state = self.state.lock().await;
        let mut items: Vec<WarehouseItem> = state
            .items
            .iter()
            .filter(|item| item.order_id.is_some())
            .cloned()
            .collect();
        newest_first(&mut items);
        Ok(items)
    }

    async fn insert_lot(&self, lot: NewLot) -> StoreResult<StoredLot> {
        let mut state = self.state.lock().await;
        let NewLot {
            item,
            receipt,
            order_update,
        } = lot;

        // Every check runs before the first write so a failure leaves no trace
        if let Some(order_id) = item.order_id {
            if state.items.iter().any(|i| i.order_id == Some(order_id)) {
                return Err(StoreError::DuplicateOrderLink { order_id });
            }
        }
        if state.items.iter().any(|i| i.barcode == item.barcode) {
            return Err(StoreError::DuplicateBarcode(item.barcode));
        }
        if let Some((order_id, _)) = &order_update {
            if !state.orders.iter().any(|o| o.id == *order_id) {
                return Err(StoreError::NotFound {
                    resource: "Order",
                    id: *order_id,
                });
            }
        }
        if self.fail_receipt_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Corrupt("movement log unavailable".to_string()));
        }

        let now = Utc::now();
        let stored = WarehouseItem {
            id: Uuid::new_v4(),
            barcode: item.barcode,
            material: item.material,
            cm: item.cm,
            mikron: item.mikron,
            current_weight: item.current_weight,
            original_weight: item.original_weight,
            bobin_count: item.bobin_count,
            original_bobin_count: item.original_bobin_count,
            status: item.status,
            stock_type: item.stock_type,
            customer_name: item.customer_name,
            location: item.location,
            supplier: item.supplier,
            order_id: item.order_id,
            notes: item.notes,
            tags: item.tags,
            entry_date: item.entry_date,
            version: 1,
            created_at: now,
            updated_at: now,
        };
        let receipt = stored_movement(stored.id, receipt);

        let order = match order_update {
            Some((order_id, patch)) => {
                let order = state
                    .orders
                    .iter_mut()
                    .find(|o| o.id == order_id)
                    .ok_or(StoreError::NotFound {
                        resource: "Order",
                        id: order_id,
                    })?;
                patch.apply(order);
                order.updated_at = now;
                Some(order.clone())
            }
            None => None,
        };
        state.items.push(stored.clone());
        state.movements.push(receipt.clone());

        Ok(StoredLot {
            item: stored,
            receipt,
            order,
        })
    }

    async fn apply_stock_change(
        &self,
        change: StockChange,
    ) -> StoreResult<(WarehouseItem, Option<StockMovement>)> {
        let mut state = self.state.lock().await;
        let id = change.item.id;
        let stored = state
            .items
            .iter_mut()
            .find(|item| item.id == id)
            .ok_or(StoreError::NotFound {
                resource: "Warehouse item",
                id,
            })?;
        if stored.version != change.item.version {
            return Err(StoreError::VersionConflict { id });
        }

        let mut updated = change.item;
        updated.version += 1;
        updated.updated_at = Utc::now();
        *stored = updated.clone();

        let movement = change.movement.map(|m| stored_movement(id, m));
        if let Some(movement) = &movement {
            state.movements.push(movement.clone());
        }
        Ok((updated, movement))
    }

    async fn delete_warehouse_item(&self, id: Uuid) -> StoreResult<bool> {
        let mut state = self.state.lock().await;
        let before = state.items.len();
        state.items.retain(|item| item.id != id);
        let deleted = state.items.len() != before;
        if deleted {
            state.movements.retain(|m| m.warehouse_item_id != id);
        }
        Ok(deleted)
    }

    async fn max_barcode_sequence(&self, prefix: &str) -> StoreResult<Option<u32>> {
        let state = self.state.lock().await;
        Ok(state
            .items
            .iter()
            .filter_map(|item| barcode_sequence(&item.barcode, prefix))
            .max())
    }

    async fn list_movements(&self, item_id: Option<Uuid>) -> StoreResult<Vec<StockMovement>> {
        let state = self.state.lock().await;
        let mut movements: Vec<StockMovement> = state
            .movements
            .iter()
            .filter(|m| item_id.is_none_or(|id| m.warehouse_item_id == id))
            .cloned()
            .collect();
        // Stable sort keeps append order for equal timestamps; reverse gives newest first
        movements.sort_by_key(|m| m.movement_date);
        movements.reverse();
        Ok(movements)
    }

    async fn list_orders(&self, filter: &OrderFilter) -> StoreResult<Vec<Order>> {
        let state = self.state.lock().await;
        let mut orders: Vec<Order> = state
            .orders
            .iter()
            .filter(|o| filter.matches(o))
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }

    async fn get_order(&self, id: Uuid) -> StoreResult<Option<Order>> {
        let state = self.state.lock().await;
        Ok(state.orders.iter().find(|o| o.id == id).cloned())
    }

    async fn insert_order(&self, order: NewOrder) -> StoreResult<Order> {
        let mut state = self.state.lock().await;
        let now = Utc::now();
        let stored = Order {
            id: Uuid::new_v4(),
            supplier: order.supplier,
            customer_name: order.customer_name,
            material: order.material,
            cm: order.cm,
            mikron: order.mikron,
            quantity: order.quantity,
            unit: order.unit,
            status: order.status,
            price_per_unit: order.price_per_unit,
            total_price: order.total_price,
            actual_quantity: None,
            actual_bobin_sayisi: None,
            actual_total_price: None,
            is_in_warehouse: false,
            delivered_date: None,
            notes: order.notes,
            created_at: now,
            updated_at: now,
        };
        state.orders.push(stored.clone());
        Ok(stored)
    }

    async fn update_order(&self, id: Uuid, patch: &OrderPatch) -> StoreResult<Order> {
        let mut state = self.state.lock().await;
        let order = state
            .orders
            .iter_mut()
            .find(|o| o.id == id)
            .ok_or(StoreError::NotFound {
                resource: "Order",
                id,
            })?;
        patch.apply(order);
        order.updated_at = Utc::now();
        Ok(order.clone())
    }

    async fn delete_order(&self, id: Uuid) -> StoreResult<bool> {
        let mut state = self.state.lock().await;
        let before = state.orders.len();
        state.orders.retain(|o| o.id != id);
        let deleted = state.orders.len() != before;
        if deleted {
            for item in state.items.iter_mut().filter(|i| i.order_id == Some(id)) {
                item.order_id = None;
            }
        }
        Ok(deleted)
    }

    async fn insert_activity(&self, entry: &ActivityEntry) -> StoreResult<()> {
        if self.fail_activity_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Corrupt("activity log unavailable".to_string()));
        }
        self.state.lock().await.activities.push(entry.clone());
        Ok(())
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use shared::{NewWarehouseItem, OrderStatus, StockStatus, StockType};

    fn new_item(barcode: &str, order_id: Option<Uuid>) -> NewWarehouseItem {
        NewWarehouseItem {
            barcode: barcode.to_string(),
            material: "LDPE".to_string(),
            cm: Decimal::from(100),
            mikron: Decimal::from(50),
            current_weight: Decimal::from(100),
            original_weight: Decimal::from(100),
            bobin_count: 1,
            original_bobin_count: Some(1),
            status: StockStatus::InStock,
            stock_type: StockType::General,
            customer_name: None,
            location: "Ana Depo".to_string(),
            supplier: None,
            order_id,
            notes: None,
            tags: vec![],
            entry_date: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_stale_version_is_rejected() {
        let store = MemoryStore::new();
        let item = store
            .insert_lot(NewLot::new(new_item("DK250821G01", None)))
            .await
            .unwrap()
            .item;

        let mut first = item.clone();
        first.current_weight = Decimal::from(90);
        let (updated, _) = store
            .apply_stock_change(StockChange {
                item: first,
                movement: None,
            })
            .await
            .unwrap();
        assert_eq!(updated.version, 2);

        let mut stale = item.clone();
        stale.current_weight = Decimal::from(80);
        let err = store
            .apply_stock_change(StockChange {
                item: stale,
                movement: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::VersionConflict { .. }));

        let stored = store.get_warehouse_item(item.id).await.unwrap().unwrap();
        assert_eq!(stored.current_weight, Decimal::from(90));
    }

    #[tokio::test]
    async fn test_second_item_for_order_is_rejected() {
        let store = MemoryStore::new();
        let order_id = Uuid::new_v4();
        store
            .insert_lot(NewLot::new(new_item("DK250821G01", Some(order_id))))
            .await
            .unwrap();
        let err = store
            .insert_lot(NewLot::new(new_item("DK250821G02", Some(order_id))))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::DuplicateOrderLink { .. }));
    }

    #[tokio::test]
    async fn test_max_barcode_sequence() {
        let store = MemoryStore::new();
        assert_eq!(store.max_barcode_sequence("DK250821G").await.unwrap(), None);

        for code in ["DK250821G01", "DK250821G07", "DK250821B12", "DK250821GX"] {
            store.insert_lot(NewLot::new(new_item(code, None))).await.unwrap();
        }
        assert_eq!(store.max_barcode_sequence("DK250821G").await.unwrap(), Some(7));
        assert_eq!(store.max_barcode_sequence("DK250821B").await.unwrap(), Some(12));
    }

    #[tokio::test]
    async fn test_insert_lot_writes_item_receipt_and_order() {
        let store = MemoryStore::new();
        let order = store
            .insert_order(NewOrder {
                supplier: "Polinas".to_string(),
                customer_name: None,
                material: "LDPE".to_string(),
                cm: Decimal::from(100),
                mikron: Decimal::from(50),
                quantity: Decimal::from(100),
                unit: "kg".to_string(),
                status: OrderStatus::Ordered,
                price_per_unit: None,
                total_price: None,
                notes: None,
            })
            .await
            .unwrap();
        let patch = OrderPatch {
            status: Some(OrderStatus::Delivered),
            is_in_warehouse: Some(true),
            ..Default::default()
        };

        let stored = store
            .insert_lot(
                NewLot::new(new_item("DK250821G01", Some(order.id)))
                    .with_order_update(order.id, patch),
            )
            .await
            .unwrap();
        assert_eq!(stored.receipt.warehouse_item_id, stored.item.id);
        assert!(stored.order.unwrap().is_in_warehouse);
        assert_eq!(store.list_movements(Some(stored.item.id)).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_lot_insert_writes_nothing() {
        let store = MemoryStore::new();
        store.fail_receipt_writes(true);
        let err = store
            .insert_lot(NewLot::new(new_item("DK250821G01", None)))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Corrupt(_)));

        // Unknown order: the item must not be written either
        store.fail_receipt_writes(false);
        let missing = Uuid::new_v4();
        let err = store
            .insert_lot(
                NewLot::new(new_item("DK250821G01", Some(missing)))
                    .with_order_update(missing, OrderPatch::default()),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { resource: "Order", .. }));

        assert!(store.list_warehouse_items(&ItemFilter::default()).await.unwrap().is_empty());
        assert!(store.list_movements(None).await.unwrap().is_empty());
    }
}
