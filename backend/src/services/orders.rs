//! Order intake service

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use shared::{
    validate_new_order, NewOrder, Order, OrderFilter, OrderPatch, OrderStatus, StockSpec,
    StockSuggestion,
};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::services::{ActivityLog, StockOptimizer};
use crate::store::WarehouseStore;

/// Order service
#[derive(Clone)]
pub struct OrderService {
    store: Arc<dyn WarehouseStore>,
    optimizer: StockOptimizer,
    activity: ActivityLog,
}

/// Input for creating an order
#[derive(Debug, Deserialize, Validate)]
pub struct CreateOrderInput {
    #[validate(length(min = 1, max = 200))]
    pub supplier: String,
    #[validate(length(max = 200))]
    pub customer_name: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub material: String,
    pub cm: Decimal,
    pub mikron: Decimal,
    pub quantity: Decimal,
    #[validate(length(max = 20))]
    pub unit: Option<String>,
    pub status: Option<OrderStatus>,
    pub price_per_unit: Option<Decimal>,
    pub notes: Option<String>,
}

/// Input for changing an order's status
#[derive(Debug, Deserialize)]
pub struct UpdateOrderStatusInput {
    pub status: OrderStatus,
}

/// A created order plus existing stock that could reduce it
#[derive(Debug, Clone, Serialize)]
pub struct OrderCreated {
    pub order: Order,
    pub stock_suggestion: Option<StockSuggestion>,
}

impl OrderService {
    pub fn new(store: Arc<dyn WarehouseStore>) -> Self {
        Self {
            optimizer: StockOptimizer::new(store.clone()),
            activity: ActivityLog::new(store.clone()),
            store,
        }
    }

    /// Create an order; the stock suggestion is attached only when stock covers part of it
    pub async fn create(&self, input: CreateOrderInput) -> AppResult<OrderCreated> {
        input.validate()?;

        let new_order = NewOrder {
            supplier: input.supplier.trim().to_string(),
            customer_name: input
                .customer_name
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty()),
            material: input.material.trim().to_string(),
            cm: input.cm,
            mikron: input.mikron,
            quantity: input.quantity,
            unit: input.unit.unwrap_or_else(|| "kg".to_string()),
            status: input.status.unwrap_or(OrderStatus::Requested),
            price_per_unit: input.price_per_unit,
            total_price: input.price_per_unit.map(|price| price * input.quantity),
            notes: input.notes,
        };
        validate_new_order(&new_order).map_err(|e| AppError::ValidationError(e.to_string()))?;

        let spec = StockSpec {
            material: new_order.material.clone(),
            cm: new_order.cm,
            mikron: new_order.mikron,
        };
        let suggestion = self.optimizer.suggest(&spec, new_order.quantity).await?;
        let stock_suggestion = suggestion
            .should_suggest(new_order.quantity)
            .then_some(suggestion);

        let order = self.store.insert_order(new_order).await?;

        tracing::info!(
            order_id = %order.id,
            supplier = %order.supplier,
            quantity = %order.quantity,
            "Order created"
        );
        self.activity
            .log(
                "create_order",
                "order",
                order.id,
                json!({ "material": order.material, "quantity": order.quantity }),
            )
            .await;

        Ok(OrderCreated {
            order,
            stock_suggestion,
        })
    }

    pub async fn get(&self, id: Uuid) -> AppResult<Order> {
        self.store
            .get_order(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Order".to_string()))
    }

    pub async fn list(&self, filter: &OrderFilter) -> AppResult<Vec<Order>> {
        Ok(self.store.list_orders(filter).await?)
    }

    /// Change status; moving to Delivered stamps the delivery date once
    pub async fn update_status(&self, id: Uuid, status: OrderStatus) -> AppResult<Order> {
        let current = self.get(id).await?;

        let patch = OrderPatch {
            status: Some(status),
            delivered_date: (status == OrderStatus::Delivered && current.delivered_date.is_none())
                .then(Utc::now),
            ..Default::default()
        };
        let order = self.store.update_order(id, &patch).await?;

        tracing::info!(order_id = %id, from = %current.status, to = %status, "Order status changed");
        self.activity
            .log(
                "update_order_status",
                "order",
                id,
                json!({ "from": current.status.as_str(), "to": status.as_str() }),
            )
            .await;

        Ok(order)
    }

    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        if !self.store.delete_order(id).await? {
            return Err(AppError::NotFound("Order".to_string()));
        }
        tracing::info!(order_id = %id, "Order deleted");
        self.activity
            .log("delete_order", "order", id, serde_json::Value::Null)
            .await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, NewLot};
    use shared::{NewWarehouseItem, StockStatus, StockType};

    fn order_input(quantity: i64, price: Option<Decimal>) -> CreateOrderInput {
        CreateOrderInput {
            supplier: "Petkim".to_string(),
            customer_name: None,
            material: "LDPE".to_string(),
            cm: Decimal::from(100),
            mikron: Decimal::from(50),
            quantity: Decimal::from(quantity),
            unit: None,
            status: None,
            price_per_unit: price,
            notes: None,
        }
    }

    fn lot(weight: i64) -> NewWarehouseItem {
        NewWarehouseItem {
            barcode: "DK250801G01".to_string(),
            material: "LDPE".to_string(),
            cm: Decimal::from(100),
            mikron: Decimal::from(50),
            current_weight: Decimal::from(weight),
            original_weight: Decimal::from(weight),
            bobin_count: 1,
            original_bobin_count: Some(1),
            status: StockStatus::InStock,
            stock_type: StockType::General,
            customer_name: None,
            location: "Ana Depo".to_string(),
            supplier: None,
            order_id: None,
            notes: None,
            tags: vec![],
            entry_date: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_create_computes_total_and_suggestion() {
        let store = Arc::new(MemoryStore::new());
        store.insert_lot(NewLot::new(lot(60))).await.unwrap();
        let service = OrderService::new(store);

        let created = service
            .create(order_input(100, Some(Decimal::new(25, 1))))
            .await
            .unwrap();
        assert_eq!(created.order.total_price, Some(Decimal::from(250)));
        assert_eq!(created.order.status, OrderStatus::Requested);
        let suggestion = created.stock_suggestion.unwrap();
        assert_eq!(suggestion.optimized_quantity, Decimal::from(40));
    }

    #[tokio::test]
    async fn test_full_coverage_is_not_suggested() {
        let store = Arc::new(MemoryStore::new());
        store.insert_lot(NewLot::new(lot(150))).await.unwrap();
        let service = OrderService::new(store);

        let created = service.create(order_input(100, None)).await.unwrap();
        assert!(created.stock_suggestion.is_none());
        assert_eq!(created.order.total_price, None);
    }

    #[tokio::test]
    async fn test_delivered_sets_delivery_date() {
        let service = OrderService::new(Arc::new(MemoryStore::new()));
        let created = service.create(order_input(100, None)).await.unwrap();

        let ordered = service
            .update_status(created.order.id, OrderStatus::Ordered)
            .await
            .unwrap();
        assert!(ordered.delivered_date.is_none());

        let delivered = service
            .update_status(created.order.id, OrderStatus::Delivered)
            .await
            .unwrap();
        assert!(delivered.delivered_date.is_some());
    }

    #[tokio::test]
    async fn test_invalid_order_is_rejected() {
        let service = OrderService::new(Arc::new(MemoryStore::new()));
        let err = service.create(order_input(0, None)).await.unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }
}
