//! Order to warehouse reconciliation rules
//!
//! A delivered order is received into the warehouse exactly once, becoming a
//! new lot seeded from the order's spec. Prices are recomputed from the weight
//! actually received.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    NewWarehouseItem, Order, OrderPatch, OrderStatus, StockStatus, StockType, WarehouseItem,
};

/// Reasons an order cannot be received
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReceiveError {
    #[error("Order is {status}; only delivered orders can be received")]
    NotDelivered { status: OrderStatus },

    #[error("Order {order_id} is already linked to warehouse item {item_id}")]
    AlreadyInWarehouse { order_id: Uuid, item_id: Uuid },

    #[error("Received weight must be greater than zero")]
    InvalidWeight,

    #[error("Received coil count cannot be negative")]
    InvalidBobinCount,
}

impl ReceiveError {
    pub fn message_tr(&self) -> String {
        match self {
            ReceiveError::NotDelivered { status } => format!(
                "Sipariş durumu {}; yalnızca teslim edilen siparişler depoya alınabilir",
                status
            ),
            ReceiveError::AlreadyInWarehouse { .. } => {
                "Bu sipariş zaten depoya alınmış".to_string()
            }
            ReceiveError::InvalidWeight => "Gelen ağırlık sıfırdan büyük olmalıdır".to_string(),
            ReceiveError::InvalidBobinCount => "Bobin sayısı negatif olamaz".to_string(),
        }
    }

    /// Precondition failures (as opposed to bad input)
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            ReceiveError::NotDelivered { .. } | ReceiveError::AlreadyInWarehouse { .. }
        )
    }
}

/// Warehouse linkage of a single order
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderWarehouseStatus {
    pub is_in_warehouse: bool,
    pub warehouse_item: Option<WarehouseItem>,
    pub can_receive: bool,
}

impl OrderWarehouseStatus {
    pub fn new(order: &Order, linked: Option<WarehouseItem>) -> Self {
        Self {
            is_in_warehouse: linked.is_some(),
            can_receive: order.status == OrderStatus::Delivered && linked.is_none(),
            warehouse_item: linked,
        }
    }
}

/// Quantities reported when an order arrives
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReceiveRequest {
    pub actual_weight: Decimal,
    pub actual_bobin_count: i32,
    pub location: Option<String>,
    pub notes: Option<String>,
}

/// Check receive preconditions. `linked` is the item already referencing the order, if any.
pub fn check_receivable(
    order: &Order,
    linked: Option<&WarehouseItem>,
    request: &ReceiveRequest,
) -> Result<(), ReceiveError> {
    if order.status != OrderStatus::Delivered {
        return Err(ReceiveError::NotDelivered {
            status: order.status,
        });
    }
    if let Some(item) = linked {
        return Err(ReceiveError::AlreadyInWarehouse {
            order_id: order.id,
            item_id: item.id,
        });
    }
    if request.actual_weight <= Decimal::ZERO {
        return Err(ReceiveError::InvalidWeight);
    }
    if request.actual_bobin_count < 0 {
        return Err(ReceiveError::InvalidBobinCount);
    }
    Ok(())
}

/// Total price recomputed from the received weight, when the order has a unit price
pub fn actual_total_price(order: &Order, actual_weight: Decimal) -> Option<Decimal> {
    order.price_per_unit.map(|price| price * actual_weight)
}

/// Order fields updated on receipt
pub fn receipt_patch(order: &Order, request: &ReceiveRequest) -> OrderPatch {
    OrderPatch {
        actual_quantity: Some(request.actual_weight),
        actual_bobin_sayisi: Some(request.actual_bobin_count),
        actual_total_price: actual_total_price(order, request.actual_weight),
        is_in_warehouse: Some(true),
        ..Default::default()
    }
}

/// The lot created from a received order
pub fn item_from_order(
    order: &Order,
    request: &ReceiveRequest,
    barcode: String,
    default_location: &str,
    received_at: DateTime<Utc>,
) -> NewWarehouseItem {
    let location = request
        .location
        .as_deref()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .unwrap_or(default_location)
        .to_string();
    let customer_name = order
        .customer_name
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string);

    NewWarehouseItem {
        barcode,
        material: order.material.clone(),
        cm: order.cm,
        mikron: order.mikron,
        current_weight: request.actual_weight,
        original_weight: request.actual_weight,
        bobin_count: request.actual_bobin_count,
        original_bobin_count: Some(request.actual_bobin_count),
        status: StockStatus::InStock,
        stock_type: if customer_name.is_some() {
            StockType::Customer
        } else {
            StockType::General
        },
        customer_name,
        location,
        supplier: Some(order.supplier.clone()),
        order_id: Some(order.id),
        notes: request.notes.clone().or_else(|| order.notes.clone()),
        tags: vec![],
        entry_date: received_at,
    }
}

/// Delivered orders without a linked lot, newest delivery first
pub fn receivable_orders(orders: Vec<Order>, linked_order_ids: &[Uuid]) -> Vec<Order> {
    let mut receivable: Vec<Order> = orders
        .into_iter()
        .filter(|o| o.status == OrderStatus::Delivered && !linked_order_ids.contains(&o.id))
        .collect();
    receivable.sort_by_key(|o| std::cmp::Reverse(o.receival_sort_date()));
    receivable
}

/// An order whose lot is running low
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LowStockOrder {
    pub order: Order,
    pub warehouse_item: WarehouseItem,
}

/// Aggregate view of orders and their lots
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReconciliationSummary {
    pub total_orders_in_warehouse: usize,
    pub pending_receival: usize,
    /// Sum of actual (or planned, when no actual) totals of orders in the warehouse
    pub total_warehouse_value: Decimal,
    pub low_stock_orders: Vec<LowStockOrder>,
}

/// Summarize orders against the lots linked to them.
pub fn summarize(orders: &[Order], linked_items: &[WarehouseItem]) -> ReconciliationSummary {
    let mut total_orders_in_warehouse = 0;
    let mut pending_receival = 0;
    let mut total_warehouse_value = Decimal::ZERO;
    let mut low_stock_orders = Vec::new();

    for order in orders {
        let linked = linked_items
            .iter()
            .find(|item| item.order_id == Some(order.id));
        match linked {
            Some(item) => {
                total_orders_in_warehouse += 1;
                total_warehouse_value += order
                    .actual_total_price
                    .or(order.total_price)
                    .unwrap_or(Decimal::ZERO);
                if item.is_low_stock() {
                    low_stock_orders.push(LowStockOrder {
                        order: order.clone(),
                        warehouse_item: item.clone(),
                    });
                }
            }
            None if order.status == OrderStatus::Delivered => pending_receival += 1,
            None => {}
        }
    }

    ReconciliationSummary {
        total_orders_in_warehouse,
        pending_receival,
        total_warehouse_value,
        low_stock_orders,
    }
}
