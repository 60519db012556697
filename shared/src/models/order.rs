//! Purchase order models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A purchase/request record placed with a supplier
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Order {
    pub id: Uuid,
    pub supplier: String,
    pub customer_name: Option<String>,
    pub material: String,
    pub cm: Decimal,
    pub mikron: Decimal,
    /// Planned quantity
    pub quantity: Decimal,
    pub unit: String,
    pub status: OrderStatus,
    pub price_per_unit: Option<Decimal>,
    /// Planned total
    pub total_price: Option<Decimal>,
    pub actual_quantity: Option<Decimal>,
    pub actual_bobin_sayisi: Option<i32>,
    pub actual_total_price: Option<Decimal>,
    pub is_in_warehouse: bool,
    pub delivered_date: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Date used to order receivable orders, newest first
    pub fn receival_sort_date(&self) -> DateTime<Utc> {
        self.delivered_date.unwrap_or(self.created_at)
    }
}

/// Fields needed to create an order
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewOrder {
    pub supplier: String,
    pub customer_name: Option<String>,
    pub material: String,
    pub cm: Decimal,
    pub mikron: Decimal,
    pub quantity: Decimal,
    pub unit: String,
    pub status: OrderStatus,
    pub price_per_unit: Option<Decimal>,
    pub total_price: Option<Decimal>,
    pub notes: Option<String>,
}

/// Partial update applied to an order
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct OrderPatch {
    pub status: Option<OrderStatus>,
    pub actual_quantity: Option<Decimal>,
    pub actual_bobin_sayisi: Option<i32>,
    pub actual_total_price: Option<Decimal>,
    pub is_in_warehouse: Option<bool>,
    pub delivered_date: Option<DateTime<Utc>>,
}

impl OrderPatch {
    pub fn apply(&self, order: &mut Order) {
        if let Some(status) = self.status {
            order.status = status;
        }
        if let Some(quantity) = self.actual_quantity {
            order.actual_quantity = Some(quantity);
        }
        if let Some(count) = self.actual_bobin_sayisi {
            order.actual_bobin_sayisi = Some(count);
        }
        if let Some(price) = self.actual_total_price {
            order.actual_total_price = Some(price);
        }
        if let Some(flag) = self.is_in_warehouse {
            order.is_in_warehouse = flag;
        }
        if let Some(date) = self.delivered_date {
            order.delivered_date = Some(date);
        }
    }
}

/// Order lifecycle status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum OrderStatus {
    Requested,
    Ordered,
    Delivered,
    Cancelled,
    Return,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Requested => "Requested",
            OrderStatus::Ordered => "Ordered",
            OrderStatus::Delivered => "Delivered",
            OrderStatus::Cancelled => "Cancelled",
            OrderStatus::Return => "Return",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Requested" => Some(OrderStatus::Requested),
            "Ordered" => Some(OrderStatus::Ordered),
            "Delivered" => Some(OrderStatus::Delivered),
            "Cancelled" => Some(OrderStatus::Cancelled),
            "Return" => Some(OrderStatus::Return),
            _ => None,
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
