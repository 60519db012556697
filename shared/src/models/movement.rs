//! Stock movement ledger models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::StockType;

/// An immutable ledger entry for a change to a lot's stock
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StockMovement {
    pub id: Uuid,
    pub warehouse_item_id: Uuid,
    pub movement_type: MovementType,
    /// Signed kg delta: positive for incoming/return, negative for outgoing
    pub quantity: Decimal,
    pub operator: String,
    pub notes: Option<String>,
    pub context: MovementContext,
    pub destination: Option<String>,
    pub order_id: Option<Uuid>,
    pub movement_date: DateTime<Utc>,
}

impl StockMovement {
    /// Coils moved by this entry, where the movement kind records one
    pub fn bobin_count(&self) -> Option<i32> {
        self.context.bobin_count()
    }
}

/// A movement about to be appended; the store assigns id and date
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewStockMovement {
    pub movement_type: MovementType,
    pub quantity: Decimal,
    pub operator: String,
    pub notes: Option<String>,
    pub context: MovementContext,
    pub destination: Option<String>,
    pub order_id: Option<Uuid>,
}

/// Movement direction as recorded in the ledger
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum MovementType {
    #[serde(rename = "Gelen")]
    Incoming,
    #[serde(rename = "Çıkan")]
    Outgoing,
    #[serde(rename = "İade")]
    Return,
}

impl MovementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementType::Incoming => "Gelen",
            MovementType::Outgoing => "Çıkan",
            MovementType::Return => "İade",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Gelen" => Some(MovementType::Incoming),
            "Çıkan" => Some(MovementType::Outgoing),
            "İade" => Some(MovementType::Return),
            _ => None,
        }
    }
}

impl std::fmt::Display for MovementType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured context carried by a movement, tagged by movement kind
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MovementContext {
    /// Initial stock entry of a new lot
    Receipt { bobin_count: i32 },
    Exit {
        destination: String,
        reason: Option<String>,
        bobin_count: i32,
    },
    Return {
        /// Free-form condition label chosen by the operator (e.g., "kullanilabilir")
        condition: String,
        stock_type: StockType,
        customer_name: Option<String>,
        bobin_count: i32,
    },
    Adjustment {
        previous_weight: Decimal,
        previous_bobin_count: i32,
        new_bobin_count: i32,
    },
}

impl MovementContext {
    pub fn bobin_count(&self) -> Option<i32> {
        match self {
            MovementContext::Receipt { bobin_count }
            | MovementContext::Exit { bobin_count, .. }
            | MovementContext::Return { bobin_count, .. } => Some(*bobin_count),
            MovementContext::Adjustment { .. } => None,
        }
    }
}
