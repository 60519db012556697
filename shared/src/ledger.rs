//! Stock ledger arithmetic
//!
//! Each `plan_*` function validates a request against the current state of a
//! lot and returns the updated lot together with the movement to append. No
//! state is touched on failure, so callers can persist the plan atomically or
//! discard it.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{
    MovementContext, MovementType, NewStockMovement, NewWarehouseItem, StockStatus, StockType,
    WarehouseItem,
};

/// Assumed average coil weight (kg) when a lot's original coil count is unknown
pub const FALLBACK_COIL_WEIGHT_KG: Decimal = Decimal::from_parts(1024, 0, 0, false, 1);

/// Return weight-per-coil differing from the original by more than this factor is flagged
pub const RATIO_WARNING_FACTOR: Decimal = Decimal::from_parts(10, 0, 0, false, 0);

/// Operator recorded for system-generated movements
pub const SYSTEM_OPERATOR: &str = "Sistem";

/// Operator recorded when the request does not name one
pub const UNKNOWN_OPERATOR: &str = "Bilinmiyor";

pub const INITIAL_RECEIPT_NOTE: &str = "initial stock entry";

/// Reasons a ledger request is rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("At least one quantity (weight or coil count) is required")]
    NoQuantity,

    #[error("Return condition is required")]
    MissingCondition,

    #[error("{field} cannot be negative")]
    NegativeQuantity { field: &'static str },

    #[error("Return weight ({requested} kg) cannot exceed the original weight ({original} kg)")]
    WeightExceedsOriginal { requested: Decimal, original: Decimal },

    #[error("Return coil count ({requested}) cannot exceed the original coil count ({original})")]
    BobinExceedsOriginal { requested: i32, original: i32 },

    #[error("Customer name is required for customer stock")]
    MissingCustomerName,

    #[error("{field} is required")]
    MissingField { field: &'static str },

    #[error("{field} is too large")]
    QuantityOverflow { field: &'static str },
}

impl LedgerError {
    /// Request field the error refers to
    pub fn field(&self) -> &'static str {
        match self {
            LedgerError::NoQuantity => "quantity",
            LedgerError::MissingCondition => "condition",
            LedgerError::NegativeQuantity { field }
            | LedgerError::MissingField { field }
            | LedgerError::QuantityOverflow { field } => *field,
            LedgerError::WeightExceedsOriginal { .. } => "return_weight",
            LedgerError::BobinExceedsOriginal { .. } => "return_bobin_count",
            LedgerError::MissingCustomerName => "customer_name",
        }
    }

    /// Turkish message shown to warehouse staff
    pub fn message_tr(&self) -> String {
        match self {
            LedgerError::NoQuantity => "En az bir miktar (ağırlık veya bobin) girilmelidir".to_string(),
            LedgerError::MissingCondition => "İade durumu seçilmelidir".to_string(),
            LedgerError::NegativeQuantity { field } => format!("{} negatif olamaz", field),
            LedgerError::WeightExceedsOriginal { requested, original } => format!(
                "İade ağırlığı ({} kg) orijinal ağırlıktan ({} kg) fazla olamaz",
                requested, original
            ),
            LedgerError::BobinExceedsOriginal { requested, original } => format!(
                "İade bobin sayısı ({}) orijinal bobin sayısından ({}) fazla olamaz",
                requested, original
            ),
            LedgerError::MissingCustomerName => "Müşteri stoğu için müşteri adı gereklidir".to_string(),
            LedgerError::MissingField { field } => format!("{} alanı zorunludur", field),
            LedgerError::QuantityOverflow { field } => format!("{} çok büyük", field),
        }
    }
}

/// Result of a validated ledger operation
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerPlan {
    /// The lot as it should be stored afterwards
    pub item: WarehouseItem,
    /// Movement to append, if the change is not a no-op
    pub movement: Option<NewStockMovement>,
}

/// Outgoing stock request
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ExitRequest {
    pub weight_exit: Decimal,
    pub bobin_exit: i32,
    pub exit_location: String,
    pub operator: Option<String>,
    pub reason: Option<String>,
    pub notes: Option<String>,
}

/// Returned stock request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReturnRequest {
    pub return_weight: Decimal,
    pub return_bobin_count: i32,
    pub condition: String,
    pub stock_type: StockType,
    pub customer_name: Option<String>,
    pub operator: Option<String>,
    pub notes: Option<String>,
}

/// Manual overwrite of a lot's quantities
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AdjustmentRequest {
    pub new_weight: Decimal,
    pub new_bobin_count: i32,
    pub location: String,
    pub status: StockStatus,
    pub notes: Option<String>,
    pub operator: Option<String>,
}

/// Advisory raised when a return's weight-per-coil looks implausible
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatioWarning {
    pub return_weight_per_bobin: Decimal,
    pub original_weight_per_bobin: Decimal,
}

impl std::fmt::Display for RatioWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Returned weight per coil ({} kg) differs from the original ({} kg) by more than {}x",
            self.return_weight_per_bobin.round_dp(2),
            self.original_weight_per_bobin.round_dp(2),
            RATIO_WARNING_FACTOR
        )
    }
}

/// Outcome of return validation that passed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnCheck {
    /// Original coil count the request was checked against
    pub original_bobin_count: i32,
    pub warning: Option<RatioWarning>,
}

/// Original coil count of a lot, derived when not stored.
///
/// Legacy rows lack `original_bobin_count`. When the lot has both an original
/// weight and coils on hand, the current coil count stands in for the original
/// (this covers both fully depleted and partially used lots). Otherwise the
/// count is estimated from [`FALLBACK_COIL_WEIGHT_KG`].
pub fn derive_original_bobin_count(item: &WarehouseItem) -> i32 {
    if let Some(count) = item.original_bobin_count {
        return count;
    }
    if item.original_weight > Decimal::ZERO && item.bobin_count > 0 {
        return item.bobin_count;
    }
    round_half_up(item.original_weight / FALLBACK_COIL_WEIGHT_KG)
        .to_i32()
        .unwrap_or(0)
}

/// Round to a whole number, halves away from zero
pub fn round_half_up(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
}

/// Weight removed by an exit. Coils-only exits deduct the average coil weight per coil.
pub fn exit_weight(
    item: &WarehouseItem,
    weight_exit: Decimal,
    bobin_exit: i32,
) -> Result<Decimal, LedgerError> {
    if weight_exit > Decimal::ZERO {
        return Ok(weight_exit);
    }
    if bobin_exit > 0 && item.bobin_count > 0 {
        let per_coil = item.current_weight / Decimal::from(item.bobin_count);
        return per_coil
            .checked_mul(Decimal::from(bobin_exit))
            .ok_or(LedgerError::QuantityOverflow { field: "bobin_exit" });
    }
    Ok(Decimal::ZERO)
}

/// Plan an outgoing movement.
pub fn plan_exit(item: &WarehouseItem, request: &ExitRequest) -> Result<LedgerPlan, LedgerError> {
    if request.weight_exit < Decimal::ZERO {
        return Err(LedgerError::NegativeQuantity { field: "weight_exit" });
    }
    if request.bobin_exit < 0 {
        return Err(LedgerError::NegativeQuantity { field: "bobin_exit" });
    }
    if request.weight_exit == Decimal::ZERO && request.bobin_exit == 0 {
        return Err(LedgerError::NoQuantity);
    }
    let destination = request.exit_location.trim();
    if destination.is_empty() {
        return Err(LedgerError::MissingField { field: "exit_location" });
    }

    let deducted = exit_weight(item, request.weight_exit, request.bobin_exit)?;
    let new_weight = (item.current_weight - deducted).max(Decimal::ZERO);
    let new_bobin_count = (item.bobin_count - request.bobin_exit).max(0);

    let mut updated = item.clone();
    updated.current_weight = new_weight;
    updated.bobin_count = new_bobin_count;
    updated.status = if new_weight == Decimal::ZERO && new_bobin_count == 0 {
        StockStatus::OutOfStock
    } else {
        StockStatus::InStock
    };

    let movement = NewStockMovement {
        movement_type: MovementType::Outgoing,
        quantity: new_weight - item.current_weight,
        operator: operator_or_unknown(request.operator.as_deref()),
        notes: non_blank(request.notes.as_deref()),
        context: MovementContext::Exit {
            destination: destination.to_string(),
            reason: non_blank(request.reason.as_deref()),
            bobin_count: item.bobin_count - new_bobin_count,
        },
        destination: Some(destination.to_string()),
        order_id: item.order_id,
    };

    Ok(LedgerPlan {
        item: updated,
        movement: Some(movement),
    })
}

/// Validate a return without planning it.
///
/// Blocking problems come back as `Err`; the ratio advisory travels in the `Ok`
/// value and never blocks.
pub fn validate_return(
    item: &WarehouseItem,
    request: &ReturnRequest,
) -> Result<ReturnCheck, LedgerError> {
    if request.return_weight <= Decimal::ZERO && request.return_bobin_count <= 0 {
        return Err(LedgerError::NoQuantity);
    }
    if request.condition.trim().is_empty() {
        return Err(LedgerError::MissingCondition);
    }
    if request.return_weight < Decimal::ZERO {
        return Err(LedgerError::NegativeQuantity { field: "return_weight" });
    }
    if request.return_bobin_count < 0 {
        return Err(LedgerError::NegativeQuantity { field: "return_bobin_count" });
    }
    if request.return_weight > item.original_weight {
        return Err(LedgerError::WeightExceedsOriginal {
            requested: request.return_weight,
            original: item.original_weight,
        });
    }
    let original_bobin_count = derive_original_bobin_count(item);
    if request.return_bobin_count > original_bobin_count {
        return Err(LedgerError::BobinExceedsOriginal {
            requested: request.return_bobin_count,
            original: original_bobin_count,
        });
    }
    if request.stock_type == StockType::Customer
        && non_blank(request.customer_name.as_deref()).is_none()
    {
        return Err(LedgerError::MissingCustomerName);
    }

    Ok(ReturnCheck {
        original_bobin_count,
        warning: ratio_warning(item, request, original_bobin_count),
    })
}

fn ratio_warning(
    item: &WarehouseItem,
    request: &ReturnRequest,
    original_bobin_count: i32,
) -> Option<RatioWarning> {
    if request.return_weight <= Decimal::ZERO
        || request.return_bobin_count <= 0
        || item.original_weight <= Decimal::ZERO
        || original_bobin_count <= 0
    {
        return None;
    }
    let returned = request.return_weight / Decimal::from(request.return_bobin_count);
    let original = item.original_weight / Decimal::from(original_bobin_count);
    let implausible = original
        .checked_mul(RATIO_WARNING_FACTOR)
        .is_some_and(|upper| returned > upper)
        || returned
            .checked_mul(RATIO_WARNING_FACTOR)
            .is_some_and(|scaled| scaled < original);
    implausible.then(|| RatioWarning {
        return_weight_per_bobin: returned,
        original_weight_per_bobin: original,
    })
}

/// Plan a return. Returned stock is always usable again and goes back to `default_location`.
pub fn plan_return(
    item: &WarehouseItem,
    request: &ReturnRequest,
    default_location: &str,
) -> Result<(LedgerPlan, ReturnCheck), LedgerError> {
    let check = validate_return(item, request)?;

    let customer_name = match request.stock_type {
        StockType::Customer => non_blank(request.customer_name.as_deref()),
        StockType::General => None,
    };

    let current_weight = item
        .current_weight
        .checked_add(request.return_weight)
        .ok_or(LedgerError::QuantityOverflow { field: "return_weight" })?;
    let bobin_count = item
        .bobin_count
        .checked_add(request.return_bobin_count)
        .ok_or(LedgerError::QuantityOverflow { field: "return_bobin_count" })?;

    let mut updated = item.clone();
    updated.current_weight = current_weight;
    updated.bobin_count = bobin_count;
    updated.status = StockStatus::InStock;
    updated.stock_type = request.stock_type;
    updated.customer_name = customer_name.clone();
    updated.location = default_location.to_string();

    let movement = NewStockMovement {
        movement_type: MovementType::Return,
        quantity: request.return_weight,
        operator: operator_or_unknown(request.operator.as_deref()),
        notes: non_blank(request.notes.as_deref()),
        context: MovementContext::Return {
            condition: request.condition.trim().to_string(),
            stock_type: request.stock_type,
            customer_name,
            bobin_count: request.return_bobin_count,
        },
        destination: Some(default_location.to_string()),
        order_id: item.order_id,
    };

    Ok((
        LedgerPlan {
            item: updated,
            movement: Some(movement),
        },
        check,
    ))
}

/// Plan a manual overwrite. A movement is only written when weight or coil count changed.
pub fn plan_adjustment(
    item: &WarehouseItem,
    request: &AdjustmentRequest,
) -> Result<LedgerPlan, LedgerError> {
    if request.new_weight < Decimal::ZERO {
        return Err(LedgerError::NegativeQuantity { field: "new_weight" });
    }
    if request.new_bobin_count < 0 {
        return Err(LedgerError::NegativeQuantity { field: "new_bobin_count" });
    }
    if request.location.trim().is_empty() {
        return Err(LedgerError::MissingField { field: "location" });
    }

    let mut updated = item.clone();
    updated.current_weight = request.new_weight;
    updated.bobin_count = request.new_bobin_count;
    updated.location = request.location.trim().to_string();
    updated.status = request.status;
    if request.notes.is_some() {
        updated.notes = non_blank(request.notes.as_deref());
    }

    let changed = request.new_weight != item.current_weight
        || request.new_bobin_count != item.bobin_count;
    let movement = changed.then(|| {
        let delta = request.new_weight - item.current_weight;
        NewStockMovement {
            movement_type: if delta > Decimal::ZERO {
                MovementType::Incoming
            } else {
                MovementType::Outgoing
            },
            quantity: delta,
            operator: operator_or_unknown(request.operator.as_deref()),
            notes: non_blank(request.notes.as_deref()),
            context: MovementContext::Adjustment {
                previous_weight: item.current_weight,
                previous_bobin_count: item.bobin_count,
                new_bobin_count: request.new_bobin_count,
            },
            destination: None,
            order_id: item.order_id,
        }
    });

    Ok(LedgerPlan {
        item: updated,
        movement,
    })
}

/// Movement recorded once when a lot is created, written together with the lot.
pub fn initial_receipt(item: &NewWarehouseItem) -> NewStockMovement {
    NewStockMovement {
        movement_type: MovementType::Incoming,
        quantity: item.original_weight,
        operator: SYSTEM_OPERATOR.to_string(),
        notes: Some(INITIAL_RECEIPT_NOTE.to_string()),
        context: MovementContext::Receipt {
            bobin_count: item.original_bobin_count.unwrap_or(item.bobin_count),
        },
        destination: Some(item.location.clone()),
        order_id: item.order_id,
    }
}

fn operator_or_unknown(operator: Option<&str>) -> String {
    non_blank(operator).unwrap_or_else(|| UNKNOWN_OPERATOR.to_string())
}

/// Stock totals across all lots
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct WarehouseSummary {
    pub total_items: usize,
    pub total_weight: Decimal,
    pub in_stock_count: usize,
    pub out_of_stock_count: usize,
    pub reserved_count: usize,
    pub damaged_count: usize,
    /// Lots under [`crate::models::LOW_STOCK_THRESHOLD_KG`], whatever their status
    pub low_stock_items: Vec<WarehouseItem>,
}

impl WarehouseSummary {
    pub fn from_items(items: &[WarehouseItem]) -> Self {
        let mut summary = Self {
            total_items: items.len(),
            ..Default::default()
        };
        for item in items {
            summary.total_weight += item.current_weight;
            match item.status {
                StockStatus::InStock => summary.in_stock_count += 1,
                StockStatus::OutOfStock => summary.out_of_stock_count += 1,
                StockStatus::Reserved => summary.reserved_count += 1,
                StockStatus::Damaged => summary.damaged_count += 1,
            }
            if item.is_low_stock() {
                summary.low_stock_items.push(item.clone());
            }
        }
        summary
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
