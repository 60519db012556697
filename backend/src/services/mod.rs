//! Business logic services for warehouse tracking

pub mod activity;
pub mod barcode;
pub mod ledger;
pub mod optimizer;
pub mod orders;
pub mod reconciler;

pub use activity::ActivityLog;
pub use barcode::BarcodeGenerator;
pub use ledger::StockLedgerService;
pub use optimizer::StockOptimizer;
pub use orders::OrderService;
pub use reconciler::OrderWarehouseService;
