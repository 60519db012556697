//! Shared types and domain logic for the warehouse tracking platform
//!
//! This crate contains the data model and the pure stock logic shared between
//! the backend, the browser scanner (via WASM), and other components.

pub mod barcode;
pub mod ledger;
pub mod models;
pub mod optimizer;
pub mod reconcile;
pub mod types;
pub mod validation;

pub use barcode::*;
pub use ledger::*;
pub use models::*;
pub use optimizer::*;
pub use reconcile::*;
pub use types::*;
pub use validation::*;
