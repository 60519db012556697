//! HTTP handlers for the warehouse tracking API

pub mod health;
pub mod orders;
pub mod warehouse;

pub use health::*;
pub use orders::*;
pub use warehouse::*;
