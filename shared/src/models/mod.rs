//! Domain models for the warehouse tracking platform

mod movement;
mod order;
mod warehouse;

pub use movement::*;
pub use order::*;
pub use warehouse::*;
