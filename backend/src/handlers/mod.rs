//! HTTP handlers for the Stock Reconciliation Platform

pub mod catalog;
pub mod health;
pub mod movement;
pub mod period;
pub mod stocktake;

pub use catalog::*;
pub use health::*;
pub use movement::*;
pub use period::*;
pub use stocktake::*;
