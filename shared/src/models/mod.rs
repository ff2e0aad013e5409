//! Domain models for the Stock Reconciliation Platform

mod item;
mod movement;
mod period;
mod snapshot;
mod stocktake;

pub use item::*;
pub use movement::*;
pub use period::*;
pub use snapshot::*;
pub use stocktake::*;
