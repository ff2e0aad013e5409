//! Shared types and domain logic for the Stock Reconciliation Platform
//!
//! This crate contains the pure reconciliation core shared between the
//! backend and any other components of the system: domain models, the
//! unit-of-measure converter, and the stocktake line recompute engine.
//! Nothing in here touches a database or the network.

pub mod error;
pub mod models;
pub mod recompute;
pub mod types;
pub mod uom;
pub mod validation;

pub use error::*;
pub use models::*;
pub use recompute::*;
pub use types::*;
pub use uom::*;
pub use validation::*;
