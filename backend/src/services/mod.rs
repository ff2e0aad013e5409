//! Business logic services for the Stock Reconciliation Platform

pub mod catalog;
pub mod movement;
pub mod notification;
pub mod period;
pub mod stocktake;

pub use catalog::CatalogService;
pub use movement::MovementService;
pub use notification::NotificationService;
pub use period::PeriodService;
pub use stocktake::StocktakeService;
