//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

/// Recorded amount of a plan within a month
pub mod actual;
/// Per-day totals of a closed month
pub mod daily;
/// Monthly rollup
pub mod dashboard;
/// Recurring budget line item
pub mod plan;
/// One-off ledger entry
pub mod transaction;

// Re-export specific types to avoid conflicts
pub use actual::{Column as ActualColumn, Entity as Actual, Model as ActualModel};
pub use daily::{Column as DailyColumn, Entity as Daily, Model as DailyModel};
pub use dashboard::{Column as DashboardColumn, Entity as Dashboard, Model as DashboardModel};
pub use plan::{Column as PlanColumn, Entity as Plan, Model as PlanModel};
pub use transaction::{
    Column as TransactionColumn, Entity as Transaction, Model as TransactionModel,
};
