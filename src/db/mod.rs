//! `SeaORM` adapters for the repository traits.

/// Dashboards with their actual and daily rows
pub mod dashboards;
/// Recurring plans
pub mod plans;
/// One-off transactions
pub mod transactions;

pub use dashboards::DashboardStore;
pub use plans::PlanStore;
pub use transactions::TransactionStore;
