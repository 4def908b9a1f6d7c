//! # Repository Traits
//!
//! Data-access capability sets consumed by the core. The core only talks to
//! these traits, so the backing store can be swapped without touching the
//! aggregation or closing logic. Every repository is assumed to be scoped to
//! a single user already.

use crate::{
    errors::Result,
    models::{Actual, ActualSnapshot, Dashboard, Plan, Transaction},
};
use async_trait::async_trait;
use chrono::NaiveDate;

/// Storage operations for dashboards and their actual and daily rows.
#[async_trait]
pub trait DashboardRepository: Send + Sync {
    /// Retrieve a dashboard with its actual and daily rows.
    async fn get_by_id(&self, id: i64) -> Result<Option<Dashboard>>;

    /// Retrieve the dashboard of the month containing `month`.
    async fn get_by_month(&self, month: NaiveDate) -> Result<Option<Dashboard>>;

    /// The earliest month still open.
    async fn get_oldest_open_dashboard(&self) -> Result<Option<Dashboard>>;

    /// The latest month already closed.
    async fn get_latest_closed_dashboard(&self) -> Result<Option<Dashboard>>;

    /// Succeeds when no month after dashboard `id` is closed,
    /// fails with `NextMonthClosed` otherwise.
    async fn ensure_no_closed_next(&self, id: i64) -> Result<()>;

    /// Create an open dashboard for the month containing `month`, returning
    /// the id of the existing one if the month already has a dashboard.
    async fn create(&self, month: NaiveDate) -> Result<i64>;

    /// Persist the closed state and insert the daily rows atomically.
    async fn approve(&self, dashboard: &Dashboard) -> Result<()>;

    /// Persist the reopened state and delete the daily rows atomically.
    async fn cancel_approve(&self, dashboard: &Dashboard) -> Result<()>;

    /// Overwrite the carried balance only.
    async fn adjust_balance(&self, id: i64, balance: i64) -> Result<()>;

    /// Retrieve one actual row, scoped to its dashboard.
    async fn get_actual(&self, dashboard_id: i64, actual_id: i64) -> Result<Option<Actual>>;

    /// Id of the actual row recorded for `plan_id` on the dashboard, if any.
    async fn exists_actual(&self, dashboard_id: i64, plan_id: i64) -> Result<Option<i64>>;

    /// Record the plan's amount on the dashboard. A dashboard holds at most
    /// one row per plan; if one appeared concurrently it is overwritten and
    /// its id returned.
    async fn create_actual(&self, dashboard_id: i64, actual: &ActualSnapshot) -> Result<i64>;

    /// Overwrite an actual row. Fails with `ActualNotFound` unless the row is
    /// on `dashboard_id` and belongs to `actual.plan_id`.
    async fn update_actual(
        &self,
        dashboard_id: i64,
        actual_id: i64,
        actual: &ActualSnapshot,
    ) -> Result<()>;
}

/// Read access to recurring plans.
#[async_trait]
pub trait PlansRepository: Send + Sync {
    /// Retrieve a plan, deleted or not.
    async fn get_by_id(&self, id: i64) -> Result<Option<Plan>>;

    /// Non-deleted plans whose date range may touch the month, ordered by
    /// creation time. This is a coarse filter; interval matching is left to
    /// the caller.
    async fn get_by_month(&self, month: NaiveDate) -> Result<Vec<Plan>>;
}

/// Read access to one-off transactions.
#[async_trait]
pub trait TransactionsRepository: Send + Sync {
    /// Transactions dated within the local month containing `month`,
    /// ordered by date.
    async fn get_by_month(&self, month: NaiveDate) -> Result<Vec<Transaction>>;
}
