//! Core business logic - monthly aggregation and closing.
//!
//! [`Ledger`] owns the repositories, the clock and the change notifier, and
//! exposes the operations controllers call: [`Ledger::summarize`],
//! [`Ledger::approve`], [`Ledger::cancel_approve`], [`Ledger::adjust_balance`]
//! and [`Ledger::enter_actual`].

/// Entering actual amounts
pub mod actual;
/// Concurrent fetches joined at a single point
pub mod fanout;
/// Approve, cancel-approve and balance adjustment
pub mod lifecycle;
/// Recurring plan matching
pub mod schedule;
/// Monthly summaries
pub mod summary;

pub use actual::{ActualDetail, ActualEntry, ActualInput};
pub use summary::{DailyBalance, MonthlySummary, PlanRow};

use crate::{
    clock::Clock,
    db::{DashboardStore, PlanStore, TransactionStore},
    events::{ChangeNotifier, LedgerEvent},
    models::Transaction,
    repository::{DashboardRepository, PlansRepository, TransactionsRepository},
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;

/// The monthly aggregation and closing engine.
#[derive(Clone)]
pub struct Ledger {
    dashboards: Arc<dyn DashboardRepository>,
    plans: Arc<dyn PlansRepository>,
    transactions: Arc<dyn TransactionsRepository>,
    clock: Arc<dyn Clock>,
    notifier: Arc<dyn ChangeNotifier>,
    income_category: i32,
}

impl Ledger {
    /// Builds a ledger over arbitrary repository implementations.
    #[must_use]
    pub fn new(
        dashboards: Arc<dyn DashboardRepository>,
        plans: Arc<dyn PlansRepository>,
        transactions: Arc<dyn TransactionsRepository>,
        clock: Arc<dyn Clock>,
        notifier: Arc<dyn ChangeNotifier>,
        income_category: i32,
    ) -> Self {
        Self {
            dashboards,
            plans,
            transactions,
            clock,
            notifier,
            income_category,
        }
    }

    /// Wires the `SeaORM` stores over a single connection.
    #[must_use]
    pub fn from_connection(
        db: DatabaseConnection,
        clock: Arc<dyn Clock>,
        notifier: Arc<dyn ChangeNotifier>,
        income_category: i32,
    ) -> Self {
        Self::new(
            Arc::new(DashboardStore::new(db.clone(), Arc::clone(&clock))),
            Arc::new(PlanStore::new(db.clone())),
            Arc::new(TransactionStore::new(db, Arc::clone(&clock))),
            clock,
            notifier,
            income_category,
        )
    }

    /// The time source used for month boundaries.
    #[must_use]
    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    /// Splits transaction amounts into `(income, expense)`.
    fn transaction_totals(&self, transactions: &[Transaction]) -> (i64, i64) {
        transactions.iter().fold((0, 0), |(income, expense), t| {
            if t.is_income(self.income_category) {
                (income + t.amount, expense)
            } else {
                (income, expense + t.amount)
            }
        })
    }

    fn notify(&self, event: LedgerEvent) {
        self.notifier.notify(event);
    }
}
