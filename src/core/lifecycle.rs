//! Month closing: `Open --approve--> Closed --cancel_approve--> Open`, with
//! `adjust_balance` as a manual correction of a closed month.
//!
//! Every precondition is checked before the first write, so a rejected call
//! leaves the store untouched and can simply be retried once fixed.

use super::{Ledger, fanout::Source};
use crate::{
    clock::days_in_month,
    errors::{Error, Result},
    events::LedgerEvent,
    models::{Daily, Dashboard, DashboardState, Transaction},
};
use chrono::NaiveDate;
use tracing::{info, instrument, warn};

impl Ledger {
    /// Closes an open month and freezes its totals.
    ///
    /// The carried balance is the latest closed month's balance plus this
    /// month's `income - expense`; without any closed month it starts at 0.
    ///
    /// # Errors
    /// * `DashboardNotFound` - no dashboard with `id`
    /// * `AlreadyClosed` - the month is already closed
    /// * `PrecedingMonthNotClosed` - an earlier month is still open
    /// * `NextMonthClosed` - a later month has been closed already
    /// * `MissingPlanInput` - a due plan has no recorded actual amount
    #[instrument(skip(self))]
    pub async fn approve(&self, id: i64) -> Result<()> {
        let mut dashboard = self.load(id).await?;
        if dashboard.is_closed() {
            return Err(Error::AlreadyClosed { id });
        }

        let oldest_open = self.dashboards.get_oldest_open_dashboard().await?;
        if oldest_open.is_some_and(|oldest| oldest.date < dashboard.date) {
            return Err(Error::PrecedingMonthNotClosed {
                month: dashboard.date,
            });
        }

        let previous = self.dashboards.get_latest_closed_dashboard().await?;
        if let Some(previous) = &previous {
            if !previous.is_closed() {
                return Err(Error::PrecedingMonthNotClosed {
                    month: dashboard.date,
                });
            }
            if previous.date > dashboard.date {
                return Err(Error::NextMonthClosed {
                    month: dashboard.date,
                });
            }
        }

        let data = self
            .gather(dashboard.date, &[Source::Transactions, Source::DuePlans])
            .await?;

        if let Some(missing) = data
            .plans
            .iter()
            .find(|plan| dashboard.actual_for_plan(plan.id).is_none())
        {
            return Err(Error::MissingPlanInput {
                plan_id: missing.id,
                plan_name: missing.name.clone(),
            });
        }

        let (actual_income, actual_expense) = dashboard.actual.iter().fold((0, 0), |(i, e), a| {
            if a.is_income {
                (i + a.actual_amount, e)
            } else {
                (i, e + a.actual_amount)
            }
        });
        let (transaction_income, transaction_expense) = self.transaction_totals(&data.transactions);
        let income = actual_income + transaction_income;
        let expense = actual_expense + transaction_expense;
        let current_balance = income - expense;
        let previous_balance = previous.as_ref().and_then(|p| p.balance);
        let balance = previous_balance.unwrap_or_default() + current_balance;

        dashboard.state = DashboardState::Closed;
        dashboard.income = Some(income);
        dashboard.expense = Some(expense);
        dashboard.current_balance = Some(current_balance);
        dashboard.balance = Some(balance);
        dashboard.previous_balance = previous_balance;
        dashboard.previous_dashboard_id = previous.map(|p| p.id);
        dashboard.daily = self.daily_breakdown(dashboard.date, &data.transactions);

        self.dashboards.approve(&dashboard).await?;
        info!(
            "Closed {} (dashboard {id}): income {income}, expense {expense}, balance {balance}",
            dashboard.date
        );

        self.notify(LedgerEvent::MonthApproved {
            dashboard_id: id,
            month: dashboard.date,
            balance,
        });
        Ok(())
    }

    /// Reopens a closed month, discarding its frozen totals and daily rows.
    ///
    /// # Errors
    /// * `DashboardNotFound` / `NotClosed` - nothing to reopen
    /// * `NextMonthClosed` - a later month is closed; unwind from the latest first
    #[instrument(skip(self))]
    pub async fn cancel_approve(&self, id: i64) -> Result<()> {
        let mut dashboard = self.load_closed(id).await?;
        self.dashboards.ensure_no_closed_next(id).await?;

        dashboard.state = DashboardState::Open;
        dashboard.income = None;
        dashboard.expense = None;
        dashboard.current_balance = None;
        dashboard.balance = None;
        dashboard.previous_balance = None;
        dashboard.previous_dashboard_id = None;
        dashboard.daily.clear();

        self.dashboards.cancel_approve(&dashboard).await?;
        info!("Reopened {} (dashboard {id})", dashboard.date);

        self.notify(LedgerEvent::ApprovalCancelled {
            dashboard_id: id,
            month: dashboard.date,
        });
        Ok(())
    }

    /// Overwrites the carried balance of a closed month. Totals and daily
    /// rows are left as they are.
    ///
    /// # Errors
    /// Same preconditions as [`Ledger::cancel_approve`].
    #[instrument(skip(self))]
    pub async fn adjust_balance(&self, id: i64, balance: i64) -> Result<()> {
        let dashboard = self.load_closed(id).await?;
        self.dashboards.ensure_no_closed_next(id).await?;

        self.dashboards.adjust_balance(id, balance).await?;
        info!(
            "Adjusted balance of {} (dashboard {id}) from {:?} to {balance}",
            dashboard.date, dashboard.balance
        );

        self.notify(LedgerEvent::BalanceAdjusted {
            dashboard_id: id,
            balance,
        });
        Ok(())
    }

    /// One row per calendar day of the month, zeros included, ascending.
    pub(crate) fn daily_breakdown(&self, month: NaiveDate, transactions: &[Transaction]) -> Vec<Daily> {
        let mut days: Vec<Daily> = days_in_month(month).into_iter().map(Daily::empty).collect();

        for transaction in transactions {
            let day = self.clock.day_start(Some(transaction.date));
            let Some(slot) = days.iter_mut().find(|d| d.date == day) else {
                warn!(
                    "Transaction {} on {day} falls outside {month}, skipped",
                    transaction.id
                );
                continue;
            };
            if transaction.is_income(self.income_category) {
                slot.income += transaction.amount;
            } else {
                slot.expense += transaction.amount;
            }
        }

        days
    }

    async fn load(&self, id: i64) -> Result<Dashboard> {
        self.dashboards
            .get_by_id(id)
            .await?
            .ok_or(Error::DashboardNotFound { id })
    }

    async fn load_closed(&self, id: i64) -> Result<Dashboard> {
        let dashboard = self.load(id).await?;
        if !dashboard.is_closed() {
            return Err(Error::NotClosed { id });
        }
        Ok(dashboard)
    }
}
