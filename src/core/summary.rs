//! Monthly summary: plan projections merged with recorded actuals and transactions.

use super::{Ledger, fanout::Source};
use crate::{
    clock::{add_months, days_in_month, first_of_month},
    errors::Result,
    models::{Actual, Daily, Dashboard, DashboardState, Plan},
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, instrument};

/// One plan line of a month, projected or recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanRow {
    /// Plan this line belongs to
    pub plan_id: i64,
    /// Current name, or the recorded one once entered
    pub plan_name: String,
    /// Income (true) or expense (false)
    pub is_income: bool,
    /// Planned amount
    pub plan_amount: i64,
    /// Recorded row, if an amount was entered
    pub actual_id: Option<i64>,
    /// Entered amount
    pub actual_amount: Option<i64>,
    /// Plan creation time; lines are ordered by it
    pub created_at: DateTime<Utc>,
}

impl PlanRow {
    fn projected(plan: &Plan) -> Self {
        Self {
            plan_id: plan.id,
            plan_name: plan.name.clone(),
            is_income: plan.is_income,
            plan_amount: plan.amount,
            actual_id: None,
            actual_amount: None,
            created_at: plan.created_at,
        }
    }

    fn recorded(actual: &Actual) -> Self {
        Self {
            plan_id: actual.plan_id,
            plan_name: actual.plan_name.clone(),
            is_income: actual.is_income,
            plan_amount: actual.plan_amount,
            actual_id: Some(actual.id),
            actual_amount: Some(actual.actual_amount),
            created_at: actual.plan_created_at,
        }
    }

    /// Whether an actual amount has been entered for this plan.
    #[must_use]
    pub const fn is_input(&self) -> bool {
        self.actual_id.is_some()
    }

    /// The recorded amount, or the planned one while nothing was entered.
    #[must_use]
    pub fn amount(&self) -> i64 {
        self.actual_amount.unwrap_or(self.plan_amount)
    }
}

/// One day of the balance curve.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyBalance {
    /// Local calendar day
    pub date: NaiveDate,
    /// Income dated on this day
    pub income: i64,
    /// Expense dated on this day, or projected after today
    pub expense: i64,
    /// Running balance of the month up to and including this day
    pub balance: i64,
}

/// The rollup of one month as shown on the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlySummary {
    /// `None` while the month has no dashboard row
    pub dashboard_id: Option<i64>,
    /// First day of the month
    pub month: NaiveDate,
    /// Open or closed
    pub state: DashboardState,
    /// Plan and transaction income
    pub income: i64,
    /// Plan and transaction expense
    pub expense: i64,
    /// Balance carried in from the previous closed month
    pub previous_balance: Option<i64>,
    /// Carried balance; only known once the month is closed
    pub balance: Option<i64>,
    /// Plan lines, ordered by plan creation time
    pub plans: Vec<PlanRow>,
    /// Balance curve, one entry per day
    pub daily: Vec<DailyBalance>,
    /// Whether `approve` would currently be accepted
    pub can_approve: bool,
    /// Whether `cancel_approve` would currently be accepted
    pub can_cancel_approve: bool,
}

impl Ledger {
    /// Summarizes `month`, or the working month when `None`.
    ///
    /// The working month is the oldest open month, else the month after the
    /// latest closed one, else the current month. Closed months are returned
    /// from their stored snapshot without recomputation.
    ///
    /// # Errors
    /// Repository errors pass through unchanged.
    #[instrument(skip(self))]
    pub async fn summarize(&self, month: Option<NaiveDate>) -> Result<MonthlySummary> {
        if let Some(month) = month {
            let month = first_of_month(month);
            return match self.dashboards.get_by_month(month).await? {
                Some(dashboard) if dashboard.is_closed() => self.summarize_closed(dashboard).await,
                dashboard => self.summarize_open(month, dashboard).await,
            };
        }

        if let Some(oldest) = self.dashboards.get_oldest_open_dashboard().await? {
            return self.summarize_open(oldest.date, Some(oldest)).await;
        }

        let month = match self.dashboards.get_latest_closed_dashboard().await? {
            Some(latest) => add_months(latest.date, 1),
            None => self.clock.month_start(None),
        };
        debug!("No open month, working on {month}");
        self.summarize_open(month, None).await
    }

    async fn summarize_closed(&self, dashboard: Dashboard) -> Result<MonthlySummary> {
        let data = self.gather(dashboard.date, &[Source::NextDashboard]).await?;
        let can_cancel_approve = data.next.as_ref().is_none_or(|next| !next.is_closed());

        let plans: Vec<PlanRow> = dashboard.actual.iter().map(PlanRow::recorded).collect();
        let (plan_income, plan_expense) = row_totals(&plans);
        let daily = closed_curve(dashboard.date, plan_income - plan_expense, &dashboard.daily);

        Ok(MonthlySummary {
            dashboard_id: Some(dashboard.id),
            month: dashboard.date,
            state: DashboardState::Closed,
            income: dashboard.income.unwrap_or_default(),
            expense: dashboard.expense.unwrap_or_default(),
            previous_balance: dashboard.previous_balance,
            balance: dashboard.balance,
            plans,
            daily,
            can_approve: false,
            can_cancel_approve,
        })
    }

    async fn summarize_open(
        &self,
        month: NaiveDate,
        dashboard: Option<Dashboard>,
    ) -> Result<MonthlySummary> {
        let data = self
            .gather(
                month,
                &[
                    Source::Transactions,
                    Source::DuePlans,
                    Source::PreviousDashboard,
                ],
            )
            .await?;

        let plans = plan_rows(&data.plans, dashboard.as_ref());
        let all_plans_input = plans.iter().all(PlanRow::is_input);
        let (plan_income, plan_expense) = row_totals(&plans);
        let (transaction_income, transaction_expense) = self.transaction_totals(&data.transactions);

        let previous_open = data.previous.as_ref().is_some_and(|d| !d.is_closed());
        let previous_balance = data
            .previous
            .as_ref()
            .filter(|d| d.is_closed())
            .and_then(|d| d.balance);
        let can_approve =
            all_plans_input && !previous_open && month < self.clock.month_start(None);

        let breakdown = self.daily_breakdown(month, &data.transactions);
        let daily = self.projected_curve(plan_income - plan_expense, breakdown);

        Ok(MonthlySummary {
            dashboard_id: dashboard.map(|d| d.id),
            month,
            state: DashboardState::Open,
            income: plan_income + transaction_income,
            expense: plan_expense + transaction_expense,
            previous_balance,
            balance: None,
            plans,
            daily,
            can_approve,
            can_cancel_approve: false,
        })
    }

    /// Running balance of an open month. Days after today are projected with
    /// the average daily expense observed so far.
    fn projected_curve(&self, opening: i64, breakdown: Vec<Daily>) -> Vec<DailyBalance> {
        let today = self.clock.day_start(None);
        let mut balance = opening;
        let mut spent = 0;
        let mut elapsed = 0;

        breakdown
            .into_iter()
            .map(|day| {
                if day.date > today && elapsed > 0 {
                    balance -= spent / elapsed;
                } else {
                    balance += day.income - day.expense;
                    spent += day.expense;
                    elapsed += 1;
                }
                DailyBalance {
                    date: day.date,
                    income: day.income,
                    expense: day.expense,
                    balance,
                }
            })
            .collect()
    }
}

/// Due plans keyed by id, overlaid with the dashboard's actual rows, ordered
/// by plan creation time.
fn plan_rows(due: &[Plan], dashboard: Option<&Dashboard>) -> Vec<PlanRow> {
    let mut rows: HashMap<i64, PlanRow> = due
        .iter()
        .map(|plan| (plan.id, PlanRow::projected(plan)))
        .collect();

    for actual in dashboard.map(|d| d.actual.as_slice()).unwrap_or_default() {
        rows.insert(actual.plan_id, PlanRow::recorded(actual));
    }

    let mut rows: Vec<PlanRow> = rows.into_values().collect();
    rows.sort_by_key(|row| (row.created_at, row.plan_id));
    rows
}

fn row_totals(rows: &[PlanRow]) -> (i64, i64) {
    rows.iter().fold((0, 0), |(income, expense), row| {
        if row.is_income {
            (income + row.amount(), expense)
        } else {
            (income, expense + row.amount())
        }
    })
}

/// Running balance of a closed month over every calendar day.
fn closed_curve(month: NaiveDate, opening: i64, stored: &[Daily]) -> Vec<DailyBalance> {
    let by_date: HashMap<NaiveDate, &Daily> = stored.iter().map(|d| (d.date, d)).collect();
    let mut balance = opening;

    days_in_month(month)
        .into_iter()
        .map(|date| {
            let (income, expense) = by_date
                .get(&date)
                .map_or((0, 0), |d| (d.income, d.expense));
            balance += income - expense;
            DailyBalance {
                date,
                income,
                expense,
                balance,
            }
        })
        .collect()
}
