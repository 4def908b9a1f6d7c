//! Recording the actual amount of a plan for a month.

use super::Ledger;
use crate::{
    clock::first_of_month,
    errors::{Error, Result},
    events::LedgerEvent,
    models::{ActualSnapshot, Plan},
};
use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, info, instrument};

/// Arguments of [`Ledger::enter_actual`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActualInput {
    /// Any date within the target month
    pub month: NaiveDate,
    /// Plan the amount is recorded for
    pub plan_id: i64,
    /// Resolved from `month` when absent, creating the dashboard if needed
    pub dashboard_id: Option<i64>,
    /// Looked up by plan when absent
    pub actual_id: Option<i64>,
    /// Amount to record
    pub amount: i64,
}

/// Where an entered amount was stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ActualEntry {
    /// Month the amount was stored on
    pub dashboard_id: i64,
    /// The created or overwritten row
    pub actual_id: i64,
}

/// A plan together with its recorded amount, if any.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActualDetail {
    /// Current plan name
    pub plan_name: String,
    /// Current planned amount
    pub plan_amount: i64,
    /// Recorded amount, when requested and present
    pub actual_amount: Option<i64>,
}

impl Ledger {
    /// Returns the dashboard of the month containing `month`, creating an
    /// open one if the month has none yet.
    ///
    /// # Errors
    /// Repository errors pass through unchanged.
    pub async fn open_month(&self, month: NaiveDate) -> Result<i64> {
        self.dashboards.create(first_of_month(month)).await
    }

    /// Creates or overwrites the actual row of a plan for a month.
    ///
    /// The plan's current name, amount, direction and creation time are
    /// copied onto the row on every write.
    ///
    /// # Errors
    /// * `PlanNotFound` - no plan with `input.plan_id`
    /// * `DashboardNotFound` - an explicit `dashboard_id` does not exist
    /// * `ActualNotFound` - an explicit `actual_id` is not on the dashboard or
    ///   was recorded for another plan
    #[instrument(skip(self))]
    pub async fn enter_actual(&self, input: ActualInput) -> Result<ActualEntry> {
        let plan = self.plan(input.plan_id).await?;
        let snapshot = ActualSnapshot::from_plan(&plan, input.amount);

        let dashboard_id = match input.dashboard_id {
            Some(id) => {
                if self.dashboards.get_by_id(id).await?.is_none() {
                    return Err(Error::DashboardNotFound { id });
                }
                id
            }
            None => self.open_month(input.month).await?,
        };

        let existing = match input.actual_id {
            Some(actual_id) => Some(actual_id),
            None => self.dashboards.exists_actual(dashboard_id, plan.id).await?,
        };

        let actual_id = if let Some(actual_id) = existing {
            self.dashboards
                .update_actual(dashboard_id, actual_id, &snapshot)
                .await?;
            debug!("Updated actual {actual_id} on dashboard {dashboard_id}");
            actual_id
        } else {
            let actual_id = self.dashboards.create_actual(dashboard_id, &snapshot).await?;
            info!(
                "Recorded {} for plan '{}' on dashboard {dashboard_id}",
                input.amount, plan.name
            );
            actual_id
        };

        self.notify(LedgerEvent::ActualRecorded {
            dashboard_id,
            actual_id,
            plan_id: plan.id,
        });
        Ok(ActualEntry {
            dashboard_id,
            actual_id,
        })
    }

    /// Plan details for the entry form, with the recorded amount when both
    /// `dashboard_id` and `actual_id` are given.
    ///
    /// # Errors
    /// `PlanNotFound` or `ActualNotFound` when the referenced rows are missing.
    pub async fn actual_detail(
        &self,
        plan_id: i64,
        dashboard_id: Option<i64>,
        actual_id: Option<i64>,
    ) -> Result<ActualDetail> {
        let plan = self.plan(plan_id).await?;

        let actual_amount = match (dashboard_id, actual_id) {
            (Some(dashboard_id), Some(actual_id)) => {
                let actual = self
                    .dashboards
                    .get_actual(dashboard_id, actual_id)
                    .await?
                    .ok_or(Error::ActualNotFound {
                        dashboard_id,
                        actual_id,
                    })?;
                Some(actual.actual_amount)
            }
            _ => None,
        };

        Ok(ActualDetail {
            plan_name: plan.name,
            plan_amount: plan.amount,
            actual_amount,
        })
    }

    async fn plan(&self, id: i64) -> Result<Plan> {
        self.plans
            .get_by_id(id)
            .await?
            .ok_or(Error::PlanNotFound { id })
    }
}
