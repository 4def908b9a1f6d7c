//! `SeaORM` implementation of [`DashboardRepository`].
//!
//! Approve and cancel-approve write the dashboard row, its daily rows and the
//! `daily_id` stamps of the month's transactions inside one database
//! transaction, so a month is never observed half closed.

use crate::{
    clock::{Clock, first_of_month},
    entities::{
        Actual as ActualEntity, Daily as DailyEntity, Dashboard as DashboardEntity,
        Transaction as TransactionEntity, actual, daily, dashboard, transaction,
    },
    errors::{Error, Result},
    models::{Actual, ActualSnapshot, Daily, Dashboard, DashboardState},
    repository::DashboardRepository,
};
use async_trait::async_trait;
use chrono::{Days, NaiveDate};
use sea_orm::{
    ActiveValue::{NotSet, Unchanged},
    Condition, QueryOrder, Set, TransactionTrait,
    prelude::*,
    sea_query::Expr,
};
use std::sync::Arc;
use tracing::{debug, info};

impl From<actual::Model> for Actual {
    fn from(model: actual::Model) -> Self {
        Self {
            id: model.id,
            actual_amount: model.actual_amount,
            plan_id: model.plan_id,
            plan_name: model.plan_name,
            plan_amount: model.plan_amount,
            is_income: model.is_income,
            plan_created_at: model.plan_created_at,
        }
    }
}

impl From<daily::Model> for Daily {
    fn from(model: daily::Model) -> Self {
        Self {
            id: Some(model.id),
            date: model.date,
            income: model.income,
            expense: model.expense,
        }
    }
}

/// Dashboard storage backed by a `SeaORM` connection.
#[derive(Clone)]
pub struct DashboardStore {
    db: DatabaseConnection,
    clock: Arc<dyn Clock>,
}

impl DashboardStore {
    /// Store over `db`; `clock` places transactions on local days.
    #[must_use]
    pub fn new(db: DatabaseConnection, clock: Arc<dyn Clock>) -> Self {
        Self { db, clock }
    }

    /// Loads the actual and daily rows of a dashboard row.
    async fn hydrate(&self, model: dashboard::Model) -> Result<Dashboard> {
        let state = DashboardState::parse(&model.state).ok_or_else(|| {
            DbErr::Type(format!(
                "dashboard {} has unknown state '{}'",
                model.id, model.state
            ))
        })?;

        let actual = ActualEntity::find()
            .filter(actual::Column::DashboardId.eq(model.id))
            .order_by_asc(actual::Column::PlanCreatedAt)
            .order_by_asc(actual::Column::Id)
            .all(&self.db)
            .await?;

        let daily = DailyEntity::find()
            .filter(daily::Column::DashboardId.eq(model.id))
            .order_by_asc(daily::Column::Date)
            .all(&self.db)
            .await?;

        Ok(Dashboard {
            id: model.id,
            date: model.date,
            state,
            income: model.income,
            expense: model.expense,
            current_balance: model.current_balance,
            balance: model.balance,
            previous_dashboard_id: model.previous_dashboard_id,
            previous_balance: model.previous_balance,
            daily: daily.into_iter().map(Daily::from).collect(),
            actual: actual.into_iter().map(Actual::from).collect(),
        })
    }

    async fn hydrate_optional(&self, model: Option<dashboard::Model>) -> Result<Option<Dashboard>> {
        match model {
            Some(model) => self.hydrate(model).await.map(Some),
            None => Ok(None),
        }
    }

    async fn find_month(&self, month: NaiveDate) -> Result<Option<dashboard::Model>> {
        DashboardEntity::find()
            .filter(dashboard::Column::Date.eq(first_of_month(month)))
            .one(&self.db)
            .await
            .map_err(Into::into)
    }
}

/// Active model carrying every field of `dashboard` that the lifecycle writes.
fn state_update(dashboard: &Dashboard) -> dashboard::ActiveModel {
    dashboard::ActiveModel {
        id: Unchanged(dashboard.id),
        date: NotSet,
        state: Set(dashboard.state.as_str().to_string()),
        income: Set(dashboard.income),
        expense: Set(dashboard.expense),
        current_balance: Set(dashboard.current_balance),
        balance: Set(dashboard.balance),
        previous_dashboard_id: Set(dashboard.previous_dashboard_id),
        previous_balance: Set(dashboard.previous_balance),
    }
}

#[async_trait]
impl DashboardRepository for DashboardStore {
    async fn get_by_id(&self, id: i64) -> Result<Option<Dashboard>> {
        let model = DashboardEntity::find_by_id(id).one(&self.db).await?;
        self.hydrate_optional(model).await
    }

    async fn get_by_month(&self, month: NaiveDate) -> Result<Option<Dashboard>> {
        let model = self.find_month(month).await?;
        self.hydrate_optional(model).await
    }

    async fn get_oldest_open_dashboard(&self) -> Result<Option<Dashboard>> {
        let model = DashboardEntity::find()
            .filter(dashboard::Column::State.eq(DashboardState::Open.as_str()))
            .order_by_asc(dashboard::Column::Date)
            .one(&self.db)
            .await?;
        self.hydrate_optional(model).await
    }

    async fn get_latest_closed_dashboard(&self) -> Result<Option<Dashboard>> {
        let model = DashboardEntity::find()
            .filter(dashboard::Column::State.eq(DashboardState::Closed.as_str()))
            .order_by_desc(dashboard::Column::Date)
            .one(&self.db)
            .await?;
        self.hydrate_optional(model).await
    }

    async fn ensure_no_closed_next(&self, id: i64) -> Result<()> {
        let current = DashboardEntity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(Error::DashboardNotFound { id })?;

        let closed_later = DashboardEntity::find()
            .filter(dashboard::Column::State.eq(DashboardState::Closed.as_str()))
            .filter(
                Condition::any()
                    .add(dashboard::Column::Date.gt(current.date))
                    .add(dashboard::Column::PreviousDashboardId.eq(id)),
            )
            .count(&self.db)
            .await?;

        if closed_later > 0 {
            return Err(Error::NextMonthClosed {
                month: current.date,
            });
        }
        Ok(())
    }

    async fn create(&self, month: NaiveDate) -> Result<i64> {
        let date = first_of_month(month);
        if let Some(existing) = self.find_month(date).await? {
            return Ok(existing.id);
        }

        let new_dashboard = dashboard::ActiveModel {
            date: Set(date),
            state: Set(DashboardState::Open.as_str().to_string()),
            ..Default::default()
        };

        match new_dashboard.insert(&self.db).await {
            Ok(model) => {
                info!("Created dashboard {} for {date}", model.id);
                Ok(model.id)
            }
            // Lost a race against another writer; the unique date index kept one row
            Err(e) => match self.find_month(date).await? {
                Some(existing) => Ok(existing.id),
                None => Err(e.into()),
            },
        }
    }

    async fn approve(&self, dashboard: &Dashboard) -> Result<()> {
        let txn = self.db.begin().await?;

        state_update(dashboard).update(&txn).await?;

        // Replace rather than append so a retried approval never duplicates days
        DailyEntity::delete_many()
            .filter(daily::Column::DashboardId.eq(dashboard.id))
            .exec(&txn)
            .await?;

        for day in &dashboard.daily {
            let inserted = daily::ActiveModel {
                dashboard_id: Set(dashboard.id),
                date: Set(day.date),
                income: Set(day.income),
                expense: Set(day.expense),
                ..Default::default()
            }
            .insert(&txn)
            .await?;

            let from = self.clock.local_midnight(day.date);
            let to = self
                .clock
                .local_midnight(day.date.checked_add_days(Days::new(1)).unwrap_or(NaiveDate::MAX));
            TransactionEntity::update_many()
                .col_expr(transaction::Column::DailyId, Expr::value(inserted.id))
                .filter(transaction::Column::Date.gte(from))
                .filter(transaction::Column::Date.lt(to))
                .exec(&txn)
                .await?;
        }

        txn.commit().await?;
        debug!(
            "Dashboard {} persisted as closed with {} daily rows",
            dashboard.id,
            dashboard.daily.len()
        );
        Ok(())
    }

    async fn cancel_approve(&self, dashboard: &Dashboard) -> Result<()> {
        let txn = self.db.begin().await?;

        state_update(dashboard).update(&txn).await?;

        let daily_ids: Vec<i64> = DailyEntity::find()
            .filter(daily::Column::DashboardId.eq(dashboard.id))
            .all(&txn)
            .await?
            .into_iter()
            .map(|d| d.id)
            .collect();

        if !daily_ids.is_empty() {
            TransactionEntity::update_many()
                .col_expr(transaction::Column::DailyId, Expr::value(Option::<i64>::None))
                .filter(transaction::Column::DailyId.is_in(daily_ids))
                .exec(&txn)
                .await?;
        }

        DailyEntity::delete_many()
            .filter(daily::Column::DashboardId.eq(dashboard.id))
            .exec(&txn)
            .await?;

        txn.commit().await?;
        Ok(())
    }

    async fn adjust_balance(&self, id: i64, balance: i64) -> Result<()> {
        dashboard::ActiveModel {
            id: Unchanged(id),
            balance: Set(Some(balance)),
            ..Default::default()
        }
        .update(&self.db)
        .await?;
        Ok(())
    }

    async fn get_actual(&self, dashboard_id: i64, actual_id: i64) -> Result<Option<Actual>> {
        Ok(ActualEntity::find_by_id(actual_id)
            .filter(actual::Column::DashboardId.eq(dashboard_id))
            .one(&self.db)
            .await?
            .map(Actual::from))
    }

    async fn exists_actual(&self, dashboard_id: i64, plan_id: i64) -> Result<Option<i64>> {
        Ok(ActualEntity::find()
            .filter(actual::Column::DashboardId.eq(dashboard_id))
            .filter(actual::Column::PlanId.eq(plan_id))
            .one(&self.db)
            .await?
            .map(|a| a.id))
    }

    async fn create_actual(&self, dashboard_id: i64, actual: &ActualSnapshot) -> Result<i64> {
        let new_actual = actual::ActiveModel {
            dashboard_id: Set(dashboard_id),
            actual_amount: Set(actual.actual_amount),
            plan_id: Set(actual.plan_id),
            plan_name: Set(actual.plan_name.clone()),
            plan_amount: Set(actual.plan_amount),
            is_income: Set(actual.is_income),
            plan_created_at: Set(actual.plan_created_at),
            ..Default::default()
        };

        match new_actual.insert(&self.db).await {
            Ok(model) => Ok(model.id),
            // Another writer recorded this plan first; overwrite its row instead
            Err(e) => match self.exists_actual(dashboard_id, actual.plan_id).await? {
                Some(actual_id) => {
                    debug!(
                        "Actual for plan {} already on dashboard {dashboard_id}",
                        actual.plan_id
                    );
                    self.update_actual(dashboard_id, actual_id, actual).await?;
                    Ok(actual_id)
                }
                None => Err(e.into()),
            },
        }
    }

    async fn update_actual(
        &self,
        dashboard_id: i64,
        actual_id: i64,
        actual: &ActualSnapshot,
    ) -> Result<()> {
        let existing = ActualEntity::find_by_id(actual_id)
            .filter(actual::Column::DashboardId.eq(dashboard_id))
            .filter(actual::Column::PlanId.eq(actual.plan_id))
            .one(&self.db)
            .await?
            .ok_or(Error::ActualNotFound {
                dashboard_id,
                actual_id,
            })?;

        let mut active_model: actual::ActiveModel = existing.into();
        active_model.actual_amount = Set(actual.actual_amount);
        active_model.plan_name = Set(actual.plan_name.clone());
        active_model.plan_amount = Set(actual.plan_amount);
        active_model.is_income = Set(actual.is_income);
        active_model.plan_created_at = Set(actual.plan_created_at);
        active_model.update(&self.db).await?;
        Ok(())
    }
}
