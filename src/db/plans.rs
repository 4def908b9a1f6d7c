//! `SeaORM` implementation of [`PlansRepository`].

use crate::{
    clock::{first_of_month, next_month_start},
    entities::{Plan as PlanEntity, plan},
    errors::Result,
    models::Plan,
    repository::PlansRepository,
};
use async_trait::async_trait;
use chrono::NaiveDate;
use sea_orm::{Condition, QueryOrder, prelude::*};
use tracing::debug;

impl From<plan::Model> for Plan {
    fn from(model: plan::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            is_income: model.is_income,
            amount: model.amount,
            interval: model.interval,
            start: model.start,
            end: model.end,
            is_deleted: model.is_deleted,
            created_at: model.created_at,
        }
    }
}

/// Plan storage backed by a `SeaORM` connection.
#[derive(Debug, Clone)]
pub struct PlanStore {
    db: DatabaseConnection,
}

impl PlanStore {
    /// Store over `db`.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl PlansRepository for PlanStore {
    async fn get_by_id(&self, id: i64) -> Result<Option<Plan>> {
        Ok(PlanEntity::find_by_id(id)
            .one(&self.db)
            .await?
            .map(Plan::from))
    }

    async fn get_by_month(&self, month: NaiveDate) -> Result<Vec<Plan>> {
        let start = first_of_month(month);
        let end = next_month_start(month);

        let plans = PlanEntity::find()
            .filter(plan::Column::IsDeleted.eq(false))
            .filter(
                Condition::any()
                    .add(plan::Column::Start.is_null())
                    .add(plan::Column::Start.lt(end)),
            )
            .filter(
                Condition::any()
                    .add(plan::Column::End.is_null())
                    .add(plan::Column::End.gte(start)),
            )
            .order_by_asc(plan::Column::CreatedAt)
            .order_by_asc(plan::Column::Id)
            .all(&self.db)
            .await?;

        debug!("{} plan candidates for {start}", plans.len());
        Ok(plans.into_iter().map(Plan::from).collect())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_get_by_id_returns_none_for_unknown_plan() -> Result<()> {
        let db = setup_test_db().await?;
        let store = PlanStore::new(db);

        assert!(store.get_by_id(42).await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_get_by_month_filters_range_and_deleted() -> Result<()> {
        let db = setup_test_db().await?;
        let store = PlanStore::new(db.clone());

        let open_ended = create_test_plan(&db, "Salary", true, 1000, 1, Some(date(2024, 1, 1))).await?;
        let ended = create_custom_plan(
            &db,
            "Gym",
            false,
            50,
            1,
            Some(date(2023, 1, 1)),
            Some(date(2024, 1, 31)),
        )
        .await?;
        let _future = create_test_plan(&db, "Later", false, 10, 1, Some(date(2024, 3, 1))).await?;
        let deleted = create_test_plan(&db, "Old", false, 10, 1, None).await?;
        soft_delete_plan(&db, deleted.id).await?;

        let plans = store.get_by_month(date(2024, 2, 1)).await?;
        let ids: Vec<i64> = plans.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![open_ended.id]);

        let january = store.get_by_month(date(2024, 1, 1)).await?;
        let ids: Vec<i64> = january.iter().map(|p| p.id).collect();
        assert!(ids.contains(&ended.id));
        assert!(ids.contains(&open_ended.id));

        Ok(())
    }

    #[tokio::test]
    async fn test_get_by_month_orders_by_creation() -> Result<()> {
        let db = setup_test_db().await?;
        let store = PlanStore::new(db.clone());

        let first = create_test_plan(&db, "First", true, 1, 1, None).await?;
        let second = create_test_plan(&db, "Second", false, 2, 1, None).await?;

        let plans = store.get_by_month(date(2024, 2, 1)).await?;
        assert_eq!(plans[0].id, first.id);
        assert_eq!(plans[1].id, second.id);
        Ok(())
    }
}
