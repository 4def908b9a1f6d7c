//! Database configuration module.
//!
//! This module handles the `SQLite` connection and table creation using `SeaORM`.
//! Tables are generated from the entity definitions with
//! `Schema::create_table_from_entity`, so the schema always matches the Rust
//! structs without hand-written SQL.

use crate::entities::{Actual, ActualColumn, Daily, Dashboard, Plan, Transaction};
use crate::errors::Result;
use sea_orm::{
    ConnectionTrait, Database, DatabaseConnection, EntityTrait, Schema, sea_query::Index,
};
use std::path::Path;
use tracing::{debug, info};

/// Default location of the ledger database.
pub const DEFAULT_DATABASE_URL: &str = "sqlite://data/ledger.sqlite?mode=rwc";

/// Creates the directory holding a file-backed `SQLite` database, so that
/// `mode=rwc` can create the file itself.
pub fn ensure_database_dir(database_url: &str) -> Result<()> {
    let Some(path) = database_url.strip_prefix("sqlite://") else {
        return Ok(());
    };
    let path = path.split('?').next().unwrap_or(path);
    if let Some(parent) = Path::new(path).parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}

/// Establishes a connection to the database at `database_url`.
pub async fn create_connection(database_url: &str) -> Result<DatabaseConnection> {
    debug!("Connecting to database at {database_url}");
    Database::connect(database_url).await.map_err(Into::into)
}

/// Creates every ledger table that does not exist yet.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let schema = Schema::new(db.get_database_backend());

    create_table(db, &schema, Plan).await?;
    create_table(db, &schema, Transaction).await?;
    create_table(db, &schema, Dashboard).await?;
    create_table(db, &schema, Actual).await?;
    create_table(db, &schema, Daily).await?;

    // At most one actual row per plan and month
    let builder = db.get_database_backend();
    let actual_per_plan = Index::create()
        .name("idx_actuals_dashboard_plan")
        .table(Actual)
        .col(ActualColumn::DashboardId)
        .col(ActualColumn::PlanId)
        .unique()
        .if_not_exists()
        .to_owned();
    db.execute(builder.build(&actual_per_plan)).await?;

    info!("Ledger tables ensured");
    Ok(())
}

async fn create_table<E>(db: &DatabaseConnection, schema: &Schema, entity: E) -> Result<()>
where
    E: EntityTrait,
{
    let builder = db.get_database_backend();
    let mut statement = schema.create_table_from_entity(entity);
    statement.if_not_exists();
    db.execute(builder.build(&statement)).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::entities::{
        actual, actual::Model as ActualModel, daily::Model as DailyModel, dashboard,
        dashboard::Model as DashboardModel, plan::Model as PlanModel,
        transaction::Model as TransactionModel,
    };
    use chrono::{NaiveDate, Utc};
    use sea_orm::{ActiveModelTrait, QuerySelect, Set};

    #[tokio::test]
    async fn test_create_tables() -> Result<()> {
        let db = create_connection("sqlite::memory:").await?;
        create_tables(&db).await?;

        // Test that tables exist by querying them
        let _: Vec<PlanModel> = Plan::find().limit(1).all(&db).await?;
        let _: Vec<TransactionModel> = Transaction::find().limit(1).all(&db).await?;
        let _: Vec<DashboardModel> = Dashboard::find().limit(1).all(&db).await?;
        let _: Vec<ActualModel> = Actual::find().limit(1).all(&db).await?;
        let _: Vec<DailyModel> = Daily::find().limit(1).all(&db).await?;

        Ok(())
    }

    #[tokio::test]
    async fn test_one_actual_per_plan_and_dashboard() -> Result<()> {
        let db = create_connection("sqlite::memory:").await?;
        create_tables(&db).await?;

        let row = |dashboard_id: i64, plan_id: i64| actual::ActiveModel {
            dashboard_id: Set(dashboard_id),
            actual_amount: Set(100),
            plan_id: Set(plan_id),
            plan_name: Set("Rent".to_string()),
            plan_amount: Set(100),
            is_income: Set(false),
            plan_created_at: Set(Utc::now()),
            ..Default::default()
        };

        let mut months = Vec::new();
        for month in [1, 2] {
            let model = dashboard::ActiveModel {
                date: Set(NaiveDate::from_ymd_opt(2024, month, 1).unwrap()),
                state: Set("open".to_string()),
                ..Default::default()
            }
            .insert(&db)
            .await?;
            months.push(model.id);
        }

        row(months[0], 7).insert(&db).await?;
        row(months[1], 7).insert(&db).await?;
        row(months[0], 8).insert(&db).await?;
        assert!(row(months[0], 7).insert(&db).await.is_err());
        assert_eq!(Actual::find().all(&db).await?.len(), 3);
        Ok(())
    }

    #[test]
    fn test_ensure_database_dir() -> Result<()> {
        ensure_database_dir("sqlite::memory:")?;
        ensure_database_dir("sqlite://ledger.sqlite?mode=rwc")?;

        let dir = std::env::temp_dir().join("household-ledger-dir-test");
        let url = format!("sqlite://{}/nested/ledger.sqlite?mode=rwc", dir.display());
        ensure_database_dir(&url)?;
        assert!(dir.join("nested").is_dir());
        std::fs::remove_dir_all(dir)?;
        Ok(())
    }

    #[tokio::test]
    async fn test_create_tables_is_repeatable() -> Result<()> {
        let db = create_connection("sqlite::memory:").await?;
        create_tables(&db).await?;
        create_tables(&db).await?;
        Ok(())
    }
}
