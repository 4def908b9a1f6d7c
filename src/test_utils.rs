//! Shared test utilities for the ledger.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test rows with sensible defaults.

#![allow(clippy::unwrap_used)]

use crate::{
    clock::{Clock, FixedClock},
    core::Ledger,
    entities::{dashboard, plan, transaction},
    errors::Result,
    events::{ChannelNotifier, LedgerEvent},
    models::{DashboardState, Plan, Transaction},
};
use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone, Utc};
use sea_orm::{ActiveModelTrait, ActiveValue::Unchanged, DatabaseConnection, Set};
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;

/// Category code counted as income in tests.
pub const INCOME: i32 = 5;
/// Any other category code is an expense.
pub const FOOD: i32 = 1;

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn utc(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
}

pub fn tokyo() -> FixedOffset {
    FixedOffset::east_opt(9 * 3600).unwrap()
}

/// Clock pinned to 2024-04-15 12:00 in +09:00.
pub fn test_clock() -> Arc<dyn Clock> {
    Arc::new(FixedClock::new(utc(2024, 4, 15, 3), tokyo()))
}

/// Builds a ledger over `db` with the test clock and a channel notifier.
pub fn test_ledger(db: &DatabaseConnection) -> (Ledger, UnboundedReceiver<LedgerEvent>) {
    let (notifier, events) = ChannelNotifier::channel();
    let ledger = Ledger::from_connection(db.clone(), test_clock(), Arc::new(notifier), INCOME);
    (ledger, events)
}

/// Creates a plan without an end date.
///
/// # Defaults
/// * `created_at`: 2024-01-01 09:00 local
pub async fn create_test_plan(
    db: &DatabaseConnection,
    name: &str,
    is_income: bool,
    amount: i64,
    interval: i32,
    start: Option<NaiveDate>,
) -> Result<Plan> {
    create_custom_plan(db, name, is_income, amount, interval, start, None).await
}

/// Creates a plan with custom bounds.
pub async fn create_custom_plan(
    db: &DatabaseConnection,
    name: &str,
    is_income: bool,
    amount: i64,
    interval: i32,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Result<Plan> {
    let model = plan::ActiveModel {
        name: Set(name.to_string()),
        is_income: Set(is_income),
        amount: Set(amount),
        interval: Set(interval),
        start: Set(start),
        end: Set(end),
        is_deleted: Set(false),
        created_at: Set(utc(2024, 1, 1, 0)),
        ..Default::default()
    }
    .insert(db)
    .await?;
    Ok(model.into())
}

pub async fn soft_delete_plan(db: &DatabaseConnection, id: i64) -> Result<()> {
    plan::ActiveModel {
        id: Unchanged(id),
        is_deleted: Set(true),
        ..Default::default()
    }
    .update(db)
    .await?;
    Ok(())
}

/// Creates a transaction at `at` with no notes.
pub async fn create_test_transaction(
    db: &DatabaseConnection,
    amount: i64,
    category: i32,
    at: DateTime<Utc>,
) -> Result<Transaction> {
    let model = transaction::ActiveModel {
        amount: Set(amount),
        category: Set(category),
        date: Set(at),
        notes: Set(None),
        daily_id: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await?;
    Ok(model.into())
}

/// Marks a dashboard closed with `balance` as its only result, bypassing
/// the lifecycle checks.
pub async fn close_dashboard(db: &DatabaseConnection, id: i64, balance: i64) -> Result<()> {
    dashboard::ActiveModel {
        id: Unchanged(id),
        state: Set(DashboardState::Closed.as_str().to_string()),
        income: Set(Some(balance)),
        expense: Set(Some(0)),
        current_balance: Set(Some(balance)),
        balance: Set(Some(balance)),
        ..Default::default()
    }
    .update(db)
    .await?;
    Ok(())
}

/// Drains every event notified so far.
pub fn drain_events(events: &mut UnboundedReceiver<LedgerEvent>) -> Vec<LedgerEvent> {
    let mut drained = Vec::new();
    while let Ok(event) = events.try_recv() {
        drained.push(event);
    }
    drained
}
