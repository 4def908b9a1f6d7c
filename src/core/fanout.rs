//! Concurrent fetches with a single join point.
//!
//! Every independent data source is fetched on its own task inside a
//! [`JoinSet`]. The join waits for every task to finish, keeps the first
//! error to arrive and discards the rest, so no task outlives the call that
//! spawned it.

use super::{Ledger, schedule::due_plans};
use crate::{
    clock::add_months,
    errors::{Error, Result},
    models::{Dashboard, Plan, Transaction},
};
use chrono::NaiveDate;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, warn};

/// Waits for every task in `tasks`.
///
/// Returns the successful values in completion order, or the first error
/// that completed. A panicking task surfaces as [`Error::Concurrency`].
///
/// # Errors
/// The earliest error to arrive at the join point.
pub async fn join_first_error<T>(mut tasks: JoinSet<Result<T>>) -> Result<Vec<T>>
where
    T: Send + 'static,
{
    let mut values = Vec::with_capacity(tasks.len());
    let mut first_error: Option<Error> = None;

    while let Some(joined) = tasks.join_next().await {
        match joined.map_err(Error::from).and_then(|result| result) {
            Ok(value) => values.push(value),
            Err(e) if first_error.is_none() => first_error = Some(e),
            Err(e) => debug!("Discarding sibling error after first failure: {e}"),
        }
    }

    match first_error {
        Some(e) => {
            warn!("Concurrent fetch failed: {e}");
            Err(e)
        }
        None => Ok(values),
    }
}

/// An independent input of a month computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    /// Transactions dated within the month
    Transactions,
    /// Plans due in the month after interval matching
    DuePlans,
    /// Dashboard of the month before
    PreviousDashboard,
    /// Dashboard of the month after
    NextDashboard,
}

enum Fetched {
    Transactions(Vec<Transaction>),
    DuePlans(Vec<Plan>),
    PreviousDashboard(Option<Dashboard>),
    NextDashboard(Option<Dashboard>),
}

/// Everything gathered for one month. Sources that were not requested stay empty.
#[derive(Debug, Default)]
pub struct MonthData {
    /// Filled by [`Source::Transactions`]
    pub transactions: Vec<Transaction>,
    /// Filled by [`Source::DuePlans`]
    pub plans: Vec<Plan>,
    /// Filled by [`Source::PreviousDashboard`]
    pub previous: Option<Dashboard>,
    /// Filled by [`Source::NextDashboard`]
    pub next: Option<Dashboard>,
}

impl Ledger {
    /// Fetches `sources` for the month containing `month` concurrently.
    pub(crate) async fn gather(&self, month: NaiveDate, sources: &[Source]) -> Result<MonthData> {
        let mut tasks = JoinSet::new();

        for source in sources {
            match source {
                Source::Transactions => {
                    let repo = Arc::clone(&self.transactions);
                    tasks.spawn(async move {
                        repo.get_by_month(month).await.map(Fetched::Transactions)
                    });
                }
                Source::DuePlans => {
                    let repo = Arc::clone(&self.plans);
                    let offset = self.clock.offset();
                    tasks.spawn(async move {
                        let plans = repo.get_by_month(month).await?;
                        Ok(Fetched::DuePlans(due_plans(plans, month, offset)))
                    });
                }
                Source::PreviousDashboard => {
                    let repo = Arc::clone(&self.dashboards);
                    let previous = add_months(month, -1);
                    tasks.spawn(async move {
                        repo.get_by_month(previous)
                            .await
                            .map(Fetched::PreviousDashboard)
                    });
                }
                Source::NextDashboard => {
                    let repo = Arc::clone(&self.dashboards);
                    let next = add_months(month, 1);
                    tasks.spawn(async move {
                        repo.get_by_month(next).await.map(Fetched::NextDashboard)
                    });
                }
            }
        }

        let mut data = MonthData::default();
        for fetched in join_first_error(tasks).await? {
            match fetched {
                Fetched::Transactions(transactions) => data.transactions = transactions,
                Fetched::DuePlans(plans) => data.plans = plans,
                Fetched::PreviousDashboard(dashboard) => data.previous = dashboard,
                Fetched::NextDashboard(dashboard) => data.next = dashboard,
            }
        }

        debug!(
            "Gathered {} transactions and {} due plans for {month}",
            data.transactions.len(),
            data.plans.len()
        );
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::{
        db::{DashboardStore, TransactionStore},
        errors::ErrorKind,
        events::ChannelNotifier,
        models::DashboardState,
        repository::{DashboardRepository, PlansRepository},
        test_utils::*,
    };
    use async_trait::async_trait;
    use sea_orm::DbErr;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_join_collects_every_value() -> Result<()> {
        let mut tasks = JoinSet::new();
        for i in 0..4_i64 {
            tasks.spawn(async move { Ok(i * 10) });
        }

        let mut values = join_first_error(tasks).await?;
        values.sort_unstable();
        assert_eq!(values, vec![0, 10, 20, 30]);
        Ok(())
    }

    #[tokio::test]
    async fn test_failure_still_lets_siblings_finish() {
        let finished = Arc::new(AtomicBool::new(false));
        let mut tasks = JoinSet::new();

        tasks.spawn(async { Err(Error::PlanNotFound { id: 1 }) });
        let flag = Arc::clone(&finished);
        tasks.spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            flag.store(true, Ordering::SeqCst);
            Ok(())
        });

        let err = join_first_error(tasks).await.unwrap_err();
        assert!(matches!(err, Error::PlanNotFound { id: 1 }));
        assert!(finished.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_first_error_by_arrival_wins() {
        let later_errors = Arc::new(AtomicUsize::new(0));
        let mut tasks: JoinSet<Result<()>> = JoinSet::new();

        let counter = Arc::clone(&later_errors);
        tasks.spawn(async move {
            tokio::time::sleep(Duration::from_millis(30)).await;
            counter.fetch_add(1, Ordering::SeqCst);
            Err(Error::DashboardNotFound { id: 2 })
        });
        tasks.spawn(async { Err(Error::DashboardNotFound { id: 1 }) });

        let err = join_first_error(tasks).await.unwrap_err();
        assert!(matches!(err, Error::DashboardNotFound { id: 1 }));
        assert_eq!(later_errors.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_panicking_task_surfaces_as_concurrency_error() {
        let mut tasks: JoinSet<Result<()>> = JoinSet::new();
        tasks.spawn(async { panic!("fetch task blew up") });
        tasks.spawn(async { Ok(()) });

        let err = join_first_error(tasks).await.unwrap_err();
        assert!(matches!(err, Error::Concurrency(_)));
    }

    #[tokio::test]
    async fn test_gather_only_fills_requested_sources() -> Result<()> {
        let db = setup_test_db().await?;
        let (ledger, _events) = test_ledger(&db);
        create_test_plan(&db, "Salary", true, 1000, 1, Some(date(2024, 1, 1))).await?;
        create_test_plan(&db, "Insurance", false, 400, 2, Some(date(2024, 1, 1))).await?;
        create_test_transaction(&db, 50, FOOD, utc(2024, 2, 10, 3)).await?;
        let jan = ledger.open_month(date(2024, 1, 1)).await?;
        ledger.open_month(date(2024, 3, 1)).await?;

        let data = ledger
            .gather(
                date(2024, 2, 1),
                &[Source::DuePlans, Source::PreviousDashboard],
            )
            .await?;
        assert_eq!(data.plans.len(), 1);
        assert_eq!(data.plans[0].name, "Salary");
        assert_eq!(data.previous.unwrap().id, jan);
        assert!(data.transactions.is_empty());
        assert!(data.next.is_none());

        let data = ledger
            .gather(
                date(2024, 2, 1),
                &[Source::Transactions, Source::NextDashboard],
            )
            .await?;
        assert_eq!(data.transactions.len(), 1);
        assert_eq!(data.next.unwrap().date, date(2024, 3, 1));
        Ok(())
    }

    /// Plan storage that is always unreachable.
    struct UnreachablePlans;

    #[async_trait]
    impl PlansRepository for UnreachablePlans {
        async fn get_by_id(&self, _id: i64) -> Result<Option<Plan>> {
            Err(DbErr::Custom("plans offline".to_string()).into())
        }

        async fn get_by_month(&self, _month: NaiveDate) -> Result<Vec<Plan>> {
            Err(DbErr::Custom("plans offline".to_string()).into())
        }
    }

    #[tokio::test]
    async fn test_repository_failure_reaches_the_caller_unchanged() -> Result<()> {
        let db = setup_test_db().await?;
        let clock = test_clock();
        let dashboards = Arc::new(DashboardStore::new(db.clone(), Arc::clone(&clock)));
        let (notifier, mut events) = ChannelNotifier::channel();
        let ledger = Ledger::new(
            Arc::clone(&dashboards) as Arc<dyn DashboardRepository>,
            Arc::new(UnreachablePlans),
            Arc::new(TransactionStore::new(db.clone(), Arc::clone(&clock))),
            clock,
            Arc::new(notifier),
            INCOME,
        );
        create_test_transaction(&db, 50, FOOD, utc(2024, 2, 10, 3)).await?;

        let err = ledger.summarize(Some(date(2024, 2, 1))).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Infrastructure);
        assert!(matches!(err, Error::Database(DbErr::Custom(ref m)) if m == "plans offline"));

        let feb = dashboards.create(date(2024, 2, 1)).await?;
        let err = ledger.approve(feb).await.unwrap_err();
        assert!(matches!(err, Error::Database(DbErr::Custom(ref m)) if m == "plans offline"));

        let dashboard = dashboards.get_by_id(feb).await?.unwrap();
        assert_eq!(dashboard.state, DashboardState::Open);
        assert!(dashboard.daily.is_empty());
        assert!(drain_events(&mut events).is_empty());
        Ok(())
    }
}
