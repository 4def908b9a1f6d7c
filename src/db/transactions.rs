//! `SeaORM` implementation of [`TransactionsRepository`].
//!
//! Transactions are stored with UTC timestamps; month boundaries are the
//! local midnights reported by the configured [`Clock`].

use crate::{
    clock::{Clock, first_of_month, next_month_start},
    entities::{Transaction as TransactionEntity, transaction},
    errors::Result,
    models::Transaction,
    repository::TransactionsRepository,
};
use async_trait::async_trait;
use chrono::NaiveDate;
use sea_orm::{QueryOrder, prelude::*};
use std::sync::Arc;
use tracing::debug;

impl From<transaction::Model> for Transaction {
    fn from(model: transaction::Model) -> Self {
        Self {
            id: model.id,
            amount: model.amount,
            category: model.category,
            date: model.date,
            notes: model.notes,
            daily_id: model.daily_id,
        }
    }
}

/// Transaction storage backed by a `SeaORM` connection.
#[derive(Clone)]
pub struct TransactionStore {
    db: DatabaseConnection,
    clock: Arc<dyn Clock>,
}

impl TransactionStore {
    /// Store over `db`; `clock` defines the local month bounds.
    #[must_use]
    pub fn new(db: DatabaseConnection, clock: Arc<dyn Clock>) -> Self {
        Self { db, clock }
    }
}

#[async_trait]
impl TransactionsRepository for TransactionStore {
    async fn get_by_month(&self, month: NaiveDate) -> Result<Vec<Transaction>> {
        let from = self.clock.local_midnight(first_of_month(month));
        let to = self.clock.local_midnight(next_month_start(month));

        let transactions = TransactionEntity::find()
            .filter(transaction::Column::Date.gte(from))
            .filter(transaction::Column::Date.lt(to))
            .order_by_asc(transaction::Column::Date)
            .order_by_asc(transaction::Column::Id)
            .all(&self.db)
            .await?;

        debug!("{} transactions between {from} and {to}", transactions.len());
        Ok(transactions.into_iter().map(Transaction::from).collect())
    }
}
