//! Transaction entity - A one-off ledger entry not tied to a plan.
//!
//! `daily_id` is stamped when the month containing `date` is approved and
//! cleared again when that approval is cancelled.
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Transaction database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    /// Unique identifier for the transaction
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Amount in minor currency units, always positive
    pub amount: i64,
    /// Category code; one configured code denotes income
    pub category: i32,
    /// When the transaction happened
    pub date: DateTimeUtc,
    /// Free-form notes
    pub notes: Option<String>,
    /// Daily row this transaction was folded into at month close
    pub daily_id: Option<i64>,
}

/// `Transaction` is linked to daily rows only through `daily_id`
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
