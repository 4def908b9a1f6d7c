//! Plan entity - A recurring budget line item.
//!
//! Plans repeat every `interval` months between optional `start` and `end`
//! dates. Soft-deleted plans keep their historical actual rows valid.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Plan database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "plans")]
pub struct Model {
    /// Unique identifier for the plan
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Human-readable name (e.g., "Salary", "Rent")
    pub name: String,
    /// Whether the plan is an income (true) or an expense (false)
    pub is_income: bool,
    /// Planned amount in minor currency units
    pub amount: i64,
    /// Repetition interval in months, at least 1
    pub interval: i32,
    /// First local date the plan applies to
    pub start: Option<Date>,
    /// Last local date the plan applies to
    pub end: Option<Date>,
    /// Soft delete flag - deleted plans are never matched again
    pub is_deleted: bool,
    /// When the plan was created
    pub created_at: DateTimeUtc,
}

/// `Plan` has no relationships; actual rows denormalize what they need
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
