//! Dashboard entity - The monthly ledger rollup.
//!
//! One row per local calendar month. The totals are only populated while the
//! month is closed.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Dashboard database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "dashboards")]
pub struct Model {
    /// Unique identifier for the dashboard
    #[sea_orm(primary_key)]
    pub id: i64,
    /// First day of the month this dashboard covers
    #[sea_orm(unique)]
    pub date: Date,
    /// `"open"` or `"closed"`
    pub state: String,
    /// Frozen income total
    pub income: Option<i64>,
    /// Frozen expense total
    pub expense: Option<i64>,
    /// Income minus expense for this month
    pub current_balance: Option<i64>,
    /// Previous balance plus current balance
    pub balance: Option<i64>,
    /// Closed month the balance was carried from
    pub previous_dashboard_id: Option<i64>,
    /// Balance carried in at closing time
    pub previous_balance: Option<i64>,
}

/// Defines relationships between Dashboard and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One dashboard has many actual rows
    #[sea_orm(has_many = "super::actual::Entity")]
    Actual,
    /// One closed dashboard has one daily row per day
    #[sea_orm(has_many = "super::daily::Entity")]
    Daily,
}

impl Related<super::actual::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Actual.def()
    }
}

impl Related<super::daily::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Daily.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
