//! Actual entity - The recorded amount of one plan within one month.
//!
//! Plan fields are snapshotted when the row is written and are not re-synced
//! if the plan changes later.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Actual database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "actuals")]
pub struct Model {
    /// Unique identifier for the actual row
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Dashboard (month) this amount was recorded for
    pub dashboard_id: i64,
    /// Recorded amount in minor currency units
    pub actual_amount: i64,
    /// Plan the amount was recorded for
    pub plan_id: i64,
    /// Plan name at write time
    pub plan_name: String,
    /// Planned amount at write time
    pub plan_amount: i64,
    /// Plan direction at write time
    pub is_income: bool,
    /// Plan creation time, used for stable ordering
    pub plan_created_at: DateTimeUtc,
}

/// Defines relationships between Actual and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each actual row belongs to one dashboard
    #[sea_orm(
        belongs_to = "super::dashboard::Entity",
        from = "Column::DashboardId",
        to = "super::dashboard::Column::Id"
    )]
    Dashboard,
}

impl Related<super::dashboard::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Dashboard.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
