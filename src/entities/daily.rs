//! Daily entity - Per-day income and expense of a closed month.
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Daily database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "daily")]
pub struct Model {
    /// Unique identifier for the daily row
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Closed dashboard this day belongs to
    pub dashboard_id: i64,
    /// Local calendar day
    pub date: Date,
    /// Income dated on this day
    pub income: i64,
    /// Expense dated on this day
    pub expense: i64,
}

/// Defines relationships between Daily and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each daily row belongs to one dashboard
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
