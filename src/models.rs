//! Storage-agnostic domain types shared by the repositories and the core.
//!
//! Amounts are integers in minor currency units. Month-valued dates are
//! always normalized to the first day of the month.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A recurring budget line item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    /// Unique identifier for the plan
    pub id: i64,
    /// Display name (e.g., "Rent", "Salary")
    pub name: String,
    /// Income (true) or expense (false)
    pub is_income: bool,
    /// Planned amount per occurrence
    pub amount: i64,
    /// Repetition interval in months
    pub interval: i32,
    /// First month the plan runs; its creation month when absent
    pub start: Option<NaiveDate>,
    /// Last day the plan may run, inclusive; open-ended when absent
    pub end: Option<NaiveDate>,
    /// Soft-deleted plans are never due
    pub is_deleted: bool,
    /// Creation time; orders plans and anchors the interval when `start` is absent
    pub created_at: DateTime<Utc>,
}

/// A one-off ledger entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Unique identifier for the transaction
    pub id: i64,
    /// Always positive; the category decides the direction
    pub amount: i64,
    /// Category code, see [`Transaction::is_income`]
    pub category: i32,
    /// When the entry happened
    pub date: DateTime<Utc>,
    /// Free-form description
    pub notes: Option<String>,
    /// Daily row of the closed month this entry was folded into
    pub daily_id: Option<i64>,
}

impl Transaction {
    /// Whether this entry counts as income under the given income category code.
    #[must_use]
    pub const fn is_income(&self, income_category: i32) -> bool {
        self.category == income_category
    }

    /// Transactions folded into a closed month must not be modified.
    #[must_use]
    pub const fn is_editable(&self) -> bool {
        self.daily_id.is_none()
    }
}

/// Lifecycle state of a month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DashboardState {
    /// Totals are computed on every read
    Open,
    /// Totals are frozen on the dashboard row
    Closed,
}

impl DashboardState {
    /// Stored representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
        }
    }

    /// Parses the stored representation, returning `None` for unknown values.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "open" => Some(Self::Open),
            "closed" => Some(Self::Closed),
            _ => None,
        }
    }
}

/// The monthly rollup with its actual rows and, once closed, its daily rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dashboard {
    /// Unique identifier for the dashboard
    pub id: i64,
    /// First day of the month
    pub date: NaiveDate,
    /// Open or closed
    pub state: DashboardState,
    /// Frozen income total, set only while closed
    pub income: Option<i64>,
    /// Frozen expense total
    pub expense: Option<i64>,
    /// `income - expense`
    pub current_balance: Option<i64>,
    /// Carried balance, `previous_balance + current_balance`
    pub balance: Option<i64>,
    /// Closed month the balance was carried from
    pub previous_dashboard_id: Option<i64>,
    /// Balance of `previous_dashboard_id` at closing time
    pub previous_balance: Option<i64>,
    /// Ascending by date; empty while open
    pub daily: Vec<Daily>,
    /// Ascending by plan creation time
    pub actual: Vec<Actual>,
}

impl Dashboard {
    /// Whether the month's totals are frozen.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.state == DashboardState::Closed
    }

    /// Looks up the recorded actual row for a plan.
    #[must_use]
    pub fn actual_for_plan(&self, plan_id: i64) -> Option<&Actual> {
        self.actual.iter().find(|a| a.plan_id == plan_id)
    }
}

/// Recorded amount of one plan within one month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actual {
    /// Unique identifier for the actual row
    pub id: i64,
    /// Amount entered for the month
    pub actual_amount: i64,
    /// Plan this amount was recorded for
    pub plan_id: i64,
    /// Plan name when the row was last written
    pub plan_name: String,
    /// Planned amount when the row was last written
    pub plan_amount: i64,
    /// Plan direction when the row was last written
    pub is_income: bool,
    /// Orders the rows of a dashboard
    pub plan_created_at: DateTime<Utc>,
}

/// The values written when an actual row is created or overwritten.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActualSnapshot {
    /// Amount entered for the month
    pub actual_amount: i64,
    /// Plan the amount belongs to
    pub plan_id: i64,
    /// Current plan name
    pub plan_name: String,
    /// Current planned amount
    pub plan_amount: i64,
    /// Current plan direction
    pub is_income: bool,
    /// Plan creation time
    pub plan_created_at: DateTime<Utc>,
}

impl ActualSnapshot {
    /// Denormalizes the current state of `plan` next to the recorded amount.
    #[must_use]
    pub fn from_plan(plan: &Plan, actual_amount: i64) -> Self {
        Self {
            actual_amount,
            plan_id: plan.id,
            plan_name: plan.name.clone(),
            plan_amount: plan.amount,
            is_income: plan.is_income,
            plan_created_at: plan.created_at,
        }
    }
}

/// Income and expense of one local day of a closed month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Daily {
    /// `None` until persisted
    pub id: Option<i64>,
    /// Local calendar day
    pub date: NaiveDate,
    /// Income dated on this day
    pub income: i64,
    /// Expense dated on this day
    pub expense: i64,
}

impl Daily {
    /// A day with no activity, not yet persisted.
    #[must_use]
    pub const fn empty(date: NaiveDate) -> Self {
        Self {
            id: None,
            date,
            income: 0,
            expense: 0,
        }
    }
}
