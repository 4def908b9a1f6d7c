//! Unified error types for the ledger.
//!
//! Validation failures of the month state machine are distinct variants so
//! callers can map them to their own responses; store failures pass through
//! as [`Error::Database`].

use chrono::NaiveDate;
use thiserror::Error;

/// Every failure the ledger reports.
#[derive(Debug, Error)]
#[allow(missing_docs)]
pub enum Error {
    /// Settings could not be loaded or are invalid
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// No dashboard with this id
    #[error("Dashboard not found: {id}")]
    DashboardNotFound { id: i64 },

    /// No plan with this id
    #[error("Plan not found: {id}")]
    PlanNotFound { id: i64 },

    /// No matching actual row on the dashboard
    #[error("Actual {actual_id} not found on dashboard {dashboard_id}")]
    ActualNotFound { dashboard_id: i64, actual_id: i64 },

    /// Approve on a month that is already closed
    #[error("Dashboard {id} is already closed")]
    AlreadyClosed { id: i64 },

    /// Reopen or balance adjustment on an open month
    #[error("Dashboard {id} is not closed")]
    NotClosed { id: i64 },

    /// An earlier month must be closed first
    #[error("Month preceding {month} is not closed")]
    PrecedingMonthNotClosed { month: NaiveDate },

    /// A later month is closed and must be reopened first
    #[error("A month after {month} is already closed")]
    NextMonthClosed { month: NaiveDate },

    /// A due plan has no actual amount yet
    #[error("Plan '{plan_name}' ({plan_id}) has no recorded actual amount")]
    MissingPlanInput { plan_id: i64, plan_name: String },

    /// Storage failure
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Filesystem failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization failure
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// A fetch task panicked or was cancelled
    #[error("Concurrency error: {0}")]
    Concurrency(#[from] tokio::task::JoinError),
}

/// Coarse classification of [`Error`] for transport layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A referenced row does not exist
    NotFound,
    /// The month is already closed
    AlreadyClosed,
    /// The month is still open
    NotClosed,
    /// An earlier month is still open
    PrecedingMonthNotClosed,
    /// A later month is closed
    NextMonthClosed,
    /// A due plan has no actual amount
    MissingPlanInput,
    /// Storage, I/O or task failure
    Infrastructure,
    /// Invalid configuration
    Config,
}

impl Error {
    /// Classifies the error for callers that map it onto a response.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::DashboardNotFound { .. }
            | Self::PlanNotFound { .. }
            | Self::ActualNotFound { .. } => ErrorKind::NotFound,
            Self::AlreadyClosed { .. } => ErrorKind::AlreadyClosed,
            Self::NotClosed { .. } => ErrorKind::NotClosed,
            Self::PrecedingMonthNotClosed { .. } => ErrorKind::PrecedingMonthNotClosed,
            Self::NextMonthClosed { .. } => ErrorKind::NextMonthClosed,
            Self::MissingPlanInput { .. } => ErrorKind::MissingPlanInput,
            Self::Database(_) | Self::Io(_) | Self::Json(_) | Self::Concurrency(_) => {
                ErrorKind::Infrastructure
            }
            Self::Config { .. } => ErrorKind::Config,
        }
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_groups_not_found_variants() {
        assert_eq!(Error::DashboardNotFound { id: 1 }.kind(), ErrorKind::NotFound);
        assert_eq!(Error::PlanNotFound { id: 1 }.kind(), ErrorKind::NotFound);
        assert_eq!(
            Error::ActualNotFound {
                dashboard_id: 1,
                actual_id: 2
            }
            .kind(),
            ErrorKind::NotFound
        );
    }

    #[test]
    fn test_kind_treats_store_failures_as_infrastructure() {
        let err = Error::from(sea_orm::DbErr::Custom("boom".to_string()));
        assert_eq!(err.kind(), ErrorKind::Infrastructure);
        assert!(err.to_string().contains("boom"));
    }
}
