//! Change notifications emitted after every mutation that affects totals.
//!
//! Delivery is fire-and-forget: a notifier never reports failure back to the
//! operation that triggered it.

use chrono::NaiveDate;
use serde::Serialize;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{info, warn};

/// Name under which every ledger change is published downstream.
pub const ASSETS_CHANGED: &str = "AssetsChanged";

/// Payload of a change notification, keyed by what happened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LedgerEvent {
    /// An actual amount was created or overwritten
    ActualRecorded {
        /// Month the amount was stored on
        dashboard_id: i64,
        /// The created or overwritten row
        actual_id: i64,
        /// Plan the amount belongs to
        plan_id: i64,
    },
    /// A month was closed
    MonthApproved {
        /// The closed dashboard
        dashboard_id: i64,
        /// First day of the closed month
        month: NaiveDate,
        /// Carried balance after closing
        balance: i64,
    },
    /// A closed month was reopened
    ApprovalCancelled {
        /// The reopened dashboard
        dashboard_id: i64,
        /// First day of the reopened month
        month: NaiveDate,
    },
    /// The carried balance of a closed month was overwritten
    BalanceAdjusted {
        /// The adjusted dashboard
        dashboard_id: i64,
        /// New carried balance
        balance: i64,
    },
}

impl LedgerEvent {
    /// Downstream event name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        ASSETS_CHANGED
    }

    /// Dashboard the change applies to.
    #[must_use]
    pub const fn dashboard_id(&self) -> i64 {
        match self {
            Self::ActualRecorded { dashboard_id, .. }
            | Self::MonthApproved { dashboard_id, .. }
            | Self::ApprovalCancelled { dashboard_id, .. }
            | Self::BalanceAdjusted { dashboard_id, .. } => *dashboard_id,
        }
    }
}

/// Sink for ledger change notifications.
pub trait ChangeNotifier: Send + Sync {
    /// Hands `event` off for delivery without waiting for it.
    fn notify(&self, event: LedgerEvent);
}

/// Publishes events as structured log lines.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl ChangeNotifier for LogNotifier {
    fn notify(&self, event: LedgerEvent) {
        match serde_json::to_string(&event) {
            Ok(payload) => info!(event = event.name(), %payload, "ledger changed"),
            Err(e) => warn!("Dropping {} notification: {e}", event.name()),
        }
    }
}

/// Forwards events into an in-process channel, e.g. for a publisher task.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    sender: UnboundedSender<LedgerEvent>,
}

impl ChannelNotifier {
    /// Creates a notifier and the receiving half its events arrive on.
    #[must_use]
    pub fn channel() -> (Self, UnboundedReceiver<LedgerEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl ChangeNotifier for ChannelNotifier {
    fn notify(&self, event: LedgerEvent) {
        if let Err(e) = self.sender.send(event) {
            warn!(
                "Change notification for dashboard {} dropped: receiver closed",
                e.0.dashboard_id()
            );
        }
    }
}
