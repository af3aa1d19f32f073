use chrono::{DateTime, Utc};
use core_types::{RiskLevel, Strategy, TokenBalances};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Enum representing the severity of a log message for structured logging.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

/// A structured, user-facing message (e.g. "No funds for allocation").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogMessage {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub message: String,
}

impl LogMessage {
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            level,
            message: message.into(),
        }
    }
}

/// The coarse progress of an approval/execution attempt, as shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkflowPhase {
    Idle,
    Approving,
    Executing,
    Succeeded,
    Failed,
}

/// A progress notification for one approval/execution attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowUpdate {
    pub timestamp: DateTime<Utc>,
    pub attempt_id: Uuid,
    pub risk_level: RiskLevel,
    pub phase: WorkflowPhase,
    /// Transaction hash for submitted steps, or the failure reason.
    pub detail: Option<String>,
}

/// The top-level event enum broadcast by a dashboard session.
///
/// Serialized with `#[serde(tag = "type", content = "payload")]`, so a balance
/// update looks like `{"type": "BalancesUpdated", "payload": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum DashboardEvent {
    /// A fresh balance snapshot was written to the balance store.
    BalancesUpdated(TokenBalances),
    /// The strategy store was replaced with a newly generated set.
    StrategiesGenerated(Vec<Strategy>),
    /// An approval/execution attempt changed phase.
    WorkflowUpdate(WorkflowUpdate),
    /// A structured log message.
    Log(LogMessage),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_are_tagged_with_type_and_payload() {
        let balances: TokenBalances = [("USDC", "12.5")].into_iter().collect();
        let json = serde_json::to_value(DashboardEvent::BalancesUpdated(balances)).unwrap();
        assert_eq!(json["type"], "BalancesUpdated");
        assert_eq!(json["payload"]["USDC"], "12.5");
    }

    #[test]
    fn workflow_update_round_trips_phase() {
        let update = WorkflowUpdate {
            timestamp: Utc::now(),
            attempt_id: Uuid::nil(),
            risk_level: RiskLevel(3),
            phase: WorkflowPhase::Executing,
            detail: Some("0xabc".to_string()),
        };
        let json = serde_json::to_value(DashboardEvent::WorkflowUpdate(update)).unwrap();
        assert_eq!(json["type"], "WorkflowUpdate");
        assert_eq!(json["payload"]["phase"], "Executing");
        assert_eq!(json["payload"]["risk_level"], 3);
    }
}
