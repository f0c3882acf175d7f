//! Saga and step status state machines.

use serde::{Deserialize, Serialize};

/// The status of a saga in its lifecycle.
///
/// State transitions:
/// ```text
/// Started ──► InProgress ──┬──► Completed
///                          └──► Compensating ──► Compensated
/// ```
///
/// `Failed` records a saga abandoned before compensation could start and
/// is reachable only through operator action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SagaStatus {
    /// Saga has been persisted but its first event not yet published.
    #[default]
    Started,

    /// Saga is waiting on downstream outcome events.
    InProgress,

    /// All steps completed (terminal state).
    Completed,

    /// Saga abandoned without compensation (terminal, operator-set).
    Failed,

    /// A step failed and compensating actions are being applied.
    Compensating,

    /// Compensation finished (terminal state).
    Compensated,
}

impl SagaStatus {
    /// Returns true if inbound step events are accepted in this status.
    ///
    /// Everything else drops step events: terminal sagas drop them as
    /// duplicates, a compensating saga must not be advanced.
    pub fn accepts_step_events(&self) -> bool {
        matches!(self, SagaStatus::Started | SagaStatus::InProgress)
    }

    /// Returns true if compensation can begin from this status.
    pub fn can_compensate(&self) -> bool {
        matches!(self, SagaStatus::Started | SagaStatus::InProgress)
    }

    /// Returns true if this is a terminal status.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SagaStatus::Completed | SagaStatus::Compensated | SagaStatus::Failed
        )
    }

    /// Returns the status name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            SagaStatus::Started => "STARTED",
            SagaStatus::InProgress => "IN_PROGRESS",
            SagaStatus::Completed => "COMPLETED",
            SagaStatus::Failed => "FAILED",
            SagaStatus::Compensating => "COMPENSATING",
            SagaStatus::Compensated => "COMPENSATED",
        }
    }
}

impl std::fmt::Display for SagaStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The status of a single saga step.
///
/// A step leaves `Pending` exactly once, to `Completed` or `Failed`.
/// `Completed` steps move to `Compensated` when their compensating action
/// has been applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StepStatus {
    /// Step has not executed yet.
    #[default]
    Pending,

    /// Step executed successfully.
    Completed,

    /// Step failed.
    Failed,

    /// Step's compensating action has been applied.
    Compensated,
}

impl StepStatus {
    /// Returns true if the step has not been resolved yet.
    pub fn is_pending(&self) -> bool {
        matches!(self, StepStatus::Pending)
    }

    /// Returns true if the transition to `next` is allowed.
    pub fn can_transition_to(&self, next: StepStatus) -> bool {
        matches!(
            (self, next),
            (StepStatus::Pending, StepStatus::Completed)
                | (StepStatus::Pending, StepStatus::Failed)
                | (StepStatus::Completed, StepStatus::Compensated)
        )
    }

    /// Returns the status name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            StepStatus::Pending => "PENDING",
            StepStatus::Completed => "COMPLETED",
            StepStatus::Failed => "FAILED",
            StepStatus::Compensated => "COMPENSATED",
        }
    }
}

impl std::fmt::Display for StepStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_step_events() {
        assert!(SagaStatus::Started.accepts_step_events());
        assert!(SagaStatus::InProgress.accepts_step_events());
        assert!(!SagaStatus::Compensating.accepts_step_events());
        assert!(!SagaStatus::Completed.accepts_step_events());
        assert!(!SagaStatus::Compensated.accepts_step_events());
        assert!(!SagaStatus::Failed.accepts_step_events());
    }

    #[test]
    fn test_terminal_saga_statuses() {
        assert!(SagaStatus::Completed.is_terminal());
        assert!(SagaStatus::Compensated.is_terminal());
        assert!(SagaStatus::Failed.is_terminal());
        assert!(!SagaStatus::Compensating.is_terminal());
    }

    #[test]
    fn test_step_leaves_pending_once() {
        assert!(StepStatus::Pending.can_transition_to(StepStatus::Completed));
        assert!(StepStatus::Pending.can_transition_to(StepStatus::Failed));
        assert!(!StepStatus::Completed.can_transition_to(StepStatus::Failed));
        assert!(!StepStatus::Failed.can_transition_to(StepStatus::Completed));
    }

    #[test]
    fn test_only_completed_steps_compensate() {
        assert!(StepStatus::Completed.can_transition_to(StepStatus::Compensated));
        assert!(!StepStatus::Failed.can_transition_to(StepStatus::Compensated));
        assert!(!StepStatus::Pending.can_transition_to(StepStatus::Compensated));
        assert!(!StepStatus::Compensated.can_transition_to(StepStatus::Completed));
    }

    #[test]
    fn test_wire_format() {
        assert_eq!(
            serde_json::to_string(&SagaStatus::InProgress).unwrap(),
            "\"IN_PROGRESS\""
        );
        assert_eq!(
            serde_json::to_string(&StepStatus::Compensated).unwrap(),
            "\"COMPENSATED\""
        );
    }
}
