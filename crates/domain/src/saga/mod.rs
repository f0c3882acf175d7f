//! Saga entity: the audit trail of one distributed order transaction.

mod status;
mod step;

pub use status::{SagaStatus, StepStatus};
pub use step::{CompensationAction, StepName};

use chrono::{DateTime, Utc};
use common::{OrderId, SagaId, UserId};
use serde::{Deserialize, Serialize};
use store::Keyed;

use crate::DomainError;

/// One unit of saga work with its declared compensation and status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SagaStep {
    pub step_name: StepName,
    pub status: StepStatus,
    pub compensation_action: CompensationAction,
    /// When the step was resolved (completed, failed, or compensated).
    pub executed_at: Option<DateTime<Utc>>,
    /// Failure detail recorded when the step failed or its compensation
    /// could not be applied.
    pub error_message: Option<String>,
}

impl SagaStep {
    fn pending(step_name: StepName) -> Self {
        Self {
            step_name,
            status: StepStatus::Pending,
            compensation_action: step_name.compensation(),
            executed_at: None,
            error_message: None,
        }
    }

    fn transition(&mut self, to: StepStatus) -> Result<(), DomainError> {
        if !self.status.can_transition_to(to) {
            return Err(DomainError::InvalidStepTransition {
                step: self.step_name,
                from: self.status,
                to,
            });
        }
        self.status = to;
        self.executed_at = Some(Utc::now());
        Ok(())
    }
}

/// A saga coordinating one order across payment and notification.
///
/// The plan is fixed at creation: `ORDER_CREATED` (already done by the
/// time the saga exists), `PAYMENT_PROCESSING`, `NOTIFICATION_SENT`. The
/// saga is never deleted — it remains as the transaction's audit trail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Saga {
    id: SagaId,
    order_id: OrderId,
    user_id: UserId,
    status: SagaStatus,
    steps: Vec<SagaStep>,
    current_step: Option<StepName>,
    /// Payment ID captured when the payment step completed; needed by the
    /// refund compensation.
    payment_id: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Saga {
    /// Starts a saga for an order, with the `ORDER_CREATED` step already
    /// completed and the remaining steps pending.
    pub fn start(order_id: OrderId, user_id: UserId) -> Self {
        let now = Utc::now();
        let mut steps: Vec<SagaStep> =
            StepName::PLAN.iter().copied().map(SagaStep::pending).collect();
        steps[0].status = StepStatus::Completed;
        steps[0].executed_at = Some(now);

        Self {
            id: SagaId::new(),
            order_id,
            user_id,
            status: SagaStatus::Started,
            steps,
            current_step: Some(StepName::OrderCreated),
            payment_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns the saga ID.
    pub fn id(&self) -> SagaId {
        self.id
    }

    /// Returns the coordinated order's ID.
    pub fn order_id(&self) -> OrderId {
        self.order_id
    }

    /// Returns the owning user's ID.
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Returns the current status.
    pub fn status(&self) -> SagaStatus {
        self.status
    }

    /// Returns the plan's steps in execution order.
    pub fn steps(&self) -> &[SagaStep] {
        &self.steps
    }

    /// Returns the step the saga is currently waiting on, or `None` once
    /// the saga is terminal.
    pub fn current_step(&self) -> Option<StepName> {
        self.current_step
    }

    /// Returns the payment ID captured when payment completed.
    pub fn payment_id(&self) -> Option<&str> {
        self.payment_id.as_deref()
    }

    /// Returns when the saga was last updated.
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Looks up a step by name.
    pub fn step(&self, name: StepName) -> Option<&SagaStep> {
        self.steps.iter().find(|step| step.step_name == name)
    }

    fn step_mut(&mut self, name: StepName) -> Result<&mut SagaStep, DomainError> {
        self.steps
            .iter_mut()
            .find(|step| step.step_name == name)
            .ok_or(DomainError::UnknownStep { step: name })
    }

    /// Moves `Started → InProgress`, pointing at the payment step.
    pub fn begin(&mut self) -> Result<(), DomainError> {
        self.transition_status(SagaStatus::InProgress)?;
        self.current_step = Some(StepName::PaymentProcessing);
        Ok(())
    }

    /// Marks a step completed.
    pub fn complete_step(&mut self, name: StepName) -> Result<(), DomainError> {
        self.step_mut(name)?.transition(StepStatus::Completed)?;
        self.touch();
        Ok(())
    }

    /// Marks a step failed, recording the failure detail.
    pub fn fail_step(
        &mut self,
        name: StepName,
        error: impl Into<String>,
    ) -> Result<(), DomainError> {
        let step = self.step_mut(name)?;
        step.transition(StepStatus::Failed)?;
        step.error_message = Some(error.into());
        self.touch();
        Ok(())
    }

    /// Captures the payment ID reported by the payment processor.
    pub fn record_payment(&mut self, payment_id: impl Into<String>) {
        self.payment_id = Some(payment_id.into());
        self.touch();
    }

    /// Advances the current-step pointer.
    pub fn advance_to(&mut self, name: StepName) {
        self.current_step = Some(name);
        self.touch();
    }

    /// Moves the saga into `Compensating`.
    pub fn begin_compensation(&mut self) -> Result<(), DomainError> {
        if !self.status.can_compensate() {
            return Err(DomainError::InvalidSagaTransition {
                from: self.status,
                to: SagaStatus::Compensating,
            });
        }
        self.status = SagaStatus::Compensating;
        self.touch();
        Ok(())
    }

    /// Marks a completed step's compensation as applied.
    pub fn mark_step_compensated(&mut self, name: StepName) -> Result<(), DomainError> {
        self.step_mut(name)?.transition(StepStatus::Compensated)?;
        self.touch();
        Ok(())
    }

    /// Records a compensation failure on a step without changing its
    /// status; the saga stays in `Compensating` for manual remediation.
    pub fn record_step_error(
        &mut self,
        name: StepName,
        error: impl Into<String>,
    ) -> Result<(), DomainError> {
        self.step_mut(name)?.error_message = Some(error.into());
        self.touch();
        Ok(())
    }

    /// Moves `Compensating → Compensated` (terminal).
    pub fn finish_compensation(&mut self) -> Result<(), DomainError> {
        if self.status != SagaStatus::Compensating {
            return Err(DomainError::InvalidSagaTransition {
                from: self.status,
                to: SagaStatus::Compensated,
            });
        }
        self.status = SagaStatus::Compensated;
        self.current_step = None;
        self.touch();
        Ok(())
    }

    /// Moves `InProgress → Completed` (terminal).
    pub fn complete(&mut self) -> Result<(), DomainError> {
        if self.status != SagaStatus::InProgress {
            return Err(DomainError::InvalidSagaTransition {
                from: self.status,
                to: SagaStatus::Completed,
            });
        }
        self.status = SagaStatus::Completed;
        self.current_step = None;
        self.touch();
        Ok(())
    }

    fn transition_status(&mut self, to: SagaStatus) -> Result<(), DomainError> {
        let allowed = matches!(
            (self.status, to),
            (SagaStatus::Started, SagaStatus::InProgress)
        );
        if !allowed {
            return Err(DomainError::InvalidSagaTransition {
                from: self.status,
                to,
            });
        }
        self.status = to;
        self.touch();
        Ok(())
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

impl Keyed for Saga {
    type Id = SagaId;
    type Status = SagaStatus;

    fn id(&self) -> SagaId {
        self.id
    }

    fn status(&self) -> SagaStatus {
        self.status
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn started_saga() -> Saga {
        Saga::start(OrderId::new(), UserId::new())
    }

    #[test]
    fn test_start_builds_fixed_plan() {
        let saga = started_saga();
        assert_eq!(saga.status(), SagaStatus::Started);
        assert_eq!(saga.steps().len(), 3);

        let order_created = saga.step(StepName::OrderCreated).unwrap();
        assert_eq!(order_created.status, StepStatus::Completed);
        assert!(order_created.executed_at.is_some());
        assert_eq!(
            order_created.compensation_action,
            CompensationAction::CancelOrder
        );

        assert_eq!(
            saga.step(StepName::PaymentProcessing).unwrap().status,
            StepStatus::Pending
        );
        assert_eq!(
            saga.step(StepName::NotificationSent).unwrap().status,
            StepStatus::Pending
        );
    }

    #[test]
    fn test_happy_path() {
        let mut saga = started_saga();
        saga.begin().unwrap();
        assert_eq!(saga.status(), SagaStatus::InProgress);
        assert_eq!(saga.current_step(), Some(StepName::PaymentProcessing));

        saga.complete_step(StepName::PaymentProcessing).unwrap();
        saga.record_payment("PAY-0001");
        saga.advance_to(StepName::NotificationSent);

        saga.complete_step(StepName::NotificationSent).unwrap();
        saga.complete().unwrap();

        assert_eq!(saga.status(), SagaStatus::Completed);
        assert!(saga.current_step().is_none());
        assert_eq!(saga.payment_id(), Some("PAY-0001"));
    }

    #[test]
    fn test_step_resolves_once() {
        let mut saga = started_saga();
        saga.begin().unwrap();
        saga.complete_step(StepName::PaymentProcessing).unwrap();

        let result = saga.complete_step(StepName::PaymentProcessing);
        assert!(matches!(
            result,
            Err(DomainError::InvalidStepTransition { .. })
        ));

        let result = saga.fail_step(StepName::PaymentProcessing, "late failure");
        assert!(matches!(
            result,
            Err(DomainError::InvalidStepTransition { .. })
        ));
    }

    #[test]
    fn test_failure_path() {
        let mut saga = started_saga();
        saga.begin().unwrap();
        saga.fail_step(StepName::PaymentProcessing, "insufficient funds")
            .unwrap();

        let step = saga.step(StepName::PaymentProcessing).unwrap();
        assert_eq!(step.status, StepStatus::Failed);
        assert_eq!(step.error_message.as_deref(), Some("insufficient funds"));
        assert!(step.executed_at.is_some());

        saga.begin_compensation().unwrap();
        saga.mark_step_compensated(StepName::OrderCreated).unwrap();
        saga.finish_compensation().unwrap();

        assert_eq!(saga.status(), SagaStatus::Compensated);
        assert!(saga.current_step().is_none());
    }

    #[test]
    fn test_only_completed_steps_can_compensate() {
        let mut saga = started_saga();
        saga.begin().unwrap();
        saga.fail_step(StepName::PaymentProcessing, "declined")
            .unwrap();
        saga.begin_compensation().unwrap();

        let result = saga.mark_step_compensated(StepName::PaymentProcessing);
        assert!(matches!(
            result,
            Err(DomainError::InvalidStepTransition { .. })
        ));
    }

    #[test]
    fn test_terminal_saga_rejects_transitions() {
        let mut saga = started_saga();
        saga.begin().unwrap();
        saga.complete_step(StepName::PaymentProcessing).unwrap();
        saga.complete_step(StepName::NotificationSent).unwrap();
        saga.complete().unwrap();

        assert!(saga.complete().is_err());
        assert!(saga.begin().is_err());
        assert!(saga.begin_compensation().is_err());
        assert!(!saga.status().accepts_step_events());
    }

    #[test]
    fn test_compensation_failure_recorded_on_step() {
        let mut saga = started_saga();
        saga.begin().unwrap();
        saga.fail_step(StepName::PaymentProcessing, "declined")
            .unwrap();
        saga.begin_compensation().unwrap();
        saga.record_step_error(StepName::OrderCreated, "bus unavailable")
            .unwrap();

        assert_eq!(saga.status(), SagaStatus::Compensating);
        let step = saga.step(StepName::OrderCreated).unwrap();
        assert_eq!(step.status, StepStatus::Completed);
        assert_eq!(step.error_message.as_deref(), Some("bus unavailable"));
    }

    #[test]
    fn test_serialization_roundtrip() {
        let mut saga = started_saga();
        saga.begin().unwrap();
        saga.record_payment("PAY-0042");

        let json = serde_json::to_string(&saga).unwrap();
        let deserialized: Saga = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized.id(), saga.id());
        assert_eq!(deserialized.status(), SagaStatus::InProgress);
        assert_eq!(deserialized.payment_id(), Some("PAY-0042"));
    }
}
