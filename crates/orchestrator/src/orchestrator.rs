//! Saga orchestrator.
//!
//! Reacts to one inbound event at a time: each handler performs one
//! bounded state transition plus at most one outbound publish, then
//! returns. The orchestrator never waits for a collaborator's reply —
//! every cross-service wait is "wait for the next inbound event".
//!
//! Updates to a saga are serialized by optimistic version checks on the
//! store: each handler runs a read-check-apply loop, retrying a bounded
//! number of times when a concurrent worker commits first. The duplicate
//! and ordering checks run inside every iteration, so a lost race is
//! re-examined against fresh state and an already-applied event degrades
//! to a no-op instead of a double publish.

use common::{OrderId, SagaId};
use domain::{CompensationAction, Order, OrderStatus, Saga, SagaStatus, StepName, StepStatus};
use message_bus::{Event, EventPayload, MessageBus, OrderLine, PaymentStatus, topics};
use store::{Store, Version, Versioned};

use crate::error::{OrchestratorError, Result};
use crate::notifications;
use crate::retry::RetryPolicy;

/// How a handler resolved an inbound event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerOutcome {
    /// The event advanced the saga.
    Applied,
    /// The target step was already resolved; nothing was re-applied and
    /// nothing was re-published.
    Duplicate,
    /// The saga no longer accepts step events (terminal or compensating).
    Stale,
}

/// Orchestrates order sagas across the payment processor and the
/// notification dispatcher.
///
/// Constructed once at process start with its store and bus clients; no
/// ambient global state.
pub struct SagaOrchestrator<SS, OS, B>
where
    SS: Store<Saga>,
    OS: Store<Order>,
    B: MessageBus,
{
    sagas: SS,
    orders: OS,
    bus: B,
    retry: RetryPolicy,
}

impl<SS, OS, B> SagaOrchestrator<SS, OS, B>
where
    SS: Store<Saga>,
    OS: Store<Order>,
    B: MessageBus,
{
    /// Creates an orchestrator with the default retry policy.
    pub fn new(sagas: SS, orders: OS, bus: B) -> Self {
        Self {
            sagas,
            orders,
            bus,
            retry: RetryPolicy::default(),
        }
    }

    /// Replaces the retry policy.
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Starts a saga for a freshly placed order.
    ///
    /// Persists the saga and the order (status `PAYMENT_PROCESSING`,
    /// saga assigned) before publishing the `order.created` event, then
    /// advances the saga to `IN_PROGRESS` waiting on the payment step.
    #[tracing::instrument(skip(self, order), fields(order_id = %order.id()))]
    pub async fn start_saga(&self, mut order: Order) -> Result<SagaId> {
        if order.saga_id().is_some() {
            return Err(OrchestratorError::SagaAlreadyStarted(order.id()));
        }

        let mut saga = Saga::start(order.id(), order.user_id());
        let saga_id = saga.id();
        order.assign_saga(saga_id)?;
        order.set_status(OrderStatus::PaymentProcessing)?;

        let items: Vec<OrderLine> = order
            .items()
            .iter()
            .map(|item| OrderLine {
                product_id: item.product_id.clone(),
                product_name: item.product_name.clone(),
                quantity: item.quantity,
                price: item.price,
            })
            .collect();
        let created = Event::new(
            saga_id,
            order.user_id(),
            EventPayload::OrderCreated {
                order_id: order.id(),
                total_amount: order.total_amount(),
                items,
                shipping_address: order.shipping_address().to_string(),
            },
        );

        // Commit both records before the event leaves the process
        let saga_version = self
            .sagas
            .put_if_version(saga.clone(), Version::initial())
            .await?;
        self.orders.put_if_version(order, Version::initial()).await?;

        self.publish_with_retry(topics::ORDER_CREATED, created)
            .await?;

        saga.begin()?;
        self.sagas.put_if_version(saga, saga_version).await?;

        metrics::counter!("sagas_started_total").increment(1);
        tracing::info!(%saga_id, "saga started");
        Ok(saga_id)
    }

    /// Handles a `payment.processed` outcome event.
    #[tracing::instrument(
        skip(self, event),
        fields(saga_id = %event.saga_id, event_id = %event.event_id)
    )]
    pub async fn on_payment_outcome(&self, event: &Event) -> Result<HandlerOutcome> {
        let EventPayload::PaymentProcessed {
            payment_id,
            status,
            failure_reason,
            ..
        } = &event.payload
        else {
            return Err(OrchestratorError::UnexpectedPayload {
                handler: "on_payment_outcome",
                actual: event.event_type(),
            });
        };
        let saga_id = event.saga_id;

        for attempt in 0..self.retry.max_attempts {
            let Some(Versioned {
                version,
                record: mut saga,
            }) = self.sagas.get(saga_id).await?
            else {
                return Err(OrchestratorError::SagaNotFound(saga_id));
            };

            if !saga.status().accepts_step_events() {
                tracing::info!(status = %saga.status(), "saga no longer accepts events, dropping");
                return Ok(HandlerOutcome::Stale);
            }
            if saga
                .step(StepName::PaymentProcessing)
                .is_some_and(|step| !step.status.is_pending())
            {
                tracing::info!("payment step already resolved, dropping duplicate");
                return Ok(HandlerOutcome::Duplicate);
            }

            // A saga can still be STARTED here if the process crashed
            // between publishing order.created and the IN_PROGRESS write;
            // promote it as part of this event's own commit.
            if saga.status() == SagaStatus::Started {
                saga.begin()?;
            }

            match status {
                PaymentStatus::Success => {
                    saga.complete_step(StepName::PaymentProcessing)?;
                    saga.record_payment(payment_id.clone());
                    saga.advance_to(StepName::NotificationSent);

                    // Order first: if the saga write below loses its race,
                    // the winner has made the same order transition a no-op.
                    let order = self
                        .set_order_status(saga.order_id(), OrderStatus::PaymentCompleted)
                        .await?;
                    match self.sagas.put_if_version(saga.clone(), version).await {
                        Ok(_) => {}
                        Err(e) if e.is_conflict() => {
                            tracing::debug!(attempt, "lost saga version race, re-reading");
                            tokio::time::sleep(self.retry.delay(attempt)).await;
                            continue;
                        }
                        Err(e) => return Err(e.into()),
                    }

                    self.publish_with_retry(
                        topics::NOTIFICATION_REQUESTED,
                        notifications::confirmation(&saga, &order),
                    )
                    .await?;

                    tracing::info!("payment completed, confirmation requested");
                    return Ok(HandlerOutcome::Applied);
                }
                PaymentStatus::Failed => {
                    let reason = failure_reason
                        .clone()
                        .unwrap_or_else(|| "payment failed".to_string());
                    saga.fail_step(StepName::PaymentProcessing, &reason)?;
                    saga.begin_compensation()?;

                    self.set_order_status(saga.order_id(), OrderStatus::PaymentFailed)
                        .await?;
                    let version = match self.sagas.put_if_version(saga.clone(), version).await {
                        Ok(v) => v,
                        Err(e) if e.is_conflict() => {
                            tracing::debug!(attempt, "lost saga version race, re-reading");
                            tokio::time::sleep(self.retry.delay(attempt)).await;
                            continue;
                        }
                        Err(e) => return Err(e.into()),
                    };

                    tracing::warn!(%reason, "payment failed, compensating");
                    self.compensate(saga, version).await?;
                    return Ok(HandlerOutcome::Applied);
                }
            }
        }

        Err(OrchestratorError::ConflictRetriesExhausted {
            saga_id,
            attempts: self.retry.max_attempts,
        })
    }

    /// Handles a `notification.sent` outcome event.
    #[tracing::instrument(
        skip(self, event),
        fields(saga_id = %event.saga_id, event_id = %event.event_id)
    )]
    pub async fn on_notification_outcome(&self, event: &Event) -> Result<HandlerOutcome> {
        let EventPayload::NotificationSent {
            status,
            failure_reason,
            ..
        } = &event.payload
        else {
            return Err(OrchestratorError::UnexpectedPayload {
                handler: "on_notification_outcome",
                actual: event.event_type(),
            });
        };
        let saga_id = event.saga_id;

        for attempt in 0..self.retry.max_attempts {
            let Some(Versioned {
                version,
                record: mut saga,
            }) = self.sagas.get(saga_id).await?
            else {
                return Err(OrchestratorError::SagaNotFound(saga_id));
            };

            if !saga.status().accepts_step_events() {
                tracing::info!(status = %saga.status(), "saga no longer accepts events, dropping");
                return Ok(HandlerOutcome::Stale);
            }
            // A notification outcome before payment resolved would complete
            // the saga prematurely; drop it and let the payment outcome
            // drive progress.
            if saga
                .step(StepName::PaymentProcessing)
                .is_some_and(|step| step.status != StepStatus::Completed)
            {
                return Err(OrchestratorError::OutOfOrderStep {
                    saga_id,
                    step: StepName::NotificationSent,
                    expected: StepName::PaymentProcessing,
                });
            }
            if saga
                .step(StepName::NotificationSent)
                .is_some_and(|step| !step.status.is_pending())
            {
                tracing::info!("notification step already resolved, dropping duplicate");
                return Ok(HandlerOutcome::Duplicate);
            }

            // Sagas stranded in STARTED by a crash before the IN_PROGRESS
            // write are promoted here, so complete() below never sees a
            // STARTED saga.
            if saga.status() == SagaStatus::Started {
                saga.begin()?;
            }

            match status {
                message_bus::DeliveryStatus::Sent => {
                    saga.complete_step(StepName::NotificationSent)?;
                    saga.complete()?;
                    match self.sagas.put_if_version(saga, version).await {
                        Ok(_) => {}
                        Err(e) if e.is_conflict() => {
                            tracing::debug!(attempt, "lost saga version race, re-reading");
                            tokio::time::sleep(self.retry.delay(attempt)).await;
                            continue;
                        }
                        Err(e) => return Err(e.into()),
                    }

                    metrics::counter!("sagas_completed_total").increment(1);
                    tracing::info!("saga completed");
                    return Ok(HandlerOutcome::Applied);
                }
                message_bus::DeliveryStatus::Failed => {
                    let reason = failure_reason
                        .clone()
                        .unwrap_or_else(|| "notification delivery failed".to_string());
                    saga.fail_step(StepName::NotificationSent, &reason)?;
                    saga.begin_compensation()?;
                    let version = match self.sagas.put_if_version(saga.clone(), version).await {
                        Ok(v) => v,
                        Err(e) if e.is_conflict() => {
                            tracing::debug!(attempt, "lost saga version race, re-reading");
                            tokio::time::sleep(self.retry.delay(attempt)).await;
                            continue;
                        }
                        Err(e) => return Err(e.into()),
                    };

                    tracing::warn!(%reason, "notification failed, compensating");
                    self.compensate(saga, version).await?;
                    return Ok(HandlerOutcome::Applied);
                }
            }
        }

        Err(OrchestratorError::ConflictRetriesExhausted {
            saga_id,
            attempts: self.retry.max_attempts,
        })
    }

    /// Applies compensating actions over completed steps, in reverse step
    /// order, committing the saga after each action.
    ///
    /// A failing action is recorded on its step and leaves the saga in
    /// `COMPENSATING` for manual remediation; nothing is retried here.
    #[tracing::instrument(skip(self, saga, version), fields(saga_id = %saga.id()))]
    async fn compensate(&self, mut saga: Saga, mut version: Version) -> Result<()> {
        let completed: Vec<StepName> = saga
            .steps()
            .iter()
            .rev()
            .filter(|step| step.status == StepStatus::Completed)
            .map(|step| step.step_name)
            .collect();

        for step_name in completed {
            let action = step_name.compensation();
            match self.apply_compensation(&saga, action).await {
                Ok(()) => {
                    saga.mark_step_compensated(step_name)?;
                    version = self.sagas.put_if_version(saga.clone(), version).await?;
                    tracing::info!(step = %step_name, action = %action, "step compensated");
                }
                Err(e) => {
                    let reason = e.to_string();
                    saga.record_step_error(step_name, &reason)?;
                    self.sagas.put_if_version(saga.clone(), version).await?;
                    metrics::counter!("saga_compensation_failures_total").increment(1);
                    tracing::error!(
                        step = %step_name,
                        %reason,
                        "compensation failed, saga left in COMPENSATING for manual remediation"
                    );
                    return Err(OrchestratorError::CompensationFailed {
                        saga_id: saga.id(),
                        step: step_name,
                        reason,
                    });
                }
            }
        }

        saga.finish_compensation()?;
        self.sagas.put_if_version(saga.clone(), version).await?;
        metrics::counter!("sagas_compensated_total").increment(1);
        tracing::warn!(order_id = %saga.order_id(), "saga compensated");
        Ok(())
    }

    async fn apply_compensation(&self, saga: &Saga, action: CompensationAction) -> Result<()> {
        match action {
            CompensationAction::CancelOrder => {
                self.set_order_status(saga.order_id(), OrderStatus::Cancelled)
                    .await?;
                self.publish_with_retry(
                    topics::NOTIFICATION_REQUESTED,
                    notifications::cancellation(saga),
                )
                .await?;
            }
            CompensationAction::RefundPayment => {
                let Some(payment_id) = saga.payment_id() else {
                    // Payment step completed without a captured payment ID
                    // would be a processor contract violation; nothing to
                    // refund, so log and move on.
                    tracing::warn!("no payment ID captured, skipping refund");
                    return Ok(());
                };
                let Some(order) = self.get_order(saga.order_id()).await? else {
                    return Err(OrchestratorError::OrderNotFound(saga.order_id()));
                };
                let refund = Event::new(
                    saga.id(),
                    saga.user_id(),
                    EventPayload::RefundRequested {
                        payment_id: payment_id.to_string(),
                        order_id: saga.order_id(),
                        amount: order.total_amount(),
                    },
                );
                self.publish_with_retry(topics::PAYMENT_REFUND_REQUESTED, refund)
                    .await?;
            }
            CompensationAction::SendCancellationNotification => {
                self.publish_with_retry(
                    topics::NOTIFICATION_REQUESTED,
                    notifications::cancellation(saga),
                )
                .await?;
            }
        }
        Ok(())
    }

    /// Moves an order to `status`, skipping the write when a previous
    /// partially-committed run already applied it.
    async fn set_order_status(&self, order_id: OrderId, status: OrderStatus) -> Result<Order> {
        let Some(Versioned {
            version,
            record: mut order,
        }) = self.orders.get(order_id).await?
        else {
            return Err(OrchestratorError::OrderNotFound(order_id));
        };
        if order.status() == status {
            return Ok(order);
        }
        order.set_status(status)?;
        self.orders.put_if_version(order.clone(), version).await?;
        Ok(order)
    }

    async fn publish_with_retry(&self, topic: &str, event: Event) -> Result<()> {
        let mut attempt = 0;
        loop {
            match self.bus.publish(topic, event.clone()).await {
                Ok(()) => return Ok(()),
                Err(e) if e.is_transient() && attempt + 1 < self.retry.max_attempts => {
                    tracing::warn!(topic, attempt, error = %e, "publish failed, backing off");
                    tokio::time::sleep(self.retry.delay(attempt)).await;
                    attempt += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Returns the latest committed state of a saga.
    pub async fn get_saga(&self, saga_id: SagaId) -> Result<Option<Saga>> {
        Ok(self.sagas.get(saga_id).await?.map(|v| v.record))
    }

    /// Returns the latest committed state of an order.
    pub async fn get_order(&self, order_id: OrderId) -> Result<Option<Order>> {
        Ok(self.orders.get(order_id).await?.map(|v| v.record))
    }
}

impl<SS, OS, B> std::fmt::Debug for SagaOrchestrator<SS, OS, B>
where
    SS: Store<Saga>,
    OS: Store<Order>,
    B: MessageBus,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SagaOrchestrator")
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}
