//! Event dispatch: routes bus events to their handlers and decides, per
//! error kind, whether an event is dropped or handed back to the
//! transport for redelivery.

use std::sync::Arc;

use domain::{Order, Saga};
use message_bus::{Event, EventPayload, MessageBus, Subscription};
use store::Store;

use crate::error::OrchestratorError;
use crate::orchestrator::{HandlerOutcome, SagaOrchestrator};

/// How the dispatcher resolved an inbound event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// The event advanced a saga.
    Applied,
    /// The event had already been applied; dropped without side effects.
    Duplicate,
    /// The saga no longer accepts step events; dropped.
    Stale,
    /// The event arrived before the step it depends on completed; dropped,
    /// the expected event drives progress when it arrives.
    OutOfOrder,
    /// The event cannot be applied (unknown saga, rule violation); dropped
    /// after logging. Redelivery cannot help.
    Dropped,
    /// A transient failure interrupted handling; the transport should
    /// redeliver the event.
    Redeliver,
}

/// Routes one event to its handler and folds the result into a
/// [`Disposition`].
///
/// Unroutable payloads (the orchestrator's own outbound events echoed
/// back, for instance) are dropped silently at debug level.
pub async fn dispatch<SS, OS, B>(
    orchestrator: &SagaOrchestrator<SS, OS, B>,
    event: &Event,
) -> Disposition
where
    SS: Store<Saga>,
    OS: Store<Order>,
    B: MessageBus,
{
    let result = match &event.payload {
        EventPayload::PaymentProcessed { .. } => orchestrator.on_payment_outcome(event).await,
        EventPayload::NotificationSent { .. } => orchestrator.on_notification_outcome(event).await,
        other => {
            tracing::debug!(event_type = other.event_type(), "no handler for event, ignoring");
            return Disposition::Dropped;
        }
    };

    match result {
        Ok(HandlerOutcome::Applied) => {
            metrics::counter!("events_applied_total").increment(1);
            Disposition::Applied
        }
        Ok(HandlerOutcome::Duplicate) => {
            metrics::counter!("events_duplicate_total").increment(1);
            Disposition::Duplicate
        }
        Ok(HandlerOutcome::Stale) => {
            metrics::counter!("events_stale_total").increment(1);
            Disposition::Stale
        }
        Err(e) if e.is_retryable() => {
            metrics::counter!("events_redelivered_total").increment(1);
            tracing::warn!(
                saga_id = %event.saga_id,
                event_id = %event.event_id,
                error = %e,
                "transient failure, requesting redelivery"
            );
            Disposition::Redeliver
        }
        Err(OrchestratorError::OutOfOrderStep {
            saga_id,
            step,
            expected,
        }) => {
            metrics::counter!("events_out_of_order_total").increment(1);
            tracing::warn!(
                %saga_id,
                step = %step,
                expected = %expected,
                "out-of-order event dropped"
            );
            Disposition::OutOfOrder
        }
        Err(e) => {
            metrics::counter!("events_dropped_total").increment(1);
            tracing::error!(
                saga_id = %event.saga_id,
                event_id = %event.event_id,
                error = %e,
                "event dropped"
            );
            Disposition::Dropped
        }
    }
}

/// Consumes a subscription until its topic closes, dispatching each
/// event.
///
/// Events marked [`Disposition::Redeliver`] are retried immediately once;
/// a second transient failure defers to the transport's own redelivery.
pub async fn run_consumer<SS, OS, B>(
    orchestrator: Arc<SagaOrchestrator<SS, OS, B>>,
    mut subscription: Subscription,
) where
    SS: Store<Saga>,
    OS: Store<Order>,
    B: MessageBus,
{
    tracing::info!(topic = subscription.topic(), "consumer started");
    while let Some(event) = subscription.recv().await {
        let disposition = dispatch(orchestrator.as_ref(), &event).await;
        if disposition == Disposition::Redeliver {
            dispatch(orchestrator.as_ref(), &event).await;
        }
    }
    tracing::info!(topic = subscription.topic(), "consumer stopped");
}
