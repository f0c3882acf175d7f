//! Stuck-saga detection.
//!
//! A saga waiting on an outcome event that never arrives (collaborator
//! down, event lost beyond the transport's redelivery) stays `STARTED`,
//! `IN_PROGRESS`, or `COMPENSATING` forever. The monitor flags those for
//! operators; it never mutates sagas itself.

use chrono::{Duration, Utc};
use common::SagaId;
use domain::{Saga, SagaStatus};
use store::Store;

use crate::error::Result;

/// A saga that has not progressed within the deadline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StuckSaga {
    pub saga_id: SagaId,
    pub status: SagaStatus,
    /// How long the saga has gone without an update.
    pub stalled_for: Duration,
}

/// Periodically scans for sagas stalled in a non-terminal status.
pub struct StuckSagaMonitor<SS: Store<Saga>> {
    sagas: SS,
    deadline: Duration,
}

impl<SS: Store<Saga>> StuckSagaMonitor<SS> {
    pub fn new(sagas: SS, deadline: Duration) -> Self {
        Self { sagas, deadline }
    }

    /// Runs one scan, logging and returning every stalled saga.
    pub async fn scan(&self) -> Result<Vec<StuckSaga>> {
        let now = Utc::now();
        let mut stuck = Vec::new();

        for status in [
            SagaStatus::Started,
            SagaStatus::InProgress,
            SagaStatus::Compensating,
        ] {
            for versioned in self.sagas.list_by_status(status).await? {
                let saga = versioned.record;
                let stalled_for = now - saga.updated_at();
                if stalled_for >= self.deadline {
                    tracing::warn!(
                        saga_id = %saga.id(),
                        status = %saga.status(),
                        current_step = ?saga.current_step(),
                        stalled_secs = stalled_for.num_seconds(),
                        "saga appears stuck"
                    );
                    stuck.push(StuckSaga {
                        saga_id: saga.id(),
                        status: saga.status(),
                        stalled_for,
                    });
                }
            }
        }

        metrics::gauge!("sagas_stuck").set(stuck.len() as f64);
        Ok(stuck)
    }

    /// Scans on a fixed interval until the task is aborted.
    pub async fn run(&self, interval: std::time::Duration) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            if let Err(e) = self.scan().await {
                tracing::error!(error = %e, "stuck-saga scan failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{OrderId, UserId};
    use store::{InMemoryStore, Version};

    fn in_progress_saga() -> Saga {
        let mut saga = Saga::start(OrderId::new(), UserId::new());
        saga.begin().unwrap();
        saga
    }

    #[tokio::test]
    async fn test_fresh_sagas_are_not_stuck() {
        let sagas = InMemoryStore::new();
        let saga = in_progress_saga();
        sagas
            .put_if_version(saga, Version::initial())
            .await
            .unwrap();

        let monitor = StuckSagaMonitor::new(sagas, Duration::minutes(5));
        assert!(monitor.scan().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_stalled_saga_is_flagged() {
        let sagas = InMemoryStore::new();
        let saga = in_progress_saga();
        let saga_id = saga.id();
        sagas
            .put_if_version(saga, Version::initial())
            .await
            .unwrap();

        // Zero deadline: any in-progress saga counts as stalled.
        let monitor = StuckSagaMonitor::new(sagas, Duration::zero());
        let stuck = monitor.scan().await.unwrap();
        assert_eq!(stuck.len(), 1);
        assert_eq!(stuck[0].saga_id, saga_id);
        assert_eq!(stuck[0].status, SagaStatus::InProgress);
    }

    #[tokio::test]
    async fn test_started_saga_is_flagged() {
        // A crash between publishing order.created and the IN_PROGRESS
        // write leaves a saga in STARTED; it must not be invisible.
        let sagas = InMemoryStore::new();
        let saga = Saga::start(OrderId::new(), UserId::new());
        let saga_id = saga.id();
        sagas
            .put_if_version(saga, Version::initial())
            .await
            .unwrap();

        let monitor = StuckSagaMonitor::new(sagas, Duration::zero());
        let stuck = monitor.scan().await.unwrap();
        assert_eq!(stuck.len(), 1);
        assert_eq!(stuck[0].saga_id, saga_id);
        assert_eq!(stuck[0].status, SagaStatus::Started);
    }

    #[tokio::test]
    async fn test_terminal_sagas_are_ignored() {
        let sagas = InMemoryStore::new();
        let mut saga = in_progress_saga();
        saga.complete_step(domain::StepName::PaymentProcessing)
            .unwrap();
        saga.complete_step(domain::StepName::NotificationSent)
            .unwrap();
        saga.complete().unwrap();
        sagas
            .put_if_version(saga, Version::initial())
            .await
            .unwrap();

        let monitor = StuckSagaMonitor::new(sagas, Duration::zero());
        assert!(monitor.scan().await.unwrap().is_empty());
    }
}
