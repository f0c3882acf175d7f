//! Saga orchestrator service entry point.

mod config;

use std::sync::Arc;

use domain::{Order, Saga};
use message_bus::{InMemoryBus, MessageBus, topics};
use orchestrator::{RetryPolicy, SagaOrchestrator, StuckSagaMonitor};
use store::InMemoryStore;
use tokio::signal;
use tokio::task::JoinSet;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::Config;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received SIGINT, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, starting graceful shutdown");
        }
    }
}

#[tokio::main]
async fn main() {
    let config = Config::from_env();

    // 1. Initialize tracing
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone())),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 2. Install Prometheus metrics recorder with its scrape endpoint
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(config.metrics_addr())
        .install()
        .expect("failed to install Prometheus recorder");

    // 3. Wire stores, bus, and orchestrator
    let sagas: InMemoryStore<Saga> = InMemoryStore::new();
    let orders: InMemoryStore<Order> = InMemoryStore::new();
    let bus = InMemoryBus::new();
    let orchestrator = Arc::new(
        SagaOrchestrator::new(sagas.clone(), orders, bus.clone())
            .with_retry_policy(RetryPolicy::with_max_attempts(config.retry_max_attempts)),
    );

    // 4. Subscribe before consumers start, so no outcome event is missed
    let payment_sub = bus.subscribe(topics::PAYMENT_PROCESSED).await;
    let notification_sub = bus.subscribe(topics::NOTIFICATION_SENT).await;
    let mut tasks = JoinSet::new();
    tasks.spawn(orchestrator::run_consumer(
        Arc::clone(&orchestrator),
        payment_sub,
    ));
    tasks.spawn(orchestrator::run_consumer(
        Arc::clone(&orchestrator),
        notification_sub,
    ));

    // 5. Start the stuck-saga monitor
    let monitor = StuckSagaMonitor::new(
        sagas,
        chrono::Duration::seconds(config.stuck_saga_deadline_secs as i64),
    );
    let scan_interval = std::time::Duration::from_secs(config.stuck_saga_scan_secs);
    tasks.spawn(async move {
        monitor.run(scan_interval).await;
    });

    tracing::info!(
        metrics_addr = %config.metrics_addr(),
        "saga orchestrator service started"
    );

    shutdown_signal().await;

    tasks.abort_all();
    while tasks.join_next().await.is_some() {}
    tracing::info!("service shut down gracefully");
}
