use std::sync::Arc;

use anyhow::Context;
use catalog_db::PgStore;
use catalog_engine::{EditCloser, EditService};
use catalog_events::{BusNotifier, EventBus, NotificationFanout};
use catalog_worker::background::{edit_closer, notification_retention};
use catalog_worker::WorkerConfig;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "catalog_worker=debug,catalog_engine=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = WorkerConfig::from_env().context("Invalid worker configuration")?;
    tracing::info!(
        max_connections = config.max_connections,
        vote_threshold = config.voting.vote_application_threshold,
        "Loaded worker configuration"
    );

    // --- Database ---
    let pool = catalog_db::create_pool(&config.database_url, config.max_connections)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Database connection pool created");

    catalog_db::health_check(&pool)
        .await
        .context("Database health check failed")?;
    catalog_db::run_migrations(&pool)
        .await
        .context("Failed to run database migrations")?;
    tracing::info!("Database migrations applied");

    // --- Event bus ---
    let store = PgStore::new(pool);
    let event_bus = Arc::new(EventBus::default());
    let fanout_handle = tokio::spawn(NotificationFanout::run(store.clone(), event_bus.subscribe()));

    // --- Engine ---
    let notifier = BusNotifier::new(Arc::clone(&event_bus));
    let service = Arc::new(EditService::new(store, notifier, config.voting.clone()));

    // --- Background jobs ---
    let cancel = CancellationToken::new();
    let mut jobs = Vec::new();

    match config.edit_closer_interval {
        Some(period) => {
            let closer = Arc::new(EditCloser::new(Arc::clone(&service)));
            jobs.push(tokio::spawn(edit_closer::run(closer, period, cancel.clone())));
        }
        None => tracing::info!("Edit closer disabled"),
    }

    jobs.push(tokio::spawn(notification_retention::run(
        Arc::clone(&service),
        config.notification_retention,
        config.notification_retention_interval,
        cancel.clone(),
    )));

    tracing::info!("Worker started");

    shutdown_signal().await;
    cancel.cancel();
    for job in jobs {
        if let Err(e) = job.await {
            tracing::error!(error = %e, "Background job panicked");
        }
    }

    // Dropping the last bus sender closes the fan-out subscriber.
    drop(service);
    drop(event_bus);
    if let Err(e) = fanout_handle.await {
        tracing::error!(error = %e, "Notification fan-out panicked");
    }

    tracing::info!("Graceful shutdown complete");
    Ok(())
}

/// Wait for SIGINT or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl-C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
