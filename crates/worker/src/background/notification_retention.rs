//! Periodic cleanup of old notifications.
//!
//! Deletes notifications older than the configured retention period on a
//! fixed interval using `tokio::time::interval`.

use std::sync::Arc;
use std::time::Duration;

use catalog_core::notify::EditNotifier;
use catalog_core::store::CatalogStore;
use catalog_engine::{EditService, EngineResult};
use chrono::Utc;
use tokio_util::sync::CancellationToken;

/// Delete notifications created more than `retention` ago.
pub async fn purge_once<S, N>(service: &EditService<S, N>, retention: chrono::Duration) -> EngineResult<u64>
where
    S: CatalogStore,
    N: EditNotifier,
{
    service.prune_notifications(Utc::now() - retention).await
}

/// Run the notification retention loop until `cancel` is triggered.
pub async fn run<S, N>(
    service: Arc<EditService<S, N>>,
    retention: chrono::Duration,
    period: Duration,
    cancel: CancellationToken,
) where
    S: CatalogStore,
    N: EditNotifier,
{
    tracing::info!(
        retention_days = retention.num_days(),
        interval_secs = period.as_secs(),
        "Notification retention job started"
    );

    let mut interval = tokio::time::interval(period);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Notification retention job stopping");
                break;
            }
            _ = interval.tick() => {
                match purge_once(&service, retention).await {
                    Ok(deleted) => {
                        if deleted > 0 {
                            tracing::info!(deleted, "Notification retention: purged old rows");
                        } else {
                            tracing::debug!("Notification retention: no rows to purge");
                        }
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Notification retention: cleanup failed");
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use catalog_core::notification::{NewNotification, NotificationType};
    use catalog_core::notify::NoopNotifier;
    use catalog_core::store::{CatalogTx, NotificationRepository};
    use catalog_core::types::Page;
    use catalog_core::voting::VotingConfig;
    use catalog_db::MemoryStore;

    use super::*;

    async fn seed_notification(store: &MemoryStore) {
        let mut tx = store.begin().await.unwrap();
        tx.create_notifications(&[NewNotification {
            user_id: 1,
            kind: NotificationType::FailedOwnEdit,
            edit_id: 1,
        }])
        .await
        .unwrap();
        tx.commit().await.unwrap();
    }

    #[tokio::test]
    async fn purge_keeps_notifications_inside_retention() {
        let store = MemoryStore::new();
        let service = EditService::new(store.clone(), NoopNotifier, VotingConfig::default());
        seed_notification(&store).await;

        assert_eq!(purge_once(&service, chrono::Duration::days(30)).await.unwrap(), 0);
        assert_eq!(
            service.notifications(1, false, Page::default()).await.unwrap().len(),
            1
        );
    }

    #[tokio::test]
    async fn purge_removes_expired_notifications() {
        let store = MemoryStore::new();
        let service = EditService::new(store.clone(), NoopNotifier, VotingConfig::default());
        seed_notification(&store).await;
        tokio::time::sleep(Duration::from_millis(5)).await;

        assert_eq!(purge_once(&service, chrono::Duration::zero()).await.unwrap(), 1);
        assert_eq!(service.unread_notification_count(1).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn loop_stops_on_cancel() {
        let store = MemoryStore::new();
        let service = Arc::new(EditService::new(store, NoopNotifier, VotingConfig::default()));
        let cancel = CancellationToken::new();
        cancel.cancel();

        run(service, chrono::Duration::days(30), Duration::from_secs(3600), cancel).await;
    }
}
