//! Periodic closing of edits whose voting has resolved.
//!
//! Each tick runs [`EditCloser::run_once`]. A tick that lands while the
//! previous run is still working is skipped by the closer's own guard.

use std::sync::Arc;
use std::time::Duration;

use catalog_core::notify::EditNotifier;
use catalog_core::store::CatalogStore;
use catalog_engine::{CloserRun, EditCloser};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// Run the edit closer loop until `cancel` is triggered.
pub async fn run<S, N>(closer: Arc<EditCloser<S, N>>, period: Duration, cancel: CancellationToken)
where
    S: CatalogStore,
    N: EditNotifier,
{
    tracing::info!(interval_secs = period.as_secs(), "Edit closer job started");

    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Edit closer job stopping");
                break;
            }
            _ = interval.tick() => {
                match closer.run_once().await {
                    Ok(CloserRun::Completed(_)) => {}
                    Ok(CloserRun::Skipped) => {
                        tracing::warn!("Edit closer: previous run still in progress");
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Edit closer: run failed");
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use catalog_core::edit::{EditStatus, Operation, VoteType};
    use catalog_core::notify::NoopNotifier;
    use catalog_core::roles::{Actor, Role};
    use catalog_core::tag::TagEditDetails;
    use catalog_core::voting::VotingConfig;
    use catalog_db::MemoryStore;
    use catalog_engine::{EditDetails, EditService, EditSubmission};
    use chrono::Utc;

    use super::*;

    #[tokio::test]
    async fn closes_resolved_edits_and_stops_on_cancel() {
        let store = MemoryStore::new();
        let config = VotingConfig {
            vote_application_threshold: 1,
            ..VotingConfig::default()
        };
        let service = Arc::new(EditService::new(store.clone(), NoopNotifier, config));

        let details = TagEditDetails {
            name: Some(Some("Outdoor".to_string())),
            ..Default::default()
        };
        let edit = service
            .submit_edit(
                &Actor::new(1, Role::Edit),
                EditSubmission::new(Operation::Create, EditDetails::Tag(details)),
            )
            .await
            .unwrap();
        service
            .vote(&Actor::new(2, Role::Vote), edit.id, VoteType::Accept)
            .await
            .unwrap();
        store
            .backdate_edit(edit.id, Utc::now() - chrono::Duration::days(3))
            .unwrap();

        let cancel = CancellationToken::new();
        let closer = Arc::new(EditCloser::new(Arc::clone(&service)));
        let handle = tokio::spawn(run(closer, Duration::from_secs(3600), cancel.clone()));

        // The first tick fires immediately.
        tokio::time::sleep(Duration::from_millis(100)).await;
        cancel.cancel();
        handle.await.unwrap();

        let edit = service.find_edit(edit.id).await.unwrap();
        assert_eq!(edit.status, EditStatus::Accepted);
    }
}
