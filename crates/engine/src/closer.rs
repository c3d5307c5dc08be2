//! Single-flight wrapper around [`EditService::close_completed`].
//!
//! Overlapping runs never execute concurrently: a run that finds another
//! one in progress returns [`CloserRun::Skipped`] immediately instead of
//! waiting for it.

use std::sync::Arc;

use catalog_core::notify::EditNotifier;
use catalog_core::store::CatalogStore;
use tokio::sync::Mutex;

use crate::error::EngineResult;
use crate::service::{CloseSummary, EditService};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloserRun {
    /// Another run held the guard.
    Skipped,
    Completed(CloseSummary),
}

pub struct EditCloser<S, N> {
    service: Arc<EditService<S, N>>,
    guard: Mutex<()>,
}

impl<S: CatalogStore, N: EditNotifier> EditCloser<S, N> {
    pub fn new(service: Arc<EditService<S, N>>) -> Self {
        Self {
            service,
            guard: Mutex::new(()),
        }
    }

    /// Close every resolved edit, unless a run is already in progress.
    pub async fn run_once(&self) -> EngineResult<CloserRun> {
        let Ok(_running) = self.guard.try_lock() else {
            tracing::debug!("Edit closer already running, skipping this run");
            return Ok(CloserRun::Skipped);
        };

        let summary = self.service.close_completed().await?;
        if summary.closed() > 0 || summary.errors > 0 {
            tracing::info!(
                applied = summary.applied,
                rejected = summary.rejected,
                failed = summary.failed,
                errors = summary.errors,
                "Edit closer run finished"
            );
        } else {
            tracing::debug!(skipped = summary.skipped, "Edit closer: nothing to close");
        }
        Ok(CloserRun::Completed(summary))
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use catalog_core::edit::{EditStatus, Operation, VoteType};
    use catalog_core::notify::NoopNotifier;
    use catalog_core::roles::{Actor, Role};
    use catalog_core::tag::TagEditDetails;
    use catalog_core::types::DbId;
    use catalog_core::voting::VotingConfig;
    use catalog_db::MemoryStore;
    use chrono::{Duration, Utc};

    use super::*;
    use crate::submission::{EditDetails, EditSubmission};

    type Service = EditService<MemoryStore, NoopNotifier>;

    fn closer() -> (MemoryStore, Arc<Service>, EditCloser<MemoryStore, NoopNotifier>) {
        let store = MemoryStore::new();
        let config = VotingConfig {
            vote_application_threshold: 1,
            ..VotingConfig::default()
        };
        let service = Arc::new(EditService::new(store.clone(), NoopNotifier, config));
        let closer = EditCloser::new(Arc::clone(&service));
        (store, service, closer)
    }

    async fn accepted_tag_edit(
        store: &MemoryStore,
        service: &Service,
    ) -> DbId {
        let details = TagEditDetails {
            name: Some(Some("Outdoor".to_string())),
            ..Default::default()
        };
        let submission = EditSubmission::new(Operation::Create, EditDetails::Tag(details));
        let edit = service
            .submit_edit(&Actor::new(1, Role::Edit), submission)
            .await
            .unwrap();
        service
            .vote(&Actor::new(2, Role::Vote), edit.id, VoteType::Accept)
            .await
            .unwrap();
        store
            .backdate_edit(edit.id, Utc::now() - Duration::days(3))
            .unwrap();
        edit.id
    }

    #[tokio::test]
    async fn run_applies_resolved_edits() {
        let (store, service, closer) = closer();
        let edit_id = accepted_tag_edit(&store, &service).await;

        let run = closer.run_once().await.unwrap();
        assert_matches!(run, CloserRun::Completed(summary) if summary.applied == 1);
        let edit = service.find_edit(edit_id).await.unwrap();
        assert_eq!(edit.status, EditStatus::Accepted);
    }

    #[tokio::test]
    async fn held_guard_skips_the_run() {
        let (store, service, closer) = closer();
        let edit_id = accepted_tag_edit(&store, &service).await;

        let held = closer.guard.try_lock().unwrap();
        assert_eq!(closer.run_once().await.unwrap(), CloserRun::Skipped);
        drop(held);

        assert!(service.find_edit(edit_id).await.unwrap().is_pending());
    }

    #[tokio::test]
    async fn overlapping_runs_close_each_edit_once() {
        let (store, service, closer) = closer();
        accepted_tag_edit(&store, &service).await;

        let (first, second) = tokio::join!(closer.run_once(), closer.run_once());
        let applied: u32 = [first.unwrap(), second.unwrap()]
            .into_iter()
            .map(|run| match run {
                CloserRun::Completed(summary) => summary.applied,
                CloserRun::Skipped => 0,
            })
            .sum();
        assert_eq!(applied, 1);
    }
}
