//! Edit lifecycle operations.
//!
//! [`EditService`] is the single entry point for submitting, amending,
//! voting on, commenting on, cancelling and closing edits. Each operation
//! runs in its own store transaction; notifications fire only after that
//! transaction commits.

use catalog_core::edit::{Edit, EditComment, EditStatus, EditVote, NewEdit, TargetType, VoteType};
use catalog_core::error::CoreError;
use catalog_core::notification::Notification;
use catalog_core::notify::EditNotifier;
use catalog_core::query::EditFilter;
use catalog_core::roles::{Actor, Role};
use catalog_core::store::{CatalogStore, CatalogTx, EditRepository, NotificationRepository};
use catalog_core::types::{DbId, Page, Timestamp};
use catalog_core::voting::{ClosingDecision, VoteTally, VotingConfig};
use chrono::Utc;

use crate::apply::apply_changes;
use crate::error::{EngineError, EngineResult};
use crate::redirect;
use crate::submission::{build_edit_data, EditSubmission};

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// One page of edits plus the total matching the filter.
#[derive(Debug, Clone, PartialEq)]
pub struct EditPage {
    pub edits: Vec<Edit>,
    pub total: i64,
}

/// Counts from one pass over the closing candidates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CloseSummary {
    pub applied: u32,
    pub rejected: u32,
    pub failed: u32,
    /// Candidates the policy left open.
    pub skipped: u32,
    /// Candidates that hit a transient error and stay pending.
    pub errors: u32,
}

impl CloseSummary {
    fn record(&mut self, status: EditStatus) {
        match status {
            EditStatus::Accepted | EditStatus::ImmediateAccepted => self.applied += 1,
            EditStatus::Rejected | EditStatus::ImmediateRejected => self.rejected += 1,
            EditStatus::Failed => self.failed += 1,
            EditStatus::Pending | EditStatus::Canceled => self.skipped += 1,
        }
    }

    pub fn closed(&self) -> u32 {
        self.applied + self.rejected + self.failed
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn lock_pending<T: CatalogTx>(tx: &mut T, edit_id: DbId) -> EngineResult<Edit> {
    let edit = tx
        .lock_edit(edit_id)
        .await?
        .ok_or(CoreError::NotFound { entity: "Edit", id: edit_id })?;
    if !edit.is_pending() {
        return Err(CoreError::Conflict(format!(
            "Edit {edit_id} is already closed with status {}",
            edit.status
        ))
        .into());
    }
    Ok(edit)
}

// ---------------------------------------------------------------------------
// EditService
// ---------------------------------------------------------------------------

pub struct EditService<S, N> {
    store: S,
    notifier: N,
    config: VotingConfig,
}

impl<S: CatalogStore, N: EditNotifier> EditService<S, N> {
    pub fn new(store: S, notifier: N, config: VotingConfig) -> Self {
        Self {
            store,
            notifier,
            config,
        }
    }

    pub fn config(&self) -> &VotingConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    // -- Submission ---------------------------------------------------------

    /// Diff the submission against the live catalog and open a pending edit.
    pub async fn submit_edit(&self, actor: &Actor, submission: EditSubmission) -> EngineResult<Edit> {
        actor.require(Role::Edit)?;
        submission.validate_shape()?;

        let mut tx = self.store.begin().await?;
        let data = build_edit_data(&mut tx, &submission).await?;
        let edit = tx
            .create_edit(&NewEdit {
                user_id: actor.user_id,
                target_type: submission.target_type(),
                operation: submission.operation,
                data,
            })
            .await?;
        if let Some(target_id) = submission.target_id {
            tx.create_edit_target(edit.id, edit.target_type, target_id)
                .await?;
        }
        if let Some(text) = submission.comment_text() {
            tx.create_comment(edit.id, Some(actor.user_id), text).await?;
        }
        tx.commit().await?;

        tracing::info!(
            edit_id = edit.id,
            user_id = actor.user_id,
            target_type = %edit.target_type,
            operation = %edit.operation,
            "Edit submitted"
        );
        self.notifier.on_create_edit(&edit);
        Ok(edit)
    }

    /// Replace a pending edit's diff with a fresh one. Only the author may
    /// amend, at most `edit_update_limit` times. Existing votes are
    /// discarded.
    pub async fn update_edit(
        &self,
        actor: &Actor,
        edit_id: DbId,
        submission: EditSubmission,
    ) -> EngineResult<Edit> {
        actor.require(Role::Edit)?;
        submission.validate_shape()?;

        let mut tx = self.store.begin().await?;
        let mut edit = lock_pending(&mut tx, edit_id).await?;
        if edit.user_id != actor.user_id {
            return Err(CoreError::Forbidden(format!(
                "Only the author can update edit {edit_id}"
            ))
            .into());
        }
        if edit.update_count >= self.config.edit_update_limit {
            return Err(CoreError::Validation(format!(
                "Edit {edit_id} has reached the update limit of {}",
                self.config.edit_update_limit
            ))
            .into());
        }
        if submission.operation != edit.operation || submission.target_type() != edit.target_type {
            return Err(CoreError::Validation(
                "An update cannot change the edit's operation or target type".to_string(),
            )
            .into());
        }
        if edit.operation.requires_target() {
            let stored = tx.find_edit_target(edit.id, edit.target_type).await?;
            if stored != submission.target_id {
                return Err(CoreError::Validation(
                    "An update cannot change the edit's target".to_string(),
                )
                .into());
            }
        }

        edit.data = build_edit_data(&mut tx, &submission).await?;
        edit.update_count += 1;
        edit.vote_count = 0;
        let previous_voters: Vec<DbId> = tx
            .list_votes(edit.id)
            .await?
            .into_iter()
            .map(|vote| vote.user_id)
            .collect();
        tx.delete_votes(edit.id).await?;
        let edit = tx.update_edit(&edit).await?;
        if let Some(text) = submission.comment_text() {
            tx.create_comment(edit.id, Some(actor.user_id), text).await?;
        }
        tx.commit().await?;

        tracing::info!(
            edit_id,
            update_count = edit.update_count,
            votes_reset = previous_voters.len(),
            "Edit updated"
        );
        self.notifier.on_update_edit(&edit, &previous_voters);
        Ok(edit)
    }

    // -- Voting and comments ------------------------------------------------

    /// Record `actor`'s vote, replacing any earlier one, then close the edit
    /// if the vote resolved it.
    pub async fn vote(&self, actor: &Actor, edit_id: DbId, vote: VoteType) -> EngineResult<Edit> {
        actor.require(Role::Vote)?;
        if vote.is_immediate() {
            actor.require(Role::Admin)?;
        }

        let mut tx = self.store.begin().await?;
        let mut edit = lock_pending(&mut tx, edit_id).await?;
        if edit.user_id == actor.user_id {
            return Err(CoreError::Forbidden("Users cannot vote on their own edits".to_string()).into());
        }
        let cast = tx.upsert_vote(edit_id, actor.user_id, vote).await?;
        let votes = tx.list_votes(edit_id).await?;
        edit.vote_count = VoteTally::from_votes(&votes).net();
        let edit = tx.update_edit(&edit).await?;
        tx.commit().await?;

        tracing::debug!(edit_id, user_id = actor.user_id, vote = %vote, net = edit.vote_count, "Vote recorded");
        if vote == VoteType::Reject {
            self.notifier.on_edit_downvote(&edit, &cast);
        }

        match self.close_edit(edit_id).await? {
            Some(closed) => Ok(closed),
            None => Ok(edit),
        }
    }

    pub async fn comment(&self, actor: &Actor, edit_id: DbId, text: &str) -> EngineResult<EditComment> {
        actor.require(Role::Edit)?;
        let text = text.trim();
        if text.is_empty() {
            return Err(CoreError::Validation("Comment text is required".to_string()).into());
        }

        let mut tx = self.store.begin().await?;
        let edit = tx
            .find_edit(edit_id)
            .await?
            .ok_or(CoreError::NotFound { entity: "Edit", id: edit_id })?;
        let comment = tx.create_comment(edit_id, Some(actor.user_id), text).await?;
        tx.commit().await?;

        self.notifier.on_edit_comment(&edit, &comment);
        Ok(comment)
    }

    // -- Closing ------------------------------------------------------------

    /// Withdraw a pending edit.
    ///
    /// The author's cancel closes it as `Canceled`. An admin cancelling
    /// someone else's edit records an immediate reject vote and closes it as
    /// `ImmediateRejected`.
    pub async fn cancel(&self, actor: &Actor, edit_id: DbId) -> EngineResult<Edit> {
        let mut tx = self.store.begin().await?;
        let mut edit = lock_pending(&mut tx, edit_id).await?;
        let now = Utc::now();
        if edit.user_id == actor.user_id {
            edit.close(EditStatus::Canceled, now)?;
        } else if actor.is_admin() {
            tx.upsert_vote(edit_id, actor.user_id, VoteType::ImmediateReject)
                .await?;
            edit.close(EditStatus::ImmediateRejected, now)?;
        } else {
            return Err(CoreError::Forbidden(format!(
                "User {} cannot cancel edit {edit_id}",
                actor.user_id
            ))
            .into());
        }
        let edit = tx.update_edit(&edit).await?;
        tx.commit().await?;

        tracing::info!(edit_id, user_id = actor.user_id, status = %edit.status, "Edit cancelled");
        self.notifier.on_cancel_edit(&edit);
        Ok(edit)
    }

    /// Admin force-apply: record an immediate accept vote and apply now.
    pub async fn apply_edit(&self, actor: &Actor, edit_id: DbId) -> EngineResult<Edit> {
        actor.require(Role::Admin)?;
        let mut tx = self.store.begin().await?;
        let edit = lock_pending(&mut tx, edit_id).await?;
        tx.upsert_vote(edit_id, actor.user_id, VoteType::ImmediateAccept)
            .await?;
        self.apply_and_close(tx, edit, EditStatus::ImmediateAccepted)
            .await
    }

    /// Evaluate the closing policy for one edit and close it if it resolved.
    ///
    /// Returns the closed edit, or `None` when the edit stays open or was
    /// already closed.
    pub async fn close_edit(&self, edit_id: DbId) -> EngineResult<Option<Edit>> {
        let mut tx = self.store.begin().await?;
        let edit = tx
            .lock_edit(edit_id)
            .await?
            .ok_or(CoreError::NotFound { entity: "Edit", id: edit_id })?;
        if !edit.is_pending() {
            return Ok(None);
        }
        let votes = tx.list_votes(edit_id).await?;
        let decision = self
            .config
            .decide(&edit, &VoteTally::from_votes(&votes), Utc::now());

        let closed = match decision {
            ClosingDecision::Open => return Ok(None),
            ClosingDecision::Accept => {
                self.apply_and_close(tx, edit, EditStatus::Accepted).await?
            }
            ClosingDecision::ImmediateAccept => {
                self.apply_and_close(tx, edit, EditStatus::ImmediateAccepted)
                    .await?
            }
            ClosingDecision::Reject => self.reject(tx, edit, EditStatus::Rejected).await?,
            ClosingDecision::ImmediateReject => {
                self.reject(tx, edit, EditStatus::ImmediateRejected).await?
            }
        };
        Ok(Some(closed))
    }

    /// Close every pending edit the policy has resolved.
    ///
    /// Each edit is closed in its own transaction; an error on one edit is
    /// logged and counted without stopping the batch.
    pub async fn close_completed(&self) -> EngineResult<CloseSummary> {
        let cutoff = Utc::now() - self.config.voting_period;
        let candidates = {
            let mut tx = self.store.begin().await?;
            let candidates = tx.list_closing_candidates(cutoff).await?;
            tx.rollback().await?;
            candidates
        };

        let mut summary = CloseSummary::default();
        for candidate in candidates {
            match self.close_edit(candidate.id).await {
                Ok(Some(closed)) => summary.record(closed.status),
                Ok(None) => summary.skipped += 1,
                Err(e) => {
                    tracing::error!(error = %e, edit_id = candidate.id, "Failed to close edit");
                    summary.errors += 1;
                }
            }
        }
        Ok(summary)
    }

    async fn apply_and_close(
        &self,
        mut tx: S::Tx,
        mut edit: Edit,
        status: EditStatus,
    ) -> EngineResult<Edit> {
        match apply_changes(&mut tx, &edit).await {
            Ok(entity_id) => {
                edit.close(status, Utc::now())?;
                let edit = tx.update_edit(&edit).await?;
                tx.commit().await?;
                tracing::info!(
                    edit_id = edit.id,
                    entity_id,
                    status = %edit.status,
                    "Edit applied"
                );
                self.notifier.on_apply_edit(&edit, None);
                Ok(edit)
            }
            Err(e) if e.is_terminal() => {
                tx.rollback().await?;
                self.fail(edit.id, &e).await
            }
            Err(e) => Err(e),
        }
    }

    async fn reject(&self, mut tx: S::Tx, mut edit: Edit, status: EditStatus) -> EngineResult<Edit> {
        edit.close(status, Utc::now())?;
        let edit = tx.update_edit(&edit).await?;
        tx.commit().await?;
        tracing::info!(edit_id = edit.id, status = %edit.status, "Edit rejected");
        self.notifier.on_apply_edit(&edit, None);
        Ok(edit)
    }

    /// Close the edit as failed and keep the reason as a system comment.
    async fn fail(&self, edit_id: DbId, reason: &EngineError) -> EngineResult<Edit> {
        let mut tx = self.store.begin().await?;
        let mut edit = tx
            .lock_edit(edit_id)
            .await?
            .ok_or(CoreError::NotFound { entity: "Edit", id: edit_id })?;
        if !edit.is_pending() {
            return Ok(edit);
        }
        edit.close(EditStatus::Failed, Utc::now())?;
        let edit = tx.update_edit(&edit).await?;
        let reason = reason.to_string();
        tx.create_comment(edit_id, None, &reason).await?;
        tx.commit().await?;

        tracing::warn!(edit_id, error = %reason, "Edit failed to apply");
        self.notifier.on_apply_edit(&edit, Some(&reason));
        Ok(edit)
    }

    // -- Queries ------------------------------------------------------------

    pub async fn find_edit(&self, edit_id: DbId) -> EngineResult<Edit> {
        let mut tx = self.store.begin().await?;
        let edit = tx
            .find_edit(edit_id)
            .await?
            .ok_or(CoreError::NotFound { entity: "Edit", id: edit_id })?;
        Ok(edit)
    }

    pub async fn query_edits(&self, filter: &EditFilter) -> EngineResult<EditPage> {
        let mut tx = self.store.begin().await?;
        let edits = tx.query_edits(filter).await?;
        let total = tx.count_edits(filter).await?;
        Ok(EditPage { edits, total })
    }

    /// Edits acting on one entity, most recently updated first.
    pub async fn edits_for_target(
        &self,
        target_type: TargetType,
        target_id: DbId,
        page: Page,
    ) -> EngineResult<EditPage> {
        let filter = EditFilter {
            target_type: Some(target_type),
            target_id: Some(target_id),
            page,
            ..EditFilter::default()
        };
        self.query_edits(&filter).await
    }

    pub async fn votes(&self, edit_id: DbId) -> EngineResult<Vec<EditVote>> {
        let mut tx = self.store.begin().await?;
        Ok(tx.list_votes(edit_id).await?)
    }

    pub async fn comments(&self, edit_id: DbId) -> EngineResult<Vec<EditComment>> {
        let mut tx = self.store.begin().await?;
        Ok(tx.list_comments(edit_id).await?)
    }

    pub async fn notifications(
        &self,
        user_id: DbId,
        unread_only: bool,
        page: Page,
    ) -> EngineResult<Vec<Notification>> {
        let mut tx = self.store.begin().await?;
        Ok(tx.list_notifications(user_id, unread_only, page).await?)
    }

    pub async fn unread_notification_count(&self, user_id: DbId) -> EngineResult<i64> {
        let mut tx = self.store.begin().await?;
        Ok(tx.count_unread_notifications(user_id).await?)
    }

    pub async fn mark_notifications_read(&self, user_id: DbId) -> EngineResult<u64> {
        let mut tx = self.store.begin().await?;
        let marked = tx.mark_notifications_read(user_id, Utc::now()).await?;
        tx.commit().await?;
        Ok(marked)
    }

    /// Delete notifications created before `cutoff`.
    pub async fn prune_notifications(&self, cutoff: Timestamp) -> EngineResult<u64> {
        let mut tx = self.store.begin().await?;
        let deleted = tx.delete_notifications_before(cutoff).await?;
        tx.commit().await?;
        Ok(deleted)
    }

    // -- Redirects ----------------------------------------------------------

    pub async fn resolve(&self, target_type: TargetType, id: DbId) -> EngineResult<DbId> {
        let mut tx = self.store.begin().await?;
        redirect::resolve(&mut tx, target_type, id).await
    }

    pub async fn resolve_tag(&self, id: DbId) -> EngineResult<DbId> {
        self.resolve(TargetType::Tag, id).await
    }

    pub async fn resolve_performer(&self, id: DbId) -> EngineResult<DbId> {
        self.resolve(TargetType::Performer, id).await
    }

    pub async fn resolve_studio(&self, id: DbId) -> EngineResult<DbId> {
        self.resolve(TargetType::Studio, id).await
    }

    pub async fn resolve_scene(&self, id: DbId) -> EngineResult<DbId> {
        self.resolve(TargetType::Scene, id).await
    }
}
