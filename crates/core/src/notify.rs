//! Outbound notification seam.
//!
//! The engine reports edit lifecycle events through [`EditNotifier`] after
//! the owning transaction commits. Implementations must not block and must
//! swallow their own failures.

use crate::edit::{Edit, EditComment, EditVote};
use crate::types::DbId;

pub trait EditNotifier: Send + Sync {
    fn on_create_edit(&self, edit: &Edit);
    /// Called when an edit closes as applied, rejected or failed. A failed
    /// edit carries the error that stopped it in `reason`.
    fn on_apply_edit(&self, edit: &Edit, reason: Option<&str>);
    fn on_cancel_edit(&self, edit: &Edit);
    /// `previous_voters` are the users whose votes the update discarded.
    fn on_update_edit(&self, edit: &Edit, previous_voters: &[DbId]);
    fn on_edit_downvote(&self, edit: &Edit, vote: &EditVote);
    fn on_edit_comment(&self, edit: &Edit, comment: &EditComment);
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

impl EditNotifier for NoopNotifier {
    fn on_create_edit(&self, _edit: &Edit) {}
    fn on_apply_edit(&self, _edit: &Edit, _reason: Option<&str>) {}
    fn on_cancel_edit(&self, _edit: &Edit) {}
    fn on_update_edit(&self, _edit: &Edit, _previous_voters: &[DbId]) {}
    fn on_edit_downvote(&self, _edit: &Edit, _vote: &EditVote) {}
    fn on_edit_comment(&self, _edit: &Edit, _comment: &EditComment) {}
}
