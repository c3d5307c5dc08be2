//! Narrow persistence contracts consumed by the engine.
//!
//! Every mutation runs inside a [`CatalogTx`] obtained from
//! [`CatalogStore::begin`]. Committing makes all writes visible together;
//! dropping the transaction without committing discards them. Helpers that
//! take `&mut impl CatalogTx` therefore join whatever transaction their
//! caller opened.

use async_trait::async_trait;

use crate::edit::{Edit, EditComment, EditVote, NewEdit, TargetType, VoteType};
use crate::notification::{NewNotification, Notification};
use crate::performer::{Performer, PerformerRelations};
use crate::query::EditFilter;
use crate::redirect::Redirect;
use crate::scene::{Scene, SceneRelations};
use crate::studio::{Studio, StudioRelations};
use crate::tag::{Tag, TagRelations};
use crate::types::{DbId, Page, Timestamp};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Infrastructure failure. Callers may retry.
    #[error("Database error: {0}")]
    Database(String),

    #[error("Row not found: {entity} with id {id}")]
    RowNotFound { entity: &'static str, id: DbId },
}

pub type StoreResult<T> = Result<T, StoreError>;

// ---------------------------------------------------------------------------
// Edits, votes, comments
// ---------------------------------------------------------------------------

#[async_trait]
pub trait EditRepository {
    async fn create_edit(&mut self, edit: &NewEdit) -> StoreResult<Edit>;
    async fn find_edit(&mut self, id: DbId) -> StoreResult<Option<Edit>>;
    /// Like `find_edit`, but holds a row lock until the transaction ends.
    async fn lock_edit(&mut self, id: DbId) -> StoreResult<Option<Edit>>;
    async fn update_edit(&mut self, edit: &Edit) -> StoreResult<Edit>;

    async fn create_edit_target(
        &mut self,
        edit_id: DbId,
        target_type: TargetType,
        target_id: DbId,
    ) -> StoreResult<()>;
    async fn find_edit_target(
        &mut self,
        edit_id: DbId,
        target_type: TargetType,
    ) -> StoreResult<Option<DbId>>;

    async fn query_edits(&mut self, filter: &EditFilter) -> StoreResult<Vec<Edit>>;
    async fn count_edits(&mut self, filter: &EditFilter) -> StoreResult<i64>;
    /// Pending edits created at or before `created_before`, plus pending
    /// edits holding an immediate vote. Oldest first.
    async fn list_closing_candidates(&mut self, created_before: Timestamp) -> StoreResult<Vec<Edit>>;

    /// Insert or replace `user_id`'s vote on the edit.
    async fn upsert_vote(&mut self, edit_id: DbId, user_id: DbId, vote: VoteType)
        -> StoreResult<EditVote>;
    async fn list_votes(&mut self, edit_id: DbId) -> StoreResult<Vec<EditVote>>;
    async fn delete_votes(&mut self, edit_id: DbId) -> StoreResult<u64>;

    async fn create_comment(
        &mut self,
        edit_id: DbId,
        user_id: Option<DbId>,
        text: &str,
    ) -> StoreResult<EditComment>;
    async fn list_comments(&mut self, edit_id: DbId) -> StoreResult<Vec<EditComment>>;
}

// ---------------------------------------------------------------------------
// Entities
// ---------------------------------------------------------------------------

/// Entity repositories allocate ids on create; the `id` of the passed
/// entity is ignored. Soft deletion goes through `update_*` with
/// `deleted = true`.
#[async_trait]
pub trait TagRepository {
    async fn find_tag(&mut self, id: DbId) -> StoreResult<Option<Tag>>;
    /// Like `find_tag`, but holds a row lock until the transaction ends.
    async fn lock_tag(&mut self, id: DbId) -> StoreResult<Option<Tag>>;
    async fn create_tag(&mut self, tag: &Tag) -> StoreResult<Tag>;
    async fn update_tag(&mut self, tag: &Tag) -> StoreResult<Tag>;
    async fn tag_relations(&mut self, id: DbId) -> StoreResult<TagRelations>;
    async fn save_tag_relations(&mut self, id: DbId, relations: &TagRelations) -> StoreResult<()>;
    /// Move scene tag rows from `source` to `target`, dropping duplicates.
    async fn reassign_scene_tags(&mut self, source: DbId, target: DbId) -> StoreResult<u64>;
    async fn delete_scene_tags(&mut self, tag_id: DbId) -> StoreResult<u64>;
}

#[async_trait]
pub trait PerformerRepository {
    async fn find_performer(&mut self, id: DbId) -> StoreResult<Option<Performer>>;
    /// Like `find_performer`, but holds a row lock until the transaction ends.
    async fn lock_performer(&mut self, id: DbId) -> StoreResult<Option<Performer>>;
    async fn create_performer(&mut self, performer: &Performer) -> StoreResult<Performer>;
    async fn update_performer(&mut self, performer: &Performer) -> StoreResult<Performer>;
    async fn performer_relations(&mut self, id: DbId) -> StoreResult<PerformerRelations>;
    async fn save_performer_relations(
        &mut self,
        id: DbId,
        relations: &PerformerRelations,
    ) -> StoreResult<()>;
    /// Move scene appearances from `source` to `target`, dropping scenes
    /// where `target` already appears. When `alias` is set, moved
    /// appearances without an alias receive it.
    async fn reassign_scene_performers(
        &mut self,
        source: DbId,
        target: DbId,
        alias: Option<&str>,
    ) -> StoreResult<u64>;
    /// Set the alias of every appearance of `performer_id` that has none.
    async fn set_scene_performer_alias(&mut self, performer_id: DbId, alias: &str)
        -> StoreResult<u64>;
    /// Clear appearance aliases of `performer_id` equal to `alias`.
    async fn clear_scene_performer_alias(
        &mut self,
        performer_id: DbId,
        alias: &str,
    ) -> StoreResult<u64>;
    async fn delete_scene_performers(&mut self, performer_id: DbId) -> StoreResult<u64>;
}

#[async_trait]
pub trait StudioRepository {
    async fn find_studio(&mut self, id: DbId) -> StoreResult<Option<Studio>>;
    /// Like `find_studio`, but holds a row lock until the transaction ends.
    async fn lock_studio(&mut self, id: DbId) -> StoreResult<Option<Studio>>;
    async fn create_studio(&mut self, studio: &Studio) -> StoreResult<Studio>;
    async fn update_studio(&mut self, studio: &Studio) -> StoreResult<Studio>;
    async fn studio_relations(&mut self, id: DbId) -> StoreResult<StudioRelations>;
    async fn save_studio_relations(
        &mut self,
        id: DbId,
        relations: &StudioRelations,
    ) -> StoreResult<()>;
    /// Re-point scenes and child studios from `source` to `target`.
    async fn reassign_studio_references(&mut self, source: DbId, target: DbId) -> StoreResult<u64>;
    /// Clear the studio from its scenes and child studios.
    async fn detach_studio_references(&mut self, studio_id: DbId) -> StoreResult<u64>;
}

#[async_trait]
pub trait SceneRepository {
    async fn find_scene(&mut self, id: DbId) -> StoreResult<Option<Scene>>;
    /// Like `find_scene`, but holds a row lock until the transaction ends.
    async fn lock_scene(&mut self, id: DbId) -> StoreResult<Option<Scene>>;
    async fn create_scene(&mut self, scene: &Scene) -> StoreResult<Scene>;
    async fn update_scene(&mut self, scene: &Scene) -> StoreResult<Scene>;
    async fn scene_relations(&mut self, id: DbId) -> StoreResult<SceneRelations>;
    async fn save_scene_relations(&mut self, id: DbId, relations: &SceneRelations)
        -> StoreResult<()>;
}

// ---------------------------------------------------------------------------
// Redirects and notifications
// ---------------------------------------------------------------------------

#[async_trait]
pub trait RedirectRepository {
    async fn find_redirect(
        &mut self,
        target_type: TargetType,
        source_id: DbId,
    ) -> StoreResult<Option<Redirect>>;
    async fn create_redirect(&mut self, redirect: &Redirect) -> StoreResult<()>;
    /// Point every redirect targeting `from` at `to` instead.
    async fn retarget_redirects(
        &mut self,
        target_type: TargetType,
        from: DbId,
        to: DbId,
    ) -> StoreResult<u64>;
}

#[async_trait]
pub trait NotificationRepository {
    async fn create_notifications(&mut self, notifications: &[NewNotification])
        -> StoreResult<u64>;
    async fn list_notifications(
        &mut self,
        user_id: DbId,
        unread_only: bool,
        page: Page,
    ) -> StoreResult<Vec<Notification>>;
    async fn count_unread_notifications(&mut self, user_id: DbId) -> StoreResult<i64>;
    async fn mark_notifications_read(&mut self, user_id: DbId, now: Timestamp) -> StoreResult<u64>;
    async fn delete_notifications_before(&mut self, cutoff: Timestamp) -> StoreResult<u64>;
}

// ---------------------------------------------------------------------------
// Transactions
// ---------------------------------------------------------------------------

/// A unit of work spanning every repository.
#[async_trait]
pub trait CatalogTx:
    EditRepository
    + TagRepository
    + PerformerRepository
    + StudioRepository
    + SceneRepository
    + RedirectRepository
    + NotificationRepository
    + Send
    + Sized
    + 'static
{
    async fn commit(self) -> StoreResult<()>;

    /// Discard every write. Equivalent to dropping the transaction, but
    /// releases row locks before returning.
    async fn rollback(self) -> StoreResult<()>;
}

#[async_trait]
pub trait CatalogStore: Send + Sync + 'static {
    type Tx: CatalogTx;

    async fn begin(&self) -> StoreResult<Self::Tx>;
}
